// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The param type registry.
//!
//! ## Lifecycle
//!
//! Built-in types are available immediately. Custom types passed to
//! [`ParamTypes::register`] are buffered in a type queue and only compiled when
//! the registry is first consulted ([`ParamTypes::get`]) or explicitly
//! [flushed](ParamTypes::flush). This lets declarations that name a custom type
//! be written before the type itself is registered, as long as both happen
//! before the first lookup.
//!
//! Names are unique across the registry and the queue; a second registration
//! under the same name fails immediately with [`ParamError::DuplicateType`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ParamError;
use crate::types::{ParamCodec, ParamType, builtin_codecs};

/// Registry mapping type names to [`ParamType`]s.
pub struct ParamTypes {
    types: BTreeMap<String, ParamType>,
    type_queue: Vec<(String, Arc<dyn ParamCodec>)>,
}

impl core::fmt::Debug for ParamTypes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ParamTypes")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("queued", &self.type_queue.len())
            .finish()
    }
}

impl Default for ParamTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamTypes {
    /// Create a registry holding the built-in types.
    pub fn new() -> Self {
        let mut types = BTreeMap::new();
        for (name, codec) in builtin_codecs() {
            // Built-in patterns are constants; a failure here would be a bug in this crate.
            match ParamType::new(name, codec) {
                Ok(t) => {
                    types.insert(name.to_owned(), t);
                }
                Err(err) => tracing::error!(%err, "built-in param type failed to compile"),
            }
        }
        Self {
            types,
            type_queue: Vec::new(),
        }
    }

    /// Queue a custom type for registration.
    ///
    /// The codec is compiled on the next [`flush`](Self::flush) or lookup.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        codec: impl ParamCodec + 'static,
    ) -> Result<(), ParamError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(ParamError::DuplicateType(name));
        }
        tracing::debug!(param_type = %name, "queued param type");
        self.type_queue.push((name, Arc::new(codec)));
        Ok(())
    }

    /// Whether `name` is registered or queued.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.type_queue.iter().any(|(n, _)| n == name)
    }

    /// Number of types waiting in the queue.
    pub fn pending(&self) -> usize {
        self.type_queue.len()
    }

    /// Compile every queued type, in registration order.
    ///
    /// Stops at the first type whose pattern fails to compile; that type is
    /// dropped and the remaining ones stay queued.
    pub fn flush(&mut self) -> Result<(), ParamError> {
        while !self.type_queue.is_empty() {
            let (name, codec) = self.type_queue.remove(0);
            let param_type = ParamType::new(name.clone(), codec)?;
            tracing::debug!(param_type = %name, "registered param type");
            self.types.insert(name, param_type);
        }
        Ok(())
    }

    /// Look up a type by name, flushing the queue first.
    pub fn get(&mut self, name: &str) -> Result<ParamType, ParamError> {
        self.flush()?;
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| ParamError::UnknownType(name.to_owned()))
    }

    /// Names of all compiled types.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}
