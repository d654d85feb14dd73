// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building [`Param`]s from URL placeholders, query keys, and explicit config.

use crate::error::ParamError;
use crate::param::{ArrayMode, Param, ParamLocation, Squash};
use crate::registry::ParamTypes;
use crate::types::ParamType;
use crate::value::ParamValue;

/// Declarative settings for one param, as written on a state declaration.
///
/// Every field is optional; unset fields fall back to the type's or the
/// factory's defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamDeclaration {
    /// Registered type name.
    pub type_name: Option<String>,
    /// Explicit default value.
    pub value: Option<ParamValue>,
    /// `Some(true)` forces [`ArrayMode::Always`], `Some(false)` forces [`ArrayMode::None`].
    pub array: Option<bool>,
    /// Squash policy override.
    pub squash: Option<Squash>,
    /// Dynamic override.
    pub dynamic: Option<bool>,
    /// Inherit override.
    pub inherit: Option<bool>,
    /// Raw (unescaped) encoding override.
    pub raw: Option<bool>,
}

impl ParamDeclaration {
    /// Empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type name.
    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        self.type_name = Some(name.into());
        self
    }

    /// Set an explicit default value (making the param optional).
    pub fn with_default(mut self, value: impl Into<ParamValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Force or forbid array values.
    pub fn with_array(mut self, array: bool) -> Self {
        self.array = Some(array);
        self
    }

    /// Set the squash policy.
    pub fn with_squash(mut self, squash: Squash) -> Self {
        self.squash = Some(squash);
        self
    }

    /// Mark the param dynamic.
    pub fn dynamic(mut self) -> Self {
        self.dynamic = Some(true);
        self
    }

    /// Set whether the param inherits from the current state.
    pub fn with_inherit(mut self, inherit: bool) -> Self {
        self.inherit = Some(inherit);
        self
    }

    /// Encode the param without URI escaping.
    pub fn raw(mut self) -> Self {
        self.raw = Some(true);
        self
    }
}

/// Builds [`Param`]s against a [`ParamTypes`] registry.
#[derive(Debug, Default)]
pub struct ParamFactory {
    types: ParamTypes,
    default_squash: Squash,
}

impl ParamFactory {
    /// Create a factory over `types` with the given default squash policy.
    pub fn new(types: ParamTypes, default_squash: Squash) -> Self {
        Self {
            types,
            default_squash,
        }
    }

    /// The type registry.
    pub fn types(&self) -> &ParamTypes {
        &self.types
    }

    /// The type registry, for registering custom types.
    pub fn types_mut(&mut self) -> &mut ParamTypes {
        &mut self.types
    }

    /// Squash policy applied to optional params that do not set one.
    pub fn default_squash(&self) -> &Squash {
        &self.default_squash
    }

    /// Change the default squash policy for params built afterwards.
    pub fn set_default_squash(&mut self, squash: Squash) {
        self.default_squash = squash;
    }

    /// Build a path param. `type_name` comes from the URL placeholder (`{id:int}`).
    pub fn from_path(
        &mut self,
        id: &str,
        type_name: Option<&str>,
        decl: Option<&ParamDeclaration>,
    ) -> Result<Param, ParamError> {
        let url_type = type_name.map(|n| self.types.get(n)).transpose()?;
        self.build(id, ParamLocation::Path, url_type, decl)
    }

    /// Build a path param whose type was already resolved (e.g. an inline regex).
    pub fn from_path_typed(
        &mut self,
        id: &str,
        url_type: ParamType,
        decl: Option<&ParamDeclaration>,
    ) -> Result<Param, ParamError> {
        self.build(id, ParamLocation::Path, Some(url_type), decl)
    }

    /// Build a search (query string) param.
    pub fn from_search(
        &mut self,
        id: &str,
        type_name: Option<&str>,
        decl: Option<&ParamDeclaration>,
    ) -> Result<Param, ParamError> {
        let url_type = type_name.map(|n| self.types.get(n)).transpose()?;
        self.build(id, ParamLocation::Search, url_type, decl)
    }

    /// Build a param that is declared on the state but not in its URL.
    pub fn from_config(
        &mut self,
        id: &str,
        decl: Option<&ParamDeclaration>,
    ) -> Result<Param, ParamError> {
        self.build(id, ParamLocation::Config, None, decl)
    }

    fn resolve_type(
        &mut self,
        id: &str,
        location: ParamLocation,
        url_type: Option<ParamType>,
        declared: Option<&str>,
    ) -> Result<ParamType, ParamError> {
        match (url_type, declared) {
            (Some(url), Some(name)) if url.name() == "string" => self.types.get(name),
            (Some(_), Some(_)) => Err(ParamError::InvalidDeclaration {
                param: id.to_owned(),
                reason: "type declared both in the url and in the param config",
            }),
            (Some(url), None) => Ok(url),
            (None, Some(name)) => self.types.get(name),
            (None, None) => self.types.get(match location {
                ParamLocation::Path | ParamLocation::Search => "string",
                ParamLocation::Config => "any",
            }),
        }
    }

    fn build(
        &mut self,
        id: &str,
        location: ParamLocation,
        url_type: Option<ParamType>,
        decl: Option<&ParamDeclaration>,
    ) -> Result<Param, ParamError> {
        let empty = ParamDeclaration::default();
        let decl = decl.unwrap_or(&empty);
        let param_type = self.resolve_type(id, location, url_type, decl.type_name.as_deref())?;

        let array_mode = match (location, decl.array) {
            (ParamLocation::Path, Some(true)) => {
                return Err(ParamError::InvalidDeclaration {
                    param: id.to_owned(),
                    reason: "array values are only supported for search and config params",
                });
            }
            (ParamLocation::Path, _) | (_, Some(false)) => ArrayMode::None,
            (_, Some(true)) => ArrayMode::Always,
            (ParamLocation::Search, None) => ArrayMode::Auto,
            (ParamLocation::Config, None) => ArrayMode::None,
        };

        let default_value = decl.value.clone().or_else(|| param_type.default_value());
        let is_optional = default_value.is_some() || location == ParamLocation::Search;
        let squash = if is_optional {
            decl.squash
                .clone()
                .unwrap_or_else(|| self.default_squash.clone())
        } else {
            Squash::No
        };

        Ok(Param {
            id: id.to_owned(),
            location,
            squash,
            array_mode,
            default_value,
            is_optional,
            dynamic: decl.dynamic.unwrap_or_else(|| param_type.dynamic()),
            inherit: decl.inherit.unwrap_or_else(|| param_type.inherit()),
            raw: decl.raw.unwrap_or_else(|| param_type.raw()),
            param_type,
        })
    }
}
