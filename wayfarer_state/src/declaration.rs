// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw state declarations and dotted-name helpers.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use wayfarer_params::{ParamDeclaration, ParamValues};

use crate::error::StateError;
use crate::resolve::Resolvable;

/// Where a state forwards to when it is targeted directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RedirectTo {
    /// Target name, possibly relative to the redirecting state.
    pub state: String,
    /// Params for the target; unset params inherit as usual.
    pub params: ParamValues,
}

/// A state as written by the application, before it is built.
#[derive(Clone, Debug, Default)]
pub struct StateDeclaration {
    /// Dotted name; the part before the last `.` names the parent.
    pub name: String,
    /// URL pattern, appended to the nearest ancestor's unless it starts with `^`.
    pub url: Option<String>,
    /// Per-param settings for URL params and extra config params.
    pub params: BTreeMap<String, ParamDeclaration>,
    /// Abstract states can be ancestors but never transition targets.
    pub is_abstract: bool,
    /// Arbitrary data, shallow-merged over the parent's.
    pub data: Map<String, Value>,
    /// Opaque view configuration, passed through untouched.
    pub views: Map<String, Value>,
    /// Values to resolve before the state is entered.
    pub resolve: Vec<Resolvable>,
    /// Redirect applied when this state is the transition target.
    pub redirect_to: Option<RedirectTo>,
}

impl StateDeclaration {
    /// A declaration with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the URL pattern.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Configure one param.
    pub fn param(mut self, id: impl Into<String>, decl: ParamDeclaration) -> Self {
        self.params.insert(id.into(), decl);
        self
    }

    /// Mark abstract.
    pub fn abstract_state(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a data entry.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Add a view entry.
    pub fn view(mut self, name: impl Into<String>, config: impl Into<Value>) -> Self {
        self.views.insert(name.into(), config.into());
        self
    }

    /// Add a resolvable.
    pub fn resolve(mut self, resolvable: Resolvable) -> Self {
        self.resolve.push(resolvable);
        self
    }

    /// Redirect to `state` with no extra params.
    pub fn redirect_to(mut self, state: impl Into<String>) -> Self {
        self.redirect_to = Some(RedirectTo {
            state: state.into(),
            params: ParamValues::new(),
        });
        self
    }

    /// Validate the name and return the parent's name.
    pub fn parent_name(&self) -> Result<&str, StateError> {
        validate_name(&self.name)?;
        Ok(parent_name(&self.name).unwrap_or_default())
    }
}

/// Reject empty names, empty segments, and wildcards.
pub fn validate_name(name: &str) -> Result<(), StateError> {
    if name.is_empty() {
        return Err(StateError::EmptyName);
    }
    if name.split('.').any(str::is_empty) || name.contains(['*', '^']) {
        return Err(StateError::InvalidName(name.to_owned()));
    }
    Ok(())
}

/// Parent of a dotted name. Top-level names have the root (`""`) as parent;
/// the root has none.
pub fn parent_name(name: &str) -> Option<&str> {
    if name.is_empty() {
        return None;
    }
    Some(name.rsplit_once('.').map_or("", |(parent, _)| parent))
}

fn join(base: &str, tail: &str) -> String {
    match (base.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_owned(),
        (false, true) => base.to_owned(),
        (false, false) => format!("{base}.{tail}"),
    }
}

/// Resolve a possibly relative name against `base`.
///
/// - `.child` is `base.child`.
/// - `^` is the parent of `base`, `^.^` the grandparent, `^.sibling` a sibling.
/// - Anything else is absolute and returned as is.
pub fn resolve_name(name: &str, base: Option<&str>) -> Result<String, StateError> {
    let relative = name.starts_with('.') || name.starts_with('^');
    if !relative {
        return Ok(name.to_owned());
    }
    let error = || StateError::InvalidRelativeName {
        name: name.to_owned(),
        base: base.unwrap_or_default().to_owned(),
    };
    let base = base.ok_or_else(error)?;
    if let Some(tail) = name.strip_prefix('.') {
        return Ok(join(base, tail));
    }
    let mut current = base;
    let mut segments = name.split('.').peekable();
    while segments.next_if_eq(&"^").is_some() {
        current = parent_name(current).ok_or_else(error)?;
    }
    let tail: Vec<&str> = segments.collect();
    Ok(join(current, &tail.join(".")))
}
