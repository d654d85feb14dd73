// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built, immutable states.

use std::sync::Arc;

use serde_json::{Map, Value};
use wayfarer_params::{Param, ParamValues};

use crate::declaration::RedirectTo;
use crate::resolve::Resolvable;
use crate::url::UrlMatcher;

/// A fully built state.
///
/// Everything a state inherits from its ancestors (params, data, URL prefix)
/// is copied in at build time, so a `StateObject` never needs to look at its
/// parent again. The parent is referenced by name only.
#[derive(Clone, Debug)]
pub struct StateObject {
    pub(crate) name: String,
    pub(crate) parent: Option<String>,
    pub(crate) path: Vec<String>,
    pub(crate) own_params: Vec<Param>,
    pub(crate) params: Vec<Param>,
    pub(crate) url: Option<Arc<UrlMatcher>>,
    pub(crate) url_base: Arc<UrlMatcher>,
    pub(crate) navigable: Option<String>,
    pub(crate) is_abstract: bool,
    pub(crate) data: Map<String, Value>,
    pub(crate) views: Map<String, Value>,
    pub(crate) resolvables: Vec<Resolvable>,
    pub(crate) redirect_to: Option<RedirectTo>,
}

impl StateObject {
    /// Dotted name; `""` for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent name; `None` only for the root.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Whether this is the implicit root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Names from the root down to this state, inclusive.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Distance from the root (the root is 0).
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Whether `name` is this state or one of its ancestors.
    pub fn includes(&self, name: &str) -> bool {
        self.path.iter().any(|n| n == name)
    }

    /// Params declared by this state itself.
    pub fn own_params(&self) -> &[Param] {
        &self.own_params
    }

    /// Inherited and own params, ancestors first.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Look up a param by id, including inherited ones.
    pub fn param(&self, id: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.id() == id)
    }

    /// Own params that are not dynamic; changes to these exit and re-enter the state.
    pub fn non_dynamic_params(&self) -> impl Iterator<Item = &Param> {
        self.own_params.iter().filter(|p| !p.is_dynamic())
    }

    /// Full URL matcher, if this state declares a URL.
    pub fn url(&self) -> Option<&UrlMatcher> {
        self.url.as_deref()
    }

    /// Name of the state whose URL represents this one, if any.
    pub fn navigable(&self) -> Option<&str> {
        self.navigable.as_deref()
    }

    /// Whether the state can only be an ancestor.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Merged data (own entries override inherited ones).
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Opaque view configuration.
    pub fn views(&self) -> &Map<String, Value> {
        &self.views
    }

    /// Own resolvables.
    pub fn resolvables(&self) -> &[Resolvable] {
        &self.resolvables
    }

    /// Redirect applied when this state is targeted.
    pub fn redirect_to(&self) -> Option<&RedirectTo> {
        self.redirect_to.as_ref()
    }

    /// Apply defaults for every param, dropping values for unknown ids.
    pub fn param_values(&self, values: &ParamValues) -> ParamValues {
        self.params
            .iter()
            .filter_map(|p| p.value(values.get(p.id())).map(|v| (p.id().to_owned(), v)))
            .collect()
    }
}
