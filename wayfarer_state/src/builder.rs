// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning a [`StateDeclaration`] into a [`StateObject`].

use std::sync::Arc;

use wayfarer_params::{Param, ParamFactory};

use crate::declaration::StateDeclaration;
use crate::error::StateError;
use crate::object::StateObject;
use crate::url::{MatcherConfig, UrlMatcher};

/// Builds states against their already-built parent.
#[derive(Copy, Clone, Debug, Default)]
pub struct StateBuilder {
    config: MatcherConfig,
}

impl StateBuilder {
    /// A builder compiling URLs with `config`.
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// URL matching options.
    pub fn config(&self) -> MatcherConfig {
        self.config
    }

    /// The implicit root: abstract, nameless, with an empty URL.
    pub fn root(&self) -> Result<StateObject, StateError> {
        Ok(StateObject {
            name: String::new(),
            parent: None,
            path: vec![String::new()],
            own_params: Vec::new(),
            params: Vec::new(),
            url: None,
            url_base: Arc::new(UrlMatcher::root(self.config)?),
            navigable: None,
            is_abstract: true,
            data: serde_json::Map::new(),
            views: serde_json::Map::new(),
            resolvables: Vec::new(),
            redirect_to: None,
        })
    }

    /// Build `decl` as a child of `parent`.
    ///
    /// The caller guarantees `parent` is the state named by the declaration's
    /// parent name.
    pub fn build(
        &self,
        decl: &StateDeclaration,
        parent: &StateObject,
        factory: &mut ParamFactory,
    ) -> Result<StateObject, StateError> {
        debug_assert_eq!(decl.parent_name().ok(), Some(parent.name()), "parent mismatch");

        let (url, appended) = match decl.url.as_deref() {
            Some(pattern) => match pattern.strip_prefix('^') {
                Some(absolute) => (
                    Some(Arc::new(UrlMatcher::compile(
                        absolute,
                        &decl.params,
                        factory,
                        self.config,
                    )?)),
                    false,
                ),
                None => (
                    Some(Arc::new(parent.url_base.append(pattern, &decl.params, factory)?)),
                    true,
                ),
            },
            None => (None, false),
        };

        let mut own_params: Vec<Param> = url
            .iter()
            .flat_map(|m| m.params())
            .filter(|p| !(appended && parent.url_base.param(p.id()).is_some()))
            .cloned()
            .collect();
        for (id, param_decl) in &decl.params {
            let in_url = url.as_ref().is_some_and(|m| m.param(id).is_some());
            if !in_url {
                own_params.push(factory.from_config(id, Some(param_decl))?);
            }
        }

        let mut params: Vec<Param> = parent
            .params
            .iter()
            .filter(|p| !own_params.iter().any(|o| o.id() == p.id()))
            .cloned()
            .collect();
        params.extend(own_params.iter().cloned());

        let mut data = parent.data.clone();
        data.extend(decl.data.clone());

        let mut path = parent.path.clone();
        path.push(decl.name.clone());

        let navigable = if url.is_some() && !decl.is_abstract {
            Some(decl.name.clone())
        } else {
            parent.navigable.clone()
        };

        tracing::debug!(
            state = %decl.name,
            params = params.len(),
            url = url.as_ref().map(|m| m.source()),
            "built state"
        );

        Ok(StateObject {
            name: decl.name.clone(),
            parent: Some(parent.name.clone()),
            path,
            own_params,
            params,
            url_base: url.clone().unwrap_or_else(|| parent.url_base.clone()),
            url,
            navigable,
            is_abstract: decl.is_abstract,
            data,
            views: decl.views.clone(),
            resolvables: decl.resolve.clone(),
            redirect_to: decl.redirect_to.clone(),
        })
    }
}
