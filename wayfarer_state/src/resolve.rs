// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolvables: named async values a state needs before it is entered.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use wayfarer_params::ParamValues;

/// When a resolvable is fetched.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ResolvePolicy {
    /// At transition start, for every state in the target path.
    Eager,
    /// Just before the owning state is entered.
    #[default]
    Lazy,
}

/// A resolver failure.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ResolveError(pub String);

/// What a resolver sees.
#[derive(Debug)]
pub struct ResolveArgs<'a> {
    /// Name of the state that owns the resolvable.
    pub state: &'a str,
    /// Target param values.
    pub params: &'a ParamValues,
    /// Values already resolved for this state and its ancestors, by token.
    pub upstream: &'a BTreeMap<String, Value>,
}

/// Future returned by a resolver.
pub type ResolveFuture = BoxFuture<'static, Result<Value, ResolveError>>;

type ResolverFn = dyn Fn(ResolveArgs<'_>) -> ResolveFuture + Send + Sync;

/// A token and the function that produces its value.
#[derive(Clone)]
pub struct Resolvable {
    token: String,
    policy: ResolvePolicy,
    resolver: Arc<ResolverFn>,
}

impl fmt::Debug for Resolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvable")
            .field("token", &self.token)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Resolvable {
    /// A lazy resolvable backed by `resolver`.
    pub fn new(
        token: impl Into<String>,
        resolver: impl Fn(ResolveArgs<'_>) -> ResolveFuture + Send + Sync + 'static,
    ) -> Self {
        Self {
            token: token.into(),
            policy: ResolvePolicy::default(),
            resolver: Arc::new(resolver),
        }
    }

    /// A resolvable that yields a fixed value.
    pub fn value(token: impl Into<String>, value: Value) -> Self {
        Self::new(token, move |_| futures::future::ready(Ok(value.clone())).boxed())
    }

    /// Switch to [`ResolvePolicy::Eager`].
    pub fn eager(mut self) -> Self {
        self.policy = ResolvePolicy::Eager;
        self
    }

    /// The token the value is stored under.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Fetch policy.
    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    /// Start resolving.
    pub fn resolve(&self, args: ResolveArgs<'_>) -> ResolveFuture {
        (self.resolver)(args)
    }
}
