// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayfarer State: the state tree.
//!
//! ## Overview
//!
//! Applications describe their navigation tree as [`StateDeclaration`]s with
//! dotted names (`home`, `home.users`, `home.users.edit`). The
//! [`StateRegistry`] turns declarations into immutable [`StateObject`]s. A
//! declaration whose parent is not registered yet waits in a queue and is built
//! as soon as the parent arrives, so declarations can be registered in any order.
//!
//! Building copies everything a state inherits (params, data, URL prefix) out of
//! its parent. States refer to their parent by name only, which makes the tree
//! a flat table keyed by name, and removing a subtree a name-prefix operation.
//!
//! ## Pieces
//!
//! - [`StateBuilder`] builds one state against its parent.
//! - [`StateQueueManager`] holds pending declarations and the built table.
//! - [`StateRegistry`] adds the implicit root, change listeners, relative name
//!   lookup and the route table.
//! - [`UrlMatcher`] compiles URL patterns; [`UrlRules`] orders them by specificity.
//! - [`Queue`] is a bounded FIFO that reports evictions.
//! - [`Glob`] matches dotted names with `*` and `**`.
//!
//! ## Minimal example
//!
//! ```
//! use wayfarer_params::{ParamFactory, ParamValue};
//! use wayfarer_state::{MatcherConfig, StateDeclaration, StateRegistry};
//!
//! let mut registry = StateRegistry::new(ParamFactory::default(), MatcherConfig::default()).unwrap();
//!
//! // Children may arrive before their parent.
//! registry.register(StateDeclaration::new("users.detail").url("/{id:int}")).unwrap();
//! registry.register(StateDeclaration::new("users").url("/users")).unwrap();
//!
//! let detail = registry.get("users.detail").unwrap();
//! assert_eq!(detail.parent(), Some("users"));
//!
//! let hit = registry.match_url("/users/12").unwrap();
//! assert_eq!(hit.state, "users.detail");
//! assert_eq!(hit.params["id"], ParamValue::Int(12));
//! ```

pub mod builder;
pub mod declaration;
pub mod error;
pub mod glob;
pub mod object;
pub mod queue;
pub mod queue_manager;
pub mod registry;
pub mod resolve;
pub mod rules;
pub mod url;

pub use builder::StateBuilder;
pub use declaration::{RedirectTo, StateDeclaration};
pub use error::StateError;
pub use glob::Glob;
pub use object::StateObject;
pub use queue::Queue;
pub use queue_manager::StateQueueManager;
pub use registry::{ListenerId, RegistryEvent, StateRegistry};
pub use resolve::{ResolveArgs, ResolveError, ResolveFuture, ResolvePolicy, Resolvable};
pub use rules::{UrlMatch, UrlRules};
pub use url::{MatcherConfig, UrlMatcher};
