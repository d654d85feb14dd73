// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayfarer Params: typed parameters for navigation states.
//!
//! ## Overview
//!
//! Every state in a wayfarer tree declares parameters: placeholders in its URL
//! path, query string keys, or plain config values. This crate turns those
//! declarations into [`Param`]s that know how to decode raw URL text, validate
//! values, apply defaults, and encode values back to text.
//!
//! ## Pieces
//!
//! - [`ParamCodec`] is the trait a type implements; [`ParamType`] is a named, compiled codec.
//! - [`ParamTypes`] is the registry. Built-ins (`string`, `path`, `query`, `hash`, `int`,
//!   `bool`, `date`, `json`, `any`) are always present; custom types are queued and
//!   compiled on first lookup.
//! - [`ParamFactory`] builds [`Param`]s from a path placeholder, a query key, or a
//!   [`ParamDeclaration`], resolving the default as explicit > type default > undefined.
//!
//! ## Minimal example
//!
//! ```
//! use wayfarer_params::{ParamFactory, ParamValue};
//!
//! let mut factory = ParamFactory::default();
//! let id = factory.from_path("id", Some("int"), None).unwrap();
//! assert_eq!(id.decode("42").unwrap(), ParamValue::Int(42));
//! assert!(id.decode("forty-two").is_err());
//! assert_eq!(id.encode(&ParamValue::Int(7)), vec!["7".to_owned()]);
//! ```

pub mod error;
pub mod factory;
pub mod param;
pub mod registry;
pub mod types;
pub mod value;

pub use error::ParamError;
pub use factory::{ParamDeclaration, ParamFactory};
pub use param::{ArrayMode, Param, ParamLocation, Squash};
pub use registry::ParamTypes;
pub use types::{ParamCodec, ParamType};
pub use value::{ParamValue, ParamValues, SearchValues, param_values};
