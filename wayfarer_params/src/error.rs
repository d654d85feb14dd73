// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised while registering param types and decoding values.

use thiserror::Error;

/// Errors from the param type registry, the param factory, and value codecs.
#[derive(Clone, Debug, Error)]
pub enum ParamError {
    /// A type with this name is already registered (or queued for registration).
    #[error("a param type named '{0}' has already been defined")]
    DuplicateType(String),
    /// No type with this name has been registered.
    #[error("no param type named '{0}' is registered")]
    UnknownType(String),
    /// A type's pattern is not a valid regular expression.
    #[error("param type '{name}' has an invalid pattern: {source}")]
    InvalidPattern {
        /// Name of the offending type.
        name: String,
        /// Regex compile error.
        #[source]
        source: regex::Error,
    },
    /// A raw or decoded value was rejected by the param's type.
    #[error("param '{param}' rejected value '{value}'")]
    Validation {
        /// Id of the offending param.
        param: String,
        /// Raw (or debug-formatted) value that failed.
        value: String,
    },
    /// The declaration for a param is contradictory.
    #[error("param '{param}' is misconfigured: {reason}")]
    InvalidDeclaration {
        /// Id of the offending param.
        param: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}
