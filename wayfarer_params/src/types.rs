// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Param codecs: the [`ParamCodec`] trait, the [`ParamType`] handle, and the built-in types.
//!
//! ## Built-ins
//!
//! | name    | value                      | pattern                       |
//! |---------|----------------------------|-------------------------------|
//! | `string`| [`ParamValue::String`]     | `[^/]*`                       |
//! | `path`  | [`ParamValue::String`]     | `.*` (raw, slashes allowed)   |
//! | `query` | [`ParamValue::String`]     | `.*`                          |
//! | `hash`  | [`ParamValue::String`]     | `.*` (never inherited)        |
//! | `int`   | [`ParamValue::Int`]        | `-?\d+`                       |
//! | `bool`  | [`ParamValue::Bool`]       | `0\|1`                        |
//! | `date`  | [`ParamValue::Date`]       | `YYYY-MM-DD`                  |
//! | `json`  | [`ParamValue::Json`]       | `[^/]*`                       |
//! | `any`   | anything                   | `.*`                          |

use core::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::ParamError;
use crate::value::ParamValue;

/// A codec for one kind of parameter.
///
/// Implementors convert between raw URL text and [`ParamValue`]s.
/// Only [`encode`](Self::encode), [`decode`](Self::decode) and [`is`](Self::is) are required.
pub trait ParamCodec: Send + Sync + fmt::Debug {
    /// Encode a value to raw text, or `None` if the value cannot be represented.
    fn encode(&self, value: &ParamValue) -> Option<String>;

    /// Decode raw text, or `None` if it is not a valid encoding.
    fn decode(&self, raw: &str) -> Option<ParamValue>;

    /// Whether `value` is a member of this type.
    fn is(&self, value: &ParamValue) -> bool;

    /// Equality between two decoded values.
    fn equals(&self, a: &ParamValue, b: &ParamValue) -> bool {
        a == b
    }

    /// Regex (unanchored source) that every encoded value matches.
    fn pattern(&self) -> &str {
        "[^/]*"
    }

    /// Default value used when neither the declaration nor the URL supplies one.
    fn default_value(&self) -> Option<ParamValue> {
        None
    }

    /// Whether values of this type are inherited across transitions.
    fn inherit(&self) -> bool {
        true
    }

    /// Whether encoded values are emitted without URI escaping.
    fn raw(&self) -> bool {
        false
    }

    /// Whether changes to values of this type leave their state retained.
    fn dynamic(&self) -> bool {
        false
    }
}

/// A named, registered codec with a compiled pattern.
///
/// Cheap to clone; obtained from [`ParamTypes::get`](crate::ParamTypes::get).
#[derive(Clone)]
pub struct ParamType {
    name: Arc<str>,
    codec: Arc<dyn ParamCodec>,
    source: Arc<str>,
    pattern: Regex,
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamType")
            .field("name", &self.name)
            .field("pattern", &self.source)
            .finish_non_exhaustive()
    }
}

impl ParamType {
    /// Wrap a codec, compiling its pattern.
    pub fn new(name: impl Into<String>, codec: Arc<dyn ParamCodec>) -> Result<Self, ParamError> {
        let name: String = name.into();
        let source = codec.pattern().to_owned();
        let pattern = compile_anchored(&name, &source)?;
        Ok(Self {
            name: name.into(),
            codec,
            source: source.into(),
            pattern,
        })
    }

    /// Derive a type that shares this codec but validates against `pattern` instead.
    ///
    /// Used for inline URL patterns like `{id:[0-9]{3}}`.
    pub fn with_pattern(&self, pattern: &str) -> Result<Self, ParamError> {
        Ok(Self {
            name: self.name.clone(),
            codec: self.codec.clone(),
            source: pattern.into(),
            pattern: compile_anchored(&self.name, pattern)?,
        })
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unanchored pattern source, suitable for embedding in a larger regex.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Whether an encoded value matches this type's pattern in full.
    pub fn matches_pattern(&self, encoded: &str) -> bool {
        self.pattern.is_match(encoded)
    }

    /// See [`ParamCodec::encode`].
    pub fn encode(&self, value: &ParamValue) -> Option<String> {
        self.codec.encode(value)
    }

    /// See [`ParamCodec::decode`].
    pub fn decode(&self, raw: &str) -> Option<ParamValue> {
        self.codec.decode(raw)
    }

    /// See [`ParamCodec::is`].
    pub fn is(&self, value: &ParamValue) -> bool {
        self.codec.is(value)
    }

    /// See [`ParamCodec::equals`].
    pub fn equals(&self, a: &ParamValue, b: &ParamValue) -> bool {
        self.codec.equals(a, b)
    }

    /// See [`ParamCodec::default_value`].
    pub fn default_value(&self) -> Option<ParamValue> {
        self.codec.default_value()
    }

    /// See [`ParamCodec::inherit`].
    pub fn inherit(&self) -> bool {
        self.codec.inherit()
    }

    /// See [`ParamCodec::raw`].
    pub fn raw(&self) -> bool {
        self.codec.raw()
    }

    /// See [`ParamCodec::dynamic`].
    pub fn dynamic(&self) -> bool {
        self.codec.dynamic()
    }
}

fn compile_anchored(name: &str, source: &str) -> Result<Regex, ParamError> {
    Regex::new(&format!("^(?:{source})$")).map_err(|source| ParamError::InvalidPattern {
        name: name.to_owned(),
        source,
    })
}

/// Text form used by the string-like built-ins.
fn scalar_text(value: &ParamValue) -> Option<String> {
    match value {
        ParamValue::Null | ParamValue::Array(_) => None,
        ParamValue::Bool(b) => Some(b.to_string()),
        ParamValue::Int(i) => Some(i.to_string()),
        ParamValue::String(s) => Some(s.clone()),
        ParamValue::Date(d) => Some(format_date(*d)),
        ParamValue::Json(j) => Some(j.to_string()),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `string`, `path`, `query` and `hash` differ only in pattern and flags.
#[derive(Debug)]
struct TextType {
    pattern: &'static str,
    inherit: bool,
    raw: bool,
}

impl ParamCodec for TextType {
    fn encode(&self, value: &ParamValue) -> Option<String> {
        scalar_text(value)
    }

    fn decode(&self, raw: &str) -> Option<ParamValue> {
        Some(ParamValue::String(raw.to_owned()))
    }

    fn is(&self, value: &ParamValue) -> bool {
        matches!(value, ParamValue::String(_))
    }

    fn pattern(&self) -> &str {
        self.pattern
    }

    fn inherit(&self) -> bool {
        self.inherit
    }

    fn raw(&self) -> bool {
        self.raw
    }
}

#[derive(Debug)]
struct IntType;

impl ParamCodec for IntType {
    fn encode(&self, value: &ParamValue) -> Option<String> {
        value.as_int().map(|i| i.to_string())
    }

    fn decode(&self, raw: &str) -> Option<ParamValue> {
        raw.parse::<i64>().ok().map(ParamValue::Int)
    }

    fn is(&self, value: &ParamValue) -> bool {
        matches!(value, ParamValue::Int(_))
    }

    fn pattern(&self) -> &str {
        r"-?\d+"
    }
}

#[derive(Debug)]
struct BoolType;

impl ParamCodec for BoolType {
    fn encode(&self, value: &ParamValue) -> Option<String> {
        value.as_bool().map(|b| if b { "1" } else { "0" }.to_owned())
    }

    fn decode(&self, raw: &str) -> Option<ParamValue> {
        raw.parse::<i64>().ok().map(|i| ParamValue::Bool(i != 0))
    }

    fn is(&self, value: &ParamValue) -> bool {
        matches!(value, ParamValue::Bool(_))
    }

    fn pattern(&self) -> &str {
        "0|1"
    }
}

#[derive(Debug)]
struct DateType;

impl ParamCodec for DateType {
    fn encode(&self, value: &ParamValue) -> Option<String> {
        match value {
            ParamValue::Date(d) => Some(format_date(*d)),
            _ => None,
        }
    }

    fn decode(&self, raw: &str) -> Option<ParamValue> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(ParamValue::Date)
    }

    fn is(&self, value: &ParamValue) -> bool {
        matches!(value, ParamValue::Date(_))
    }

    fn pattern(&self) -> &str {
        "[0-9]{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[1-2][0-9]|3[0-1])"
    }
}

#[derive(Debug)]
struct JsonType;

impl ParamCodec for JsonType {
    fn encode(&self, value: &ParamValue) -> Option<String> {
        match value {
            ParamValue::Json(j) => serde_json::to_string(j).ok(),
            _ => None,
        }
    }

    fn decode(&self, raw: &str) -> Option<ParamValue> {
        serde_json::from_str(raw).ok().map(ParamValue::Json)
    }

    fn is(&self, value: &ParamValue) -> bool {
        matches!(value, ParamValue::Json(_))
    }
}

#[derive(Debug)]
struct AnyType;

impl ParamCodec for AnyType {
    fn encode(&self, value: &ParamValue) -> Option<String> {
        scalar_text(value)
    }

    fn decode(&self, raw: &str) -> Option<ParamValue> {
        Some(ParamValue::String(raw.to_owned()))
    }

    fn is(&self, _value: &ParamValue) -> bool {
        true
    }

    fn pattern(&self) -> &str {
        ".*"
    }
}

/// The built-in codecs, in registration order.
pub(crate) fn builtin_codecs() -> Vec<(&'static str, Arc<dyn ParamCodec>)> {
    let text = |pattern, inherit, raw| -> Arc<dyn ParamCodec> {
        Arc::new(TextType {
            pattern,
            inherit,
            raw,
        })
    };
    vec![
        ("string", text("[^/]*", true, false)),
        ("path", text(".*", true, true)),
        ("query", text(".*", true, false)),
        ("hash", text(".*", false, false)),
        ("int", Arc::new(IntType)),
        ("bool", Arc::new(BoolType)),
        ("date", Arc::new(DateType)),
        ("json", Arc::new(JsonType)),
        ("any", Arc::new(AnyType)),
    ]
}
