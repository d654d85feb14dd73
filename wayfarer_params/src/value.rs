// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoded parameter values and the maps that carry them between states.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// A decoded parameter value.
///
/// Raw URL text is decoded into one of these by a [`ParamType`](crate::ParamType).
/// An absent value ("undefined") is modelled as `None` at the use site, never as a variant.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamValue {
    /// Explicit null.
    Null,
    /// Boolean, encoded as `1`/`0`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Plain text.
    String(String),
    /// Calendar date, encoded as `YYYY-MM-DD`.
    Date(NaiveDate),
    /// Arbitrary JSON payload.
    Json(serde_json::Value),
    /// Multiple values for one parameter (search and config params only).
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Returns the text if this is a [`ParamValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`ParamValue::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the flag if this is a [`ParamValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`ParamValue::Array`].
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// True for [`ParamValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Parameter values keyed by param id.
///
/// A missing key means the value is undefined; defaults are applied by
/// [`Param::value`](crate::Param::value).
pub type ParamValues = BTreeMap<String, ParamValue>;

/// Raw search (query string) values keyed by name, in order of appearance.
pub type SearchValues = BTreeMap<String, Vec<String>>;

/// Build a [`ParamValues`] map from `(id, value)` pairs.
///
/// ```
/// use wayfarer_params::{ParamValue, param_values};
/// let values = param_values([("id", ParamValue::Int(7)), ("tab", "info".into())]);
/// assert_eq!(values["id"], ParamValue::Int(7));
/// ```
pub fn param_values<I, K>(pairs: I) -> ParamValues
where
    I: IntoIterator<Item = (K, ParamValue)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
