// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single state parameter: its type, location, defaults, and encoding policy.

use serde::Deserialize;

use crate::error::ParamError;
use crate::types::ParamType;
use crate::value::{ParamValue, ParamValues};

/// Where a parameter's value lives.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ParamLocation {
    /// A placeholder in the URL path, like `/users/:id`.
    Path,
    /// A query string key, like `?page`.
    Search,
    /// Declared on the state only; never part of the URL.
    Config,
}

/// How many values a parameter carries.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ArrayMode {
    /// Exactly one value.
    #[default]
    None,
    /// One value decodes as a scalar, several as an array.
    Auto,
    /// Always an array, even for a single value.
    Always,
}

/// Policy for omitting a default-valued optional path parameter from the URL.
///
/// Deserializes from `false`, `true`, or a replacement string such as `"~"`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(from = "SquashRepr")]
pub enum Squash {
    /// Keep the encoded default in the URL.
    #[default]
    No,
    /// Drop the value and its leading slash.
    Yes,
    /// Replace the value with the given marker.
    Replace(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SquashRepr {
    Flag(bool),
    Marker(String),
}

impl From<SquashRepr> for Squash {
    fn from(repr: SquashRepr) -> Self {
        match repr {
            SquashRepr::Flag(false) => Self::No,
            SquashRepr::Flag(true) => Self::Yes,
            SquashRepr::Marker(s) => Self::Replace(s),
        }
    }
}

/// A fully resolved parameter, built by [`ParamFactory`](crate::ParamFactory).
#[derive(Clone, Debug)]
pub struct Param {
    pub(crate) id: String,
    pub(crate) param_type: ParamType,
    pub(crate) location: ParamLocation,
    pub(crate) squash: Squash,
    pub(crate) array_mode: ArrayMode,
    pub(crate) default_value: Option<ParamValue>,
    pub(crate) is_optional: bool,
    pub(crate) dynamic: bool,
    pub(crate) inherit: bool,
    pub(crate) raw: bool,
}

impl Param {
    /// Param id (the key in [`ParamValues`]).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The param's codec.
    pub fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    /// Where the value lives.
    pub fn location(&self) -> ParamLocation {
        self.location
    }

    /// Squash policy; always [`Squash::No`] for required params.
    pub fn squash(&self) -> &Squash {
        &self.squash
    }

    /// Array handling.
    pub fn array_mode(&self) -> ArrayMode {
        self.array_mode
    }

    /// Resolved default: explicit, then type default, then undefined.
    pub fn default_value(&self) -> Option<&ParamValue> {
        self.default_value.as_ref()
    }

    /// Whether the param may be left undefined.
    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    /// Whether changing this param keeps its state retained.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Whether the value carries over from the current state when a target omits it.
    pub fn inherits(&self) -> bool {
        self.inherit
    }

    /// Whether encoded values skip URI escaping.
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Apply defaults: an undefined value (or an empty string for an optional
    /// path param) becomes the default, and scalars are wrapped for
    /// [`ArrayMode::Always`].
    pub fn value(&self, value: Option<&ParamValue>) -> Option<ParamValue> {
        match value {
            None => self.default_value.clone(),
            Some(ParamValue::String(s))
                if s.is_empty() && self.location == ParamLocation::Path && self.is_optional =>
            {
                self.default_value.clone()
            }
            Some(v) => Some(self.normalize(v.clone())),
        }
    }

    fn normalize(&self, value: ParamValue) -> ParamValue {
        match (self.array_mode, value) {
            (ArrayMode::Always, v @ ParamValue::Array(_)) => v,
            (ArrayMode::Always, v) => ParamValue::Array(vec![v]),
            (_, v) => v,
        }
    }

    /// Whether `value` is acceptable: undefined/null for optional params, or a
    /// member of the type whose encoding matches the type's pattern.
    pub fn validates(&self, value: Option<&ParamValue>) -> bool {
        let value = match value {
            None | Some(ParamValue::Null) if self.is_optional => return true,
            None => return false,
            Some(v) => v,
        };
        match value {
            ParamValue::Array(items) if self.array_mode != ArrayMode::None => {
                items.iter().all(|v| self.validates_one(v))
            }
            v => self.validates_one(v),
        }
    }

    fn validates_one(&self, value: &ParamValue) -> bool {
        if !self.param_type.is(value) {
            return false;
        }
        match self.param_type.encode(value) {
            Some(encoded) => self.param_type.matches_pattern(&encoded),
            None => true,
        }
    }

    fn decode_one(&self, raw: &str) -> Result<ParamValue, ParamError> {
        let rejected = || ParamError::Validation {
            param: self.id.clone(),
            value: raw.to_owned(),
        };
        let value = self.param_type.decode(raw).ok_or_else(rejected)?;
        if !self.param_type.is(&value) {
            return Err(rejected());
        }
        Ok(value)
    }

    /// Decode one raw value.
    ///
    /// Fails with [`ParamError::Validation`] naming this param when the type
    /// cannot decode `raw` or the decoded value is not a member of the type.
    pub fn decode(&self, raw: &str) -> Result<ParamValue, ParamError> {
        self.decode_one(raw).map(|v| self.normalize(v))
    }

    /// Decode every raw value supplied for this param (repeated query keys).
    ///
    /// Returns `Ok(None)` when `raws` is empty.
    pub fn decode_many(&self, raws: &[String]) -> Result<Option<ParamValue>, ParamError> {
        match (raws, self.array_mode) {
            ([], _) => Ok(None),
            ([one], ArrayMode::None | ArrayMode::Auto) => self.decode_one(one).map(Some),
            ([.., last], ArrayMode::None) => self.decode_one(last).map(Some),
            (many, ArrayMode::Auto | ArrayMode::Always) => many
                .iter()
                .map(|raw| self.decode_one(raw))
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(ParamValue::Array(items))),
        }
    }

    /// Encode a value: one string per element for arrays, at most one otherwise.
    pub fn encode(&self, value: &ParamValue) -> Vec<String> {
        match value {
            ParamValue::Array(items) if self.array_mode != ArrayMode::None => items
                .iter()
                .filter_map(|v| self.param_type.encode(v))
                .collect(),
            v => self.param_type.encode(v).into_iter().collect(),
        }
    }

    /// Type-aware equality between two possibly undefined values.
    pub fn equals(&self, a: Option<&ParamValue>, b: Option<&ParamValue>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(ParamValue::Array(x)), Some(ParamValue::Array(y))) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y)
                        .all(|(l, r)| self.param_type.equals(l, r))
            }
            (Some(a), Some(b)) => self.param_type.equals(a, b),
            _ => false,
        }
    }

    /// Whether `value` equals this param's default.
    pub fn is_default(&self, value: Option<&ParamValue>) -> bool {
        self.is_optional && self.equals(value, self.default_value.as_ref())
    }

    /// Params whose values differ between `a` and `b`.
    pub fn changed<'a>(params: &'a [Self], a: &ParamValues, b: &ParamValues) -> Vec<&'a Self> {
        params
            .iter()
            .filter(|p| !p.equals(a.get(&p.id), b.get(&p.id)))
            .collect()
    }

    /// Whether `a` and `b` agree on every param in `params`.
    pub fn values_equal(params: &[Self], a: &ParamValues, b: &ParamValues) -> bool {
        Self::changed(params, a, b).is_empty()
    }

    /// Params whose value in `values` does not validate.
    pub fn invalid<'a>(params: &'a [Self], values: &ParamValues) -> Vec<&'a Self> {
        params
            .iter()
            .filter(|p| !p.validates(values.get(&p.id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{ParamDeclaration, ParamFactory};
    use crate::value::param_values;

    fn factory() -> ParamFactory {
        ParamFactory::default()
    }

    #[test]
    fn decode_failure_names_the_param() {
        let p = factory()
            .from_path("id", Some("int"), None)
            .expect("int exists");
        assert_eq!(p.decode("12").expect("valid int"), ParamValue::Int(12));
        match p.decode("twelve") {
            Err(ParamError::Validation { param, value }) => {
                assert_eq!(param, "id");
                assert_eq!(value, "twelve");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn value_falls_back_to_default() {
        let decl = ParamDeclaration::new().with_default(5);
        let p = factory()
            .from_config("page", Some(&decl))
            .expect("any exists");
        assert_eq!(p.value(None), Some(ParamValue::Int(5)));
        assert_eq!(p.value(Some(&ParamValue::Int(2))), Some(ParamValue::Int(2)));
        assert!(p.is_optional());
    }

    #[test]
    fn empty_string_for_optional_path_param_means_default() {
        let decl = ParamDeclaration::new().with_default("all");
        let p = factory()
            .from_path("filter", None, Some(&decl))
            .expect("string exists");
        assert_eq!(p.value(Some(&"".into())), Some("all".into()));
    }

    #[test]
    fn required_param_rejects_undefined() {
        let p = factory().from_path("id", None, None).expect("string exists");
        assert!(!p.is_optional());
        assert!(!p.validates(None));
        assert!(p.validates(Some(&"x".into())));
        assert!(!p.validates(Some(&"a/b".into())));
    }

    #[test]
    fn search_params_decode_arrays_automatically() {
        let p = factory().from_search("tag", None, None).expect("string exists");
        assert_eq!(p.array_mode(), ArrayMode::Auto);
        assert_eq!(
            p.decode_many(&["a".into()]).expect("valid"),
            Some("a".into())
        );
        assert_eq!(
            p.decode_many(&["a".into(), "b".into()]).expect("valid"),
            Some(ParamValue::Array(vec!["a".into(), "b".into()]))
        );
        assert_eq!(p.decode_many(&[]).expect("empty is fine"), None);
        assert_eq!(
            p.encode(&ParamValue::Array(vec!["a".into(), "b".into()])),
            vec!["a".to_owned(), "b".to_owned()]
        );
    }

    #[test]
    fn always_mode_wraps_scalars() {
        let decl = ParamDeclaration::new().with_array(true);
        let p = factory()
            .from_config("ids", Some(&decl))
            .expect("any exists");
        assert_eq!(
            p.value(Some(&"x".into())),
            Some(ParamValue::Array(vec!["x".into()]))
        );
        assert_eq!(
            p.decode("x").expect("valid"),
            ParamValue::Array(vec!["x".into()])
        );
    }

    #[test]
    fn changed_reports_differing_params_only() {
        let mut f = factory();
        let a = f.from_path("a", Some("int"), None).expect("int exists");
        let b = f.from_path("b", Some("int"), None).expect("int exists");
        let params = vec![a, b];
        let x = param_values([("a", ParamValue::Int(1)), ("b", ParamValue::Int(2))]);
        let y = param_values([("a", ParamValue::Int(1)), ("b", ParamValue::Int(3))]);
        let changed: Vec<&str> = Param::changed(&params, &x, &y)
            .into_iter()
            .map(Param::id)
            .collect();
        assert_eq!(changed, vec!["b"]);
        assert!(Param::values_equal(&params, &x, &x));
    }

    #[test]
    fn squash_deserializes_from_bool_or_marker() {
        #[derive(Deserialize)]
        struct Holder {
            squash: Squash,
        }
        let parse = |s: &str| -> Squash {
            serde_json::from_str::<Holder>(s)
                .expect("valid squash")
                .squash
        };
        assert_eq!(parse(r#"{"squash": false}"#), Squash::No);
        assert_eq!(parse(r#"{"squash": true}"#), Squash::Yes);
        assert_eq!(parse(r#"{"squash": "~"}"#), Squash::Replace("~".into()));
    }
}
