// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! URL patterns for states.
//!
//! ## Syntax
//!
//! - `/users/:id` and `/users/{id}` declare a path param of type `string`.
//! - `{id:int}` names a registered type; anything else after the colon is an
//!   inline regex (`{code:[A-Z]{3}}`).
//! - `?q&{page:int}` declares search params.
//! - A child's pattern is appended to its parent's; a leading `^` (handled by
//!   the builder) starts from the root instead.
//!
//! Matching is anchored. In non-strict mode a trailing slash is optional.
//! Optional params with [`Squash::Yes`] may be omitted from the path entirely;
//! with [`Squash::Replace`] the marker stands in for the default value.
//!
//! ```
//! use std::collections::BTreeMap;
//! use wayfarer_params::{ParamFactory, ParamValue, SearchValues};
//! use wayfarer_state::url::{MatcherConfig, UrlMatcher};
//!
//! let mut factory = ParamFactory::default();
//! let m = UrlMatcher::compile("/users/{id:int}?tab", &BTreeMap::new(), &mut factory, MatcherConfig::default())
//!     .unwrap();
//! let mut search = SearchValues::new();
//! search.insert("tab".into(), vec!["posts".into()]);
//! let values = m.exec("/users/7", &search).unwrap();
//! assert_eq!(values["id"], ParamValue::Int(7));
//! assert_eq!(m.format(&values).as_deref(), Some("/users/7?tab=posts"));
//! ```

use core::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use wayfarer_params::{Param, ParamDeclaration, ParamFactory, ParamValues, SearchValues, Squash};

use crate::error::StateError;

/// Matching options shared by every matcher a registry compiles.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MatcherConfig {
    /// Match paths ignoring ASCII and Unicode case.
    pub case_insensitive: bool,
    /// Require trailing slashes to match exactly.
    pub strict: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            strict: true,
        }
    }
}

/// A compiled URL pattern with its params.
///
/// `segments` holds the static text around path params, so
/// `segments.len() == path_params.len() + 1`.
#[derive(Clone, Debug)]
pub struct UrlMatcher {
    source: String,
    segments: Vec<String>,
    path_params: Vec<Param>,
    search_params: Vec<Param>,
    config: MatcherConfig,
    regex: Regex,
}

enum Piece {
    Static(String),
    Param { id: String, spec: Option<String> },
}

fn invalid(url: &str, reason: impl Into<String>) -> StateError {
    StateError::InvalidUrl {
        url: url.to_owned(),
        reason: reason.into(),
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_path(url: &str, path: &str) -> Result<Vec<Piece>, StateError> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek().copied().is_some_and(is_word) => {
                let mut id = String::new();
                while let Some(&n) = chars.peek().filter(|n| is_word(**n)) {
                    id.push(n);
                    chars.next();
                }
                pieces.push(Piece::Static(core::mem::take(&mut text)));
                pieces.push(Piece::Param { id, spec: None });
            }
            '{' => {
                let mut id = String::new();
                let mut spec = None;
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(':') => {
                            spec = Some(read_spec(url, &mut chars)?);
                            break;
                        }
                        Some(n) if is_word(n) => id.push(n),
                        Some(n) if n.is_whitespace() => {}
                        Some(n) => return Err(invalid(url, format!("unexpected '{n}' in param name"))),
                        None => return Err(invalid(url, "unclosed '{'")),
                    }
                }
                if id.is_empty() {
                    return Err(invalid(url, "empty param name"));
                }
                pieces.push(Piece::Static(core::mem::take(&mut text)));
                pieces.push(Piece::Param { id, spec });
            }
            c => text.push(c),
        }
    }
    pieces.push(Piece::Static(text));
    Ok(pieces)
}

/// Read a `{id:spec}` spec up to the closing brace, honoring nested braces and escapes.
fn read_spec(
    url: &str,
    chars: &mut core::iter::Peekable<core::str::Chars<'_>>,
) -> Result<String, StateError> {
    let mut spec = String::new();
    let mut depth = 0_usize;
    loop {
        match chars.next() {
            Some('\\') => {
                spec.push('\\');
                if let Some(n) = chars.next() {
                    spec.push(n);
                }
            }
            Some('{') => {
                depth += 1;
                spec.push('{');
            }
            Some('}') if depth == 0 => break,
            Some('}') => {
                depth -= 1;
                spec.push('}');
            }
            Some(n) => spec.push(n),
            None => return Err(invalid(url, "unclosed '{'")),
        }
    }
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(invalid(url, "empty param type"));
    }
    Ok(spec.to_owned())
}

fn parse_search(search: &str) -> Vec<(String, Option<String>)> {
    search
        .split('&')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            let inner = item
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .unwrap_or(item);
            match inner.split_once(':') {
                Some((id, ty)) => (id.trim().to_owned(), Some(ty.trim().to_owned())),
                None => (inner.trim().to_owned(), None),
            }
        })
        .collect()
}

fn path_param(
    factory: &mut ParamFactory,
    id: &str,
    spec: Option<&str>,
    decl: Option<&ParamDeclaration>,
) -> Result<Param, StateError> {
    let param = match spec {
        None => factory.from_path(id, None, decl)?,
        Some(name) if factory.types().contains(name) => factory.from_path(id, Some(name), decl)?,
        Some(pattern) => {
            let inline = factory.types_mut().get("string")?.with_pattern(pattern)?;
            factory.from_path_typed(id, inline, decl)?
        }
    };
    Ok(param)
}

impl UrlMatcher {
    /// Compile `pattern`, building params with `factory` and the matching `decls`.
    pub fn compile(
        pattern: &str,
        decls: &BTreeMap<String, ParamDeclaration>,
        factory: &mut ParamFactory,
        config: MatcherConfig,
    ) -> Result<Self, StateError> {
        let (path, search) = pattern.split_once('?').unwrap_or((pattern, ""));

        let mut segments = Vec::new();
        let mut path_params = Vec::new();
        let mut current = String::new();
        for piece in parse_path(pattern, path)? {
            match piece {
                Piece::Static(s) => current.push_str(&s),
                Piece::Param { id, spec } => {
                    segments.push(core::mem::take(&mut current));
                    path_params.push(path_param(factory, &id, spec.as_deref(), decls.get(&id))?);
                }
            }
        }
        segments.push(current);

        let search_params = parse_search(search)
            .into_iter()
            .map(|(id, ty)| factory.from_search(&id, ty.as_deref(), decls.get(&id)))
            .collect::<Result<Vec<_>, _>>()?;

        Self::assemble(pattern.to_owned(), segments, path_params, search_params, config)
    }

    /// An empty matcher that matches only the empty path (and `/` when not strict).
    pub fn root(config: MatcherConfig) -> Result<Self, StateError> {
        Self::assemble(String::new(), vec![String::new()], Vec::new(), Vec::new(), config)
    }

    /// Compile `pattern` relative to this matcher: its path continues this
    /// one's path, and the params of both are combined.
    pub fn append(
        &self,
        pattern: &str,
        decls: &BTreeMap<String, ParamDeclaration>,
        factory: &mut ParamFactory,
    ) -> Result<Self, StateError> {
        let child = Self::compile(pattern, decls, factory, self.config)?;

        let mut segments = self.segments.clone();
        let tail = segments.pop().unwrap_or_default();
        let mut child_segments = child.segments.into_iter();
        segments.push(tail + &child_segments.next().unwrap_or_default());
        segments.extend(child_segments);

        let mut path_params = self.path_params.clone();
        path_params.extend(child.path_params);
        let mut search_params = self.search_params.clone();
        search_params.extend(child.search_params);

        Self::assemble(
            format!("{}{}", self.source, pattern),
            segments,
            path_params,
            search_params,
            self.config,
        )
    }

    fn assemble(
        source: String,
        segments: Vec<String>,
        path_params: Vec<Param>,
        search_params: Vec<Param>,
        config: MatcherConfig,
    ) -> Result<Self, StateError> {
        let mut seen = BTreeSet::new();
        for p in path_params.iter().chain(&search_params) {
            if !seen.insert(p.id()) {
                return Err(StateError::DuplicateParam(p.id().to_owned()));
            }
        }

        let mut re = String::new();
        if config.case_insensitive {
            re.push_str("(?i)");
        }
        re.push('^');
        for (i, (segment, param)) in segments.iter().zip(&path_params).enumerate() {
            let pattern = param.param_type().pattern();
            match param.squash() {
                Squash::Yes => match segment.strip_suffix('/') {
                    Some(before) => {
                        re.push_str(&regex::escape(before));
                        re.push_str(&format!("(?:/(?P<p{i}>{pattern}))?"));
                    }
                    None => {
                        re.push_str(&regex::escape(segment));
                        re.push_str(&format!("(?P<p{i}>{pattern})?"));
                    }
                },
                Squash::Replace(marker) => {
                    re.push_str(&regex::escape(segment));
                    re.push_str(&format!("(?P<p{i}>{}|{pattern})", regex::escape(marker)));
                }
                Squash::No => {
                    re.push_str(&regex::escape(segment));
                    re.push_str(&format!("(?P<p{i}>{pattern})"));
                }
            }
        }
        let last = segments.last().map(String::as_str).unwrap_or_default();
        if config.strict {
            re.push_str(&regex::escape(last));
        } else {
            re.push_str(&regex::escape(last.strip_suffix('/').unwrap_or(last)));
            re.push_str("/?");
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|err| invalid(&source, err.to_string()))?;
        Ok(Self {
            source,
            segments,
            path_params,
            search_params,
            config,
            regex,
        })
    }

    /// The pattern text this matcher was built from, including inherited parts.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Matching options.
    pub fn config(&self) -> MatcherConfig {
        self.config
    }

    /// Path params in URL order.
    pub fn path_params(&self) -> &[Param] {
        &self.path_params
    }

    /// Search params in declaration order.
    pub fn search_params(&self) -> &[Param] {
        &self.search_params
    }

    /// Every param, path first.
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.path_params.iter().chain(&self.search_params)
    }

    /// Look up a param by id.
    pub fn param(&self, id: &str) -> Option<&Param> {
        self.params().find(|p| p.id() == id)
    }

    /// Match a path and decoded search values, returning param values with
    /// defaults applied. `None` if the path does not match or a value fails to decode.
    pub fn exec(&self, path: &str, search: &SearchValues) -> Option<ParamValues> {
        let caps = self.regex.captures(path)?;
        let mut values = ParamValues::new();

        for (i, param) in self.path_params.iter().enumerate() {
            let raw = caps.name(&format!("p{i}")).map(|m| m.as_str());
            let decoded = match (raw, param.squash()) {
                (None, _) => None,
                (Some(raw), Squash::Replace(marker)) if raw == marker => None,
                (Some(raw), _) => {
                    let text = if param.is_raw() {
                        raw.to_owned()
                    } else {
                        decode_component(raw)
                    };
                    Some(param.decode(&text).ok()?)
                }
            };
            if let Some(value) = param.value(decoded.as_ref()) {
                values.insert(param.id().to_owned(), value);
            }
        }

        for param in &self.search_params {
            let raws = search.get(param.id()).map(Vec::as_slice).unwrap_or_default();
            let decoded = param.decode_many(raws).ok()?;
            if let Some(value) = param.value(decoded.as_ref()) {
                values.insert(param.id().to_owned(), value);
            }
        }
        Some(values)
    }

    /// Build a URL from `values`, or `None` if any param value is invalid.
    pub fn format(&self, values: &ParamValues) -> Option<String> {
        let keep = Squash::No;
        let mut out = String::new();
        for (segment, param) in self.segments.iter().zip(&self.path_params) {
            let value = param.value(values.get(param.id()));
            if !param.validates(value.as_ref()) {
                return None;
            }
            let squash = if param.is_default(value.as_ref()) {
                param.squash()
            } else {
                &keep
            };
            match squash {
                Squash::Yes => out.push_str(segment.strip_suffix('/').unwrap_or(segment)),
                Squash::Replace(marker) => {
                    out.push_str(segment);
                    out.push_str(marker);
                }
                Squash::No => {
                    out.push_str(segment);
                    let encoded = value
                        .as_ref()
                        .map(|v| param.encode(v).join(","))
                        .unwrap_or_default();
                    if param.is_raw() {
                        out.push_str(&encoded);
                    } else {
                        out.push_str(&encode_component(&encoded));
                    }
                }
            }
        }
        if let Some(last) = self.segments.last() {
            out.push_str(last);
        }

        let mut query = Vec::new();
        for param in &self.search_params {
            let Some(value) = param.value(values.get(param.id())) else {
                continue;
            };
            if !param.validates(Some(&value)) {
                return None;
            }
            if param.is_default(Some(&value)) && *param.squash() == Squash::Yes {
                continue;
            }
            for encoded in param.encode(&value) {
                let encoded = if param.is_raw() {
                    encoded
                } else {
                    encode_component(&encoded)
                };
                query.push(format!("{}={encoded}", encode_component(param.id())));
            }
        }
        if !query.is_empty() {
            out.push('?');
            out.push_str(&query.join("&"));
        }
        Some(out)
    }

    /// Weights for specificity ordering: `/` is 1, static text 2, a param 3.
    fn weights(&self) -> Vec<u8> {
        fn push_static(weights: &mut Vec<u8>, text: &str) {
            let mut in_word = false;
            for c in text.chars() {
                if c == '/' {
                    weights.push(1);
                    in_word = false;
                } else if !in_word {
                    weights.push(2);
                    in_word = true;
                }
            }
        }
        let mut weights = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            push_static(&mut weights, segment);
            if i < self.path_params.len() {
                weights.push(3);
            }
        }
        weights
    }

    /// Specificity order: more specific patterns sort first.
    ///
    /// Compares per-segment weights, so a static segment beats a param in the
    /// same position.
    pub fn compare(&self, other: &Self) -> Ordering {
        let (a, b) = (self.weights(), other.weights());
        let len = a.len().max(b.len());
        (0..len)
            .map(|i| {
                let l = a.get(i).copied().unwrap_or(0);
                let r = b.get(i).copied().unwrap_or(0);
                l.cmp(&r)
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&b)
}

/// Percent-encode everything outside the unreserved set, including `/`.
pub fn encode_component(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        if is_unreserved(b) {
            out.push(char::from(b));
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Decode `%XX` escapes. Malformed escapes are kept literally; invalid UTF-8 is replaced.
pub fn decode_component(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = core::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Split a query string into decoded keys and values; repeated keys collect in order.
pub fn parse_query(query: &str) -> SearchValues {
    let mut values = SearchValues::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        values
            .entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    values
}
