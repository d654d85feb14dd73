// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The route table: URL matchers of navigable states, most specific first.

use std::sync::Arc;

use wayfarer_params::ParamValues;

use crate::object::StateObject;
use crate::url::{UrlMatcher, parse_query};

#[derive(Clone, Debug)]
struct UrlRule {
    state: String,
    matcher: Arc<UrlMatcher>,
    seq: u64,
}

/// A successful URL match.
#[derive(Clone, Debug, PartialEq)]
pub struct UrlMatch {
    /// Matched state name.
    pub state: String,
    /// Decoded param values with defaults applied.
    pub params: ParamValues,
}

/// Ordered URL rules.
///
/// Ordering is by [`UrlMatcher::compare`], then by attach order.
#[derive(Debug, Default)]
pub struct UrlRules {
    rules: Vec<UrlRule>,
    next_seq: u64,
}

impl UrlRules {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a state's URL. Abstract states and states without a URL are skipped.
    ///
    /// Returns whether a rule was added. Re-attaching replaces the old rule.
    pub fn attach(&mut self, state: &StateObject) -> bool {
        let Some(matcher) = state.url.clone() else {
            return false;
        };
        if state.is_abstract() {
            return false;
        }
        self.detach(state.name());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.rules.push(UrlRule {
            state: state.name().to_owned(),
            matcher,
            seq,
        });
        self.rules
            .sort_by(|a, b| a.matcher.compare(&b.matcher).then(a.seq.cmp(&b.seq)));
        tracing::debug!(state = %state.name(), rules = self.rules.len(), "attached route");
        true
    }

    /// Detach the rule for `state`, returning whether one existed.
    pub fn detach(&mut self, state: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.state != state);
        before != self.rules.len()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// State names in match order.
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.state.as_str())
    }

    /// Match a path with pre-decoded search values.
    pub fn match_path(&self, path: &str, search: &wayfarer_params::SearchValues) -> Option<UrlMatch> {
        self.rules.iter().find_map(|rule| {
            rule.matcher.exec(path, search).map(|params| UrlMatch {
                state: rule.state.clone(),
                params,
            })
        })
    }

    /// Match a URL such as `/users/3?tab=posts#top`. The fragment is ignored.
    pub fn match_url(&self, url: &str) -> Option<UrlMatch> {
        let url = url.split_once('#').map_or(url, |(before, _)| before);
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        self.match_path(path, &parse_query(query))
    }
}
