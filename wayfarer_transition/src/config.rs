// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Router configuration.

use serde::Deserialize;
use wayfarer_params::Squash;
use wayfarer_state::MatcherConfig;

/// Settings fixed when a [`Router`](crate::Router) is created.
///
/// Every field has a default, so a TOML document only needs the keys it
/// changes:
///
/// ```
/// use wayfarer_transition::RouterConfig;
///
/// let config = RouterConfig::from_toml_str("max_redirects = 3\nstrict_mode = false").unwrap();
/// assert_eq!(config.max_redirects, 3);
/// assert!(!config.strict_mode);
/// assert_eq!(config.history_limit, 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Match URL paths without regard to case.
    pub case_insensitive: bool,
    /// Require trailing slashes to match exactly.
    pub strict_mode: bool,
    /// Squash policy for params that do not choose one.
    pub default_squash_policy: Squash,
    /// How many redirects one `run` may follow.
    pub max_redirects: usize,
    /// Size of the transition history queue.
    pub history_limit: usize,
    /// Size of the successful transitions queue.
    pub success_limit: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            strict_mode: true,
            default_squash_policy: Squash::No,
            max_redirects: 20,
            history_limit: 1,
            success_limit: 1,
        }
    }
}

impl RouterConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// URL matcher settings.
    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            case_insensitive: self.case_insensitive,
            strict: self.strict_mode,
        }
    }
}
