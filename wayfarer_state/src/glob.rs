// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dotted state-name globs.
//!
//! - `*` matches exactly one name segment.
//! - `**` matches zero or more segments.
//! - Anything else matches the segment literally.
//!
//! ```
//! use wayfarer_state::glob::Glob;
//! assert!(Glob::new("admin.*").matches("admin.users"));
//! assert!(!Glob::new("admin.*").matches("admin.users.edit"));
//! assert!(Glob::new("admin.**").matches("admin"));
//! assert!(Glob::new("**.edit").matches("admin.users.edit"));
//! ```

/// A compiled state-name pattern.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Glob {
    text: String,
    segments: Vec<String>,
}

impl Glob {
    /// Compile `text`. Plain names compile to exact matches.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = text.split('.').map(str::to_owned).collect();
        Self { text, segments }
    }

    /// Whether `text` uses any wildcard.
    pub fn is_glob(text: &str) -> bool {
        text.contains('*')
    }

    /// The source text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether `name` matches.
    pub fn matches(&self, name: &str) -> bool {
        let name: Vec<&str> = name.split('.').collect();
        match_segments(&self.segments, &name)
    }
}

fn match_segments(pattern: &[String], name: &[&str]) -> bool {
    match pattern.split_first() {
        None => name.is_empty(),
        Some((head, rest)) if head == "**" => {
            (0..=name.len()).any(|skip| match_segments(rest, &name[skip..]))
        }
        Some((head, rest)) => match name.split_first() {
            Some((seg, name_rest)) => {
                (head == "*" || head == seg) && match_segments(rest, name_rest)
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names() {
        let g = Glob::new("home.about");
        assert!(g.matches("home.about"));
        assert!(!g.matches("home"));
        assert!(!g.matches("home.about.team"));
        assert!(!Glob::is_glob("home.about"));
    }

    #[test]
    fn single_star_is_one_segment() {
        let g = Glob::new("home.*.edit");
        assert!(g.matches("home.users.edit"));
        assert!(!g.matches("home.edit"));
        assert!(!g.matches("home.a.b.edit"));
    }

    #[test]
    fn double_star_spans_any_depth() {
        let g = Glob::new("home.**");
        assert!(g.matches("home"));
        assert!(g.matches("home.a"));
        assert!(g.matches("home.a.b.c"));
        assert!(!g.matches("homer"));
        assert!(Glob::new("**").matches(""));
        assert!(Glob::new("**.leaf").matches("leaf"));
        assert!(Glob::new("a.**.z").matches("a.z"));
        assert!(Glob::new("a.**.z").matches("a.b.c.z"));
    }
}
