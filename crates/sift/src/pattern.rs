//! Pattern: compiled regular expressions on top of the ripgrep engine.
//!
//! Every regex in the crate (dispatch rules, artifact file claims, store
//! filters, process-id extraction) goes through [`Pattern`] so that
//! compilation errors surface in one place as [`PatternError`].

use std::fmt;

use grep_matcher::{Captures, Matcher};
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

#[derive(Clone)]
pub struct Pattern {
    source: String,
    matcher: RegexMatcher,
}

impl Pattern {
    /// Compile a case-sensitive pattern.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Self::build(pattern, true)
    }

    pub fn case_insensitive(pattern: &str) -> Result<Self, PatternError> {
        Self::build(pattern, false)
    }

    fn build(pattern: &str, case_sensitive: bool) -> Result<Self, PatternError> {
        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(!case_sensitive)
            .multi_line(false)
            .build(pattern)
            .map_err(|e| PatternError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            source: pattern.to_string(),
            matcher,
        })
    }

    #[inline]
    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text.as_bytes()).unwrap_or(false)
    }

    /// Return the text of capture group `group` for the first match, if any.
    pub fn capture<'t>(&self, text: &'t str, group: usize) -> Option<&'t str> {
        let mut caps = self.matcher.new_captures().ok()?;
        if !self.matcher.captures(text.as_bytes(), &mut caps).unwrap_or(false) {
            return None;
        }
        let m = caps.get(group)?;
        text.get(m.start()..m.end())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
