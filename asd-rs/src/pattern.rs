//! Line patterns for statement recognition.
//!
//! Every statement form is recognised by an anchored regex matched against
//! the whole trimmed line.  Keywords are case-insensitive, so patterns are
//! always compiled with case folding on.  Patterns are declared as `static`
//! items and compiled on first use.

use std::sync::OnceLock;

use regex::{Captures, Regex, RegexBuilder};
use thiserror::Error;

/// A pattern source that the regex engine rejected.
#[derive(Debug, Error)]
#[error("bad line pattern `{src}`: {source}")]
pub struct PatternError {
    pub src: String,
    #[source]
    pub source: regex::Error,
}

/// Compile `src` case-insensitively.
pub fn compile(src: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(src)
        .case_insensitive(true)
        .build()
        .map_err(|source| PatternError {
            src: src.to_owned(),
            source,
        })
}

// ── LinePattern ───────────────────────────────────────────────────────────────

/// A lazily compiled, case-insensitive line pattern.
///
/// A source that fails to compile is logged once and then never matches.
pub struct LinePattern {
    src: &'static str,
    compiled: OnceLock<Option<Regex>>,
}

impl LinePattern {
    pub const fn new(src: &'static str) -> Self {
        LinePattern {
            src,
            compiled: OnceLock::new(),
        }
    }

    /// The compiled regex, or `None` if the source was rejected.
    pub fn regex(&self) -> Option<&Regex> {
        self.compiled
            .get_or_init(|| match compile(self.src) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!("{e}");
                    None
                }
            })
            .as_ref()
    }

    /// Returns `true` if this pattern matches `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex().is_some_and(|re| re.is_match(text))
    }

    /// Attempt a match and return the capture groups on success.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.regex()?.captures(text)
    }
}

impl std::fmt::Debug for LinePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LinePattern").field(&self.src).finish()
    }
}

/// Text of capture group `i`, or `""` when the group did not participate.
pub fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    static GREETING: LinePattern = LinePattern::new(r"^HELLO\s+(\w+)(?:\s+(\d+))?$");
    static BROKEN: LinePattern = LinePattern::new(r"^(unclosed");

    #[test]
    fn matches_case_insensitively() {
        assert!(GREETING.is_match("hello world"));
        assert!(GREETING.is_match("HeLLo world"));
        assert!(!GREETING.is_match("say hello world"));
    }

    #[test]
    fn capture_groups() {
        let caps = GREETING.captures("HELLO bob 3").expect("should match");
        assert_eq!(group(&caps, 1), "bob");
        assert_eq!(group(&caps, 2), "3");

        let caps = GREETING.captures("HELLO bob").expect("should match");
        assert_eq!(group(&caps, 2), "");
    }

    #[test]
    fn broken_pattern_never_matches() {
        assert!(!BROKEN.is_match("(unclosed"));
        assert!(BROKEN.captures("(unclosed").is_none());
    }

    #[test]
    fn compile_reports_source() {
        let err = compile("[").unwrap_err();
        assert_eq!(err.src, "[");
        assert!(err.to_string().starts_with("bad line pattern"));
    }
}
