//! Lazily compiled regex patterns usable from `static` items.

use regex_lite::Regex;
use std::sync::OnceLock;

use crate::error::IntentError;

/// A regex compiled on first use.
///
/// Compilation errors are cached too, so a broken pattern fails the same
/// way on every call instead of panicking.
pub struct Pattern {
    source: &'static str,
    compiled: OnceLock<Result<Regex, String>>,
}

impl Pattern {
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn regex(&self) -> Result<&Regex, IntentError> {
        self.compiled
            .get_or_init(|| Regex::new(self.source).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|reason| IntentError::Pattern {
                pattern: self.source.to_string(),
                reason: reason.clone(),
            })
    }

    pub fn is_match(&self, text: &str) -> Result<bool, IntentError> {
        Ok(self.regex()?.is_match(text))
    }

    /// First capture group of the first match, if any.
    pub fn capture(&self, text: &str) -> Result<Option<String>, IntentError> {
        Ok(self
            .regex()?
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string()))
    }
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// A keyword pattern that adds `weight` to an intent's score when it matches.
#[derive(Debug)]
pub struct KeywordBoost {
    pub pattern: Pattern,
    pub weight: f64,
}

impl KeywordBoost {
    pub const fn new(source: &'static str, weight: f64) -> Self {
        Self {
            pattern: Pattern::new(source),
            weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static DAYS: Pattern = Pattern::new(r"(?i)over\s+(\d+)\s+days?");
    static BROKEN: Pattern = Pattern::new(r"(unclosed");

    #[test]
    fn matches_and_captures() {
        assert!(DAYS.is_match("anything OVER 45 days?").unwrap());
        assert_eq!(DAYS.capture("over 90 days").unwrap().as_deref(), Some("90"));
        assert_eq!(DAYS.capture("nothing here").unwrap(), None);
    }

    #[test]
    fn broken_pattern_is_an_error_every_time() {
        assert!(BROKEN.is_match("x").is_err());
        let err = BROKEN.is_match("y").unwrap_err();
        assert!(matches!(err, IntentError::Pattern { .. }));
    }
}
