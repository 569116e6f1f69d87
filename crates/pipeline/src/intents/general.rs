//! Procedural help and the catch-all fallback.

use crate::error::IntentError;
use crate::pattern::Pattern;
use crate::registry::{Intent, IntentTag};

static HOW_TO_PREDICATE: Pattern = Pattern::new(
    r"(?i)(\bhow (do|can|should) i\b|\bhow to\b|\bsteps? to\b|\bwalk me through\b|\bguide me\b|\bset ?up\b)",
);

/// "How do I..." questions about using the product.
pub struct HowTo;

impl Intent for HowTo {
    fn key(&self) -> &'static str {
        "how_to"
    }

    fn label(&self) -> &'static str {
        "How-to help"
    }

    fn tags(&self) -> &'static [IntentTag] {
        &[IntentTag::Procedural]
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        HOW_TO_PREDICATE.is_match(message)
    }

    fn persona_hint(&self) -> Option<&'static str> {
        Some("Answer as steps: at most 5 numbered lines, one action per line.")
    }

    fn response_template(&self) -> Option<&'static str> {
        Some("1. First action\n2. Next action\n...\nEnd with where to find the setting.")
    }
}

/// Resolved when nothing else scores. Never matches on its own.
pub struct General;

impl Intent for General {
    fn key(&self) -> &'static str {
        super::GENERAL
    }

    fn label(&self) -> &'static str {
        "General question"
    }

    fn matches(&self, _message: &str) -> Result<bool, IntentError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn how_to_phrasings() {
        for msg in [
            "How do I connect my bank?",
            "walk me through invoicing",
            "steps to set up payroll",
            "how to export a report",
        ] {
            assert!(HowTo.matches(msg).unwrap(), "{msg}");
        }
        assert!(!HowTo.matches("how are sales").unwrap());
        assert!(HowTo.has_tag(IntentTag::Procedural));
    }

    #[test]
    fn general_never_matches() {
        assert!(!General.matches("anything at all").unwrap());
        assert!(General.recipe().is_none());
    }
}
