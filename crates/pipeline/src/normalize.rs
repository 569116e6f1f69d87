//! Response normalizer — folds a [`ModelOutput`] into the envelope.

use steward_config::PruneConfig;
use steward_core::envelope::{Action, EnvelopeMeta, Outcome, ResponseEnvelope};

use crate::context::prune_map;
use crate::output::ModelOutput;

/// Maximum number of extra fields carried into envelope metadata.
pub const MAX_EXTRA_KEYS: usize = 16;

/// Meta field names the pipeline owns; extras cannot overwrite them.
const RESERVED_META_KEYS: &[&str] = &[
    "intent",
    "outcome",
    "forced",
    "ambiguous",
    "cacheHit",
    "error",
    "diagnostics",
    "personaVersion",
    "styleVersion",
    "timings",
];

const FALLBACK_TEXT: &str =
    "Sorry, I couldn't put an answer together just now. Please try again in a moment.";

const CANCELLED_TEXT: &str = "Request cancelled.";

/// Envelope for an answered turn. Actions keep the order chips,
/// navigation, call-to-action.
pub fn normalize(output: ModelOutput, intent: &str, prune: &PruneConfig) -> ResponseEnvelope {
    let mut actions: Vec<Action> = output
        .chips
        .into_iter()
        .map(|c| Action::Chip {
            label: c.label,
            prompt: c.prompt,
        })
        .collect();
    if let Some(nav) = output.navigate {
        actions.push(Action::Navigate {
            label: nav.label,
            route: nav.route,
        });
    }
    if let Some(cta) = output.call_to_action {
        actions.push(Action::CallToAction {
            label: cta.label,
            action: cta.action,
            payload: cta.payload,
        });
    }

    let mut extras = output.extras;
    extras.retain(|k, _| !RESERVED_META_KEYS.contains(&k.as_str()));

    ResponseEnvelope {
        response_text: output.text,
        actions,
        follow_up_prompt: output.follow_up.filter(|f| !f.trim().is_empty()),
        meta: EnvelopeMeta {
            intent: intent.to_string(),
            outcome: Outcome::Answered,
            extra: prune_map(&extras, prune, MAX_EXTRA_KEYS),
            ..EnvelopeMeta::default()
        },
    }
}

/// Fixed safe envelope used when the model call fails.
pub fn fallback_envelope(intent: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        response_text: FALLBACK_TEXT.to_string(),
        actions: Vec::new(),
        follow_up_prompt: None,
        meta: EnvelopeMeta {
            intent: intent.to_string(),
            outcome: Outcome::Fallback,
            error: true,
            ..EnvelopeMeta::default()
        },
    }
}

/// Envelope for a turn the caller abandoned.
pub fn cancelled_envelope(intent: &str) -> ResponseEnvelope {
    ResponseEnvelope {
        response_text: CANCELLED_TEXT.to_string(),
        actions: Vec::new(),
        follow_up_prompt: None,
        meta: EnvelopeMeta {
            intent: intent.to_string(),
            outcome: Outcome::Cancelled,
            ..EnvelopeMeta::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{CallToAction, Chip, NavigateTarget};
    use serde_json::{Value, json};

    #[test]
    fn actions_keep_legacy_order() {
        let output = ModelOutput {
            text: "Done".into(),
            chips: vec![Chip {
                label: "More".into(),
                prompt: "tell me more".into(),
            }],
            navigate: Some(NavigateTarget {
                label: "Open".into(),
                route: "/finance".into(),
            }),
            call_to_action: Some(CallToAction {
                label: "Send".into(),
                action: "send".into(),
                payload: Value::Null,
            }),
            ..ModelOutput::default()
        };
        let env = normalize(output, "ar_aging", &PruneConfig::default());
        let kinds: Vec<_> = env
            .actions
            .iter()
            .map(|a| match a {
                Action::Chip { .. } => "chip",
                Action::Navigate { .. } => "navigate",
                Action::CallToAction { .. } => "cta",
                Action::SelectIntent { .. } => "select",
            })
            .collect();
        assert_eq!(kinds, vec!["chip", "navigate", "cta"]);
        assert_eq!(env.meta.outcome, Outcome::Answered);
        assert!(!env.meta.error);
    }

    #[test]
    fn extras_are_capped_and_cannot_shadow_meta() {
        let mut output = ModelOutput::text("hi");
        for i in 0..40 {
            output.extras.insert(format!("k{i:02}"), json!(i));
        }
        output.extras.insert("error".into(), json!(false));
        output.extras.insert("chart".into(), json!({"kind": "bar", "note": "x".repeat(5000)}));

        let env = normalize(output, "general", &PruneConfig::default());
        assert_eq!(env.meta.extra.len(), MAX_EXTRA_KEYS);
        assert!(!env.meta.extra.contains_key("error"));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["meta"]["intent"], "general");
    }

    #[test]
    fn blank_follow_up_is_dropped() {
        let mut output = ModelOutput::text("hi");
        output.follow_up = Some("  ".into());
        assert!(normalize(output, "general", &PruneConfig::default()).follow_up_prompt.is_none());
    }

    #[test]
    fn fallback_is_flagged() {
        let env = fallback_envelope("cash_flow");
        assert!(env.meta.error);
        assert!(env.actions.is_empty());
        assert_eq!(env.meta.outcome, Outcome::Fallback);
        assert!(!env.response_text.is_empty());
    }
}
