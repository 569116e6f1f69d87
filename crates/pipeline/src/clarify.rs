//! Clarification gate.
//!
//! Runs only when the classifier flags ambiguity. It is terminal: no
//! context is fetched and the model is never called.

use serde_json::json;
use steward_core::envelope::{Action, EnvelopeMeta, Outcome, ResponseEnvelope};

use crate::classifier::Classification;
use crate::registry::IntentRegistry;

const FOLLOW_UP: &str = "Tap an option, or rephrase with a little more detail.";

/// Deterministic disambiguation envelope for an ambiguous classification.
pub fn clarification_envelope(classification: &Classification, registry: &IntentRegistry) -> ResponseEnvelope {
    let options: Vec<(&'static str, &'static str)> = classification
        .top(2)
        .iter()
        .map(|c| {
            let label = registry.get(c.intent).map_or(c.intent, |i| i.label());
            (c.intent, label)
        })
        .collect();

    let question = match options.as_slice() {
        [(_, a), (_, b)] => format!("Just to be sure I help with the right thing: do you mean {a} or {b}?"),
        [(_, a)] => format!("Just to be sure: do you mean {a}?"),
        _ => "Could you tell me a bit more about what you need?".to_string(),
    };

    let actions = options
        .iter()
        .map(|(intent, label)| Action::SelectIntent {
            label: (*label).to_string(),
            intent: (*intent).to_string(),
        })
        .collect();

    let mut meta = EnvelopeMeta {
        intent: classification.resolved.to_string(),
        outcome: Outcome::Clarification,
        ambiguous: true,
        ..EnvelopeMeta::default()
    };
    meta.extra.insert(
        "candidates".into(),
        json!(
            classification
                .top(2)
                .iter()
                .map(|c| json!({"intent": c.intent, "score": c.total}))
                .collect::<Vec<_>>()
        ),
    );

    ResponseEnvelope {
        response_text: question,
        actions,
        follow_up_prompt: Some(FOLLOW_UP.to_string()),
        meta,
    }
}
