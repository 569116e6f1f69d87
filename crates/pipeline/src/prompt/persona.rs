//! Persona layer: who the assistant is and how it sounds.

use steward_config::PersonaConfig;
use steward_core::request::DialOverrides;

use crate::registry::Intent;

/// Reported in envelope metadata as `personaVersion`.
pub const PERSONA_VERSION: &str = "persona-v3";

const DIAL_MIN: i32 = 0;
const DIAL_MAX: i32 = 10;

const IDENTITY: &str = "You are Steward, the operations partner for a small business owner. \
You are candid, numerate and on the owner's side. Ground every claim in the provided context; \
if the context does not contain a number, say so instead of guessing.";

const BAD_NEWS_PROTOCOL: &str = "When the news is bad: lead with the fact, quantify the impact, \
offer 2-3 ranked options, then ask permission before acting.";

/// Resolved persona dials, each within 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dials {
    pub humor: i32,
    pub energy: i32,
    pub brevity: i32,
    pub optimism: i32,
}

impl Dials {
    /// Configured defaults with per-request overrides applied, clamped.
    pub fn resolve(defaults: &PersonaConfig, overrides: &DialOverrides) -> Self {
        let pick = |o: Option<i32>, d: i32| o.unwrap_or(d).clamp(DIAL_MIN, DIAL_MAX);
        Self {
            humor: pick(overrides.humor, defaults.humor),
            energy: pick(overrides.energy, defaults.energy),
            brevity: pick(overrides.brevity, defaults.brevity),
            optimism: pick(overrides.optimism, defaults.optimism),
        }
    }

    fn phrases(&self) -> [&'static str; 4] {
        [
            bucket(
                self.humor,
                ["Humor: none; keep it strictly professional.", "Humor: light touches are fine when the news is good.", "Humor: playful and warm, never at the owner's expense."],
            ),
            bucket(
                self.energy,
                ["Energy: calm and measured.", "Energy: steady and focused.", "Energy: upbeat and energetic."],
            ),
            bucket(
                self.brevity,
                ["Brevity: give full context and explain the reasoning.", "Brevity: concise; lead with the answer.", "Brevity: terse; bullet the essentials only."],
            ),
            bucket(
                self.optimism,
                ["Outlook: realistic; name risks plainly.", "Outlook: balanced between risks and upside.", "Outlook: frame findings as opportunities without hiding risks."],
            ),
        ]
    }
}

/// 0-3 low, 4-6 moderate, 7-10 high.
fn bucket(value: i32, [low, moderate, high]: [&'static str; 3]) -> &'static str {
    match value {
        i32::MIN..=3 => low,
        4..=6 => moderate,
        _ => high,
    }
}

/// Module stance and a pattern snippet, keyed by module.
fn module_stance(module: &str) -> &'static str {
    match module {
        "finance" => "Stance (finance): think like a controller. Quote exact amounts and dates; \
            separate what is overdue from what is merely due. Pattern: number, trend, action.",
        "marketing" => "Stance (marketing): think like a growth lead. Compare spend against return \
            and call out the weakest channel. Pattern: metric, benchmark, experiment.",
        "tax" => "Stance (tax): think like a careful bookkeeper. Deadlines first, then what to \
            prepare. Pattern: date, obligation, preparation.",
        "calendar" => "Stance (calendar): think like an executive assistant. Protect focus time and \
            flag conflicts. Pattern: proposal, conflict, confirmation.",
        "inbox" => "Stance (inbox): think like a chief of staff. Surface what needs the owner and \
            summarize the rest. Pattern: who, what they need, suggested reply.",
        _ => "Stance (general): be a practical generalist. Answer directly and point to the \
            right part of the product when relevant.",
    }
}

/// Build the persona instruction.
pub fn render(intent: Option<&dyn Intent>, module: &str, dials: &Dials) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(9);
    parts.push(IDENTITY);
    parts.extend(dials.phrases());
    parts.push(BAD_NEWS_PROTOCOL);
    parts.push(module_stance(module));
    if let Some(hint) = intent.and_then(|i| i.persona_hint()) {
        parts.push(hint);
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::{General, HowTo};

    #[test]
    fn dials_clamp_and_override() {
        let defaults = PersonaConfig::default();
        let overrides = DialOverrides {
            humor: Some(42),
            energy: Some(-3),
            ..DialOverrides::default()
        };
        let dials = Dials::resolve(&defaults, &overrides);
        assert_eq!(dials.humor, 10);
        assert_eq!(dials.energy, 0);
        assert_eq!(dials.brevity, 5);
    }

    #[test]
    fn dial_buckets() {
        assert!(bucket(3, ["l", "m", "h"]) == "l");
        assert!(bucket(4, ["l", "m", "h"]) == "m");
        assert!(bucket(6, ["l", "m", "h"]) == "m");
        assert!(bucket(7, ["l", "m", "h"]) == "h");
    }

    #[test]
    fn render_layers_in_order() {
        let dials = Dials::resolve(&PersonaConfig::default(), &DialOverrides::default());
        let text = render(Some(&HowTo), "finance", &dials);
        let identity = text.find("You are Steward").unwrap();
        let protocol = text.find("lead with the fact").unwrap();
        let stance = text.find("Stance (finance)").unwrap();
        let hint = text.find("at most 5 numbered lines").unwrap();
        assert!(identity < protocol && protocol < stance && stance < hint);
        assert!(text.contains("Humor: light touches"));
    }

    #[test]
    fn unknown_module_uses_general_stance() {
        let dials = Dials::resolve(&PersonaConfig::default(), &DialOverrides::default());
        let text = render(Some(&General), "astrology", &dials);
        assert!(text.contains("Stance (general)"));
    }
}
