//! Intent classifier — ranks registered intents for one turn.
//!
//! Scoring per intent:
//!
//! ```text
//! total = base (predicate ? 1 : 0)
//!       + route bonus      (intent is in the category implied by the path)
//!       + keyword boosts   (each matching boost regex adds its weight)
//!       + continuity bonus (email-tagged intent, thread/account hint present)
//! ```
//!
//! Candidates are sorted by total, stable, so ties keep registration
//! order. The classifier never fails: a broken predicate or boost scores 0
//! and is recorded as a [`StageFault`].

use serde::Serialize;
use steward_config::ClassifierConfig;
use steward_core::request::ChatRequest;
use tracing::{debug, warn};

use crate::error::{Stage, StageFault};
use crate::intents::GENERAL;
use crate::registry::{Intent, IntentRegistry, IntentTag};

/// Scores within this distance are treated as equal at the thresholds.
const EPSILON: f64 = 1e-9;

/// One ranked intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub intent: &'static str,
    /// Predicate result as 0 or 1
    pub base: f64,
    /// Sum of route, keyword and continuity bonuses
    pub bonus: f64,
    pub total: f64,
}

/// Why the top two candidates are too close to call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambiguity {
    pub top: &'static str,
    pub runner_up: &'static str,
    pub gap: f64,
}

/// Classifier result for one turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Always set, even when ambiguous
    pub resolved: &'static str,
    /// Ranked, highest first
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambiguity: Option<Ambiguity>,
    /// The client named the intent explicitly
    pub forced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_category: Option<String>,
    #[serde(skip)]
    pub faults: Vec<StageFault>,
}

impl Classification {
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguity.is_some()
    }

    /// The top `n` candidates.
    pub fn top(&self, n: usize) -> &[Candidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }
}

/// Scores messages against an [`IntentRegistry`].
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Rank every intent and resolve exactly one.
    pub fn classify(&self, registry: &IntentRegistry, request: &ChatRequest) -> Classification {
        let route_category = request.route.as_deref().and_then(|route| {
            self.config
                .categories
                .iter()
                .find(|c| c.matches_route(route))
        });

        if let Some(forced) = self.forced(registry, request) {
            return Classification {
                resolved: forced,
                candidates: vec![Candidate {
                    intent: forced,
                    base: 1.0,
                    bonus: 0.0,
                    total: 1.0,
                }],
                ambiguity: None,
                forced: true,
                route_category: route_category.map(|c| c.name.clone()),
                faults: Vec::new(),
            };
        }

        let continuity = request.hints.has_continuity();
        let mut faults = Vec::new();
        let mut candidates: Vec<Candidate> = registry
            .iter()
            .map(|intent| {
                let base = match intent.matches(&request.message) {
                    Ok(true) => 1.0,
                    Ok(false) => 0.0,
                    Err(e) => {
                        warn!(intent = intent.key(), error = %e, "Predicate failed, scoring 0");
                        faults.push(StageFault::intent(Stage::Classify, &e));
                        0.0
                    }
                };

                let mut bonus = self.keyword_bonus(intent, &request.message, &mut faults);
                if route_category.is_some_and(|c| c.intents.iter().any(|k| k == intent.key())) {
                    bonus += self.config.route_bonus;
                }
                if continuity && intent.has_tag(IntentTag::Email) {
                    bonus += self.config.continuity_bonus;
                }

                Candidate {
                    intent: intent.key(),
                    base,
                    bonus,
                    total: base + bonus,
                }
            })
            .collect();

        // Stable: equal totals keep registration order
        candidates.sort_by(|a, b| b.total.total_cmp(&a.total));

        let resolved = self.resolve(registry, &candidates);
        let ambiguity = self.ambiguity(&candidates);

        debug!(
            resolved,
            top_score = candidates.first().map(|c| c.total).unwrap_or_default(),
            ambiguous = ambiguity.is_some(),
            "Classified turn"
        );

        Classification {
            resolved,
            candidates,
            ambiguity,
            forced: false,
            route_category: route_category.map(|c| c.name.clone()),
            faults,
        }
    }

    /// Registered override key, if any. Unknown keys are logged and ignored.
    fn forced(&self, registry: &IntentRegistry, request: &ChatRequest) -> Option<&'static str> {
        let requested = request.intent.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        match registry.get(requested) {
            Some(intent) => Some(intent.key()),
            None => {
                warn!(intent = requested, "Ignoring override for unregistered intent");
                None
            }
        }
    }

    fn keyword_bonus(&self, intent: &dyn Intent, message: &str, faults: &mut Vec<StageFault>) -> f64 {
        intent
            .keyword_boosts()
            .iter()
            .map(|boost| match boost.pattern.is_match(message) {
                Ok(true) => boost.weight,
                Ok(false) => 0.0,
                Err(e) => {
                    warn!(intent = intent.key(), error = %e, "Keyword boost failed, skipping");
                    faults.push(StageFault::intent(Stage::Classify, &e));
                    0.0
                }
            })
            .sum()
    }

    fn resolve(&self, registry: &IntentRegistry, ranked: &[Candidate]) -> &'static str {
        if let Some(top) = ranked.first()
            && top.total > self.config.resolve_floor
        {
            return top.intent;
        }

        // Nothing scored: first predicate match in registration order
        if let Some(hit) = registry
            .iter()
            .find(|i| ranked.iter().any(|c| c.intent == i.key() && c.base > 0.0))
        {
            return hit.key();
        }

        registry
            .get(&self.config.fallback_intent)
            .map(|i| i.key())
            .unwrap_or(GENERAL)
    }

    fn ambiguity(&self, ranked: &[Candidate]) -> Option<Ambiguity> {
        let [top, second, ..] = ranked else {
            return None;
        };
        let gap = top.total - second.total;
        let close = second.total + EPSILON >= self.config.ambiguity_floor
            && gap <= self.config.ambiguity_gap + EPSILON;
        close.then(|| Ambiguity {
            top: top.intent,
            runner_up: second.intent,
            gap,
        })
    }
}
