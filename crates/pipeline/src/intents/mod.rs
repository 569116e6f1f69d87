//! Built-in intents.
//!
//! A representative set of domain intents plus the generic fallback.
//! Registration order (used only by the no-score first-match scan):
//!
//! | # | Key | Module | Recipe | Cached |
//! |---|-----|--------|--------|--------|
//! | 1 | `ar_aging` | finance | open invoices bucketed by days overdue | per threshold |
//! | 2 | `cash_flow` | finance | concurrent transactions / receipts / obligations | per window |
//! | 3 | `revenue_summary` | finance | inflows for a period | per period |
//! | 4 | `expense_breakdown` | finance | expenses by category and vendor | per period |
//! | 5 | `campaign_performance` | marketing | campaign metrics | per status filter |
//! | 6 | `tax_deadlines` | tax | upcoming filings | yes |
//! | 7 | `schedule_meeting` | calendar | upcoming events | no |
//! | 8 | `email_triage` | inbox | recent inbox | per search query |
//! | 9 | `email_reply` | inbox | one thread | per thread |
//! | 10 | `how_to` | general | — | — |
//! | 11 | `general` | general | — | — |

pub mod calendar;
pub mod finance;
pub mod general;
pub mod inbox;
pub mod marketing;
pub mod tax;

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use steward_core::store::{DataStore, StoreQuery, lookup};

use crate::error::IntentError;
use crate::registry::IntentRegistry;

pub use calendar::ScheduleMeeting;
pub use finance::{ArAging, CashFlow, ExpenseBreakdown, RevenueSummary};
pub use general::{General, HowTo};
pub use inbox::{EmailReply, EmailTriage};
pub use marketing::CampaignPerformance;
pub use tax::TaxDeadlines;

/// Key of the intent resolved when nothing else matches.
pub const GENERAL: &str = "general";

/// Build the registry with every built-in intent, in order.
pub fn default_registry() -> Result<IntentRegistry, IntentError> {
    let mut registry = IntentRegistry::new();
    registry.register(Arc::new(ArAging))?;
    registry.register(Arc::new(CashFlow))?;
    registry.register(Arc::new(RevenueSummary))?;
    registry.register(Arc::new(ExpenseBreakdown))?;
    registry.register(Arc::new(CampaignPerformance))?;
    registry.register(Arc::new(TaxDeadlines))?;
    registry.register(Arc::new(ScheduleMeeting))?;
    registry.register(Arc::new(EmailTriage))?;
    registry.register(Arc::new(EmailReply))?;
    registry.register(Arc::new(HowTo))?;
    registry.register(Arc::new(General))?;
    Ok(registry)
}

// ── Document helpers shared by recipes ──────────────────────────────────

pub(crate) fn str_field<'a>(doc: &'a Value, path: &str) -> Option<&'a str> {
    lookup(doc, path).and_then(Value::as_str)
}

pub(crate) fn num_field(doc: &Value, path: &str) -> f64 {
    lookup(doc, path).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Parse the date part of `YYYY-MM-DD` or an RFC 3339 timestamp.
pub(crate) fn date_field(doc: &Value, path: &str) -> Option<NaiveDate> {
    let raw = str_field(doc, path)?;
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub(crate) fn iso(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Run one sub-fetch, degrading a failure to `None` so sibling fetches
/// still contribute.
pub(crate) async fn soft_find(store: &dyn DataStore, query: &StoreQuery) -> Option<Vec<Value>> {
    match store.find(query).await {
        Ok(rows) => Some(rows),
        Err(e) => {
            tracing::warn!(collection = %query.collection, error = %e, "Sub-fetch failed, continuing without it");
            None
        }
    }
}

/// Round money to cents for stable bundle output. An empty `sum()` yields
/// `-0.0`; adding positive zero folds it back to `0.0`.
pub(crate) fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0 + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cents_rounds_and_drops_negative_zero() {
        assert_eq!(cents(12.345_6), 12.35);
        let empty: f64 = std::iter::empty::<f64>().sum();
        assert!(cents(empty).is_sign_positive());
        assert!(cents(-0.001).is_sign_positive());
    }

    #[test]
    fn default_registry_order() {
        let registry = default_registry().unwrap();
        assert_eq!(
            registry.keys(),
            vec![
                "ar_aging",
                "cash_flow",
                "revenue_summary",
                "expense_breakdown",
                "campaign_performance",
                "tax_deadlines",
                "schedule_meeting",
                "email_triage",
                "email_reply",
                "how_to",
                "general",
            ]
        );
    }

    #[test]
    fn every_predicate_compiles() {
        let registry = default_registry().unwrap();
        for intent in registry.iter() {
            assert!(intent.matches("hello there").is_ok(), "{}", intent.key());
            for boost in intent.keyword_boosts() {
                assert!(boost.pattern.regex().is_ok(), "{}", boost.pattern.source());
            }
        }
    }

    #[test]
    fn date_field_accepts_timestamps() {
        let doc = json!({"a": "2026-03-04", "b": "2026-03-05T10:00:00Z", "c": "soon"});
        assert_eq!(date_field(&doc, "a"), NaiveDate::from_ymd_opt(2026, 3, 4));
        assert_eq!(date_field(&doc, "b"), NaiveDate::from_ymd_opt(2026, 3, 5));
        assert_eq!(date_field(&doc, "c"), None);
    }
}
