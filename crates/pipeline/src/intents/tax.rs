//! Tax intents.

use async_trait::async_trait;
use serde_json::{Value, json};
use steward_core::store::StoreQuery;

use super::{date_field, iso, str_field};
use crate::error::{IntentError, RecipeError};
use crate::pattern::{KeywordBoost, Pattern};
use crate::registry::{FetchContext, Intent, Recipe};

static TAX_PREDICATE: Pattern = Pattern::new(
    r"(?i)\b(tax(es)?|irs|filings?|deadlines?|quarterly estimates?|1099s?|w-?2|vat|sales tax)\b",
);
static TAX_BOOSTS: [KeywordBoost; 1] = [KeywordBoost::new(
    r"(?i)\b(deadlines?|due|file by|when)\b",
    0.15,
)];

const TAX_LISTED: usize = 10;

/// Upcoming unfiled tax deadlines.
pub struct TaxDeadlines;

#[async_trait]
impl Intent for TaxDeadlines {
    fn key(&self) -> &'static str {
        "tax_deadlines"
    }

    fn label(&self) -> &'static str {
        "Tax deadlines"
    }

    fn module(&self) -> &'static str {
        "tax"
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        TAX_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &TAX_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn persona_hint(&self) -> Option<&'static str> {
        Some("Never present tax guidance as definitive; suggest confirming consequential decisions with an accountant.")
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Next deadline**: name, date and days remaining.\n\
             **Also coming up**: remaining deadlines as a short dated list.\n\
             **Prep**: one thing to gather now.",
        )
    }
}

#[async_trait]
impl Recipe for TaxDeadlines {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let query = StoreQuery::new("tax_deadlines")
            .eq("businessId", ctx.business_id)
            .ne("status", "filed")
            .gte("dueDate", iso(ctx.today))
            .sort_asc("dueDate")
            .limit(TAX_LISTED);
        let rows = ctx.store.find(&query).await?;

        let deadlines: Vec<Value> = rows
            .iter()
            .map(|row| {
                let days_until = date_field(row, "dueDate").map(|d| (d - ctx.today).num_days());
                json!({
                    "name": str_field(row, "name"),
                    "jurisdiction": str_field(row, "jurisdiction"),
                    "dueDate": str_field(row, "dueDate"),
                    "daysUntil": days_until,
                })
            })
            .collect();

        Ok(json!({
            "asOf": iso(ctx.today),
            "next": deadlines.first().cloned(),
            "upcoming": deadlines,
        }))
    }

    fn cache_discriminator(&self, _ctx: &FetchContext<'_>) -> Option<String> {
        Some("upcoming".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use steward_core::request::Hints;
    use steward_store::InMemoryStore;
    use steward_store::fixtures::demo_documents;

    #[tokio::test]
    async fn upcoming_excludes_filed_and_past() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 20).unwrap();
        let store = InMemoryStore::with_documents(demo_documents("b1", "u1", today))
            .await
            .unwrap();
        let hints = Hints::default();
        let ctx = FetchContext {
            user_id: "u1",
            business_id: "b1",
            message: "when are my tax deadlines",
            hints: &hints,
            store: &store,
            today,
        };
        let bundle = TaxDeadlines.fetch(&ctx).await.unwrap();
        assert_eq!(bundle["upcoming"].as_array().unwrap().len(), 3);
        assert_eq!(bundle["next"]["name"], "Payroll tax deposit");
        assert_eq!(bundle["next"]["daysUntil"], 5);
    }
}
