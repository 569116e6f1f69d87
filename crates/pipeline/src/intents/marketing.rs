//! Marketing intents.

use async_trait::async_trait;
use serde_json::{Value, json};
use steward_core::request::Hints;
use steward_core::store::StoreQuery;

use super::{cents, num_field, str_field};
use crate::error::{IntentError, RecipeError};
use crate::pattern::{KeywordBoost, Pattern};
use crate::registry::{FetchContext, Intent, Recipe};

static CAMPAIGN_PREDICATE: Pattern = Pattern::new(
    r"(?i)\b(campaigns?|ads?|advertising|marketing|roas|ctr|cpc|conversions?|clicks?|impressions?)\b",
);
static CAMPAIGN_BOOSTS: [KeywordBoost; 2] = [
    KeywordBoost::new(r"(?i)\b(roas|ctr|cpc|cpa|conversion rate)\b", 0.2),
    KeywordBoost::new(r"(?i)\b(performing|performance|best|worst)\b", 0.1),
];

/// Per-campaign efficiency metrics with best and worst performers.
pub struct CampaignPerformance;

impl CampaignPerformance {
    fn status_filter(hints: &Hints) -> Option<String> {
        hints
            .filters
            .get("status")
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| (numerator / denominator * 10_000.0).round() / 10_000.0)
}

#[async_trait]
impl Intent for CampaignPerformance {
    fn key(&self) -> &'static str {
        "campaign_performance"
    }

    fn label(&self) -> &'static str {
        "Campaign performance"
    }

    fn module(&self) -> &'static str {
        "marketing"
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        CAMPAIGN_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &CAMPAIGN_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Headline**: overall spend and return.\n\
             **Winners / losers**: best and worst campaign by ROAS with one reason each.\n\
             **Move**: one budget or creative change to try next.",
        )
    }
}

#[async_trait]
impl Recipe for CampaignPerformance {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let mut query = StoreQuery::new("campaigns")
            .eq("businessId", ctx.business_id)
            .sort_desc("spend")
            .limit(50);
        if let Some(status) = Self::status_filter(ctx.hints) {
            query = query.eq("status", status);
        }
        let rows = ctx.store.find(&query).await?;

        let mut total_spend = 0.0;
        let mut total_revenue = 0.0;
        let mut campaigns: Vec<Value> = Vec::with_capacity(rows.len());
        let mut best: Option<(f64, &str)> = None;
        let mut worst: Option<(f64, &str)> = None;

        for row in &rows {
            let name = str_field(row, "name").unwrap_or("unnamed");
            let spend = num_field(row, "spend");
            let revenue = num_field(row, "revenue");
            let clicks = num_field(row, "clicks");
            let conversions = num_field(row, "conversions");
            total_spend += spend;
            total_revenue += revenue;

            let roas = ratio(revenue, spend);
            if let Some(r) = roas {
                if best.is_none_or(|(b, _)| r > b) {
                    best = Some((r, name));
                }
                if worst.is_none_or(|(w, _)| r < w) {
                    worst = Some((r, name));
                }
            }

            campaigns.push(json!({
                "name": name,
                "channel": str_field(row, "channel"),
                "status": str_field(row, "status"),
                "spend": cents(spend),
                "revenue": cents(revenue),
                "ctr": ratio(clicks, num_field(row, "impressions")),
                "conversionRate": ratio(conversions, clicks),
                "cpa": ratio(spend, conversions).map(cents),
                "roas": roas,
            }));
        }

        Ok(json!({
            "campaignCount": campaigns.len(),
            "totalSpend": cents(total_spend),
            "totalRevenue": cents(total_revenue),
            "blendedRoas": ratio(total_revenue, total_spend),
            "best": best.map(|(_, n)| n),
            "worst": worst.map(|(_, n)| n),
            "campaigns": campaigns,
        }))
    }

    fn cache_discriminator(&self, ctx: &FetchContext<'_>) -> Option<String> {
        let status = Self::status_filter(ctx.hints).unwrap_or_else(|| "all".into());
        Some(format!("status:{status}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use steward_store::InMemoryStore;
    use steward_store::fixtures::demo_documents;

    #[tokio::test]
    async fn metrics_and_ranking() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 20).unwrap();
        let store = InMemoryStore::with_documents(demo_documents("b1", "u1", today))
            .await
            .unwrap();
        let hints = Hints::default();
        let ctx = FetchContext {
            user_id: "u1",
            business_id: "b1",
            message: "how are my campaigns performing",
            hints: &hints,
            store: &store,
            today,
        };
        let bundle = CampaignPerformance.fetch(&ctx).await.unwrap();
        assert_eq!(bundle["campaignCount"], 3);
        assert_eq!(bundle["totalSpend"], 2650.0);
        // Brand Search: 5100 / 600 = 8.5
        assert_eq!(bundle["best"], "Brand Search");
        assert_eq!(bundle["worst"], "Retargeting Q2");
        assert_eq!(bundle["campaigns"][0]["name"], "Retargeting Q2");
        assert_eq!(
            CampaignPerformance.cache_discriminator(&ctx).as_deref(),
            Some("status:all")
        );
    }

    #[test]
    fn ratio_guards_zero() {
        assert_eq!(ratio(1.0, 0.0), None);
        assert_eq!(ratio(1.0, 4.0), Some(0.25));
    }
}
