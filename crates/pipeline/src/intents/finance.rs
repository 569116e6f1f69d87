//! Finance intents: receivables aging, cash flow, revenue, expenses.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use steward_core::request::Hints;
use steward_core::store::{MAX_QUERY_LIMIT, StoreQuery};

use super::{cents, date_field, iso, num_field, soft_find, str_field};
use crate::error::{IntentError, RecipeError};
use crate::output::{ModelOutput, NavigateTarget};
use crate::pattern::{KeywordBoost, Pattern};
use crate::registry::{FetchContext, FinalizeContext, Intent, Recipe};

// ── Reporting periods ───────────────────────────────────────────────────

/// Reporting window resolved from a period hint or the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Last30Days,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    ThisYear,
}

impl Period {
    /// Period hint wins; otherwise look for period words in the message.
    pub fn resolve(hints: &Hints, message: &str) -> Self {
        hints
            .period
            .as_deref()
            .and_then(Self::parse)
            .or_else(|| Self::parse(message))
            .unwrap_or(Self::Last30Days)
    }

    fn parse(text: &str) -> Option<Self> {
        let text = text.to_lowercase().replace('_', " ");
        if text.contains("last month") || text.contains("previous month") {
            Some(Self::LastMonth)
        } else if text.contains("this month") || text.contains("mtd") {
            Some(Self::ThisMonth)
        } else if text.contains("quarter") || text.contains("qtd") {
            Some(Self::ThisQuarter)
        } else if text.contains("this year") || text.contains("ytd") {
            Some(Self::ThisYear)
        } else if text.contains("30 days") || text.contains("30d") {
            Some(Self::Last30Days)
        } else {
            None
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Last30Days => "last_30_days",
            Self::ThisMonth => "this_month",
            Self::LastMonth => "last_month",
            Self::ThisQuarter => "this_quarter",
            Self::ThisYear => "this_year",
        }
    }

    /// Inclusive date range ending at or before `today`.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let last_30 = (today - Duration::days(30), today);
        let first_of = |year: i32, month: u32| NaiveDate::from_ymd_opt(year, month, 1);
        let range = match self {
            Self::Last30Days => Some(last_30),
            Self::ThisMonth => first_of(today.year(), today.month()).map(|s| (s, today)),
            Self::LastMonth => first_of(today.year(), today.month())
                .and_then(|first| first.pred_opt())
                .and_then(|end| first_of(end.year(), end.month()).map(|start| (start, end))),
            Self::ThisQuarter => {
                let quarter_month = (today.month0() / 3) * 3 + 1;
                first_of(today.year(), quarter_month).map(|s| (s, today))
            }
            Self::ThisYear => first_of(today.year(), 1).map(|s| (s, today)),
        };
        range.unwrap_or(last_30)
    }
}

/// Sum amounts per key, largest first.
fn ranked_totals<'a>(rows: impl Iterator<Item = (&'a str, f64)>, limit: usize) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for (key, amount) in rows {
        *totals.entry(key).or_default() += amount;
    }
    let mut ranked: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(k, v)| (k.to_string(), cents(v)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

// ── Receivables aging ───────────────────────────────────────────────────

static AR_PREDICATE: Pattern = Pattern::new(
    r"(?i)\b(receivables?|a/r|aging|aged|overdue|outstanding|unpaid|past due|owed?|owes)\b",
);
static AR_THRESHOLD: Pattern = Pattern::new(r"(?i)(\d{1,4})\s*\+?\s*days?");
static AR_BOOSTS: [KeywordBoost; 2] = [
    KeywordBoost::new(r"(?i)\b(over|more than|older than|past)\s+\d+\s*days?", 0.2),
    KeywordBoost::new(r"(?i)\b(receivables?|aging)\b", 0.15),
];

const DEFAULT_THRESHOLD_DAYS: u32 = 30;
const MAX_THRESHOLD_DAYS: u32 = 365;
const AR_LISTED_INVOICES: usize = 10;

/// Open invoices bucketed by days past due.
pub struct ArAging;

impl ArAging {
    /// Day threshold named in the message ("over 45 days"), else 30.
    pub fn threshold_days(message: &str) -> u32 {
        AR_THRESHOLD
            .capture(message)
            .ok()
            .flatten()
            .and_then(|d| d.parse::<u32>().ok())
            .map(|d| d.clamp(1, MAX_THRESHOLD_DAYS))
            .unwrap_or(DEFAULT_THRESHOLD_DAYS)
    }
}

#[async_trait]
impl Intent for ArAging {
    fn key(&self) -> &'static str {
        "ar_aging"
    }

    fn label(&self) -> &'static str {
        "Receivables aging"
    }

    fn module(&self) -> &'static str {
        "finance"
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        AR_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &AR_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Summary**: one sentence with the total outstanding past the threshold.\n\
             **Buckets**: current / 1-30 / 31-60 / 61-90 / 90+ days.\n\
             **Largest balances**: up to three customers with amount and days overdue.\n\
             **Next step**: one concrete collection action.",
        )
    }

    async fn finalize(
        &self,
        mut output: ModelOutput,
        _ctx: &FinalizeContext<'_>,
    ) -> Result<ModelOutput, IntentError> {
        if output.navigate.is_none() {
            output.navigate = Some(NavigateTarget {
                label: "Open receivables".into(),
                route: "/finance/receivables".into(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl Recipe for ArAging {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let threshold = Self::threshold_days(ctx.message);
        let query = StoreQuery::new("invoices")
            .eq("businessId", ctx.business_id)
            .eq("status", "open")
            .sort_asc("dueDate")
            .limit(MAX_QUERY_LIMIT);
        let invoices = ctx.store.find(&query).await?;

        // current, 1-30, 31-60, 61-90, 90+
        let mut buckets = [0.0_f64; 5];
        let mut total = 0.0;
        let mut over: Vec<(i64, &Value)> = Vec::new();

        for invoice in &invoices {
            let amount = num_field(invoice, "amount");
            total += amount;
            let days = date_field(invoice, "dueDate")
                .map(|due| (ctx.today - due).num_days())
                .unwrap_or(0);
            let bucket = match days {
                d if d <= 0 => 0,
                1..=30 => 1,
                31..=60 => 2,
                61..=90 => 3,
                _ => 4,
            };
            buckets[bucket] += amount;
            if days > i64::from(threshold) {
                over.push((days, invoice));
            }
        }

        over.sort_by(|a, b| b.0.cmp(&a.0));
        let over_total: f64 = over.iter().map(|(_, inv)| num_field(inv, "amount")).sum();
        let listed: Vec<Value> = over
            .iter()
            .take(AR_LISTED_INVOICES)
            .map(|(days, inv)| {
                json!({
                    "id": str_field(inv, "id"),
                    "customer": str_field(inv, "customer.name").unwrap_or("unknown"),
                    "amount": cents(num_field(inv, "amount")),
                    "dueDate": str_field(inv, "dueDate"),
                    "daysOverdue": days,
                })
            })
            .collect();

        Ok(json!({
            "thresholdDays": threshold,
            "asOf": iso(ctx.today),
            "openInvoiceCount": invoices.len(),
            "totalOutstanding": cents(total),
            "overThreshold": { "count": over.len(), "total": cents(over_total) },
            "buckets": {
                "current": cents(buckets[0]),
                "1-30": cents(buckets[1]),
                "31-60": cents(buckets[2]),
                "61-90": cents(buckets[3]),
                "90+": cents(buckets[4]),
            },
            "invoices": listed,
        }))
    }

    fn cache_discriminator(&self, ctx: &FetchContext<'_>) -> Option<String> {
        Some(format!("threshold:{}", Self::threshold_days(ctx.message)))
    }
}

// ── Cash flow ───────────────────────────────────────────────────────────

static CASH_PREDICATE: Pattern = Pattern::new(
    r"(?i)\b(cash\s*flow|cash|runway|burn|inflows?|outflows?|liquidity|bank balance)\b",
);
static CASH_BOOSTS: [KeywordBoost; 2] = [
    KeywordBoost::new(r"(?i)\bcash\s*flow\b", 0.25),
    KeywordBoost::new(r"(?i)\b(runway|burn)\b", 0.1),
];

const CASH_WINDOW_DAYS: i64 = 30;

/// Recent movements plus what is expected in and owed out.
///
/// The three sources are fetched concurrently; a failing source is listed
/// under `unavailable` and the others still contribute.
pub struct CashFlow;

#[async_trait]
impl Intent for CashFlow {
    fn key(&self) -> &'static str {
        "cash_flow"
    }

    fn label(&self) -> &'static str {
        "Cash flow"
    }

    fn module(&self) -> &'static str {
        "finance"
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        CASH_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &CASH_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Net position**: inflow, outflow and net for the window.\n\
             **Drivers**: the two or three categories that moved most.\n\
             **Coming up**: expected receipts and obligations in the next 30 days.",
        )
    }
}

#[async_trait]
impl Recipe for CashFlow {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let since = iso(ctx.today - Duration::days(CASH_WINDOW_DAYS));
        let today = iso(ctx.today);
        let horizon = iso(ctx.today + Duration::days(CASH_WINDOW_DAYS));

        let transactions_q = StoreQuery::new("transactions")
            .eq("businessId", ctx.business_id)
            .gte("date", since.clone())
            .limit(MAX_QUERY_LIMIT);
        let receipts_q = StoreQuery::new("invoices")
            .eq("businessId", ctx.business_id)
            .eq("status", "open")
            .lte("dueDate", horizon.clone())
            .limit(MAX_QUERY_LIMIT);
        let obligations_q = StoreQuery::new("tax_deadlines")
            .eq("businessId", ctx.business_id)
            .ne("status", "filed")
            .gte("dueDate", today)
            .lte("dueDate", horizon)
            .sort_asc("dueDate")
            .limit(10);

        let (transactions, receipts, obligations) = futures::join!(
            soft_find(ctx.store, &transactions_q),
            soft_find(ctx.store, &receipts_q),
            soft_find(ctx.store, &obligations_q),
        );

        if transactions.is_none() && receipts.is_none() && obligations.is_none() {
            return Err(RecipeError::Failed("no cash flow source was reachable".into()));
        }

        let mut bundle = Map::new();
        bundle.insert("windowDays".into(), json!(CASH_WINDOW_DAYS));
        bundle.insert("since".into(), json!(since));
        let mut unavailable = Vec::new();

        match transactions {
            Some(rows) => {
                let inflow: f64 = rows.iter().map(|r| num_field(r, "amount")).filter(|a| *a > 0.0).sum();
                let outflow: f64 = rows.iter().map(|r| num_field(r, "amount")).filter(|a| *a < 0.0).map(f64::abs).sum();
                let by_category = ranked_totals(
                    rows.iter().map(|r| (str_field(r, "category").unwrap_or("other"), num_field(r, "amount"))),
                    8,
                );
                bundle.insert("inflow".into(), json!(cents(inflow)));
                bundle.insert("outflow".into(), json!(cents(outflow)));
                bundle.insert("net".into(), json!(cents(inflow - outflow)));
                bundle.insert(
                    "byCategory".into(),
                    Value::Array(by_category.into_iter().map(|(c, a)| json!({"category": c, "net": a})).collect()),
                );
            }
            None => unavailable.push("transactions"),
        }

        match receipts {
            Some(rows) => {
                let total: f64 = rows.iter().map(|r| num_field(r, "amount")).sum();
                bundle.insert(
                    "expectedReceipts".into(),
                    json!({ "count": rows.len(), "total": cents(total) }),
                );
            }
            None => unavailable.push("invoices"),
        }

        match obligations {
            Some(rows) => {
                let items: Vec<Value> = rows
                    .iter()
                    .map(|r| json!({ "name": str_field(r, "name"), "dueDate": str_field(r, "dueDate") }))
                    .collect();
                bundle.insert("upcomingObligations".into(), Value::Array(items));
            }
            None => unavailable.push("tax_deadlines"),
        }

        if !unavailable.is_empty() {
            bundle.insert("unavailable".into(), json!(unavailable));
        }
        Ok(Value::Object(bundle))
    }

    fn cache_discriminator(&self, _ctx: &FetchContext<'_>) -> Option<String> {
        Some(format!("window:{CASH_WINDOW_DAYS}"))
    }
}

// ── Revenue ─────────────────────────────────────────────────────────────

static REVENUE_PREDICATE: Pattern =
    Pattern::new(r"(?i)\b(revenue|sales|income|earn(ed|ings)?|top line|turnover)\b");
static REVENUE_BOOSTS: [KeywordBoost; 1] = [KeywordBoost::new(
    r"(?i)\b(this|last)\s+(month|quarter|year)\b",
    0.1,
)];

pub struct RevenueSummary;

#[async_trait]
impl Intent for RevenueSummary {
    fn key(&self) -> &'static str {
        "revenue_summary"
    }

    fn label(&self) -> &'static str {
        "Revenue summary"
    }

    fn module(&self) -> &'static str {
        "finance"
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        REVENUE_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &REVENUE_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Revenue**: total for the period with the date range.\n\
             **Top sources**: up to three with amounts.\n\
             **Read**: one sentence on what stands out.",
        )
    }
}

#[async_trait]
impl Recipe for RevenueSummary {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let period = Period::resolve(ctx.hints, ctx.message);
        let (start, end) = period.range(ctx.today);
        let query = StoreQuery::new("transactions")
            .eq("businessId", ctx.business_id)
            .gte("date", iso(start))
            .lte("date", iso(end))
            .limit(MAX_QUERY_LIMIT);
        let rows = ctx.store.find(&query).await?;

        let inflows: Vec<&Value> = rows.iter().filter(|r| num_field(r, "amount") > 0.0).collect();
        let revenue: f64 = inflows.iter().map(|r| num_field(r, "amount")).sum();
        let sources = ranked_totals(
            inflows.iter().map(|r| (str_field(r, "description").unwrap_or("other"), num_field(r, "amount"))),
            5,
        );

        Ok(json!({
            "period": period.key(),
            "start": iso(start),
            "end": iso(end),
            "revenue": cents(revenue),
            "transactionCount": inflows.len(),
            "topSources": sources.into_iter().map(|(s, a)| json!({"source": s, "amount": a})).collect::<Vec<_>>(),
        }))
    }

    fn cache_discriminator(&self, ctx: &FetchContext<'_>) -> Option<String> {
        Some(format!("period:{}", Period::resolve(ctx.hints, ctx.message).key()))
    }
}

// ── Expenses ────────────────────────────────────────────────────────────

static EXPENSE_PREDICATE: Pattern =
    Pattern::new(r"(?i)\b(expenses?|spend(ing)?|spent|costs?|bills?|vendors?)\b");
static EXPENSE_BOOSTS: [KeywordBoost; 1] = [KeywordBoost::new(
    r"(?i)\b(break\s*down|breakdown|by category|biggest)\b",
    0.15,
)];

pub struct ExpenseBreakdown;

impl ExpenseBreakdown {
    /// Categories are stored lowercase; the same folded value feeds the
    /// query and the cache discriminator.
    fn category_filter(hints: &Hints) -> Option<String> {
        hints
            .filters
            .get("category")
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    }
}

#[async_trait]
impl Intent for ExpenseBreakdown {
    fn key(&self) -> &'static str {
        "expense_breakdown"
    }

    fn label(&self) -> &'static str {
        "Expense breakdown"
    }

    fn module(&self) -> &'static str {
        "finance"
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        EXPENSE_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &EXPENSE_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Total spend** for the period.\n\
             **By category**: a short ranked list with share of total.\n\
             **Watch**: one category or vendor worth a closer look.",
        )
    }
}

#[async_trait]
impl Recipe for ExpenseBreakdown {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let period = Period::resolve(ctx.hints, ctx.message);
        let (start, end) = period.range(ctx.today);
        let mut query = StoreQuery::new("expenses")
            .eq("businessId", ctx.business_id)
            .gte("date", iso(start))
            .lte("date", iso(end))
            .limit(MAX_QUERY_LIMIT);
        if let Some(category) = Self::category_filter(ctx.hints) {
            query = query.eq("category", category);
        }
        let rows = ctx.store.find(&query).await?;

        let total: f64 = rows.iter().map(|r| num_field(r, "amount")).sum();
        let share = |amount: f64| if total > 0.0 { (amount / total * 1000.0).round() / 10.0 } else { 0.0 };
        let categories = ranked_totals(
            rows.iter().map(|r| (str_field(r, "category").unwrap_or("other"), num_field(r, "amount"))),
            10,
        );
        let vendors = ranked_totals(
            rows.iter().map(|r| (str_field(r, "vendor").unwrap_or("unknown"), num_field(r, "amount"))),
            5,
        );

        Ok(json!({
            "period": period.key(),
            "start": iso(start),
            "end": iso(end),
            "total": cents(total),
            "byCategory": categories
                .into_iter()
                .map(|(c, a)| json!({"category": c, "amount": a, "sharePct": share(a)}))
                .collect::<Vec<_>>(),
            "topVendors": vendors
                .into_iter()
                .map(|(v, a)| json!({"vendor": v, "amount": a}))
                .collect::<Vec<_>>(),
        }))
    }

    fn cache_discriminator(&self, ctx: &FetchContext<'_>) -> Option<String> {
        let period = Period::resolve(ctx.hints, ctx.message);
        Some(match Self::category_filter(ctx.hints) {
            Some(category) => format!("period:{}|category:{category}", period.key()),
            None => format!("period:{}", period.key()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_core::store::DataStore;
    use steward_store::InMemoryStore;
    use steward_store::fixtures::demo_documents;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    async fn demo_store() -> InMemoryStore {
        InMemoryStore::with_documents(demo_documents("b1", "u1", today()))
            .await
            .unwrap()
    }

    fn ctx<'a>(store: &'a dyn DataStore, message: &'a str, hints: &'a Hints) -> FetchContext<'a> {
        FetchContext {
            user_id: "u1",
            business_id: "b1",
            message,
            hints,
            store,
            today: today(),
        }
    }

    #[test]
    fn threshold_parsing() {
        assert_eq!(ArAging::threshold_days("what's outstanding on receivables over 45 days"), 45);
        assert_eq!(ArAging::threshold_days("anything 90+ days?"), 90);
        assert_eq!(ArAging::threshold_days("show receivables"), 30);
        assert_eq!(ArAging::threshold_days("over 9999 days"), 365);
    }

    #[tokio::test]
    async fn ar_aging_bundle() {
        let store = demo_store().await;
        let hints = Hints::default();
        let message = "what's outstanding on receivables over 45 days";
        let bundle = ArAging.fetch(&ctx(&store, message, &hints)).await.unwrap();

        assert_eq!(bundle["thresholdDays"], 45);
        assert_eq!(bundle["openInvoiceCount"], 5);
        // inv-1001 (75 days) and inv-1002 (52 days)
        assert_eq!(bundle["overThreshold"]["count"], 2);
        assert_eq!(bundle["invoices"][0]["id"], "inv-1001");
        assert_eq!(bundle["invoices"][0]["daysOverdue"], 75);
        assert_eq!(bundle["buckets"]["current"], 640.0);
        assert_eq!(
            ArAging.cache_discriminator(&ctx(&store, message, &hints)).as_deref(),
            Some("threshold:45")
        );
    }

    #[tokio::test]
    async fn ar_aging_finalize_adds_navigation() {
        let store = demo_store().await;
        let hints = Hints::default();
        let bundle = Value::Null;
        let fctx = FinalizeContext {
            user_id: "u1",
            business_id: "b1",
            message: "receivables",
            hints: &hints,
            bundle: &bundle,
            store: &store,
        };
        let out = ArAging.finalize(ModelOutput::text("ok"), &fctx).await.unwrap();
        assert_eq!(out.navigate.unwrap().route, "/finance/receivables");
    }

    #[tokio::test]
    async fn cash_flow_combines_sources() {
        let store = demo_store().await;
        let hints = Hints::default();
        let bundle = CashFlow.fetch(&ctx(&store, "cash flow?", &hints)).await.unwrap();
        // Inflows within the window: 5400 + 2750 + 6100
        assert_eq!(bundle["inflow"], 14250.0);
        assert!(bundle["expectedReceipts"]["count"].as_u64().unwrap() >= 5);
        assert!(bundle.get("unavailable").is_none());
        assert_eq!(bundle["upcomingObligations"][0]["name"], "Payroll tax deposit");
    }

    #[test]
    fn period_resolution() {
        let hints = Hints {
            period: Some("last_month".into()),
            ..Hints::default()
        };
        assert_eq!(Period::resolve(&hints, "revenue this year"), Period::LastMonth);
        assert_eq!(Period::resolve(&Hints::default(), "revenue this year"), Period::ThisYear);
        assert_eq!(Period::resolve(&Hints::default(), "revenue"), Period::Last30Days);

        let (start, end) = Period::LastMonth.range(today());
        assert_eq!(iso(start), "2026-04-01");
        assert_eq!(iso(end), "2026-04-30");
        let (start, _) = Period::ThisQuarter.range(today());
        assert_eq!(iso(start), "2026-04-01");
    }

    #[tokio::test]
    async fn expense_breakdown_ranks_categories() {
        let store = demo_store().await;
        let hints = Hints::default();
        let bundle = ExpenseBreakdown
            .fetch(&ctx(&store, "break down my expenses", &hints))
            .await
            .unwrap();
        assert_eq!(bundle["period"], "last_30_days");
        assert_eq!(bundle["byCategory"][0]["category"], "rent");
        // The 40-day-old travel expense falls outside the window
        assert_eq!(bundle["total"], 4590.0);
    }

    #[tokio::test]
    async fn expense_category_filter_ignores_case() {
        let store = demo_store().await;
        let filtered = |category: &str| Hints {
            filters: [("category".to_string(), category.to_string())].into(),
            ..Hints::default()
        };
        let upper = filtered("Software");
        let lower = filtered("software");

        let key = ExpenseBreakdown.cache_discriminator(&ctx(&store, "expenses", &upper));
        assert_eq!(key.as_deref(), Some("period:last_30_days|category:software"));

        let upper_bundle = ExpenseBreakdown.fetch(&ctx(&store, "expenses", &upper)).await.unwrap();
        let lower_bundle = ExpenseBreakdown.fetch(&ctx(&store, "expenses", &lower)).await.unwrap();
        // Figma 380 + GitHub 120
        assert_eq!(upper_bundle["total"], 500.0);
        assert_eq!(upper_bundle, lower_bundle);
    }

    #[tokio::test]
    async fn empty_totals_are_positive_zero() {
        let store = demo_store().await;
        let hints = Hints {
            filters: [("category".to_string(), "nonexistent".to_string())].into(),
            ..Hints::default()
        };
        let bundle = ExpenseBreakdown.fetch(&ctx(&store, "expenses", &hints)).await.unwrap();
        let total = bundle["total"].as_f64().unwrap();
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
    }
}
