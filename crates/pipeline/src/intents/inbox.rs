//! Inbox intents: triage and thread replies.
//!
//! Both carry [`IntentTag::Email`], so a request continuing a thread or
//! account gets the continuity bonus toward them.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeSet;
use steward_core::store::StoreQuery;

use super::str_field;
use crate::error::{IntentError, RecipeError};
use crate::output::{CallToAction, ModelOutput};
use crate::pattern::{KeywordBoost, Pattern};
use crate::registry::{FetchContext, FinalizeContext, Intent, IntentTag, Recipe};

static TRIAGE_PREDICATE: Pattern = Pattern::new(r"(?i)\b(inbox|e-?mails?|unread|mail|messages)\b");
static TRIAGE_BOOSTS: [KeywordBoost; 1] = [KeywordBoost::new(
    r"(?i)\b(unread|triage|important|urgent|catch up)\b",
    0.2,
)];

static REPLY_PREDICATE: Pattern =
    Pattern::new(r"(?i)\b(reply|respond|answer|draft|write back|follow[- ]?up)\b");
static REPLY_BOOSTS: [KeywordBoost; 2] = [
    KeywordBoost::new(r"(?i)\b(draft|write)\b", 0.15),
    KeywordBoost::new(r"(?i)\b(reply|respond)\b", 0.2),
];

const TRIAGE_LISTED: usize = 25;
const THREAD_LISTED: usize = 20;

fn email_summary(row: &Value) -> Value {
    json!({
        "threadId": str_field(row, "threadId"),
        "from": str_field(row, "from"),
        "subject": str_field(row, "subject"),
        "snippet": str_field(row, "snippet"),
        "receivedAt": str_field(row, "receivedAt"),
        "unread": row.get("unread").and_then(Value::as_bool).unwrap_or(false),
    })
}

// ── Triage ──────────────────────────────────────────────────────────────

/// Recent inbox with unread counts, optionally narrowed by a search query.
pub struct EmailTriage;

impl EmailTriage {
    fn search_query<'a>(ctx: &'a FetchContext<'_>) -> Option<&'a str> {
        ctx.hints
            .search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

#[async_trait]
impl Intent for EmailTriage {
    fn key(&self) -> &'static str {
        "email_triage"
    }

    fn label(&self) -> &'static str {
        "Inbox triage"
    }

    fn module(&self) -> &'static str {
        "inbox"
    }

    fn tags(&self) -> &'static [IntentTag] {
        &[IntentTag::Email]
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        TRIAGE_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &TRIAGE_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Needs you**: unread messages that need a reply, most urgent first.\n\
             **FYI**: anything informational in one line.\n\
             **Next**: offer to draft a reply to the top item.",
        )
    }
}

#[async_trait]
impl Recipe for EmailTriage {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let mut query = StoreQuery::new("emails")
            .eq("businessId", ctx.business_id)
            .eq("userId", ctx.user_id)
            .sort_desc("receivedAt")
            .limit(TRIAGE_LISTED);
        if let Some(q) = Self::search_query(ctx) {
            query = query.contains("subject", q);
        }
        let rows = ctx.store.find(&query).await?;
        let unread = rows
            .iter()
            .filter(|r| r.get("unread").and_then(Value::as_bool).unwrap_or(false))
            .count();

        Ok(json!({
            "total": rows.len(),
            "unreadCount": unread,
            "messages": rows.iter().map(email_summary).collect::<Vec<_>>(),
        }))
    }

    fn cache_discriminator(&self, ctx: &FetchContext<'_>) -> Option<String> {
        let q = Self::search_query(ctx).unwrap_or_default().to_lowercase();
        Some(format!("q:{q}"))
    }
}

// ── Reply ───────────────────────────────────────────────────────────────

/// One email thread, for drafting a reply in the user's voice.
pub struct EmailReply;

impl EmailReply {
    fn hinted_thread<'a>(ctx: &'a FetchContext<'_>) -> Option<&'a str> {
        ctx.hints
            .thread_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Thread id from the hint, else the most recent unread email's thread.
    async fn resolve_thread(ctx: &FetchContext<'_>) -> Result<Option<String>, RecipeError> {
        if let Some(thread) = Self::hinted_thread(ctx) {
            return Ok(Some(thread.to_string()));
        }
        let latest = StoreQuery::new("emails")
            .eq("businessId", ctx.business_id)
            .eq("userId", ctx.user_id)
            .eq("unread", true)
            .sort_desc("receivedAt")
            .limit(1);
        let rows = ctx.store.find(&latest).await?;
        Ok(rows
            .first()
            .and_then(|r| str_field(r, "threadId"))
            .map(str::to_string))
    }
}

#[async_trait]
impl Intent for EmailReply {
    fn key(&self) -> &'static str {
        "email_reply"
    }

    fn label(&self) -> &'static str {
        "Draft an email reply"
    }

    fn module(&self) -> &'static str {
        "inbox"
    }

    fn tags(&self) -> &'static [IntentTag] {
        &[IntentTag::Email]
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        REPLY_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &REPLY_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn persona_hint(&self) -> Option<&'static str> {
        Some("Write the draft in the user's own voice. Never claim the email was sent.")
    }

    async fn finalize(
        &self,
        mut output: ModelOutput,
        ctx: &FinalizeContext<'_>,
    ) -> Result<ModelOutput, IntentError> {
        if output.call_to_action.is_some() {
            return Ok(output);
        }
        if let Some(thread_id) = ctx.bundle.get("threadId").and_then(Value::as_str) {
            output.call_to_action = Some(CallToAction {
                label: "Send draft".into(),
                action: "send_email_draft".into(),
                payload: json!({ "threadId": thread_id, "body": output.text }),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl Recipe for EmailReply {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let Some(thread_id) = Self::resolve_thread(ctx).await? else {
            return Ok(json!({ "threadId": null, "messages": [] }));
        };

        let query = StoreQuery::new("emails")
            .eq("businessId", ctx.business_id)
            .eq("threadId", thread_id.as_str())
            .sort_asc("receivedAt")
            .limit(THREAD_LISTED);
        let rows = ctx.store.find(&query).await?;

        let participants: BTreeSet<&str> = rows.iter().filter_map(|r| str_field(r, "from")).collect();
        let subject = rows
            .first()
            .and_then(|r| str_field(r, "subject"))
            .map(|s| s.trim_start_matches("Re: ").to_string());

        Ok(json!({
            "threadId": thread_id,
            "subject": subject,
            "participants": participants,
            "messages": rows.iter().map(email_summary).collect::<Vec<_>>(),
        }))
    }

    fn cache_discriminator(&self, ctx: &FetchContext<'_>) -> Option<String> {
        // Without a hinted thread the target depends on inbox state
        Self::hinted_thread(ctx).map(|t| format!("thread:{t}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use steward_core::request::Hints;
    use steward_store::InMemoryStore;
    use steward_store::fixtures::demo_documents;

    async fn store() -> (InMemoryStore, NaiveDate) {
        let today = NaiveDate::from_ymd_opt(2026, 5, 20).unwrap();
        let store = InMemoryStore::with_documents(demo_documents("b1", "u1", today))
            .await
            .unwrap();
        (store, today)
    }

    fn ctx<'a>(store: &'a InMemoryStore, hints: &'a Hints, message: &'a str, today: NaiveDate) -> FetchContext<'a> {
        FetchContext {
            user_id: "u1",
            business_id: "b1",
            message,
            hints,
            store,
            today,
        }
    }

    #[tokio::test]
    async fn triage_counts_unread_newest_first() {
        let (store, today) = store().await;
        let hints = Hints::default();
        let ctx = ctx(&store, &hints, "what's in my inbox", today);
        let bundle = EmailTriage.fetch(&ctx).await.unwrap();
        assert_eq!(bundle["total"], 4);
        assert_eq!(bundle["unreadCount"], 2);
        assert_eq!(bundle["messages"][0]["subject"], "Re: Invoice inv-1001");
        assert_eq!(EmailTriage.cache_discriminator(&ctx).as_deref(), Some("q:"));
    }

    #[tokio::test]
    async fn triage_search_narrows_by_subject() {
        let (store, today) = store().await;
        let hints = Hints {
            search_query: Some("Delivery".into()),
            ..Hints::default()
        };
        let ctx = ctx(&store, &hints, "any emails about delivery", today);
        let bundle = EmailTriage.fetch(&ctx).await.unwrap();
        assert_eq!(bundle["total"], 1);
        assert_eq!(EmailTriage.cache_discriminator(&ctx).as_deref(), Some("q:delivery"));
    }

    #[tokio::test]
    async fn reply_uses_hinted_thread() {
        let (store, today) = store().await;
        let hints = Hints::thread("th-1");
        let ctx = ctx(&store, &hints, "draft a reply", today);
        let bundle = EmailReply.fetch(&ctx).await.unwrap();
        assert_eq!(bundle["threadId"], "th-1");
        assert_eq!(bundle["subject"], "Invoice inv-1001");
        assert_eq!(bundle["participants"], json!(["jane@acme.example"]));
        // Oldest first within the thread
        assert_eq!(bundle["messages"][0]["subject"], "Invoice inv-1001");
        assert_eq!(EmailReply.cache_discriminator(&ctx).as_deref(), Some("thread:th-1"));
    }

    #[tokio::test]
    async fn reply_falls_back_to_latest_unread_thread() {
        let (store, today) = store().await;
        let hints = Hints::default();
        let ctx = ctx(&store, &hints, "reply to the latest one", today);
        let bundle = EmailReply.fetch(&ctx).await.unwrap();
        assert_eq!(bundle["threadId"], "th-1");
        assert!(EmailReply.cache_discriminator(&ctx).is_none());
    }

    #[tokio::test]
    async fn reply_finalize_adds_send_action_once() {
        let store = InMemoryStore::new();
        let hints = Hints::default();
        let bundle = json!({"threadId": "th-2"});
        let fctx = FinalizeContext {
            user_id: "u1",
            business_id: "b1",
            message: "reply",
            hints: &hints,
            bundle: &bundle,
            store: &store,
        };
        let out = EmailReply
            .finalize(ModelOutput::text("Friday works for us."), &fctx)
            .await
            .unwrap();
        let cta = out.call_to_action.unwrap();
        assert_eq!(cta.action, "send_email_draft");
        assert_eq!(cta.payload["body"], "Friday works for us.");

        let mut existing = ModelOutput::text("x");
        existing.call_to_action = Some(CallToAction {
            label: "Mine".into(),
            action: "custom".into(),
            payload: Value::Null,
        });
        let out = EmailReply.finalize(existing, &fctx).await.unwrap();
        assert_eq!(out.call_to_action.unwrap().action, "custom");
    }
}
