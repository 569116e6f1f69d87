//! Calendar intents.

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use serde_json::{Value, json};
use steward_core::store::StoreQuery;
use tracing::debug;

use super::{date_field, iso, str_field};
use crate::error::{IntentError, RecipeError};
use crate::output::{CallToAction, ModelOutput};
use crate::pattern::{KeywordBoost, Pattern};
use crate::registry::{FetchContext, FinalizeContext, Intent, IntentTag, Recipe};

static SCHEDULE_PREDICATE: Pattern = Pattern::new(
    r"(?i)\b(schedule|reschedule|book|meeting|meet|call|calendar|appointment|tomorrow|availability|available)\b",
);
static SCHEDULE_BOOSTS: [KeywordBoost; 2] = [
    KeywordBoost::new(r"(?i)\b(schedule|reschedule|book|set up a)\b", 0.2),
    KeywordBoost::new(
        r"(?i)\b(today|tomorrow|next week|monday|tuesday|wednesday|thursday|friday)\b",
        0.1,
    ),
];

/// Collection the finalize hook writes event drafts into.
pub const EVENT_DRAFTS: &str = "event_drafts";

/// Upcoming events plus a drafted event for the requested day.
pub struct ScheduleMeeting;

impl ScheduleMeeting {
    /// Resolve "today", "tomorrow", "next week" or a weekday name.
    pub fn requested_date(message: &str, today: NaiveDate) -> Option<NaiveDate> {
        let text = message.to_lowercase();
        if text.contains("tomorrow") {
            return Some(today + Duration::days(1));
        }
        if text.contains("next week") {
            let to_monday = 7 - i64::from(today.weekday().num_days_from_monday());
            return Some(today + Duration::days(to_monday));
        }
        if text.contains("today") {
            return Some(today);
        }
        let weekdays = [
            ("monday", Weekday::Mon),
            ("tuesday", Weekday::Tue),
            ("wednesday", Weekday::Wed),
            ("thursday", Weekday::Thu),
            ("friday", Weekday::Fri),
        ];
        weekdays.iter().find(|(name, _)| text.contains(name)).map(|(_, day)| {
            let ahead = (i64::from(day.num_days_from_monday())
                - i64::from(today.weekday().num_days_from_monday()))
            .rem_euclid(7);
            today + Duration::days(if ahead == 0 { 7 } else { ahead })
        })
    }

    fn draft_title(message: &str) -> String {
        let trimmed = message.trim().trim_end_matches(['?', '.', '!']);
        let mut chars = trimmed.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).take(80).collect(),
            None => "New event".into(),
        }
    }
}

#[async_trait]
impl Intent for ScheduleMeeting {
    fn key(&self) -> &'static str {
        "schedule_meeting"
    }

    fn label(&self) -> &'static str {
        "Schedule a meeting"
    }

    fn module(&self) -> &'static str {
        "calendar"
    }

    fn tags(&self) -> &'static [IntentTag] {
        &[IntentTag::WritesBack]
    }

    fn matches(&self, message: &str) -> Result<bool, IntentError> {
        SCHEDULE_PREDICATE.is_match(message)
    }

    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &SCHEDULE_BOOSTS
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        Some(self)
    }

    fn response_template(&self) -> Option<&'static str> {
        Some(
            "**Proposed slot**: day and time with a one-line reason.\n\
             **Conflicts**: anything already booked that day.\n\
             **Confirm**: ask whether to add it to the calendar.",
        )
    }

    async fn finalize(
        &self,
        mut output: ModelOutput,
        ctx: &FinalizeContext<'_>,
    ) -> Result<ModelOutput, IntentError> {
        let draft = json!({
            "businessId": ctx.business_id,
            "userId": ctx.user_id,
            "title": Self::draft_title(ctx.message),
            "date": ctx.bundle.get("requestedDate").cloned().unwrap_or(Value::Null),
            "sourceMessage": ctx.message,
            "status": "draft",
            "createdAt": Utc::now().to_rfc3339(),
        });
        let draft_id = ctx.store.insert(EVENT_DRAFTS, draft).await?;
        debug!(draft_id = %draft_id, "Event draft saved");

        if output.call_to_action.is_none() {
            output.call_to_action = Some(CallToAction {
                label: "Add to calendar".into(),
                action: "confirm_event_draft".into(),
                payload: json!({ "draftId": draft_id }),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl Recipe for ScheduleMeeting {
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
        let query = StoreQuery::new("events")
            .eq("businessId", ctx.business_id)
            .eq("userId", ctx.user_id)
            .gte("start", iso(ctx.today))
            .sort_asc("start")
            .limit(20);
        let rows = ctx.store.find(&query).await?;
        let requested = Self::requested_date(ctx.message, ctx.today);

        let summarize = |row: &Value| {
            json!({
                "title": str_field(row, "title"),
                "start": str_field(row, "start"),
                "end": str_field(row, "end"),
            })
        };
        let busy: Vec<Value> = match requested {
            Some(day) => rows
                .iter()
                .filter(|r| date_field(r, "start") == Some(day))
                .map(summarize)
                .collect(),
            None => Vec::new(),
        };

        Ok(json!({
            "today": iso(ctx.today),
            "requestedDate": requested.map(iso),
            "busyOnRequestedDate": busy,
            "upcoming": rows.iter().map(summarize).collect::<Vec<_>>(),
        }))
    }
    // Calendar availability changes minute to minute; never cached.
}
