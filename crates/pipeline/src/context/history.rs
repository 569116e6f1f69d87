//! Recent-conversation window.

use chrono::{DateTime, Utc};
use serde_json::Value;
use steward_config::HistoryConfig;
use steward_core::error::StoreError;
use steward_core::message::{Message, Role};
use steward_core::store::{DataStore, StoreQuery};

/// Load the most recent `window` turns, returned oldest first.
///
/// A thread id scopes the window to that thread; otherwise it covers the
/// user and business pair. Stored role labels are folded into [`Role`],
/// and records without content are skipped.
pub async fn load_history(
    store: &dyn DataStore,
    config: &HistoryConfig,
    user_id: &str,
    business_id: &str,
    thread_id: Option<&str>,
) -> Result<Vec<Message>, StoreError> {
    if config.window == 0 {
        return Ok(Vec::new());
    }

    let query = match thread_id.map(str::trim).filter(|t| !t.is_empty()) {
        Some(thread) => StoreQuery::new(&config.collection)
            .eq("threadId", thread)
            .eq("businessId", business_id),
        None => StoreQuery::new(&config.collection)
            .eq("userId", user_id)
            .eq("businessId", business_id),
    }
    .sort_desc("createdAt")
    .limit(config.window);

    let rows = store.find(&query).await?;
    let mut messages: Vec<Message> = rows.iter().filter_map(to_message).collect();
    messages.reverse();
    Ok(messages)
}

fn to_message(record: &Value) -> Option<Message> {
    let content = record.get("content").and_then(Value::as_str)?.trim();
    if content.is_empty() {
        return None;
    }
    let role = Role::normalize(record.get("role").and_then(Value::as_str).unwrap_or_default());
    let timestamp = record
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);
    Some(Message::restored(role, content, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use steward_store::InMemoryStore;

    async fn store_with(records: Vec<Value>) -> InMemoryStore {
        let store = InMemoryStore::new();
        for r in records {
            store.insert("messages", r).await.unwrap();
        }
        store
    }

    fn config(window: usize) -> HistoryConfig {
        HistoryConfig {
            window,
            collection: "messages".into(),
        }
    }

    #[tokio::test]
    async fn window_is_chronological_and_normalized() {
        let store = store_with(vec![
            json!({"userId": "u1", "businessId": "b1", "role": "human", "content": "first", "createdAt": "2026-05-01T09:00:00Z"}),
            json!({"userId": "u1", "businessId": "b1", "role": "bot", "content": "second", "createdAt": "2026-05-01T09:00:01Z"}),
            json!({"userId": "u1", "businessId": "b1", "role": "user", "content": "third", "createdAt": "2026-05-01T09:00:02Z"}),
            json!({"userId": "u1", "businessId": "b2", "role": "user", "content": "other tenant", "createdAt": "2026-05-01T09:00:03Z"}),
        ])
        .await;

        let all = load_history(&store, &config(10), "u1", "b1", None).await.unwrap();
        let contents: Vec<_> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(all[0].role, Role::User);
        assert_eq!(all[1].role, Role::Assistant);

        let last_two = load_history(&store, &config(2), "u1", "b1", None).await.unwrap();
        let contents: Vec<_> = last_two.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "third"]);
    }

    #[tokio::test]
    async fn thread_scope_and_empty_content() {
        let store = store_with(vec![
            json!({"userId": "u1", "businessId": "b1", "threadId": "t1", "role": "user", "content": "in thread", "createdAt": "2026-05-01T09:00:00Z"}),
            json!({"userId": "u1", "businessId": "b1", "threadId": "t1", "role": "assistant", "content": "  ", "createdAt": "2026-05-01T09:00:01Z"}),
            json!({"userId": "u1", "businessId": "b1", "role": "user", "content": "no thread", "createdAt": "2026-05-01T09:00:02Z"}),
        ])
        .await;
        let scoped = load_history(&store, &config(10), "u1", "b1", Some("t1")).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].content, "in thread");
    }

    #[tokio::test]
    async fn zero_window_skips_the_store() {
        let store = InMemoryStore::new();
        assert!(load_history(&store, &config(0), "u1", "b1", None).await.unwrap().is_empty());
    }
}
