//! Document store implementations for Steward.

pub mod fixtures;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use serde_json::Value;
use steward_core::error::StoreError;

/// Assign an `id` to a document that lacks one and return it.
///
/// Rejects anything that is not a JSON object.
pub(crate) fn ensure_id(document: &mut Value) -> Result<String, StoreError> {
    let Some(obj) = document.as_object_mut() else {
        return Err(StoreError::InvalidDocument(
            "documents must be JSON objects".into(),
        ));
    };
    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            let id = uuid::Uuid::new_v4().to_string();
            obj.insert("id".into(), Value::String(id.clone()));
            id
        }
    };
    Ok(id)
}
