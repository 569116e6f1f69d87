//! Intent registry — the static, ordered table of intents.
//!
//! An intent is a fixed capability set: a predicate, keyword boosts, an
//! optional [`Recipe`] that fetches its data bundle, an optional finalize
//! hook, and prompt hints. Absent capabilities are `None` or pass-through
//! defaults on the trait, so the pipeline never probes at runtime.
//!
//! Registration order matters only for the no-score first-match scan in
//! the classifier.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use steward_core::request::Hints;
use steward_core::store::DataStore;

use crate::error::{IntentError, RecipeError};
use crate::output::ModelOutput;
use crate::pattern::KeywordBoost;

/// Classification tags an intent can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    /// Email-category intent; receives the thread/account continuity bonus
    Email,
    /// Answers are step-by-step procedures
    Procedural,
    /// The finalize hook writes a record back to the store
    WritesBack,
}

/// Everything a recipe may read while gathering its bundle.
pub struct FetchContext<'a> {
    pub user_id: &'a str,
    pub business_id: &'a str,
    pub message: &'a str,
    pub hints: &'a Hints,
    pub store: &'a dyn DataStore,
    /// Calendar date the request is evaluated against
    pub today: NaiveDate,
}

/// Side-effect context handed to a finalize hook.
pub struct FinalizeContext<'a> {
    pub user_id: &'a str,
    pub business_id: &'a str,
    pub message: &'a str,
    pub hints: &'a Hints,
    /// The pruned context bundle the model saw
    pub bundle: &'a Value,
    /// Store handle for optional write-back
    pub store: &'a dyn DataStore,
}

/// The data-fetch half of an intent.
#[async_trait]
pub trait Recipe: Send + Sync {
    /// Gather the intent's context bundle. May issue concurrent sub-fetches.
    async fn fetch(&self, ctx: &FetchContext<'_>) -> Result<Value, RecipeError>;

    /// Cache discriminator for this fetch. `None` means never cache.
    fn cache_discriminator(&self, _ctx: &FetchContext<'_>) -> Option<String> {
        None
    }
}

/// A classified user goal.
#[async_trait]
pub trait Intent: Send + Sync {
    /// Unique registry key (e.g. `"ar_aging"`).
    fn key(&self) -> &'static str;

    /// Human-readable label, used for clarification options.
    fn label(&self) -> &'static str;

    /// Business module this intent belongs to (persona stance lookup).
    fn module(&self) -> &'static str {
        "general"
    }

    fn tags(&self) -> &'static [IntentTag] {
        &[]
    }

    /// Boolean predicate on the raw message.
    fn matches(&self, message: &str) -> Result<bool, IntentError>;

    /// Tie-breaking keyword bonuses layered on top of the predicate.
    fn keyword_boosts(&self) -> &'static [KeywordBoost] {
        &[]
    }

    fn recipe(&self) -> Option<&dyn Recipe> {
        None
    }

    /// Extra persona instruction for this intent.
    fn persona_hint(&self) -> Option<&'static str> {
        None
    }

    /// Response template, used only by the structured style family.
    fn response_template(&self) -> Option<&'static str> {
        None
    }

    /// Post-process the model output. Defaults to pass-through.
    async fn finalize(
        &self,
        output: ModelOutput,
        _ctx: &FinalizeContext<'_>,
    ) -> Result<ModelOutput, IntentError> {
        Ok(output)
    }

    fn has_tag(&self, tag: IntentTag) -> bool {
        self.tags().contains(&tag)
    }
}

/// Registry listing entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentInfo {
    pub key: &'static str,
    pub label: &'static str,
    pub module: &'static str,
    pub tags: Vec<IntentTag>,
    pub has_recipe: bool,
    pub has_template: bool,
}

/// Ordered intent table with key lookup.
#[derive(Default)]
pub struct IntentRegistry {
    intents: Vec<Arc<dyn Intent>>,
    index: HashMap<&'static str, usize>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an intent. Keys must be unique.
    pub fn register(&mut self, intent: Arc<dyn Intent>) -> Result<(), IntentError> {
        let key = intent.key();
        if self.index.contains_key(key) {
            return Err(IntentError::DuplicateKey(key.to_string()));
        }
        self.index.insert(key, self.intents.len());
        self.intents.push(intent);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&dyn Intent> {
        self.index.get(key).map(|&i| self.intents[i].as_ref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Intents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Intent> {
        self.intents.iter().map(|i| i.as_ref())
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.intents.iter().map(|i| i.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn describe(&self) -> Vec<IntentInfo> {
        self.iter()
            .map(|i| IntentInfo {
                key: i.key(),
                label: i.label(),
                module: i.module(),
                tags: i.tags().to_vec(),
                has_recipe: i.recipe().is_some(),
                has_template: i.response_template().is_some(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl Intent for Fixed {
        fn key(&self) -> &'static str {
            self.0
        }
        fn label(&self) -> &'static str {
            "Fixed"
        }
        fn matches(&self, _message: &str) -> Result<bool, IntentError> {
            Ok(false)
        }
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut registry = IntentRegistry::new();
        for key in ["c", "a", "b"] {
            registry.register(Arc::new(Fixed(key))).unwrap();
        }
        assert_eq!(registry.keys(), vec!["c", "a", "b"]);
        assert_eq!(registry.get("a").unwrap().key(), "a");
        assert!(registry.get("z").is_none());
    }

    #[test]
    fn duplicate_keys_rejected() {
        let mut registry = IntentRegistry::new();
        registry.register(Arc::new(Fixed("a"))).unwrap();
        let err = registry.register(Arc::new(Fixed("a"))).unwrap_err();
        assert!(matches!(err, IntentError::DuplicateKey(k) if k == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn describe_reports_default_capabilities() {
        let mut registry = IntentRegistry::new();
        registry.register(Arc::new(Fixed("a"))).unwrap();
        let info = &registry.describe()[0];
        assert_eq!(info.module, "general");
        assert!(!info.has_recipe);
        assert!(info.tags.is_empty());
    }
}
