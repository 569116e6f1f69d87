//! Context assembler — baseline context plus the intent's cached bundle.

use chrono::NaiveDate;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use steward_config::{HistoryConfig, PruneConfig};
use steward_core::message::Message;
use steward_core::request::ChatRequest;
use steward_core::store::DataStore;
use tracing::{debug, warn};

use super::history::load_history;
use super::prune::prune;
use crate::cache::{CacheKey, ContextCache};
use crate::error::{Stage, StageFault};
use crate::registry::{FetchContext, Intent};

/// Everything the composer and invoker need from the data layer.
#[derive(Debug, Clone, Default)]
pub struct AssembledContext {
    /// Pruned baseline hints merged with the intent bundle
    pub bundle: Value,
    /// Chronological conversation window
    pub history: Vec<Message>,
    pub cache_hit: bool,
    pub faults: Vec<StageFault>,
}

/// Outcome of the intent-specific fetch.
struct IntentBundle {
    value: Value,
    cache_hit: bool,
    fault: Option<StageFault>,
}

impl IntentBundle {
    fn empty() -> Self {
        Self {
            value: Value::Object(Map::new()),
            cache_hit: false,
            fault: None,
        }
    }
}

/// Builds the context for a resolved intent.
pub struct ContextAssembler {
    store: Arc<dyn DataStore>,
    cache: Arc<ContextCache>,
    prune: PruneConfig,
    history: HistoryConfig,
}

impl ContextAssembler {
    pub fn new(
        store: Arc<dyn DataStore>,
        cache: Arc<ContextCache>,
        prune: PruneConfig,
        history: HistoryConfig,
    ) -> Self {
        Self {
            store,
            cache,
            prune,
            history,
        }
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ContextCache> {
        &self.cache
    }

    /// Assemble history and the intent bundle concurrently. Never fails:
    /// a broken recipe or history read degrades to an empty value and a
    /// recorded fault.
    pub async fn assemble(
        &self,
        intent: Option<&dyn Intent>,
        request: &ChatRequest,
        today: NaiveDate,
    ) -> AssembledContext {
        let fetch_ctx = FetchContext {
            user_id: &request.user_id,
            business_id: &request.business_id,
            message: &request.message,
            hints: &request.hints,
            store: self.store.as_ref(),
            today,
        };

        let (history, intent_bundle) = futures::join!(
            load_history(
                self.store.as_ref(),
                &self.history,
                &request.user_id,
                &request.business_id,
                request.hints.thread_id.as_deref(),
            ),
            self.intent_bundle(intent, &fetch_ctx),
        );

        let mut faults = Vec::new();
        let history = history.unwrap_or_else(|e| {
            warn!(error = %e, "History load failed, continuing without it");
            faults.push(StageFault::new(Stage::History, "store", e.to_string()));
            Vec::new()
        });
        faults.extend(intent_bundle.fault);

        let mut bundle = baseline(request);
        match intent_bundle.value {
            Value::Object(fields) => bundle.extend(fields),
            Value::Null => {}
            other => {
                bundle.insert("data".into(), other);
            }
        }

        AssembledContext {
            bundle: prune(&Value::Object(bundle), &self.prune),
            history,
            cache_hit: intent_bundle.cache_hit,
            faults,
        }
    }

    async fn intent_bundle(&self, intent: Option<&dyn Intent>, ctx: &FetchContext<'_>) -> IntentBundle {
        let Some((intent, recipe)) = intent.and_then(|i| i.recipe().map(|r| (i, r))) else {
            return IntentBundle::empty();
        };

        let key = recipe
            .cache_discriminator(ctx)
            .map(|d| CacheKey::new(ctx.business_id, ctx.user_id, intent.key(), d));

        if let Some(key) = &key
            && let Some(cached) = self.cache.get(key).await
        {
            debug!(intent = intent.key(), discriminator = %key.discriminator, "Context cache hit");
            return IntentBundle {
                value: cached,
                cache_hit: true,
                fault: None,
            };
        }

        match recipe.fetch(ctx).await {
            Ok(value) => {
                let value = prune(&value, &self.prune);
                if let Some(key) = key {
                    self.cache.insert(key, value.clone()).await;
                }
                IntentBundle {
                    value,
                    cache_hit: false,
                    fault: None,
                }
            }
            Err(e) => {
                warn!(intent = intent.key(), error = %e, "Recipe failed, using empty bundle");
                IntentBundle {
                    fault: Some(StageFault::recipe(&e)),
                    ..IntentBundle::empty()
                }
            }
        }
    }
}

/// Intent-independent hints echoed into every bundle.
fn baseline(request: &ChatRequest) -> Map<String, Value> {
    let hints = &request.hints;
    let mut map = Map::new();
    if let Some(q) = hints.search_query.as_deref().filter(|q| !q.trim().is_empty()) {
        map.insert("searchQuery".into(), json!(q));
    }
    if let Some(metric) = &hints.metric {
        map.insert("metric".into(), json!(metric));
    }
    if let Some(period) = &hints.period {
        map.insert("period".into(), json!(period));
    }
    if !hints.filters.is_empty() {
        map.insert("filters".into(), json!(hints.filters));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IntentError, RecipeError};
    use crate::registry::Recipe;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use steward_core::request::Hints;
    use steward_store::InMemoryStore;

    struct Counting {
        calls: AtomicUsize,
        discriminator: Option<&'static str>,
        fail: bool,
    }

    impl Counting {
        fn new(discriminator: Option<&'static str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                discriminator,
                fail: false,
            }
        }
    }

    impl Intent for Counting {
        fn key(&self) -> &'static str {
            "counting"
        }
        fn label(&self) -> &'static str {
            "Counting"
        }
        fn matches(&self, _message: &str) -> Result<bool, IntentError> {
            Ok(true)
        }
        fn recipe(&self) -> Option<&dyn Recipe> {
            Some(self)
        }
    }

    #[async_trait]
    impl Recipe for Counting {
        async fn fetch(&self, _ctx: &FetchContext<'_>) -> Result<Value, RecipeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RecipeError::Failed("boom".into()));
            }
            Ok(json!({"rows": [1, 2], "searchQuery": "from recipe"}))
        }

        fn cache_discriminator(&self, _ctx: &FetchContext<'_>) -> Option<String> {
            self.discriminator.map(str::to_string)
        }
    }

    fn assembler(ttl_secs: u64) -> ContextAssembler {
        ContextAssembler::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(ContextCache::new(Duration::from_secs(ttl_secs), 64)),
            PruneConfig::default(),
            HistoryConfig::default(),
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 20).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn recipe_runs_once_within_ttl() {
        let assembler = assembler(60);
        let intent = Counting::new(Some("d"));
        let request = ChatRequest::new("u1", "b1", "hi");

        let first = assembler.assemble(Some(&intent), &request, today()).await;
        let second = assembler.assemble(Some(&intent), &request, today()).await;
        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.bundle, second.bundle);
        assert_eq!(intent.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        let third = assembler.assemble(Some(&intent), &request, today()).await;
        assert!(!third.cache_hit);
        assert_eq!(intent.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_discriminator_never_caches() {
        let assembler = assembler(60);
        let intent = Counting::new(None);
        let request = ChatRequest::new("u1", "b1", "hi");
        assembler.assemble(Some(&intent), &request, today()).await;
        assembler.assemble(Some(&intent), &request, today()).await;
        assert_eq!(intent.calls.load(Ordering::SeqCst), 2);
        assert!(assembler.cache().is_empty().await);
    }

    #[tokio::test]
    async fn recipe_failure_yields_baseline_and_fault() {
        let assembler = assembler(60);
        let intent = Counting {
            fail: true,
            ..Counting::new(Some("d"))
        };
        let request = ChatRequest::new("u1", "b1", "hi").with_hints(Hints {
            metric: Some("revenue".into()),
            ..Hints::default()
        });
        let ctx = assembler.assemble(Some(&intent), &request, today()).await;
        assert_eq!(ctx.bundle, json!({"metric": "revenue"}));
        assert_eq!(ctx.faults.len(), 1);
        assert_eq!(ctx.faults[0].stage, Stage::Context);
        assert!(assembler.cache().is_empty().await);
    }

    #[tokio::test]
    async fn intent_fields_win_over_baseline() {
        let assembler = assembler(60);
        let intent = Counting::new(None);
        let request = ChatRequest::new("u1", "b1", "hi").with_hints(Hints {
            search_query: Some("from hints".into()),
            ..Hints::default()
        });
        let ctx = assembler.assemble(Some(&intent), &request, today()).await;
        assert_eq!(ctx.bundle["searchQuery"], "from recipe");
        assert_eq!(ctx.bundle["rows"], json!([1, 2]));
    }

    #[tokio::test]
    async fn no_intent_gives_baseline_only() {
        let assembler = assembler(60);
        let request = ChatRequest::new("u1", "b1", "hi");
        let ctx = assembler.assemble(None, &request, today()).await;
        assert_eq!(ctx.bundle, json!({}));
        assert!(ctx.faults.is_empty());
        assert!(!ctx.cache_hit);
    }
}
