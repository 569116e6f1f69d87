//! The pipeline orchestrator.
//!
//! One turn runs linearly through classify, (clarify | assemble, compose,
//! invoke, finalize), normalize. Every stage returns a `Result` or a
//! fault list; this is the only place that decides what a failure turns
//! into, and no failure ever escapes to the caller.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use steward_config::{AppConfig, Environment, PipelineConfig};
use steward_core::envelope::{Outcome, ResponseEnvelope, StageTimings};
use steward_core::provider::Provider;
use steward_core::request::ChatRequest;
use steward_core::store::DataStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::ContextCache;
use crate::clarify::clarification_envelope;
use crate::classifier::{Classification, Classifier};
use crate::context::ContextAssembler;
use crate::error::{InvokeError, Stage, StageFault};
use crate::invoker::ModelInvoker;
use crate::normalize::{cancelled_envelope, fallback_envelope, normalize};
use crate::prompt::{ComposedPrompt, PromptComposer};
use crate::registry::{FinalizeContext, IntentRegistry};

/// Everything the pipeline would send to the model, without sending it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub classification: Classification,
    pub bundle: Value,
    pub prompt: ComposedPrompt,
    pub history_len: usize,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// The conversational request pipeline.
pub struct Pipeline {
    registry: Arc<IntentRegistry>,
    classifier: Classifier,
    assembler: ContextAssembler,
    composer: PromptComposer,
    invoker: ModelInvoker,
    config: PipelineConfig,
    environment: Environment,
}

impl Pipeline {
    /// Build from application config with a fresh context cache.
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn DataStore>,
        registry: IntentRegistry,
    ) -> Self {
        let pipeline = &config.pipeline;
        let cache = Arc::new(ContextCache::from_config(&pipeline.cache));
        let invoker = ModelInvoker::new(
            provider,
            config.default_model.clone(),
            Duration::from_secs(pipeline.invoke.timeout_secs),
        )
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens);

        Self {
            registry: Arc::new(registry),
            classifier: Classifier::new(pipeline.classifier.clone()),
            assembler: ContextAssembler::new(
                store,
                cache,
                pipeline.prune.clone(),
                pipeline.history.clone(),
            ),
            composer: PromptComposer::new(pipeline.persona.clone(), pipeline.style.clone()),
            invoker,
            config: pipeline.clone(),
            environment: config.environment,
        }
    }

    /// Share an existing cache (e.g. one cache across several pipelines).
    pub fn with_cache(mut self, cache: Arc<ContextCache>) -> Self {
        self.assembler = ContextAssembler::new(
            self.assembler.store().clone(),
            cache,
            self.config.prune.clone(),
            self.config.history.clone(),
        );
        self
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ContextCache> {
        self.assembler.cache()
    }

    pub fn store(&self) -> &Arc<dyn DataStore> {
        self.assembler.store()
    }

    pub fn provider_name(&self) -> &str {
        self.invoker.provider_name()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Classification only.
    pub fn classify(&self, request: &ChatRequest) -> Classification {
        let request = self.prepare(request.clone());
        self.classifier.classify(&self.registry, &request)
    }

    /// Classify, assemble and compose, but do not call the model. Runs
    /// the assembler even for ambiguous turns so the bundle can be seen.
    pub async fn inspect(&self, request: ChatRequest) -> Inspection {
        let request = self.prepare(request);
        let classification = self.classifier.classify(&self.registry, &request);
        let intent = self.registry.get(classification.resolved);
        let context = self
            .assembler
            .assemble(intent, &request, Utc::now().date_naive())
            .await;
        let prompt = self.composer.compose(intent, &request);

        let faults: Vec<&StageFault> = classification.faults.iter().chain(&context.faults).collect();
        Inspection {
            diagnostics: self.diagnostics(faults),
            bundle: context.bundle,
            prompt,
            history_len: context.history.len(),
            cache_hit: context.cache_hit,
            classification,
        }
    }

    /// Run one turn. Never fails.
    pub async fn handle(&self, request: ChatRequest) -> ResponseEnvelope {
        self.handle_with_cancel(request, CancellationToken::new()).await
    }

    /// Run one turn; cancelling `cancel` skips or abandons the model call.
    pub async fn handle_with_cancel(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> ResponseEnvelope {
        let started = Instant::now();
        let mut timings = StageTimings::default();
        let request = self.prepare(request);

        // ── Classify ──
        let stage = Instant::now();
        let classification = self.classifier.classify(&self.registry, &request);
        timings.classify_ms = elapsed_ms(stage);
        let mut faults = classification.faults.clone();

        if classification.is_ambiguous() {
            let mut envelope = clarification_envelope(&classification, &self.registry);
            timings.total_ms = elapsed_ms(started);
            self.finish_meta(&mut envelope, &classification, false, None, &faults, timings);
            info!(
                user_id = %request.user_id,
                intent = classification.resolved,
                outcome = "clarification",
                "Turn needs clarification"
            );
            return envelope;
        }

        let intent = self.registry.get(classification.resolved);

        // ── Context ──
        let stage = Instant::now();
        let context = self
            .assembler
            .assemble(intent, &request, Utc::now().date_naive())
            .await;
        timings.context_ms = elapsed_ms(stage);
        faults.extend(context.faults.iter().cloned());

        // ── Compose ──
        let stage = Instant::now();
        let prompt = self.composer.compose(intent, &request);
        let messages =
            ModelInvoker::build_messages(&prompt, &context.bundle, &context.history, &request.message);
        timings.compose_ms = elapsed_ms(stage);

        // ── Invoke ──
        let stage = Instant::now();
        let invoked = self.invoker.invoke(messages, &cancel).await;
        timings.invoke_ms = elapsed_ms(stage);

        let mut envelope = match invoked {
            Ok(output) => {
                // ── Finalize ──
                let stage = Instant::now();
                let output = match intent {
                    Some(intent) => {
                        let ctx = FinalizeContext {
                            user_id: &request.user_id,
                            business_id: &request.business_id,
                            message: &request.message,
                            hints: &request.hints,
                            bundle: &context.bundle,
                            store: self.assembler.store().as_ref(),
                        };
                        match intent.finalize(output.clone(), &ctx).await {
                            Ok(finalized) => finalized,
                            Err(e) => {
                                warn!(intent = intent.key(), error = %e, "Finalize failed, using unmodified output");
                                faults.push(StageFault::intent(Stage::Finalize, &e));
                                output
                            }
                        }
                    }
                    None => output,
                };
                timings.finalize_ms = elapsed_ms(stage);
                normalize(output, classification.resolved, &self.config.prune)
            }
            Err(InvokeError::Cancelled) => {
                debug!(intent = classification.resolved, "Turn cancelled");
                cancelled_envelope(classification.resolved)
            }
            Err(e) => {
                faults.push(StageFault::invoke(&e));
                fallback_envelope(classification.resolved)
            }
        };

        timings.total_ms = elapsed_ms(started);
        self.finish_meta(
            &mut envelope,
            &classification,
            context.cache_hit,
            Some(&prompt),
            &faults,
            timings,
        );

        info!(
            user_id = %request.user_id,
            business_id = %request.business_id,
            intent = classification.resolved,
            forced = classification.forced,
            outcome = ?envelope.meta.outcome,
            cache_hit = context.cache_hit,
            faults = faults.len(),
            total_ms = envelope.meta.timings.total_ms,
            "Turn complete"
        );
        envelope
    }

    /// Trim the message and cap its length.
    fn prepare(&self, mut request: ChatRequest) -> ChatRequest {
        let trimmed = request.message.trim();
        let max = self.config.invoke.max_message_chars;
        request.message = if trimmed.chars().count() > max {
            debug!(max_chars = max, "Capping long message");
            trimmed.chars().take(max).collect()
        } else {
            trimmed.to_string()
        };
        request
    }

    fn finish_meta(
        &self,
        envelope: &mut ResponseEnvelope,
        classification: &Classification,
        cache_hit: bool,
        prompt: Option<&ComposedPrompt>,
        faults: &[StageFault],
        timings: StageTimings,
    ) {
        let meta = &mut envelope.meta;
        meta.forced = classification.forced;
        meta.ambiguous = classification.is_ambiguous();
        meta.cache_hit = cache_hit;
        meta.error = meta.error || !faults.is_empty();
        meta.diagnostics = self.diagnostics(faults.iter());
        if let Some(prompt) = prompt
            && meta.outcome != Outcome::Clarification
        {
            meta.persona_version = Some(prompt.persona_version.to_string());
            meta.style_version = Some(prompt.style_version.to_string());
        }
        meta.timings = timings;
    }

    /// Fault detail for the envelope; empty in production.
    fn diagnostics<'a>(&self, faults: impl IntoIterator<Item = &'a StageFault>) -> Vec<String> {
        if self.environment.is_production() {
            return Vec::new();
        }
        faults.into_iter().map(ToString::to_string).collect()
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
