//! Model invoker — the single, timeout-bound, cancellable model call.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use steward_core::message::Message;
use steward_core::provider::{Provider, ProviderRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::InvokeError;
use crate::output::ModelOutput;
use crate::prompt::ComposedPrompt;

/// Calls one provider with the composed prompt, context and history.
pub struct ModelInvoker {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.4,
            max_tokens: None,
            timeout,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Provider message list: persona, style, context, history, user.
    pub fn build_messages(
        prompt: &ComposedPrompt,
        bundle: &Value,
        history: &[Message],
        user_message: &str,
    ) -> Vec<Message> {
        let context = serde_json::to_string_pretty(bundle).unwrap_or_else(|_| "{}".into());
        let mut messages = Vec::with_capacity(history.len() + 4);
        messages.extend(prompt.messages());
        messages.push(Message::system(format!("Context:\n{context}")));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(user_message));
        messages
    }

    /// Make the call. Returns `Cancelled` without calling the provider if
    /// the token has already fired; a cancel mid-flight abandons the call.
    pub async fn invoke(
        &self,
        messages: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<ModelOutput, InvokeError> {
        if cancel.is_cancelled() {
            debug!("Cancelled before invocation, skipping provider call");
            return Err(InvokeError::Cancelled);
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: Vec::new(),
        };

        debug!(provider = self.provider.name(), model = %self.model, messages = request.messages.len(), "Invoking model");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(InvokeError::Cancelled),
            result = tokio::time::timeout(self.timeout, self.provider.complete(request)) => match result {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!(provider = self.provider.name(), error = %e, "Provider call failed");
                    return Err(e.into());
                }
                Err(_) => {
                    warn!(provider = self.provider.name(), timeout_secs = self.timeout.as_secs(), "Provider call timed out");
                    return Err(InvokeError::Timeout { secs: self.timeout.as_secs() });
                }
            },
        };

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        let output = ModelOutput::parse(&response.message.content);
        if output.text.trim().is_empty() {
            return Err(InvokeError::EmptyCompletion);
        }
        Ok(output)
    }
}
