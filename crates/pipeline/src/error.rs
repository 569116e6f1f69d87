//! Stage error types and the fault record the orchestrator collects.
//!
//! Every stage returns a `Result`. Nothing here is ever surfaced to the
//! caller as an error: the orchestrator turns each `Err` into a
//! [`StageFault`] and keeps going with the best available default.

use serde::Serialize;
use steward_core::error::{ProviderError, StoreError};
use thiserror::Error;

/// Failures inside an intent's predicate or finalize hook.
#[derive(Debug, Clone, Error)]
pub enum IntentError {
    #[error("Invalid pattern `{pattern}`: {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("Intent `{0}` is already registered")]
    DuplicateKey(String),

    #[error("Finalize failed: {0}")]
    Finalize(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntentError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pattern { .. } => "pattern",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::Finalize(_) => "finalize",
            Self::Store(_) => "store",
        }
    }
}

/// Failures while a recipe gathers its context bundle.
#[derive(Debug, Clone, Error)]
pub enum RecipeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid recipe input: {0}")]
    InvalidInput(String),

    #[error("Recipe failed: {0}")]
    Failed(String),
}

impl RecipeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Store(_) => "store",
            Self::InvalidInput(_) => "invalid_input",
            Self::Failed(_) => "recipe",
        }
    }
}

/// Failures of the single model call.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Completion timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Request cancelled before the completion finished")]
    Cancelled,

    #[error("Completion was empty")]
    EmptyCompletion,
}

impl InvokeError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::EmptyCompletion => "empty_completion",
        }
    }
}

/// Pipeline stage a fault was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Classify,
    Context,
    History,
    Invoke,
    Finalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Classify => "classify",
            Self::Context => "context",
            Self::History => "history",
            Self::Invoke => "invoke",
            Self::Finalize => "finalize",
        };
        f.write_str(s)
    }
}

/// A recorded, non-fatal stage failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFault {
    pub stage: Stage,
    pub kind: &'static str,
    pub detail: String,
}

impl StageFault {
    pub fn new(stage: Stage, kind: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            detail: detail.into(),
        }
    }

    pub fn intent(stage: Stage, err: &IntentError) -> Self {
        Self::new(stage, err.kind(), err.to_string())
    }

    pub fn recipe(err: &RecipeError) -> Self {
        Self::new(Stage::Context, err.kind(), err.to_string())
    }

    pub fn invoke(err: &InvokeError) -> Self {
        Self::new(Stage::Invoke, err.kind(), err.to_string())
    }
}

impl std::fmt::Display for StageFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}: {}", self.stage, self.kind, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_display_includes_stage_and_kind() {
        let fault = StageFault::invoke(&InvokeError::Timeout { secs: 30 });
        assert_eq!(fault.to_string(), "invoke/timeout: Completion timed out after 30s");
    }

    #[test]
    fn store_errors_convert() {
        let err: RecipeError = StoreError::Storage("disk full".into()).into();
        assert_eq!(err.kind(), "store");
        let fault = StageFault::recipe(&err);
        assert_eq!(fault.stage, Stage::Context);
        assert!(fault.detail.contains("disk full"));
    }

    #[test]
    fn provider_errors_convert() {
        let err: InvokeError = ProviderError::Network("connection reset".into()).into();
        assert_eq!(err.kind(), "provider");
    }
}
