//! The conversational request pipeline.
//!
//! Each turn flows through:
//!
//! 1. **Classify** the message against the intent registry
//! 2. **Clarify** instead of answering when the top two intents are too close
//! 3. **Assemble context**: conversation history plus the intent's cached bundle
//! 4. **Compose** the persona and style system instructions
//! 5. **Invoke** the model once, bounded by a timeout and a cancellation token
//! 6. **Finalize and normalize** into the canonical response envelope
//!
//! Every stage fails soft. The worst a caller ever sees is a short fallback
//! envelope with `meta.error` set.

pub mod cache;
pub mod clarify;
pub mod classifier;
pub mod context;
pub mod error;
pub mod intents;
pub mod invoker;
pub mod normalize;
pub mod orchestrator;
pub mod output;
pub mod pattern;
pub mod prompt;
pub mod registry;

pub use cache::{CacheKey, ContextCache};
pub use classifier::{Ambiguity, Candidate, Classification, Classifier};
pub use context::{AssembledContext, ContextAssembler};
pub use error::{IntentError, InvokeError, RecipeError, Stage, StageFault};
pub use intents::default_registry;
pub use invoker::ModelInvoker;
pub use orchestrator::{Inspection, Pipeline};
pub use output::ModelOutput;
pub use pattern::{KeywordBoost, Pattern};
pub use prompt::{ComposedPrompt, PromptComposer};
pub use registry::{FetchContext, FinalizeContext, Intent, IntentInfo, IntentRegistry, IntentTag, Recipe};
