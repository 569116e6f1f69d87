//! # Steward Core
//!
//! Domain types, traits, and error definitions for the Steward
//! conversational pipeline. This crate has **no framework dependencies** —
//! it defines the domain model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`Provider`] — the language-model completion backend
//! - [`DataStore`] — the generic queryable collection store
//!
//! Implementations live in `steward-providers` and `steward-store`, which
//! keeps the pipeline testable with in-process mocks.

pub mod envelope;
pub mod error;
pub mod message;
pub mod provider;
pub mod request;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use envelope::{Action, EnvelopeMeta, Outcome, ResponseEnvelope, StageTimings};
pub use error::{ProviderError, StoreError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use request::{ChatRequest, DialOverrides, Depth, Hints, StyleFamily};
pub use store::{DataStore, Filter, SortOrder, StoreQuery};
