//! Context assembly: conversation history, intent bundles, pruning.

pub mod assembler;
pub mod history;
pub mod prune;

pub use assembler::{AssembledContext, ContextAssembler};
pub use history::load_history;
pub use prune::{TRUNCATED, prune, prune_map};
