//! Context retrieval and prompt composition for the ask flow.

mod prompt;
mod retriever;

pub use prompt::PromptComposer;
pub use retriever::{ContextRetriever, ContextSource, SourceKind};
