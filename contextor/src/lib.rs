//! Knowledgebase retrieval for one chat turn.
//!
//! Public API: [`RetrievalPipeline`]. It embeds the user's message, queries
//! the user's vector namespace for top-K candidates, reranks them to top-N,
//! drops those under the relevance threshold and formats the survivors into
//! the context string the assistant consumes. Progress streams as
//! [`RetrievalStatus`] events.

mod cfg;
mod error;
pub mod personalization;
pub mod prompt;
mod rerank;
mod retrieve;

pub use cfg::RetrievalParams;
pub use error::ContextorError;
pub use rerank::{RankedDocument, RerankService, Reranker, apply_threshold};
pub use retrieve::{
    RetrievalEvent, RetrievalOutcome, RetrievalPipeline, RetrievalResult, RetrievalSink,
    RetrievalStatus,
};
