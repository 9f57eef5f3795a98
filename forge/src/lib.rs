//! Ingestion side of Atlas.
//!
//! - [`ParsingService`]: Unstructured partitioning behind [`DocumentParser`]
//! - [`IngestionPipeline`]: per-file parse → embed → upsert with status events
//! - [`DeletionService`]: vectors, stored object and record removal
//! - [`LeaseRegistry`]: at most one ingestion per file at a time

pub mod config;
pub mod deletion;
pub mod errors;
pub mod lease;
pub mod parsing;
pub mod pipeline;

pub use config::ParsingConfig;
pub use deletion::{DeletionReport, DeletionService};
pub use errors::{ForgeError, Result};
pub use lease::{FileLease, LeaseRegistry};
pub use parsing::{ChunkingParams, DocumentParser, ParseParams, ParsingService};
pub use pipeline::{ForgeEvent, ForgeSink, ForgeStatus, IngestionPipeline, IngestionSummary};
