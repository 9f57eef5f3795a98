//! Per-user state for Atlas: the user document (profile, knowledgebase
//! files, pipeline settings), its persistence, and removal of uploaded
//! objects from the storage provider.

pub mod config;
pub mod errors;
pub mod model;
pub mod repository;
pub mod storage;

pub use config::{UploadThingConfig, UserStoreConfig};
pub use errors::{Result, UserStoreError};
pub use model::{
    ChunkingStrategy, ForgeSettings, KnowledgebaseFile, KnowledgebaseSettings, ParsingProvider,
    PartitioningStrategy, PersonalizationSettings, Profile, Settings, UserRecord,
};
pub use repository::{InMemoryUserRepository, JsonFileUserRepository, UserRepository};
pub use storage::{NoopStorage, ObjectStorage, UploadThingStorage, build_storage};
