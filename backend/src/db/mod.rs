//! Document storage for league data.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / trigger dispatcher                     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  crate::services - league operations, standings          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  db::services - typed reads over any store               │
//! │  db::paths    - league document layout                   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  DocumentStore trait (repository)                        │
//! └───────────┬─────────────────────────────┬───────────────┘
//!             │                             │
//!   ┌─────────▼─────────┐         ┌─────────▼─────────┐
//!   │  LocalRepository  │         │ PostgresRepository│
//!   │   (in-memory)     │         │  (postgres-repo)  │
//!   └───────────────────┘         └───────────────────┘
//! ```
//!
//! Stores are created through [`RepositoryFactory`] or [`RepositoryBuilder`]
//! and passed around as `Arc<dyn DocumentStore>`.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod paths;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    ChangeKind, CollectionPath, Direction, Document, DocumentChange, DocumentPath, DocumentStore,
    ErrorContext, FieldPath, FieldValue, Fields, FilterOp, Query, RepositoryError,
    RepositoryResult, StoreLimits, WriteBatch,
};
pub use services::{get_typed, health_check, query_in_chunks, query_typed};
