//! Document store backends.
//!
//! - `local`: in-memory store for unit tests and local development
//! - `postgres`: JSONB-backed store using Diesel (feature `postgres-repo`)
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
