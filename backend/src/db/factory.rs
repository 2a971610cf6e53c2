//! Store factory for dependency injection.
//!
//! Picks a [`DocumentStore`] backend from the environment, a `repository.toml`
//! file, or explicit builder settings.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{DocumentStore, RepositoryError, RepositoryResult, StoreLimits};
use super::PostgresConfig;

/// Store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// Postgres + Diesel JSONB store
    Postgres,
    /// In-memory store
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Accepts "postgres", "pg" or "local", case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Read `REPOSITORY_TYPE`; without it, Postgres when a database URL is set,
    /// otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Self::Postgres
        } else {
            Self::Local
        }
    }
}

#[cfg(not(feature = "postgres-repo"))]
fn postgres_disabled() -> RepositoryError {
    RepositoryError::configuration("Postgres repository feature not enabled")
}

/// Creates store instances.
///
/// # Example
/// ```ignore
/// use league_standings::db::{RepositoryFactory, RepositoryType};
///
/// let store = RepositoryFactory::create(RepositoryType::Local, None).await?;
/// assert!(store.health_check().await?);
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a store of the given type.
    ///
    /// # Arguments
    /// * `repo_type` - Backend to create
    /// * `postgres_config` - Required for Postgres
    pub async fn create(
        repo_type: RepositoryType,
        postgres_config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn DocumentStore>> {
        match repo_type {
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let config = postgres_config.ok_or_else(|| {
                        RepositoryError::configuration(
                            "Postgres repository requires PostgresConfig",
                        )
                    })?;
                    let pg = Self::create_postgres(config).await?;
                    Ok(pg as Arc<dyn DocumentStore>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    let _ = postgres_config;
                    Err(postgres_disabled())
                }
            }
            RepositoryType::Local => Ok(Self::create_local()),
        }
    }

    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let repo = PostgresRepository::new(config.clone())?;
        tracing::info!(
            max_pool_size = config.max_pool_size,
            "postgres document store ready"
        );
        Ok(Arc::new(repo))
    }

    /// In-memory store with default limits.
    pub fn create_local() -> Arc<dyn DocumentStore> {
        Arc::new(LocalRepository::new())
    }

    pub fn create_local_with_limits(limits: StoreLimits) -> Arc<dyn DocumentStore> {
        Arc::new(LocalRepository::with_limits(limits))
    }

    /// Create a store from `REPOSITORY_TYPE` and the `PG_*` variables.
    pub async fn from_env() -> RepositoryResult<Arc<dyn DocumentStore>> {
        RepositoryBuilder::new().from_env()?.build().await
    }

    /// Create a store from a `repository.toml` file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn DocumentStore>> {
        RepositoryBuilder::new()
            .from_config_file(config_path)?
            .build()
            .await
    }

    /// Create a store from `repository.toml` in the standard locations.
    pub async fn from_default_config() -> RepositoryResult<Arc<dyn DocumentStore>> {
        RepositoryBuilder::new().from_default_config()?.build().await
    }
}

/// Fluent store configuration.
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    limits: StoreLimits,
    #[cfg(feature = "postgres-repo")]
    postgres_config: Option<PostgresConfig>,
}

impl RepositoryBuilder {
    /// Backend chosen from the environment, default limits.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::from_env(),
            limits: StoreLimits::default(),
            #[cfg(feature = "postgres-repo")]
            postgres_config: None,
        }
    }

    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    pub fn limits(mut self, limits: StoreLimits) -> Self {
        self.limits = limits;
        self
    }

    #[cfg(feature = "postgres-repo")]
    pub fn postgres_config(mut self, config: PostgresConfig) -> Self {
        self.postgres_config = Some(config);
        self
    }

    /// Load backend settings from environment variables.
    pub fn from_env(mut self) -> RepositoryResult<Self> {
        self.repo_type = RepositoryType::from_env();

        if self.repo_type == RepositoryType::Postgres {
            #[cfg(feature = "postgres-repo")]
            {
                self.postgres_config = Some(PostgresConfig::from_env()?);
            }
            #[cfg(not(feature = "postgres-repo"))]
            {
                return Err(postgres_disabled());
            }
        }

        Ok(self)
    }

    /// Load backend settings from a TOML file.
    pub fn from_config_file<P: AsRef<Path>>(self, config_path: P) -> RepositoryResult<Self> {
        let repo_config = RepositoryConfig::from_file(config_path)?;
        self.apply_config(&repo_config)
    }

    /// Load backend settings from `repository.toml` in the standard locations.
    pub fn from_default_config(self) -> RepositoryResult<Self> {
        let repo_config = RepositoryConfig::from_default_location()?;
        self.apply_config(&repo_config)
    }

    fn apply_config(mut self, repo_config: &RepositoryConfig) -> RepositoryResult<Self> {
        self.repo_type = repo_config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        self.limits = repo_config.store;

        #[cfg(feature = "postgres-repo")]
        {
            self.postgres_config = repo_config.to_postgres_config()?;
        }
        #[cfg(not(feature = "postgres-repo"))]
        {
            repo_config.to_postgres_config()?;
        }

        Ok(self)
    }

    /// Build the configured store.
    pub async fn build(self) -> RepositoryResult<Arc<dyn DocumentStore>> {
        match self.repo_type {
            RepositoryType::Local => Ok(RepositoryFactory::create_local_with_limits(self.limits)),
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let mut config = self.postgres_config.ok_or_else(|| {
                        RepositoryError::configuration(
                            "Postgres repository requires database configuration",
                        )
                    })?;
                    config.limits = self.limits;
                    let pg = RepositoryFactory::create_postgres(&config).await?;
                    Ok(pg as Arc<dyn DocumentStore>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    Err(postgres_disabled())
                }
            }
        }
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!(
            RepositoryType::from_str("local").unwrap(),
            RepositoryType::Local
        );
        assert_eq!(
            RepositoryType::from_str("Pg").unwrap(),
            RepositoryType::Postgres
        );
        assert!(RepositoryType::from_str("firestore").is_err());
    }

    #[tokio::test]
    async fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().await.unwrap());
        assert_eq!(repo.limits(), StoreLimits::default());
    }

    #[tokio::test]
    async fn test_builder_carries_limits_to_local_store() {
        let limits = StoreLimits {
            max_in_values: 10,
            max_batch_writes: 50,
        };
        let repo = RepositoryBuilder::new()
            .repository_type(RepositoryType::Local)
            .limits(limits)
            .build()
            .await
            .unwrap();

        assert_eq!(repo.limits(), limits);
    }
}
