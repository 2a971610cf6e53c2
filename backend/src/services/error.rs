//! Error taxonomy of the league services.

use crate::db::repository::RepositoryError;

/// Failure of a league operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed or missing input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced document does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Caller lacks the required role.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Store read or write failure.
    #[error(transparent)]
    Internal(RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, context } => Self::NotFound {
                entity: context.entity.unwrap_or_else(|| "document".to_string()),
                id: context.entity_id.unwrap_or(message),
            },
            other => Self::Internal(other),
        }
    }
}
