use crate::blob::BlobError;
use crate::store::{Entity, StoreError};
use thiserror::Error;

/// Failures of the catalog and order services, phrased for the person who
/// triggered them.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("you do not have permission to perform this action")]
    Forbidden,
    #[error("invalid username or password")]
    Unauthorized,
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i32 },
    #[error("{entity} {id} is used by existing records and cannot be deleted")]
    Protected { entity: Entity, id: i32 },
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("cannot check credentials: {0}")]
    Credential(#[from] argon2::Error),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Protected { entity, id } => ServiceError::Protected { entity, id },
            StoreError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            StoreError::Conflict { entity, key } => {
                let field = match entity {
                    Entity::Product => "article",
                    Entity::Account => "username",
                    _ => "name",
                };
                ServiceError::validation(field, format!("{entity} `{key}` already exists"))
            }
            StoreError::MissingReference(detail) => ServiceError::validation("reference", detail),
            err => ServiceError::Store(err),
        }
    }
}
