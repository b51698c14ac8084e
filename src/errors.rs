use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the engine's services and store collaborators.
///
/// Business-rule failures on the validation path are never represented
/// here — they come back as structured results with a message. This
/// type covers infrastructure failures and write-path invariant
/// violations only.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Event error: {0}")]
    EventError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}
