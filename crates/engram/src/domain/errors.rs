//! Domain Errors
//!
//! Error types for domain operations.

use std::time::Duration;

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    pub fn timeout<T: AsRef<str>>(operation: T, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.as_ref().to_string(),
            after,
        }
    }
}
