use thiserror::Error;

/// Errors produced by core services (export building, fixture encoding).
#[derive(Debug, Error)]
pub enum Error {
    /// JSON serialization failed while building an export payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A referenced entity was not found in its collection.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}
