use thiserror::Error;
use uuid::Uuid;

use super::types::MutationOp;

/// Failures reported by a remote store backend.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Row '{id}' not found in table '{table}'")]
    RowNotFound { table: String, id: Uuid },

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Change feed unavailable for table '{0}'")]
    FeedUnavailable(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

/// Failures surfaced by the synchronization layer.
///
/// Every variant is caught at the view boundary and converted into a
/// user-facing notification; none of them are fatal to the process.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A full reload failed. The mirror keeps its previous snapshot.
    #[error("Failed to load {entity} data: {source}")]
    Fetch {
        entity: String,
        #[source]
        source: StoreError,
    },

    /// A create/update/delete failed. The mirror is left unchanged.
    #[error("Failed to {op} {entity}: {source}")]
    Write {
        op: MutationOp,
        entity: String,
        #[source]
        source: StoreError,
    },

    /// A create payload is missing a required field. Rejected before any
    /// remote call is issued.
    #[error("{entity} payload is missing required field '{field}'")]
    Validation { entity: String, field: String },

    /// A mutation payload did not serialize to a JSON object.
    #[error("{entity} payload must be a JSON object")]
    InvalidPayload { entity: String },

    /// The push channel failed to open. The consuming view degrades to
    /// fetch-on-open-only.
    #[error("Failed to open change feed for {entity}: {source}")]
    Subscription {
        entity: String,
        #[source]
        source: StoreError,
    },

    /// The store returned a record the entity type could not decode.
    #[error("Failed to decode {entity} record: {message}")]
    Decode { entity: String, message: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
