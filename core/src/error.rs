//! Error taxonomy for the tracking engine.
//!
//! Every layer returns explicit results; nothing here is fatal to the
//! process and each error is scoped to one entity and one request.

use thiserror::Error;

pub use crate::key::InvalidKey;

/// Failures from the remote stats client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The lookup input was empty or could not be used as an identifier.
    #[error("invalid entity key {input:?}")]
    InvalidKey { input: String },

    /// The remote source does not know the entity.
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// Network error, timeout, rate limit or non-success HTTP status.
    #[error("transient failure fetching {entity}: {reason}")]
    Transient { entity: String, reason: String },

    /// The API answered with an embedded error that retrying will not fix
    /// (bad key, insufficient access, ...).
    #[error("API rejected request for {entity} (code {code}): {message}")]
    Rejected {
        entity: String,
        code: i64,
        message: String,
    },

    /// The response body did not match the expected structure.
    #[error("unexpected response for {entity}: {reason}")]
    Decode { entity: String, reason: String },

    /// No API key is configured.
    #[error("no API key configured")]
    MissingApiKey,
}

impl FetchError {
    /// Whether a later retry of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }

    /// Whether the entity is unknown to the remote source.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Errors from the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt snapshot for {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A write older than the stored record was refused.
    #[error("stale write for {key}: stored at {stored_at}, attempted {attempted_at}")]
    StaleWrite {
        key: String,
        stored_at: i64,
        attempted_at: i64,
    },
}

/// Errors from ranking and export.
#[derive(Debug, Error)]
pub enum RankingError {
    /// No snapshots are stored; there is nothing to rank or export.
    #[error("no snapshots stored")]
    EmptyStore,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from a single tracking operation.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    InvalidKey(#[from] InvalidKey),
}
