//! Error taxonomy for the store seam, the live channel and the mutation boundary.

use thiserror::Error;

/// Failure reported by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// `create` addressed a key that is already taken.
    #[error("document {collection}:{id} already exists")]
    AlreadyExists { collection: String, id: String },
    /// `update` or `delete` addressed a key that does not exist.
    #[error("document {collection}:{id} not found")]
    NotFound { collection: String, id: String },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Transport-level failure (network down, store unreachable).
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("document serialization error: {0}")]
    Serde(String),
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// The live channel failed to deliver a snapshot.
///
/// Non-fatal: the mirror keeps its last good snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("live subscription failed: {source}")]
pub struct SubscriptionError {
    #[from]
    pub source: StoreError,
}

/// A required field was empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("the `{0}` field is required")]
    MissingField(&'static str),
}

/// Which remote write a [`MutationError::RemoteWrite`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOp::Create => write!(f, "create"),
            WriteOp::Update => write!(f, "update"),
            WriteOp::Delete => write!(f, "delete"),
        }
    }
}

/// Typed outcome of a rejected add, update or delete.
///
/// Raw store failures never cross the coordinator boundary; they arrive here
/// already classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("invalid item: {0}")]
    Validation(#[from] ValidationError),
    #[error("item `{id}` could not be created: the identifier may already exist")]
    DuplicateId { id: String },
    #[error("failed to {op} item `{id}`: {source}")]
    RemoteWrite {
        op: WriteOp,
        id: String,
        #[source]
        source: StoreError,
    },
    #[error("no item is selected")]
    NoSelection,
}

impl MutationError {
    /// Human-readable reason suitable for an alert.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, MutationError::DuplicateId { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MutationError::Validation(_))
    }
}
