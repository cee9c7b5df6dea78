//! Error types for Plinth operations

use thiserror::Error;

/// Validation gate rejection.
///
/// Carries every message produced by the gate so callers can surface all
/// problems at once instead of fixing them one write at a time. An object
/// that fails validation has not been written anywhere.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Validation failed: {}", .messages.join("; "))]
pub struct ValidationFailure {
    /// Human-readable messages, one per failed check.
    pub messages: Vec<String>,
}

impl ValidationFailure {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

/// Rejected constraint registration.
///
/// Produced when a constraint cannot be prepared for checking, for example
/// a pattern that does not compile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid constraint for {type_tag}.{field}: {reason}")]
pub struct ConstraintError {
    pub type_tag: String,
    pub field: String,
    pub reason: String,
}

/// Durable store errors. These abort the surrounding operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Durable write failed for {id}: {reason}")]
    WriteFailed { id: String, reason: String },

    #[error("Durable delete failed for {id}: {reason}")]
    DeleteFailed { id: String, reason: String },

    #[error("Durable read failed for {id}: {reason}")]
    ReadFailed { id: String, reason: String },

    #[error("Durable store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Search index errors. The write path logs these and degrades.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Search index unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Index write failed for {id}: {reason}")]
    WriteFailed { id: String, reason: String },

    #[error("Index lock poisoned")]
    LockPoisoned,
}

/// Cache errors. The write path logs these and degrades.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Master error type for all Plinth operations.
#[derive(Debug, Clone, Error)]
pub enum PlinthError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Constraint error: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Listener {listener} aborted the operation: {reason}")]
    ListenerAborted { listener: String, reason: String },
}

/// Result type alias for Plinth operations.
pub type PlinthResult<T> = Result<T, PlinthError>;

// =============================================================================
// TESTS
// =============================================================================
