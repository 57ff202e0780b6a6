//! Error types for engine operations.

use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors that can occur while applying relationship, ping or check-in rules.
///
/// Every variant maps to a distinct [`CoreError::code`] so the transport layer
/// can translate it without string matching.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The actor targeted themselves.
    #[error("cannot target yourself")]
    SelfRequest,

    /// The unordered pair already has a relationship record.
    #[error("a relationship already exists between these users")]
    DuplicateRelationship,

    /// Referenced record is absent or not visible to the caller.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Caller lacks the role for this mutation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// No accepted relationship between sender and receiver.
    #[error("you can only ping accepted friends")]
    NotFriends,

    /// Receiver has not granted the sender VIP trust.
    #[error("you are not a VIP for this user")]
    NotVip,

    /// Daily quota for this pair and class is used up.
    #[error("daily {ping_type} limit of {limit} reached for this friend")]
    RateLimited { ping_type: String, limit: u32 },

    /// Malformed input.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Storage failure.
    #[error("storage error: {0}")]
    Database(DatabaseError),
}

impl CoreError {
    /// Stable, caller-visible error code.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::SelfRequest => "self_request",
            CoreError::DuplicateRelationship => "duplicate_relationship",
            CoreError::NotFound { .. } => "not_found",
            CoreError::Forbidden(_) => "forbidden",
            CoreError::NotFriends => "not_friends",
            CoreError::NotVip => "not_vip",
            CoreError::RateLimited { .. } => "rate_limited",
            CoreError::Validation(_) => "validation",
            CoreError::Database(_) => "internal",
        }
    }

    pub(crate) fn not_found(entity: &'static str) -> Self {
        CoreError::NotFound { entity }
    }
}

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, .. } => CoreError::NotFound { entity },
            other => CoreError::Database(other),
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        CoreError::Database(DatabaseError::Sqlx(err))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, CoreError>;
