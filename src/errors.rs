//! # Store Error Types Module
//!
//! Errors raised by the song store. Handlers map `NotFound` to a user-facing
//! message and log everything else.

/// Errors returned by song store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No song with the given id
    #[error("song {0} not found")]
    NotFound(i64),
    /// Query or connection failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
