//! Error types for the ledger.

use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid deposit amount: {0}")]
    InvalidAmount(f64),

    #[error("Contributor not found: {0}")]
    ContributorNotFound(String),

    #[error("Entry index {index} out of bounds for {contributor} (len={len})")]
    EntryOutOfBounds {
        contributor: String,
        index: usize,
        len: usize,
    },

    #[error("Period not found: {0}")]
    PeriodNotFound(String),

    #[error("Roster member not found: {0}")]
    RosterMemberNotFound(String),

    #[error("Name already taken: {0}")]
    DuplicateName(String),

    #[error("Permission denied for {0}")]
    PermissionDenied(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Data directory is locked by another process")]
    Locked,

    #[error("Data directory not initialized")]
    NotInitialized,

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for TallyError {
    fn from(e: serde_json::Error) -> Self {
        TallyError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for TallyError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        TallyError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for TallyError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        TallyError::Deserialization(e.to_string())
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, TallyError>;
