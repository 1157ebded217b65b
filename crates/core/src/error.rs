//! Error types for the recommendation core
//!
//! This module defines all hard-failure error types used throughout the
//! system. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Soft outcomes of a recommendation request (cold start, new user, nothing
//! left to recommend) are NOT errors: they are response kinds carried by the
//! collaborative response type. Per-candidate scoring failures are recovered
//! inside the scoring loops and never surface here.

use crate::types::ItemId;
use std::io;
use thiserror::Error;

/// Result type alias for recommendation-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the recommendation core
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (artifact file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Referenced catalog item does not exist or is unavailable
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// No embedding is stored for the item
    #[error("No vector stored for item {0}")]
    VectorNotFound(ItemId),

    /// The factorization artifact could not be loaded
    ///
    /// Fatal for the current request only; the load is retried on the next
    /// request because the lazy slot is never populated on failure.
    #[error("Factorization artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    /// Data store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
