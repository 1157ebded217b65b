//! Caching layer for the recommendation engine
//!
//! This crate provides:
//! - `CacheBackend`: the capability interface the engine caches against
//! - `MemoryCache`: the in-process DashMap-backed implementation
//! - Key derivation for the four cache namespaces (vectors, content
//!   responses, per-user responses, matrix builds)
//!
//! Payloads are opaque bytes; serialization is the caller's concern so
//! that repeated hits replay byte-identical responses.

#![warn(missing_docs)]

pub mod backend;
pub mod keys;
pub mod memory;

pub use backend::CacheBackend;
pub use keys::{
    content_request_key, matrix_key, user_key, vector_key, CONTENT_PREFIX, MATRIX_PREFIX,
    USER_PREFIX, VECTOR_PREFIX,
};
pub use memory::MemoryCache;
