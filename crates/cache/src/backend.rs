//! Cache capability interface
//!
//! The recommenders treat the cache as a capability with four operations:
//! point get/set/delete plus prefix deletion. Prefix deletion is how whole
//! namespaces (content responses, matrix builds) are invalidated; a backend
//! that cannot enumerate keys must emulate it with a per-namespace
//! generation tag embedded in every key.
//!
//! Values are opaque payload bytes. Callers serialize before `set` and
//! deserialize after `get`, which is what makes repeated cache hits
//! byte-identical.

use std::time::Duration;

/// Shared cache contract
///
/// Implementations must be safe for concurrent use; each operation is
/// atomic per key. No cross-key transaction is required anywhere in the
/// engine.
pub trait CacheBackend: Send + Sync {
    /// Fetch the payload stored under `key`, if present and not expired
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key` with the given time-to-live
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);

    /// Remove the entry under `key`, if any
    fn delete(&self, key: &str);

    /// Remove every entry whose key starts with `prefix`
    ///
    /// Returns the number of entries removed.
    fn delete_prefix(&self, prefix: &str) -> usize;
}
