//! In-process cache backend
//!
//! DashMap-backed: lock-free reads, sharded writes, per-key atomicity.
//! Entries carry their expiry timestamp; expiry is enforced lazily on read
//! and in bulk by `purge_expired`. Prefix deletion walks the map with
//! `retain`, which is the enumeration capability the invalidation sweeps
//! rely on.

use crate::backend::CacheBackend;
use dashmap::DashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Get current time in microseconds since Unix epoch
fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_micros() as u64
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    /// Expiry timestamp, microseconds since epoch
    expires_at: u64,
}

impl StoredEntry {
    fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// In-memory TTL'd cache
///
/// The sole mutable resource shared across request workers. Safe for
/// concurrent use; no operation spans more than one key.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, StoredEntry>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = now_micros();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    /// True if no live entries remain
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning the number removed
    pub fn purge_expired(&self) -> usize {
        let now = now_micros();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.entries.get(key)?;
        if entry.is_expired(now_micros()) {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let expires_at = now_micros().saturating_add(ttl.as_micros() as u64);
        self.entries
            .insert(key.to_string(), StoredEntry { value, expires_at });
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    fn delete_prefix(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(prefix, removed, "swept cache namespace");
        }
        removed
    }
}
