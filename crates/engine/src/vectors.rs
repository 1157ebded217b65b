//! Cache-backed access to item embeddings
//!
//! Embeddings are produced offline and stored serialized in the catalog;
//! this facade decodes them and keeps a per-item cache entry in front of
//! the store. The bulk path matters: one recommendation request touches up
//! to ~150 candidates, and the uncached subset must be fetched with a
//! single store query.

use bookrec_cache::{vector_key, CacheBackend};
use bookrec_core::{Error, ItemId, Result};
use bookrec_store::CatalogStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache-backed embedding reader
#[derive(Clone)]
pub struct VectorStore {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl VectorStore {
    /// Create a vector store over the given catalog and cache
    pub fn new(store: Arc<dyn CatalogStore>, cache: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    /// Fetch one item's embedding
    ///
    /// Cache hit returns the decoded vector; miss loads from the store,
    /// populates the cache, and returns. Absent row → `VectorNotFound`.
    pub fn get(&self, item: ItemId) -> Result<Vec<f32>> {
        let key = vector_key(item);

        if let Some(bytes) = self.cache.get(&key) {
            match decode(&bytes) {
                Ok(vector) => return Ok(vector),
                Err(err) => {
                    // Undecodable entry: evict and fall through to the store
                    warn!(%item, %err, "evicting corrupt cached vector");
                    self.cache.delete(&key);
                }
            }
        }

        let bytes = self
            .store
            .item_vector(item)?
            .ok_or(Error::VectorNotFound(item))?;
        let vector = decode(&bytes)?;
        self.cache.set(&key, bytes, self.ttl);
        debug!(%item, dimension = vector.len(), "vector cached");
        Ok(vector)
    }

    /// Fetch many embeddings, batch-loading the uncached subset
    ///
    /// Items without a stored embedding are omitted from the result; the
    /// store is queried exactly once, for the uncached subset only.
    pub fn get_many(&self, items: &[ItemId]) -> Result<HashMap<ItemId, Vec<f32>>> {
        let mut found = HashMap::with_capacity(items.len());
        let mut misses = Vec::new();

        for &item in items {
            let key = vector_key(item);
            match self.cache.get(&key) {
                Some(bytes) => match decode(&bytes) {
                    Ok(vector) => {
                        found.insert(item, vector);
                    }
                    Err(err) => {
                        warn!(%item, %err, "evicting corrupt cached vector");
                        self.cache.delete(&key);
                        misses.push(item);
                    }
                },
                None => misses.push(item),
            }
        }

        if misses.is_empty() {
            return Ok(found);
        }

        let loaded = self.store.item_vectors(&misses)?;
        for (item, bytes) in loaded {
            match decode(&bytes) {
                Ok(vector) => {
                    self.cache.set(&vector_key(item), bytes, self.ttl);
                    found.insert(item, vector);
                }
                Err(err) => {
                    // Skip the item rather than failing the whole batch
                    warn!(%item, %err, "skipping undecodable stored vector");
                }
            }
        }
        Ok(found)
    }

    /// Evict one item's cache entry unconditionally
    pub fn invalidate(&self, item: ItemId) {
        self.cache.delete(&vector_key(item));
        debug!(%item, "vector cache entry evicted");
    }
}

fn decode(bytes: &[u8]) -> Result<Vec<f32>> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Serialize an embedding the way the offline vectorizer does
///
/// Exposed so tests and embedded deployments can seed stores with
/// correctly-encoded vectors.
pub fn encode_vector(vector: &[f32]) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec(vector)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookrec_cache::MemoryCache;
    use bookrec_store::MemoryCatalog;

    fn setup() -> (Arc<MemoryCatalog>, Arc<MemoryCache>, VectorStore) {
        let catalog = Arc::new(MemoryCatalog::new());
        let cache = Arc::new(MemoryCache::new());
        let vectors = VectorStore::new(
            catalog.clone() as Arc<dyn CatalogStore>,
            cache.clone() as Arc<dyn CacheBackend>,
            Duration::from_secs(3600),
        );
        (catalog, cache, vectors)
    }

    #[test]
    fn test_get_miss_then_hit() {
        let (catalog, cache, vectors) = setup();
        let item = ItemId::new(1);
        catalog.put_vector(item, encode_vector(&[1.0, 2.0]).unwrap());

        assert_eq!(vectors.get(item).unwrap(), vec![1.0, 2.0]);
        // Populated the cache under the expected key
        assert!(cache.get(&vector_key(item)).is_some());
        // Second read is served from cache even if the store row vanishes
        catalog.remove_vector(item);
        assert_eq!(vectors.get(item).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_get_missing_vector() {
        let (_catalog, _cache, vectors) = setup();
        let result = vectors.get(ItemId::new(404));
        assert!(matches!(result, Err(Error::VectorNotFound(_))));
    }

    #[test]
    fn test_get_many_splits_cached_and_uncached() {
        let (catalog, cache, vectors) = setup();
        let a = ItemId::new(1);
        let b = ItemId::new(2);
        let c = ItemId::new(3);
        catalog.put_vector(a, encode_vector(&[1.0]).unwrap());
        catalog.put_vector(b, encode_vector(&[2.0]).unwrap());

        // Warm one entry, then drop its store row: a correct bulk read only
        // queries the store for the cold subset.
        vectors.get(a).unwrap();
        catalog.remove_vector(a);

        let found = vectors.get_many(&[a, b, c]).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&a], vec![1.0]);
        assert_eq!(found[&b], vec![2.0]);
        assert!(!found.contains_key(&c));
        // The cold load populated b's cache entry
        assert!(cache.get(&vector_key(b)).is_some());
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let (catalog, _cache, vectors) = setup();
        let item = ItemId::new(1);
        catalog.put_vector(item, encode_vector(&[1.0]).unwrap());
        vectors.get(item).unwrap();

        catalog.put_vector(item, encode_vector(&[9.0]).unwrap());
        // Still the stale cached value until invalidated
        assert_eq!(vectors.get(item).unwrap(), vec![1.0]);
        vectors.invalidate(item);
        assert_eq!(vectors.get(item).unwrap(), vec![9.0]);
    }

    #[test]
    fn test_corrupt_cache_entry_recovers_from_store() {
        let (catalog, cache, vectors) = setup();
        let item = ItemId::new(1);
        catalog.put_vector(item, encode_vector(&[5.0]).unwrap());
        cache.set(&vector_key(item), vec![0xFF, 0xFF], Duration::from_secs(60));

        assert_eq!(vectors.get(item).unwrap(), vec![5.0]);
    }
}
