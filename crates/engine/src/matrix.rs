//! Interaction matrix construction
//!
//! The collaborative recommender works on a dense user × item matrix
//! rebuilt from live data. Index assignments are an artifact of one build:
//! each build interns the users and items it observes, in observation
//! order, into fresh arenas. Nothing downstream may assume an index means
//! the same thing across two builds.
//!
//! Builds are cached under a fingerprint of the live data volume
//! (rating count + completed-purchase line count), so any write that
//! changes either count implicitly forces a rebuild; explicit namespace
//! sweeps on the write path are the belt-and-suspenders on top.

use bookrec_cache::{matrix_key, CacheBackend};
use bookrec_core::{
    Error, InteractionRecord, ItemId, PurchaseRecord, RatingRecord, RecommenderConfig, Result,
    UserId,
};
use bookrec_store::CatalogStore;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

/// Merge explicit ratings and implicit purchase signals
///
/// Two-pass: every rating becomes an interaction first; purchases are then
/// admitted only for (user, item) pairs with no explicit rating, at the
/// configured implicit strength. Duplicate purchase pairs collapse to one
/// interaction. The result has at most one record per pair, explicit
/// always winning.
pub fn merge_interactions(
    ratings: &[RatingRecord],
    purchases: &[PurchaseRecord],
    implicit_strength: f32,
) -> Vec<InteractionRecord> {
    let mut merged: Vec<InteractionRecord> =
        Vec::with_capacity(ratings.len() + purchases.len());
    let mut explicit_pairs: FxHashSet<(UserId, ItemId)> = FxHashSet::default();

    for rating in ratings {
        explicit_pairs.insert((rating.user, rating.item));
        merged.push(InteractionRecord {
            user: rating.user,
            item: rating.item,
            strength: f32::from(rating.score),
        });
    }

    let mut implicit_pairs: FxHashSet<(UserId, ItemId)> = FxHashSet::default();
    for purchase in purchases {
        let pair = (purchase.user, purchase.item);
        if explicit_pairs.contains(&pair) || !implicit_pairs.insert(pair) {
            continue;
        }
        merged.push(InteractionRecord {
            user: purchase.user,
            item: purchase.item,
            strength: implicit_strength,
        });
    }

    merged
}

/// Bidirectional id ↔ index mapping for one matrix build
///
/// Indices are zero-based and assigned in observation order. Arenas are
/// rebuilt from scratch on every build; an index is only meaningful paired
/// with the arena that assigned it.
#[derive(Debug, Clone, Default)]
pub struct IndexArena<T> {
    ids: Vec<T>,
    index: FxHashMap<T, usize>,
}

impl<T: Copy + Eq + Hash> IndexArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Return the index for `id`, assigning the next one if unseen
    pub fn intern(&mut self, id: T) -> usize {
        match self.index.get(&id) {
            Some(&idx) => idx,
            None => {
                let idx = self.ids.len();
                self.ids.push(id);
                self.index.insert(id, idx);
                idx
            }
        }
    }

    /// Index of `id`, if it was interned
    pub fn get(&self, id: T) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Id at `idx`, if in range
    pub fn id_at(&self, idx: usize) -> Option<T> {
        self.ids.get(idx).copied()
    }

    /// Number of interned ids
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if nothing was interned
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All interned ids in index order
    pub fn ids(&self) -> &[T] {
        &self.ids
    }
}

impl<T: Copy + Eq + Hash> From<Vec<T>> for IndexArena<T> {
    fn from(ids: Vec<T>) -> Self {
        let index = ids.iter().enumerate().map(|(idx, &id)| (id, idx)).collect();
        Self { ids, index }
    }
}

/// Dense user × item interaction matrix for one build
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    users: IndexArena<UserId>,
    items: IndexArena<ItemId>,
    /// Row-major, users.len() × items.len()
    data: Vec<f32>,
}

impl InteractionMatrix {
    /// Build a matrix from merged interactions
    ///
    /// Returns None when no interactions exist: the cold-start sentinel,
    /// distinct from any error.
    pub fn from_interactions(records: &[InteractionRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let mut users = IndexArena::new();
        let mut items = IndexArena::new();
        for record in records {
            users.intern(record.user);
            items.intern(record.item);
        }

        let cols = items.len();
        let mut data = vec![0.0f32; users.len() * cols];
        for record in records {
            // Arenas were populated from these same records; lookups hold
            let row = users.get(record.user).expect("user interned");
            let col = items.get(record.item).expect("item interned");
            data[row * cols + col] = record.strength;
        }

        Some(Self { users, items, data })
    }

    /// Number of user rows
    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    /// Number of item columns
    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Row index of `user` in this build, if present
    pub fn user_index(&self, user: UserId) -> Option<usize> {
        self.users.get(user)
    }

    /// Column index of `item` in this build, if present
    pub fn item_index(&self, item: ItemId) -> Option<usize> {
        self.items.get(item)
    }

    /// Item id at column `idx`
    pub fn item_at(&self, idx: usize) -> Option<ItemId> {
        self.items.id_at(idx)
    }

    /// One user's full interaction row
    pub fn user_row(&self, row: usize) -> &[f32] {
        let cols = self.items.len();
        &self.data[row * cols..(row + 1) * cols]
    }

    /// Interaction strength at (row, col)
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.items.len() + col]
    }

    /// Column indices with zero strength for the given row
    pub fn unrated_columns(&self, row: usize) -> Vec<usize> {
        self.user_row(row)
            .iter()
            .enumerate()
            .filter(|(_, &strength)| strength == 0.0)
            .map(|(col, _)| col)
            .collect()
    }
}

/// Serializable form of a matrix build (MessagePack, cached)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixRecord {
    users: Vec<UserId>,
    items: Vec<ItemId>,
    data: Vec<f32>,
}

impl MatrixRecord {
    /// Serialize to bytes (MessagePack)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Deserialize from bytes (MessagePack)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(data)?)
    }
}

impl From<&InteractionMatrix> for MatrixRecord {
    fn from(matrix: &InteractionMatrix) -> Self {
        Self {
            users: matrix.users.ids().to_vec(),
            items: matrix.items.ids().to_vec(),
            data: matrix.data.clone(),
        }
    }
}

impl TryFrom<MatrixRecord> for InteractionMatrix {
    type Error = Error;

    fn try_from(record: MatrixRecord) -> Result<Self> {
        if record.data.len() != record.users.len() * record.items.len() {
            return Err(Error::Serialization(format!(
                "matrix data length {} does not match {} users x {} items",
                record.data.len(),
                record.users.len(),
                record.items.len()
            )));
        }
        Ok(Self {
            users: IndexArena::from(record.users),
            items: IndexArena::from(record.items),
            data: record.data,
        })
    }
}

/// Builds and caches the interaction matrix
pub struct MatrixBuilder {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheBackend>,
    config: RecommenderConfig,
}

impl MatrixBuilder {
    /// Create a builder over the given store and cache
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheBackend>,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// Build or fetch the matrix for the current data volume
    ///
    /// `Ok(None)` means no interactions exist yet. Empty builds are never
    /// cached, so the first interaction is picked up immediately.
    pub fn build(&self) -> Result<Option<InteractionMatrix>> {
        let rating_count = self.store.count_ratings()?;
        let purchase_count = self.store.count_completed_purchase_lines()?;
        let key = matrix_key(rating_count, purchase_count);

        if let Some(bytes) = self.cache.get(&key) {
            match MatrixRecord::from_bytes(&bytes).and_then(InteractionMatrix::try_from) {
                Ok(matrix) => {
                    debug!(
                        users = matrix.n_users(),
                        items = matrix.n_items(),
                        "using cached interaction matrix"
                    );
                    return Ok(Some(matrix));
                }
                Err(err) => {
                    warn!(%err, "evicting corrupt cached matrix");
                    self.cache.delete(&key);
                }
            }
        }

        let ratings = self.store.ratings()?;
        let purchases = self.store.completed_purchase_lines()?;
        let merged = merge_interactions(&ratings, &purchases, self.config.implicit_strength);

        let matrix = match InteractionMatrix::from_interactions(&merged) {
            Some(matrix) => matrix,
            None => return Ok(None),
        };

        self.cache.set(
            &key,
            MatrixRecord::from(&matrix).to_bytes()?,
            self.config.matrix_ttl,
        );
        debug!(
            users = matrix.n_users(),
            items = matrix.n_items(),
            "interaction matrix built and cached"
        );
        Ok(Some(matrix))
    }
}
