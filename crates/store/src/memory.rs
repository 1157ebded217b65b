//! In-memory catalog store
//!
//! Backs tests and embedded deployments. State lives behind parking_lot
//! RwLocks; reads take shared guards, the write path takes exclusive
//! guards per map. Ratings are unique per (user, item) pair, matching the
//! relational constraint they mirror.

use crate::catalog::CatalogStore;
use bookrec_core::{
    Error, GenreId, ItemId, ItemSummary, PurchaseRecord, RatingRecord, Result, UserId,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::HashMap;

/// A stored order: line items plus completion state
#[derive(Debug, Clone)]
pub struct OrderRecord {
    /// Buyer
    pub user: UserId,
    /// Ordered items
    pub items: Vec<ItemId>,
    /// Completed orders contribute implicit interaction signals
    pub completed: bool,
    /// Placement time
    pub created_at: DateTime<Utc>,
}

/// In-memory implementation of [`CatalogStore`]
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: RwLock<FxHashMap<ItemId, ItemSummary>>,
    vectors: RwLock<FxHashMap<ItemId, Vec<u8>>>,
    users: RwLock<FxHashSet<UserId>>,
    ratings: RwLock<FxHashMap<(UserId, ItemId), u8>>,
    orders: RwLock<Vec<OrderRecord>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog item
    pub fn upsert_item(&self, item: ItemSummary) {
        self.items.write().insert(item.id, item);
    }

    /// Flip an item's availability flag
    ///
    /// Returns false if the item is unknown.
    pub fn set_item_available(&self, item: ItemId, available: bool) -> bool {
        match self.items.write().get_mut(&item) {
            Some(summary) => {
                summary.available = available;
                true
            }
            None => false,
        }
    }

    /// Store the serialized embedding for an item
    pub fn put_vector(&self, item: ItemId, bytes: Vec<u8>) {
        self.vectors.write().insert(item, bytes);
    }

    /// Remove an item's embedding, if present
    pub fn remove_vector(&self, item: ItemId) {
        self.vectors.write().remove(&item);
    }

    /// Register a user
    pub fn add_user(&self, user: UserId) {
        self.users.write().insert(user);
    }

    /// Insert or replace the rating one user gave one item
    pub fn put_rating(&self, user: UserId, item: ItemId, score: u8) -> Result<()> {
        if !(1..=5).contains(&score) {
            return Err(Error::InvalidInput(format!(
                "rating score {score} outside 1-5"
            )));
        }
        self.ratings.write().insert((user, item), score);
        Ok(())
    }

    /// Remove a rating, if present
    pub fn remove_rating(&self, user: UserId, item: ItemId) {
        self.ratings.write().remove(&(user, item));
    }

    /// Record an order
    pub fn add_order(&self, user: UserId, items: Vec<ItemId>, completed: bool) {
        self.orders.write().push(OrderRecord {
            user,
            items,
            completed,
            created_at: Utc::now(),
        });
    }

    /// Record a completed order
    pub fn add_completed_order(&self, user: UserId, items: Vec<ItemId>) {
        self.add_order(user, items, true);
    }
}

impl CatalogStore for MemoryCatalog {
    fn available_items(
        &self,
        exclude: &[ItemId],
        genres: Option<&[GenreId]>,
    ) -> Result<Vec<ItemSummary>> {
        let items = self.items.read();
        let mut matches: Vec<ItemSummary> = items
            .values()
            .filter(|item| item.available)
            .filter(|item| !exclude.contains(&item.id))
            .filter(|item| match genres {
                Some(wanted) => item.shares_genre(wanted),
                None => true,
            })
            .cloned()
            .collect();
        // Deterministic retrieval order; callers rely on it for stable
        // tie-breaking downstream.
        matches.sort_by_key(|item| item.id);
        Ok(matches)
    }

    fn item_summaries(&self, ids: &[ItemId]) -> Result<Vec<ItemSummary>> {
        let items = self.items.read();
        Ok(ids
            .iter()
            .filter_map(|id| items.get(id).cloned())
            .collect())
    }

    fn item_exists_available(&self, item: ItemId) -> Result<bool> {
        Ok(self
            .items
            .read()
            .get(&item)
            .map(|summary| summary.available)
            .unwrap_or(false))
    }

    fn item_vector(&self, item: ItemId) -> Result<Option<Vec<u8>>> {
        Ok(self.vectors.read().get(&item).cloned())
    }

    fn item_vectors(&self, items: &[ItemId]) -> Result<HashMap<ItemId, Vec<u8>>> {
        let vectors = self.vectors.read();
        Ok(items
            .iter()
            .filter_map(|id| vectors.get(id).map(|bytes| (*id, bytes.clone())))
            .collect())
    }

    fn count_ratings(&self) -> Result<u64> {
        Ok(self.ratings.read().len() as u64)
    }

    fn count_completed_purchase_lines(&self) -> Result<u64> {
        let orders = self.orders.read();
        Ok(orders
            .iter()
            .filter(|order| order.completed)
            .map(|order| order.items.len() as u64)
            .sum())
    }

    fn ratings(&self) -> Result<Vec<RatingRecord>> {
        let ratings = self.ratings.read();
        let mut records: Vec<RatingRecord> = ratings
            .iter()
            .map(|(&(user, item), &score)| RatingRecord { user, item, score })
            .collect();
        records.sort_by_key(|r| (r.user, r.item));
        Ok(records)
    }

    fn completed_purchase_lines(&self) -> Result<Vec<PurchaseRecord>> {
        let orders = self.orders.read();
        Ok(orders
            .iter()
            .filter(|order| order.completed)
            .flat_map(|order| {
                order
                    .items
                    .iter()
                    .map(|&item| PurchaseRecord {
                        user: order.user,
                        item,
                    })
                    .collect::<Vec<_>>()
            })
            .collect())
    }

    fn user_exists(&self, user: UserId) -> Result<bool> {
        Ok(self.users.read().contains(&user))
    }
}
