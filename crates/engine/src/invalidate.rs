//! Write-path cache invalidation
//!
//! The persistence layer calls these hooks synchronously from its write
//! path. Each hook performs targeted eviction: a vector write clears that
//! item's vector entry and sweeps the content-response namespace (those
//! keys are digests, unpredictable in advance); an interaction write
//! clears the affected user's collaborative entry and sweeps the matrix
//! namespace.

use bookrec_cache::{user_key, vector_key, CacheBackend, CONTENT_PREFIX, MATRIX_PREFIX};
use bookrec_core::{ItemId, UserId};
use std::sync::Arc;
use tracing::debug;

/// Catalog-item fields whose change affects recommendation output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    /// `available` flag
    Availability,
    /// Stock level
    Stock,
    /// Aggregated average rating
    AverageRating,
    /// Anything else (title, description, price, ...)
    Other,
}

impl ItemField {
    fn affects_recommendations(self) -> bool {
        matches!(
            self,
            ItemField::Availability | ItemField::Stock | ItemField::AverageRating
        )
    }
}

/// Entity-change hooks the write path fires
#[derive(Clone)]
pub struct InvalidationHooks {
    cache: Arc<dyn CacheBackend>,
}

impl InvalidationHooks {
    /// Create hooks over the shared cache
    pub fn new(cache: Arc<dyn CacheBackend>) -> Self {
        Self { cache }
    }

    /// An item's embedding was created, updated, or deleted
    pub fn vector_changed(&self, item: ItemId) {
        self.cache.delete(&vector_key(item));
        let swept = self.cache.delete_prefix(CONTENT_PREFIX);
        debug!(%item, swept, "vector change evicted caches");
    }

    /// A catalog item was updated; `fields` lists what changed
    ///
    /// Only availability/stock/rating-relevant updates force evictions.
    pub fn item_updated(&self, item: ItemId, fields: &[ItemField]) {
        if !fields.iter().any(|field| field.affects_recommendations()) {
            return;
        }
        self.cache.delete(&vector_key(item));
        let swept = self.cache.delete_prefix(CONTENT_PREFIX);
        debug!(%item, swept, "item update evicted caches");
    }

    /// A rating was created or updated
    pub fn rating_changed(&self, user: UserId) {
        self.evict_user_and_matrix(user, "rating change");
    }

    /// A rating was deleted
    pub fn rating_deleted(&self, user: UserId) {
        self.evict_user_and_matrix(user, "rating deletion");
    }

    /// An order transitioned to completed
    pub fn order_completed(&self, user: UserId) {
        self.evict_user_and_matrix(user, "order completion");
    }

    /// A line item of an order changed; only completed orders matter
    pub fn order_item_changed(&self, user: UserId, order_completed: bool) {
        if order_completed {
            self.evict_user_and_matrix(user, "order line change");
        }
    }

    fn evict_user_and_matrix(&self, user: UserId, cause: &str) {
        self.cache.delete(&user_key(user));
        let swept = self.cache.delete_prefix(MATRIX_PREFIX);
        debug!(%user, swept, cause, "interaction write evicted caches");
    }
}
