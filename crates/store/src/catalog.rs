//! Read contract against the persistence layer
//!
//! The engine never talks to the relational store directly; everything it
//! needs is behind this trait. The aggregate counts exist so the matrix
//! builder can fingerprint the dataset without comparing full datasets.

use bookrec_core::{GenreId, ItemId, ItemSummary, PurchaseRecord, RatingRecord, Result, UserId};
use std::collections::HashMap;

/// Queryable view of catalog, rating, and order data
///
/// Implementations must be safe to share across request workers.
pub trait CatalogStore: Send + Sync {
    /// Available items, minus `exclude`, optionally restricted to items
    /// sharing at least one of `genres`
    fn available_items(
        &self,
        exclude: &[ItemId],
        genres: Option<&[GenreId]>,
    ) -> Result<Vec<ItemSummary>>;

    /// True if the item exists and is currently available
    fn item_exists_available(&self, item: ItemId) -> Result<bool>;

    /// Summaries for the given items, in input order
    ///
    /// Unknown ids are silently skipped; viewed-item histories may
    /// reference items that have since been removed.
    fn item_summaries(&self, ids: &[ItemId]) -> Result<Vec<ItemSummary>>;

    /// Serialized embedding for one item, if stored
    fn item_vector(&self, item: ItemId) -> Result<Option<Vec<u8>>>;

    /// Serialized embeddings for many items in one query
    ///
    /// Items without a stored embedding are omitted from the map.
    fn item_vectors(&self, items: &[ItemId]) -> Result<HashMap<ItemId, Vec<u8>>>;

    /// Total number of explicit ratings
    fn count_ratings(&self) -> Result<u64>;

    /// Total number of line items belonging to completed orders
    fn count_completed_purchase_lines(&self) -> Result<u64>;

    /// Every explicit rating
    fn ratings(&self) -> Result<Vec<RatingRecord>>;

    /// One record per completed-order line item
    ///
    /// A user who bought the same item on two orders yields two records;
    /// deduplication is the matrix builder's concern.
    fn completed_purchase_lines(&self) -> Result<Vec<PurchaseRecord>>;

    /// True if the user exists
    fn user_exists(&self, user: UserId) -> Result<bool>;
}
