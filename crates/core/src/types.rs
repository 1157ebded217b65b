//! Core types for the recommendation engine
//!
//! This module defines the foundational types:
//! - UserId / ItemId / GenreId: integer identifiers from the catalog layer
//! - ItemSummary: the slice of a catalog item the recommenders need
//! - RatingRecord / PurchaseRecord: the two live interaction signals

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a store user
///
/// Wraps the integer primary key assigned by the catalog layer. The engine
/// never allocates user ids; it only resolves them against live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    /// Create a UserId from a raw catalog key
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw integer key
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    /// Create an ItemId from a raw catalog key
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw integer key
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenreId(u64);

impl GenreId {
    /// Create a GenreId from a raw catalog key
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw integer key
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The slice of a catalog item the recommenders operate on
///
/// The full catalog record (title, price, author, ...) stays in the
/// persistence layer; candidate selection only needs identity, genre
/// membership, and availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    /// Catalog item id
    pub id: ItemId,
    /// Genres the item is tagged with
    pub genres: Vec<GenreId>,
    /// Whether the item is currently purchasable
    pub available: bool,
}

impl ItemSummary {
    /// Create a new summary
    pub fn new(id: ItemId, genres: Vec<GenreId>, available: bool) -> Self {
        Self {
            id,
            genres,
            available,
        }
    }

    /// True if this item shares at least one genre with `genres`
    pub fn shares_genre(&self, genres: &[GenreId]) -> bool {
        self.genres.iter().any(|g| genres.contains(g))
    }
}

/// An explicit rating signal: user scored an item 1-5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// Rating author
    pub user: UserId,
    /// Rated item
    pub item: ItemId,
    /// Score on the 1-5 scale
    pub score: u8,
}

/// An implicit purchase signal: a completed-order line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Buyer
    pub user: UserId,
    /// Purchased item
    pub item: ItemId,
}

/// A merged interaction: one strength per (user, item) pair
///
/// Produced by the two-pass merge in the matrix builder. Explicit ratings
/// always win over implicit purchase signals for the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Interacting user
    pub user: UserId,
    /// Target item
    pub item: ItemId,
    /// Interaction strength on the rating scale
    pub strength: f32,
}
