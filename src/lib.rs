//! Bookrec - recommendation and caching core for the bookstore catalog
//!
//! Bookrec is the recommendation subsystem of the store: a content-based
//! recommender over precomputed item embeddings and a user-based
//! collaborative recommender over a live interaction matrix, sharing one
//! cache discipline (deterministic keys, fixed TTLs, targeted
//! invalidation).
//!
//! # Quick Start
//!
//! ```ignore
//! use bookrec::{MemoryCache, MemoryCatalog, Recommender, ItemId, UserId};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(MemoryCatalog::new());
//! let cache = Arc::new(MemoryCache::new());
//! let engine = Recommender::with_artifact(catalog, cache, "svd_factors.mpk");
//!
//! let similar = engine.recommend_by_viewed(&[ItemId::new(3), ItemId::new(7)])?;
//! let personal = engine.recommend_for_user(UserId::new(42));
//! ```
//!
//! # Architecture
//!
//! Persistence of catalog/user/order entities and HTTP routing live
//! outside this crate; the engine consumes a [`CatalogStore`] and exposes
//! the [`Recommender`] facade plus write-path [`bookrec_engine::InvalidationHooks`].

// Re-export the public API
pub use bookrec_cache::{CacheBackend, MemoryCache};
pub use bookrec_core::{
    Error, GenreId, ItemId, ItemSummary, PurchaseRecord, RatingRecord, RecommenderConfig, Result,
    UserId,
};
pub use bookrec_engine::{
    ActivityStats, CollaborativeResponse, ContentResponse, FactorizationModel, InvalidationHooks,
    ItemField, ModelInfo, ModelSlot, RecommendationKind, Recommender, ScoredItem,
};
pub use bookrec_store::{CatalogStore, MemoryCatalog};
