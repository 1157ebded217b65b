//! Foundational types for the bookstore recommendation core
//!
//! This crate defines the vocabulary shared by every other crate in the
//! workspace:
//! - Integer id newtypes (`UserId`, `ItemId`, `GenreId`)
//! - Catalog and interaction record types
//! - The crate-wide error enum and `Result` alias
//! - `RecommenderConfig`, the single home for tunable constants

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::RecommenderConfig;
pub use error::{Error, Result};
pub use types::{
    GenreId, InteractionRecord, ItemId, ItemSummary, PurchaseRecord, RatingRecord, UserId,
};
