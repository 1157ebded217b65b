//! Recommendation engine for the bookstore catalog
//!
//! Two retrieval strategies behind one caching discipline:
//! - Content-based: profile a session from recently viewed items and rank
//!   candidates by cosine similarity over precomputed embeddings, with
//!   genre-based candidate pruning
//! - User-based collaborative filtering: apply a precomputed low-rank
//!   factorization to an interaction matrix rebuilt from live ratings and
//!   completed purchases
//!
//! Entry point is [`Recommender`]; the persistence layer's write path
//! additionally wires up [`InvalidationHooks`].

#![warn(missing_docs)]

pub mod collaborative;
pub mod content;
pub mod facade;
pub mod factorization;
pub mod invalidate;
pub mod matrix;
pub mod response;
pub mod similarity;
pub mod vectors;

pub use collaborative::CollaborativeRecommender;
pub use content::ContentRecommender;
pub use facade::Recommender;
pub use factorization::{FactorizationModel, ModelSlot};
pub use invalidate::{InvalidationHooks, ItemField};
pub use matrix::{merge_interactions, IndexArena, InteractionMatrix, MatrixBuilder, MatrixRecord};
pub use response::{
    ActivityStats, CollaborativeResponse, ContentResponse, ModelInfo, RecommendationKind,
    ScoredItem,
};
pub use similarity::{cosine_similarity, mean_profile};
pub use vectors::{encode_vector, VectorStore};
