//! Response types exposed to the request layer
//!
//! Responses are what gets cached: each type carries MessagePack
//! `to_bytes`/`from_bytes` so a cache hit replays the exact payload the
//! first computation produced.

use bookrec_core::{ItemId, Result};
use serde::{Deserialize, Serialize};

/// One ranked recommendation: an item plus its similarity or predicted score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// Recommended item
    pub item: ItemId,
    /// Cosine similarity (content-based) or predicted rating (collaborative)
    pub score: f32,
}

/// Response of the content-based recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentResponse {
    /// Ranked recommendations, best first, at most `top_n`
    pub recommendations: Vec<ScoredItem>,
    /// The viewed items that actually contributed embeddings to the profile
    pub based_on: Vec<ItemId>,
    /// Number of candidates that were scored
    pub total_candidates: usize,
}

impl ContentResponse {
    /// The empty response: no profile could be built, nothing recommended
    pub fn empty() -> Self {
        Self {
            recommendations: Vec::new(),
            based_on: Vec::new(),
            total_candidates: 0,
        }
    }

    /// Serialize to bytes (MessagePack)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Deserialize from bytes (MessagePack)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(data)?)
    }
}

/// Outcome classification of a collaborative request
///
/// Soft outcomes are first-class response states, not errors; only `Error`
/// maps to a 500-equivalent at the transport layer. An empty list with kind
/// `Error` is always distinguishable from a legitimately empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Personalized predictions were produced
    UserBasedCollaborative,
    /// The user has no interactions yet
    NewUser,
    /// No interactions exist in the system at all (cold start)
    NoData,
    /// The user has interacted with every known item
    NoNewItems,
    /// Every predicted item is currently unavailable
    NoAvailableItems,
    /// Request-scoped failure (artifact load, storage)
    Error,
}

/// Response of the collaborative recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborativeResponse {
    /// Ranked recommendations, best first, at most `top_n`
    pub recommendations: Vec<ScoredItem>,
    /// Outcome classification
    pub kind: RecommendationKind,
    /// Human-readable guidance or error message
    pub message: String,
    /// Convenience count of `recommendations`
    pub total_recommendations: usize,
    /// How many items the user has interacted with (nonzero matrix cells)
    pub user_activities: usize,
}

impl CollaborativeResponse {
    /// A successful personalized response
    pub fn personalized(recommendations: Vec<ScoredItem>, user_activities: usize) -> Self {
        let total_recommendations = recommendations.len();
        Self {
            recommendations,
            kind: RecommendationKind::UserBasedCollaborative,
            message: format!(
                "Personalized recommendations based on {user_activities} of your activities"
            ),
            total_recommendations,
            user_activities,
        }
    }

    /// An empty response with a soft status
    pub fn status(kind: RecommendationKind, message: impl Into<String>) -> Self {
        Self {
            recommendations: Vec::new(),
            kind,
            message: message.into(),
            total_recommendations: 0,
            user_activities: 0,
        }
    }

    /// An error response (request-scoped; never cached)
    pub fn error(message: impl Into<String>) -> Self {
        Self::status(RecommendationKind::Error, message)
    }

    /// Serialize to bytes (MessagePack)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Deserialize from bytes (MessagePack)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(rmp_serde::from_slice(data)?)
    }
}

/// Per-user activity summary for the collaborative system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStats {
    /// Explicit ratings authored by the user
    pub ratings_count: usize,
    /// Mean of the user's rating scores, 0.0 if none
    pub average_rating: f32,
    /// Distinct items the user has purchased (completed orders)
    pub purchases_count: usize,
    /// Distinct purchased items the user never rated; these are the
    /// implicit signals the matrix admits
    pub purchases_without_rating: usize,
    /// ratings_count + purchases_without_rating
    pub total_activity: usize,
}

/// Static description of the loaded factorization artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Latent components in the factorization
    pub components: usize,
    /// Users in the training matrix
    pub trained_users: usize,
    /// Items in the training matrix
    pub trained_items: usize,
    /// Strength assigned to implicit purchase signals
    pub implicit_strength: f32,
    /// Rating scale predictions are clipped to
    pub rating_min: f32,
    /// Upper bound of that scale
    pub rating_max: f32,
}
