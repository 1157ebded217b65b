//! Engine configuration
//!
//! All tunable constants of the recommenders live here instead of being
//! scattered as literals. The defaults reproduce production behavior:
//! the implicit-purchase strength (4.0) and the candidate caps (150/100)
//! are operational constants, not derived quantities.

use std::time::Duration;

/// Tunable parameters of both recommenders and the caching layer
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderConfig {
    /// How many distinct recently-viewed items feed the profile vector
    pub profile_window: usize,
    /// Maximum entries in a recommendation response
    pub top_n: usize,
    /// Candidate cap when genre pruning applies
    pub genre_candidate_cap: usize,
    /// Candidate cap for the no-genre-overlap fallback
    pub fallback_candidate_cap: usize,
    /// Interaction strength assigned to a purchase without a rating
    pub implicit_strength: f32,
    /// Lower bound of the rating scale (prediction clipping)
    pub rating_min: f32,
    /// Upper bound of the rating scale (prediction clipping)
    pub rating_max: f32,
    /// TTL for cached recommendation responses
    pub response_ttl: Duration,
    /// TTL for cached item embeddings
    pub vector_ttl: Duration,
    /// TTL for the cached interaction matrix
    pub matrix_ttl: Duration,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            profile_window: 5,
            top_n: 8,
            genre_candidate_cap: 150,
            fallback_candidate_cap: 100,
            implicit_strength: 4.0,
            rating_min: 1.0,
            rating_max: 5.0,
            response_ttl: Duration::from_secs(3600),
            vector_ttl: Duration::from_secs(3600),
            matrix_ttl: Duration::from_secs(3600),
        }
    }
}

impl RecommenderConfig {
    /// Clip a predicted score to the configured rating scale
    pub fn clip_rating(&self, score: f32) -> f32 {
        score.clamp(self.rating_min, self.rating_max)
    }
}
