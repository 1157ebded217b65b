//! User-based collaborative recommender
//!
//! Applies the precomputed factorization to the live interaction matrix:
//! the user's row in the current build selects a factor row, every item
//! column the user has no interaction with gets a predicted rating, and
//! the top predictions are resolved back to catalog items.
//!
//! Cold start, unknown user, and fully-saturated users are soft response
//! kinds, never errors. Only full personalized responses are cached; soft
//! statuses are cheap to recompute and must never mask fresh data.

use crate::factorization::ModelSlot;
use crate::matrix::MatrixBuilder;
use crate::response::{CollaborativeResponse, RecommendationKind, ScoredItem};
use bookrec_cache::{user_key, CacheBackend};
use bookrec_core::{RecommenderConfig, Result, UserId};
use bookrec_store::CatalogStore;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Round a predicted rating to two decimals for presentation
fn round2(score: f32) -> f32 {
    (score * 100.0).round() / 100.0
}

/// Per-user collaborative filtering over the live interaction matrix
pub struct CollaborativeRecommender {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheBackend>,
    matrix: MatrixBuilder,
    model: Arc<ModelSlot>,
    config: RecommenderConfig,
}

impl CollaborativeRecommender {
    /// Create a collaborative recommender over the given collaborators
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheBackend>,
        model: Arc<ModelSlot>,
        config: RecommenderConfig,
    ) -> Self {
        let matrix = MatrixBuilder::new(Arc::clone(&store), Arc::clone(&cache), config.clone());
        Self {
            store,
            cache,
            matrix,
            model,
            config,
        }
    }

    /// The shared factorization slot
    pub fn model(&self) -> &ModelSlot {
        &self.model
    }

    /// Build or fetch the current interaction matrix
    pub fn matrix_builder(&self) -> &MatrixBuilder {
        &self.matrix
    }

    /// Recommend items for an authenticated user
    ///
    /// Hard failures (artifact load, storage) propagate as `Err`; the
    /// facade downgrades them to an `Error`-kind response. Everything else
    /// is a soft outcome.
    pub fn recommend(&self, user: UserId) -> Result<CollaborativeResponse> {
        let key = user_key(user);

        if let Some(bytes) = self.cache.get(&key) {
            match CollaborativeResponse::from_bytes(&bytes) {
                Ok(response) => {
                    debug!(%user, "collaborative response cache hit");
                    return Ok(response);
                }
                Err(err) => {
                    warn!(%err, "evicting corrupt cached collaborative response");
                    self.cache.delete(&key);
                }
            }
        }

        let model = self.model.get()?;

        let matrix = match self.matrix.build()? {
            Some(matrix) => matrix,
            None => {
                return Ok(CollaborativeResponse::status(
                    RecommendationKind::NoData,
                    "No interaction data available yet",
                ))
            }
        };

        let row_idx = match matrix.user_index(user) {
            Some(idx) => idx,
            None => {
                return Ok(CollaborativeResponse::status(
                    RecommendationKind::NewUser,
                    "Rate items or make purchases to receive personal recommendations",
                ))
            }
        };

        let unrated = matrix.unrated_columns(row_idx);
        if unrated.is_empty() {
            return Ok(CollaborativeResponse::status(
                RecommendationKind::NoNewItems,
                "You have rated every available item; new arrivals will appear here",
            ));
        }

        let mut predictions: Vec<(usize, f32)> = Vec::with_capacity(unrated.len());
        for col in unrated {
            match model.predict(row_idx, col) {
                Some(raw) => predictions.push((col, self.config.clip_rating(raw))),
                None => {
                    // Live build grew past the trained dimensions; that
                    // candidate simply has no prediction this round.
                    warn!(%user, col, "prediction skipped: outside trained dimensions");
                }
            }
        }

        // Stable sort: equal predictions keep column order
        predictions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        predictions.truncate(self.config.top_n);

        let mut recommendations = Vec::with_capacity(predictions.len());
        for (col, score) in predictions {
            let Some(item) = matrix.item_at(col) else {
                continue;
            };
            // Drop items that went unavailable, preserving rank order and
            // without re-filling the list
            if self.store.item_exists_available(item)? {
                recommendations.push(ScoredItem {
                    item,
                    score: round2(score),
                });
            }
        }

        if recommendations.is_empty() {
            return Ok(CollaborativeResponse::status(
                RecommendationKind::NoAvailableItems,
                "Recommended items are temporarily unavailable",
            ));
        }

        let user_activities = matrix
            .user_row(row_idx)
            .iter()
            .filter(|&&strength| strength > 0.0)
            .count();
        let response = CollaborativeResponse::personalized(recommendations, user_activities);
        self.cache
            .set(&key, response.to_bytes()?, self.config.response_ttl);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factorization::FactorizationModel;
    use bookrec_cache::MemoryCache;
    use bookrec_core::{Error, GenreId, ItemId, ItemSummary};
    use bookrec_store::MemoryCatalog;

    fn toy_model() -> FactorizationModel {
        // 2 trained users, 3 trained items, k = 1
        FactorizationModel::new(
            1,
            vec![vec![1.0], vec![1.0]],
            vec![vec![0.0], vec![0.5], vec![1.0]],
            vec![3.0, 3.0],
        )
        .unwrap()
    }

    struct Fixture {
        catalog: Arc<MemoryCatalog>,
        cache: Arc<MemoryCache>,
        recommender: CollaborativeRecommender,
    }

    fn fixture_with(model: FactorizationModel) -> Fixture {
        let catalog = Arc::new(MemoryCatalog::new());
        let cache = Arc::new(MemoryCache::new());
        let recommender = CollaborativeRecommender::new(
            catalog.clone() as Arc<dyn CatalogStore>,
            cache.clone() as Arc<dyn CacheBackend>,
            Arc::new(ModelSlot::preloaded(model)),
            RecommenderConfig::default(),
        );
        Fixture {
            catalog,
            cache,
            recommender,
        }
    }

    fn seed_item(fixture: &Fixture, id: u64) {
        fixture.catalog.upsert_item(ItemSummary::new(
            ItemId::new(id),
            vec![GenreId::new(1)],
            true,
        ));
    }

    /// Items interned in rating order: 10 -> col 0, 11 -> col 1, 12 -> col 2;
    /// users 1 -> row 0, 2 -> row 1.
    fn seed_interactions(fixture: &Fixture) {
        for id in [10, 11, 12] {
            seed_item(fixture, id);
        }
        let (u1, u2) = (UserId::new(1), UserId::new(2));
        fixture.catalog.put_rating(u1, ItemId::new(10), 5).unwrap();
        fixture.catalog.put_rating(u1, ItemId::new(11), 4).unwrap();
        fixture.catalog.put_rating(u2, ItemId::new(10), 4).unwrap();
        fixture
            .catalog
            .add_completed_order(u1, vec![ItemId::new(12)]);
    }

    #[test]
    fn test_no_data_cold_start() {
        let fixture = fixture_with(toy_model());
        let response = fixture.recommender.recommend(UserId::new(1)).unwrap();
        assert_eq!(response.kind, RecommendationKind::NoData);
        assert!(response.recommendations.is_empty());
    }

    #[test]
    fn test_new_user_soft_status() {
        let fixture = fixture_with(toy_model());
        seed_interactions(&fixture);
        let response = fixture.recommender.recommend(UserId::new(99)).unwrap();
        assert_eq!(response.kind, RecommendationKind::NewUser);
        assert!(response.recommendations.is_empty());
        assert!(!response.message.is_empty());
    }

    #[test]
    fn test_personalized_predictions_ranked_and_clipped() {
        let fixture = fixture_with(toy_model());
        seed_interactions(&fixture);

        // User 2 (row 1) has not touched items 11 (col 1) and 12 (col 2):
        // predictions 3.5 and 4.0
        let response = fixture.recommender.recommend(UserId::new(2)).unwrap();
        assert_eq!(response.kind, RecommendationKind::UserBasedCollaborative);
        let items: Vec<ItemId> = response.recommendations.iter().map(|r| r.item).collect();
        assert_eq!(items, vec![ItemId::new(12), ItemId::new(11)]);
        assert_eq!(response.recommendations[0].score, 4.0);
        assert_eq!(response.recommendations[1].score, 3.5);
        assert_eq!(response.user_activities, 1);
        assert_eq!(response.total_recommendations, 2);
    }

    #[test]
    fn test_no_self_recommendation() {
        let fixture = fixture_with(toy_model());
        seed_interactions(&fixture);
        let response = fixture.recommender.recommend(UserId::new(2)).unwrap();
        // User 2 rated item 10; it must never come back
        assert!(response
            .recommendations
            .iter()
            .all(|r| r.item != ItemId::new(10)));
    }

    #[test]
    fn test_no_new_items_when_user_saturated() {
        let fixture = fixture_with(toy_model());
        seed_item(&fixture, 10);
        let user = UserId::new(1);
        fixture.catalog.put_rating(user, ItemId::new(10), 5).unwrap();

        let response = fixture.recommender.recommend(user).unwrap();
        assert_eq!(response.kind, RecommendationKind::NoNewItems);
    }

    #[test]
    fn test_unavailable_items_dropped_without_refill() {
        let fixture = fixture_with(toy_model());
        seed_interactions(&fixture);
        fixture.catalog.set_item_available(ItemId::new(12), false);

        let response = fixture.recommender.recommend(UserId::new(2)).unwrap();
        let items: Vec<ItemId> = response.recommendations.iter().map(|r| r.item).collect();
        assert_eq!(items, vec![ItemId::new(11)]);
    }

    #[test]
    fn test_all_predicted_items_unavailable() {
        let fixture = fixture_with(toy_model());
        seed_interactions(&fixture);
        fixture.catalog.set_item_available(ItemId::new(11), false);
        fixture.catalog.set_item_available(ItemId::new(12), false);

        let response = fixture.recommender.recommend(UserId::new(2)).unwrap();
        assert_eq!(response.kind, RecommendationKind::NoAvailableItems);
    }

    #[test]
    fn test_predictions_outside_trained_dimensions_skipped() {
        // Trained on 1 user / 1 item; live matrix is larger
        let tiny = FactorizationModel::new(1, vec![vec![1.0]], vec![vec![1.0]], vec![3.0]).unwrap();
        let fixture = fixture_with(tiny);
        seed_interactions(&fixture);

        // User 1 (row 0) has unrated columns only past the trained range
        let response = fixture.recommender.recommend(UserId::new(2)).unwrap();
        assert_eq!(response.kind, RecommendationKind::NoAvailableItems);
    }

    #[test]
    fn test_personalized_response_cached_and_replayed() {
        let fixture = fixture_with(toy_model());
        seed_interactions(&fixture);
        let user = UserId::new(2);

        let first = fixture.recommender.recommend(user).unwrap();
        // Availability changes, but the cached payload is replayed
        fixture.catalog.set_item_available(ItemId::new(12), false);
        let replay = fixture.recommender.recommend(user).unwrap();
        assert_eq!(replay, first);

        // Evicting the per-user entry recomputes against live data
        fixture.cache.delete(&user_key(user));
        let fresh = fixture.recommender.recommend(user).unwrap();
        assert_eq!(fresh.recommendations.len(), 1);
    }

    #[test]
    fn test_soft_status_not_cached() {
        let fixture = fixture_with(toy_model());
        let user = UserId::new(1);
        let response = fixture.recommender.recommend(user).unwrap();
        assert_eq!(response.kind, RecommendationKind::NoData);
        assert!(fixture.cache.get(&user_key(user)).is_none());

        // Data arrives; the next request sees it immediately
        seed_interactions(&fixture);
        let response = fixture.recommender.recommend(user).unwrap();
        assert_eq!(response.kind, RecommendationKind::UserBasedCollaborative);
    }

    #[test]
    fn test_artifact_failure_propagates_as_error() {
        let catalog = Arc::new(MemoryCatalog::new());
        let cache = Arc::new(MemoryCache::new());
        let recommender = CollaborativeRecommender::new(
            catalog.clone() as Arc<dyn CatalogStore>,
            cache as Arc<dyn CacheBackend>,
            Arc::new(ModelSlot::new("/nonexistent/model.mpk")),
            RecommenderConfig::default(),
        );
        catalog
            .put_rating(UserId::new(1), ItemId::new(10), 5)
            .unwrap();

        let result = recommender.recommend(UserId::new(1));
        assert!(matches!(result, Err(Error::ArtifactUnavailable(_))));
    }
}
