//! Public surface of the recommendation engine
//!
//! `Recommender` wires the store, the cache, the configuration, and the
//! factorization slot into the two recommenders, and exposes the
//! operations the request layer calls. It is `Send + Sync`; one instance
//! serves all request workers, which coordinate only through the cache.

use crate::collaborative::CollaborativeRecommender;
use crate::content::ContentRecommender;
use crate::factorization::ModelSlot;
use crate::invalidate::InvalidationHooks;
use crate::response::{ActivityStats, CollaborativeResponse, ContentResponse, ModelInfo};
use crate::vectors::VectorStore;
use bookrec_cache::{user_key, CacheBackend, MATRIX_PREFIX};
use bookrec_core::{Error, ItemId, RecommenderConfig, Result, UserId};
use bookrec_store::CatalogStore;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

/// The recommendation engine facade
pub struct Recommender {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheBackend>,
    config: RecommenderConfig,
    model: Arc<ModelSlot>,
    content: ContentRecommender,
    collaborative: CollaborativeRecommender,
}

impl Recommender {
    /// Assemble a recommender from its collaborators
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheBackend>,
        model: ModelSlot,
        config: RecommenderConfig,
    ) -> Self {
        let model = Arc::new(model);
        let content =
            ContentRecommender::new(Arc::clone(&store), Arc::clone(&cache), config.clone());
        let collaborative = CollaborativeRecommender::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&model),
            config.clone(),
        );
        Self {
            store,
            cache,
            config,
            model,
            content,
            collaborative,
        }
    }

    /// Convenience constructor: default config, artifact loaded lazily
    /// from `artifact_path` on the first collaborative request
    pub fn with_artifact(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheBackend>,
        artifact_path: impl AsRef<Path>,
    ) -> Self {
        Self::new(
            store,
            cache,
            ModelSlot::new(artifact_path.as_ref()),
            RecommenderConfig::default(),
        )
    }

    /// Content-based recommendations for a viewing history
    pub fn recommend_by_viewed(&self, viewed: &[ItemId]) -> Result<ContentResponse> {
        self.content.recommend(viewed)
    }

    /// Collaborative recommendations for an authenticated user
    ///
    /// Never fails: hard errors become an `Error`-kind response with an
    /// empty list. Error responses are not cached, so the next request
    /// retries from scratch.
    pub fn recommend_for_user(&self, user: UserId) -> CollaborativeResponse {
        match self.collaborative.recommend(user) {
            Ok(response) => response,
            Err(err) => {
                error!(%user, %err, "collaborative recommendation failed");
                CollaborativeResponse::error(err.to_string())
            }
        }
    }

    /// Acknowledge a product view
    ///
    /// Validates that the item exists and is available; the view history
    /// itself is owned by the caller (session/client side).
    pub fn track_view(&self, item: ItemId) -> Result<()> {
        if self.store.item_exists_available(item)? {
            Ok(())
        } else {
            Err(Error::ItemNotFound(item))
        }
    }

    /// Activity summary backing the "why these recommendations" view
    pub fn user_activity(&self, user: UserId) -> Result<ActivityStats> {
        if !self.store.user_exists(user)? {
            return Err(Error::InvalidInput(format!("unknown user {user}")));
        }

        let ratings = self.store.ratings()?;
        let mut rated: FxHashSet<ItemId> = FxHashSet::default();
        let mut score_sum = 0u32;
        let mut ratings_count = 0usize;
        for rating in ratings.iter().filter(|r| r.user == user) {
            rated.insert(rating.item);
            score_sum += u32::from(rating.score);
            ratings_count += 1;
        }
        let average_rating = if ratings_count == 0 {
            0.0
        } else {
            let mean = score_sum as f32 / ratings_count as f32;
            (mean * 100.0).round() / 100.0
        };

        let purchased: FxHashSet<ItemId> = self
            .store
            .completed_purchase_lines()?
            .into_iter()
            .filter(|line| line.user == user)
            .map(|line| line.item)
            .collect();
        let purchases_without_rating = purchased.difference(&rated).count();

        Ok(ActivityStats {
            ratings_count,
            average_rating,
            purchases_count: purchased.len(),
            purchases_without_rating,
            total_activity: ratings_count + purchases_without_rating,
        })
    }

    /// Drop a user's cached response and force a matrix rebuild
    pub fn refresh_user(&self, user: UserId) {
        self.cache.delete(&user_key(user));
        let swept = self.cache.delete_prefix(MATRIX_PREFIX);
        debug!(%user, swept, "user recommendations refreshed");
    }

    /// Description of the loaded factorization artifact
    pub fn model_info(&self) -> Result<ModelInfo> {
        let model = self.model.get()?;
        Ok(ModelInfo {
            components: model.components(),
            trained_users: model.n_users(),
            trained_items: model.n_items(),
            implicit_strength: self.config.implicit_strength,
            rating_min: self.config.rating_min,
            rating_max: self.config.rating_max,
        })
    }

    /// Write-path hooks for the persistence layer
    pub fn hooks(&self) -> InvalidationHooks {
        InvalidationHooks::new(Arc::clone(&self.cache))
    }

    /// The cache-backed vector store
    pub fn vectors(&self) -> &VectorStore {
        self.content.vectors()
    }

    /// The active configuration
    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }
}
