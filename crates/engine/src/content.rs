//! Content-based recommender
//!
//! Profiles a session from its recently viewed items: the last five
//! distinct ids contribute their embeddings, the profile is their
//! element-wise mean, and candidates sharing a genre with any viewed item
//! are ranked by cosine similarity against it.
//!
//! Responses are cached under a permutation-invariant digest of the viewed
//! window, so re-viewing the same five items in any order replays the same
//! payload until the TTL or an invalidation sweep clears it.

use crate::response::{ContentResponse, ScoredItem};
use crate::similarity::{cosine_similarity, mean_profile};
use crate::vectors::VectorStore;
use bookrec_cache::{content_request_key, CacheBackend};
use bookrec_core::{GenreId, ItemId, RecommenderConfig, Result};
use bookrec_store::CatalogStore;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Deduplicate while preserving order, then keep the trailing `window` ids
///
/// First occurrence fixes an id's position; the tail is kept because the
/// most recent views should dominate the profile.
fn profile_window(viewed: &[ItemId], window: usize) -> SmallVec<[ItemId; 5]> {
    let mut distinct: Vec<ItemId> = Vec::with_capacity(viewed.len().min(window * 2));
    for &id in viewed {
        if !distinct.contains(&id) {
            distinct.push(id);
        }
    }
    let start = distinct.len().saturating_sub(window);
    SmallVec::from_slice(&distinct[start..])
}

/// Recommends catalog items similar to a session's viewing history
pub struct ContentRecommender {
    store: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheBackend>,
    vectors: VectorStore,
    config: RecommenderConfig,
}

impl ContentRecommender {
    /// Create a content recommender over the given collaborators
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<dyn CacheBackend>,
        config: RecommenderConfig,
    ) -> Self {
        let vectors = VectorStore::new(Arc::clone(&store), Arc::clone(&cache), config.vector_ttl);
        Self {
            store,
            cache,
            vectors,
            config,
        }
    }

    /// The underlying vector store (shared with invalidation paths)
    pub fn vectors(&self) -> &VectorStore {
        &self.vectors
    }

    /// Recommend items for a sequence of recently viewed item ids
    ///
    /// Duplicates in the input are allowed; an empty input or a window with
    /// no stored embeddings yields an empty response, never an error.
    pub fn recommend(&self, viewed: &[ItemId]) -> Result<ContentResponse> {
        if viewed.is_empty() {
            return Ok(ContentResponse::empty());
        }

        let window = profile_window(viewed, self.config.profile_window);
        let key = content_request_key(&window);

        if let Some(bytes) = self.cache.get(&key) {
            match ContentResponse::from_bytes(&bytes) {
                Ok(response) => {
                    debug!(window = window.len(), "content response cache hit");
                    return Ok(response);
                }
                Err(err) => {
                    warn!(%err, "evicting corrupt cached content response");
                    self.cache.delete(&key);
                }
            }
        }

        let profile_vectors = self.vectors.get_many(&window)?;
        let based_on: Vec<ItemId> = window
            .iter()
            .copied()
            .filter(|id| profile_vectors.contains_key(id))
            .collect();
        if based_on.is_empty() {
            return Ok(ContentResponse::empty());
        }

        let contributing: Vec<Vec<f32>> = based_on
            .iter()
            .map(|id| profile_vectors[id].clone())
            .collect();
        let profile = match mean_profile(&contributing) {
            Some(profile) => profile,
            None => return Ok(ContentResponse::empty()),
        };

        let candidates = self.candidates(&window)?;
        let candidate_ids: Vec<ItemId> = candidates.iter().map(|item| item.id).collect();
        let candidate_vectors = self.vectors.get_many(&candidate_ids)?;

        let mut scored = Vec::with_capacity(candidate_ids.len());
        for id in &candidate_ids {
            let Some(vector) = candidate_vectors.get(id) else {
                debug!(item = %id, "candidate skipped: no vector");
                continue;
            };
            let similarity = cosine_similarity(&profile, vector);
            if !similarity.is_finite() {
                warn!(item = %id, "candidate skipped: similarity not finite");
                continue;
            }
            scored.push(ScoredItem {
                item: *id,
                score: similarity,
            });
        }

        let total_candidates = scored.len();
        // Stable sort: equal scores keep retrieval order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(self.config.top_n);

        let response = ContentResponse {
            recommendations: scored,
            based_on,
            total_candidates,
        };
        self.cache
            .set(&key, response.to_bytes()?, self.config.response_ttl);
        Ok(response)
    }

    /// Candidate selection: genre-pruned with a cap, falling back to the
    /// whole available catalog (smaller cap) when no genre overlap exists
    fn candidates(
        &self,
        window: &[ItemId],
    ) -> Result<Vec<bookrec_core::ItemSummary>> {
        let viewed_summaries = self.store.item_summaries(window)?;
        let mut genres: Vec<GenreId> = viewed_summaries
            .iter()
            .flat_map(|item| item.genres.iter().copied())
            .collect();
        genres.sort_unstable();
        genres.dedup();

        if !genres.is_empty() {
            let mut matches = self.store.available_items(window, Some(&genres))?;
            if !matches.is_empty() {
                matches.truncate(self.config.genre_candidate_cap);
                return Ok(matches);
            }
        }

        let mut fallback = self.store.available_items(window, None)?;
        fallback.truncate(self.config.fallback_candidate_cap);
        Ok(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectors::encode_vector;
    use bookrec_cache::MemoryCache;
    use bookrec_core::ItemSummary;
    use bookrec_store::MemoryCatalog;

    fn ids(raw: &[u64]) -> Vec<ItemId> {
        raw.iter().copied().map(ItemId::new).collect()
    }

    #[test]
    fn test_profile_window_dedup_keeps_first_occurrence_order() {
        let window = profile_window(&ids(&[1, 2, 1, 3]), 5);
        assert_eq!(window.as_slice(), ids(&[1, 2, 3]).as_slice());
    }

    #[test]
    fn test_profile_window_keeps_trailing_distinct() {
        let window = profile_window(&ids(&[1, 2, 3, 4, 5, 6, 7]), 5);
        assert_eq!(window.as_slice(), ids(&[3, 4, 5, 6, 7]).as_slice());
    }

    struct Fixture {
        catalog: Arc<MemoryCatalog>,
        cache: Arc<MemoryCache>,
        recommender: ContentRecommender,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(MemoryCatalog::new());
        let cache = Arc::new(MemoryCache::new());
        let recommender = ContentRecommender::new(
            catalog.clone() as Arc<dyn CatalogStore>,
            cache.clone() as Arc<dyn CacheBackend>,
            RecommenderConfig::default(),
        );
        Fixture {
            catalog,
            cache,
            recommender,
        }
    }

    fn seed_item(fixture: &Fixture, id: u64, genres: &[u64], vector: &[f32]) {
        fixture.catalog.upsert_item(ItemSummary::new(
            ItemId::new(id),
            genres.iter().copied().map(GenreId::new).collect(),
            true,
        ));
        fixture
            .catalog
            .put_vector(ItemId::new(id), encode_vector(vector).unwrap());
    }

    #[test]
    fn test_empty_input_empty_response() {
        let fixture = fixture();
        let response = fixture.recommender.recommend(&[]).unwrap();
        assert_eq!(response, ContentResponse::empty());
    }

    #[test]
    fn test_no_vectors_for_viewed_items_empty_response() {
        let fixture = fixture();
        fixture.catalog.upsert_item(ItemSummary::new(
            ItemId::new(1),
            vec![GenreId::new(1)],
            true,
        ));
        let response = fixture.recommender.recommend(&ids(&[1])).unwrap();
        assert!(response.recommendations.is_empty());
        assert!(response.based_on.is_empty());
    }

    #[test]
    fn test_recommends_similar_items_excluding_viewed() {
        let fixture = fixture();
        seed_item(&fixture, 1, &[10], &[1.0, 0.0]);
        seed_item(&fixture, 2, &[10], &[0.9, 0.1]);
        seed_item(&fixture, 3, &[10], &[0.0, 1.0]);

        let response = fixture.recommender.recommend(&ids(&[1])).unwrap();
        assert_eq!(response.based_on, ids(&[1]));
        assert_eq!(response.total_candidates, 2);
        // Item 2 is closer to the profile than item 3
        assert_eq!(response.recommendations[0].item, ItemId::new(2));
        assert!(response
            .recommendations
            .iter()
            .all(|r| r.item != ItemId::new(1)));
    }

    #[test]
    fn test_genre_pruning_restricts_candidates() {
        let fixture = fixture();
        seed_item(&fixture, 1, &[10], &[1.0, 0.0]);
        // Shares genre 10
        seed_item(&fixture, 2, &[10], &[0.8, 0.2]);
        // Different genre entirely; must not appear
        seed_item(&fixture, 3, &[20], &[1.0, 0.0]);

        let response = fixture.recommender.recommend(&ids(&[1])).unwrap();
        let recommended: Vec<ItemId> =
            response.recommendations.iter().map(|r| r.item).collect();
        assert!(recommended.contains(&ItemId::new(2)));
        assert!(!recommended.contains(&ItemId::new(3)));
    }

    #[test]
    fn test_fallback_when_no_genre_overlap() {
        let fixture = fixture();
        seed_item(&fixture, 1, &[10], &[1.0, 0.0]);
        // No item shares genre 10
        seed_item(&fixture, 2, &[20], &[0.9, 0.1]);
        seed_item(&fixture, 3, &[30], &[0.5, 0.5]);

        let response = fixture.recommender.recommend(&ids(&[1])).unwrap();
        assert_eq!(response.total_candidates, 2);
    }

    #[test]
    fn test_unavailable_items_never_recommended() {
        let fixture = fixture();
        seed_item(&fixture, 1, &[10], &[1.0, 0.0]);
        seed_item(&fixture, 2, &[10], &[1.0, 0.0]);
        fixture.catalog.set_item_available(ItemId::new(2), false);

        let response = fixture.recommender.recommend(&ids(&[1])).unwrap();
        assert!(response.recommendations.is_empty());
    }

    #[test]
    fn test_at_most_top_n_recommendations() {
        let fixture = fixture();
        seed_item(&fixture, 1, &[10], &[1.0, 0.0]);
        for id in 2..20 {
            seed_item(&fixture, id, &[10], &[1.0, id as f32 / 100.0]);
        }

        let response = fixture.recommender.recommend(&ids(&[1])).unwrap();
        assert_eq!(response.recommendations.len(), 8);
        assert_eq!(response.total_candidates, 18);
        // Scores arrive ranked
        for pair in response.recommendations.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_permuted_history_hits_same_cache_entry() {
        let fixture = fixture();
        for id in 1..=3 {
            seed_item(&fixture, id, &[10], &[id as f32, 1.0]);
        }
        seed_item(&fixture, 4, &[10], &[1.0, 1.0]);

        let first = fixture.recommender.recommend(&ids(&[1, 2, 3])).unwrap();
        assert_eq!(fixture.cache.delete_prefix("reco:content:"), 1);
        // Re-prime, then request a permutation: same entry, same payload
        let _ = fixture.recommender.recommend(&ids(&[1, 2, 3])).unwrap();
        let permuted = fixture.recommender.recommend(&ids(&[3, 1, 2])).unwrap();
        assert_eq!(permuted, first);
    }

    #[test]
    fn test_cached_response_replayed_until_evicted() {
        let fixture = fixture();
        seed_item(&fixture, 1, &[10], &[1.0, 0.0]);
        seed_item(&fixture, 2, &[10], &[0.9, 0.1]);

        let first = fixture.recommender.recommend(&ids(&[1])).unwrap();

        // Catalog changes, but the cached payload is replayed as-is
        seed_item(&fixture, 3, &[10], &[1.0, 0.0]);
        let replay = fixture.recommender.recommend(&ids(&[1])).unwrap();
        assert_eq!(replay, first);

        // After a namespace sweep the new item is visible
        fixture.cache.delete_prefix("reco:content:");
        let fresh = fixture.recommender.recommend(&ids(&[1])).unwrap();
        assert_eq!(fresh.total_candidates, 2);
    }
}
