//! Deterministic cache-key derivation
//!
//! Four namespaces, one derivation rule each:
//! - `vector:<item_id>`: per-item embedding entries
//! - `reco:content:<digest>`: content-based responses, keyed by a sha-256
//!   digest of the sorted viewed-item ids so any permutation of the same
//!   session hits the same entry
//! - `reco:user:<user_id>`: collaborative responses
//! - `matrix:<fingerprint>`: interaction-matrix builds, keyed by an xxh3
//!   fingerprint of the live data-volume counts; when either count moves,
//!   the key moves, forcing a rebuild with no explicit eviction needed

use bookrec_core::{ItemId, UserId};
use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::xxh3_64;

/// Namespace prefix for per-item embedding entries
pub const VECTOR_PREFIX: &str = "vector:";
/// Namespace prefix for content-based recommendation responses
pub const CONTENT_PREFIX: &str = "reco:content:";
/// Namespace prefix for per-user collaborative responses
pub const USER_PREFIX: &str = "reco:user:";
/// Namespace prefix for cached interaction-matrix builds
pub const MATRIX_PREFIX: &str = "matrix:";

/// Key for one item's cached embedding
pub fn vector_key(item: ItemId) -> String {
    format!("{VECTOR_PREFIX}{item}")
}

/// Key for a content-based request signature
///
/// Order-independent: the ids are sorted before hashing, so `[3, 1, 2]`
/// and `[1, 2, 3]` derive the same key.
pub fn content_request_key(viewed: &[ItemId]) -> String {
    let mut sorted: Vec<ItemId> = viewed.to_vec();
    sorted.sort_unstable();

    let joined = sorted
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("_");

    let digest = Sha256::digest(joined.as_bytes());
    let mut hex = String::with_capacity(CONTENT_PREFIX.len() + 64);
    hex.push_str(CONTENT_PREFIX);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Key for one user's cached collaborative response
pub fn user_key(user: UserId) -> String {
    format!("{USER_PREFIX}{user}")
}

/// Key for the interaction matrix at the current data volume
///
/// The fingerprint is a cheap non-cryptographic hash over the two aggregate
/// counts; it only has to change whenever either count changes.
pub fn matrix_key(rating_count: u64, purchase_line_count: u64) -> String {
    let fingerprint = xxh3_64(format!("{rating_count}_{purchase_line_count}").as_bytes());
    format!("{MATRIX_PREFIX}{fingerprint:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vector_key_format() {
        assert_eq!(vector_key(ItemId::new(12)), "vector:12");
    }

    #[test]
    fn test_user_key_format() {
        assert_eq!(user_key(UserId::new(7)), "reco:user:7");
    }

    #[test]
    fn test_content_key_permutation_invariant() {
        let a = content_request_key(&[ItemId::new(3), ItemId::new(1), ItemId::new(2)]);
        let b = content_request_key(&[ItemId::new(1), ItemId::new(2), ItemId::new(3)]);
        assert_eq!(a, b);
        assert!(a.starts_with(CONTENT_PREFIX));
    }

    #[test]
    fn test_content_key_distinguishes_sets() {
        let a = content_request_key(&[ItemId::new(1), ItemId::new(2)]);
        let b = content_request_key(&[ItemId::new(1), ItemId::new(3)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_matrix_key_changes_with_either_count() {
        let base = matrix_key(10, 20);
        assert_ne!(base, matrix_key(11, 20));
        assert_ne!(base, matrix_key(10, 21));
        assert_eq!(base, matrix_key(10, 20));
    }

    #[test]
    fn test_matrix_key_counts_not_interchangeable() {
        // (10, 20) and (20, 10) are different datasets
        assert_ne!(matrix_key(10, 20), matrix_key(20, 10));
    }

    proptest! {
        #[test]
        fn prop_content_key_invariant_under_shuffle(
            ids in proptest::collection::vec(0u64..1000, 1..8),
            seed in 0usize..100,
        ) {
            let viewed: Vec<ItemId> = ids.iter().copied().map(ItemId::new).collect();
            let mut shuffled = viewed.clone();
            // Deterministic rotation stands in for a full shuffle
            let len = shuffled.len();
            shuffled.rotate_left(seed % len);
            prop_assert_eq!(
                content_request_key(&viewed),
                content_request_key(&shuffled)
            );
        }
    }
}
