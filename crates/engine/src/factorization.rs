//! Precomputed factorization artifact
//!
//! The offline training job decomposes a snapshot of the interaction
//! matrix into low-rank user/item factor matrices plus per-user centering
//! means, and writes them as a MessagePack artifact. At serving time the
//! artifact is read-only: a prediction for (row, column) is the factor dot
//! product plus the user's mean. Row/column indices come from the live
//! matrix build, so lookups past the training dimensions are per-candidate
//! misses, not request failures.
//!
//! The artifact is loaded at most once per process through a guarded lazy
//! slot. A failed load leaves the slot empty, so the next request retries
//! instead of pinning the failure for the process lifetime.

use crate::similarity::dot_product;
use bookrec_core::{Error, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Low-rank factorization of a training-time interaction matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorizationModel {
    /// Latent dimension k
    components: usize,
    /// Training users (rows of `user_factors`)
    n_users: usize,
    /// Training items (rows of `item_factors`)
    n_items: usize,
    /// Row-major n_users × k
    user_factors: Vec<f32>,
    /// Row-major n_items × k
    item_factors: Vec<f32>,
    /// Per-user rating mean used for centering, length n_users
    user_means: Vec<f32>,
}

impl FactorizationModel {
    /// Assemble a model from its parts, validating dimensions
    pub fn new(
        components: usize,
        user_factors: Vec<Vec<f32>>,
        item_factors: Vec<Vec<f32>>,
        user_means: Vec<f32>,
    ) -> Result<Self> {
        let n_users = user_factors.len();
        let n_items = item_factors.len();
        if user_means.len() != n_users {
            return Err(Error::InvalidInput(format!(
                "{} user means for {} user factor rows",
                user_means.len(),
                n_users
            )));
        }
        if user_factors.iter().any(|row| row.len() != components)
            || item_factors.iter().any(|row| row.len() != components)
        {
            return Err(Error::InvalidInput(format!(
                "factor row length does not match {components} components"
            )));
        }
        Ok(Self {
            components,
            n_users,
            n_items,
            user_factors: user_factors.into_iter().flatten().collect(),
            item_factors: item_factors.into_iter().flatten().collect(),
            user_means,
        })
    }

    /// Load the artifact from disk
    ///
    /// Any failure (missing file, undecodable payload, inconsistent
    /// dimensions) is `ArtifactUnavailable`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::ArtifactUnavailable(format!("read {}: {e}", path.display()))
        })?;
        let model: Self = rmp_serde::from_slice(&bytes).map_err(|e| {
            Error::ArtifactUnavailable(format!("decode {}: {e}", path.display()))
        })?;
        model.validate()?;
        Ok(model)
    }

    /// Serialize the artifact the way the training job writes it
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    fn validate(&self) -> Result<()> {
        let consistent = self.user_factors.len() == self.n_users * self.components
            && self.item_factors.len() == self.n_items * self.components
            && self.user_means.len() == self.n_users;
        if consistent {
            Ok(())
        } else {
            Err(Error::ArtifactUnavailable(
                "inconsistent factor dimensions in artifact".to_string(),
            ))
        }
    }

    /// Latent dimension
    pub fn components(&self) -> usize {
        self.components
    }

    /// Users in the training matrix
    pub fn n_users(&self) -> usize {
        self.n_users
    }

    /// Items in the training matrix
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Predict the (unclipped) score for a user row and item column
    ///
    /// Indices outside the training dimensions return None; the caller
    /// skips that candidate.
    pub fn predict(&self, user_idx: usize, item_idx: usize) -> Option<f32> {
        if user_idx >= self.n_users || item_idx >= self.n_items {
            return None;
        }
        let k = self.components;
        let user_row = &self.user_factors[user_idx * k..(user_idx + 1) * k];
        let item_row = &self.item_factors[item_idx * k..(item_idx + 1) * k];
        Some(dot_product(user_row, item_row) + self.user_means[user_idx])
    }
}

/// Lazy, load-once slot for the factorization artifact
///
/// Concurrent first requests race on a single guarded initialization; a
/// load error is returned to the losing callers too, and the slot stays
/// empty so a later request retries the load.
pub struct ModelSlot {
    path: PathBuf,
    slot: OnceCell<FactorizationModel>,
}

impl ModelSlot {
    /// Create a slot that will load from `path` on first use
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: OnceCell::new(),
        }
    }

    /// Create an already-populated slot (tests, embedded artifacts)
    pub fn preloaded(model: FactorizationModel) -> Self {
        Self {
            path: PathBuf::new(),
            slot: OnceCell::with_value(model),
        }
    }

    /// Get the model, loading it on first call
    pub fn get(&self) -> Result<&FactorizationModel> {
        self.slot.get_or_try_init(|| {
            info!(path = %self.path.display(), "loading factorization artifact");
            FactorizationModel::load(&self.path)
        })
    }
}
