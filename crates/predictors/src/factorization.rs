//! Low-rank matrix factorization predictor.
//!
//! ## Algorithm
//! 1. Build the dense user×item matrix, unrated cells set to 0
//! 2. Subtract each user's row mean (taken over the whole zero-filled row)
//! 3. Decompose with an SVD and keep the `rank` largest singular triplets
//! 4. Cache `U·Σ·Vᵗ + row_mean` as the prediction matrix
//!
//! Treating unrated cells as zeros before centring is an approximation that
//! is kept on purpose; predictions are served from the cached matrix.

use crate::error::{PredictError, Result};
use crate::matrix::RatingMatrix;
use crate::traits::{Predictions, Predictor};
use data_loader::{ItemId, RatingTable, UserId};
use nalgebra::{DMatrix, DVector, SVD};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Reference rank for MovieLens-sized tables
pub const DEFAULT_RANK: usize = 50;

/// Truncated decomposition plus the cached reconstruction
pub struct FactorizationModel {
    users: HashMap<UserId, usize>,
    items: Vec<ItemId>,
    user_factors: DMatrix<f64>,
    singular_values: DVector<f64>,
    item_factors: DMatrix<f64>,
    user_means: DVector<f64>,
    predictions: DMatrix<f64>,
}

impl FactorizationModel {
    /// Truncated SVD of `ratings` after per-row mean centring
    fn decompose(matrix: &RatingMatrix, rank: usize) -> Result<Self> {
        // nalgebra cannot decompose a matrix with a zero dimension
        if matrix.n_users() == 0 || matrix.n_items() == 0 {
            return Ok(Self::empty(matrix));
        }

        let ratings = matrix.ratings();
        let user_means = ratings.column_mean();

        let mut centered = ratings.clone();
        for (u, mut row) in centered.row_iter_mut().enumerate() {
            row.add_scalar_mut(-user_means[u]);
        }

        let svd = SVD::new(centered, true, true);
        let u = svd
            .u
            .ok_or_else(|| PredictError::Decomposition("SVD failed to compute U".to_string()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| PredictError::Decomposition("SVD failed to compute V^T".to_string()))?;

        // Keep the largest singular values, in descending order
        let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
        order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));
        order.truncate(rank);

        let user_factors = u.select_columns(order.iter());
        let item_factors = v_t.select_rows(order.iter());
        let singular_values =
            DVector::from_iterator(order.len(), order.iter().map(|&i| svd.singular_values[i]));

        let mut predictions =
            &user_factors * DMatrix::from_diagonal(&singular_values) * &item_factors;
        for (u, mut row) in predictions.row_iter_mut().enumerate() {
            row.add_scalar_mut(user_means[u]);
        }

        Ok(Self {
            users: matrix
                .users()
                .iter()
                .enumerate()
                .map(|(row, &user)| (user, row))
                .collect(),
            items: matrix.items().to_vec(),
            user_factors,
            singular_values,
            item_factors,
            user_means,
            predictions,
        })
    }

    /// Zero-rank model with correctly shaped, empty factors
    fn empty(matrix: &RatingMatrix) -> Self {
        let (n_users, n_items) = (matrix.n_users(), matrix.n_items());
        Self {
            users: matrix
                .users()
                .iter()
                .enumerate()
                .map(|(row, &user)| (user, row))
                .collect(),
            items: matrix.items().to_vec(),
            user_factors: DMatrix::zeros(n_users, 0),
            singular_values: DVector::zeros(0),
            item_factors: DMatrix::zeros(0, n_items),
            user_means: DVector::zeros(n_users),
            predictions: DMatrix::zeros(n_users, n_items),
        }
    }

    /// Reconstructed rating matrix, users × items
    pub fn predictions(&self) -> &DMatrix<f64> {
        &self.predictions
    }
}

pub struct MatrixFactorizationPredictor {
    rank: usize,
    model: Option<FactorizationModel>,
}

impl MatrixFactorizationPredictor {
    /// Create a predictor keeping `rank` latent factors
    pub fn new(rank: usize) -> Result<Self> {
        if rank == 0 {
            return Err(PredictError::InvalidConfig(
                "factorization rank must be at least 1".to_string(),
            ));
        }
        Ok(Self { rank, model: None })
    }

    pub fn model(&self) -> Result<&FactorizationModel> {
        self.model
            .as_ref()
            .ok_or_else(|| PredictError::not_fitted(self.name()))
    }

    /// Rank actually used by the fitted model, or the configured rank before fit
    pub fn rank(&self) -> usize {
        self.model
            .as_ref()
            .map(|m| m.singular_values.len())
            .unwrap_or(self.rank)
    }

    /// U: users × rank
    pub fn user_factors(&self) -> Result<&DMatrix<f64>> {
        Ok(&self.model()?.user_factors)
    }

    /// Σ: singular values, largest first
    pub fn singular_values(&self) -> Result<&DVector<f64>> {
        Ok(&self.model()?.singular_values)
    }

    /// Vᵗ: rank × items
    pub fn item_factors(&self) -> Result<&DMatrix<f64>> {
        Ok(&self.model()?.item_factors)
    }

    /// Row means subtracted before the decomposition
    pub fn user_means(&self) -> Result<&DVector<f64>> {
        Ok(&self.model()?.user_means)
    }
}

impl Default for MatrixFactorizationPredictor {
    fn default() -> Self {
        Self {
            rank: DEFAULT_RANK,
            model: None,
        }
    }
}

impl Predictor for MatrixFactorizationPredictor {
    fn name(&self) -> &str {
        "MatrixFactorizationPredictor"
    }

    #[instrument(skip(self, table), fields(ratings = table.len(), rank = self.rank))]
    fn fit(&mut self, table: &RatingTable) -> Result<()> {
        let matrix = RatingMatrix::from_table(table);
        let max_rank = matrix.n_users().min(matrix.n_items()).saturating_sub(1);
        let rank = if self.rank > max_rank {
            warn!(
                "Rank {} too large for a {}x{} matrix, using {}",
                self.rank,
                matrix.n_users(),
                matrix.n_items(),
                max_rank
            );
            max_rank
        } else {
            self.rank
        };

        let model = FactorizationModel::decompose(&matrix, rank)?;
        info!(
            "Factorized {}x{} rating matrix at rank {}",
            matrix.n_users(),
            matrix.n_items(),
            rank
        );
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, user_id: UserId) -> Result<Predictions> {
        let model = self.model()?;
        let row = *model
            .users
            .get(&user_id)
            .ok_or(PredictError::UnknownUser { user_id })?;

        Ok(model
            .items
            .iter()
            .enumerate()
            .map(|(col, &item)| (item, model.predictions[(row, col)]))
            .collect())
    }
}
