//! Item-based collaborative filtering with adjusted cosine similarity.
//!
//! ## Algorithm
//! 1. Subtract each user's mean rating from all of their ratings
//! 2. For every unordered item pair, compute the cosine of the centred
//!    rating vectors restricted to users who rated both items
//! 3. Zero pairs with too few common raters, a zero norm, or a similarity
//!    below the threshold
//! 4. Predict from the user's own rated items, weighted by similarity
//!
//! Pairs are scored in parallel, one rayon task per row, and the symmetric
//! entries are written together afterwards in a single pass.

use crate::error::{PredictError, Result};
use crate::matrix::RatingMatrix;
use crate::traits::{Predictions, Predictor};
use data_loader::{ItemId, RatingTable, UserId};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

/// How the similarity matrix is turned into a prediction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionScheme {
    /// `mean_u + Σ sim·(r − mean_u) / Σ |sim|` over all rated neighbours.
    ///
    /// The divisor sums absolute similarities so negative neighbours cannot
    /// cancel the weights out or flip the sign of the prediction.
    #[default]
    WeightedAverage,
    /// `sim · r` of the single most similar rated neighbour
    NearestNeighbor,
}

/// Fitted state: the similarity matrix and what predict needs per user
struct SimilarityModel {
    matrix: RatingMatrix,
    similarities: DMatrix<f64>,
    user_means: DVector<f64>,
}

pub struct ItemSimilarityPredictor {
    min_values: usize,
    threshold: f64,
    scheme: PredictionScheme,
    model: Option<SimilarityModel>,
}

impl ItemSimilarityPredictor {
    /// Create a new item similarity predictor
    ///
    /// ## Parameters
    /// - `min_values`: minimum number of common raters for a nonzero similarity
    /// - `threshold`: similarities below this value are set to 0
    pub fn new(min_values: usize, threshold: f64) -> Self {
        Self {
            min_values,
            threshold,
            scheme: PredictionScheme::default(),
            model: None,
        }
    }

    /// Configure the prediction scheme (default: weighted average)
    pub fn with_scheme(mut self, scheme: PredictionScheme) -> Self {
        self.scheme = scheme;
        self
    }

    fn model(&self) -> Result<&SimilarityModel> {
        self.model
            .as_ref()
            .ok_or_else(|| PredictError::not_fitted(self.name()))
    }

    fn position(model: &SimilarityModel, item_id: ItemId) -> Result<usize> {
        model
            .matrix
            .item_position(item_id)
            .ok_or(PredictError::UnknownItem { item_id })
    }

    /// Stored similarity between two items.
    ///
    /// Returns 0 for pruned pairs and for an item with itself.
    pub fn similarity(&self, p1: ItemId, p2: ItemId) -> Result<f64> {
        let model = self.model()?;
        let i = Self::position(model, p1)?;
        let j = Self::position(model, p2)?;
        Ok(model.similarities[(i, j)])
    }

    /// The `n` items most similar to `item_id`, strongest first.
    ///
    /// The item itself is never part of the result. Ties keep ascending item id order.
    pub fn similar_items(&self, item_id: ItemId, n: usize) -> Result<Vec<(ItemId, f64)>> {
        let model = self.model()?;
        let i = Self::position(model, item_id)?;
        let items = model.matrix.items();

        let mut neighbours: Vec<(ItemId, f64)> = (0..items.len())
            .filter(|&j| j != i)
            .map(|j| (items[j], model.similarities[(i, j)]))
            .collect();
        neighbours.sort_by(|a, b| b.1.total_cmp(&a.1));
        neighbours.truncate(n);
        Ok(neighbours)
    }

    /// The `n` strongest (item, best partner, similarity) triples.
    ///
    /// Every item contributes its single most similar partner, so a pair can
    /// appear twice, once from each side.
    pub fn most_similar_pairs(&self, n: usize) -> Result<Vec<(ItemId, ItemId, f64)>> {
        let model = self.model()?;
        let items = model.matrix.items();

        let mut pairs: Vec<(ItemId, ItemId, f64)> = (0..items.len())
            .filter_map(|i| {
                (0..items.len())
                    .filter(|&j| j != i)
                    .map(|j| (j, model.similarities[(i, j)]))
                    .fold(None, |best: Option<(usize, f64)>, (j, s)| match best {
                        Some((_, b)) if b >= s => best,
                        _ => Some((j, s)),
                    })
                    .map(|(j, s)| (items[i], items[j], s))
            })
            .collect();
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));
        pairs.truncate(n);
        Ok(pairs)
    }

    /// Adjusted cosine between two centred columns, 0 when undefined
    fn pair_similarity(&self, a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
        let (mut dot, mut norm_a, mut norm_b, mut common) = (0.0, 0.0, 0.0, 0usize);
        let (mut x, mut y) = (0, 0);
        // Both columns are sorted by user row
        while x < a.len() && y < b.len() {
            match a[x].0.cmp(&b[y].0) {
                Ordering::Less => x += 1,
                Ordering::Greater => y += 1,
                Ordering::Equal => {
                    dot += a[x].1 * b[y].1;
                    norm_a += a[x].1 * a[x].1;
                    norm_b += b[y].1 * b[y].1;
                    common += 1;
                    x += 1;
                    y += 1;
                }
            }
        }

        if common == 0 || common < self.min_values {
            return 0.0;
        }
        let denominator = norm_a.sqrt() * norm_b.sqrt();
        if denominator == 0.0 {
            return 0.0;
        }
        let similarity = dot / denominator;
        if similarity < self.threshold {
            0.0
        } else {
            similarity
        }
    }

    fn predict_item(
        &self,
        model: &SimilarityModel,
        target: usize,
        rated: &[(usize, f64)],
        mean: f64,
    ) -> f64 {
        let neighbours = rated.iter().filter(|(col, _)| *col != target);
        match self.scheme {
            PredictionScheme::WeightedAverage => {
                let (num, den) = neighbours.fold((0.0, 0.0), |(num, den), &(col, rating)| {
                    let s = model.similarities[(target, col)];
                    (num + s * (rating - mean), den + s.abs())
                });
                if den > 0.0 { mean + num / den } else { mean }
            }
            PredictionScheme::NearestNeighbor => neighbours
                .map(|&(col, rating)| (model.similarities[(target, col)], rating))
                .filter(|(s, _)| *s > 0.0)
                .fold(None, |best: Option<(f64, f64)>, (s, r)| match best {
                    Some((b, _)) if b >= s => best,
                    _ => Some((s, r)),
                })
                .map(|(s, r)| s * r)
                .unwrap_or(0.0),
        }
    }
}

impl Predictor for ItemSimilarityPredictor {
    fn name(&self) -> &str {
        "ItemSimilarityPredictor"
    }

    #[instrument(skip(self, table), fields(ratings = table.len()))]
    fn fit(&mut self, table: &RatingTable) -> Result<()> {
        let matrix = RatingMatrix::from_table(table);
        let (n_users, n_items) = (matrix.n_users(), matrix.n_items());

        // Per-user mean over that user's rated cells
        let rated_counts = matrix.mask().column_sum();
        let rating_sums = matrix.ratings().column_sum();
        let user_means = DVector::from_fn(n_users, |u, _| {
            if rated_counts[u] > 0.0 {
                rating_sums[u] / rated_counts[u]
            } else {
                0.0
            }
        });

        // Centred, sparse item columns sorted by user row
        let columns: Vec<Vec<(usize, f64)>> = (0..n_items)
            .map(|col| {
                matrix
                    .rated_in_column(col)
                    .into_iter()
                    .map(|(row, rating)| (row, rating - user_means[row]))
                    .collect()
            })
            .collect();

        let this = &*self;
        let columns = &columns;
        let scored: Vec<(usize, usize, f64)> = (0..n_items)
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..n_items)
                    .map(move |j| (i, j, this.pair_similarity(&columns[i], &columns[j])))
            })
            .filter(|&(_, _, s)| s != 0.0)
            .collect();

        let mut similarities = DMatrix::<f64>::zeros(n_items, n_items);
        for &(i, j, s) in &scored {
            similarities[(i, j)] = s;
            similarities[(j, i)] = s;
        }

        info!(
            "Fitted {} items, {} nonzero similarity pairs",
            n_items,
            scored.len()
        );
        self.model = Some(SimilarityModel {
            matrix,
            similarities,
            user_means,
        });
        Ok(())
    }

    fn predict(&self, user_id: UserId) -> Result<Predictions> {
        let model = self.model()?;
        let row = model
            .matrix
            .user_position(user_id)
            .ok_or(PredictError::UnknownUser { user_id })?;
        let rated = model.matrix.rated_in_row(row);
        if rated.is_empty() {
            return Err(PredictError::EmptyUserHistory { user_id });
        }
        let mean = model.user_means[row];

        debug!(
            "Predicting {} items for user {} from {} rated items",
            model.matrix.n_items(),
            user_id,
            rated.len()
        );
        Ok(model
            .matrix
            .items()
            .iter()
            .enumerate()
            .map(|(target, &item)| (item, self.predict_item(model, target, &rated, mean)))
            .collect())
    }
}
