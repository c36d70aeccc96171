//! Rating-variance ("controversial items") predictor.
//!
//! Scores each item by the sample standard deviation of its ratings. Items
//! with `min_ratings` ratings or fewer score 0, as do items with a single
//! rating, for which the sample deviation is undefined. The score does not
//! depend on the user.

use crate::error::{PredictError, Result};
use crate::matrix::RatingMatrix;
use crate::traits::{Predictions, Predictor};
use data_loader::{RatingTable, UserId};
use rayon::prelude::*;
use tracing::{debug, instrument};

pub struct RatingVariancePredictor {
    min_ratings: usize,
    scores: Option<Predictions>,
}

impl RatingVariancePredictor {
    /// Items need more than `min_ratings` ratings to get a nonzero score
    pub fn new(min_ratings: usize) -> Self {
        Self {
            min_ratings,
            scores: None,
        }
    }
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}

impl Predictor for RatingVariancePredictor {
    fn name(&self) -> &str {
        "RatingVariancePredictor"
    }

    #[instrument(skip(self, table), fields(ratings = table.len()))]
    fn fit(&mut self, table: &RatingTable) -> Result<()> {
        let matrix = RatingMatrix::from_table(table);

        let scores: Predictions = (0..matrix.n_items())
            .into_par_iter()
            .map(|col| {
                let values: Vec<f64> = matrix
                    .rated_in_column(col)
                    .into_iter()
                    .map(|(_, rating)| rating)
                    .collect();
                let score = if values.len() > self.min_ratings {
                    sample_std_dev(&values)
                } else {
                    0.0
                };
                (matrix.items()[col], score)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        debug!(
            "{} of {} items have a rating spread",
            scores.values().filter(|&&s| s > 0.0).count(),
            scores.len()
        );
        self.scores = Some(scores);
        Ok(())
    }

    fn predict(&self, _user_id: UserId) -> Result<Predictions> {
        self.scores
            .clone()
            .ok_or_else(|| PredictError::not_fitted(self.name()))
    }
}
