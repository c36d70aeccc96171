//! Popularity baseline: scores each item by how many users rated it.

use crate::error::{PredictError, Result};
use crate::matrix::RatingMatrix;
use crate::traits::{Predictions, Predictor};
use data_loader::{RatingTable, UserId};

#[derive(Default)]
pub struct ViewCountPredictor {
    scores: Option<Predictions>,
}

impl ViewCountPredictor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Predictor for ViewCountPredictor {
    fn name(&self) -> &str {
        "ViewCountPredictor"
    }

    fn fit(&mut self, table: &RatingTable) -> Result<()> {
        let matrix = RatingMatrix::from_table(table);
        let counts = matrix.mask().row_sum();
        self.scores = Some(
            matrix
                .items()
                .iter()
                .enumerate()
                .map(|(col, &item)| (item, counts[col]))
                .collect(),
        );
        Ok(())
    }

    fn predict(&self, _user_id: UserId) -> Result<Predictions> {
        self.scores
            .clone()
            .ok_or_else(|| PredictError::not_fitted(self.name()))
    }
}
