//! Slope-one predictor built on average pairwise rating deviations.
//!
//! ## Algorithm
//! `dev(i, j)` is the mean of `r_ui − r_uj` over users who rated both items.
//! With R the zero-filled rating matrix and M its presence mask:
//! - `A = Rᵀ·M` gives `A_ij = Σ_u r_ui` over users who rated j
//! - `C = Mᵀ·M` counts co-raters
//! - `dev(i, j) = (A_ij − A_ji) / C_ij`, 0 without co-raters
//!
//! A prediction for item j averages `dev(j, r) + r_ur` over the user's rated
//! items r, which is one matrix-vector product per user.

use crate::error::{PredictError, Result};
use crate::matrix::RatingMatrix;
use crate::traits::{Predictions, Predictor};
use data_loader::{ItemId, RatingTable, UserId};
use nalgebra::DMatrix;
use tracing::{debug, info, instrument};

struct DeviationModel {
    matrix: RatingMatrix,
    deviations: DMatrix<f64>,
    co_raters: DMatrix<f64>,
}

#[derive(Default)]
pub struct DeviationBasedPredictor {
    model: Option<DeviationModel>,
}

impl DeviationBasedPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    fn model(&self) -> Result<&DeviationModel> {
        self.model
            .as_ref()
            .ok_or_else(|| PredictError::not_fitted(self.name()))
    }

    fn positions(model: &DeviationModel, i: ItemId, j: ItemId) -> Result<(usize, usize)> {
        let pos = |item_id| {
            model
                .matrix
                .item_position(item_id)
                .ok_or(PredictError::UnknownItem { item_id })
        };
        Ok((pos(i)?, pos(j)?))
    }

    /// Average rating difference `r_i − r_j` over users who rated both
    pub fn deviation(&self, i: ItemId, j: ItemId) -> Result<f64> {
        let model = self.model()?;
        let (a, b) = Self::positions(model, i, j)?;
        Ok(model.deviations[(a, b)])
    }

    /// Number of users who rated both items
    pub fn co_raters(&self, i: ItemId, j: ItemId) -> Result<usize> {
        let model = self.model()?;
        let (a, b) = Self::positions(model, i, j)?;
        Ok(model.co_raters[(a, b)] as usize)
    }
}

impl Predictor for DeviationBasedPredictor {
    fn name(&self) -> &str {
        "DeviationBasedPredictor"
    }

    #[instrument(skip(self, table), fields(ratings = table.len()))]
    fn fit(&mut self, table: &RatingTable) -> Result<()> {
        let matrix = RatingMatrix::from_table(table);
        let n_items = matrix.n_items();

        let sums = matrix.ratings().transpose() * matrix.mask();
        let co_raters = matrix.mask().transpose() * matrix.mask();

        let mut deviations = DMatrix::<f64>::zeros(n_items, n_items);
        let mut pairs = 0usize;
        for i in 0..n_items {
            for j in (i + 1)..n_items {
                let count = co_raters[(i, j)];
                if count == 0.0 {
                    continue;
                }
                let dev = (sums[(i, j)] - sums[(j, i)]) / count;
                deviations[(i, j)] = dev;
                deviations[(j, i)] = -dev;
                pairs += 1;
            }
        }

        info!("Fitted {} items, {} co-rated pairs", n_items, pairs);
        self.model = Some(DeviationModel {
            matrix,
            deviations,
            co_raters,
        });
        Ok(())
    }

    fn predict(&self, user_id: UserId) -> Result<Predictions> {
        let model = self.model()?;
        let row = model
            .matrix
            .user_position(user_id)
            .ok_or(PredictError::UnknownUser { user_id })?;

        let rated_mask = model.matrix.mask().row(row).transpose();
        let rated = rated_mask.sum();
        if rated == 0.0 {
            return Err(PredictError::EmptyUserHistory { user_id });
        }
        let rating_sum = model.matrix.ratings().row(row).sum();

        // Σ_r dev(j, r) over the user's rated items, for every j
        let deviation_sums = &model.deviations * rated_mask;
        debug!("Predicting {} items for user {}", deviation_sums.len(), user_id);

        Ok(model
            .matrix
            .items()
            .iter()
            .enumerate()
            .map(|(j, &item)| (item, (deviation_sums[j] + rating_sum) / rated))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{dense_table, two_user_table};

    const X: ItemId = 10;
    const Y: ItemId = 20;
    const Z: ItemId = 30;

    fn fitted() -> DeviationBasedPredictor {
        let mut predictor = DeviationBasedPredictor::new();
        predictor.fit(&two_user_table()).unwrap();
        predictor
    }

    #[test]
    fn test_hand_computed_deviations() {
        let predictor = fitted();

        // A: 5 - 3 = 2, B: 2 - 4 = -2 -> mean 0
        assert_eq!(predictor.deviation(X, Y).unwrap(), 0.0);
        assert_eq!(predictor.co_raters(X, Y).unwrap(), 2);
        // Only B rated Z: 2 - 5 and 4 - 5
        assert_eq!(predictor.deviation(X, Z).unwrap(), -3.0);
        assert_eq!(predictor.deviation(Z, X).unwrap(), 3.0);
        assert_eq!(predictor.deviation(Y, Z).unwrap(), -1.0);
        assert_eq!(predictor.co_raters(Y, Z).unwrap(), 1);
    }

    #[test]
    fn test_table_is_antisymmetric() {
        let table = dense_table();
        let mut predictor = DeviationBasedPredictor::new();
        predictor.fit(&table).unwrap();

        let items = table.item_ids();
        for &i in &items {
            assert_eq!(predictor.deviation(i, i).unwrap(), 0.0);
            for &j in &items {
                assert_eq!(
                    predictor.deviation(i, j).unwrap(),
                    -predictor.deviation(j, i).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_slope_one_prediction() {
        let predictions = fitted().predict(1).unwrap();

        // A rated X=5, Y=3
        // X: ((0 + 5) + (dev(X,Y) + 3)) / 2 = 4
        // Z: ((dev(Z,X) + 5) + (dev(Z,Y) + 3)) / 2 = ((3 + 5) + (1 + 3)) / 2 = 6
        assert_eq!(predictions[&X], 4.0);
        assert_eq!(predictions[&Y], 4.0);
        assert_eq!(predictions[&Z], 6.0);
    }

    #[test]
    fn test_no_co_raters_gives_zero_deviation() {
        let table = RatingTable::from_records(vec![
            crate::tests::record(1, 1, 4.0),
            crate::tests::record(2, 2, 2.0),
        ]);
        let mut predictor = DeviationBasedPredictor::new();
        predictor.fit(&table).unwrap();

        assert_eq!(predictor.deviation(1, 2).unwrap(), 0.0);
        assert_eq!(predictor.co_raters(1, 2).unwrap(), 0);
    }

    #[test]
    fn test_unknown_user() {
        assert_eq!(
            fitted().predict(77),
            Err(PredictError::UnknownUser { user_id: 77 })
        );
    }

    #[test]
    fn test_unknown_item() {
        assert_eq!(
            fitted().deviation(X, 404),
            Err(PredictError::UnknownItem { item_id: 404 })
        );
    }
}
