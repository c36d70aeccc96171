//! # Predictors Crate
//!
//! Rating predictors fitted on a [`RatingTable`](data_loader::RatingTable).
//! Every predictor implements [`Predictor`]: `fit` once on the full table,
//! then `predict` a score for every item, per user.
//!
//! ## Predictors
//!
//! - **ItemSimilarityPredictor**: adjusted cosine item-item similarity
//! - **DeviationBasedPredictor**: slope-one average rating deviations
//! - **MatrixFactorizationPredictor**: truncated SVD of the centred rating matrix
//! - **HybridPredictor**: mean of a rescaled baseline, item similarity and slope-one
//! - **RandomPredictor**, **RatingVariancePredictor**, **ViewCountPredictor**: baselines
//!
//! ## Example Usage
//!
//! ```ignore
//! use predictors::{ItemSimilarityPredictor, Predictor};
//!
//! let mut predictor = ItemSimilarityPredictor::new(5, 0.1);
//! predictor.fit(&table)?;
//! for (item, score) in predictor.similar_items(1, 10)? {
//!     println!("{}: {:.3}", item, score);
//! }
//! ```

pub mod config;
pub mod deviation;
pub mod error;
pub mod factorization;
pub mod hybrid;
pub mod item_similarity;
pub mod matrix;
pub mod random;
pub mod traits;
pub mod variance;
pub mod views;

pub use config::{BaselineKind, PredictorConfig, PredictorKind};
pub use deviation::DeviationBasedPredictor;
pub use error::{PredictError, Result};
pub use factorization::{DEFAULT_RANK, FactorizationModel, MatrixFactorizationPredictor};
pub use hybrid::HybridPredictor;
pub use item_similarity::{ItemSimilarityPredictor, PredictionScheme};
pub use matrix::RatingMatrix;
pub use random::RandomPredictor;
pub use traits::{Predictions, Predictor};
pub use variance::RatingVariancePredictor;
pub use views::ViewCountPredictor;

/// Shared fixtures for the unit tests of every predictor
#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use data_loader::{ItemId, RatingRecord, RatingTable, UserId};

    pub fn record(user_id: UserId, item_id: ItemId, rating: f64) -> RatingRecord {
        let timestamp = NaiveDate::from_ymd_opt(2008, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        RatingRecord::new(user_id, item_id, rating, timestamp)
    }

    /// User 1 rated X=5, Y=3; user 2 rated X=2, Y=4, Z=5 (X=10, Y=20, Z=30)
    pub fn two_user_table() -> RatingTable {
        RatingTable::from_records(vec![
            record(1, 10, 5.0),
            record(1, 20, 3.0),
            record(2, 10, 2.0),
            record(2, 20, 4.0),
            record(2, 30, 5.0),
        ])
    }

    /// Five users, each rating all four items 101..=104
    pub fn dense_table() -> RatingTable {
        let rows: [[f64; 4]; 5] = [
            [5.0, 3.0, 4.0, 1.0],
            [4.0, 2.0, 5.0, 2.0],
            [1.0, 5.0, 2.0, 4.0],
            [3.0, 3.0, 1.0, 5.0],
            [2.0, 4.0, 3.0, 3.0],
        ];
        RatingTable::from_records(rows.iter().enumerate().flat_map(|(u, row)| {
            row.iter()
                .enumerate()
                .map(move |(i, &rating)| record(u as UserId + 1, 101 + i as ItemId, rating))
        }))
    }
}
