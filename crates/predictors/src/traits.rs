//! Core trait shared by every rating predictor.
//!
//! A predictor is fitted once on a complete `RatingTable` and then queried
//! per user. The recommender and the hybrid predictor hold predictors as
//! `Box<dyn Predictor>`, so any variant can be plugged in.

use crate::error::Result;
use data_loader::{ItemId, RatingTable, UserId};
use std::collections::BTreeMap;

/// Predicted score per item.
///
/// A `BTreeMap` iterates in ascending item id order, which gives every
/// downstream ranking a reproducible tie order.
pub type Predictions = BTreeMap<ItemId, f64>;

/// Core trait for rating predictors.
///
/// ## Design Note
/// - `Send + Sync` lets `evaluate` query one fitted predictor from many threads
/// - `fit` takes `&mut self` and rebuilds all internal tables
/// - `predict` takes `&self` and never mutates state
pub trait Predictor: Send + Sync {
    /// Returns the name of this predictor (for logging/debugging)
    fn name(&self) -> &str;

    /// Build internal tables from the rating table.
    fn fit(&mut self, table: &RatingTable) -> Result<()>;

    /// Predict a score for every item known to the fitted model.
    ///
    /// # Returns
    /// * `Ok(Predictions)` - one score per item
    /// * `Err(UnknownUser)` - predictors that need the user's ratings report
    ///   a user missing from the fitted table
    /// * `Err(EmptyUserHistory)` - predictors that need the user's ratings
    ///   report a user without any
    fn predict(&self, user_id: UserId) -> Result<Predictions>;
}
