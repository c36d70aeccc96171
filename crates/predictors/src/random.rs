//! Random baseline predictor.
//!
//! Scores every item with a uniformly drawn whole number in `[min, max]`.
//! The generator is seeded from `(seed, user_id)`, so `predict` is
//! reproducible and does not need mutable state.

use crate::error::{PredictError, Result};
use crate::traits::{Predictions, Predictor};
use data_loader::{ItemId, RatingTable, UserId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

pub struct RandomPredictor {
    min: u32,
    max: u32,
    seed: u64,
    items: Option<Vec<ItemId>>,
}

impl RandomPredictor {
    /// Create a predictor drawing scores from `min..=max`
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(PredictError::InvalidConfig(format!(
                "random score range is empty: {}..={}",
                min, max
            )));
        }
        Ok(Self {
            min,
            max,
            seed: 0,
            items: None,
        })
    }

    /// Configure the base seed (default: 0)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn rng_for(&self, user_id: UserId) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ (user_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

impl Predictor for RandomPredictor {
    fn name(&self) -> &str {
        "RandomPredictor"
    }

    fn fit(&mut self, table: &RatingTable) -> Result<()> {
        let items = table.item_ids();
        debug!("RandomPredictor fitted on {} items", items.len());
        self.items = Some(items);
        Ok(())
    }

    fn predict(&self, user_id: UserId) -> Result<Predictions> {
        let items = self
            .items
            .as_ref()
            .ok_or_else(|| PredictError::not_fitted(self.name()))?;

        let mut rng = self.rng_for(user_id);
        Ok(items
            .iter()
            .map(|&item| (item, rng.random_range(self.min..=self.max) as f64))
            .collect())
    }
}
