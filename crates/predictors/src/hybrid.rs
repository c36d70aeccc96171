//! Ensemble of a baseline, an item-similarity and a slope-one predictor.
//!
//! Baseline scores live on an arbitrary scale (standard deviations, view
//! counts) and are min-max rescaled onto the 1..=5 rating scale before the
//! three scores are averaged.

use crate::deviation::DeviationBasedPredictor;
use crate::error::Result;
use crate::item_similarity::ItemSimilarityPredictor;
use crate::traits::{Predictions, Predictor};
use crate::variance::RatingVariancePredictor;
use data_loader::{RatingTable, UserId};
use tracing::{debug, instrument};

const SCALE_MIN: f64 = 1.0;
const SCALE_MAX: f64 = 5.0;

pub struct HybridPredictor {
    baseline: Box<dyn Predictor>,
    similarity: ItemSimilarityPredictor,
    deviation: DeviationBasedPredictor,
}

impl HybridPredictor {
    pub fn new(
        baseline: Box<dyn Predictor>,
        similarity: ItemSimilarityPredictor,
        deviation: DeviationBasedPredictor,
    ) -> Self {
        Self {
            baseline,
            similarity,
            deviation,
        }
    }
}

impl Default for HybridPredictor {
    fn default() -> Self {
        Self::new(
            Box::new(RatingVariancePredictor::new(0)),
            ItemSimilarityPredictor::new(1, 0.0),
            DeviationBasedPredictor::new(),
        )
    }
}

/// Min-max rescale onto `[SCALE_MIN, SCALE_MAX]`; a flat map goes to the midpoint
fn rescale(scores: &Predictions) -> Predictions {
    let (lo, hi) = scores
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });
    let range = hi - lo;

    scores
        .iter()
        .map(|(&item, &s)| {
            let scaled = if range > 0.0 {
                SCALE_MIN + (s - lo) / range * (SCALE_MAX - SCALE_MIN)
            } else {
                (SCALE_MIN + SCALE_MAX) / 2.0
            };
            (item, scaled)
        })
        .collect()
}

impl Predictor for HybridPredictor {
    fn name(&self) -> &str {
        "HybridPredictor"
    }

    #[instrument(skip(self, table), fields(baseline = self.baseline.name()))]
    fn fit(&mut self, table: &RatingTable) -> Result<()> {
        let baseline = &mut self.baseline;
        let similarity = &mut self.similarity;
        let deviation = &mut self.deviation;

        let (baseline_fit, (similarity_fit, deviation_fit)) = rayon::join(
            || baseline.fit(table),
            || rayon::join(|| similarity.fit(table), || deviation.fit(table)),
        );
        baseline_fit?;
        similarity_fit?;
        deviation_fit?;
        Ok(())
    }

    fn predict(&self, user_id: UserId) -> Result<Predictions> {
        let baseline = rescale(&self.baseline.predict(user_id)?);
        let similarity = self.similarity.predict(user_id)?;
        let deviation = self.deviation.predict(user_id)?;

        let predictions: Predictions = baseline
            .iter()
            .filter_map(|(item, &base)| {
                let sim = similarity.get(item)?;
                let dev = deviation.get(item)?;
                Some((*item, (base + sim + dev) / 3.0))
            })
            .collect();

        debug!(
            "Combined {} of {} baseline items for user {}",
            predictions.len(),
            baseline.len(),
            user_id
        );
        Ok(predictions)
    }
}
