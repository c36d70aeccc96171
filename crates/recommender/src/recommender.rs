//! Top-N recommendation and offline evaluation on top of any predictor.

use crate::metrics::{Evaluation, MetricTotals};
use data_loader::{ItemId, RatingTable, UserId};
use predictors::{PredictError, Predictor, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default minimum test rating for an item to count as relevant
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 4.0;

/// One entry of a top-N list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub score: f64,
}

/// Wraps a predictor with ranking, seen-item filtering and evaluation.
///
/// ## Usage
/// ```ignore
/// let mut recommender = Recommender::new(Box::new(DeviationBasedPredictor::new()));
/// recommender.fit(Arc::new(train))?;
///
/// let top = recommender.recommend(78, 10, false)?;
/// let report = recommender.evaluate(&test, 10)?;
/// ```
pub struct Recommender {
    predictor: Box<dyn Predictor>,
    table: Option<Arc<RatingTable>>,
    relevance_threshold: f64,
}

impl Recommender {
    pub fn new(predictor: Box<dyn Predictor>) -> Self {
        Self {
            predictor,
            table: None,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
        }
    }

    /// Configure the minimum test rating counted as relevant (default: 4.0)
    pub fn with_relevance_threshold(mut self, threshold: f64) -> Self {
        self.relevance_threshold = threshold;
        self
    }

    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    /// The table the recommender was last fitted on
    pub fn table(&self) -> Option<&RatingTable> {
        self.table.as_deref()
    }

    /// Fit the predictor and keep the table for seen-item filtering
    #[instrument(skip(self, table), fields(predictor = self.predictor.name()))]
    pub fn fit(&mut self, table: Arc<RatingTable>) -> Result<()> {
        self.predictor.fit(&table)?;
        info!("{} fitted on {} ratings", self.predictor.name(), table.len());
        self.table = Some(table);
        Ok(())
    }

    fn fitted_table(&self) -> Result<&RatingTable> {
        self.table.as_deref().ok_or_else(|| PredictError::NotFitted {
            predictor: self.predictor.name().to_string(),
        })
    }

    /// The `n` highest-scoring items for `user_id`.
    ///
    /// Items the user already rated are skipped unless `include_seen` is set.
    /// Ties keep ascending item id order. A known user without usable
    /// history gets an empty list; a user missing from the fitted table is
    /// an `UnknownUser` error.
    pub fn recommend(
        &self,
        user_id: UserId,
        n: usize,
        include_seen: bool,
    ) -> Result<Vec<Recommendation>> {
        let table = self.fitted_table()?;

        let predictions = match self.predictor.predict(user_id) {
            Ok(predictions) => predictions,
            Err(PredictError::EmptyUserHistory { .. }) => {
                debug!("No history for user {}, nothing to recommend", user_id);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let seen = if include_seen {
            Default::default()
        } else {
            table.items_rated_by(user_id)
        };

        let mut recommendations: Vec<Recommendation> = predictions
            .into_iter()
            .filter(|(item_id, _)| !seen.contains(item_id))
            .map(|(item_id, score)| Recommendation { item_id, score })
            .collect();

        // Stable sort keeps the ascending item id order of equal scores
        recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
        recommendations.truncate(n);
        Ok(recommendations)
    }

    /// Recommend `n` unseen items to every training user and score the lists
    /// against a held-out table.
    #[instrument(skip(self, test), fields(predictor = self.predictor.name(), test_ratings = test.len()))]
    pub fn evaluate(&self, test: &RatingTable, n: usize) -> Result<Evaluation> {
        let table = self.fitted_table()?;
        let users = table.user_ids();
        let threshold = self.relevance_threshold;

        let totals = users
            .par_iter()
            .try_fold(MetricTotals::default, |mut totals, &user_id| {
                let recommendations = self.recommend(user_id, n, false)?;
                totals.add_user(user_id, &recommendations, test, threshold);
                Ok::<_, PredictError>(totals)
            })
            .try_reduce(MetricTotals::default, |a, b| Ok(a.merge(b)))?;

        let evaluation = totals.finish(n);
        info!(
            "Evaluated {} users: RMSE {:.4}, F1 {:.4}",
            evaluation.users, evaluation.rmse, evaluation.f1
        );
        Ok(evaluation)
    }
}
