//! Accuracy and retrieval metrics for top-N lists against a held-out table.
//!
//! Each user is scored independently into a [`MetricTotals`]; totals from
//! different threads are merged and only then turned into averages.

use crate::recommender::Recommendation;
use data_loader::{RatingTable, UserId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Running sums of per-user metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTotals {
    users: usize,
    abs_error: f64,
    squared_error: f64,
    error_users: usize,
    precision: f64,
    precision_users: usize,
    recall: f64,
    recall_users: usize,
}

impl MetricTotals {
    /// Score one user's recommendations against the test table.
    ///
    /// - error terms compare each score with the item's mean test rating,
    ///   for recommended items that appear in the test table
    /// - retrieval terms only count users present in the test table; an item
    ///   is relevant when the user rated it at least `threshold`
    pub fn add_user(
        &mut self,
        user_id: UserId,
        recommendations: &[Recommendation],
        test: &RatingTable,
        threshold: f64,
    ) {
        self.users += 1;

        let errors: Vec<f64> = recommendations
            .iter()
            .filter_map(|rec| test.item_mean(rec.item_id).map(|actual| rec.score - actual))
            .collect();
        if !errors.is_empty() {
            let n = errors.len() as f64;
            self.abs_error += errors.iter().map(|e| e.abs()).sum::<f64>() / n;
            self.squared_error += errors.iter().map(|e| e * e).sum::<f64>() / n;
            self.error_users += 1;
        }

        if !test.contains_user(user_id) {
            return;
        }
        let relevant: BTreeSet<_> = test
            .items_rated_by(user_id)
            .into_iter()
            .filter(|&item| test.rating(user_id, item).is_some_and(|r| r >= threshold))
            .collect();
        let hits = recommendations
            .iter()
            .filter(|rec| relevant.contains(&rec.item_id))
            .count() as f64;

        if !recommendations.is_empty() {
            self.precision += hits / recommendations.len() as f64;
            self.precision_users += 1;
        }
        if !relevant.is_empty() {
            self.recall += hits / relevant.len() as f64;
            self.recall_users += 1;
        }
    }

    pub fn merge(mut self, other: MetricTotals) -> MetricTotals {
        self.users += other.users;
        self.abs_error += other.abs_error;
        self.squared_error += other.squared_error;
        self.error_users += other.error_users;
        self.precision += other.precision;
        self.precision_users += other.precision_users;
        self.recall += other.recall;
        self.recall_users += other.recall_users;
        self
    }

    /// Average the sums into a report for lists of length `n`
    pub fn finish(&self, n: usize) -> Evaluation {
        let average = |sum: f64, count: usize| {
            if count == 0 { 0.0 } else { sum / count as f64 }
        };
        let mae = average(self.abs_error, self.error_users);
        let mse = average(self.squared_error, self.error_users);
        let precision = average(self.precision, self.precision_users);
        let recall = average(self.recall, self.recall_users);

        Evaluation {
            list_length: n,
            users: self.users,
            mae,
            mse,
            rmse: mse.sqrt(),
            precision,
            recall,
            f1: f1_score(precision, recall),
        }
    }
}

/// Harmonic mean of precision and recall, 0 when both are 0
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    let f1 = 2.0 * precision * recall / (precision + recall);
    if f1.is_nan() { 0.0 } else { f1 }
}

/// Evaluation report for one predictor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Length of the recommendation lists
    pub list_length: usize,
    /// Training users a list was requested for
    pub users: usize,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.list_length;
        writeln!(f, "Users evaluated: {}", self.users)?;
        writeln!(f, "MAE@{}: {:.4}", n, self.mae)?;
        writeln!(f, "MSE@{}: {:.4}", n, self.mse)?;
        writeln!(f, "RMSE@{}: {:.4}", n, self.rmse)?;
        writeln!(f, "Precision@{}: {:.4}", n, self.precision)?;
        writeln!(f, "Recall@{}: {:.4}", n, self.recall)?;
        write!(f, "F1score@{}: {:.4}", n, self.f1)
    }
}
