//! Error types for fitting and querying predictors.
//!
//! Numerical corner cases (no co-raters, zero norms, flat score ranges) are
//! resolved inside each predictor and never show up here. What remains are
//! caller-contract violations, unknown ids and a user without any history.

use data_loader::{ItemId, UserId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// The item is not part of the table the predictor was fitted on
    #[error("Unknown item: {item_id}")]
    UnknownItem { item_id: ItemId },

    /// The user is not part of the table the predictor was fitted on
    #[error("Unknown user: {user_id}")]
    UnknownUser { user_id: UserId },

    /// The user is known but has no usable ratings
    #[error("User {user_id} has no rating history")]
    EmptyUserHistory { user_id: UserId },

    /// `predict` or a query was called before `fit`
    #[error("{predictor} has not been fitted")]
    NotFitted { predictor: String },

    /// A constructor parameter is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The singular value decomposition did not produce its factors
    #[error("Matrix decomposition failed: {0}")]
    Decomposition(String),
}

impl PredictError {
    pub(crate) fn not_fitted(predictor: &str) -> Self {
        PredictError::NotFitted {
            predictor: predictor.to_string(),
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, PredictError>;
