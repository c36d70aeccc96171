//! # Recommender Crate
//!
//! Turns a fitted [`Predictor`](predictors::Predictor) into top-N lists and
//! evaluates those lists against a held-out rating table.
//!
//! ## Main Components
//!
//! - **recommender**: `Recommender` (fit / recommend / evaluate) and `Recommendation`
//! - **metrics**: MAE, MSE, RMSE, precision, recall and F1 over top-N lists
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommender::Recommender;
//! use predictors::ItemSimilarityPredictor;
//!
//! let (train, test) = table.split_at(parse_day("1.1.2008")?);
//! let mut recommender = Recommender::new(Box::new(ItemSimilarityPredictor::new(5, 0.0)));
//! recommender.fit(Arc::new(train))?;
//! println!("{}", recommender.evaluate(&test, 10)?);
//! ```

pub mod metrics;
pub mod recommender;

pub use metrics::{Evaluation, MetricTotals, f1_score};
pub use recommender::{DEFAULT_RELEVANCE_THRESHOLD, Recommendation, Recommender};
