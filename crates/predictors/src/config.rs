//! Predictor configuration, loadable from TOML.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```toml
//! predictor = "item_similarity"
//! min_values = 3
//! threshold = 0.1
//! scheme = "nearest_neighbor"
//! ```

use crate::deviation::DeviationBasedPredictor;
use crate::error::{PredictError, Result};
use crate::factorization::{DEFAULT_RANK, MatrixFactorizationPredictor};
use crate::hybrid::HybridPredictor;
use crate::item_similarity::{ItemSimilarityPredictor, PredictionScheme};
use crate::random::RandomPredictor;
use crate::traits::Predictor;
use crate::variance::RatingVariancePredictor;
use crate::views::ViewCountPredictor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which predictor to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    Random,
    Variance,
    ViewCount,
    ItemSimilarity,
    Deviation,
    Factorization,
    #[default]
    Hybrid,
}

impl PredictorKind {
    pub const ALL: [PredictorKind; 7] = [
        PredictorKind::Random,
        PredictorKind::Variance,
        PredictorKind::ViewCount,
        PredictorKind::ItemSimilarity,
        PredictorKind::Deviation,
        PredictorKind::Factorization,
        PredictorKind::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictorKind::Random => "random",
            PredictorKind::Variance => "variance",
            PredictorKind::ViewCount => "view_count",
            PredictorKind::ItemSimilarity => "item_similarity",
            PredictorKind::Deviation => "deviation",
            PredictorKind::Factorization => "factorization",
            PredictorKind::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictorKind {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| PredictError::InvalidConfig(format!("unknown predictor: {}", s)))
    }
}

/// Baseline constituent of the hybrid predictor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineKind {
    #[default]
    Variance,
    ViewCount,
}

/// Constructor parameters for every predictor variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub predictor: PredictorKind,

    /// Item similarity: minimum number of common raters
    pub min_values: usize,
    /// Item similarity: similarities below this are zeroed
    pub threshold: f64,
    pub scheme: PredictionScheme,

    /// Factorization: number of latent factors
    pub rank: usize,

    /// Variance: items need more ratings than this for a nonzero score
    pub min_ratings: usize,

    pub random_min: u32,
    pub random_max: u32,
    pub seed: u64,

    pub baseline: BaselineKind,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            predictor: PredictorKind::default(),
            min_values: 1,
            threshold: 0.0,
            scheme: PredictionScheme::default(),
            rank: DEFAULT_RANK,
            min_ratings: 0,
            random_min: 1,
            random_max: 5,
            seed: 0,
            baseline: BaselineKind::default(),
        }
    }
}

impl PredictorConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn item_similarity(&self) -> ItemSimilarityPredictor {
        ItemSimilarityPredictor::new(self.min_values, self.threshold).with_scheme(self.scheme)
    }

    fn baseline(&self) -> Box<dyn Predictor> {
        match self.baseline {
            BaselineKind::Variance => Box::new(RatingVariancePredictor::new(self.min_ratings)),
            BaselineKind::ViewCount => Box::new(ViewCountPredictor::new()),
        }
    }

    /// Build the configured predictor, unfitted
    pub fn build(&self) -> Result<Box<dyn Predictor>> {
        self.build_kind(self.predictor)
    }

    /// Build a predictor of the given kind from these parameters
    pub fn build_kind(&self, kind: PredictorKind) -> Result<Box<dyn Predictor>> {
        let predictor: Box<dyn Predictor> = match kind {
            PredictorKind::Random => Box::new(
                RandomPredictor::new(self.random_min, self.random_max)?.with_seed(self.seed),
            ),
            PredictorKind::Variance => Box::new(RatingVariancePredictor::new(self.min_ratings)),
            PredictorKind::ViewCount => Box::new(ViewCountPredictor::new()),
            PredictorKind::ItemSimilarity => Box::new(self.item_similarity()),
            PredictorKind::Deviation => Box::new(DeviationBasedPredictor::new()),
            PredictorKind::Factorization => Box::new(MatrixFactorizationPredictor::new(self.rank)?),
            PredictorKind::Hybrid => Box::new(HybridPredictor::new(
                self.baseline(),
                self.item_similarity(),
                DeviationBasedPredictor::new(),
            )),
        };
        Ok(predictor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = PredictorConfig::from_toml_str("").unwrap();
        assert_eq!(config, PredictorConfig::default());
        assert_eq!(config.rank, 50);
    }

    #[test]
    fn test_partial_override() {
        let config = PredictorConfig::from_toml_str(
            r#"
            predictor = "item_similarity"
            min_values = 3
            threshold = 0.25
            scheme = "nearest_neighbor"
            "#,
        )
        .unwrap();

        assert_eq!(config.predictor, PredictorKind::ItemSimilarity);
        assert_eq!(config.min_values, 3);
        assert_eq!(config.threshold, 0.25);
        assert_eq!(config.scheme, PredictionScheme::NearestNeighbor);
        assert_eq!(config.random_max, 5);
    }

    #[test]
    fn test_build_every_kind() {
        let config = PredictorConfig::default();
        for kind in PredictorKind::ALL {
            let predictor = config.build_kind(kind).unwrap();
            assert!(!predictor.name().is_empty());
        }
    }

    #[test]
    fn test_invalid_parameters_surface_on_build() {
        let config = PredictorConfig {
            rank: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.build_kind(PredictorKind::Factorization),
            Err(PredictError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("view-count".parse::<PredictorKind>().unwrap(), PredictorKind::ViewCount);
        assert_eq!("Hybrid".parse::<PredictorKind>().unwrap(), PredictorKind::Hybrid);
        assert!("svd++".parse::<PredictorKind>().is_err());
    }
}
