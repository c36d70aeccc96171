//! Integration tests for the recommender.
//!
//! These tests fit every predictor on a small synthetic rating history,
//! split by time, and check the properties every top-N list must have.

use chrono::NaiveDate;
use data_loader::{ItemId, RatingRecord, RatingTable};
use predictors::{PredictError, PredictorConfig, PredictorKind};
use recommender::{Evaluation, Recommender};
use std::sync::Arc;

/// 12 users rating 15 items over 2007-2008, split at 1.1.2008
fn create_test_setup() -> (RatingTable, RatingTable) {
    let mut records = Vec::new();
    for user in 1..=12u32 {
        for item in 1..=15u32 {
            if (user + item) % 3 == 0 {
                continue;
            }
            let rating = ((user * 7 + item * 3) % 5 + 1) as f64;
            let year = if (user * item) % 4 == 0 { 2008 } else { 2007 };
            let day = NaiveDate::from_ymd_opt(year, 1 + item % 12, 1 + user % 28)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap();
            records.push(RatingRecord::new(user, item, rating, day));
        }
    }

    RatingTable::from_records(records).split_at(NaiveDate::from_ymd_opt(2008, 1, 1).unwrap())
}

fn fitted(kind: PredictorKind, train: &Arc<RatingTable>) -> Recommender {
    let config = PredictorConfig {
        rank: 4,
        ..Default::default()
    };
    let mut recommender = Recommender::new(config.build_kind(kind).unwrap());
    recommender.fit(train.clone()).unwrap();
    recommender
}

fn assert_bounded(report: &Evaluation) {
    assert!(report.mae.is_finite() && report.mae >= 0.0);
    assert!(report.mse.is_finite() && report.mse >= 0.0);
    assert!((report.rmse - report.mse.sqrt()).abs() < 1e-12);
    for value in [report.precision, report.recall, report.f1] {
        assert!((0.0..=1.0).contains(&value), "{} out of range", value);
    }
}

#[test]
fn test_split_is_time_disjoint() {
    let (train, test) = create_test_setup();
    let split = NaiveDate::from_ymd_opt(2008, 1, 1).unwrap();

    assert!(!train.is_empty() && !test.is_empty());
    assert!(train.records().iter().all(|r| r.timestamp.date() < split));
    assert!(test.records().iter().all(|r| r.timestamp.date() >= split));
}

#[test]
fn test_recommend_properties_for_every_predictor() {
    let (train, _) = create_test_setup();
    let train = Arc::new(train);

    for kind in PredictorKind::ALL {
        let recommender = fitted(kind, &train);
        for user in train.user_ids() {
            let seen = train.items_rated_by(user);
            let recs = recommender.recommend(user, 5, false).unwrap();

            assert!(recs.len() <= 5, "{}: too many items", kind);
            assert!(recs.iter().all(|r| !seen.contains(&r.item_id)), "{}: seen item", kind);
            assert!(
                recs.windows(2).all(|w| w[0].score >= w[1].score),
                "{}: not sorted",
                kind
            );
            assert_eq!(recs, recommender.recommend(user, 5, false).unwrap());
        }
    }
}

#[test]
fn test_unknown_user_is_reported() {
    let (train, _) = create_test_setup();
    let train = Arc::new(train);

    for kind in [
        PredictorKind::ItemSimilarity,
        PredictorKind::Deviation,
        PredictorKind::Factorization,
        PredictorKind::Hybrid,
    ] {
        assert_eq!(
            fitted(kind, &train).recommend(10_000, 5, false),
            Err(PredictError::UnknownUser { user_id: 10_000 }),
            "{}",
            kind
        );
    }
}

#[test]
fn test_include_seen_returns_rated_items() {
    let (train, _) = create_test_setup();
    let train = Arc::new(train);
    let recommender = fitted(PredictorKind::Deviation, &train);

    let user = train.user_ids()[0];
    let items: Vec<ItemId> = recommender
        .recommend(user, usize::MAX, true)
        .unwrap()
        .iter()
        .map(|r| r.item_id)
        .collect();
    assert_eq!(items.len(), train.item_ids().len());
    assert!(train.items_rated_by(user).iter().all(|i| items.contains(i)));
}

#[test]
fn test_evaluate_metrics_are_bounded() {
    let (train, test) = create_test_setup();
    let train = Arc::new(train);

    for kind in PredictorKind::ALL {
        let report = fitted(kind, &train).evaluate(&test, 5).unwrap();
        assert_eq!(report.users, train.user_ids().len());
        assert_eq!(report.list_length, 5);
        assert_bounded(&report);
    }
}

#[test]
fn test_evaluate_is_deterministic() {
    let (train, test) = create_test_setup();
    let train = Arc::new(train);
    let recommender = fitted(PredictorKind::ItemSimilarity, &train);

    let first = recommender.evaluate(&test, 5).unwrap();
    let second = recommender.evaluate(&test, 5).unwrap();
    assert!((first.mae - second.mae).abs() < 1e-12);
    assert!((first.precision - second.precision).abs() < 1e-12);
}

#[test]
fn test_evaluation_serializes() {
    let (train, test) = create_test_setup();
    let report = fitted(PredictorKind::ViewCount, &Arc::new(train))
        .evaluate(&test, 3)
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["list_length"], 3);
    assert!(json["rmse"].is_number());
}
