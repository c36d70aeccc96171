//! Benchmarks for fitting predictors
//!
//! Run with: cargo bench --package predictors
//!
//! Uses a synthetic table so the benchmark does not depend on a dataset
//! being present on disk.

use chrono::NaiveDate;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use data_loader::{RatingRecord, RatingTable};
use predictors::{
    DeviationBasedPredictor, ItemSimilarityPredictor, MatrixFactorizationPredictor, Predictor,
};

const USERS: u32 = 300;
const ITEMS: u32 = 200;

/// Roughly a third of the cells rated, with ratings 1..=5
fn synthetic_table() -> RatingTable {
    let timestamp = NaiveDate::from_ymd_opt(2008, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    let records = (1..=USERS).flat_map(|user| {
        (1..=ITEMS)
            .filter(move |item| (user * 7 + item * 13) % 3 == 0)
            .map(move |item| {
                let rating = ((user * 31 + item * 17) % 5 + 1) as f64;
                RatingRecord::new(user, item, rating, timestamp)
            })
    });
    RatingTable::from_records(records)
}

fn bench_item_similarity_fit(c: &mut Criterion) {
    let table = synthetic_table();

    c.bench_function("item_similarity_fit", |b| {
        b.iter(|| {
            let mut predictor = ItemSimilarityPredictor::new(2, 0.0);
            predictor.fit(black_box(&table)).unwrap();
            black_box(predictor)
        })
    });
}

fn bench_deviation_fit(c: &mut Criterion) {
    let table = synthetic_table();

    c.bench_function("deviation_fit", |b| {
        b.iter(|| {
            let mut predictor = DeviationBasedPredictor::new();
            predictor.fit(black_box(&table)).unwrap();
            black_box(predictor)
        })
    });
}

fn bench_factorization_fit(c: &mut Criterion) {
    let table = synthetic_table();

    c.bench_function("factorization_fit", |b| {
        b.iter(|| {
            let mut predictor = MatrixFactorizationPredictor::new(20).unwrap();
            predictor.fit(black_box(&table)).unwrap();
            black_box(predictor)
        })
    });
}

fn bench_item_similarity_predict(c: &mut Criterion) {
    let table = synthetic_table();
    let mut predictor = ItemSimilarityPredictor::new(2, 0.0);
    predictor.fit(&table).unwrap();

    c.bench_function("item_similarity_predict", |b| {
        b.iter(|| black_box(predictor.predict(black_box(1)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_item_similarity_fit,
    bench_deviation_fit,
    bench_factorization_fit,
    bench_item_similarity_predict
);
criterion_main!(benches);
