//! Loading, filtering and validating rating tables.
//!
//! Filtering happens at load time, in the same order every time:
//! 1. drop ratings made before `from_date`
//! 2. drop ratings made after `to_date`
//! 3. drop items with fewer than `min_ratings` remaining ratings

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Load-time filters for a rating table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Keep ratings made on or after this day
    pub from_date: Option<NaiveDate>,
    /// Keep ratings made on or before this day
    pub to_date: Option<NaiveDate>,
    /// Keep items with at least this many ratings
    pub min_ratings: Option<usize>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_from_date(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn with_to_date(mut self, date: NaiveDate) -> Self {
        self.to_date = Some(date);
        self
    }

    pub fn with_min_ratings(mut self, min: usize) -> Self {
        self.min_ratings = Some(min);
        self
    }
}

impl RatingTable {
    /// Load a rating file and apply the load-time filters
    pub fn load_from_file(path: &Path, options: &LoadOptions) -> Result<Self> {
        info!("Loading ratings from {:?}", path);
        let records = parser::parse_ratings(path)?;
        let loaded = records.len();

        let table = RatingTable::from_records(records).filtered(options);
        table.validate()?;

        let (users, items, ratings) = table.counts();
        info!(
            "Loaded {} ratings ({} after filtering): {} users, {} items",
            loaded, ratings, users, items
        );
        Ok(table)
    }

    /// Apply date and minimum-ratings filters, returning a new table
    pub fn filtered(&self, options: &LoadOptions) -> RatingTable {
        let in_range = |record: &RatingRecord| {
            let day = record.timestamp.date();
            options.from_date.is_none_or(|from| day >= from)
                && options.to_date.is_none_or(|to| day <= to)
        };

        let dated: Vec<RatingRecord> = self.records.iter().copied().filter(in_range).collect();

        let records = match options.min_ratings {
            Some(min) => {
                let mut per_item: HashMap<ItemId, usize> = HashMap::new();
                for record in &dated {
                    *per_item.entry(record.item_id).or_insert(0) += 1;
                }
                debug!(
                    "{} of {} items have at least {} ratings",
                    per_item.values().filter(|&&c| c >= min).count(),
                    per_item.len(),
                    min
                );
                dated
                    .into_iter()
                    .filter(|r| per_item.get(&r.item_id).copied().unwrap_or(0) >= min)
                    .collect()
            }
            None => dated,
        };

        RatingTable::from_records(records)
    }

    /// Split into ratings made before `day` and ratings made on or after it
    pub fn split_at(&self, day: NaiveDate) -> (RatingTable, RatingTable) {
        let (before, after): (Vec<RatingRecord>, Vec<RatingRecord>) = self
            .records
            .iter()
            .copied()
            .partition(|record| record.timestamp.date() < day);
        debug!(
            "Split at {}: {} before, {} on or after",
            day,
            before.len(),
            after.len()
        );
        (
            RatingTable::from_records(before),
            RatingTable::from_records(after),
        )
    }

    /// Validate data integrity
    ///
    /// Every rating must be a finite, non-negative number.
    pub fn validate(&self) -> Result<()> {
        for record in &self.records {
            if !record.rating.is_finite() || record.rating < 0.0 {
                return Err(DataLoadError::ValidationError(format!(
                    "user {} rated item {} with {}, expected a finite non-negative rating",
                    record.user_id, record.item_id, record.rating
                )));
            }
        }
        Ok(())
    }
}

impl ItemCatalog {
    /// Load item metadata (titles) from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading items from {:?}", path);
        let mut catalog = ItemCatalog::new();
        for item in parser::parse_items(path)? {
            catalog.insert_item(item);
        }
        info!("Loaded {} items", catalog.len());
        Ok(catalog)
    }
}

/// Load ratings and item metadata in parallel
pub fn load_dataset(
    ratings_path: &Path,
    items_path: &Path,
    options: &LoadOptions,
) -> Result<(RatingTable, ItemCatalog)> {
    let (table, catalog) = rayon::join(
        || RatingTable::load_from_file(ratings_path, options),
        || ItemCatalog::load_from_file(items_path),
    );
    Ok((table?, catalog?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, month: u32, year: i32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample_table() -> RatingTable {
        RatingTable::from_records(vec![
            RatingRecord::new(1, 10, 4.0, at(1, 1, 2007)),
            RatingRecord::new(2, 10, 3.0, at(1, 6, 2007)),
            RatingRecord::new(3, 10, 5.0, at(1, 1, 2008)),
            RatingRecord::new(1, 20, 2.0, at(1, 6, 2007)),
            RatingRecord::new(2, 30, 1.0, at(1, 3, 2008)),
        ])
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let table = sample_table().filtered(&LoadOptions::new());
        assert_eq!(table.counts(), (3, 3, 5));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let options = LoadOptions::new()
            .with_from_date(NaiveDate::from_ymd_opt(2007, 6, 1).unwrap())
            .with_to_date(NaiveDate::from_ymd_opt(2008, 1, 1).unwrap());
        let table = sample_table().filtered(&options);

        assert_eq!(table.len(), 3);
        assert!(table.records().iter().all(|r| r.timestamp >= at(1, 6, 2007)));
    }

    #[test]
    fn test_min_ratings_drops_sparse_items() {
        let table = sample_table().filtered(&LoadOptions::new().with_min_ratings(2));

        assert_eq!(table.item_ids(), vec![10]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_min_ratings_counts_after_date_filter() {
        let options = LoadOptions::new()
            .with_to_date(NaiveDate::from_ymd_opt(2007, 12, 31).unwrap())
            .with_min_ratings(2);
        let table = sample_table().filtered(&options);

        // Item 10 keeps two ratings from 2007, item 20 only has one
        assert_eq!(table.item_ids(), vec![10]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_split_at_is_time_disjoint() {
        let (train, test) = sample_table().split_at(NaiveDate::from_ymd_opt(2008, 1, 1).unwrap());

        assert_eq!(train.len(), 3);
        assert_eq!(test.len(), 2);
        assert!(train.records().iter().all(|r| r.timestamp < at(1, 1, 2008)));
        assert!(test.contains_user(3));
        assert!(!train.contains_user(3));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let table = RatingTable::from_records(vec![RatingRecord::new(1, 1, f64::NAN, at(1, 1, 2007))]);
        assert!(matches!(table.validate(), Err(DataLoadError::ValidationError(_))));
    }

    #[test]
    fn test_validate_names_offending_record() {
        let table = RatingTable::from_records(vec![
            RatingRecord::new(1, 10, 4.0, at(1, 1, 2007)),
            RatingRecord::new(7, 42, -1.0, at(1, 1, 2007)),
        ]);
        let message = table.validate().unwrap_err().to_string();

        assert!(message.starts_with("Validation failed"));
        assert!(message.contains("user 7") && message.contains("item 42"));
    }
}
