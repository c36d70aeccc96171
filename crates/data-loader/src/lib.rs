//! # Data Loader Crate
//!
//! This crate loads rating data into an in-memory table that the
//! predictors are fitted on, plus a title catalog used for display.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (RatingRecord, RatingTable, Item, ItemCatalog)
//! - **parser**: Parse HetRec (tab) and MovieLens 1M (`::`) files
//! - **index**: Load-time filters (date range, minimum ratings per item)
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{LoadOptions, RatingTable, parse_day};
//! use std::path::Path;
//!
//! let options = LoadOptions::new()
//!     .with_to_date(parse_day("1.1.2008")?)
//!     .with_min_ratings(1000);
//! let table = RatingTable::load_from_file(Path::new("data/user_ratedmovies.dat"), &options)?;
//!
//! println!("User 78 rated {} movies", table.ratings_for_user(78).len());
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

pub use error::{DataLoadError, Result};
pub use index::{LoadOptions, load_dataset};
pub use parser::parse_day;
pub use types::{
    // Type aliases
    ItemId,
    UserId,
    // Core types
    Item,
    ItemCatalog,
    RatingRecord,
    RatingTable,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(user_id: UserId, item_id: ItemId, rating: f64) -> RatingRecord {
        let timestamp = NaiveDate::from_ymd_opt(2008, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        RatingRecord::new(user_id, item_id, rating, timestamp)
    }

    #[test]
    fn test_empty_table() {
        let table = RatingTable::new();
        assert_eq!(table.counts(), (0, 0, 0));
        assert!(table.is_empty());
    }

    #[test]
    fn test_insert_rating() {
        let mut table = RatingTable::new();
        table.insert_rating(record(1, 1193, 5.0));

        assert_eq!(table.ratings_for_user(1).len(), 1);
        assert_eq!(table.ratings_for_user(1)[0].rating, 5.0);
        assert_eq!(table.ratings_for_item(1193).len(), 1);
        assert!(table.contains_user(1));
        assert!(table.contains_item(1193));
    }

    #[test]
    fn test_user_and_item_lookups() {
        let table = RatingTable::from_records(vec![
            record(1, 10, 5.0),
            record(1, 20, 3.0),
            record(2, 10, 2.0),
        ]);

        assert_eq!(table.items_rated_by(1).into_iter().collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(table.users_who_rated(10).into_iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(table.user_mean(1), Some(4.0));
        assert_eq!(table.item_mean(10), Some(3.5));
        assert_eq!(table.user_ids(), vec![1, 2]);
        assert_eq!(table.item_ids(), vec![10, 20]);
    }

    #[test]
    fn test_duplicate_pairs_are_averaged() {
        let table = RatingTable::from_records(vec![record(1, 10, 4.0), record(1, 10, 2.0)]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rating(1, 10), Some(3.0));
    }

    #[test]
    fn test_empty_queries() {
        let table = RatingTable::new();
        assert!(table.ratings_for_user(999).is_empty());
        assert!(table.ratings_for_item(999).is_empty());
        assert_eq!(table.user_mean(999), None);
        assert_eq!(table.rating(1, 1), None);
    }

    #[test]
    fn test_catalog_title_lookup() {
        let mut catalog = ItemCatalog::new();
        catalog.insert_item(Item {
            id: 1580,
            title: "Men in Black".to_string(),
            year: None,
        });

        assert_eq!(catalog.title_of(1580), Some("Men in Black"));
        assert_eq!(catalog.title_of(1), None);
    }
}
