//! Core domain types for rating data.
//!
//! This module defines the records every predictor consumes:
//! - Type aliases for domain clarity (UserId, ItemId)
//! - `RatingRecord`, one observed (user, item, rating, time) fact
//! - `RatingTable`, the immutable in-memory table with user and item indices
//! - `Item` and `ItemCatalog`, display metadata (titles) for items

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a rated item (a movie in the MovieLens data)
pub type ItemId = u32;

// =============================================================================
// Rating Record
// =============================================================================

/// A single rating a user gave to an item.
///
/// Records are `Copy` and never mutated after ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
    /// When the rating was made
    pub timestamp: NaiveDateTime,
}

impl RatingRecord {
    pub fn new(user_id: UserId, item_id: ItemId, rating: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            user_id,
            item_id,
            rating,
            timestamp,
        }
    }
}

// =============================================================================
// Item metadata
// =============================================================================

/// Display metadata for an item. Never used for computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Year extracted from the title, e.g. "Toy Story (1995)"
    pub year: Option<u16>,
}

/// Lookup from item id to its title.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    pub(crate) items: HashMap<ItemId, Item>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_item(&mut self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Title of an item, if the catalog knows it
    pub fn title_of(&self, id: ItemId) -> Option<&str> {
        self.items.get(&id).map(|item| item.title.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// RatingTable - the in-memory rating store
// =============================================================================

/// All observed ratings plus per-user and per-item indices.
///
/// Duplicate (user, item) pairs are kept as loaded. Lookups that need a
/// single value per pair (`rating`) average the duplicates, and the dense
/// matrix builders in the predictor crate do the same.
#[derive(Debug, Clone, Default)]
pub struct RatingTable {
    /// Records in ingestion order
    pub(crate) records: Vec<RatingRecord>,
    /// All ratings made by each user
    pub(crate) user_ratings: BTreeMap<UserId, Vec<RatingRecord>>,
    /// All ratings received by each item
    pub(crate) item_ratings: BTreeMap<ItemId, Vec<RatingRecord>>,
}

impl RatingTable {
    /// Creates a new, empty RatingTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from records, keeping their order
    pub fn from_records(records: impl IntoIterator<Item = RatingRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.insert_rating(record);
        }
        table
    }

    /// Insert a rating and update indices
    pub fn insert_rating(&mut self, record: RatingRecord) {
        self.user_ratings
            .entry(record.user_id)
            .or_default()
            .push(record);
        self.item_ratings
            .entry(record.item_id)
            .or_default()
            .push(record);
        self.records.push(record);
    }

    /// All records in ingestion order
    pub fn records(&self) -> &[RatingRecord] {
        &self.records
    }

    /// All ratings made by a user; empty if the user is unknown
    pub fn ratings_for_user(&self, user_id: UserId) -> &[RatingRecord] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All ratings received by an item; empty if the item is unknown
    pub fn ratings_for_item(&self, item_id: ItemId) -> &[RatingRecord] {
        self.item_ratings
            .get(&item_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn items_rated_by(&self, user_id: UserId) -> BTreeSet<ItemId> {
        self.ratings_for_user(user_id)
            .iter()
            .map(|r| r.item_id)
            .collect()
    }

    pub fn users_who_rated(&self, item_id: ItemId) -> BTreeSet<UserId> {
        self.ratings_for_item(item_id)
            .iter()
            .map(|r| r.user_id)
            .collect()
    }

    /// The user's rating of an item, averaged over duplicate records
    pub fn rating(&self, user_id: UserId, item_id: ItemId) -> Option<f64> {
        mean(
            self.ratings_for_user(user_id)
                .iter()
                .filter(|r| r.item_id == item_id)
                .map(|r| r.rating),
        )
    }

    /// Mean of all ratings made by a user
    pub fn user_mean(&self, user_id: UserId) -> Option<f64> {
        mean(self.ratings_for_user(user_id).iter().map(|r| r.rating))
    }

    /// Mean of all ratings received by an item
    pub fn item_mean(&self, item_id: ItemId) -> Option<f64> {
        mean(self.ratings_for_item(item_id).iter().map(|r| r.rating))
    }

    /// User ids in ascending order
    pub fn user_ids(&self) -> Vec<UserId> {
        self.user_ratings.keys().copied().collect()
    }

    /// Item ids in ascending order
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.item_ratings.keys().copied().collect()
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    pub fn contains_item(&self, item_id: ItemId) -> bool {
        self.item_ratings.contains_key(&item_id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// (users, items, ratings) counts for logging and validation
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.user_ratings.len(),
            self.item_ratings.len(),
            self.records.len(),
        )
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
