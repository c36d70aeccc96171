//! Dense user×item view of a rating table.
//!
//! Rows are users and columns are items, both in ascending id order.
//! Unrated cells hold 0 and a parallel presence mask holds 1 for every rated
//! cell, so a genuine rating of 0 is still distinguishable from "unrated".
//! Duplicate (user, item) records are averaged into a single cell; every
//! predictor goes through this builder and therefore treats duplicates the
//! same way.

use data_loader::{ItemId, RatingTable, UserId};
use nalgebra::DMatrix;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RatingMatrix {
    users: Vec<UserId>,
    items: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    ratings: DMatrix<f64>,
    mask: DMatrix<f64>,
}

impl RatingMatrix {
    pub fn from_table(table: &RatingTable) -> Self {
        let users = table.user_ids();
        let items = table.item_ids();
        let user_index: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let item_index: HashMap<ItemId, usize> =
            items.iter().enumerate().map(|(i, &it)| (it, i)).collect();

        let mut sums = DMatrix::<f64>::zeros(users.len(), items.len());
        let mut counts = DMatrix::<f64>::zeros(users.len(), items.len());
        for record in table.records() {
            let row = user_index[&record.user_id];
            let col = item_index[&record.item_id];
            sums[(row, col)] += record.rating;
            counts[(row, col)] += 1.0;
        }

        let ratings = sums.zip_map(&counts, |s, c| if c > 0.0 { s / c } else { 0.0 });
        let mask = counts.map(|c| if c > 0.0 { 1.0 } else { 0.0 });

        Self {
            users,
            items,
            user_index,
            item_index,
            ratings,
            mask,
        }
    }

    /// Ratings, 0 where unrated
    pub fn ratings(&self) -> &DMatrix<f64> {
        &self.ratings
    }

    /// 1 where rated, 0 elsewhere
    pub fn mask(&self) -> &DMatrix<f64> {
        &self.mask
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn user_position(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn item_position(&self, item_id: ItemId) -> Option<usize> {
        self.item_index.get(&item_id).copied()
    }

    /// (column, rating) for every item rated in a row
    pub fn rated_in_row(&self, row: usize) -> Vec<(usize, f64)> {
        (0..self.n_items())
            .filter(|&col| self.mask[(row, col)] > 0.0)
            .map(|col| (col, self.ratings[(row, col)]))
            .collect()
    }

    /// (row, rating) for every user who rated a column
    pub fn rated_in_column(&self, col: usize) -> Vec<(usize, f64)> {
        (0..self.n_users())
            .filter(|&row| self.mask[(row, col)] > 0.0)
            .map(|row| (row, self.ratings[(row, col)]))
            .collect()
    }
}
