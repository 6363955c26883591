//! Database layer (Firestore, plus an in-memory store for offline use).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{FoodEntry, NewEntry};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Collection names as constants.
pub mod collections {
    pub const FOOD_ENTRIES: &str = "food_entries";
}

/// Remote persistence for food entries, partitioned by user and day.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Persist a new entry; the store assigns its ID and normalizes its date.
    async fn save_entry(&self, user_id: &str, entry: NewEntry) -> Result<FoodEntry, AppError>;

    /// Entries for one user and day, newest first.
    async fn list_entries_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<FoodEntry>, AppError>;

    /// Every day on which the user has at least one entry.
    async fn list_dates(&self, user_id: &str) -> Result<BTreeSet<NaiveDate>, AppError>;

    async fn delete_entry(&self, entry_id: &str) -> Result<(), AppError>;
}

/// Newest first, matching what `list_entries_by_date` promises.
pub(crate) fn sort_newest_first(entries: &mut [FoodEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
