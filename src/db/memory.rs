// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process entry store for offline development and tests.

use crate::db::{sort_newest_first, EntryStore};
use crate::error::AppError;
use crate::models::{FoodEntry, NewEntry};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Entry store backed by a map in process memory.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, FoodEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-persisted entry as-is (seeding fixtures).
    pub async fn insert(&self, entry: FoodEntry) {
        self.entries.write().await.insert(entry.id.clone(), entry);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn save_entry(&self, user_id: &str, entry: NewEntry) -> Result<FoodEntry, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = entry.into_entry(id, user_id, chrono::Utc::now());
        self.entries
            .write()
            .await
            .insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    async fn list_entries_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<FoodEntry>, AppError> {
        let mut entries: Vec<FoodEntry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id && e.date == date)
            .cloned()
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    async fn list_dates(&self, user_id: &str) -> Result<BTreeSet<NaiveDate>, AppError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.date)
            .collect())
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(entry_id);
        Ok(())
    }
}
