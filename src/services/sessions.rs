// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registry of live per-user daily log aggregators.

use crate::db::EntryStore;
use crate::error::AppError;
use crate::services::DailyLogAggregator;
use dashmap::DashMap;
use std::sync::Arc;

/// One aggregator per signed-in user, shared across that user's requests.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn EntryStore>,
    sessions: Arc<DashMap<String, Arc<DailyLogAggregator>>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Aggregator for `user_id`, initialized on first use.
    pub async fn open(&self, user_id: &str) -> Result<Arc<DailyLogAggregator>, AppError> {
        let aggregator = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(DailyLogAggregator::new(self.store.clone())))
            .clone();

        // No-op once this identity's dates have loaded.
        aggregator.initialize(Some(user_id)).await?;
        Ok(aggregator)
    }

    /// Aggregator for `user_id` if a session is already open.
    pub fn get(&self, user_id: &str) -> Option<Arc<DailyLogAggregator>> {
        self.sessions.get(user_id).map(|entry| entry.value().clone())
    }

    /// Clear and drop a user's session. Returns whether one existed.
    pub async fn close(&self, user_id: &str) -> Result<bool, AppError> {
        match self.sessions.remove(user_id) {
            Some((_, aggregator)) => {
                aggregator.initialize(None).await?;
                tracing::info!(user_id, "Session closed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
