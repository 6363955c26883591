// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Food entries live in a single `food_entries` collection, one document per
//! entry, filtered by `user_id` and `date`.

use crate::db::{collections, sort_newest_first, EntryStore};
use crate::error::AppError;
use crate::models::{FoodEntry, NewEntry};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Projection used when only the partition key is needed.
#[derive(Deserialize)]
struct EntryDate {
    date: NaiveDate,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::Persistence(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Persistence(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Persistence("Database not connected (offline mode)".to_string())
        })
    }

    /// Get a single entry by ID.
    pub async fn get_entry(&self, entry_id: &str) -> Result<Option<FoodEntry>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FOOD_ENTRIES)
            .obj()
            .one(entry_id)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }
}

#[async_trait]
impl EntryStore for FirestoreDb {
    async fn save_entry(&self, user_id: &str, entry: NewEntry) -> Result<FoodEntry, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = entry.into_entry(id, user_id, chrono::Utc::now());

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FOOD_ENTRIES)
            .document_id(&entry.id)
            .object(&entry)
            .execute()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::debug!(
            user_id,
            entry_id = %entry.id,
            date = %entry.date,
            "Food entry saved"
        );

        Ok(entry)
    }

    async fn list_entries_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<FoodEntry>, AppError> {
        let user_id = user_id.to_string();
        let date = date.to_string();

        // Ordering happens in memory so the query needs no composite index.
        let mut entries: Vec<FoodEntry> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOOD_ENTRIES)
            .filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("date").eq(date.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        sort_newest_first(&mut entries);
        Ok(entries)
    }

    async fn list_dates(&self, user_id: &str) -> Result<BTreeSet<NaiveDate>, AppError> {
        let owner = user_id.to_string();

        let rows: Vec<EntryDate> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::FOOD_ENTRIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(owner.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        let dates: BTreeSet<NaiveDate> = rows.into_iter().map(|r| r.date).collect();
        tracing::debug!(user_id, count = dates.len(), "Loaded entry dates");
        Ok(dates)
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FOOD_ENTRIES)
            .document_id(entry_id)
            .execute()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::debug!(entry_id, "Food entry deleted");
        Ok(())
    }
}
