// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::NaiveDate;
use nutrigram::config::Config;
use nutrigram::db::{EntryStore, FirestoreDb, MemoryStore};
use nutrigram::error::AppError;
use nutrigram::models::{FoodEntry, NewEntry};
use nutrigram::routes::create_router;
use nutrigram::services::AnalysisClient;
use nutrigram::AppState;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    create_test_app_with_analysis_url(&config.analysis_api_url.clone())
}

/// Same as [`create_test_app`], with the analysis client pointed at `url`.
#[allow(dead_code)]
pub fn create_test_app_with_analysis_url(url: &str) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = Arc::new(MemoryStore::new());
    let analyzer = Arc::new(AnalysisClient::new(url));

    let state = Arc::new(AppState::new(config, store, analyzer));
    (create_router(state.clone()), state)
}

/// Create a signed session token for `user_id`.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    nutrigram::middleware::auth::create_jwt(user_id, signing_key).unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[allow(dead_code)]
pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Entry store whose reads can be held until the test releases them.
///
/// A held read captures store contents when it is issued and delivers them
/// only once released, which lets tests interleave mutations with it.
#[allow(dead_code)]
#[derive(Default)]
pub struct GatedStore {
    pub inner: MemoryStore,
    day_gates: Mutex<HashMap<NaiveDate, oneshot::Receiver<()>>>,
    dates_gate: Mutex<Option<oneshot::Receiver<()>>>,
    /// Signalled once a held read has captured its result.
    pub read_captured: Notify,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

#[allow(dead_code)]
impl GatedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the next entry read for `day` until the sender fires.
    pub fn hold_day(&self, day: NaiveDate) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.day_gates.lock().unwrap().insert(day, rx);
        tx
    }

    /// Hold the next date listing until the sender fires.
    pub fn hold_dates(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.dates_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("read rejected".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for GatedStore {
    async fn save_entry(&self, user_id: &str, entry: NewEntry) -> Result<FoodEntry, AppError> {
        self.check_writes()?;
        self.inner.save_entry(user_id, entry).await
    }

    async fn list_entries_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<FoodEntry>, AppError> {
        self.check_reads()?;
        let result = self.inner.list_entries_by_date(user_id, date).await;
        let gate = self.day_gates.lock().unwrap().remove(&date);
        if let Some(gate) = gate {
            self.read_captured.notify_one();
            let _ = gate.await;
        }
        result
    }

    async fn list_dates(&self, user_id: &str) -> Result<BTreeSet<NaiveDate>, AppError> {
        self.check_reads()?;
        let result = self.inner.list_dates(user_id).await;
        let gate = self.dates_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            self.read_captured.notify_one();
            let _ = gate.await;
        }
        result
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<(), AppError> {
        self.check_writes()?;
        self.inner.delete_entry(entry_id).await
    }
}
