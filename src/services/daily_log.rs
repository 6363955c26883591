// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily log aggregation for one identity.
//!
//! The aggregator owns every day's entry list and derived totals, and is the
//! only path through which entries are read from or written to the store.
//!
//! State sits behind a synchronous mutex that is never held across an
//! `.await`; every store call happens with the lock released, and its result
//! is applied afterwards only if it is still current:
//! - identity changes bump a generation counter, so results issued under an
//!   older identity are dropped;
//! - day fetches carry a [`FetchToken`], and only the most recently issued
//!   one may replace a day's log;
//! - mutations that complete while the live fetch is in flight are journaled
//!   and replayed on top of the fetched entries.

use crate::db::EntryStore;
use crate::error::AppError;
use crate::models::{CalorieLimit, CalorieProgress, DailyLog, FoodEntry, NewEntry};
use crate::services::analysis::{MealImage, NutritionAnalyzer};
use crate::time_utils::today;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Whether a day fetch ended up replacing local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch, day selection, reset or identity change superseded it.
    Discarded,
}

/// Everything a client needs to render the selected day.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogSnapshot {
    pub selected_day: NaiveDate,
    pub log: DailyLog,
    /// Most recent first
    pub available_dates: Vec<NaiveDate>,
    pub loading: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub calorie_limit: CalorieLimit,
    pub calorie_progress: CalorieProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FetchToken {
    seq: u64,
    generation: u64,
    day: NaiveDate,
}

#[derive(Debug, Clone)]
enum Mutation {
    Added(FoodEntry),
    Deleted { day: NaiveDate, entry_id: String },
}

struct PendingFetch {
    token: FetchToken,
    journal: Vec<Mutation>,
}

struct LogState {
    identity: Option<String>,
    generation: u64,
    logs: HashMap<NaiveDate, DailyLog>,
    /// Days whose log was last replaced by a store fetch.
    synced_days: HashSet<NaiveDate>,
    selected_day: NaiveDate,
    available_dates: BTreeSet<NaiveDate>,
    loading: bool,
    dates_synced: bool,
    calorie_limit: CalorieLimit,
    fetch_seq: u64,
    pending_fetch: Option<PendingFetch>,
}

impl LogState {
    fn new() -> Self {
        Self {
            identity: None,
            generation: 0,
            logs: HashMap::new(),
            synced_days: HashSet::new(),
            selected_day: today(),
            available_dates: BTreeSet::new(),
            loading: false,
            dates_synced: false,
            calorie_limit: CalorieLimit::default(),
            fetch_seq: 0,
            pending_fetch: None,
        }
    }

    /// Drop everything tied to the previous identity.
    fn reset(&mut self, identity: Option<String>) {
        let generation = self.generation + 1;
        let fetch_seq = self.fetch_seq;
        *self = Self::new();
        self.identity = identity;
        self.generation = generation;
        self.fetch_seq = fetch_seq;
    }

    fn require_identity(&self) -> Result<String, AppError> {
        self.identity.clone().ok_or(AppError::Unauthorized)
    }

    /// Replace a day's log and keep the date index in step with it.
    fn set_log(&mut self, day: NaiveDate, log: DailyLog) {
        if log.is_empty() {
            self.available_dates.remove(&day);
        } else {
            self.available_dates.insert(day);
        }
        self.logs.insert(day, log);
    }

    fn apply(&mut self, mutation: Mutation) {
        match &mutation {
            Mutation::Added(entry) => {
                let day = entry.date;
                self.logs.entry(day).or_default().push(entry.clone());
                self.available_dates.insert(day);
            }
            Mutation::Deleted { day, entry_id } => {
                if let Some(log) = self.logs.get_mut(day) {
                    log.remove(entry_id);
                    if log.is_empty() {
                        self.available_dates.remove(day);
                    }
                }
            }
        }

        if let Some(pending) = self.pending_fetch.as_mut() {
            let day = match &mutation {
                Mutation::Added(entry) => entry.date,
                Mutation::Deleted { day, .. } => *day,
            };
            if pending.token.day == day {
                pending.journal.push(mutation);
            }
        }
    }

    /// Merge a freshly fetched date set with what this session already knows.
    ///
    /// A non-empty local log always keeps its day. An empty one drops the
    /// day only if it came from a store fetch; a locally reset day says
    /// nothing about what the store holds.
    fn sync_dates(&mut self, fetched: BTreeSet<NaiveDate>) {
        let mut dates = fetched;
        for (day, log) in &self.logs {
            if !log.is_empty() {
                dates.insert(*day);
            } else if self.synced_days.contains(day) {
                dates.remove(day);
            }
        }
        self.available_dates = dates;
    }
}

/// Per-identity owner of daily logs, totals, and the calorie goal.
pub struct DailyLogAggregator {
    store: Arc<dyn EntryStore>,
    state: Mutex<LogState>,
}

impl DailyLogAggregator {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            state: Mutex::new(LogState::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Identity ────────────────────────────────────────────────

    /// Bind the aggregator to an identity, or clear it with `None`.
    ///
    /// A new identity discards all prior state and loads the set of days
    /// that have entries. Entries themselves are loaded per day by
    /// [`select_day`](Self::select_day).
    pub async fn initialize(&self, identity: Option<&str>) -> Result<(), AppError> {
        let (user_id, generation) = {
            let mut state = self.state();
            match identity {
                None => {
                    if let Some(previous) = state.identity.as_deref() {
                        tracing::info!(user_id = previous, "Clearing daily log state");
                    }
                    state.reset(None);
                    return Ok(());
                }
                Some(user_id) if state.identity.as_deref() == Some(user_id) => {
                    if state.loading || state.dates_synced {
                        return Ok(());
                    }
                    // Same identity whose date load failed earlier: retry it.
                }
                Some(user_id) => {
                    tracing::info!(user_id, "Initializing daily log state");
                    state.reset(Some(user_id.to_string()));
                }
            }
            state.loading = true;
            (state.require_identity()?, state.generation)
        };

        let result = self.store.list_dates(&user_id).await;

        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!(user_id = %user_id, "Discarding date list for a previous identity");
            return Ok(());
        }
        state.loading = false;

        match result {
            Ok(dates) => {
                state.sync_dates(dates);
                state.dates_synced = true;
                tracing::debug!(
                    user_id = %user_id,
                    count = state.available_dates.len(),
                    "Available dates loaded"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to load available dates");
                Err(e)
            }
        }
    }

    pub fn identity(&self) -> Option<String> {
        self.state().identity.clone()
    }

    // ─── Day Selection ───────────────────────────────────────────

    /// Select a day and reload its entries from the store.
    ///
    /// The fetch is issued even if the day is cached. Its result is applied
    /// only if no newer selection, reset, or identity change happened while
    /// it was in flight.
    pub async fn select_day(&self, day: NaiveDate) -> Result<FetchOutcome, AppError> {
        let (user_id, token) = {
            let mut state = self.state();
            let user_id = state.require_identity()?;
            state.selected_day = day;
            state.fetch_seq += 1;
            let token = FetchToken {
                seq: state.fetch_seq,
                generation: state.generation,
                day,
            };
            state.pending_fetch = Some(PendingFetch {
                token,
                journal: Vec::new(),
            });
            (user_id, token)
        };

        let result = self.store.list_entries_by_date(&user_id, day).await;

        let mut state = self.state();
        let is_live = state.generation == token.generation
            && state.selected_day == day
            && state
                .pending_fetch
                .as_ref()
                .is_some_and(|pending| pending.token == token);
        if !is_live {
            tracing::debug!(
                user_id = %user_id,
                date = %day,
                seq = token.seq,
                "Discarding stale day fetch"
            );
            return Ok(FetchOutcome::Discarded);
        }

        let journal = state
            .pending_fetch
            .take()
            .map(|pending| pending.journal)
            .unwrap_or_default();

        let entries = result.map_err(|e| {
            tracing::warn!(user_id = %user_id, date = %day, error = %e, "Failed to load entries");
            e
        })?;

        let mut log = DailyLog::from_entries(entries);
        let replayed = journal.len();
        for mutation in journal {
            match mutation {
                Mutation::Added(entry) => {
                    log.push(entry);
                }
                Mutation::Deleted { entry_id, .. } => {
                    log.remove(&entry_id);
                }
            }
        }

        tracing::debug!(
            user_id = %user_id,
            date = %day,
            entries = log.entries().len(),
            replayed,
            "Day log loaded"
        );
        state.set_log(day, log);
        state.synced_days.insert(day);

        Ok(FetchOutcome::Applied)
    }

    /// Replace a day's log with an empty one and select it, without
    /// contacting the store. Defaults to today.
    pub fn reset_day(&self, day: Option<NaiveDate>) -> NaiveDate {
        let day = day.unwrap_or_else(today);
        let mut state = self.state();
        state.logs.insert(day, DailyLog::default());
        state.synced_days.remove(&day);
        state.selected_day = day;
        state.pending_fetch = None;
        day
    }

    pub fn selected_day(&self) -> NaiveDate {
        self.state().selected_day
    }

    // ─── Mutations ───────────────────────────────────────────────

    /// Persist a new entry, then add it to its day's log.
    ///
    /// On a store failure nothing local changes.
    pub async fn add_entry(&self, entry: NewEntry) -> Result<FoodEntry, AppError> {
        let (user_id, generation) = {
            let state = self.state();
            (state.require_identity()?, state.generation)
        };

        let saved = self.store.save_entry(&user_id, entry).await?;

        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!(
                user_id = %user_id,
                entry_id = %saved.id,
                "Identity changed while saving; not applying entry locally"
            );
            return Ok(saved);
        }
        state.apply(Mutation::Added(saved.clone()));

        tracing::info!(
            user_id = %user_id,
            entry_id = %saved.id,
            date = %saved.date,
            "Food entry added"
        );
        Ok(saved)
    }

    /// Delete an entry from the selected day's log.
    ///
    /// Returns `Ok(false)` without touching the store if the entry is not in
    /// the currently loaded log.
    pub async fn delete_entry(&self, entry_id: &str) -> Result<bool, AppError> {
        let (user_id, generation, day) = {
            let state = self.state();
            let user_id = state.require_identity()?;
            let day = state.selected_day;
            let present = state
                .logs
                .get(&day)
                .is_some_and(|log| log.contains(entry_id));
            if !present {
                tracing::debug!(user_id = %user_id, entry_id, date = %day, "Entry not loaded; nothing to delete");
                return Ok(false);
            }
            (user_id, state.generation, day)
        };

        self.store.delete_entry(entry_id).await?;

        let mut state = self.state();
        if state.generation != generation {
            return Ok(true);
        }
        state.apply(Mutation::Deleted {
            day,
            entry_id: entry_id.to_string(),
        });

        tracing::info!(user_id = %user_id, entry_id, date = %day, "Food entry deleted");
        Ok(true)
    }

    /// Analyze a meal photo and log the result as a new entry.
    ///
    /// The photo is kept on the entry as a `data:` URI when it is small
    /// enough. Rejections from the analyzer leave every log untouched.
    pub async fn analyze_and_log(
        &self,
        analyzer: &dyn NutritionAnalyzer,
        image: MealImage,
        credential: &str,
    ) -> Result<FoodEntry, AppError> {
        self.state().require_identity()?;

        let image_ref = image.to_data_uri();
        let response = analyzer.analyze(image, credential).await?;
        let mut entry = response.into_new_entry(chrono::Utc::now()).map_err(|e| {
            tracing::info!(reason = %e, "Analysis found nothing to log");
            e
        })?;
        entry.image_ref = image_ref;

        self.add_entry(entry).await
    }

    // ─── Calorie Goal ────────────────────────────────────────────

    pub fn calorie_limit(&self) -> CalorieLimit {
        self.state().calorie_limit
    }

    /// Set the calorie goal; out-of-range values leave the old one in place.
    pub fn set_calorie_limit(&self, value: i64) -> Result<CalorieLimit, AppError> {
        let limit = CalorieLimit::new(value)?;
        self.state().calorie_limit = limit;
        Ok(limit)
    }

    pub fn reset_calorie_limit(&self) -> CalorieLimit {
        let mut state = self.state();
        state.calorie_limit = CalorieLimit::default();
        state.calorie_limit
    }

    // ─── Derived State ───────────────────────────────────────────

    /// Loaded log for a day, if any.
    pub fn log(&self, day: NaiveDate) -> Option<DailyLog> {
        self.state().logs.get(&day).cloned()
    }

    /// Days with at least one entry, most recent first.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        self.state().available_dates.iter().rev().copied().collect()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn snapshot(&self) -> LogSnapshot {
        let state = self.state();
        let log = state
            .logs
            .get(&state.selected_day)
            .cloned()
            .unwrap_or_default();
        let calorie_progress = CalorieProgress::new(log.totals().calories, state.calorie_limit);

        LogSnapshot {
            selected_day: state.selected_day,
            log,
            available_dates: state.available_dates.iter().rev().copied().collect(),
            loading: state.loading,
            calorie_limit: state.calorie_limit,
            calorie_progress,
        }
    }
}
