// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! NutriGram: photo-based food logging with daily nutrition totals
//!
//! This crate provides the backend API that keeps each user's per-day food
//! log and macro totals in sync with the entry store, and logs meals from
//! photos via a nutrition analysis service.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::EntryStore;
use services::{NutritionAnalyzer, SessionRegistry};
use std::sync::Arc;

/// Shared application state.
///
/// The entry store is reached only through the per-user sessions.
pub struct AppState {
    pub config: Config,
    pub analyzer: Arc<dyn NutritionAnalyzer>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn EntryStore>,
        analyzer: Arc<dyn NutritionAnalyzer>,
    ) -> Self {
        Self {
            config,
            analyzer,
            sessions: SessionRegistry::new(store),
        }
    }
}
