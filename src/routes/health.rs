// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Liveness endpoint.

use crate::time_utils::today;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub build_id: &'static str,
    /// `firestore` or `memory`
    pub store_backend: &'static str,
    /// Day that `POST /api/log/reset` and new sessions default to (UTC)
    pub server_day: NaiveDate,
    /// Users with an open daily log on this instance
    pub open_sessions: usize,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        build_id: option_env!("BUILD_ID").unwrap_or("unknown"),
        store_backend: state.config.store_backend.as_str(),
        server_day: today(),
        open_sessions: state.sessions.len(),
    })
}
