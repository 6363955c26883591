// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, SESSION_COOKIE};
use crate::models::{CalorieLimit, FoodEntry, NewEntry};
use crate::services::{DailyLogAggregator, LogSnapshot, MealImage};
use crate::time_utils::today;
use crate::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Largest meal photo accepted for analysis.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// API routes (require authentication via session token).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", post(open_session).delete(close_session))
        .route("/api/log", get(get_log))
        .route("/api/log/selected-day", put(select_day))
        .route("/api/log/reset", post(reset_day))
        .route("/api/entries", post(add_entry))
        .route(
            "/api/entries/analyze",
            post(analyze_entry).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/api/entries/{id}", delete(delete_entry))
        .route(
            "/api/settings/calorie-limit",
            get(get_calorie_limit)
                .put(set_calorie_limit)
                .delete(reset_calorie_limit),
        )
}

/// The caller's aggregator, opening a session on first use.
async fn session(state: &AppState, user: &AuthUser) -> Result<Arc<DailyLogAggregator>> {
    state.sessions.open(&user.user_id).await
}

// ─── Session ─────────────────────────────────────────────────

/// Bind the caller's identity and load today.
async fn open_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LogSnapshot>> {
    let log = session(&state, &user).await?;
    log.select_day(today()).await?;

    tracing::info!(user_id = %user.user_id, "Session opened");
    Ok(Json(log.snapshot()))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CloseSessionResponse {
    pub closed: bool,
}

/// Sign out: drop all per-session state and clear the cookie.
async fn close_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<CloseSessionResponse>)> {
    let closed = state.sessions.close(&user.user_id).await?;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(CloseSessionResponse { closed })))
}

// ─── Daily Log ───────────────────────────────────────────────

async fn get_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LogSnapshot>> {
    let log = session(&state, &user).await?;
    Ok(Json(log.snapshot()))
}

#[derive(Deserialize)]
struct SelectDayRequest {
    date: NaiveDate,
}

/// Select a day and reload its entries.
async fn select_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SelectDayRequest>,
) -> Result<Json<LogSnapshot>> {
    let log = session(&state, &user).await?;
    log.select_day(request.date).await?;
    Ok(Json(log.snapshot()))
}

#[derive(Deserialize, Default)]
struct ResetDayRequest {
    /// Defaults to today
    date: Option<NaiveDate>,
}

/// Clear a day locally without touching stored entries.
async fn reset_day(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    request: Option<Json<ResetDayRequest>>,
) -> Result<Json<LogSnapshot>> {
    let Json(request) = request.unwrap_or_default();
    let log = session(&state, &user).await?;
    log.reset_day(request.date);
    Ok(Json(log.snapshot()))
}

// ─── Entries ─────────────────────────────────────────────────

async fn add_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(entry): Json<NewEntry>,
) -> Result<(StatusCode, Json<FoodEntry>)> {
    entry.validate()?;
    let log = session(&state, &user).await?;
    let saved = log.add_entry(entry).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Analyze an uploaded meal photo and log it.
async fn analyze_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FoodEntry>)> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read image: {}", e)))?;
        image = Some(MealImage {
            data,
            file_name,
            content_type,
        });
        break;
    }

    let image = image.ok_or_else(|| AppError::BadRequest("Missing 'image' field".to_string()))?;
    if image.data.is_empty() {
        return Err(AppError::BadRequest("Image is empty".to_string()));
    }

    let log = session(&state, &user).await?;
    let saved = log
        .analyze_and_log(state.analyzer.as_ref(), image, &user.token)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteEntryResponse {
    pub deleted: bool,
}

/// Delete an entry from the selected day. Unknown IDs are a no-op.
async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(entry_id): Path<String>,
) -> Result<Json<DeleteEntryResponse>> {
    let log = session(&state, &user).await?;
    let deleted = log.delete_entry(&entry_id).await?;
    Ok(Json(DeleteEntryResponse { deleted }))
}

// ─── Settings ────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalorieLimitResponse {
    pub calorie_limit: u32,
}

impl From<CalorieLimit> for CalorieLimitResponse {
    fn from(limit: CalorieLimit) -> Self {
        Self {
            calorie_limit: limit.get(),
        }
    }
}

#[derive(Deserialize, Validate)]
struct CalorieLimitRequest {
    #[validate(range(min = 500, max = 10_000))]
    calorie_limit: i64,
}

async fn get_calorie_limit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CalorieLimitResponse>> {
    let log = session(&state, &user).await?;
    Ok(Json(log.calorie_limit().into()))
}

async fn set_calorie_limit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CalorieLimitRequest>,
) -> Result<Json<CalorieLimitResponse>> {
    request.validate()?;
    let log = session(&state, &user).await?;
    let limit = log.set_calorie_limit(request.calorie_limit)?;
    Ok(Json(limit.into()))
}

async fn reset_calorie_limit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CalorieLimitResponse>> {
    let log = session(&state, &user).await?;
    Ok(Json(log.reset_calorie_limit().into()))
}
