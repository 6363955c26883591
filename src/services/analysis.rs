// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Nutrition analysis API client.
//!
//! Uploads a meal photo and returns the service's nutrition estimate.
//! A response saying the photo holds no food is a [`AnalysisRejected`]
//! outcome, separate from transport and HTTP failures.
//!
//! [`AnalysisRejected`]: AppError::AnalysisRejected

use crate::error::AppError;
use crate::models::{NewEntry, Nutrition};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const ANALYZE_PATH: &str = "/api/v1/food/analyze-food-image/";
const NO_FOOD_MESSAGE: &str = "No food items detected in the image";
const FAILED_MESSAGE: &str = "Failed to analyze image";
const DEFAULT_IMAGE_TYPE: &str = "image/jpeg";

/// Largest photo kept inline on an entry. Encoded, it stays well under the
/// 1 MiB Firestore document limit.
pub const MAX_INLINE_IMAGE_BYTES: usize = 700 * 1024;

/// An uploaded meal photo.
#[derive(Debug, Clone)]
pub struct MealImage {
    pub data: Bytes,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl MealImage {
    /// Encode the photo as a `data:` URI for storage on the logged entry.
    ///
    /// Returns `None` for empty photos and for photos over
    /// [`MAX_INLINE_IMAGE_BYTES`].
    pub fn to_data_uri(&self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        if self.data.len() > MAX_INLINE_IMAGE_BYTES {
            tracing::warn!(
                file_name = %self.file_name,
                size = self.data.len(),
                "Meal photo too large to keep with the entry"
            );
            return None;
        }
        let content_type = self.content_type.as_deref().unwrap_or(DEFAULT_IMAGE_TYPE);
        Some(format!(
            "data:{};base64,{}",
            content_type,
            BASE64.encode(&self.data)
        ))
    }
}

/// Raw analysis response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub contains_food: bool,
    pub dish_name: Option<String>,
    pub message: Option<String>,
    pub combined_nutrition: Option<Nutrition>,
}

impl AnalysisResponse {
    /// Turn the response into an entry timestamped `now`, or the
    /// user-visible reason nothing can be logged.
    pub fn into_new_entry(self, now: DateTime<Utc>) -> Result<NewEntry, AppError> {
        if !self.contains_food {
            return Err(AppError::AnalysisRejected(
                self.message.unwrap_or_else(|| NO_FOOD_MESSAGE.to_string()),
            ));
        }
        if !self.success {
            return Err(AppError::AnalysisRejected(
                self.message.unwrap_or_else(|| FAILED_MESSAGE.to_string()),
            ));
        }

        Ok(NewEntry {
            dish_name: self.dish_name,
            image_ref: None,
            nutrition: self.combined_nutrition.unwrap_or_default(),
            timestamp: Some(now),
        })
    }
}

/// Error body returned by the analysis service on non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Anything that can estimate nutrition from a meal photo.
#[async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        image: MealImage,
        credential: &str,
    ) -> Result<AnalysisResponse, AppError>;
}

/// HTTP client for the nutrition analysis service.
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail);
            return Err(AppError::AnalysisApi(match detail {
                Some(detail) => detail,
                None => format!("HTTP {}: {}", status, body),
            }));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AnalysisApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl NutritionAnalyzer for AnalysisClient {
    async fn analyze(
        &self,
        image: MealImage,
        credential: &str,
    ) -> Result<AnalysisResponse, AppError> {
        let url = format!("{}{}", self.base_url, ANALYZE_PATH);
        let size = image.data.len();

        let mut part = reqwest::multipart::Part::bytes(image.data.to_vec())
            .file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::BadRequest(format!("Invalid image type: {}", e)))?;
        }
        let form = reqwest::multipart::Form::new().part("image", part);

        tracing::debug!(bytes = size, "Sending image for nutrition analysis");

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::AnalysisApi(e.to_string()))?;

        self.check_response_json(response).await
    }
}
