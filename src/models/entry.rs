// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Food entry model for storage and API.

use crate::time_utils::utc_day;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Nutrient amounts for one food item.
///
/// Every field is optional: a missing value means "unknown", not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrates_total_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_total_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_saturated_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potassium_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol_mg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size_g: Option<f64>,
}

/// Stored food entry record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FoodEntry {
    /// Store-assigned ID (also used as document ID)
    pub id: String,
    /// Owner of the entry
    pub user_id: String,
    pub dish_name: Option<String>,
    /// Image URI, if one was kept
    pub image_ref: Option<String>,
    #[serde(default)]
    pub nutrition: Nutrition,
    /// Instant the food was logged
    pub timestamp: DateTime<Utc>,
    /// Calendar day of `timestamp` (UTC), the partition key
    pub date: NaiveDate,
    /// When the store accepted the write (RFC 3339)
    pub created_at: String,
}

/// An entry that has not been persisted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewEntry {
    #[validate(length(max = 200))]
    pub dish_name: Option<String>,
    #[validate(length(max = 2048))]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub nutrition: Nutrition,
    /// Defaults to the time the entry is saved
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewEntry {
    /// Attach the store-assigned fields, normalizing `date` from the timestamp.
    pub fn into_entry(self, id: String, user_id: &str, now: DateTime<Utc>) -> FoodEntry {
        let timestamp = self.timestamp.unwrap_or(now);
        FoodEntry {
            id,
            user_id: user_id.to_string(),
            dish_name: self.dish_name,
            image_ref: self.image_ref,
            nutrition: self.nutrition,
            timestamp,
            date: utc_day(timestamp),
            created_at: crate::time_utils::format_utc_rfc3339(now),
        }
    }
}
