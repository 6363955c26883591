// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Daily calorie goal and progress against it.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Daily calorie goal, bounded to [`CalorieLimit::MIN`]..=[`CalorieLimit::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CalorieLimit(u32);

impl CalorieLimit {
    pub const MIN: u32 = 500;
    pub const MAX: u32 = 10_000;
    pub const DEFAULT: CalorieLimit = CalorieLimit(2400);

    pub fn new(value: i64) -> Result<Self, AppError> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(AppError::Validation(format!(
                "Calorie limit must be between {} and {}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value as u32))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for CalorieLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for CalorieLimit {
    type Error = AppError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<CalorieLimit> for u32 {
    fn from(limit: CalorieLimit) -> Self {
        limit.0
    }
}

/// How far the day's calories are toward the goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalorieProgress {
    pub consumed: f64,
    pub limit: u32,
    /// Capped at 100
    pub percent: f64,
    pub remaining: f64,
    pub over_limit: bool,
}

impl CalorieProgress {
    pub fn new(consumed: f64, limit: CalorieLimit) -> Self {
        let goal = f64::from(limit.get());
        Self {
            consumed,
            limit: limit.get(),
            percent: (consumed / goal).min(1.0) * 100.0,
            remaining: (goal - consumed).max(0.0),
            over_limit: consumed >= goal,
        }
    }
}
