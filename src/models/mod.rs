// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod daily_log;
pub mod entry;
pub mod settings;

pub use daily_log::{DailyLog, MacroTotals};
pub use entry::{FoodEntry, NewEntry, Nutrition};
pub use settings::{CalorieLimit, CalorieProgress};
