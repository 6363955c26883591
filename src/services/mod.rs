// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod analysis;
pub mod daily_log;
pub mod sessions;

pub use analysis::{AnalysisClient, AnalysisResponse, MealImage, NutritionAnalyzer};
pub use daily_log::{DailyLogAggregator, FetchOutcome, LogSnapshot};
pub use sessions::SessionRegistry;
