// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running.
//! Run with: ./scripts/test-with-emulator.sh
//!
//! The emulator provides a clean state for each test run.

use chrono::{TimeZone, Utc};
use nutrigram::db::EntryStore;
use nutrigram::models::{NewEntry, Nutrition};
use nutrigram::services::{DailyLogAggregator, FetchOutcome};
use std::sync::Arc;

mod common;
use common::{day, test_db};

/// Generate a unique user ID for test isolation.
fn unique_user_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("test-user-{}", nanos)
}

fn meal(y: i32, m: u32, d: u32, hour: u32, calories: f64) -> NewEntry {
    NewEntry {
        dish_name: Some(format!("Meal at {}:00", hour)),
        image_ref: Some("https://example.com/meal.jpg".to_string()),
        nutrition: Nutrition {
            calories: Some(calories),
            protein_g: Some(10.0),
            ..Default::default()
        },
        timestamp: Some(Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap()),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_save_and_get_entry() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    let saved = db.save_entry(&user_id, meal(2024, 4, 1, 8, 350.0)).await.unwrap();
    assert!(!saved.id.is_empty());
    assert_eq!(saved.date, day(2024, 4, 1));

    let fetched = db.get_entry(&saved.id).await.unwrap();
    assert_eq!(fetched, Some(saved));
}

#[tokio::test]
async fn test_list_by_date_filters_and_orders() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();
    let other_user = unique_user_id();

    db.save_entry(&user_id, meal(2024, 4, 2, 8, 100.0)).await.unwrap();
    db.save_entry(&user_id, meal(2024, 4, 2, 19, 200.0)).await.unwrap();
    db.save_entry(&user_id, meal(2024, 4, 3, 12, 300.0)).await.unwrap();
    db.save_entry(&other_user, meal(2024, 4, 2, 9, 999.0)).await.unwrap();

    let entries = db
        .list_entries_by_date(&user_id, day(2024, 4, 2))
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].nutrition.calories, Some(200.0));
    assert_eq!(entries[1].nutrition.calories, Some(100.0));

    let dates = db.list_dates(&user_id).await.unwrap();
    assert_eq!(
        dates.into_iter().collect::<Vec<_>>(),
        vec![day(2024, 4, 2), day(2024, 4, 3)]
    );
}

#[tokio::test]
async fn test_delete_entry() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    let saved = db.save_entry(&user_id, meal(2024, 4, 4, 8, 100.0)).await.unwrap();
    db.delete_entry(&saved.id).await.unwrap();

    assert!(db.get_entry(&saved.id).await.unwrap().is_none());
    assert!(db.list_dates(&user_id).await.unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// AGGREGATOR OVER FIRESTORE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_aggregator_round_trip_through_firestore() {
    require_emulator!();

    let db = Arc::new(test_db().await);
    let user_id = unique_user_id();
    let d = day(2024, 4, 5);

    let writer = DailyLogAggregator::new(db.clone());
    writer.initialize(Some(user_id.as_str())).await.unwrap();
    writer.select_day(d).await.unwrap();
    writer.add_entry(meal(2024, 4, 5, 8, 400.0)).await.unwrap();
    writer.add_entry(meal(2024, 4, 5, 13, 600.0)).await.unwrap();

    // A fresh session sees the same day from the store.
    let reader = DailyLogAggregator::new(db);
    reader.initialize(Some(user_id.as_str())).await.unwrap();
    assert_eq!(reader.available_dates(), vec![d]);
    assert_eq!(reader.select_day(d).await.unwrap(), FetchOutcome::Applied);
    assert_eq!(reader.log(d).unwrap().totals().calories, 1000.0);
    assert_eq!(
        reader.log(d).unwrap().totals(),
        writer.log(d).unwrap().totals()
    );
}
