//! Per-day entry lists and their derived macro totals.
//!
//! Totals are always produced by [`MacroTotals::from_entries`], whether a
//! log was just reloaded from the store or mutated by a single add/delete,
//! so the two paths can never drift apart.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{FoodEntry, Nutrition};

/// Sum of the tracked macros across one day's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein_g: f64,
    pub carbohydrates_total_g: f64,
    pub sugar_g: f64,
    pub fat_total_g: f64,
}

impl MacroTotals {
    /// Sum each tracked macro over `entries`.
    ///
    /// Missing or non-finite amounts count as zero and every total is
    /// floored at zero.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a FoodEntry>,
    {
        let sum = entries
            .into_iter()
            .fold(Self::default(), |acc, entry| acc.plus(&entry.nutrition));

        Self {
            calories: sum.calories.max(0.0),
            protein_g: sum.protein_g.max(0.0),
            carbohydrates_total_g: sum.carbohydrates_total_g.max(0.0),
            sugar_g: sum.sugar_g.max(0.0),
            fat_total_g: sum.fat_total_g.max(0.0),
        }
    }

    fn plus(self, n: &Nutrition) -> Self {
        Self {
            calories: self.calories + amount(n.calories),
            protein_g: self.protein_g + amount(n.protein_g),
            carbohydrates_total_g: self.carbohydrates_total_g + amount(n.carbohydrates_total_g),
            sugar_g: self.sugar_g + amount(n.sugar_g),
            fat_total_g: self.fat_total_g + amount(n.fat_total_g),
        }
    }
}

fn amount(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Entries logged on one calendar day, with totals kept in sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyLog {
    entries: Vec<FoodEntry>,
    totals: MacroTotals,
}

impl DailyLog {
    /// Build a log from entries as returned by the store.
    pub fn from_entries(entries: Vec<FoodEntry>) -> Self {
        let totals = MacroTotals::from_entries(&entries);
        Self { entries, totals }
    }

    pub fn entries(&self) -> &[FoodEntry] {
        &self.entries
    }

    pub fn totals(&self) -> MacroTotals {
        self.totals
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entry_id: &str) -> bool {
        self.entries.iter().any(|e| e.id == entry_id)
    }

    /// Append an entry unless one with the same ID is already present.
    ///
    /// Returns `true` if the entry was added.
    pub fn push(&mut self, entry: FoodEntry) -> bool {
        if self.contains(&entry.id) {
            return false;
        }
        self.entries.push(entry);
        self.totals = MacroTotals::from_entries(&self.entries);
        true
    }

    /// Remove an entry by ID, returning it if it was present.
    pub fn remove(&mut self, entry_id: &str) -> Option<FoodEntry> {
        let index = self.entries.iter().position(|e| e.id == entry_id)?;
        let removed = self.entries.remove(index);
        self.totals = MacroTotals::from_entries(&self.entries);
        Some(removed)
    }
}
