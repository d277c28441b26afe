//! Core domain types for Questlog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Habit definitions and their measurement metrics
//! - Per-habit aggregate statistics
//! - Log payloads (a single logged occurrence)
//! - The stats book and habit catalog containers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Habit Types
// ============================================================================

/// How a habit is measured, which determines input semantics
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Done / not done; logged value is always treated as 1
    Boolean,
    /// Duration, conventionally in minutes
    Time,
    /// Monetary amount
    Money,
    /// Plain quantity
    Count,
}

/// A trackable habit definition (e.g., "Morning run")
///
/// Definitions are configuration: created and edited by the user, and
/// read-only inputs to stat computation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub name: String,
    /// Free-form grouping label ("Body", "Mind", ...)
    #[serde(default)]
    pub category: String,
    pub metric: Metric,
    /// Experience earned per unit of logged value
    pub xp_multiplier: f64,
    /// Display unit ("mins", "$", free label); presentational only
    #[serde(default)]
    pub unit: Option<String>,
    /// Display color hex; presentational only
    #[serde(default)]
    pub color: Option<String>,
    /// Inactive habits are hidden from the board but keep their history
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// ============================================================================
// Stats Types
// ============================================================================

/// Per-habit aggregate statistics
///
/// Created lazily (zero-valued) the first time a habit is logged. Every
/// field defaults individually so partially-seeded snapshots load cleanly.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HabitStats {
    /// Consecutive logical days with at least one log
    #[serde(default)]
    pub streak: u32,
    /// Historical maximum of `streak`; never lowered by the reducer
    #[serde(default)]
    pub best_streak: u32,
    /// Cumulative experience earned
    #[serde(default)]
    pub total_xp: f64,
    /// Cumulative raw value logged, before the xp multiplier
    #[serde(default)]
    pub total_volume: f64,
    /// Logical date of the most recent log; the streak-continuation anchor
    #[serde(default)]
    pub last_log_date: Option<NaiveDate>,
}

/// All per-habit stats, keyed by habit id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsBook {
    #[serde(default)]
    pub stats: HashMap<String, HabitStats>,
}

impl StatsBook {
    /// Stats for a habit, zero-valued if it has never been logged
    pub fn get_or_default(&self, habit_id: &str) -> HabitStats {
        self.stats.get(habit_id).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, habit_id: impl Into<String>, stats: HabitStats) {
        self.stats.insert(habit_id.into(), stats);
    }
}

// ============================================================================
// Log Payload
// ============================================================================

/// A single logged occurrence of a habit
///
/// Constructed once at submission time and never mutated; terminal once
/// handed to a sink. `id` doubles as the idempotency key and the durable
/// record's primary key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogPayload {
    pub id: Uuid,
    /// Wall-clock instant the event was recorded
    pub timestamp: DateTime<Utc>,
    /// The logical day the event is attributed to. Authoritative: the
    /// reducer uses this as-is and never re-derives it from `timestamp`.
    pub logical_date: NaiveDate,
    pub habit_id: String,
    pub value: f64,
    /// Subjective effort scaling (0.5 / 1 / 2, ...)
    #[serde(default = "default_intensity")]
    pub intensity: f64,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_intensity() -> f64 {
    1.0
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The complete set of habit definitions, keyed by habit id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HabitCatalog {
    #[serde(default)]
    pub habits: HashMap<String, Habit>,
}

impl HabitCatalog {
    pub fn get(&self, habit_id: &str) -> Option<&Habit> {
        self.habits.get(habit_id)
    }

    /// Habits shown on the board (active only), sorted by id for stable output
    pub fn active_habits(&self) -> Vec<&Habit> {
        let mut habits: Vec<_> = self.habits.values().filter(|h| h.active).collect();
        habits.sort_by(|a, b| a.id.cmp(&b.id));
        habits
    }
}
