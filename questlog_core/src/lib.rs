#![forbid(unsafe_code)]

//! Core domain model and business logic for Questlog.
//!
//! This crate provides:
//! - Domain types (habits, metrics, stats, log payloads)
//! - The logical calendar (day-start offset handling)
//! - The optimistic stats reducer (streaks, experience, volume)
//! - The idempotency guard for duplicate submissions
//! - Catalog and stats persistence, log sink (WAL), CSV archival
//! - History replay for full stats recomputation

pub mod types;
pub mod error;
pub mod calendar;
pub mod reducer;
pub mod guard;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod sink;
pub mod csv_rollup;
pub mod stats_store;
pub mod history;
pub mod profile;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use calendar::{logical_date, logical_date_in};
pub use reducer::{reduce, Reduction};
pub use guard::{RecentLogGuard, DEFAULT_IDEMPOTENCY_WINDOW};
pub use catalog::{build_starter_catalog, get_starter_catalog};
pub use config::{Config, EngineConfig};
pub use sink::{JsonlSink, LogSink};
pub use history::{load_logs, recompute_stats};
pub use engine::{Engine, LogRequest, LoggedOutcome, Outcome};
