//! Optimistic submission engine.
//!
//! The engine owns the in-memory catalog, stats book, and idempotency
//! guard, and drives one log submission end to end: validate, build the
//! payload, gate on the guard, reduce, apply the new stats immediately, and
//! append to the sink best-effort. The stats apply before (and regardless
//! of) the durable write, so the caller can update its display at once and
//! decide how to surface an unsynced log.

use crate::{
    calendar, reducer, EngineConfig, Error, HabitCatalog, HabitStats, LogPayload, LogSink, Metric,
    RecentLogGuard, Result, StatsBook,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// One log submission as the caller describes it
#[derive(Clone, Debug)]
pub struct LogRequest {
    pub habit_id: String,
    pub value: f64,
    pub intensity: f64,
    pub note: Option<String>,
    /// Attribute the log to this logical date instead of today (backfill)
    pub backdate: Option<NaiveDate>,
    /// Caller-supplied id for retry-safe resubmission; generated when absent
    pub id: Option<Uuid>,
}

impl LogRequest {
    pub fn new(habit_id: impl Into<String>, value: f64) -> Self {
        Self {
            habit_id: habit_id.into(),
            value,
            intensity: 1.0,
            note: None,
            backdate: None,
            id: None,
        }
    }
}

/// Result of a submission
#[derive(Clone, Debug)]
pub enum Outcome {
    Logged(LoggedOutcome),
    /// The id was already submitted within the idempotency window
    Duplicate { id: Uuid },
}

#[derive(Clone, Debug)]
pub struct LoggedOutcome {
    pub payload: LogPayload,
    pub stats: HabitStats,
    pub earned_xp: f64,
    /// False when the sink append failed; the stats were still applied
    pub synced: bool,
}

/// Stateful driver for optimistic log submissions
pub struct Engine {
    catalog: HabitCatalog,
    book: StatsBook,
    guard: RecentLogGuard,
    day_start_offset_hours: i64,
}

impl Engine {
    pub fn new(catalog: HabitCatalog, book: StatsBook, config: &EngineConfig) -> Self {
        Self {
            catalog,
            book,
            guard: RecentLogGuard::new(config.idempotency_window()),
            day_start_offset_hours: config.day_start_offset_hours,
        }
    }

    pub fn catalog(&self) -> &HabitCatalog {
        &self.catalog
    }

    pub fn book(&self) -> &StatsBook {
        &self.book
    }

    /// Hand back the stats book, e.g. to persist it after submissions
    pub fn into_book(self) -> StatsBook {
        self.book
    }

    /// Submit one log: guard, reduce, apply, append
    ///
    /// Returns `Outcome::Duplicate` when the request's id was seen within
    /// the idempotency window. Errors only on caller mistakes (unknown
    /// habit, non-positive value for a measured metric); sink failures are
    /// reported through `LoggedOutcome::synced`, never as an error, and
    /// never roll back the optimistic stats.
    pub fn submit_log(&mut self, request: LogRequest, sink: &mut dyn LogSink) -> Result<Outcome> {
        let habit = self
            .catalog
            .get(&request.habit_id)
            .ok_or_else(|| Error::Engine(format!("unknown habit '{}'", request.habit_id)))?
            .clone();

        if habit.metric != Metric::Boolean
            && !(request.value.is_finite() && request.value > 0.0)
        {
            return Err(Error::Engine(format!(
                "habit '{}' needs a positive value",
                habit.id
            )));
        }

        if !habit.active {
            tracing::warn!("Logging against archived habit '{}'", habit.id);
        }

        let id = request.id.unwrap_or_else(Uuid::new_v4);
        if self.guard.seen(id) {
            return Ok(Outcome::Duplicate { id });
        }

        let now = Utc::now();
        let today = calendar::logical_date(Some(now), self.day_start_offset_hours);
        let logical_date = request
            .backdate
            .or(today)
            .unwrap_or_else(|| now.date_naive());

        let payload = LogPayload {
            id,
            timestamp: now,
            logical_date,
            habit_id: habit.id.clone(),
            value: request.value,
            intensity: request.intensity,
            note: request.note,
        };

        let current = self.book.get_or_default(&habit.id);
        let result = reducer::reduce(&current, &habit, &payload, today);
        self.book.insert(habit.id.clone(), result.stats.clone());

        let synced = match sink.append(&payload) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Failed to append log {} to sink: {}. Stats kept locally.",
                    payload.id,
                    e
                );
                false
            }
        };

        tracing::info!(
            "Logged {} for habit '{}': +{:.1} xp, streak {}",
            payload.id,
            habit.id,
            result.earned_xp,
            result.stats.streak
        );

        Ok(Outcome::Logged(LoggedOutcome {
            payload,
            stats: result.stats,
            earned_xp: result.earned_xp,
            synced,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_starter_catalog;

    /// In-memory sink for tests
    #[derive(Default)]
    struct MemorySink {
        logs: Vec<LogPayload>,
    }

    impl LogSink for MemorySink {
        fn append(&mut self, log: &LogPayload) -> Result<()> {
            self.logs.push(log.clone());
            Ok(())
        }
    }

    /// Sink that always fails, to exercise the unsynced path
    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn append(&mut self, _log: &LogPayload) -> Result<()> {
            Err(Error::Other("disk on fire".into()))
        }
    }

    fn test_engine() -> Engine {
        Engine::new(
            build_starter_catalog(),
            StatsBook::default(),
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_submit_applies_stats_and_appends() {
        let mut engine = test_engine();
        let mut sink = MemorySink::default();

        let outcome = engine
            .submit_log(LogRequest::new("pushups", 10.0), &mut sink)
            .unwrap();

        match outcome {
            Outcome::Logged(logged) => {
                assert!(logged.synced);
                // Starter pushups multiplier is 5
                assert_eq!(logged.earned_xp, 50.0);
                assert_eq!(logged.stats.streak, 1);
                assert_eq!(logged.stats.total_volume, 10.0);
            }
            Outcome::Duplicate { .. } => panic!("fresh id flagged as duplicate"),
        }

        assert_eq!(sink.logs.len(), 1);
        assert_eq!(engine.book().stats["pushups"].total_volume, 10.0);
    }

    #[test]
    fn test_resubmitted_id_is_suppressed() {
        let mut engine = test_engine();
        let mut sink = MemorySink::default();
        let id = Uuid::new_v4();

        let mut request = LogRequest::new("floss", 1.0);
        request.id = Some(id);

        let first = engine.submit_log(request.clone(), &mut sink).unwrap();
        assert!(matches!(first, Outcome::Logged(_)));

        let second = engine.submit_log(request, &mut sink).unwrap();
        assert!(matches!(second, Outcome::Duplicate { id: dup } if dup == id));

        // The duplicate neither re-applied stats nor re-appended
        assert_eq!(sink.logs.len(), 1);
        assert_eq!(engine.book().stats["floss"].total_volume, 1.0);
    }

    #[test]
    fn test_unknown_habit_is_rejected() {
        let mut engine = test_engine();
        let mut sink = MemorySink::default();

        let result = engine.submit_log(LogRequest::new("no_such_habit", 1.0), &mut sink);
        assert!(matches!(result, Err(Error::Engine(_))));
        assert!(sink.logs.is_empty());
    }

    #[test]
    fn test_non_positive_value_rejected_for_measured_metric() {
        let mut engine = test_engine();
        let mut sink = MemorySink::default();

        let result = engine.submit_log(LogRequest::new("pushups", 0.0), &mut sink);
        assert!(matches!(result, Err(Error::Engine(_))));
    }

    #[test]
    fn test_boolean_habit_ignores_value() {
        let mut engine = test_engine();
        let mut sink = MemorySink::default();

        // Value 0 would be rejected for a measured metric; booleans count as 1
        let outcome = engine
            .submit_log(LogRequest::new("floss", 0.0), &mut sink)
            .unwrap();

        match outcome {
            Outcome::Logged(logged) => {
                assert_eq!(logged.stats.total_volume, 1.0);
                assert_eq!(logged.earned_xp, 25.0);
            }
            Outcome::Duplicate { .. } => panic!("unexpected duplicate"),
        }
    }

    #[test]
    fn test_backdated_log_does_not_start_live_streak() {
        let mut engine = test_engine();
        let mut sink = MemorySink::default();

        let mut request = LogRequest::new("pushups", 5.0);
        request.backdate = NaiveDate::from_ymd_opt(2020, 1, 1);

        let outcome = engine.submit_log(request, &mut sink).unwrap();
        match outcome {
            Outcome::Logged(logged) => {
                assert_eq!(logged.stats.streak, 0);
                assert_eq!(logged.payload.logical_date, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
                assert!(logged.earned_xp > 0.0);
            }
            Outcome::Duplicate { .. } => panic!("unexpected duplicate"),
        }
    }

    #[test]
    fn test_sink_failure_keeps_optimistic_stats() {
        let mut engine = test_engine();

        let outcome = engine
            .submit_log(LogRequest::new("pushups", 10.0), &mut BrokenSink)
            .unwrap();

        match outcome {
            Outcome::Logged(logged) => assert!(!logged.synced),
            Outcome::Duplicate { .. } => panic!("unexpected duplicate"),
        }

        // Optimistic state survives the failed append
        assert_eq!(engine.book().stats["pushups"].total_volume, 10.0);
    }
}
