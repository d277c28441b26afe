//! Optimistic stats reducer.
//!
//! `reduce` takes a habit's current aggregate statistics and one newly
//! submitted log payload and returns the updated aggregate plus the
//! experience the log earned. It runs before any durable write confirms, so
//! it never fails: malformed numeric input degrades to zero contribution
//! instead of blocking the caller.

use crate::{Habit, HabitStats, LogPayload, Metric};
use chrono::NaiveDate;

/// Result of applying one log payload to a habit's stats
#[derive(Clone, Debug, PartialEq)]
pub struct Reduction {
    pub stats: HabitStats,
    /// Experience earned by this log; caller feedback only, not persisted
    pub earned_xp: f64,
}

/// Apply a log payload to the habit's current stats
///
/// `today` is the current logical date, computed by the caller via the
/// calendar (`None` when no clock is available). The payload's
/// `logical_date` is authoritative and is never re-derived from its
/// timestamp here.
///
/// Streak transitions, comparing the payload date L against the prior
/// anchor P and today T:
/// - P absent: streak becomes 1 only if L == T. A backfilled first entry
///   does not start a live streak.
/// - L == P: multiple logs on one logical day do not inflate the streak.
/// - L is the day after P: streak += 1.
/// - L is 2+ days after P: reset to 1 if L == T; a backfill into a past gap
///   leaves the streak unchanged, since it cannot repair a broken chain
///   without replaying the full history.
/// - L before P: no streak change; the log still contributes xp and volume.
pub fn reduce(
    current: &HabitStats,
    habit: &Habit,
    payload: &LogPayload,
    today: Option<NaiveDate>,
) -> Reduction {
    let mut stats = current.clone();

    let value = match habit.metric {
        Metric::Boolean => 1.0,
        _ => coerce_value(payload.value),
    };
    let earned_xp = value * coerce_multiplier(habit.xp_multiplier) * coerce_intensity(payload.intensity);

    stats.total_volume += value;
    stats.total_xp += earned_xp;

    let log_date = payload.logical_date;
    match stats.last_log_date {
        None => {
            if today == Some(log_date) {
                stats.streak = 1;
            }
        }
        Some(prev) => {
            let diff_days = (log_date - prev).num_days();
            if diff_days == 1 {
                stats.streak += 1;
            } else if diff_days > 1 && today == Some(log_date) {
                stats.streak = 1;
            }
        }
    }

    stats.best_streak = stats.best_streak.max(stats.streak);

    // Backfilled logs must not regress the anchor
    if stats.last_log_date.map_or(true, |prev| log_date >= prev) {
        stats.last_log_date = Some(log_date);
    }

    Reduction { stats, earned_xp }
}

fn coerce_value(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn coerce_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        0.0
    }
}

fn coerce_intensity(intensity: f64) -> f64 {
    if intensity.is_finite() && intensity > 0.0 {
        intensity
    } else {
        1.0
    }
}
