//! Hero profile math: global experience and level progression.
//!
//! Levels follow a quadratic curve: reaching level `n` requires
//! `(n - 1)^2 * 100` total experience, so each level costs more than the
//! last. Level 1 is the floor; there is no level 0.

use crate::StatsBook;

/// Total experience across every habit, active or not
pub fn global_xp(book: &StatsBook) -> f64 {
    book.stats
        .values()
        .map(|s| if s.total_xp.is_finite() { s.total_xp } else { 0.0 })
        .sum()
}

/// Level reached with the given total experience
pub fn level_for_xp(xp: f64) -> u32 {
    let xp = if xp.is_finite() { xp.max(0.0) } else { 0.0 };
    (xp / 100.0).sqrt().floor() as u32 + 1
}

/// Total experience required to reach a level
pub fn level_threshold(level: u32) -> f64 {
    let prior = level.saturating_sub(1) as f64;
    prior * prior * 100.0
}

/// Progress through the current level, as a percentage in [0, 100]
pub fn level_progress(xp: f64) -> f64 {
    let xp = if xp.is_finite() { xp.max(0.0) } else { 0.0 };
    let level = level_for_xp(xp);
    let floor = level_threshold(level);
    let ceiling = level_threshold(level + 1);
    ((xp - floor) / (ceiling - floor) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HabitStats;

    #[test]
    fn test_fresh_player_is_level_one() {
        assert_eq!(level_for_xp(0.0), 1);
        assert_eq!(level_for_xp(99.9), 1);
    }

    #[test]
    fn test_level_thresholds() {
        assert_eq!(level_threshold(1), 0.0);
        assert_eq!(level_threshold(2), 100.0);
        assert_eq!(level_threshold(3), 400.0);
        assert_eq!(level_threshold(4), 900.0);
    }

    #[test]
    fn test_level_up_at_threshold() {
        assert_eq!(level_for_xp(100.0), 2);
        assert_eq!(level_for_xp(399.0), 2);
        assert_eq!(level_for_xp(400.0), 3);
    }

    #[test]
    fn test_progress_within_level() {
        // Level 2 spans 100..400; 250 xp is halfway
        assert_eq!(level_progress(250.0), 50.0);
        assert_eq!(level_progress(0.0), 0.0);
    }

    #[test]
    fn test_global_xp_sums_all_habits() {
        let mut book = StatsBook::default();
        book.insert(
            "a",
            HabitStats {
                total_xp: 120.0,
                ..Default::default()
            },
        );
        book.insert(
            "b",
            HabitStats {
                total_xp: 30.0,
                ..Default::default()
            },
        );

        assert_eq!(global_xp(&book), 150.0);
        assert_eq!(level_for_xp(global_xp(&book)), 2);
    }

    #[test]
    fn test_bad_xp_is_ignored() {
        assert_eq!(level_for_xp(f64::NAN), 1);
        assert_eq!(level_progress(-10.0), 0.0);
    }
}
