//! Idempotency guard for recently-seen log ids.
//!
//! Suppresses duplicate submissions of the same logical action (double
//! taps, a retry that regenerated its UI state but not its log id) within a
//! bounded window. Best-effort and process-local: durable deduplication
//! stays keyed on the log id by whatever consumes the WAL.
//!
//! Expiry is lazy: entries older than the window are swept on each `seen`
//! call, so no background timer is needed.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default suppression window (5 minutes)
pub const DEFAULT_IDEMPOTENCY_WINDOW: Duration = Duration::from_secs(300);

/// Time-bounded set of recently-seen log ids
#[derive(Debug)]
pub struct RecentLogGuard {
    window: Duration,
    entries: HashMap<Uuid, Instant>,
}

impl Default for RecentLogGuard {
    fn default() -> Self {
        Self::new(DEFAULT_IDEMPOTENCY_WINDOW)
    }
}

impl RecentLogGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Check whether `id` was submitted within the window
    ///
    /// Returns false the first time and remembers the id; true on a repeat
    /// inside the window; false again once the window has elapsed.
    pub fn seen(&mut self, id: Uuid) -> bool {
        self.seen_at(id, Instant::now())
    }

    fn seen_at(&mut self, id: Uuid, now: Instant) -> bool {
        self.entries
            .retain(|_, inserted| now.duration_since(*inserted) < self.window);

        if self.entries.contains_key(&id) {
            tracing::debug!("Suppressing duplicate log id {}", id);
            return true;
        }
        self.entries.insert(id, now);
        false
    }

    /// Number of ids currently tracked (after the last sweep)
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sighting_is_not_a_duplicate() {
        let mut guard = RecentLogGuard::default();
        assert!(!guard.seen(Uuid::new_v4()));
    }

    #[test]
    fn test_immediate_repeat_is_a_duplicate() {
        let mut guard = RecentLogGuard::default();
        let id = Uuid::new_v4();

        assert!(!guard.seen(id));
        assert!(guard.seen(id));
    }

    #[test]
    fn test_distinct_ids_do_not_collide() {
        let mut guard = RecentLogGuard::default();

        assert!(!guard.seen(Uuid::new_v4()));
        assert!(!guard.seen(Uuid::new_v4()));
        assert_eq!(guard.tracked(), 2);
    }

    #[test]
    fn test_id_is_forgotten_after_window() {
        let window = Duration::from_secs(300);
        let mut guard = RecentLogGuard::new(window);
        let id = Uuid::new_v4();
        let t0 = Instant::now();

        assert!(!guard.seen_at(id, t0));
        assert!(guard.seen_at(id, t0 + Duration::from_secs(299)));
        // Window elapsed: the entry is evicted and the id reads fresh again
        assert!(!guard.seen_at(id, t0 + window));
    }

    #[test]
    fn test_sweep_evicts_only_expired_entries() {
        let window = Duration::from_secs(300);
        let mut guard = RecentLogGuard::new(window);
        let old = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        let t0 = Instant::now();

        guard.seen_at(old, t0);
        guard.seen_at(fresh, t0 + Duration::from_secs(200));

        // Sweep at t0+300: `old` expires, `fresh` survives
        assert!(!guard.seen_at(Uuid::new_v4(), t0 + window));
        assert_eq!(guard.tracked(), 2);
        assert!(guard.seen_at(fresh, t0 + Duration::from_secs(301)));
    }
}
