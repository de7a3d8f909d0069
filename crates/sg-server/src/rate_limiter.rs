//! Fixed-window rate limiter backed by a [`CounterStore`].
//!
//! Each client gets one counter per UTC minute. A request is admitted while
//! the window's count is below the ceiling. The comparison and the increment
//! are a single conditional upsert, so concurrent requests cannot overshoot
//! and rejected ones leave the counter untouched.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use sg_core::{CounterStore, Result};

/// Per-client request ceiling over one-minute windows.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    ceiling: AtomicU32,
    retention: Duration,
}

impl RateLimiter {
    /// Create a limiter admitting `ceiling` requests per client per minute,
    /// keeping windows for `retention` before the sweep removes them.
    pub fn new(store: Arc<dyn CounterStore>, ceiling: u32, retention: Duration) -> Self {
        Self {
            store,
            ceiling: AtomicU32::new(ceiling),
            retention,
        }
    }

    /// Current requests-per-minute ceiling.
    pub fn ceiling(&self) -> u32 {
        self.ceiling.load(Ordering::Relaxed)
    }

    /// Replace the ceiling; applies from the next check.
    pub fn set_ceiling(&self, ceiling: u32) {
        self.ceiling.store(ceiling, Ordering::Relaxed);
    }

    /// Check and count a request from `client_id` at the current time.
    pub fn check(&self, client_id: &str) -> Result<bool> {
        self.check_at(client_id, Utc::now())
    }

    /// Check and count a request from `client_id` at `now`.
    ///
    /// Returns `false` without incrementing once the window is full.
    pub fn check_at(&self, client_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let window = window_start(now);
        let ceiling = self.ceiling();

        match self.store.try_increment(client_id, window, ceiling)? {
            Some(count) => {
                tracing::trace!(client_id, count, ceiling, "Request counted");
                Ok(true)
            }
            None => {
                tracing::debug!(client_id, ceiling, "Rate limit exceeded");
                Ok(false)
            }
        }
    }

    /// Requests still available to `client_id` in the window containing `now`.
    pub fn remaining_at(&self, client_id: &str, now: DateTime<Utc>) -> Result<u32> {
        let used = self.store.get(client_id, window_start(now))?;
        Ok(self.ceiling().saturating_sub(used))
    }

    /// Delete windows older than the retention period, relative to `now`.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        self.store.delete_older_than(now - self.retention)
    }
}

/// Start of the UTC minute containing `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::minutes(1)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sg_db::pool::init_memory_pool;
    use sg_db::store::SqliteCounterStore;

    fn limiter(ceiling: u32) -> RateLimiter {
        let store = Arc::new(SqliteCounterStore::new(init_memory_pool().unwrap()));
        RateLimiter::new(store, ceiling, Duration::hours(24))
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, h, m, s).unwrap()
    }

    #[test]
    fn window_truncates_to_minute() {
        assert_eq!(window_start(at(10, 0, 59)), at(10, 0, 0));
        assert_eq!(window_start(at(10, 1, 0)), at(10, 1, 0));
    }

    #[test]
    fn admits_up_to_ceiling_then_rejects() {
        let rl = limiter(3);
        let outcomes: Vec<bool> = [1, 15, 45, 50]
            .iter()
            .map(|&s| rl.check_at("ip_a", at(10, 0, s)).unwrap())
            .collect();
        assert_eq!(outcomes, vec![true, true, true, false]);
    }

    #[test]
    fn rejection_does_not_increment() {
        let rl = limiter(2);
        for _ in 0..10 {
            rl.check_at("ip_a", at(10, 0, 5)).unwrap();
        }
        assert_eq!(rl.store.get("ip_a", at(10, 0, 0)).unwrap(), 2);
        assert_eq!(rl.remaining_at("ip_a", at(10, 0, 30)).unwrap(), 0);
    }

    #[test]
    fn exactly_ceiling_admitted_for_any_overflow() {
        let rl = limiter(5);
        let admitted = (0..17)
            .filter(|_| rl.check_at("ip_a", at(9, 30, 10)).unwrap())
            .count();
        assert_eq!(admitted, 5);
    }

    #[test]
    fn next_window_is_fresh() {
        let rl = limiter(2);
        assert!(rl.check_at("ip_a", at(10, 0, 1)).unwrap());
        assert!(rl.check_at("ip_a", at(10, 0, 2)).unwrap());
        assert!(!rl.check_at("ip_a", at(10, 0, 3)).unwrap());

        assert!(rl.check_at("ip_a", at(10, 1, 0)).unwrap());
        assert!(rl.check_at("ip_a", at(10, 1, 59)).unwrap());
        assert!(!rl.check_at("ip_a", at(10, 1, 59)).unwrap());
    }

    #[test]
    fn clients_are_independent() {
        let rl = limiter(1);
        assert!(rl.check_at("ip_a", at(10, 0, 0)).unwrap());
        assert!(!rl.check_at("ip_a", at(10, 0, 1)).unwrap());
        assert!(rl.check_at("ip_b", at(10, 0, 1)).unwrap());
    }

    #[test]
    fn ceiling_can_be_raised_at_runtime() {
        let rl = limiter(1);
        assert!(rl.check_at("ip_a", at(10, 0, 0)).unwrap());
        assert!(!rl.check_at("ip_a", at(10, 0, 1)).unwrap());
        rl.set_ceiling(2);
        assert!(rl.check_at("ip_a", at(10, 0, 2)).unwrap());
        assert_eq!(rl.ceiling(), 2);
    }

    #[test]
    fn zero_ceiling_rejects_everything() {
        let rl = limiter(0);
        assert!(!rl.check_at("ip_a", at(10, 0, 0)).unwrap());
    }

    #[test]
    fn concurrent_checks_admit_exactly_ceiling() {
        use std::sync::Barrier;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.db");
        let pool = sg_db::pool::init_pool(&path.to_string_lossy()).unwrap();
        let rl = Arc::new(RateLimiter::new(
            Arc::new(SqliteCounterStore::new(pool)),
            1,
            Duration::hours(24),
        ));

        for round in 0..20 {
            let client = format!("ip_round_{round}");
            let barrier = Arc::new(Barrier::new(8));
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let rl = Arc::clone(&rl);
                    let barrier = Arc::clone(&barrier);
                    let client = client.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        rl.check_at(&client, at(10, 0, 30)).unwrap()
                    })
                })
                .collect();
            let admitted = handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|&ok| ok)
                .count();
            assert_eq!(admitted, 1, "round {round}");
        }
    }

    #[test]
    fn sweep_removes_windows_past_retention() {
        let rl = limiter(10);
        let now = at(12, 0, 0);
        rl.check_at("ip_a", now - Duration::hours(25)).unwrap();
        rl.check_at("ip_a", now - Duration::hours(23)).unwrap();
        rl.check_at("ip_a", now).unwrap();

        assert_eq!(rl.sweep(now).unwrap(), 1);
        assert_eq!(rl.remaining_at("ip_a", now).unwrap(), 9);
    }
}
