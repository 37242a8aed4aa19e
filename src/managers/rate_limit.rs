use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

struct WindowEntry {
    count: u32,
    window_reset: Instant,
}

/// Fixed-window request counter keyed by caller identity.
///
/// Each key gets `limit` accepted calls per window; the counter resets at
/// discrete window boundaries rather than sliding, so a burst straddling a
/// boundary can briefly exceed the nominal rate. A denied call does not
/// mutate the counter.
///
/// State is process-local and never evicted. Each guard actor owns its own
/// limiter and actors handle messages one at a time, which is what makes the
/// check-and-increment sequence safe without extra locking. A multi-process
/// deployment would need to move this state into a shared expiring store.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    entries: HashMap<String, WindowEntry>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            entries: HashMap::new(),
        }
    }

    /// Checks and counts a call for `key` at the current time.
    pub fn check(&mut self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&mut self, key: &str, now: Instant) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if now <= entry.window_reset => {
                if entry.count >= self.limit {
                    debug!(key, "rate limit exceeded");
                    return false;
                }
                entry.count += 1;
                true
            }
            _ => {
                self.entries.insert(
                    key.to_owned(),
                    WindowEntry {
                        count: 1,
                        window_reset: now + self.window,
                    },
                );
                true
            }
        }
    }
}
