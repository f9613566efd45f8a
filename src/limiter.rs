use crate::clock::Clock;
use crate::error::PracticeError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttemptWindow {
    count: u32,
    window_start: Duration,
}

/// Fixed-window attempt counter keyed by an identifier (e.g. an email address).
///
/// A window resets on the first use after it has expired. The map holds at
/// most `capacity` identifiers: when full, expired windows are purged first and
/// then the window that started earliest is evicted.
pub struct AttemptLimiter {
    clock: Arc<dyn Clock>,
    max_attempts: u32,
    window: Duration,
    capacity: usize,
    entries: HashMap<String, AttemptWindow>,
}

impl AttemptLimiter {
    pub fn new(clock: Arc<dyn Clock>, max_attempts: u32, window: Duration, capacity: usize) -> Self {
        Self {
            clock,
            max_attempts: max_attempts.max(1),
            window,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    /// Count an attempt for `id`. Returns how many attempts are left in the
    /// current window, or `RateLimited` once the budget is spent.
    pub fn record(&mut self, id: &str) -> Result<u32, PracticeError> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get_mut(id) {
            if now.saturating_sub(entry.window_start) >= self.window {
                *entry = AttemptWindow {
                    count: 0,
                    window_start: now,
                };
            }
            if entry.count >= self.max_attempts {
                let retry_after = (entry.window_start + self.window).saturating_sub(now);
                tracing::warn!(id, retry_after_ms = retry_after.as_millis() as u64, "attempt_rate_limited");
                return Err(PracticeError::RateLimited { retry_after });
            }
            entry.count += 1;
            return Ok(self.max_attempts - entry.count);
        }

        if self.entries.len() >= self.capacity {
            self.make_room(now);
        }
        self.entries.insert(
            id.to_string(),
            AttemptWindow {
                count: 1,
                window_start: now,
            },
        );
        Ok(self.max_attempts - 1)
    }

    /// Attempts left for `id` without counting one.
    pub fn remaining(&self, id: &str) -> u32 {
        let now = self.clock.now();
        match self.entries.get(id) {
            Some(entry) if now.saturating_sub(entry.window_start) < self.window => {
                self.max_attempts.saturating_sub(entry.count)
            }
            _ => self.max_attempts,
        }
    }

    /// Forget `id`, e.g. after a successful sign-in.
    pub fn reset(&mut self, id: &str) {
        self.entries.remove(id);
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    fn make_room(&mut self, now: Duration) {
        let window = self.window;
        self.entries
            .retain(|_, e| now.saturating_sub(e.window_start) < window);

        if self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.window_start)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                self.entries.remove(&id);
            }
        }
    }
}
