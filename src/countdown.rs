use crate::clock::Clock;
use crate::timers::{TimerGroup, TimerRegistry};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running,
    Expired,
}

/// `M:SS`, minutes unpadded.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// One-second countdown with an expiry callback and a resend flag.
///
/// Each run is its own timer group; starting or resetting drops the previous
/// group before the first tick of the new one is queued, so two tick streams
/// never overlap.
pub struct CountdownTimer {
    clock: Arc<dyn Clock>,
    timers: TimerRegistry<()>,
    cycle: Option<TimerGroup>,
    next_tick_at: Duration,
    total: u32,
    remaining: u32,
    state: CountdownState,
    can_resend: bool,
    on_expire: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownTimer")
            .field("total", &self.total)
            .field("remaining", &self.remaining)
            .field("state", &self.state)
            .field("can_resend", &self.can_resend)
            .finish()
    }
}

impl CountdownTimer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            timers: TimerRegistry::new(),
            cycle: None,
            next_tick_at: Duration::ZERO,
            total: 0,
            remaining: 0,
            state: CountdownState::Idle,
            can_resend: false,
            on_expire: None,
        }
    }

    pub fn on_expire(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_expire = Some(Box::new(callback));
        self
    }

    pub fn start(&mut self, total_seconds: u32) {
        self.cancel_cycle();
        self.total = total_seconds;
        self.remaining = total_seconds;
        self.can_resend = false;

        if total_seconds == 0 {
            self.expire();
            return;
        }

        let group = self.timers.new_group();
        self.next_tick_at = self.clock.now() + TICK;
        self.timers.schedule(group, self.next_tick_at, ());
        self.cycle = Some(group);
        self.state = CountdownState::Running;
        tracing::debug!(total_seconds, group = group.0, "countdown_started");
    }

    /// Start over with a fresh count, e.g. after a resend.
    pub fn reset(&mut self, total_seconds: u32) {
        tracing::debug!(total_seconds, previous = ?self.state, "countdown_reset");
        self.start(total_seconds);
    }

    /// Apply every tick that has come due. Returns how many were applied.
    pub fn poll(&mut self) -> u32 {
        let now = self.clock.now();
        let mut ticks = 0;

        while let Some((handle, ())) = self.timers.pop_due(now) {
            if Some(handle.group) != self.cycle {
                continue;
            }
            self.remaining = self.remaining.saturating_sub(1);
            ticks += 1;

            if self.remaining == 0 {
                self.expire();
                break;
            }
            self.next_tick_at += TICK;
            self.timers.schedule(handle.group, self.next_tick_at, ());
        }
        ticks
    }

    /// Stop ticking without expiring. Nothing fires after this returns.
    pub fn cancel(&mut self) {
        self.cancel_cycle();
        self.timers.clear();
        if self.state == CountdownState::Running {
            self.state = CountdownState::Idle;
        }
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }

    pub fn total_seconds(&self) -> u32 {
        self.total
    }

    pub fn can_resend(&self) -> bool {
        self.can_resend
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn pending_ticks(&self) -> usize {
        self.timers.pending()
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }

    fn cancel_cycle(&mut self) {
        if let Some(group) = self.cycle.take() {
            self.timers.cancel_group(group);
        }
    }

    fn expire(&mut self) {
        self.cancel_cycle();
        self.remaining = 0;
        self.state = CountdownState::Expired;
        self.can_resend = true;
        tracing::debug!(total_seconds = self.total, "countdown_expired");
        if let Some(callback) = self.on_expire.as_mut() {
            callback();
        }
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::cell::Cell;
    use std::rc::Rc;

    fn countdown() -> (CountdownTimer, ManualClock, Rc<Cell<u32>>) {
        let clock = ManualClock::new();
        let expired = Rc::new(Cell::new(0));
        let counter = expired.clone();
        let timer = CountdownTimer::new(Arc::new(clock.clone()))
            .on_expire(move || counter.set(counter.get() + 1));
        (timer, clock, expired)
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(9), "0:09");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(300), "5:00");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn test_starts_idle() {
        let (timer, _, _) = countdown();
        assert_eq!(timer.state(), CountdownState::Idle);
        assert!(!timer.can_resend());
        assert_eq!(timer.pending_ticks(), 0);
    }

    #[test]
    fn test_ticks_once_per_second() {
        let (mut timer, clock, _) = countdown();
        timer.start(5);
        assert_eq!(timer.state(), CountdownState::Running);
        assert_eq!(timer.display(), "0:05");

        clock.advance_ms(999);
        assert_eq!(timer.poll(), 0);
        assert_eq!(timer.remaining_seconds(), 5);

        clock.advance_ms(1);
        assert_eq!(timer.poll(), 1);
        assert_eq!(timer.remaining_seconds(), 4);
        assert_eq!(timer.pending_ticks(), 1);
    }

    #[test]
    fn test_expiry_fires_exactly_once() {
        let (mut timer, clock, expired) = countdown();
        timer.start(5);

        clock.advance(Duration::from_secs(5));
        assert_eq!(timer.poll(), 5);

        assert_eq!(timer.state(), CountdownState::Expired);
        assert_eq!(timer.remaining_seconds(), 0);
        assert!(timer.can_resend());
        assert_eq!(expired.get(), 1);
        assert_eq!(timer.pending_ticks(), 0);

        clock.advance(Duration::from_secs(30));
        assert_eq!(timer.poll(), 0);
        assert_eq!(expired.get(), 1);
    }

    #[test]
    fn test_reset_after_expiry() {
        let (mut timer, clock, expired) = countdown();
        timer.start(2);
        clock.advance(Duration::from_secs(2));
        timer.poll();
        assert_eq!(expired.get(), 1);

        timer.reset(300);
        assert_eq!(timer.state(), CountdownState::Running);
        assert_eq!(timer.remaining_seconds(), 300);
        assert!(!timer.can_resend());
        assert_eq!(timer.display(), "5:00");
        assert_eq!(timer.pending_ticks(), 1);

        clock.advance(Duration::from_secs(10));
        assert_eq!(timer.poll(), 10);
        assert_eq!(timer.remaining_seconds(), 290);
        assert_eq!(expired.get(), 1);
    }

    #[test]
    fn test_reset_mid_run_never_double_ticks() {
        let (mut timer, clock, _) = countdown();
        timer.start(5);
        clock.advance_ms(2_500);
        assert_eq!(timer.poll(), 2);

        timer.reset(5);
        assert_eq!(timer.pending_ticks(), 1);

        // The old cycle would have ticked at 3.0s.
        clock.advance_ms(500);
        assert_eq!(timer.poll(), 0);
        assert_eq!(timer.remaining_seconds(), 5);

        clock.advance_ms(500);
        assert_eq!(timer.poll(), 1);
        assert_eq!(timer.remaining_seconds(), 4);

        // Many resets in a row still leave exactly one pending tick.
        for _ in 0..10 {
            timer.reset(5);
        }
        assert_eq!(timer.pending_ticks(), 1);
        clock.advance_ms(1_000);
        assert_eq!(timer.poll(), 1);
    }

    #[test]
    fn test_zero_seconds_expires_immediately() {
        let (mut timer, _, expired) = countdown();
        timer.start(0);
        assert_eq!(timer.state(), CountdownState::Expired);
        assert!(timer.can_resend());
        assert_eq!(expired.get(), 1);
    }

    #[test]
    fn test_cancel_stops_ticking() {
        let (mut timer, clock, expired) = countdown();
        timer.start(3);
        timer.cancel();
        assert_eq!(timer.state(), CountdownState::Idle);
        assert_eq!(timer.pending_ticks(), 0);

        clock.advance(Duration::from_secs(10));
        assert_eq!(timer.poll(), 0);
        assert_eq!(timer.remaining_seconds(), 3);
        assert_eq!(expired.get(), 0);
    }
}
