//! Arena of pending one-shot timers.
//!
//! Timers are grouped so a whole playback schedule or countdown cycle can be
//! dropped in one call. Nothing fires on its own: the owner polls
//! [`TimerRegistry::pop_due`] from its event loop, which makes cancelling and
//! firing mutually exclusive. A cancelled timer leaves the arena immediately
//! and can never be returned by a later poll.

use std::collections::BTreeMap;
use std::time::Duration;

/// Identifies a set of timers that are cancelled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerGroup(pub u64);

/// Handle to a single scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    pub group: TimerGroup,
    seq: u64,
}

#[derive(Debug)]
struct Pending<T> {
    handle: TimerHandle,
    payload: T,
}

#[derive(Debug)]
pub struct TimerRegistry<T> {
    // (due, seq) keeps earliest-first ordering with FIFO for equal due times.
    queue: BTreeMap<(Duration, u64), Pending<T>>,
    next_seq: u64,
    next_group: u64,
}

impl<T> Default for TimerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerRegistry<T> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_seq: 0,
            next_group: 0,
        }
    }

    /// Allocate a fresh group id. Ids are never reused by this registry.
    pub fn new_group(&mut self) -> TimerGroup {
        let group = TimerGroup(self.next_group);
        self.next_group += 1;
        group
    }

    pub fn schedule(&mut self, group: TimerGroup, due: Duration, payload: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let handle = TimerHandle { group, seq };
        self.queue.insert((due, seq), Pending { handle, payload });
        handle
    }

    /// Cancel one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self
            .queue
            .iter()
            .find(|(_, p)| p.handle == handle)
            .map(|(k, _)| *k);
        match key {
            Some(k) => self.queue.remove(&k).is_some(),
            None => false,
        }
    }

    /// Cancel every pending timer in `group`. Returns how many were dropped.
    pub fn cancel_group(&mut self, group: TimerGroup) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, p| p.handle.group != group);
        before - self.queue.len()
    }

    /// Drop everything. Returns how many timers were pending.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Remove and return the earliest timer whose due time is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, T)> {
        let key = *self.queue.keys().next()?;
        if key.0 > now {
            return None;
        }
        self.queue
            .remove(&key)
            .map(|pending| (pending.handle, pending.payload))
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_in(&self, group: TimerGroup) -> usize {
        self.queue
            .values()
            .filter(|p| p.handle.group == group)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
