//! Clocks and deadline timers.
//!
//! # Responsibility
//! - Provide wall-clock time as epoch milliseconds.
//! - Keep scheduled deadlines that a single-threaded driver drains.
//!
//! # Invariants
//! - Timer ids are never reused within one `TimerQueue`.
//! - `drain_due` returns timers ordered by deadline, then by id.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

/// Source of the current time in Unix epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for tests and replay.
///
/// Clones share the same time, so a driver can keep a handle while the
/// service owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by_ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now_ms.set(self.now_ms.get().saturating_add(by_ms));
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

/// Handle of a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Schedules and cancels one-shot deadlines.
pub trait TimerScheduler {
    /// Schedules a timer firing at `deadline_ms`.
    fn schedule_at(&mut self, deadline_ms: i64) -> TimerId;
    /// Cancels a pending timer; returns whether it was still pending.
    fn cancel(&mut self, id: TimerId) -> bool;
}

/// Pending deadlines owned by the event loop.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<TimerId, i64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<i64> {
        self.pending.values().copied().min()
    }

    /// Removes and returns every timer whose deadline is `<= now_ms`.
    pub fn drain_due(&mut self, now_ms: i64) -> Vec<TimerId> {
        let mut due: Vec<(i64, TimerId)> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now_ms)
            .map(|(id, deadline)| (*deadline, *id))
            .collect();
        due.sort();
        for (_, id) in &due {
            self.pending.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }
}

impl TimerScheduler for TimerQueue {
    fn schedule_at(&mut self, deadline_ms: i64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, deadline_ms);
        id
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }
}
