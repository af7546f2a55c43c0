//! Deterministic timeouts and intervals
//!
//! The browser's `setTimeout`/`setInterval` replaced by a queue the host
//! drives explicitly: time only moves when [`TimerHandle::advance`] is
//! called. Callbacks receive the [`Document`] so they can update the page,
//! and run with the queue unlocked so they may schedule or clear timers,
//! including their own.
//!
//! Due timers fire in deadline order; ties fire in scheduling order. An
//! interval fires at most [`MAX_CATCH_UP`] times per `advance`; periods
//! missed beyond that are skipped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use slotmap::{new_key_type, SlotMap};

use crate::dom::Document;

new_key_type! {
    /// Handle to a scheduled timeout or interval
    pub struct TimerId;
}

/// Callback invoked when a timer fires
pub type TimerCallback = Box<dyn FnMut(&mut Document) + Send>;

/// Most runs of one interval within a single advance
pub const MAX_CATCH_UP: u32 = 64;

struct TimerEntry {
    deadline: u64,
    /// `Some` for intervals
    period: Option<u64>,
    /// Tie-breaker between equal deadlines
    seq: u64,
    /// Taken out while the callback runs
    callback: Option<TimerCallback>,
    /// Runs during the current advance
    burst: u32,
}

/// The timer queue itself
///
/// Usually accessed through a shared [`TimerHandle`].
#[derive(Default)]
pub struct TimerQueue {
    now: u64,
    next_seq: u64,
    entries: SlotMap<TimerId, TimerEntry>,
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.now)
            .field("pending", &self.entries.len())
            .finish()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    fn insert(&mut self, delay: u64, period: Option<u64>, callback: TimerCallback) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(TimerEntry {
            deadline: self.now.saturating_add(delay),
            period,
            seq,
            callback: Some(callback),
            burst: 0,
        })
    }

    /// Remove a timer; returns whether it was pending
    pub fn clear(&mut self, id: TimerId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of scheduled timers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn begin_advance(&mut self) {
        for entry in self.entries.values_mut() {
            entry.burst = 0;
        }
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline
    fn take_next_due(&mut self, until: u64) -> Option<(TimerId, TimerCallback)> {
        let (id, deadline) = self
            .entries
            .iter()
            .filter(|(_, e)| e.callback.is_some() && e.deadline <= until)
            .min_by_key(|(_, e)| (e.deadline, e.seq))
            .map(|(id, e)| (id, e.deadline))?;

        self.now = self.now.max(deadline);
        let callback = self.entries.get_mut(id)?.callback.take()?;
        Some((id, callback))
    }

    /// Put a fired callback back (intervals) or drop the entry (timeouts)
    ///
    /// A timer cleared while its callback ran is gone already; the callback
    /// is dropped. An interval that hit [`MAX_CATCH_UP`] moves to its first
    /// deadline after `until`.
    fn finish(&mut self, id: TimerId, callback: TimerCallback, until: u64) {
        let seq = self.next_seq;
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        match entry.period {
            Some(period) => {
                entry.burst += 1;
                let mut next = entry.deadline.saturating_add(period);
                if entry.burst >= MAX_CATCH_UP && next <= until {
                    let missed = (until - next) / period + 1;
                    next = next.saturating_add(missed.saturating_mul(period));
                }
                if next <= entry.deadline {
                    // Clock saturated; nothing left to wait for
                    tracing::debug!("interval {:?} dropped at end of time", id);
                    self.entries.remove(id);
                    return;
                }
                entry.deadline = next;
                entry.seq = seq;
                entry.callback = Some(callback);
                self.next_seq += 1;
            }
            None => {
                self.entries.remove(id);
            }
        }
    }
}

/// Shared, cloneable access to a [`TimerQueue`]
#[derive(Clone, Default)]
pub struct TimerHandle {
    queue: Arc<Mutex<TimerQueue>>,
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TimerHandle").field(&*self.queue()).finish()
    }
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking callback never leaves the queue half-updated, so a
    // poisoned lock is still safe to use.
    fn queue(&self) -> MutexGuard<'_, TimerQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current time in milliseconds
    pub fn now(&self) -> u64 {
        self.queue().now()
    }

    /// Run `callback` once, `delay_ms` from now
    pub fn set_timeout<F>(&self, delay_ms: u64, callback: F) -> TimerId
    where
        F: FnMut(&mut Document) + Send + 'static,
    {
        self.queue().insert(delay_ms, None, Box::new(callback))
    }

    /// Run `callback` every `period_ms` (at least 1 ms), first after one period
    pub fn set_interval<F>(&self, period_ms: u64, callback: F) -> TimerId
    where
        F: FnMut(&mut Document) + Send + 'static,
    {
        let period = period_ms.max(1);
        self.queue().insert(period, Some(period), Box::new(callback))
    }

    /// Cancel a timer; unknown or already fired ids are ignored
    pub fn clear(&self, id: TimerId) -> bool {
        self.queue().clear(id)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue().is_pending(id)
    }

    /// Number of scheduled timers
    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    /// Move the clock forward by `elapsed_ms`, firing everything that falls
    /// due on the way
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, elapsed_ms: u64, doc: &mut Document) -> usize {
        let until = {
            let mut queue = self.queue();
            queue.begin_advance();
            queue.now.saturating_add(elapsed_ms)
        };
        let mut fired = 0;
        loop {
            // Guard is released at the end of this statement so the callback
            // can re-enter the queue.
            let next = self.queue().take_next_due(until);
            let Some((id, mut callback)) = next else {
                break;
            };
            callback(doc);
            self.queue().finish(id, callback, until);
            fired += 1;
        }
        let mut queue = self.queue();
        queue.now = queue.now.max(until);
        fired
    }
}
