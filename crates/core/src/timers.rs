use std::time::{Duration, Instant};

/// Single-shot timers fired from the foreground loop
///
/// Nothing fires on its own: the owner calls [`TimerQueue::take_due`] from the
/// same context that mutates panel state, so timer work is serialized with
/// user input. Entries due at the same instant fire in insertion order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    entries: Vec<TimerEntry<T>>,
    next_seq: u64,
}

#[derive(Debug)]
struct TimerEntry<T> {
    due: Instant,
    seq: u64,
    payload: T,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire `delay` after `now`
    pub fn schedule(&mut self, now: Instant, delay: Duration, payload: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(TimerEntry {
            due: now + delay,
            seq,
            payload,
        });
    }

    /// Remove and return every payload due at or before `now`, in firing order
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|e| e.due <= now);
        self.entries = pending;

        due.sort_by_key(|e| (e.due, e.seq));
        due.into_iter().map(|e| e.payload).collect()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Drop every pending timer, returning how many were cancelled
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.entries.len();
        self.entries.clear();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
