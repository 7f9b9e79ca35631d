use std::collections::VecDeque;
use std::time::Duration;

struct Pending<T> {
    due: Duration,
    item: T,
}

/// Cancellable one-shot timers, advanced explicitly by [`Schedule::tick`].
///
/// Items fire in order of their due time; items due at the same instant fire in insertion order.
pub struct Schedule<T> {
    elapsed: Duration,
    pending: VecDeque<Pending<T>>,
}

impl<T> Default for Schedule<T> {
    fn default() -> Self {
        Schedule {
            elapsed: Duration::ZERO,
            pending: VecDeque::new(),
        }
    }
}

impl<T> Schedule<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `item` to fire `delay` after the current instant.
    pub fn push_after(&mut self, delay: Duration, item: T) {
        let due = self.elapsed.saturating_add(delay);
        let idx = self.pending.partition_point(|x| x.due <= due);
        self.pending.insert(idx, Pending { due, item });
    }

    /// Advances time by `dt` and returns everything that came due, in firing order.
    pub fn tick(&mut self, dt: Duration) -> Vec<T> {
        self.elapsed = self.elapsed.saturating_add(dt);
        let num_fired = self.pending.partition_point(|x| x.due <= self.elapsed);
        self.pending.drain(..num_fired).map(|fired| fired.item).collect()
    }

    /// Drops every pending item. Returns how many were dropped.
    pub fn cancel(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}
