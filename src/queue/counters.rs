use crate::sync::atomic::{AtomicI64, Ordering::Relaxed};

/// Current and cumulative item counts of a queue.
///
/// Purely informational, never used to synchronise anything,
/// hence relaxed ordering throughout.
pub(super) struct Counters {
    size: AtomicI64,
    total: AtomicI64,
}

impl Counters {
    pub(super) fn new() -> Self {
        Self {
            size: AtomicI64::new(0),
            total: AtomicI64::new(0),
        }
    }

    /// Records an item accepted into the backlog.
    pub(super) fn accepted(&self) {
        self.total.fetch_add(1, Relaxed);
        self.size.fetch_add(1, Relaxed);
    }

    /// Records an item handed to a consumer.
    pub(super) fn delivered(&self) {
        self.size.fetch_sub(1, Relaxed);
    }

    /// Returns `(size, total)`.
    ///
    /// A consumer can record its delivery before the producer of the same
    /// item records acceptance, so `size` is clamped at zero.
    pub(super) fn load(&self) -> (i64, i64) {
        let size = self.size.load(Relaxed);
        let total = self.total.load(Relaxed);
        (size.max(0), total)
    }
}
