//! Counting handoff between cores.

use core::{
    hint::spin_loop,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Matches every [`signal`](Flag::signal) with exactly one
/// [`wait`](Flag::wait) or successful [`try_wait`](Flag::try_wait).
///
/// Signals accumulate, so a producer may run ahead of its consumers. Both
/// counters only grow; `consumed` never passes `signaled`.
pub struct Flag {
    signaled: AtomicUsize,
    consumed: AtomicUsize,
}

impl Flag {
    /// Create a flag with no pending signals.
    pub const fn new() -> Self {
        Self {
            signaled: AtomicUsize::new(0),
            consumed: AtomicUsize::new(0),
        }
    }

    /// Zero both counters. No core may be waiting while this runs.
    pub fn init(&self) {
        self.consumed.store(0, Ordering::Relaxed);
        self.signaled.store(0, Ordering::Release);
    }

    /// Publish one signal.
    pub fn signal(&self) {
        self.signaled.fetch_add(1, Ordering::Release);
    }

    /// Spin until a signal is available, then consume it.
    pub fn wait(&self) {
        while !self.try_wait() {
            spin_loop();
        }
    }

    /// Consume a pending signal if there is one.
    ///
    /// Returns `true` if a signal was consumed, `false` if none was pending.
    pub fn try_wait(&self) -> bool {
        loop {
            let (consumed, available) = self.snapshot();
            if available == 0 {
                return false;
            }
            if self
                .consumed
                .compare_exchange_weak(
                    consumed,
                    consumed.wrapping_add(1),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return true;
            }
            // Another core claimed that signal, look again
        }
    }

    /// Signals published but not yet consumed.
    pub fn pending(&self) -> usize {
        self.snapshot().1
    }

    /// `consumed` and the number of signals available on top of it.
    fn snapshot(&self) -> (usize, usize) {
        // Acquire on `consumed` orders the `signaled` load after the claim
        // that produced it, so `signaled` is at least that claim's view.
        let consumed = self.consumed.load(Ordering::Acquire);
        let signaled = self.signaled.load(Ordering::Acquire);
        let available = signaled.wrapping_sub(consumed);
        // A stale `signaled` shows up as a negative distance.
        if (available as isize) <= 0 {
            (consumed, 0)
        } else {
            (consumed, available)
        }
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::new()
    }
}
