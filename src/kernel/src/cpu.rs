//! Online-core bookkeeping.

use core::sync::atomic::{AtomicU32, Ordering};

/// Kernel-wide count of cores that have finished bring-up.
///
/// The bootstrap core counts itself; each secondary core calls
/// [`OnlineCpus::mark_online`] once it is ready.
pub static ONLINE: OnlineCpus = OnlineCpus::new(1);

/// Shared counter of active cores.
///
/// Readers tolerate a stale value: the count only decides whether console
/// output needs locking and is shown in diagnostics.
pub struct OnlineCpus {
    count: AtomicU32,
}

impl OnlineCpus {
    /// Create a counter starting at `count`.
    pub const fn new(count: u32) -> Self {
        Self {
            count: AtomicU32::new(count),
        }
    }

    /// Current number of active cores.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Register the calling core. Returns the count including the caller.
    pub fn mark_online(&self) -> u32 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Put back a value captured earlier with [`count`](OnlineCpus::count).
    pub fn restore(&self, count: u32) {
        self.count.store(count, Ordering::Release);
    }
}
