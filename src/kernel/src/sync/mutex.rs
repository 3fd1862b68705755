//! Spinning mutual exclusion.
//!
//! [`SpinLock`] is the raw lock word; [`SpinMutex`] wraps it around the data
//! it protects and hands out a guard that unlocks on drop.

use core::{
    cell::UnsafeCell,
    hint::spin_loop,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
};

/// A test-and-set lock word.
///
/// Acquisition is unfair: whichever core wins the exchange gets the lock, and
/// a core may starve under contention. Keep critical sections short.
pub struct SpinLock {
    /// false = unlocked, true = locked.
    locked: AtomicBool,
}

impl SpinLock {
    /// Create a new unlocked lock.
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Reset the lock to the unlocked state.
    ///
    /// Only meaningful on a statically allocated lock before any core uses it.
    pub fn init(&self) {
        self.locked.store(false, Ordering::Relaxed);
    }

    /// Spin until the lock is acquired.
    pub fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Wait on a plain load so the cache line is not bounced by failed exchanges.
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    /// Attempt to acquire the lock with a single exchange.
    ///
    /// Returns `true` if the caller now holds the lock.
    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Release the lock.
    ///
    /// # Safety
    ///
    /// The caller must hold the lock. Releasing a lock held by another core
    /// breaks mutual exclusion for whatever it protects.
    pub unsafe fn unlock(&self) {
        debug_assert!(self.is_locked(), "unlock of a lock that is not held");
        self.locked.store(false, Ordering::Release);
    }

    /// Returns `true` while some core holds the lock.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

/// A spinning mutex protecting a value of type `T`.
///
/// # Example
///
/// ```ignore
/// static COUNTER: SpinMutex<u64> = SpinMutex::new(0);
///
/// *COUNTER.lock() += 1;
/// ```
pub struct SpinMutex<T> {
    lock: SpinLock,
    data: UnsafeCell<T>,
}

// Safety: access to `data` only happens through a guard, and a guard only
// exists while `lock` is held.
unsafe impl<T: Send> Send for SpinMutex<T> {}
unsafe impl<T: Send> Sync for SpinMutex<T> {}

impl<T> SpinMutex<T> {
    /// Create a new unlocked mutex protecting the given data.
    pub const fn new(data: T) -> Self {
        Self {
            lock: SpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    /// Spin until the lock is acquired.
    pub fn lock(&self) -> SpinMutexGuard<'_, T> {
        self.lock.lock();
        SpinMutexGuard { mutex: self }
    }

    /// Attempt to acquire the lock without spinning.
    ///
    /// Returns `Some(guard)` if the lock was acquired, `None` if it's held
    /// by another core.
    pub fn try_lock(&self) -> Option<SpinMutexGuard<'_, T>> {
        if self.lock.try_lock() {
            Some(SpinMutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Returns `true` while a guard is alive.
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Consume the mutex and return the data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

/// RAII guard that releases the mutex when dropped.
pub struct SpinMutexGuard<'a, T> {
    mutex: &'a SpinMutex<T>,
}

impl<T> Deref for SpinMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Safety: We hold the lock, so we have exclusive access.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for SpinMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // Safety: We hold the lock, so we have exclusive access.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<T> Drop for SpinMutexGuard<'_, T> {
    fn drop(&mut self) {
        // Safety: the guard is only created after acquiring the lock.
        unsafe { self.mutex.lock.unlock() }
    }
}
