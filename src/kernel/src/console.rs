//! Serialized console output shared by all cores.
//!
//! A [`SerializedConsole`] owns the output device and writes whole blocks of
//! text under one [`SpinLock`] acquisition, so diagnostics from cores that
//! fault at the same time come out one block after another instead of
//! character by character.
//!
//! The lock is only taken when more than one core is online. Early boot
//! output, and a fault on the bootstrap core before secondaries start, never
//! touch the lock.
//!
//! The lock remembers which core holds it. A block opened by the holding
//! core itself, such as a trap taken in the middle of a log line, writes
//! straight through instead of spinning on its own lock.

use core::{
    cell::UnsafeCell,
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use tandem_hal::Console;

use crate::sync::SpinLock;

const NO_OWNER: u32 = u32::MAX;

/// An output device shared between cores.
pub struct SerializedConsole<W> {
    lock: SpinLock,
    owner: AtomicU32,
    device: UnsafeCell<W>,
}

// Safety: with more than one core online `device` is only reached while
// `lock` is held, or by the holding core re-entering from a trap. With a
// single core online there is no second writer.
unsafe impl<W: Send> Sync for SerializedConsole<W> {}
unsafe impl<W: Send> Send for SerializedConsole<W> {}

impl<W> SerializedConsole<W> {
    /// Wrap an output device.
    pub const fn new(device: W) -> Self {
        Self {
            lock: SpinLock::new(),
            owner: AtomicU32::new(NO_OWNER),
            device: UnsafeCell::new(device),
        }
    }

    /// Consume the console and return the device.
    pub fn into_inner(self) -> W {
        self.device.into_inner()
    }

    /// The core currently holding the console lock, if any.
    pub fn owner(&self) -> Option<u32> {
        match self.owner.load(Ordering::Relaxed) {
            NO_OWNER => None,
            cpu => Some(cpu),
        }
    }
}

impl<W: Console> SerializedConsole<W> {
    /// Run `f` with exclusive use of the device for one block of output.
    ///
    /// `online` is the caller's view of the active-core count and `cpu` the
    /// calling core. A call nested inside a block already held by `cpu` runs
    /// without taking the lock again.
    pub fn block<R>(
        &self,
        online: u32,
        cpu: u32,
        f: impl FnOnce(&mut ConsoleWriter<'_, W>) -> R,
    ) -> R {
        let _guard = BlockGuard::acquire(self, online > 1, cpu);
        // Safety: see the `Sync` impl. A nested block runs on the holding
        // core while the outer one is suspended, and the outer writer is not
        // touched again until this one is gone.
        let device = unsafe { &mut *self.device.get() };
        f(&mut ConsoleWriter { device })
    }

    /// Write one formatted fragment.
    pub fn print(&self, online: u32, cpu: u32, args: fmt::Arguments<'_>) {
        self.block(online, cpu, |out| {
            let _ = fmt::Write::write_fmt(out, args);
        });
    }
}

/// Formatting access to the device for the duration of a block.
pub struct ConsoleWriter<'a, W> {
    device: &'a mut W,
}

impl<W: Console> fmt::Write for ConsoleWriter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.device.write_str(s);
        Ok(())
    }
}

/// Releases the console lock if this block took it.
struct BlockGuard<'a> {
    lock: Option<(&'a SpinLock, &'a AtomicU32)>,
}

impl<'a> BlockGuard<'a> {
    fn acquire<W>(console: &'a SerializedConsole<W>, contended: bool, cpu: u32) -> Self {
        // Only `cpu` itself ever stores `cpu` into `owner`, so a stale read
        // can never match.
        if !contended || console.owner.load(Ordering::Relaxed) == cpu {
            return Self { lock: None };
        }
        console.lock.lock();
        console.owner.store(cpu, Ordering::Relaxed);
        Self {
            lock: Some((&console.lock, &console.owner)),
        }
    }
}

impl Drop for BlockGuard<'_> {
    fn drop(&mut self) {
        if let Some((lock, owner)) = self.lock {
            owner.store(NO_OWNER, Ordering::Relaxed);
            // Safety: `acquire` locked it.
            unsafe { lock.unlock() }
        }
    }
}
