//! Cross-core synchronization primitives.
//!
//! These are the only coordination tools available before any scheduler
//! exists. Every wait is a busy spin on the calling core: there is no
//! yielding, no timeout and no fairness. A participant that never shows up
//! leaves the others spinning forever.
//!
//! # Primitives
//!
//! - [`SpinLock`]: bare lock word with `lock`/`try_lock`/`unlock`
//! - [`SpinMutex<T>`]: data-owning lock with an RAII guard
//! - [`Barrier`]: cyclic rendezvous for a fixed number of cores
//! - [`Flag`]: counting handoff pairing each signal with exactly one wait
//!
//! # Example
//!
//! ```ignore
//! use tandem_kernel::sync::{Barrier, Flag};
//!
//! static START: Barrier = Barrier::new(4);
//! static READY: Flag = Flag::new();
//!
//! // on every core
//! START.wait();
//!
//! // producer core
//! READY.signal();
//! // consumer core
//! READY.wait();
//! ```

mod barrier;
mod flag;
mod mutex;

pub use barrier::{Barrier, BarrierWaitResult};
pub use flag::Flag;
pub use mutex::{SpinLock, SpinMutex, SpinMutexGuard};
