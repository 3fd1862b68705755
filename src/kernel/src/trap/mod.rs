//! Trap vector installation and dispatch.
//!
//! Boot calls [`install_vectors`] once, before interrupts are enabled. From
//! then on every fault or interrupt on every core lands in
//! [`TrapDispatcher::handle`] with the frame the entry stub captured.
//!
//! Exceptions (vectors 0..=31) print a diagnostic block and stop the core,
//! except vector 15 which is reported and survived. Interrupts are
//! acknowledged and optionally traced.

mod dispatch;
mod event;
mod vectors;

pub use dispatch::{Disposition, TrapDispatcher};
pub use event::{TrapEvent, TrapFrame};
pub use vectors::{
    install_vectors, GateKind, GateSpec, DEVICE_VECTORS, DEVICE_VECTOR_BASE, GATE_COUNT,
    GATE_LAYOUT, RESERVED_VECTOR, SYSCALL_VECTOR,
};
