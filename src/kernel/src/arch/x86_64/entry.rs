//! Rust side of the trap entry path.
//!
//! The assembly trampolines save registers into a [`TrapFrame`] on the
//! interrupted stack and call [`int_handler`] with its address.

use super::apic::{LocalApic, LOCAL_APIC};
use super::serial::{SerialConsole, CONSOLE};
use super::X86Processor;
use crate::config::KernelConfig;
use crate::cpu::ONLINE;
use crate::trap::{TrapDispatcher, TrapFrame};

/// Dispatcher shared by every core.
pub static TRAPS: TrapDispatcher<'static, SerialConsole, LocalApic, LocalApic> =
    TrapDispatcher::new(&CONSOLE, &LOCAL_APIC, &LOCAL_APIC, &ONLINE, KernelConfig::DEFAULT.traps);

/// Common trap handler, called by every entry stub.
///
/// Returns to the stub unless the trap stops the core.
///
/// # Safety
///
/// `frame` must point to the frame the calling stub just built.
#[no_mangle]
pub unsafe extern "C" fn int_handler(frame: *mut TrapFrame) {
    // SAFETY: guaranteed by the caller.
    let frame = unsafe { &*frame };
    TRAPS.handle(frame, &X86Processor);
}
