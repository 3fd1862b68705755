//! x86_64 architecture support.
//!
//! Serial output, the local APIC, and the entry point the trap stubs call.

pub mod apic;
pub mod entry;
pub mod serial;

pub use apic::LOCAL_APIC;
pub use serial::{CONSOLE, SERIAL};

use tandem_common::SegmentSelector;
use tandem_hal::{DescriptorTable, Processor, TrapStubs};
use x86_64::instructions::segmentation::{Segment, CS};

/// Halts the CPU until the next interrupt.
#[inline]
pub fn hlt() {
    x86_64::instructions::hlt();
}

/// Halts the CPU in an infinite loop.
///
/// Used after unrecoverable errors.
pub fn halt_loop() -> ! {
    loop {
        hlt();
    }
}

/// The executing x86_64 core.
#[derive(Debug, Clone, Copy, Default)]
pub struct X86Processor;

impl Processor for X86Processor {
    fn halt_forever(&self) -> ! {
        x86_64::instructions::interrupts::disable();
        halt_loop()
    }
}

/// Install the boot gate layout using the running code segment.
///
/// Returns the number of gates installed.
pub fn install_trap_vectors<T, S>(table: &mut T, stubs: &S) -> usize
where
    T: DescriptorTable,
    S: TrapStubs,
{
    if x86_64::instructions::interrupts::are_enabled() {
        log::warn!("installing trap vectors with interrupts enabled");
    }
    let selector = SegmentSelector(CS::get_reg().0);
    crate::trap::install_vectors(table, stubs, selector)
}
