//! Local APIC access.
//!
//! Only the two registers the trap path needs: the ID register to tell cores
//! apart in diagnostics, and the EOI register to acknowledge interrupts.

use core::ptr;

use tandem_hal::{CpuIdentity, InterruptController};

/// Architectural default physical base of the local APIC.
pub const DEFAULT_BASE: usize = 0xFEE0_0000;

const ID_REGISTER: usize = 0x20;
const EOI_REGISTER: usize = 0xB0;

/// The local APIC, identity-mapped at boot.
pub static LOCAL_APIC: LocalApic = unsafe { LocalApic::new(DEFAULT_BASE) };

/// Memory-mapped local APIC of the executing core.
///
/// Every core sees its own APIC at the same address, so one value serves all
/// cores.
#[derive(Debug)]
pub struct LocalApic {
    base: usize,
}

impl LocalApic {
    /// # Safety
    ///
    /// `base` must be the mapped, uncached address of the local APIC
    /// register page.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` requires `base` to map the register page.
        unsafe { ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: see `read`.
        unsafe { ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }
}

impl InterruptController for LocalApic {
    fn end_of_interrupt(&self) {
        self.write(EOI_REGISTER, 0);
    }
}

impl CpuIdentity for LocalApic {
    fn current_cpu_id(&self) -> u32 {
        self.read(ID_REGISTER) >> 24
    }
}
