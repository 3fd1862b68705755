//! Tandem Hardware Abstraction Layer (HAL) traits.
//!
//! This crate defines traits for the collaborators the trap and
//! synchronization core consumes but does not implement: text output, the
//! interrupt controller, core identity, the descriptor table and the
//! assembly entry stubs.

#![no_std]

/// Trait for a text-based console output.
pub trait Console {
    /// Writes a string to the console.
    fn write_str(&mut self, s: &str);
}

/// Trait for acknowledging interrupts.
pub trait InterruptController {
    /// Signals the end of the interrupt currently being serviced on this core.
    fn end_of_interrupt(&self);
}

/// Trait for querying which core is executing.
pub trait CpuIdentity {
    /// Returns the numeric id of the calling core.
    fn current_cpu_id(&self) -> u32;
}

/// Address of an assembly entry stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntryPoint(pub usize);

/// Trait for the table the processor consults when a vector fires.
pub trait DescriptorTable {
    /// Programs a single gate.
    fn install(&mut self, vector: u8, entry: EntryPoint, selector: u16, access: u8);
}

/// Trait for the set of entry stubs that capture a trap frame.
pub trait TrapStubs {
    /// Returns the stub for `vector`.
    fn entry_point(&self, vector: u8) -> EntryPoint;
}

/// Trait for stopping the current core.
pub trait Processor {
    /// Parks the calling core forever.
    fn halt_forever(&self) -> !;
}
