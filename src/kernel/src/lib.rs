//! Tandem SMP kernel core.
//!
//! The pieces every core relies on from the moment it starts executing
//! kernel code, before any scheduler or allocator exists.
//!
//! # Architecture
//!
//! The kernel is structured into the following modules:
//! - `sync`: spin-based cross-core primitives (mutex, barrier, flag)
//! - `trap`: vector installation and the common trap dispatcher
//! - `console`: output shared by all cores without interleaving
//! - `cpu`: online-core bookkeeping
//! - `logger`, `config`: ambient services
//! - `arch`: platform-specific code (serial, local APIC, trap entry)
//!
//! # Safety
//!
//! This is a `#![no_std]` kernel. All unsafe code is documented with safety
//! invariants explaining why the usage is correct.

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod arch;
pub mod config;
pub mod console;
pub mod cpu;
pub mod logger;
pub mod sync;
pub mod trap;

#[cfg(test)]
mod testutil;

/// Initializes core kernel subsystems.
///
/// Called once on the bootstrap core, early in the boot process.
pub fn init() {
    #[cfg(target_arch = "x86_64")]
    {
        arch::x86_64::serial::init();
        let level = config::KernelConfig::DEFAULT.log_level;
        if let Err(err) = logger::init(arch::x86_64::serial::log_sink, level) {
            crate::serial_println!("logger: {}", err);
        }
        log::info!("tandem kernel core up, {} cpu online", cpu::ONLINE.count());
    }
}
