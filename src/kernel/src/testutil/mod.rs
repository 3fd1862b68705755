//! Host-side fakes for the hardware traits.
//!
//! Unit tests run on the build machine with `std`; these stand in for the
//! serial port, the local APIC, the descriptor table and the entry stubs.

use std::string::String;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use tandem_hal::{
    Console, CpuIdentity, DescriptorTable, EntryPoint, InterruptController, Processor, TrapStubs,
};

/// Console that appends everything to a shared buffer. Clones share it.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsole {
    buffer: Arc<Mutex<String>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buffer.lock().unwrap().clone()
    }
}

impl Console for RecordingConsole {
    fn write_str(&mut self, s: &str) {
        self.buffer.lock().unwrap().push_str(s);
    }
}

/// Always reports the same core.
#[derive(Debug, Clone, Copy)]
pub struct FixedCpu(pub u32);

impl CpuIdentity for FixedCpu {
    fn current_cpu_id(&self) -> u32 {
        self.0
    }
}

/// Counts end-of-interrupt signals.
#[derive(Debug, Default)]
pub struct CountingEoi {
    count: AtomicUsize,
}

impl CountingEoi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl InterruptController for CountingEoi {
    fn end_of_interrupt(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// One programmed descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateEntry {
    pub entry: EntryPoint,
    pub selector: u16,
    pub access: u8,
}

/// A 256-slot descriptor table kept in memory.
#[derive(Debug, Clone)]
pub struct RecordingTable {
    slots: Vec<Option<GateEntry>>,
    writes: usize,
}

impl RecordingTable {
    pub fn new() -> Self {
        Self {
            slots: std::vec![None; 256],
            writes: 0,
        }
    }

    pub fn entry(&self, vector: u8) -> Option<GateEntry> {
        self.slots[usize::from(vector)]
    }

    pub fn entries(&self) -> &[Option<GateEntry>] {
        &self.slots
    }

    /// Number of populated slots.
    pub fn installed(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of `install` calls, including rewrites.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl DescriptorTable for RecordingTable {
    fn install(&mut self, vector: u8, entry: EntryPoint, selector: u16, access: u8) {
        self.slots[usize::from(vector)] = Some(GateEntry {
            entry,
            selector,
            access,
        });
        self.writes += 1;
    }
}

/// Entry stubs at made-up, distinct addresses.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticStubs;

impl TrapStubs for SyntheticStubs {
    fn entry_point(&self, vector: u8) -> EntryPoint {
        EntryPoint(0x10_0000 + usize::from(vector) * 16)
    }
}

/// Panics instead of parking, so `#[should_panic]` can observe a halt.
#[derive(Debug, Clone, Copy)]
pub struct PanickingProcessor;

impl Processor for PanickingProcessor {
    fn halt_forever(&self) -> ! {
        panic!("core halted")
    }
}
