//! The boot-time gate layout and its installer.

use tandem_common::trap::EXCEPTION_VECTORS;
use tandem_common::{ExceptionKind, GateAccess, SegmentSelector, Vector};
use tandem_hal::{DescriptorTable, TrapStubs};

/// Software gate (`int 0x80`).
pub const SYSCALL_VECTOR: u8 = 0x80;

/// Interrupt vector recognized by the dispatcher but not installed or handled yet.
pub const RESERVED_VECTOR: u8 = 0x3F;

/// First device/IPI gate.
pub const DEVICE_VECTOR_BASE: u8 = 0xA0;

/// Number of device/IPI gates starting at [`DEVICE_VECTOR_BASE`].
pub const DEVICE_VECTORS: u8 = 10;

/// Number of gates installed at boot.
pub const GATE_COUNT: usize = EXCEPTION_VECTORS as usize + 1 + DEVICE_VECTORS as usize;

/// What a gate is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    /// Vectors 0..=31.
    Exception(ExceptionKind),
    /// [`SYSCALL_VECTOR`].
    Software,
    /// Device/IPI gate `n`, on vector `DEVICE_VECTOR_BASE + n`.
    Device(u8),
}

/// One gate of the boot layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateSpec {
    /// Table slot.
    pub vector: Vector,
    /// Purpose of the gate.
    pub kind: GateKind,
    /// Access byte programmed into the descriptor.
    pub access: GateAccess,
}

impl GateSpec {
    const fn exception(vector: u8) -> Self {
        let kind = match ExceptionKind::from_vector(vector) {
            Some(kind) => kind,
            None => ExceptionKind::Reserved(vector),
        };
        Self {
            vector: Vector(vector),
            kind: GateKind::Exception(kind),
            access: GateAccess::KERNEL_INTERRUPT,
        }
    }

    const fn software() -> Self {
        Self {
            vector: Vector(SYSCALL_VECTOR),
            kind: GateKind::Software,
            access: GateAccess::KERNEL_INTERRUPT,
        }
    }

    // Device gates carry a per-vector access byte equal to the vector number.
    const fn device(n: u8) -> Self {
        Self {
            vector: Vector(DEVICE_VECTOR_BASE + n),
            kind: GateKind::Device(n),
            access: GateAccess(DEVICE_VECTOR_BASE + n),
        }
    }
}

/// Every gate installed at boot, in installation order.
pub static GATE_LAYOUT: [GateSpec; GATE_COUNT] = build_layout();

const fn build_layout() -> [GateSpec; GATE_COUNT] {
    let mut layout = [GateSpec::software(); GATE_COUNT];

    let mut slot = 0;
    while slot < EXCEPTION_VECTORS as usize {
        layout[slot] = GateSpec::exception(slot as u8);
        slot += 1;
    }

    layout[slot] = GateSpec::software();
    slot += 1;

    let mut n = 0;
    while n < DEVICE_VECTORS {
        layout[slot] = GateSpec::device(n);
        slot += 1;
        n += 1;
    }

    layout
}

/// Program every gate of [`GATE_LAYOUT`] into `table`.
///
/// Must complete before interrupts are enabled. Running it again with the
/// same stubs and selector rewrites identical entries.
///
/// Returns the number of gates installed.
pub fn install_vectors<T, S>(table: &mut T, stubs: &S, selector: SegmentSelector) -> usize
where
    T: DescriptorTable,
    S: TrapStubs,
{
    debug_assert_eq!(selector.rpl(), 0, "trap gates must enter ring 0");
    for gate in GATE_LAYOUT.iter() {
        debug_assert!(gate.access.is_present());
        let vector = gate.vector.as_u8();
        table.install(vector, stubs.entry_point(vector), selector.0, gate.access.bits());
    }

    log::debug!(
        "installed {} trap gates, selector {:#x} (descriptor {})",
        GATE_LAYOUT.len(),
        selector.0,
        selector.index()
    );
    GATE_LAYOUT.len()
}
