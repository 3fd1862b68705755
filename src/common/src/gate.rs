//! Gate descriptor attributes.

/// Access byte of a gate descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct GateAccess(pub u8);

impl GateAccess {
    /// Present, ring 0, interrupt gate.
    pub const KERNEL_INTERRUPT: GateAccess = GateAccess(0x8E);

    /// Present bit (bit 7).
    pub const fn is_present(self) -> bool {
        self.0 & 0x80 != 0
    }

    /// The raw byte.
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// A code segment selector as loaded into `CS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct SegmentSelector(pub u16);

impl SegmentSelector {
    /// Index into the descriptor table.
    pub const fn index(self) -> u16 {
        self.0 >> 3
    }

    /// Requested privilege level.
    pub const fn rpl(self) -> u8 {
        (self.0 & 0b11) as u8
    }
}
