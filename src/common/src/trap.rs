//! Trap vectors, the architectural exception table and page-fault decoding.

use bitflags::bitflags;
use core::fmt;

/// Number of architectural exception vectors (0..=31).
pub const EXCEPTION_VECTORS: u8 = 32;

/// Page fault vector.
pub const PAGE_FAULT_VECTOR: u8 = 14;

/// An index into the 256-entry trap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Vector(pub u8);

impl Vector {
    /// Returns the raw vector number.
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns the vector number widened for table indexing.
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Splits the vector space into exceptions and interrupts.
    pub const fn classify(self) -> TrapClass {
        match ExceptionKind::from_vector(self.0) {
            Some(kind) => TrapClass::Exception(kind),
            None => TrapClass::Interrupt(self),
        }
    }
}

impl From<u8> for Vector {
    fn from(raw: u8) -> Self {
        Vector(raw)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a vector number denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrapClass {
    /// Vectors 0..=31.
    Exception(ExceptionKind),
    /// Vectors 32..=255: device interrupts, IPIs and software gates.
    Interrupt(Vector),
}

/// The 32 architectural exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionKind {
    /// Vector 0.
    DivisionByZero,
    /// Vector 1.
    Debug,
    /// Vector 2.
    NonMaskableInterrupt,
    /// Vector 3.
    Breakpoint,
    /// Vector 4.
    IntoDetectedOverflow,
    /// Vector 5.
    OutOfBounds,
    /// Vector 6.
    InvalidOpcode,
    /// Vector 7.
    NoCoprocessor,
    /// Vector 8.
    DoubleFault,
    /// Vector 9.
    CoprocessorSegmentOverrun,
    /// Vector 10.
    BadTss,
    /// Vector 11.
    SegmentNotPresent,
    /// Vector 12.
    StackFault,
    /// Vector 13.
    GeneralProtectionFault,
    /// Vector 14.
    PageFault,
    /// Vector 15. The only exception the dispatcher survives.
    UnknownInterrupt,
    /// Vector 16.
    CoprocessorFault,
    /// Vector 17.
    AlignmentCheck,
    /// Vector 18.
    MachineCheck,
    /// Vectors 19..=31, carrying the vector number.
    Reserved(u8),
}

impl ExceptionKind {
    /// Maps a vector number to its exception, `None` above 31.
    pub const fn from_vector(vector: u8) -> Option<Self> {
        let kind = match vector {
            0 => Self::DivisionByZero,
            1 => Self::Debug,
            2 => Self::NonMaskableInterrupt,
            3 => Self::Breakpoint,
            4 => Self::IntoDetectedOverflow,
            5 => Self::OutOfBounds,
            6 => Self::InvalidOpcode,
            7 => Self::NoCoprocessor,
            8 => Self::DoubleFault,
            9 => Self::CoprocessorSegmentOverrun,
            10 => Self::BadTss,
            11 => Self::SegmentNotPresent,
            12 => Self::StackFault,
            13 => Self::GeneralProtectionFault,
            14 => Self::PageFault,
            15 => Self::UnknownInterrupt,
            16 => Self::CoprocessorFault,
            17 => Self::AlignmentCheck,
            18 => Self::MachineCheck,
            19..=31 => Self::Reserved(vector),
            _ => return None,
        };
        Some(kind)
    }

    /// The vector this exception is delivered on.
    pub const fn vector(self) -> Vector {
        let raw = match self {
            Self::DivisionByZero => 0,
            Self::Debug => 1,
            Self::NonMaskableInterrupt => 2,
            Self::Breakpoint => 3,
            Self::IntoDetectedOverflow => 4,
            Self::OutOfBounds => 5,
            Self::InvalidOpcode => 6,
            Self::NoCoprocessor => 7,
            Self::DoubleFault => 8,
            Self::CoprocessorSegmentOverrun => 9,
            Self::BadTss => 10,
            Self::SegmentNotPresent => 11,
            Self::StackFault => 12,
            Self::GeneralProtectionFault => 13,
            Self::PageFault => 14,
            Self::UnknownInterrupt => 15,
            Self::CoprocessorFault => 16,
            Self::AlignmentCheck => 17,
            Self::MachineCheck => 18,
            Self::Reserved(v) => v,
        };
        Vector(raw)
    }

    /// Human-readable name printed in fault diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DivisionByZero => "Division By Zero",
            Self::Debug => "Debug",
            Self::NonMaskableInterrupt => "Non Maskable Interrupt",
            Self::Breakpoint => "Breakpoint",
            Self::IntoDetectedOverflow => "Into Detected Overflow",
            Self::OutOfBounds => "Out of Bounds",
            Self::InvalidOpcode => "Invalid Opcode",
            Self::NoCoprocessor => "No Coprocessor",
            Self::DoubleFault => "Double Fault",
            Self::CoprocessorSegmentOverrun => "Coprocessor Segment Overrun",
            Self::BadTss => "Bad TSS",
            Self::SegmentNotPresent => "Segment Not Present",
            Self::StackFault => "Stack Fault",
            Self::GeneralProtectionFault => "General Protection Fault",
            Self::PageFault => "Page Fault",
            Self::UnknownInterrupt => "Unknown Interrupt",
            Self::CoprocessorFault => "Coprocessor Fault",
            Self::AlignmentCheck => "Alignment Check",
            Self::MachineCheck => "Machine Check",
            Self::Reserved(_) => "Reserved",
        }
    }

    /// Whether the processor pushes an error code for this exception.
    pub const fn has_error_code(self) -> bool {
        matches!(self.vector().0, 8 | 10..=14 | 17 | 21 | 29 | 30)
    }

    /// Whether taking this exception stops the core.
    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::UnknownInterrupt)
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Error code pushed by the processor on a page fault.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFaultErrorCode: u32 {
        const PROTECTION_VIOLATION = 1 << 0;
        const CAUSED_BY_WRITE      = 1 << 1;
        const USER_MODE            = 1 << 2;
        const RESERVED_BIT         = 1 << 3;
        const INSTRUCTION_FETCH    = 1 << 4;
    }
}

impl PageFaultErrorCode {
    /// Interprets the raw error code, dropping bits this kernel does not report.
    pub const fn from_raw(raw: u64) -> Self {
        Self::from_bits_truncate(raw as u32)
    }

    /// Decodes the flags into independent conditions.
    pub const fn cause(self) -> PageFaultCause {
        PageFaultCause {
            fault: if self.contains(Self::PROTECTION_VIOLATION) {
                FaultKind::Protection
            } else {
                FaultKind::NotPresent
            },
            access: if self.contains(Self::CAUSED_BY_WRITE) {
                AccessKind::Write
            } else {
                AccessKind::Read
            },
            mode: if self.contains(Self::USER_MODE) {
                PrivilegeMode::User
            } else {
                PrivilegeMode::Supervisor
            },
            reserved_bit: self.contains(Self::RESERVED_BIT),
            instruction_fetch: self.contains(Self::INSTRUCTION_FETCH),
        }
    }
}

/// Whether the faulting page was absent or present but protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// Bit 0 clear.
    NotPresent,
    /// Bit 0 set.
    Protection,
}

/// Access that triggered the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Bit 1 clear.
    Read,
    /// Bit 1 set.
    Write,
}

/// Privilege level the fault was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegeMode {
    /// Bit 2 clear.
    Supervisor,
    /// Bit 2 set.
    User,
}

/// A page-fault error code broken into its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageFaultCause {
    /// Not-present or protection fault.
    pub fault: FaultKind,
    /// Read or write.
    pub access: AccessKind,
    /// Supervisor or user mode.
    pub mode: PrivilegeMode,
    /// A reserved bit was set in a paging structure.
    pub reserved_bit: bool,
    /// The access was an instruction fetch.
    pub instruction_fetch: bool,
}

impl fmt::Display for PageFaultCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            AccessKind::Read => "(rd)",
            AccessKind::Write => "(wr)",
        };
        let fault = match self.fault {
            FaultKind::NotPresent => "not-present",
            FaultKind::Protection => "protection",
        };
        let ring = match self.mode {
            PrivilegeMode::Supervisor => "ring 0",
            PrivilegeMode::User => "ring 3",
        };
        write!(f, "page-fault{}: {} {}", access, fault, ring)?;
        if self.reserved_bit {
            f.write_str(" reserved")?;
        }
        if self.instruction_fetch {
            f.write_str(" instr.fetch")?;
        }
        Ok(())
    }
}
