//! Captured processor state.

use tandem_common::trap::PAGE_FAULT_VECTOR;
use tandem_common::{ExceptionKind, TrapError, Vector};

/// Register save area built by the 64-bit entry stubs, lowest address first.
///
/// The stub pushes the vector number and, for exceptions without a hardware
/// error code, a zero placeholder, then the general purpose and segment
/// registers, `cr3` and `cr2`.
#[allow(missing_docs)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TrapFrame {
    pub cr2: u64,
    pub cr3: u64,
    pub gs: u64,
    pub fs: u64,
    pub es: u64,
    pub ds: u64,
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rbp: u64,
    pub zero: u64,
    pub rbx: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rax: u64,
    pub int_no: u64,
    pub err_code: u64,
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    pub rsp: u64,
    pub ss: u64,
}

/// The part of a trap the dispatcher acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapEvent {
    /// Which vector fired.
    pub vector: Vector,
    /// Error code, for exceptions where the processor pushes one.
    pub error_code: Option<u64>,
    /// Interrupted instruction pointer.
    pub instruction_pointer: u64,
    /// Interrupted stack pointer.
    pub stack_pointer: u64,
    /// Faulting linear address, page faults only.
    pub fault_address: Option<u64>,
}

impl TrapEvent {
    /// An event with no error code or fault address.
    pub const fn new(vector: Vector, instruction_pointer: u64, stack_pointer: u64) -> Self {
        Self {
            vector,
            error_code: None,
            instruction_pointer,
            stack_pointer,
            fault_address: None,
        }
    }

    /// Attach an error code.
    pub const fn with_error_code(mut self, code: u64) -> Self {
        self.error_code = Some(code);
        self
    }

    /// Attach a faulting address.
    pub const fn with_fault_address(mut self, address: u64) -> Self {
        self.fault_address = Some(address);
        self
    }

    /// Extract the event from a raw frame.
    ///
    /// Fails when the stored vector number does not fit the trap table.
    pub fn from_frame(frame: &TrapFrame) -> Result<Self, TrapError> {
        let raw = u8::try_from(frame.int_no)
            .map_err(|_| TrapError::VectorOutOfRange(frame.int_no))?;

        let error_code = ExceptionKind::from_vector(raw)
            .filter(|kind| kind.has_error_code())
            .map(|_| frame.err_code);
        let fault_address = (raw == PAGE_FAULT_VECTOR).then_some(frame.cr2);

        Ok(Self {
            vector: Vector(raw),
            error_code,
            instruction_pointer: frame.rip,
            stack_pointer: frame.rsp,
            fault_address,
        })
    }
}
