//! System-wide error types for Tandem.

use core::fmt;

/// Trap capture error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrapError {
    /// The trampoline stored a vector number that does not fit the 256-entry table.
    VectorOutOfRange(u64),
}

impl fmt::Display for TrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrapError::VectorOutOfRange(raw) => {
                write!(f, "vector {} out of range (0x{:x})", raw, raw)
            }
        }
    }
}
