//! Types shared between the Tandem kernel and its hardware backends.
//!
//! Everything here is plain data: vector numbers, the exception name table,
//! page-fault error-code decoding, gate access bytes and the trap error type.

#![no_std]
#![warn(missing_docs)]

pub mod error;
pub mod gate;
pub mod trap;

pub use error::TrapError;
pub use gate::{GateAccess, SegmentSelector};
pub use trap::{ExceptionKind, PageFaultCause, PageFaultErrorCode, TrapClass, Vector};
