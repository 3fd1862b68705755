//! Architecture-specific implementations.
//!
//! This module provides platform backends for the HAL traits.
//! Currently supported: x86_64.

#[cfg(target_arch = "x86_64")]
pub mod x86_64;

#[cfg(target_arch = "x86_64")]
pub use self::x86_64::*;
