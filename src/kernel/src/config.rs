//! Kernel configuration.
//!
//! Defaults are fixed at compile time by Cargo features:
//!
//! - `verbose-isr`: trace every interrupt on the console
//! - `verbose-isr-full`: also print the interrupted `ip`/`sp`
//!
//! Debug builds log at `Debug`, release builds at `Info`.

use log::LevelFilter;

/// How much the trap dispatcher prints for interrupts (vectors >= 32).
///
/// Exceptions always print their diagnostic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verbosity {
    /// Interrupts are silent.
    Quiet,
    /// Core id and vector number.
    Normal,
    /// Also the interrupted instruction and stack pointers.
    Verbose,
}

impl Verbosity {
    /// Verbosity selected by the enabled Cargo features.
    pub const DEFAULT: Verbosity = if cfg!(feature = "verbose-isr-full") {
        Verbosity::Verbose
    } else if cfg!(feature = "verbose-isr") {
        Verbosity::Normal
    } else {
        Verbosity::Quiet
    };
}

impl Default for Verbosity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Trap dispatch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapConfig {
    /// Interrupt trace level.
    pub verbosity: Verbosity,
}

impl TrapConfig {
    /// Settings selected by the enabled Cargo features.
    pub const DEFAULT: TrapConfig = TrapConfig::new(Verbosity::DEFAULT);

    /// Create a configuration.
    pub const fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Return a copy with a different verbosity.
    pub const fn with_verbosity(self, verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

impl Default for TrapConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Top-level kernel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Maximum level passed to the `log` facade.
    pub log_level: LevelFilter,
    /// Trap dispatch settings.
    pub traps: TrapConfig,
}

impl KernelConfig {
    /// Settings selected by the build profile and Cargo features.
    pub const DEFAULT: KernelConfig = KernelConfig {
        log_level: if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        traps: TrapConfig::DEFAULT,
    };
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
