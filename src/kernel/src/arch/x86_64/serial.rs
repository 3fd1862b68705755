//! Serial port driver for x86_64.
//!
//! Provides serial output via COM1 (0x3F8) for diagnostics and logging. All
//! output goes through [`CONSOLE`], which keeps blocks from different cores
//! apart once secondaries are online.

use core::fmt;
use spin::Mutex;
use uart_16550::SerialPort;

use tandem_hal::CpuIdentity;

use super::apic::LOCAL_APIC;
use crate::console::SerializedConsole;
use crate::cpu::ONLINE;

/// COM1 I/O port address.
const COM1_PORT: u16 = 0x3F8;

/// Global serial port instance, lazily initialized.
pub static SERIAL: spin::Once<Mutex<SerialPort>> = spin::Once::new();

/// The kernel console, shared by every core.
pub static CONSOLE: SerializedConsole<SerialConsole> = SerializedConsole::new(SerialConsole);

/// Initializes the global serial port.
///
/// Idempotent; only the first call programs the UART.
pub fn init() {
    port();
}

fn port() -> &'static Mutex<SerialPort> {
    SERIAL.call_once(|| {
        // SAFETY: COM1_PORT (0x3F8) is the standard first serial port and the
        // kernel runs with full I/O port access.
        let mut serial = unsafe { SerialPort::new(COM1_PORT) };
        serial.init();
        Mutex::new(serial)
    })
}

/// COM1 as a [`tandem_hal::Console`].
pub struct SerialConsole;

impl tandem_hal::Console for SerialConsole {
    fn write_str(&mut self, s: &str) {
        let mut port = port().lock();
        for byte in s.bytes() {
            port.send(byte);
        }
    }
}

/// Prints to the serial port without a newline.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::arch::x86_64::serial::_print(format_args!($($arg)*))
    };
}

/// Prints to the serial port with a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($($arg:tt)*) => ($crate::serial_print!("{}\n", format_args!($($arg)*)))
}

/// Internal print function used by macros.
///
/// Interrupts stay off while the console is held, so a device interrupt on
/// this core cannot land inside the block.
#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    x86_64::instructions::interrupts::without_interrupts(|| {
        let online = ONLINE.count();
        // The APIC is only consulted once secondaries exist.
        let cpu = if online > 1 {
            LOCAL_APIC.current_cpu_id()
        } else {
            0
        };
        CONSOLE.print(online, cpu, args);
    });
}

/// [`crate::logger::LogSink`] writing to the kernel console.
pub fn log_sink(args: fmt::Arguments<'_>) {
    _print(args);
}
