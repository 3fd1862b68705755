//! Per-trap classification, diagnostics and acknowledgement.

use core::fmt::{self, Write};

use tandem_common::{ExceptionKind, PageFaultErrorCode, TrapClass, TrapError, Vector};
use tandem_hal::{Console, CpuIdentity, InterruptController, Processor};

use super::event::{TrapEvent, TrapFrame};
use super::vectors::{RESERVED_VECTOR, SYSCALL_VECTOR};
use crate::config::{TrapConfig, Verbosity};
use crate::console::SerializedConsole;
use crate::cpu::OnlineCpus;

const RULE: &str = "----------------------------------------";

/// What the core does after a trap has been dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return to the interrupted context.
    Resume,
    /// Stop this core for good.
    Halt,
}

/// Handles traps for every core.
///
/// One dispatcher is shared by all cores; it holds no per-trap state. The
/// console and the online counter are the only things cores touch
/// concurrently.
pub struct TrapDispatcher<'a, W, C, E> {
    console: &'a SerializedConsole<W>,
    cpu: &'a C,
    controller: &'a E,
    online: &'a OnlineCpus,
    config: TrapConfig,
}

impl<'a, W, C, E> TrapDispatcher<'a, W, C, E> {
    /// Create a dispatcher over the given collaborators.
    pub const fn new(
        console: &'a SerializedConsole<W>,
        cpu: &'a C,
        controller: &'a E,
        online: &'a OnlineCpus,
        config: TrapConfig,
    ) -> Self {
        Self {
            console,
            cpu,
            controller,
            online,
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> TrapConfig {
        self.config
    }
}

impl<W, C, E> TrapDispatcher<'_, W, C, E>
where
    W: Console,
    C: CpuIdentity,
    E: InterruptController,
{
    /// Entry from the trap stubs: dispatch `frame` and park the core if the
    /// trap was fatal.
    pub fn handle<P: Processor>(&self, frame: &TrapFrame, processor: &P) {
        if self.dispatch_frame(frame) == Disposition::Halt {
            processor.halt_forever();
        }
    }

    /// Dispatch a raw frame. A frame that cannot be decoded is reported and
    /// acknowledged, never fatal.
    pub fn dispatch_frame(&self, frame: &TrapFrame) -> Disposition {
        match TrapEvent::from_frame(frame) {
            Ok(event) => self.dispatch(&event),
            Err(err) => {
                let online = self.online.count();
                self.reject(online, self.cpu.current_cpu_id(), err);
                self.finish(online);
                Disposition::Resume
            }
        }
    }

    /// Classify `event`, print what it calls for and decide whether the core
    /// survives.
    ///
    /// On [`Disposition::Halt`] the controller is not acknowledged and the
    /// online count is left as is.
    pub fn dispatch(&self, event: &TrapEvent) -> Disposition {
        let online = self.online.count();
        let cpu_id = self.cpu.current_cpu_id();

        match event.vector.classify() {
            TrapClass::Exception(kind) => {
                let fatal = kind.is_fatal();
                self.console.block(online, cpu_id, |out| {
                    let _ = write_exception(out, cpu_id, kind, event, fatal);
                });
                if fatal {
                    return Disposition::Halt;
                }
            }
            TrapClass::Interrupt(vector) => {
                if self.config.verbosity >= Verbosity::Normal {
                    let verbose = self.config.verbosity >= Verbosity::Verbose;
                    self.console.block(online, cpu_id, |out| {
                        let _ = write_interrupt(out, cpu_id, vector, event, verbose);
                    });
                }
            }
        }

        match event.vector.as_u8() {
            RESERVED_VECTOR | SYSCALL_VECTOR => {
                log::trace!("vector {:#x} on cpu {}: no handler attached", event.vector.0, cpu_id);
            }
            _ => {}
        }

        self.finish(online);
        Disposition::Resume
    }

    fn reject(&self, online: u32, cpu_id: u32, err: TrapError) {
        log::warn!("dropping trap frame: {}", err);
        self.console
            .print(online, cpu_id, format_args!("| trap frame rejected: {}\n", err));
    }

    fn finish(&self, online: u32) {
        self.controller.end_of_interrupt();
        self.online.restore(online);
    }
}

fn write_exception<O: Write>(
    out: &mut O,
    cpu_id: u32,
    kind: ExceptionKind,
    event: &TrapEvent,
    fatal: bool,
) -> fmt::Result {
    writeln!(out, "|")?;
    writeln!(out, "| CPU {}", cpu_id)?;
    writeln!(out, "| Exception: {} ({})", kind.name(), event.vector)?;
    writeln!(
        out,
        "| ip: {:#x}, sp: {:#x}",
        event.instruction_pointer, event.stack_pointer
    )?;
    if kind == ExceptionKind::PageFault {
        let cause = PageFaultErrorCode::from_raw(event.error_code.unwrap_or(0)).cause();
        writeln!(out, "| {}", cause)?;
        if let Some(address) = event.fault_address {
            writeln!(out, "| address: {:#x}", address)?;
        }
    }
    if fatal {
        writeln!(out, "| System halted.")?;
    }
    Ok(())
}

fn write_interrupt<O: Write>(
    out: &mut O,
    cpu_id: u32,
    vector: Vector,
    event: &TrapEvent,
    verbose: bool,
) -> fmt::Result {
    writeln!(out, "/{}", RULE)?;
    writeln!(out, "| CPU {}", cpu_id)?;
    writeln!(out, "| Interrupt: {} / {:#x}", vector.0, vector.0)?;
    if verbose {
        writeln!(
            out,
            "| ip: {:#x}, sp: {:#x}",
            event.instruction_pointer, event.stack_pointer
        )?;
    }
    writeln!(out, "\\{}", RULE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingEoi, FixedCpu, PanickingProcessor, RecordingConsole};

    struct Harness {
        device: RecordingConsole,
        console: SerializedConsole<RecordingConsole>,
        cpu: FixedCpu,
        eoi: CountingEoi,
        online: OnlineCpus,
    }

    impl Harness {
        fn new(cpu_id: u32, online: u32) -> Self {
            let device = RecordingConsole::new();
            Self {
                console: SerializedConsole::new(device.clone()),
                device,
                cpu: FixedCpu(cpu_id),
                eoi: CountingEoi::new(),
                online: OnlineCpus::new(online),
            }
        }

        fn dispatcher(
            &self,
            verbosity: Verbosity,
        ) -> TrapDispatcher<'_, RecordingConsole, FixedCpu, CountingEoi> {
            TrapDispatcher::new(
                &self.console,
                &self.cpu,
                &self.eoi,
                &self.online,
                TrapConfig::new(verbosity),
            )
        }
    }

    #[test]
    fn test_division_by_zero_halts() {
        let h = Harness::new(2, 4);
        let event = TrapEvent::new(Vector(0), 0x1000, 0x8000);

        assert_eq!(h.dispatcher(Verbosity::Quiet).dispatch(&event), Disposition::Halt);

        let out = h.device.contents();
        assert!(out.contains("| CPU 2\n"));
        assert!(out.contains("| Exception: Division By Zero (0)\n"));
        assert!(out.contains("| ip: 0x1000, sp: 0x8000\n"));
        assert!(out.ends_with("| System halted.\n"));
        // Fatal traps never reach the acknowledgement
        assert_eq!(h.eoi.count(), 0);
    }

    #[test]
    fn test_fault_while_core_holds_console() {
        let h = Harness::new(1, 2);
        let event = TrapEvent::new(Vector(13), 0x3000, 0x7000).with_error_code(0);
        let dispatcher = h.dispatcher(Verbosity::Quiet);

        // The fault lands in the middle of a line this core is printing
        let disposition = h.console.block(2, 1, |out| {
            let _ = out.write_str("log line ");
            dispatcher.dispatch(&event)
        });

        assert_eq!(disposition, Disposition::Halt);
        let out = h.device.contents();
        assert!(out.starts_with("log line |\n| CPU 1\n"));
        assert!(out.contains("| Exception: General Protection Fault (13)\n"));
        assert!(out.ends_with("| System halted.\n"));
    }

    #[test]
    fn test_interrupt_trace_while_core_holds_console() {
        let h = Harness::new(0, 3);
        let dispatcher = h.dispatcher(Verbosity::Normal);

        let disposition = h
            .console
            .block(3, 0, |_| dispatcher.dispatch(&TrapEvent::new(Vector(0xA4), 0, 0)));

        assert_eq!(disposition, Disposition::Resume);
        assert!(h.device.contents().contains("| Interrupt: 164 / 0xa4\n"));
        assert_eq!(h.eoi.count(), 1);
    }

    #[test]
    fn test_every_exception_but_15_is_fatal() {
        for raw in 0..32u8 {
            let h = Harness::new(0, 1);
            let event = TrapEvent::new(Vector(raw), 0, 0);
            let expected = if raw == 15 {
                Disposition::Resume
            } else {
                Disposition::Halt
            };
            assert_eq!(h.dispatcher(Verbosity::Quiet).dispatch(&event), expected, "vector {}", raw);
        }
    }

    #[test]
    fn test_vector_15_resumes_and_acknowledges() {
        let h = Harness::new(1, 2);
        let event = TrapEvent::new(Vector(15), 0x2000, 0x9000);

        assert_eq!(h.dispatcher(Verbosity::Quiet).dispatch(&event), Disposition::Resume);

        let out = h.device.contents();
        assert!(out.contains("| Exception: Unknown Interrupt (15)\n"));
        assert!(!out.contains("System halted"));
        assert_eq!(h.eoi.count(), 1);
    }

    #[test]
    fn test_page_fault_block() {
        let h = Harness::new(3, 4);
        let event = TrapEvent::new(Vector(14), 0xffff_8000_0000_1234, 0xffff_8000_0001_0000)
            .with_error_code(0b0110)
            .with_fault_address(0xdead_beef);

        assert_eq!(h.dispatcher(Verbosity::Quiet).dispatch(&event), Disposition::Halt);

        let out = h.device.contents();
        let expected = "|\n\
                        | CPU 3\n\
                        | Exception: Page Fault (14)\n\
                        | ip: 0xffff800000001234, sp: 0xffff800000010000\n\
                        | page-fault(wr): not-present ring 3\n\
                        | address: 0xdeadbeef\n\
                        | System halted.\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_interrupt_quiet_is_silent() {
        let h = Harness::new(0, 2);
        let event = TrapEvent::new(Vector(0xA1), 0, 0);

        assert_eq!(h.dispatcher(Verbosity::Quiet).dispatch(&event), Disposition::Resume);
        assert!(h.device.contents().is_empty());
        assert_eq!(h.eoi.count(), 1);
    }

    #[test]
    fn test_interrupt_trace() {
        let h = Harness::new(5, 8);
        let event = TrapEvent::new(Vector(0xA2), 0x4000, 0x5000);

        h.dispatcher(Verbosity::Normal).dispatch(&event);
        let out = h.device.contents();
        assert!(out.starts_with("/----"));
        assert!(out.contains("| CPU 5\n"));
        assert!(out.contains("| Interrupt: 162 / 0xa2\n"));
        assert!(!out.contains("ip:"));
        assert!(out.ends_with("----\n"));
    }

    #[test]
    fn test_interrupt_trace_verbose_adds_pointers() {
        let h = Harness::new(0, 1);
        let event = TrapEvent::new(Vector(0x80), 0x4000, 0x5000);

        h.dispatcher(Verbosity::Verbose).dispatch(&event);
        assert!(h.device.contents().contains("| ip: 0x4000, sp: 0x5000\n"));
    }

    #[test]
    fn test_placeholder_vectors_resume() {
        for raw in [RESERVED_VECTOR, SYSCALL_VECTOR] {
            let h = Harness::new(0, 1);
            let event = TrapEvent::new(Vector(raw), 0, 0);
            assert_eq!(h.dispatcher(Verbosity::Quiet).dispatch(&event), Disposition::Resume);
            assert_eq!(h.eoi.count(), 1);
        }
    }

    #[test]
    fn test_online_count_restored() {
        let h = Harness::new(0, 3);
        let dispatcher = h.dispatcher(Verbosity::Quiet);

        // A core coming online mid-trap is overwritten by the value seen on entry
        struct Bump<'a>(&'a OnlineCpus);
        impl CpuIdentity for Bump<'_> {
            fn current_cpu_id(&self) -> u32 {
                self.0.mark_online();
                0
            }
        }
        let bump = Bump(&h.online);
        let racing = TrapDispatcher::new(
            &h.console,
            &bump,
            &h.eoi,
            &h.online,
            dispatcher.config(),
        );
        racing.dispatch(&TrapEvent::new(Vector(40), 0, 0));
        assert_eq!(h.online.count(), 3);
    }

    #[test]
    fn test_bad_frame_is_absorbed() {
        let h = Harness::new(0, 1);
        let frame = TrapFrame {
            int_no: 0x1_0000,
            ..TrapFrame::default()
        };

        assert_eq!(h.dispatcher(Verbosity::Quiet).dispatch_frame(&frame), Disposition::Resume);
        assert!(h
            .device
            .contents()
            .contains("| trap frame rejected: vector 65536 out of range (0x10000)\n"));
        assert_eq!(h.eoi.count(), 1);
    }

    #[test]
    fn test_handle_resumes_on_interrupt() {
        let h = Harness::new(0, 1);
        let frame = TrapFrame {
            int_no: 0xA0,
            ..TrapFrame::default()
        };
        h.dispatcher(Verbosity::Quiet).handle(&frame, &PanickingProcessor);
        assert_eq!(h.eoi.count(), 1);
    }

    #[test]
    #[should_panic(expected = "core halted")]
    fn test_handle_halts_on_fatal_exception() {
        let h = Harness::new(0, 1);
        let frame = TrapFrame {
            int_no: 13,
            err_code: 0x10,
            ..TrapFrame::default()
        };
        h.dispatcher(Verbosity::Quiet).handle(&frame, &PanickingProcessor);
    }
}
