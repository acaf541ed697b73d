//! Main loop orchestrator
//!
//! [`Pendant`] owns everything the loop needs between ticks. The board
//! supplies its peripherals to [`Pendant::tick`] through the collaborator
//! traits, so the same loop runs on the RP2040 and in host tests.
//!
//! ```text
//! tick ──▶ heartbeat ──▶ one serial line ──▶ dispatch
//!      ──▶ forcing rules ──▶ idle/busy ──▶ buttons, joystick, wheel
//!      ──▶ abort ──▶ raw joystick stream ──▶ screen update
//!      ──▶ render ──▶ flush outbox to the UART
//! ```

use pendant_display::{DisplayBackend, DisplayError, FlushKind, RenderStrategy};
use pendant_hal::clock::Clock;
use pendant_hal::input::InputHardware;
use pendant_hal::storage::{ByteStorage, StorageError};
use pendant_hal::uart::Uart;
use pendant_protocol::{CommandKind, DeviceMessage, HostCommand, LineEvent, LineParser};

use crate::config::BUTTON_ABORT;
use crate::context::Context;
use crate::input::Joystick;
use crate::link::{LinkAction, LinkMonitor};
use crate::screens::{ProbeMode, ScreenKind, ScreenRequest, Screens};
use crate::settings::{LoadOutcome, Settings};

/// Errors that end a tick early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendantError {
    /// The display rejected a flush
    Display(DisplayError),
    /// The UART rejected outgoing bytes
    Serial,
}

impl From<DisplayError> for PendantError {
    fn from(e: DisplayError) -> Self {
        PendantError::Display(e)
    }
}

/// Host link transitions seen during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkChange {
    /// The first `STATUS:` after a disconnect
    Connected,
    /// `BYE` from the host
    Closed,
    /// The host stopped answering pings
    TimedOut,
}

/// What happened during one tick, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Kind of the host command dispatched this tick
    pub command: Option<CommandKind>,
    /// The screen that became active this tick
    pub screen: Option<ScreenKind>,
    pub link: Option<LinkChange>,
    /// Incoming line was longer than the line buffer
    pub truncated: bool,
    /// Reading the UART failed; the rest of the tick still ran
    pub read_failed: bool,
    /// Outgoing messages dropped because the outbox was full
    pub dropped: u16,
    /// Persisting `NAME:` or `CALIBRATION:` failed
    pub storage_error: Option<StorageError>,
    /// Bytes handed to the UART
    pub sent: usize,
    pub flush: Option<FlushKind>,
}

/// The pendant main loop state
pub struct Pendant<S: ByteStorage, R: RenderStrategy> {
    storage: S,
    renderer: R,
    screens: Screens,
    link: LinkMonitor,
    parser: LineParser,
    ctx: Context,
    last_time: u32,
    load_outcome: LoadOutcome,
    recovered_crash: bool,
}

impl<S: ByteStorage, R: RenderStrategy> Pendant<S, R> {
    /// Load settings from `storage` and show the Welcome screen
    ///
    /// A crash flag left by the previous run is cleared in storage and
    /// reported through [`Pendant::recovered_crash`].
    pub fn new(mut storage: S, renderer: R, now: u32) -> Result<Self, StorageError> {
        let (mut settings, load_outcome) = Settings::load(&mut storage)?;
        let recovered_crash = settings.take_crash();
        if recovered_crash {
            settings.save(&mut storage)?;
        }

        let mut ctx = Context::new(settings);
        ctx.now = now.max(1);
        let mut screens = Screens::new();
        screens.activate(ScreenRequest::Welcome, &mut ctx);

        Ok(Self {
            storage,
            renderer,
            screens,
            link: LinkMonitor::new(),
            parser: LineParser::new(),
            ctx,
            last_time: now.max(1),
            load_outcome,
            recovered_crash,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn screens(&self) -> &Screens {
        &self.screens
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Resend the whole frame on the next tick, after the panel was reset
    pub fn invalidate_display(&mut self) {
        self.renderer.invalidate_all();
    }

    /// Whether settings were found or initialized at boot
    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    /// The previous run ended in a watchdog reset
    pub fn recovered_crash(&self) -> bool {
        self.recovered_crash
    }

    /// Run one pass of the main loop
    pub fn tick<C, U, I, D>(
        &mut self,
        clock: &C,
        uart: &mut U,
        input: &mut I,
        display: &mut D,
    ) -> Result<TickReport, PendantError>
    where
        C: Clock + ?Sized,
        U: Uart + ?Sized,
        I: InputHardware + ?Sized,
        D: DisplayBackend + ?Sized,
    {
        let mut report = TickReport::default();
        let initial_screen = self.screens.current();

        // 0 marks "never" in the screen timers
        let now = clock.now_ms().max(1);
        let dt = now.wrapping_sub(self.last_time).min(u32::from(u16::MAX)) as u16;
        self.last_time = now;
        self.ctx.now = now;
        self.ctx.dt = dt;

        match self.link.check(now) {
            LinkAction::None => {}
            LinkAction::SendPing => self.ctx.send(DeviceMessage::Ping),
            LinkAction::Disconnected => report.link = Some(LinkChange::TimedOut),
        }
        self.ctx.connected = self.link.is_connected();

        match self.read_event(uart) {
            Ok(Some(LineEvent::AckRequest)) => self.ctx.send(DeviceMessage::Ack),
            Ok(Some(LineEvent::Line(line))) => {
                if line.needs_ack() {
                    self.ctx.send(DeviceMessage::Ack);
                }
                report.truncated = line.was_truncated();
                let command = HostCommand::parse(line.as_str());
                report.command = Some(command.kind());
                self.dispatch(command, &mut report);
            }
            Ok(None) => {}
            Err(_) => report.read_failed = true,
        }

        let forced = self.screens.force(&mut self.ctx);
        self.ctx.track_activity();

        self.ctx.buttons.update(input.read_buttons(), dt);
        let (x, y) = input.read_joystick();
        self.ctx.joystick = Joystick { x, y };
        self.ctx.add_wheel(input.drain_wheel());

        if self.ctx.buttons.clicked(BUTTON_ABORT) {
            self.ctx.send(DeviceMessage::Abort);
            if !forced {
                self.screens.activate(ScreenRequest::Main, &mut self.ctx);
            }
        }

        self.screens.stream_joystick(&mut self.ctx);
        self.screens.update(&mut self.ctx);

        let redraw_all = self.screens.begin_frame(&self.ctx);
        let screens = &mut self.screens;
        let ctx = &self.ctx;
        let rendered = self
            .renderer
            .render(display, redraw_all, &mut |canvas, full| screens.draw(canvas, ctx, full));

        // The outbox goes out even when the display failed
        let written = uart
            .write_blocking(self.ctx.outbox.as_bytes())
            .map_err(|_| PendantError::Serial);
        report.sent = self.ctx.outbox.as_bytes().len();
        self.ctx.outbox.clear();
        report.dropped = self.ctx.outbox.take_dropped();
        written?;
        report.flush = Some(rendered?);

        let screen = self.screens.current();
        if screen != initial_screen {
            report.screen = Some(screen);
        }
        Ok(report)
    }

    /// Feed available bytes until a line or ack request completes
    fn read_event<U: Uart + ?Sized>(&mut self, uart: &mut U) -> Result<Option<LineEvent>, PendantError> {
        while let Some(byte) = uart.try_read_byte().map_err(|_| PendantError::Serial)? {
            if let Some(event) = self.parser.feed(byte) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn dispatch(&mut self, command: HostCommand<'_>, report: &mut TickReport) {
        let ctx = &mut self.ctx;
        match command {
            HostCommand::Handshake => {
                ctx.send(DeviceMessage::Version);
                let name = ctx.settings.name.clone();
                ctx.send(DeviceMessage::Name(&name));
                let calibration = ctx.settings.calibration;
                ctx.send(DeviceMessage::Calibration(&calibration));
                self.link.handshake(ctx.now);
            }
            HostCommand::Bye => {
                if self.link.bye() {
                    report.link = Some(LinkChange::Closed);
                }
                ctx.connected = false;
            }
            HostCommand::Pong => self.link.pong(ctx.now),
            HostCommand::Status(status) => {
                if self.link.status_received() {
                    report.link = Some(LinkChange::Connected);
                }
                ctx.connected = true;
                ctx.machine.apply_status(&status);
            }
            HostCommand::ExtendedStatus(status) => ctx.machine.apply_extended(&status),
            HostCommand::Units(units) => ctx.machine.apply_units(&units),
            HostCommand::Macros(table) => self.screens.set_macros(table, ctx),
            HostCommand::Cal(command) => {
                self.screens.calibration_command(command, ctx);
            }
            HostCommand::Name(name) => {
                ctx.settings.set_name(&name);
                report.storage_error = ctx.settings.save(&mut self.storage).err();
            }
            HostCommand::Calibration(update) => {
                ctx.settings.apply_calibration(&update);
                report.storage_error = ctx.settings.save(&mut self.storage).err();
            }
            HostCommand::Dialog(request) => {
                self.screens.open_dialog(request, ctx);
            }
            HostCommand::JobScreen => {
                self.screens.activate(ScreenRequest::Run, ctx);
            }
            HostCommand::ProbeScreen(digit) => {
                if let Some(mode) = ProbeMode::from_digit(digit) {
                    let request = ScreenRequest::ZProbe {
                        mode,
                        notify: false,
                    };
                    self.screens.activate(request, ctx);
                }
            }
            HostCommand::Unknown(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::string::String;
    use std::vec::Vec;

    use pendant_display::FullBufferRenderer;
    use pendant_hal::storage::MemoryStorage;
    use pendant_hal::uart::{UartRx, UartTx};
    use pendant_protocol::MachineStatus;

    use crate::settings::SETTINGS_SIGNATURE;

    struct FakeClock(Cell<u32>);

    impl Clock for FakeClock {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct FakeUart {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        fail_reads: bool,
    }

    impl UartTx for FakeUart {
        type Error = ();

        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            self.tx.extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    impl UartRx for FakeUart {
        type Error = ();

        fn try_read_byte(&mut self) -> Result<Option<u8>, ()> {
            if self.fail_reads {
                return Err(());
            }
            Ok(self.rx.pop_front())
        }
    }

    struct FakeInput {
        buttons: u16,
        joystick: (u16, u16),
        wheel: i16,
    }

    impl InputHardware for FakeInput {
        fn read_buttons(&mut self) -> u16 {
            self.buttons
        }

        fn read_joystick(&mut self) -> (u16, u16) {
            self.joystick
        }

        fn drain_wheel(&mut self) -> i16 {
            core::mem::take(&mut self.wheel)
        }
    }

    #[derive(Default)]
    struct CountingDisplay {
        writes: usize,
    }

    impl DisplayBackend for CountingDisplay {
        fn init(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn write_page(&mut self, _page: u8, _column: u8, _data: &[u8]) -> Result<(), DisplayError> {
            self.writes += 1;
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    struct Rig {
        pendant: Pendant<MemoryStorage, FullBufferRenderer>,
        clock: FakeClock,
        uart: FakeUart,
        input: FakeInput,
        display: CountingDisplay,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_storage(MemoryStorage::new())
        }

        fn with_storage(storage: MemoryStorage) -> Self {
            let pendant = Pendant::new(storage, FullBufferRenderer::new(), 1000).unwrap();
            Self {
                pendant,
                clock: FakeClock(Cell::new(1000)),
                uart: FakeUart::default(),
                input: FakeInput {
                    buttons: 0,
                    joystick: (512, 512),
                    wheel: 0,
                },
                display: CountingDisplay::default(),
            }
        }

        fn step(&mut self, ms: u32) -> TickReport {
            self.clock.0.set(self.clock.0.get() + ms);
            self.pendant
                .tick(&self.clock, &mut self.uart, &mut self.input, &mut self.display)
                .unwrap()
        }

        /// Queue a host line and run ticks until it is consumed
        fn host(&mut self, line: &str) -> TickReport {
            self.uart.rx.extend(line.bytes());
            self.uart.rx.push_back(b'\n');
            self.step(20)
        }

        fn take_tx(&mut self) -> String {
            let out = String::from_utf8_lossy(&self.uart.tx).into_owned();
            self.uart.tx.clear();
            out
        }

        fn connect(&mut self, status: u8) {
            self.host(&format!("STATUS:{}|0,0,0|100,100,0,0", status));
            self.step(20);
            self.take_tx();
        }

        fn click(&mut self, button: u8) {
            self.input.buttons = 0;
            self.step(20);
            self.input.buttons = 1 << button;
            self.step(20);
            self.input.buttons = 0;
            self.step(20);
        }
    }

    #[test]
    fn test_status_line_is_acked_once() {
        let mut rig = Rig::new();
        let report = rig.host("STATUS:8|1.000,2.000,3.000|50,75,100,200");
        assert_eq!(report.command, Some(CommandKind::Status));
        assert_eq!(report.link, Some(LinkChange::Connected));
        assert_eq!(rig.take_tx(), "\x1F\n");

        let machine = &rig.pendant.context().machine;
        assert_eq!(machine.status, MachineStatus::Door3Resuming);
        assert_eq!(machine.status as u8, 8);
        assert_eq!(machine.work, [1.0, 2.0, 3.0]);
        assert_eq!((machine.feed_override, machine.speed_override), (50, 75));
        assert_eq!((machine.real_feed, machine.real_speed), (100, 200));
        assert_eq!(machine.progress, -1);
    }

    #[test]
    fn test_ack_request_keeps_partial_line() {
        let mut rig = Rig::new();
        rig.uart.rx.extend(b"STAT\x1F".iter());
        rig.step(20);
        assert_eq!(rig.take_tx(), "\x1F\n");

        rig.uart.rx.extend(b"US:9|0,0,0|100,100,0,0\n".iter());
        let report = rig.step(20);
        assert_eq!(report.command, Some(CommandKind::Status));
        assert_eq!(rig.pendant.context().machine.status, MachineStatus::Idle);
    }

    #[test]
    fn test_handshake_reports_defaults_on_first_boot() {
        let mut rig = Rig::new();
        assert_eq!(rig.pendant.load_outcome(), LoadOutcome::Initialized);
        assert!(rig.pendant.storage_mut().take_dirty());

        rig.host("PEN");
        assert_eq!(
            rig.take_tx(),
            "DANT:1.0\nNAME:Controlinator 3000\nCALIBRATION:0,448,576,1023,0,448,576,1023\n"
        );
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Welcome);
    }

    #[test]
    fn test_settings_survive_restart() {
        let mut rig = Rig::new();
        rig.host("NAME:Mill pendant");
        rig.host("CALIBRATION:10,400,600,1000");
        let image = *rig.pendant.storage().as_bytes();

        let mut rig = Rig::with_storage(MemoryStorage::from_image(&image));
        assert_eq!(rig.pendant.load_outcome(), LoadOutcome::Stored);
        rig.host("PEN");
        assert_eq!(
            rig.take_tx(),
            "DANT:1.0\nNAME:Mill pendant\nCALIBRATION:10,400,600,1000,0,448,576,1023\n"
        );
    }

    #[test]
    fn test_crash_flag_is_reported_once() {
        let mut storage = MemoryStorage::new();
        Settings::record_crash(&mut storage).unwrap();

        let rig = Rig::with_storage(storage);
        assert!(rig.pendant.recovered_crash());
        let image = *rig.pendant.storage().as_bytes();

        let rig = Rig::with_storage(MemoryStorage::from_image(&image));
        assert!(!rig.pendant.recovered_crash());
        assert_eq!(rig.pendant.context().settings.signature, SETTINGS_SIGNATURE);
    }

    #[test]
    fn test_macros_table() {
        let mut rig = Rig::new();
        rig.host("MACROS:3|Home|Probe||Vac|||");
        let macros = &rig.pendant.context().macros;
        assert_eq!(macros.names[0].as_str(), "Home");
        assert_eq!(macros.names[1].as_str(), "Probe");
        assert_eq!(macros.names[3].as_str(), "Vac");
        assert!(macros.needs_hold(0));
        assert!(macros.needs_hold(1));
        assert!(!macros.needs_hold(3));
        assert_eq!(macros.unused_mask(), 0b111_0100);
    }

    #[test]
    fn test_connect_leaves_welcome() {
        let mut rig = Rig::new();
        let report = rig.host("STATUS:9|0,0,0|100,100,0,0");
        assert_eq!(report.screen, Some(ScreenKind::Main));
        let report = rig.step(20);
        assert_eq!(report.screen, None);
    }

    #[test]
    fn test_disconnect_wins_over_alarm() {
        let mut rig = Rig::new();
        rig.connect(15);
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Alarm);

        let report = rig.host("BYE");
        assert_eq!(report.link, Some(LinkChange::Closed));
        assert_eq!(rig.pendant.context().machine.status, MachineStatus::Alarm);
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Welcome);
    }

    #[test]
    fn test_alarm_wins_over_screen() {
        let mut rig = Rig::new();
        rig.connect(9);
        rig.host("JOBSCREEN");
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Run);

        rig.host("STATUS:15|0,0,0|100,100,0,0");
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Alarm);
    }

    #[test]
    fn test_heartbeat_drops_silent_host() {
        let mut rig = Rig::new();
        rig.host("PEN");
        rig.connect(9);

        rig.step(10_001);
        assert_eq!(rig.take_tx(), "PING\n");
        rig.host("PONG");
        rig.take_tx();

        rig.step(10_001);
        assert_eq!(rig.take_tx(), "PING\n");
        let report = rig.step(10_001);
        assert_eq!(report.link, Some(LinkChange::TimedOut));
        assert_eq!(report.screen, Some(ScreenKind::Welcome));
    }

    #[test]
    fn test_read_error_keeps_tick_running() {
        let mut rig = Rig::new();
        rig.host("PEN");
        rig.connect(9);

        rig.uart.fail_reads = true;
        rig.input.buttons = 1 << 4;
        let report = rig.step(10_001);
        assert!(report.read_failed);
        assert_eq!(rig.take_tx(), "PING\n");
        assert!(report.flush.is_some());

        rig.input.buttons = 0;
        rig.step(20);
        rig.uart.fail_reads = false;
        let report = rig.step(20);
        assert!(!report.read_failed);
        assert!(!rig.pendant.context().work_space);
    }

    #[test]
    fn test_dialog_checklist_end_to_end() {
        let mut rig = Rig::new();
        rig.connect(9);
        let report = rig.host("DIALOG:5|Setup|\x01Clamp part|b|c|OK,Cancel");
        assert_eq!(report.screen, Some(ScreenKind::Dialog));
        rig.take_tx();

        rig.click(7);
        rig.click(3);
        assert!(!rig.take_tx().contains("DIALOG:"));
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Dialog);

        rig.click(0);
        rig.click(3);
        assert_eq!(rig.take_tx(), "DIALOG:5,1\n");
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Main);
    }

    #[test]
    fn test_replaced_dialog_answers_zero() {
        let mut rig = Rig::new();
        rig.connect(9);
        rig.host("DIALOG:1|A|a|b|c|OK,Cancel");
        rig.take_tx();
        rig.host("DIALOG:2|B|a|b|c|OK,Cancel");
        assert_eq!(rig.take_tx(), "\x1F\nDIALOG:1,0\n");
    }

    #[test]
    fn test_abort_from_any_screen() {
        let mut rig = Rig::new();
        rig.connect(9);
        rig.host("MACROS:0|Home|||||||");
        rig.click(7);
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Macro);
        rig.take_tx();

        rig.click(BUTTON_ABORT);
        assert_eq!(rig.take_tx(), "ABORT\n");
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Main);
    }

    #[test]
    fn test_probe_screen_from_host() {
        let mut rig = Rig::new();
        rig.connect(9);
        rig.host("PROBESCREEN:1");
        assert_eq!(rig.pendant.screens().current(), ScreenKind::ZProbe);
        assert_eq!(rig.pendant.screens().probe_mode(), ProbeMode::ReferenceTool);
        assert!(!rig.take_tx().contains("PROBE:ENTER"));

        rig.host("PROBESCREEN:7");
        assert_eq!(rig.pendant.screens().probe_mode(), ProbeMode::ReferenceTool);
    }

    #[test]
    fn test_probe_screen_needs_a_digit() {
        let mut rig = Rig::new();
        rig.connect(9);
        let report = rig.host("PROBESCREEN:x");
        assert_eq!(report.command, Some(CommandKind::Unknown));
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Main);
    }

    #[test]
    fn test_calibration_runs_without_link() {
        let mut rig = Rig::new();
        rig.input.joystick = (300, 700);
        rig.step(20);
        rig.host("CAL:STARTC");
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Calibration);
        assert_eq!(rig.take_tx(), "\x1F\nRAWJOY:300,700\n");

        rig.step(20);
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Calibration);

        rig.host("CAL:STOPC");
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Welcome);
    }

    #[test]
    fn test_wheel_reaches_jog() {
        let mut rig = Rig::new();
        rig.connect(9);
        rig.click(0);
        assert_eq!(rig.pendant.screens().current(), ScreenKind::Jog);
        rig.take_tx();

        rig.input.wheel = 3;
        rig.step(20);
        assert_eq!(rig.take_tx(), "JOG:WMX3*0.10\n");
    }

    #[test]
    fn test_idle_ticks_flush_nothing() {
        let mut rig = Rig::new();
        let report = rig.step(20);
        assert_eq!(report.flush, Some(FlushKind::Full));
        let report = rig.step(20);
        assert_eq!(report.flush, Some(FlushKind::None));
        assert_eq!(report.sent, 0);
    }

    #[test]
    fn test_invalidated_display_is_resent() {
        let mut rig = Rig::new();
        rig.step(20);
        rig.step(20);
        rig.pendant.invalidate_display();
        let report = rig.step(20);
        assert_eq!(report.flush, Some(FlushKind::Full));
    }
}
