//! State shared by the dispatcher and the screens
//!
//! Everything a screen reads or writes during a tick lives in one
//! [`Context`] owned by the orchestrator and passed down explicitly.

use heapless::Vec;
use pendant_protocol::commands::{MAX_JOG_RATES, DEFAULT_JOG_RATES};
use pendant_protocol::{
    DeviceMessage, ExtendedStatus, MachineStatus, MacroTable, StatusReport, TloState, UnitsReport,
};

use crate::config::SHOW_STOP_MS;
use crate::input::{Buttons, Joystick};
use crate::outbox::Outbox;
use crate::settings::Settings;

/// Machine state reported by the host
#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub status: MachineStatus,
    /// Work coordinates in mm
    pub work: [f32; 3],
    /// Work offset in mm, machine = work + offset
    pub offset: [f32; 3],
    pub feed_override: u16,
    pub speed_override: u16,
    pub real_feed: u16,
    pub real_speed: u16,
    /// Job progress percent, -1 when unknown
    pub progress: i8,
    pub job_running: bool,
    pub recently_homed: bool,
    pub probe_contact: bool,
    pub tlo: TloState,
    /// Show inches instead of mm
    pub inches: bool,
    /// Jog rates in thousandths of an inch or hundredths of a mm
    pub jog_rates: Vec<u16, MAX_JOG_RATES>,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            status: MachineStatus::Unknown,
            work: [0.0; 3],
            offset: [0.0; 3],
            feed_override: 0,
            speed_override: 0,
            real_feed: 0,
            real_speed: 0,
            progress: -1,
            job_running: false,
            recently_homed: false,
            probe_contact: false,
            tlo: TloState::default(),
            inches: false,
            jog_rates: Vec::from_slice(&DEFAULT_JOG_RATES).unwrap_or_default(),
        }
    }
}

impl Machine {
    pub fn apply_status(&mut self, report: &StatusReport) {
        self.status = report.status;
        self.work = report.work;
        self.feed_override = report.feed_override;
        self.speed_override = report.speed_override;
        self.real_feed = report.real_feed;
        self.real_speed = report.real_speed;
        self.progress = report.progress;
    }

    pub fn apply_extended(&mut self, report: &ExtendedStatus) {
        self.job_running = report.job_running;
        self.recently_homed = report.recently_homed;
        self.probe_contact = report.probe_contact;
        self.tlo = report.tlo;
        self.offset = report.offset;
    }

    pub fn apply_units(&mut self, report: &UnitsReport) {
        self.inches = report.inches;
        self.jog_rates = report.rates.clone();
    }

    /// Coordinate shown for `axis`, work or machine space
    pub fn coordinate(&self, axis: usize, work_space: bool) -> f32 {
        let axis = axis.min(2);
        if work_space {
            self.work[axis]
        } else {
            self.work[axis] + self.offset[axis]
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == MachineStatus::Idle
    }
}

/// Per-tick shared state
#[derive(Debug)]
pub struct Context {
    /// Current time in ms, never 0
    pub now: u32,
    /// Time since the previous tick
    pub dt: u16,
    pub machine: Machine,
    pub buttons: Buttons,
    pub joystick: Joystick,
    pub settings: Settings,
    pub macros: MacroTable,
    pub outbox: Outbox,
    /// Mirrors the link monitor
    pub connected: bool,
    /// Show work coordinates instead of machine coordinates
    pub work_space: bool,
    /// Last tick the machine was idle or better
    pub last_idle: u32,
    /// Last tick the machine was moving
    pub last_busy: u32,
    /// The machine has been busy long enough to offer Stop
    pub can_show_stop: bool,
    wheel: i16,
}

impl Context {
    pub fn new(settings: Settings) -> Self {
        Self {
            now: 1,
            dt: 0,
            machine: Machine::default(),
            buttons: Buttons::new(),
            joystick: Joystick::default(),
            settings,
            macros: MacroTable::default(),
            outbox: Outbox::new(),
            connected: false,
            work_space: true,
            last_idle: 0,
            last_busy: 0,
            can_show_stop: false,
            wheel: 0,
        }
    }

    /// Queue a message for the host
    pub fn send(&mut self, message: DeviceMessage<'_>) {
        self.outbox.send(message);
    }

    /// Milliseconds since `time`
    pub fn since(&self, time: u32) -> u32 {
        self.now.wrapping_sub(time)
    }

    /// Add wheel clicks read from the hardware this tick
    pub fn add_wheel(&mut self, clicks: i16) {
        self.wheel = self.wheel.saturating_add(clicks);
    }

    /// Take the accumulated wheel clicks
    pub fn take_wheel(&mut self) -> i16 {
        core::mem::take(&mut self.wheel)
    }

    /// True while the host is gone or reports no controller
    pub fn link_down(&self) -> bool {
        !self.connected || self.machine.status == MachineStatus::Disconnected
    }

    /// Quantized joystick position
    pub fn joystick_position(&self) -> (i8, i8) {
        self.joystick.quantized(&self.settings.calibration)
    }

    /// Refresh the idle/busy timestamps and the Stop gate
    pub fn track_activity(&mut self) {
        if self.machine.status.is_inactive() {
            self.last_idle = self.now;
        } else {
            self.last_busy = self.now;
        }
        self.can_show_stop = self.since(self.last_idle) > SHOW_STOP_MS;
    }
}
