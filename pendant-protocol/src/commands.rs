//! Host to pendant commands
//!
//! Each line is a verb with an optional `:`-prefixed payload. Verbs are
//! matched exactly (`PEN`, `BYE`, `PONG`, `JOBSCREEN`) or by prefix (all
//! verbs with a payload). Anything else is [`HostCommand::Unknown`].

use heapless::{String, Vec};

use crate::parse::{parse_int, truncated, FieldCursor};
use crate::status::MachineStatus;

/// Number of macro slots
pub const MACRO_COUNT: usize = 7;
/// Longest macro label
pub const MACRO_NAME_LEN: usize = 8;
/// Maximum number of jog rates
pub const MAX_JOG_RATES: usize = 5;
/// Jog rates used when the host sends none
pub const DEFAULT_JOG_RATES: [u16; 2] = [10, 100];
/// Longest dialog text line
pub const DIALOG_LINE_LEN: usize = 18;
/// Longest dialog button label
pub const DIALOG_BUTTON_LEN: usize = 14;
/// Longest pendant name
pub const NAME_LEN: usize = 18;
/// Number of joystick calibration values
pub const CALIBRATION_LEN: usize = 8;

/// Dialog marker for an unchecked checklist line
pub const CHAR_UNCHECKED: char = '\x01';
/// Dialog marker for a checked checklist line
pub const CHAR_CHECKED: char = '\x02';
/// Dialog marker for a button that needs a hold
pub const CHAR_HOLD: char = '\x03';

/// `STATUS:` payload
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub status: MachineStatus,
    /// Work coordinates in mm
    pub work: [f32; 3],
    /// Feed override percent
    pub feed_override: u16,
    /// Spindle speed override percent
    pub speed_override: u16,
    /// Actual feed rate in mm/min
    pub real_feed: u16,
    /// Actual spindle speed in rpm
    pub real_speed: u16,
    /// Job progress percent, -1 when unknown
    pub progress: i8,
}

impl StatusReport {
    /// Parse `<status>|<x>,<y>,<z>|<feed%>,<speed%>,<feed>,<speed>[|<progress>]`
    pub fn parse(payload: &str) -> Self {
        let mut cursor = FieldCursor::new(payload);
        let status = MachineStatus::from_wire(cursor.int());
        cursor.skip_past('|');
        let x = cursor.float();
        cursor.skip_past(',');
        let y = cursor.float();
        cursor.skip_past(',');
        let z = cursor.float();
        cursor.skip_past('|');
        let feed_override = cursor.int() as u16;
        cursor.skip_past(',');
        let speed_override = cursor.int() as u16;
        cursor.skip_past(',');
        let real_feed = cursor.int() as u16;
        cursor.skip_past(',');
        let real_speed = cursor.int() as u16;
        cursor.skip_past('|');
        let progress = match cursor.rest() {
            Some(rest) if !rest.is_empty() => parse_int(rest).clamp(0, 100) as i8,
            _ => -1,
        };

        Self {
            status,
            work: [x, y, z],
            feed_override,
            speed_override,
            real_feed,
            real_speed,
            progress,
        }
    }
}

/// Tool length offset state bits from `STATUS2:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TloState(pub u8);

impl TloState {
    /// Tool measurement is configured on the host
    pub const ENABLED: u8 = 1;
    /// A reference tool has been measured
    pub const HAS_REF: u8 = 2;
    /// The spindle is over the tool sensor
    pub const IN_POSITION: u8 = 4;

    pub fn enabled(self) -> bool {
        self.0 & Self::ENABLED != 0
    }

    pub fn has_ref(self) -> bool {
        self.0 & Self::HAS_REF != 0
    }

    pub fn in_position(self) -> bool {
        self.0 & Self::IN_POSITION != 0
    }
}

/// `STATUS2:` payload
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtendedStatus {
    pub job_running: bool,
    pub recently_homed: bool,
    pub probe_contact: bool,
    pub tlo: TloState,
    /// Work offset, machine = work + offset
    pub offset: [f32; 3],
}

impl ExtendedStatus {
    /// Parse `[J][H][P]<tlo digit><x>,<y>,<z>`
    pub fn parse(payload: &str) -> Self {
        let mut rest = payload;
        let job_running = take_flag(&mut rest, 'J');
        let recently_homed = take_flag(&mut rest, 'H');
        let probe_contact = take_flag(&mut rest, 'P');

        let mut chars = rest.chars();
        let tlo = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .map_or(0, |d| d as u8);
        let mut cursor = FieldCursor::new(chars.as_str());
        let x = cursor.float();
        cursor.skip_past(',');
        let y = cursor.float();
        cursor.skip_past(',');
        let z = cursor.float();

        Self {
            job_running,
            recently_homed,
            probe_contact,
            tlo: TloState(tlo),
            offset: [x, y, z],
        }
    }
}

fn take_flag(rest: &mut &str, flag: char) -> bool {
    match rest.strip_prefix(flag) {
        Some(tail) => {
            *rest = tail;
            true
        }
        None => false,
    }
}

/// `UNITS:` payload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitsReport {
    /// Show inches instead of mm
    pub inches: bool,
    /// Jog rates in thousandths of an inch or hundredths of a mm, never empty
    pub rates: Vec<u16, MAX_JOG_RATES>,
}

impl UnitsReport {
    /// Parse `<I|M>|<rate1>|<rate2>...`
    ///
    /// Every `|` introduces one rate. Without any, the defaults are used.
    pub fn parse(payload: &str) -> Self {
        let inches = payload.starts_with('I');
        let mut rates = Vec::new();
        let mut rest = payload.find('|').map(|i| &payload[i + 1..]);
        while let Some(text) = rest {
            if rates.push(parse_int(text) as u16).is_err() {
                break;
            }
            rest = text.find('|').map(|i| &text[i + 1..]);
        }
        if rates.is_empty() {
            rates = Vec::from_slice(&DEFAULT_JOG_RATES).unwrap_or_default();
        }
        Self { inches, rates }
    }
}

/// `MACROS:` payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacroTable {
    /// Bit `i` set when macro `i` fires on hold instead of click
    pub hold_flags: u8,
    /// Labels, empty for unused slots
    pub names: [String<MACRO_NAME_LEN>; MACRO_COUNT],
}

impl MacroTable {
    /// Parse `<hold flags>|<name1>|...|<name7>|`
    pub fn parse(payload: &str) -> Self {
        let mut cursor = FieldCursor::new(payload);
        let hold_flags = cursor.int() as u8;
        cursor.skip_past('|');
        let mut names: [String<MACRO_NAME_LEN>; MACRO_COUNT] = Default::default();
        for name in names.iter_mut() {
            *name = truncated(cursor.take_until('|'));
        }
        Self { hold_flags, names }
    }

    /// Bit `i` set when slot `i` has no label
    pub fn unused_mask(&self) -> u8 {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.is_empty())
            .fold(0, |mask, (i, _)| mask | (1 << i))
    }

    /// True when slot `i` fires on hold
    pub fn needs_hold(&self, index: usize) -> bool {
        index < MACRO_COUNT && self.hold_flags & (1 << index) != 0
    }
}

/// `CAL:` subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalCommand {
    /// Open the calibration screen
    StartCalibration,
    /// Close the calibration screen
    StopCalibration,
    /// Start streaming raw joystick samples
    StartJoystick,
    /// Stop streaming and close the calibration screen
    StopJoystick,
    Unknown,
}

impl CalCommand {
    pub fn parse(payload: &str) -> Self {
        match payload {
            "STARTC" => Self::StartCalibration,
            "STOPC" => Self::StopCalibration,
            "STARTJ" => Self::StartJoystick,
            "STOPJ" => Self::StopJoystick,
            _ => Self::Unknown,
        }
    }
}

/// `CALIBRATION:` payload
///
/// Only the first `count` values were present; the rest keep their
/// current setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationUpdate {
    pub values: [u16; CALIBRATION_LEN],
    pub count: usize,
}

impl CalibrationUpdate {
    /// Parse up to eight comma separated integers
    pub fn parse(payload: &str) -> Self {
        let mut values = [0u16; CALIBRATION_LEN];
        let mut count = 0;
        let mut cursor = FieldCursor::new(payload);
        for value in values.iter_mut() {
            *value = cursor.int().clamp(0, i32::from(u16::MAX)) as u16;
            count += 1;
            if cursor.skip_past(',').rest().is_none() {
                break;
            }
        }
        Self { values, count }
    }

    /// Overwrite the leading values of `current`
    pub fn apply_to(&self, current: &mut [u16; CALIBRATION_LEN]) {
        current[..self.count].copy_from_slice(&self.values[..self.count]);
    }
}

/// `DIALOG:` payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DialogRequest {
    /// Host token echoed in the response, 0 means none
    pub id: u32,
    /// Line 0 is the title, lines 1-3 the body
    pub lines: [String<DIALOG_LINE_LEN>; 4],
    /// Bit `i` set when body line `i + 1` is left aligned
    pub align_flags: u8,
    /// Bit `i` set when body line `i + 1` is an unchecked checklist item
    pub check_flags: u8,
    /// Left and right button labels
    pub buttons: [String<DIALOG_BUTTON_LEN>; 2],
    /// Bit `i` set when button `i` needs a hold
    pub hold_flags: u8,
    /// Bit `i` set when button `i` waits before closing
    pub wait_flags: u8,
}

impl DialogRequest {
    /// Parse `<id>|<title>|<line1>|<line2>|<line3>|<left>,<right>`
    pub fn parse(payload: &str) -> Self {
        let mut request = Self::default();
        let mut cursor = FieldCursor::new(payload);
        request.id = cursor.int().max(0) as u32;
        cursor.skip_past('|');

        for (i, line) in request.lines.iter_mut().enumerate() {
            let mut text = cursor.take_until('|');
            if i > 0 {
                let bit = 1 << (i - 1);
                if let Some(rest) = text.strip_prefix('^') {
                    request.align_flags |= bit;
                    text = rest;
                }
                if text.starts_with(CHAR_UNCHECKED) {
                    request.check_flags |= bit;
                    request.align_flags |= bit;
                }
            }
            *line = truncated(text);
        }

        let mut left = cursor.take_until(',');
        if let Some(rest) = left.strip_prefix(CHAR_HOLD) {
            request.hold_flags |= 1;
            left = rest;
        }
        if let Some(rest) = left.strip_prefix('!') {
            request.wait_flags |= 1;
            left = rest;
        }
        request.buttons[0] = truncated(left);

        let mut right = cursor.rest().unwrap_or("");
        if let Some(rest) = right.strip_prefix('!') {
            request.wait_flags |= 2;
            right = rest;
        }
        if let Some(rest) = right.strip_suffix(CHAR_HOLD) {
            request.hold_flags |= 2;
            right = rest;
        }
        request.buttons[1] = truncated(right);

        request
    }

    /// True for the single-button auto acknowledge form
    pub fn is_auto_ack(&self) -> bool {
        self.buttons[0].starts_with('@')
    }
}

/// A parsed host line
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostCommand<'a> {
    /// `PEN`
    Handshake,
    /// `BYE`
    Bye,
    /// `PONG`
    Pong,
    /// `STATUS:`
    Status(StatusReport),
    /// `STATUS2:`
    ExtendedStatus(ExtendedStatus),
    /// `UNITS:`
    Units(UnitsReport),
    /// `MACROS:`
    Macros(MacroTable),
    /// `CAL:`
    Cal(CalCommand),
    /// `NAME:`
    Name(String<NAME_LEN>),
    /// `CALIBRATION:`
    Calibration(CalibrationUpdate),
    /// `DIALOG:`
    Dialog(DialogRequest),
    /// `JOBSCREEN`
    JobScreen,
    /// `PROBESCREEN:<mode digit>`
    ProbeScreen(u8),
    /// Anything else, ignored
    Unknown(&'a str),
}

/// Payload-free tag of a [`HostCommand`], for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    Handshake,
    Bye,
    Pong,
    Status,
    ExtendedStatus,
    Units,
    Macros,
    Cal,
    Name,
    Calibration,
    Dialog,
    JobScreen,
    ProbeScreen,
    Unknown,
}

impl<'a> HostCommand<'a> {
    /// Parse one line without its terminator
    pub fn parse(line: &'a str) -> Self {
        match line {
            "PEN" => return Self::Handshake,
            "BYE" => return Self::Bye,
            "PONG" => return Self::Pong,
            "JOBSCREEN" => return Self::JobScreen,
            _ => {}
        }

        if let Some(payload) = line.strip_prefix("STATUS:") {
            Self::Status(StatusReport::parse(payload))
        } else if let Some(payload) = line.strip_prefix("STATUS2:") {
            Self::ExtendedStatus(ExtendedStatus::parse(payload))
        } else if let Some(payload) = line.strip_prefix("UNITS:") {
            Self::Units(UnitsReport::parse(payload))
        } else if let Some(payload) = line.strip_prefix("MACROS:") {
            Self::Macros(MacroTable::parse(payload))
        } else if let Some(payload) = line.strip_prefix("CAL:") {
            Self::Cal(CalCommand::parse(payload))
        } else if let Some(payload) = line.strip_prefix("NAME:") {
            Self::Name(truncated(payload))
        } else if let Some(payload) = line.strip_prefix("CALIBRATION:") {
            Self::Calibration(CalibrationUpdate::parse(payload))
        } else if let Some(payload) = line.strip_prefix("DIALOG:") {
            Self::Dialog(DialogRequest::parse(payload))
        } else if let Some(payload) = line.strip_prefix("PROBESCREEN:") {
            match payload.chars().next().and_then(|c| c.to_digit(10)) {
                Some(digit) => Self::ProbeScreen(digit as u8),
                None => Self::Unknown(line),
            }
        } else {
            Self::Unknown(line)
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Handshake => CommandKind::Handshake,
            Self::Bye => CommandKind::Bye,
            Self::Pong => CommandKind::Pong,
            Self::Status(_) => CommandKind::Status,
            Self::ExtendedStatus(_) => CommandKind::ExtendedStatus,
            Self::Units(_) => CommandKind::Units,
            Self::Macros(_) => CommandKind::Macros,
            Self::Cal(_) => CommandKind::Cal,
            Self::Name(_) => CommandKind::Name,
            Self::Calibration(_) => CommandKind::Calibration,
            Self::Dialog(_) => CommandKind::Dialog,
            Self::JobScreen => CommandKind::JobScreen,
            Self::ProbeScreen(_) => CommandKind::ProbeScreen,
            Self::Unknown(_) => CommandKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_exact_verbs() {
        assert_eq!(HostCommand::parse("PEN"), HostCommand::Handshake);
        assert_eq!(HostCommand::parse("BYE"), HostCommand::Bye);
        assert_eq!(HostCommand::parse("PONG"), HostCommand::Pong);
        assert_eq!(HostCommand::parse("JOBSCREEN"), HostCommand::JobScreen);
        assert_eq!(HostCommand::parse("PENDANT"), HostCommand::Unknown("PENDANT"));
        assert_eq!(HostCommand::parse("JOBSCREEN2").kind(), CommandKind::Unknown);
    }

    #[test]
    fn test_status_line() {
        let cmd = HostCommand::parse("STATUS:8|1.000,2.000,3.000|50,75,100,200");
        let HostCommand::Status(report) = cmd else {
            panic!("not a status");
        };
        assert_eq!(report.status, MachineStatus::Door3Resuming);
        assert!(close(report.work[0], 1.0));
        assert!(close(report.work[1], 2.0));
        assert!(close(report.work[2], 3.0));
        assert_eq!(report.feed_override, 50);
        assert_eq!(report.speed_override, 75);
        assert_eq!(report.real_feed, 100);
        assert_eq!(report.real_speed, 200);
        assert_eq!(report.progress, -1);
    }

    #[test]
    fn test_status_with_progress() {
        let report = StatusReport::parse("3|0,0,0|100,100,500,12000|42");
        assert_eq!(report.status, MachineStatus::Run);
        assert_eq!(report.progress, 42);
        assert_eq!(report.real_speed, 12000);
    }

    #[test]
    fn test_status_missing_fields_are_zero() {
        let report = StatusReport::parse("9|-1.5");
        assert_eq!(report.status, MachineStatus::Idle);
        assert!(close(report.work[0], -1.5));
        assert_eq!(report.work[1], 0.0);
        assert_eq!(report.feed_override, 0);
        assert_eq!(report.progress, -1);
    }

    #[test]
    fn test_status2_flags() {
        let status = ExtendedStatus::parse("JHP7-10.000,20.500,0.000");
        assert!(status.job_running);
        assert!(status.recently_homed);
        assert!(status.probe_contact);
        assert!(status.tlo.enabled() && status.tlo.has_ref() && status.tlo.in_position());
        assert!(close(status.offset[0], -10.0));
        assert!(close(status.offset[1], 20.5));

        let status = ExtendedStatus::parse("01.000,2.000,3.000");
        assert!(!status.job_running && !status.recently_homed && !status.probe_contact);
        assert_eq!(status.tlo, TloState(0));
        assert!(close(status.offset[2], 3.0));
    }

    #[test]
    fn test_status2_homed_without_job() {
        let status = ExtendedStatus::parse("H10,0,0");
        assert!(!status.job_running);
        assert!(status.recently_homed);
        assert!(status.tlo.enabled());
        assert!(!status.tlo.has_ref());
    }

    #[test]
    fn test_units() {
        let units = UnitsReport::parse("I|1|10|100");
        assert!(units.inches);
        assert_eq!(units.rates.as_slice(), &[1, 10, 100]);

        let units = UnitsReport::parse("M");
        assert!(!units.inches);
        assert_eq!(units.rates.as_slice(), &DEFAULT_JOG_RATES);

        let units = UnitsReport::parse("M|1|2|3|4|5|6|7");
        assert_eq!(units.rates.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_macros() {
        let table = MacroTable::parse("3|Home|Probe||Vac|||");
        assert_eq!(table.names[0].as_str(), "Home");
        assert_eq!(table.names[1].as_str(), "Probe");
        assert_eq!(table.names[3].as_str(), "Vac");
        assert!(table.needs_hold(0));
        assert!(table.needs_hold(1));
        assert!(!table.needs_hold(3));
        assert_eq!(table.unused_mask(), 0b111_0100);
    }

    #[test]
    fn test_macro_names_truncated() {
        let table = MacroTable::parse("0|ABCDEFGHIJK|");
        assert_eq!(table.names[0].as_str(), "ABCDEFGH");
        assert_eq!(table.unused_mask(), 0b111_1110);
    }

    #[test]
    fn test_cal_subcommands() {
        assert_eq!(
            HostCommand::parse("CAL:STARTC"),
            HostCommand::Cal(CalCommand::StartCalibration)
        );
        assert_eq!(CalCommand::parse("STOPJ"), CalCommand::StopJoystick);
        assert_eq!(CalCommand::parse("NOPE"), CalCommand::Unknown);
    }

    #[test]
    fn test_calibration_partial() {
        let update = CalibrationUpdate::parse("1,2,3");
        assert_eq!(update.count, 3);
        let mut current = [9u16; 8];
        update.apply_to(&mut current);
        assert_eq!(current, [1, 2, 3, 9, 9, 9, 9, 9]);

        let update = CalibrationUpdate::parse("0,448,576,1023,0,448,576,1023");
        assert_eq!(update.count, 8);
        assert_eq!(update.values, [0, 448, 576, 1023, 0, 448, 576, 1023]);
    }

    #[test]
    fn test_name_truncated() {
        assert_eq!(
            HostCommand::parse("NAME:A very long pendant name"),
            HostCommand::Name(truncated("A very long pendan"))
        );
    }

    #[test]
    fn test_probe_screen() {
        assert_eq!(HostCommand::parse("PROBESCREEN:2"), HostCommand::ProbeScreen(2));
        assert_eq!(HostCommand::parse("PROBESCREEN:"), HostCommand::Unknown("PROBESCREEN:"));
        assert_eq!(HostCommand::parse("PROBESCREEN:x"), HostCommand::Unknown("PROBESCREEN:x"));
    }

    #[test]
    fn test_dialog_basic() {
        let HostCommand::Dialog(dialog) =
            HostCommand::parse("DIALOG:12|Title|Line one|^Left|\x01Check me|OK,Cancel")
        else {
            panic!("not a dialog");
        };
        assert_eq!(dialog.id, 12);
        assert_eq!(dialog.lines[0].as_str(), "Title");
        assert_eq!(dialog.lines[2].as_str(), "Left");
        assert_eq!(dialog.lines[3].as_str(), "\x01Check me");
        assert_eq!(dialog.align_flags, 0b110);
        assert_eq!(dialog.check_flags, 0b100);
        assert_eq!(dialog.buttons[0].as_str(), "OK");
        assert_eq!(dialog.buttons[1].as_str(), "Cancel");
        assert_eq!(dialog.hold_flags, 0);
        assert_eq!(dialog.wait_flags, 0);
    }

    #[test]
    fn test_dialog_button_flags() {
        let dialog = DialogRequest::parse("5||||| \x03!Go,!Stop\x03");
        assert_eq!(dialog.buttons[0].as_str(), " \x03!Go");

        let dialog = DialogRequest::parse("5|||||\x03!Go,!Stop\x03");
        assert_eq!(dialog.buttons[0].as_str(), "Go");
        assert_eq!(dialog.buttons[1].as_str(), "Stop");
        assert_eq!(dialog.hold_flags, 0b11);
        assert_eq!(dialog.wait_flags, 0b11);
    }

    #[test]
    fn test_dialog_truncation_and_auto_ack() {
        let dialog =
            DialogRequest::parse("1|T|0123456789ABCDEFGHIJ|||@,ButtonLabelIsTooLong");
        assert_eq!(dialog.lines[1].len(), DIALOG_LINE_LEN);
        assert!(dialog.is_auto_ack());
        assert_eq!(dialog.buttons[1].len(), DIALOG_BUTTON_LEN);
    }

    #[test]
    fn test_dialog_missing_fields() {
        let dialog = DialogRequest::parse("7|Only title");
        assert_eq!(dialog.id, 7);
        assert_eq!(dialog.lines[0].as_str(), "Only title");
        assert!(dialog.lines[1].is_empty());
        assert!(dialog.buttons[0].is_empty());
        assert!(dialog.buttons[1].is_empty());
    }
}
