//! Pendant to host messages
//!
//! Every message is one line. [`DeviceMessage::write_line`] renders the
//! text and the trailing `\n` into any [`core::fmt::Write`] sink, usually
//! a `heapless::String`.

use core::fmt::{self, Write};

use heapless::String;

use crate::commands::CALIBRATION_LEN;
use crate::PENDANT_VERSION;

/// Longest line the pendant sends
pub const MAX_MESSAGE_LEN: usize = 64;

/// Errors from message encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// The output buffer is full
    Overflow,
}

impl From<fmt::Error> for MessageError {
    fn from(_: fmt::Error) -> Self {
        MessageError::Overflow
    }
}

/// Which coordinates a jog command refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CoordSpace {
    /// Work coordinates, `L`
    Work,
    /// Machine coordinates, `G`
    Machine,
}

impl CoordSpace {
    fn letter(self) -> char {
        match self {
            CoordSpace::Work => 'L',
            CoordSpace::Machine => 'G',
        }
    }
}

/// `JOB:` verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobCommand {
    Start,
    Pause,
    Resume,
    Stop,
    /// Stop the spindle while paused
    SpindleOff,
}

impl JobCommand {
    fn verb(self) -> &'static str {
        match self {
            JobCommand::Start => "START",
            JobCommand::Pause => "PAUSE",
            JobCommand::Resume => "RESUME",
            JobCommand::Stop => "STOP",
            JobCommand::SpindleOff => "RPM0",
        }
    }
}

/// `PROBE:` verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeCommand {
    /// Probe screen opened in the given mode
    Enter(u8),
    /// Start probing in the given mode
    Start(u8),
    Connect,
    GotoSensor,
    Cancel,
    /// Continuous Z up
    ZUp,
    /// Continuous Z down
    ZDown,
    /// Stop continuous Z motion
    ZStop,
}

/// A line sent to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceMessage<'a> {
    /// Flow control credit
    Ack,
    /// `DANT:<version>`
    Version,
    /// `NAME:<name>`
    Name(&'a str),
    /// `CALIBRATION:<c0>,...,<c7>`
    Calibration(&'a [u16; CALIBRATION_LEN]),
    Ping,
    Abort,
    Home,
    Stop,
    Dismiss,
    JobMenu,
    /// `RUNMACRO:<n>`, 1-based
    RunMacro(u8),
    /// `DIALOG:<id>,<button>`
    DialogResponse { id: u32, button: u8 },
    /// Hand wheel jog of `clicks` steps of `rate`
    WheelJog {
        inches: bool,
        axis: char,
        clicks: i16,
        rate: u16,
    },
    /// Round the axis position to a multiple of `rate`
    RoundJog {
        inches: bool,
        space: CoordSpace,
        axis: char,
        rate: u16,
    },
    /// Move the axis to zero
    GotoZero { space: CoordSpace, axis: char },
    /// Joystick XY jog, each in `-10..=10`
    JoystickJog { x: i8, y: i8 },
    /// `SET0:<axis>`
    SetZero { axis: char },
    Job(JobCommand),
    /// `FEED:<delta>`, 0 resets
    FeedOverride(i16),
    /// `SPEED:<delta>`, 0 resets
    SpeedOverride(i16),
    Probe(ProbeCommand),
    /// `CAL:<stage>`
    CalStage(u8),
    /// `CAL:CANCEL`
    CalCancel,
    /// `RAWJOY:<x>,<y>`
    RawJoystick { x: u16, y: u16 },
}

/// Write a rate in fixed point: thousandths of an inch or hundredths of a mm
fn write_rate<W: Write>(out: &mut W, inches: bool, rate: u16) -> fmt::Result {
    if inches {
        write!(out, "{}.{:03}", rate / 1000, rate % 1000)
    } else {
        write!(out, "{}.{:02}", rate / 100, rate % 100)
    }
}

impl<'a> DeviceMessage<'a> {
    /// Write the message text without the line terminator
    pub fn write_to<W: Write>(&self, out: &mut W) -> fmt::Result {
        match *self {
            DeviceMessage::Ack => out.write_char('\x1F'),
            DeviceMessage::Version => write!(out, "DANT:{}", PENDANT_VERSION),
            DeviceMessage::Name(name) => write!(out, "NAME:{}", name),
            DeviceMessage::Calibration(values) => {
                out.write_str("CALIBRATION:")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.write_char(',')?;
                    }
                    write!(out, "{}", value)?;
                }
                Ok(())
            }
            DeviceMessage::Ping => out.write_str("PING"),
            DeviceMessage::Abort => out.write_str("ABORT"),
            DeviceMessage::Home => out.write_str("HOME"),
            DeviceMessage::Stop => out.write_str("STOP"),
            DeviceMessage::Dismiss => out.write_str("DISMISS"),
            DeviceMessage::JobMenu => out.write_str("JOBMENU"),
            DeviceMessage::RunMacro(index) => write!(out, "RUNMACRO:{}", index),
            DeviceMessage::DialogResponse { id, button } => {
                write!(out, "DIALOG:{},{}", id, button)
            }
            DeviceMessage::WheelJog {
                inches,
                axis,
                clicks,
                rate,
            } => {
                write!(out, "JOG:W{}{}{}*", if inches { 'I' } else { 'M' }, axis, clicks)?;
                write_rate(out, inches, rate)
            }
            DeviceMessage::RoundJog {
                inches,
                space,
                axis,
                rate,
            } => {
                write!(
                    out,
                    "JOG:R{}{}{}",
                    if inches { 'I' } else { 'M' },
                    space.letter(),
                    axis
                )?;
                write_rate(out, inches, rate)
            }
            DeviceMessage::GotoZero { space, axis } => {
                write!(out, "JOG:0{}{}", space.letter(), axis)
            }
            DeviceMessage::JoystickJog { x, y } => write!(out, "JOG:JXY{},{}", x, y),
            DeviceMessage::SetZero { axis } => write!(out, "SET0:{}", axis),
            DeviceMessage::Job(command) => write!(out, "JOB:{}", command.verb()),
            DeviceMessage::FeedOverride(delta) => write!(out, "FEED:{}", delta),
            DeviceMessage::SpeedOverride(delta) => write!(out, "SPEED:{}", delta),
            DeviceMessage::Probe(command) => {
                out.write_str("PROBE:")?;
                match command {
                    ProbeCommand::Enter(mode) => write!(out, "ENTER{}", mode),
                    ProbeCommand::Start(mode) => write!(out, "START{}", mode),
                    ProbeCommand::Connect => out.write_str("CONNECT"),
                    ProbeCommand::GotoSensor => out.write_str("GOTOSENSOR"),
                    ProbeCommand::Cancel => out.write_str("CANCEL"),
                    ProbeCommand::ZUp => out.write_str("Z+"),
                    ProbeCommand::ZDown => out.write_str("Z-"),
                    ProbeCommand::ZStop => out.write_str("Z="),
                }
            }
            DeviceMessage::CalStage(stage) => write!(out, "CAL:{}", stage),
            DeviceMessage::CalCancel => out.write_str("CAL:CANCEL"),
            DeviceMessage::RawJoystick { x, y } => write!(out, "RAWJOY:{},{}", x, y),
        }
    }

    /// Write the message followed by `\n`
    pub fn write_line<W: Write>(&self, out: &mut W) -> Result<(), MessageError> {
        self.write_to(out)?;
        out.write_char('\n')?;
        Ok(())
    }

    /// Render the message into its own line buffer
    pub fn to_line(&self) -> Result<String<MAX_MESSAGE_LEN>, MessageError> {
        let mut line = String::new();
        self.write_line(&mut line)?;
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(message: DeviceMessage) -> String<MAX_MESSAGE_LEN> {
        message.to_line().unwrap()
    }

    #[test]
    fn test_simple_messages() {
        assert_eq!(line(DeviceMessage::Ack).as_str(), "\x1F\n");
        assert_eq!(line(DeviceMessage::Version).as_str(), "DANT:1.0\n");
        assert_eq!(line(DeviceMessage::Ping).as_str(), "PING\n");
        assert_eq!(line(DeviceMessage::JobMenu).as_str(), "JOBMENU\n");
        assert_eq!(line(DeviceMessage::RunMacro(3)).as_str(), "RUNMACRO:3\n");
    }

    #[test]
    fn test_calibration() {
        let values = [0, 448, 576, 1023, 0, 448, 576, 1023];
        assert_eq!(
            line(DeviceMessage::Calibration(&values)).as_str(),
            "CALIBRATION:0,448,576,1023,0,448,576,1023\n"
        );
    }

    #[test]
    fn test_wheel_jog_units() {
        let msg = DeviceMessage::WheelJog {
            inches: false,
            axis: 'X',
            clicks: -3,
            rate: 10,
        };
        assert_eq!(line(msg).as_str(), "JOG:WMX-3*0.10\n");

        let msg = DeviceMessage::WheelJog {
            inches: true,
            axis: 'Z',
            clicks: 2,
            rate: 1005,
        };
        assert_eq!(line(msg).as_str(), "JOG:WIZ2*1.005\n");
    }

    #[test]
    fn test_round_and_zero() {
        let msg = DeviceMessage::RoundJog {
            inches: false,
            space: CoordSpace::Work,
            axis: 'Y',
            rate: 100,
        };
        assert_eq!(line(msg).as_str(), "JOG:RMLY1.00\n");

        let msg = DeviceMessage::GotoZero {
            space: CoordSpace::Machine,
            axis: 'Z',
        };
        assert_eq!(line(msg).as_str(), "JOG:0GZ\n");
        assert_eq!(line(DeviceMessage::SetZero { axis: 'X' }).as_str(), "SET0:X\n");
    }

    #[test]
    fn test_joystick_and_dialog() {
        assert_eq!(
            line(DeviceMessage::JoystickJog { x: -10, y: 3 }).as_str(),
            "JOG:JXY-10,3\n"
        );
        assert_eq!(
            line(DeviceMessage::DialogResponse { id: 42, button: 0 }).as_str(),
            "DIALOG:42,0\n"
        );
    }

    #[test]
    fn test_job_probe_override() {
        assert_eq!(line(DeviceMessage::Job(JobCommand::SpindleOff)).as_str(), "JOB:RPM0\n");
        assert_eq!(
            line(DeviceMessage::Probe(ProbeCommand::Enter(2))).as_str(),
            "PROBE:ENTER2\n"
        );
        assert_eq!(
            line(DeviceMessage::Probe(ProbeCommand::ZStop)).as_str(),
            "PROBE:Z=\n"
        );
        assert_eq!(line(DeviceMessage::FeedOverride(-5)).as_str(), "FEED:-5\n");
        assert_eq!(line(DeviceMessage::SpeedOverride(0)).as_str(), "SPEED:0\n");
    }

    #[test]
    fn test_calibration_messages() {
        assert_eq!(line(DeviceMessage::CalStage(4)).as_str(), "CAL:4\n");
        assert_eq!(line(DeviceMessage::CalCancel).as_str(), "CAL:CANCEL\n");
        assert_eq!(
            line(DeviceMessage::RawJoystick { x: 512, y: 1 }).as_str(),
            "RAWJOY:512,1\n"
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut tiny: String<4> = String::new();
        assert_eq!(
            DeviceMessage::Name("Controlinator 3000").write_line(&mut tiny),
            Err(MessageError::Overflow)
        );
    }
}
