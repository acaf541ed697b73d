//! Pendant Line Protocol
//!
//! This crate defines the serial protocol between the pendant and the host
//! program driving the CNC controller. Both directions use newline
//! terminated ASCII lines:
//!
//! ```text
//! host -> pendant   VERB[:payload]\n        e.g. STATUS:9|1.000,2.000,3.000|100,100,0,0
//! pendant -> host   VERB[:payload]\n        e.g. JOG:WMX3*0.10
//! ```
//!
//! Flow control uses a single reserved byte, [`ACK_BYTE`]. The pendant
//! answers every complete line except the `PEN` handshake with `0x1F\n`,
//! and answers a bare `0x1F` from the host (meaning "partial buffer, send
//! more") immediately.
//!
//! Unknown or malformed lines are never errors: they parse to
//! [`HostCommand::Unknown`] or to zero-filled fields so older and newer
//! hosts keep working.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod commands;
pub mod line;
pub mod messages;
pub mod parse;
pub mod status;

pub use commands::{
    CalCommand, CalibrationUpdate, CommandKind, DialogRequest, ExtendedStatus, HostCommand,
    MacroTable, StatusReport, TloState, UnitsReport,
};
pub use line::{Line, LineEvent, LineParser, ACK_BYTE, LINE_BUFFER_SIZE, MAX_LINE_LEN};
pub use messages::{CoordSpace, DeviceMessage, JobCommand, MessageError, ProbeCommand};
pub use status::MachineStatus;

/// Protocol version reported in the `DANT:` handshake reply
pub const PENDANT_VERSION: &str = "1.0";

/// Serial link speed shared with the host tooling
pub const PENDANT_BAUD_RATE: u32 = 38400;
