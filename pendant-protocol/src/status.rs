//! Machine status as reported by the host
//!
//! The numbering matches the host program's status table and must not be
//! reordered. Everything from [`MachineStatus::Idle`] onwards counts as
//! "not moving".

/// CNC controller state from `STATUS:`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MachineStatus {
    /// None of the below
    #[default]
    Unknown = 0,
    /// Host is running but the controller is not connected
    Disconnected = 1,
    Jog = 2,
    Run = 3,
    Check = 4,
    Home = 5,
    Running = 6,
    Resuming = 7,
    /// Door closed, resuming in progress
    Door3Resuming = 8,
    Idle = 9,
    /// Feed hold complete
    Hold0Complete = 10,
    /// Feed hold in progress
    Hold1Stopping = 11,
    /// Door closed, ready to resume
    Door0Closed = 12,
    /// Door opened, holding
    Door1Opened = 13,
    /// Door opened, stopping in progress
    Door2Stopping = 14,
    Alarm = 15,
    Sleep = 16,
    Stopped = 17,
    Paused = 18,
}

impl MachineStatus {
    /// Number of defined statuses
    pub const COUNT: u8 = 19;

    /// Convert from the wire number, out of range values become `Unknown`
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Disconnected,
            2 => Self::Jog,
            3 => Self::Run,
            4 => Self::Check,
            5 => Self::Home,
            6 => Self::Running,
            7 => Self::Resuming,
            8 => Self::Door3Resuming,
            9 => Self::Idle,
            10 => Self::Hold0Complete,
            11 => Self::Hold1Stopping,
            12 => Self::Door0Closed,
            13 => Self::Door1Opened,
            14 => Self::Door2Stopping,
            15 => Self::Alarm,
            16 => Self::Sleep,
            17 => Self::Stopped,
            18 => Self::Paused,
            _ => Self::Unknown,
        }
    }

    /// Convert a parsed wire integer, out of range values become `Unknown`
    pub fn from_wire(value: i32) -> Self {
        u8::try_from(value).map_or(Self::Unknown, Self::from_u8)
    }

    /// Wire number of this status
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Short name shown in the title bar
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown | Self::Disconnected => "???",
            Self::Jog => "Jog",
            Self::Run => "Run",
            Self::Check => "Check",
            Self::Home => "Home",
            Self::Running => "Running",
            Self::Resuming => "Resuming",
            Self::Door3Resuming => "Door:3",
            Self::Idle => "Idle",
            Self::Hold0Complete => "Hold:0",
            Self::Hold1Stopping => "Hold:1",
            Self::Door0Closed => "Door:0",
            Self::Door1Opened => "Door:1",
            Self::Door2Stopping => "Door:2",
            Self::Alarm => "Alarm",
            Self::Sleep => "Sleep",
            Self::Stopped => "Stopped",
            Self::Paused => "Paused",
        }
    }

    /// True for statuses where the machine is not executing motion
    pub fn is_inactive(self) -> bool {
        self >= Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_numbering() {
        assert_eq!(MachineStatus::from_u8(8), MachineStatus::Door3Resuming);
        assert_eq!(MachineStatus::from_u8(9), MachineStatus::Idle);
        assert_eq!(MachineStatus::from_u8(15), MachineStatus::Alarm);
        assert_eq!(MachineStatus::from_u8(18), MachineStatus::Paused);
    }

    #[test]
    fn test_roundtrip_all() {
        for value in 0..MachineStatus::COUNT {
            assert_eq!(MachineStatus::from_u8(value).as_u8(), value);
        }
    }

    #[test]
    fn test_out_of_range_is_unknown() {
        assert_eq!(MachineStatus::from_u8(19), MachineStatus::Unknown);
        assert_eq!(MachineStatus::from_wire(-1), MachineStatus::Unknown);
        assert_eq!(MachineStatus::from_wire(300), MachineStatus::Unknown);
    }

    #[test]
    fn test_inactive_split() {
        assert!(!MachineStatus::Running.is_inactive());
        assert!(!MachineStatus::Door3Resuming.is_inactive());
        assert!(MachineStatus::Idle.is_inactive());
        assert!(MachineStatus::Alarm.is_inactive());
        assert!(MachineStatus::Paused.is_inactive());
    }

    #[test]
    fn test_names() {
        assert_eq!(MachineStatus::Idle.name(), "Idle");
        assert_eq!(MachineStatus::Door1Opened.name(), "Door:1");
        assert_eq!(MachineStatus::Disconnected.name(), "???");
    }
}
