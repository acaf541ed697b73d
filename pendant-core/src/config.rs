//! Timing and layout constants
//!
//! All times are milliseconds of the monotonic tick clock.

/// Number of button lines, including the joystick press and abort
pub const BUTTON_COUNT: usize = 10;

/// Joystick press
pub const BUTTON_JOYSTICK: u8 = 8;

/// Emergency abort, handled regardless of the active screen
pub const BUTTON_ABORT: u8 = 9;

/// Minimum time between two accepted changes of one button
pub const DEBOUNCE_MS: u16 = 10;

/// A button held this long reports a hold instead of a click
pub const HOLD_MS: u16 = 1000;

/// Per-button timers saturate here
pub const TIMER_CAP_MS: u16 = 30000;

/// Joystick output range is `-JOYSTICK_STEPS..=JOYSTICK_STEPS`
pub const JOYSTICK_STEPS: i32 = 10;

/// Resting joystick sample before the first reading
pub const JOYSTICK_CENTER: u16 = 512;

/// A `PING` goes out this long after the previous one
pub const PING_INTERVAL_MS: u32 = 10000;

/// The machine must be busy this long before Stop buttons appear
pub const SHOW_STOP_MS: u32 = 500;

/// Jog closes after this long without input
pub const JOG_INACTIVITY_MS: u32 = 10000;

/// Idle actions on the jog screen reappear this long after the last busy tick
pub const JOG_ACTION_DELAY_MS: u32 = 250;

/// Minimum spacing of repeated joystick jog messages
pub const JOG_XY_RESEND_MS: u32 = 100;

/// An unused override capture releases the wheel after this long
pub const OVERRIDE_TIMEOUT_MS: u32 = 10000;

/// The alarm screen lingers this long after the alarm clears
pub const ALARM_DISMISS_MS: u32 = 1000;

/// Dialog buttons flagged with `!` close after this delay
pub const DIALOG_WAIT_MS: u32 = 500;

/// Probe jogging waits this long after the machine was last busy
pub const PROBE_BUSY_GUARD_MS: u32 = 500;

/// Baseline y of the five text rows
pub const ROWS: [i32; 5] = [0, 16, 29, 42, 55];

/// Rightmost text column used by right side buttons
pub const RIGHT_COLUMN: i32 = 17;
