//! Physical input sources
//!
//! Raw readings only. Debouncing, hold detection and joystick calibration
//! happen in the core.

/// Buttons, joystick and hand wheel of the pendant
pub trait InputHardware {
    /// Raw button state, bit `n` set while button `n` is pressed
    fn read_buttons(&mut self) -> u16;

    /// Raw joystick samples `(x, y)` in the range `0..=1023`
    fn read_joystick(&mut self) -> (u16, u16);

    /// Wheel clicks accumulated since the previous call
    ///
    /// Must read and clear atomically with respect to the producer.
    fn drain_wheel(&mut self) -> i16;
}
