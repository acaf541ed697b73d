//! Button debouncer with click and hold detection
//!
//! Each button has a timer counting milliseconds since its last accepted
//! change. A change arriving while the timer is below [`DEBOUNCE_MS`] is
//! rejected. A button kept down past [`HOLD_MS`] reports one hold and its
//! timer is parked at a sentinel until the button is released, so a press
//! produces either the click-driven action or the hold, never both.

use crate::config::{BUTTON_COUNT, DEBOUNCE_MS, HOLD_MS, TIMER_CAP_MS};

/// Timer value of a button that already reported a hold or was released
/// by a screen change
const HELD: u16 = u16::MAX;

const ALL_BUTTONS: u16 = (1 << BUTTON_COUNT) - 1;

/// Debounced button state
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons {
    /// Accepted state, bit set while down
    state: u16,
    /// Went down this tick
    click: u16,
    /// Went up this tick
    unclick: u16,
    /// Crossed the hold time this tick
    hold: u16,
    /// Down and still owned by the current screen
    down: u16,
    timers: [u16; BUTTON_COUNT],
}

impl Default for Buttons {
    fn default() -> Self {
        Self::new()
    }
}

impl Buttons {
    pub const fn new() -> Self {
        Self {
            state: 0,
            click: 0,
            unclick: 0,
            hold: 0,
            down: 0,
            timers: [0; BUTTON_COUNT],
        }
    }

    /// Feed the raw button bits sampled `dt_ms` after the previous call
    pub fn update(&mut self, raw: u16, dt_ms: u16) {
        let mut raw = raw & ALL_BUTTONS;

        let changed = self.state ^ raw;
        for (i, &timer) in self.timers.iter().enumerate() {
            let mask = 1 << i;
            if changed & mask != 0 && timer < DEBOUNCE_MS {
                raw ^= mask;
            }
        }

        let changed = self.state ^ raw;
        self.click = raw & !self.state;
        self.unclick = !raw & self.state;
        self.state = raw;
        self.hold = 0;
        self.down = 0;

        for (i, timer) in self.timers.iter_mut().enumerate() {
            let mask = 1 << i;
            if changed & mask != 0 {
                *timer = 0;
            } else if *timer != HELD {
                let mut next = timer.saturating_add(dt_ms).min(TIMER_CAP_MS);
                if self.state & mask != 0 && *timer <= HOLD_MS && next > HOLD_MS {
                    self.hold |= mask;
                    next = HELD;
                }
                *timer = next;
            }

            if self.state & mask != 0 && (self.hold & mask != 0 || *timer != HELD) {
                self.down |= mask;
            }
        }
    }

    /// Treat every pressed button as released until it is pressed again
    ///
    /// Called when a screen is activated so the press that caused the
    /// change is not seen by the new screen.
    pub fn release_all(&mut self) {
        for (i, timer) in self.timers.iter_mut().enumerate() {
            if self.state & (1 << i) != 0 {
                *timer = HELD;
            }
        }
        self.down = 0;
    }

    /// Accepted state bits
    pub fn state(&self) -> u16 {
        self.state
    }

    pub fn click_bits(&self) -> u16 {
        self.click
    }

    pub fn hold_bits(&self) -> u16 {
        self.hold
    }

    pub fn down_bits(&self) -> u16 {
        self.down
    }

    /// Button is physically down (debounced)
    pub fn pressed(&self, button: u8) -> bool {
        bit_set(self.state, button)
    }

    /// Button went down this tick
    pub fn clicked(&self, button: u8) -> bool {
        bit_set(self.click, button)
    }

    /// Button went up this tick
    pub fn released(&self, button: u8) -> bool {
        bit_set(self.unclick, button)
    }

    /// Button crossed the hold time this tick
    pub fn held(&self, button: u8) -> bool {
        bit_set(self.hold, button)
    }

    /// Button is down and belongs to the current screen
    pub fn is_down(&self, button: u8) -> bool {
        bit_set(self.down, button)
    }

    /// True while any button is physically down
    pub fn any_pressed(&self) -> bool {
        self.state != 0
    }

    /// Lowest button clicked this tick
    pub fn current(&self) -> Option<u8> {
        (0..BUTTON_COUNT as u8).find(|&b| self.clicked(b))
    }
}

pub fn bit_set(bits: u16, bit: u8) -> bool {
    u32::from(bits) & (1 << bit) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tick the debouncer `ms` milliseconds in 10 ms steps with `raw` held
    fn run(buttons: &mut Buttons, raw: u16, ms: u16) -> (u16, u16) {
        let mut clicks = 0;
        let mut holds = 0;
        let mut left = ms;
        while left > 0 {
            let dt = left.min(10);
            buttons.update(raw, dt);
            clicks |= buttons.click_bits();
            holds += buttons.hold_bits().count_ones() as u16;
            left -= dt;
        }
        (clicks, holds)
    }

    #[test]
    fn test_click_after_settle() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        buttons.update(0b1, 10);
        assert!(buttons.clicked(0));
        assert!(buttons.pressed(0));
        assert!(buttons.is_down(0));
        assert_eq!(buttons.current(), Some(0));

        buttons.update(0b1, 10);
        assert!(!buttons.clicked(0));
        assert!(buttons.pressed(0));
    }

    #[test]
    fn test_bounce_rejected() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        buttons.update(0b1, 10);
        assert!(buttons.pressed(0));

        // release 5 ms after the press is a bounce
        buttons.update(0b0, 5);
        assert!(buttons.pressed(0));
        assert!(!buttons.released(0));

        buttons.update(0b1, 10);
        buttons.update(0b0, 1);
        assert!(!buttons.pressed(0));
        assert!(buttons.released(0));
    }

    #[test]
    fn test_hold_fires_once() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        let (clicks, holds) = run(&mut buttons, 0b1000, 3000);
        assert_eq!(clicks, 0b1000);
        assert_eq!(holds, 1);
        // the hold consumed the press
        assert!(!buttons.is_down(3));
        assert!(buttons.pressed(3));
    }

    #[test]
    fn test_short_press_has_no_hold() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        let (_, holds) = run(&mut buttons, 0b1, 500);
        assert_eq!(holds, 0);
        run(&mut buttons, 0, 20);
        assert!(!buttons.pressed(0));
    }

    #[test]
    fn test_release_all_hides_pressed_buttons() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        run(&mut buttons, 0b10, 50);
        buttons.release_all();
        assert_eq!(buttons.down_bits(), 0);

        let (clicks, holds) = run(&mut buttons, 0b10, 3000);
        assert_eq!(clicks, 0);
        assert_eq!(holds, 0);
        assert!(!buttons.is_down(1));
        assert!(buttons.pressed(1));

        // a new press after release is seen again
        run(&mut buttons, 0, 50);
        buttons.update(0b10, 10);
        assert!(buttons.clicked(1));
    }

    #[test]
    fn test_unknown_bits_ignored() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        buttons.update(0xFC00, 10);
        assert_eq!(buttons.state(), 0);
    }

    #[test]
    fn test_current_is_lowest_click() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        buttons.update(0b1010_0000, 10);
        assert_eq!(buttons.current(), Some(5));
    }

    #[test]
    fn test_large_dt_saturates() {
        let mut buttons = Buttons::new();
        run(&mut buttons, 0, 100);
        buttons.update(0b1, 10);
        buttons.update(0b1, u16::MAX);
        assert!(buttons.held(0));
        buttons.update(0b1, u16::MAX);
        assert!(!buttons.held(0));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn change_inside_window_is_rejected(gap in 0u16..DEBOUNCE_MS) {
                let mut buttons = Buttons::new();
                run(&mut buttons, 0, 100);
                buttons.update(0b1, 20);
                buttons.update(0b0, gap);
                prop_assert!(buttons.pressed(0));
            }

            #[test]
            fn change_after_window_is_accepted(gap in DEBOUNCE_MS..2000) {
                let mut buttons = Buttons::new();
                run(&mut buttons, 0, 100);
                buttons.update(0b1, 20);
                buttons.update(0b1, gap);
                buttons.update(0b0, 0);
                prop_assert!(!buttons.pressed(0));
            }

            #[test]
            fn hold_at_most_once_per_press(
                button in 0u8..BUTTON_COUNT as u8,
                steps in proptest::collection::vec(1u16..200, 1..60),
            ) {
                let mut buttons = Buttons::new();
                run(&mut buttons, 0, 100);
                let mut holds = 0;
                let mut total: u32 = 0;
                for dt in steps {
                    buttons.update(1 << button, dt);
                    total += u32::from(dt);
                    if buttons.held(button) {
                        holds += 1;
                    }
                }
                prop_assert!(holds <= 1);
                if total > u32::from(HOLD_MS) + u32::from(DEBOUNCE_MS) + 200 {
                    prop_assert_eq!(holds, 1);
                }
            }
        }
    }
}
