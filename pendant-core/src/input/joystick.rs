//! Joystick quantization
//!
//! Each axis has a four point calibration `[min, dead_low, dead_high, max]`.
//! Samples inside the dead zone read 0, samples outside it scale linearly
//! to `±JOYSTICK_STEPS`, truncating toward zero.

use crate::config::{JOYSTICK_CENTER, JOYSTICK_STEPS};

/// Raw joystick samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Joystick {
    pub x: u16,
    pub y: u16,
}

impl Default for Joystick {
    fn default() -> Self {
        Self {
            x: JOYSTICK_CENTER,
            y: JOYSTICK_CENTER,
        }
    }
}

impl Joystick {
    /// Quantized `(x, y)` using the X and Y halves of `calibration`
    pub fn quantized(&self, calibration: &[u16; 8]) -> (i8, i8) {
        let [x0, x1, x2, x3, y0, y1, y2, y3] = *calibration;
        (
            quantize(self.x, &[x0, x1, x2, x3]),
            quantize(self.y, &[y0, y1, y2, y3]),
        )
    }
}

/// Map a raw sample to `-JOYSTICK_STEPS..=JOYSTICK_STEPS`
pub fn quantize(value: u16, calibration: &[u16; 4]) -> i8 {
    let value = i32::from(value);
    let [min, dead_low, dead_high, max] = calibration.map(i32::from);

    if value < dead_low {
        let range = dead_low - min;
        if range <= 0 {
            return -JOYSTICK_STEPS as i8;
        }
        let steps = -1 - (dead_low - value - 1) * JOYSTICK_STEPS / range;
        return steps.max(-JOYSTICK_STEPS) as i8;
    }

    if value > dead_high {
        let range = max - dead_high;
        if range <= 0 {
            return JOYSTICK_STEPS as i8;
        }
        let steps = 1 + (value - dead_high - 1) * JOYSTICK_STEPS / range;
        return steps.min(JOYSTICK_STEPS) as i8;
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAL: [u16; 4] = [0, 448, 576, 1023];

    #[test]
    fn test_dead_zone_is_zero() {
        for v in 448..=576 {
            assert_eq!(quantize(v, &CAL), 0);
        }
    }

    #[test]
    fn test_extremes_reach_full_range() {
        assert_eq!(quantize(0, &CAL), -10);
        assert_eq!(quantize(1023, &CAL), 10);
    }

    #[test]
    fn test_first_step_outside_dead_zone() {
        assert_eq!(quantize(447, &CAL), -1);
        assert_eq!(quantize(577, &CAL), 1);
    }

    #[test]
    fn test_asymmetric_calibration() {
        let cal = [100, 200, 300, 900];
        assert_eq!(quantize(150, &cal), -5);
        assert_eq!(quantize(50, &cal), -10);
        assert_eq!(quantize(600, &cal), 5);
    }

    #[test]
    fn test_degenerate_calibration() {
        let cal = [448, 448, 576, 576];
        assert_eq!(quantize(0, &cal), -10);
        assert_eq!(quantize(1023, &cal), 10);
    }

    #[test]
    fn test_quantized_uses_both_halves() {
        let joystick = Joystick { x: 0, y: 1023 };
        let cal = [0, 448, 576, 1023, 0, 448, 576, 1023];
        assert_eq!(joystick.quantized(&cal), (-10, 10));
        assert_eq!(Joystick::default().quantized(&cal), (0, 0));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn calibration() -> impl Strategy<Value = [u16; 4]> {
            (0u16..300, 1u16..300, 0u16..300, 1u16..300).prop_map(|(min, a, b, c)| {
                [min, min + a, min + a + b, (min + a + b + c).min(1023)]
            })
        }

        proptest! {
            #[test]
            fn monotonic(cal in calibration(), a in 0u16..1024, b in 0u16..1024) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(quantize(lo, &cal) <= quantize(hi, &cal));
            }

            #[test]
            fn bounded(cal in calibration(), v in 0u16..1024) {
                let q = i32::from(quantize(v, &cal));
                prop_assert!((-JOYSTICK_STEPS..=JOYSTICK_STEPS).contains(&q));
            }

            #[test]
            fn boundaries_are_zero(cal in calibration()) {
                prop_assert_eq!(quantize(cal[1], &cal), 0);
                prop_assert_eq!(quantize(cal[2], &cal), 0);
            }
        }
    }
}
