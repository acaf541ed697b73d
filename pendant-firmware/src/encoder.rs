//! Hand wheel decoder
//!
//! Decodes the quadrature signal of the manual pulse generator into
//! signed clicks. Uses a state machine so contact bounce inside a detent
//! does not count.

use embassy_rp::gpio::Input;
use embassy_time::{Duration, Timer};

/// Time between two samples of the wheel lines
const POLL_MS: u64 = 1;

/// Decoder state machine states
#[derive(Clone, Copy, PartialEq)]
enum State {
    Idle,
    CwStep1,
    CwStep2,
    CcwStep1,
    CcwStep2,
}

/// Quadrature wheel decoder
pub struct Encoder<'d> {
    a: Input<'d>,
    b: Input<'d>,
    state: State,
    last_a: bool,
    last_b: bool,
}

impl<'d> Encoder<'d> {
    pub fn new(a: Input<'d>, b: Input<'d>) -> Self {
        let last_a = a.is_high();
        let last_b = b.is_high();

        Self {
            a,
            b,
            state: State::Idle,
            last_a,
            last_b,
        }
    }

    /// Wait one sample period and decode
    ///
    /// Returns +1 for a clockwise click, -1 for counter-clockwise.
    pub async fn poll(&mut self) -> Option<i16> {
        Timer::after(Duration::from_millis(POLL_MS)).await;

        let a = self.a.is_high();
        let b = self.b.is_high();
        if a == self.last_a && b == self.last_b {
            return None;
        }
        self.last_a = a;
        self.last_b = b;
        self.decode(a, b)
    }

    /// Idle (1,1) -> A falls -> both low -> either rises => clockwise
    /// Idle (1,1) -> B falls -> both low -> either rises => counter-clockwise
    fn decode(&mut self, a: bool, b: bool) -> Option<i16> {
        match self.state {
            State::Idle => {
                if !a && b {
                    self.state = State::CwStep1;
                } else if a && !b {
                    self.state = State::CcwStep1;
                }
                None
            }
            State::CwStep1 | State::CcwStep1 => {
                if !a && !b {
                    self.state = if self.state == State::CwStep1 {
                        State::CwStep2
                    } else {
                        State::CcwStep2
                    };
                } else if a && b {
                    // Bounce
                    self.state = State::Idle;
                }
                None
            }
            State::CwStep2 | State::CcwStep2 => {
                if !(a || b) {
                    return None;
                }
                let click = if self.state == State::CwStep2 { 1 } else { -1 };
                self.state = State::Idle;
                Some(click)
            }
        }
    }
}
