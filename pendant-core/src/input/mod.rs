//! Input processing
//!
//! ```text
//! raw button bits ──▶ Buttons::update ──▶ click / unclick / hold / down
//! raw ADC samples ──▶ Joystick        ──▶ quantize ──▶ -10..=10 per axis
//! ```

pub mod buttons;
pub mod joystick;

pub use buttons::Buttons;
pub use joystick::{quantize, Joystick};
