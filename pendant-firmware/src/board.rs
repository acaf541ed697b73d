//! Board wiring and the collaborator implementations on top of it
//!
//! Raspberry Pi Pico based pendant:
//!
//! | Function            | Pin(s)                 |
//! |---------------------|------------------------|
//! | Host UART0 TX / RX  | GPIO0 / GPIO1          |
//! | Display I2C1 SDA/SCL| GPIO2 / GPIO3          |
//! | Buttons 0-7         | GPIO6 - GPIO13         |
//! | Joystick press      | GPIO14                 |
//! | Abort               | GPIO15                 |
//! | Hand wheel A / B    | GPIO16 / GPIO17        |
//! | Joystick X / Y      | GPIO26 (ADC0) / GPIO27 (ADC1) |
//!
//! Buttons pull up and read low while pressed.

use core::sync::atomic::Ordering;

use defmt::*;
use embassy_rp::adc::{Adc, Blocking, Channel as AdcChannel};
use embassy_rp::gpio::Input;
use embassy_time::Instant;

use pendant_core::config::BUTTON_COUNT;
use pendant_hal::clock::Clock;
use pendant_hal::input::InputHardware;
use pendant_hal::uart::{whole_lines, UartRx, UartTx};

use crate::channels::{RX_CHANNEL, TX_PIPE, WHEEL_CLICKS};

/// I2C address of the SSD1309 module
pub const DISPLAY_ADDRESS: u8 = 0x3C;

/// I2C bus speed
pub const DISPLAY_I2C_HZ: u32 = 400_000;

/// The RP2040 ADC is 12 bit, the joystick calibration works on 10 bit
const ADC_SHIFT: u16 = 2;

/// Pendant loop period
pub const TICK_MS: u64 = 10;

/// Watchdog timeout, several ticks long
pub const WATCHDOG_MS: u64 = 500;

/// Buttons, joystick and hand wheel
pub struct BoardInputs {
    buttons: [Input<'static>; BUTTON_COUNT],
    adc: Adc<'static, Blocking>,
    joystick_x: AdcChannel<'static>,
    joystick_y: AdcChannel<'static>,
    joystick: (u16, u16),
}

impl BoardInputs {
    pub fn new(
        buttons: [Input<'static>; BUTTON_COUNT],
        adc: Adc<'static, Blocking>,
        joystick_x: AdcChannel<'static>,
        joystick_y: AdcChannel<'static>,
    ) -> Self {
        Self {
            buttons,
            adc,
            joystick_x,
            joystick_y,
            joystick: (512, 512),
        }
    }
}

impl InputHardware for BoardInputs {
    fn read_buttons(&mut self) -> u16 {
        self.buttons
            .iter()
            .enumerate()
            .filter(|(_, button)| button.is_low())
            .fold(0, |bits, (i, _)| bits | (1 << i))
    }

    fn read_joystick(&mut self) -> (u16, u16) {
        // A failed conversion keeps the previous sample
        match self.adc.blocking_read(&mut self.joystick_x) {
            Ok(x) => self.joystick.0 = x >> ADC_SHIFT,
            Err(_) => trace!("Joystick X read failed"),
        }
        match self.adc.blocking_read(&mut self.joystick_y) {
            Ok(y) => self.joystick.1 = y >> ADC_SHIFT,
            Err(_) => trace!("Joystick Y read failed"),
        }
        self.joystick
    }

    fn drain_wheel(&mut self) -> i16 {
        WHEEL_CLICKS.swap(0, Ordering::Relaxed)
    }
}

/// Milliseconds since boot
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

/// Serial link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum SerialError {
    /// The transmit pipe could not take every line, the rest was dropped
    TxOverflow,
}

/// The host link as seen by the pendant loop
///
/// Reads come from the rx task's channel, writes go to the tx task's pipe.
/// Neither side waits.
pub struct SerialLink;

impl UartTx for SerialLink {
    type Error = SerialError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), SerialError> {
        // Only this task writes the pipe, so the free space cannot shrink
        let lines = whole_lines(data, TX_PIPE.free_capacity());
        let mut rest = lines;
        while !rest.is_empty() {
            match TX_PIPE.try_write(rest) {
                Ok(n) => rest = &rest[n..],
                Err(_) => return Err(SerialError::TxOverflow),
            }
        }
        if lines.len() < data.len() {
            return Err(SerialError::TxOverflow);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        Ok(())
    }
}

impl UartRx for SerialLink {
    type Error = SerialError;

    fn try_read_byte(&mut self) -> Result<Option<u8>, SerialError> {
        Ok(RX_CHANNEL.try_receive().ok())
    }
}
