//! SSD1309 OLED display driver
//!
//! Driver for 128x64 SSD1309-based OLED displays via I2C. Implements the
//! page-write backend the render strategies flush through; the frame
//! itself lives in the renderer.

use embedded_hal::i2c::I2c;

use pendant_display::{DisplayBackend, DisplayError, PAGES, WIDTH};

/// SSD1309 commands
#[allow(dead_code)]
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const ENTIRE_DISPLAY_RESUME: u8 = 0xA4;
}

/// Control byte for a command stream
const CONTROL_COMMAND: u8 = 0x00;

/// Control byte for a data stream
const CONTROL_DATA: u8 = 0x40;

/// SSD1309 OLED driver
pub struct Ssd1309<I2C> {
    i2c: I2C,
    address: u8,
    ready: bool,
}

impl<I2C: I2c> Ssd1309<I2C> {
    /// Create a new SSD1309 driver
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            ready: false,
        }
    }

    /// Send a command sequence
    fn commands(&mut self, cmds: &[u8]) -> Result<(), DisplayError> {
        for &c in cmds {
            self.i2c
                .write(self.address, &[CONTROL_COMMAND, c])
                .map_err(|_| DisplayError::Communication)?;
        }
        Ok(())
    }

    /// Set display contrast (0-255)
    #[allow(dead_code)]
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), DisplayError> {
        self.commands(&[cmd::SET_CONTRAST, contrast])
    }
}

impl<I2C: I2c> DisplayBackend for Ssd1309<I2C> {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.commands(&[
            cmd::DISPLAY_OFF,
            cmd::SET_CLOCK_DIV,
            0xA0,
            cmd::SET_MUX_RATIO,
            0x3F, // 64 lines
            cmd::SET_DISPLAY_OFFSET,
            0x00,
            cmd::SET_START_LINE,
            cmd::SET_MEMORY_MODE,
            0x02, // Page addressing
            cmd::SET_SEG_REMAP,
            cmd::SET_COM_SCAN_DEC,
            cmd::SET_COM_PINS,
            0x12,
            cmd::SET_CONTRAST,
            0x6F,
            cmd::SET_PRECHARGE,
            0xD3,
            cmd::SET_VCOM_DETECT,
            0x20,
            cmd::ENTIRE_DISPLAY_RESUME,
            cmd::SET_NORMAL,
            cmd::DISPLAY_ON,
        ])?;
        self.ready = true;
        Ok(())
    }

    fn write_page(&mut self, page: u8, column: u8, data: &[u8]) -> Result<(), DisplayError> {
        if !self.ready {
            return Err(DisplayError::NotInitialized);
        }
        if usize::from(page) >= PAGES || usize::from(column) + data.len() > WIDTH {
            return Err(DisplayError::InvalidArea);
        }

        self.commands(&[
            cmd::SET_PAGE_ADDR | page,
            cmd::SET_LOW_COLUMN | (column & 0x0F),
            cmd::SET_HIGH_COLUMN | (column >> 4),
        ])?;

        let mut buf = [0u8; WIDTH + 1];
        buf[0] = CONTROL_DATA;
        buf[1..=data.len()].copy_from_slice(data);
        self.i2c
            .write(self.address, &buf[..=data.len()])
            .map_err(|_| DisplayError::Communication)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
