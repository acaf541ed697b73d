//! Display backend trait
//!
//! The driver only has to move page-ordered bytes to the panel. Everything
//! else (fonts, primitives, dirty tracking) happens before that.

use crate::{PAGES, WIDTH};

/// Display backend errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Communication error with display
    Communication,
    /// Display not initialized
    NotInitialized,
    /// Page or column outside the panel
    InvalidArea,
}

/// A rectangle in 8x8 pixel tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TileArea {
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
}

impl TileArea {
    /// The whole panel
    pub const FULL: TileArea = TileArea {
        x: 0,
        y: 0,
        width: (WIDTH / 8) as u8,
        height: PAGES as u8,
    };

    /// Pixel columns covered by the area
    pub fn columns(&self) -> core::ops::Range<usize> {
        let start = usize::from(self.x) * 8;
        start..(start + usize::from(self.width) * 8).min(WIDTH)
    }

    /// Pages covered by the area
    pub fn pages(&self) -> core::ops::Range<u8> {
        self.y..(self.y + self.height).min(PAGES as u8)
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }
}

/// Display backend trait
///
/// Implementations write raw page data to the controller. A page is a row
/// of 8 pixels height; each byte is one column with bit 0 at the top.
pub trait DisplayBackend {
    /// Run the controller's power-up sequence
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Write `data` to `page` starting at pixel column `column`
    fn write_page(&mut self, page: u8, column: u8, data: &[u8]) -> Result<(), DisplayError>;

    /// Check if the display is ready
    fn is_ready(&self) -> bool;
}
