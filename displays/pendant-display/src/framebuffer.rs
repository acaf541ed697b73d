//! Pixel stores in controller page layout
//!
//! Byte `column` of page `p` holds pixels `(column, p*8 .. p*8+8)` with
//! bit 0 at the top, which is what SSD13xx style controllers expect.

use crate::backend::{DisplayBackend, DisplayError, TileArea};
use crate::canvas::Surface;
use crate::{HEIGHT, PAGES, WIDTH};

/// Full 128x64 frame buffer
#[derive(Clone)]
pub struct FrameBuffer {
    pages: [[u8; WIDTH]; PAGES],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub const fn new() -> Self {
        Self {
            pages: [[0; WIDTH]; PAGES],
        }
    }

    /// Read one pixel, `false` outside the display
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        if !(0..WIDTH as i32).contains(&x) || !(0..HEIGHT as i32).contains(&y) {
            return false;
        }
        self.pages[y as usize / 8][x as usize] & (1 << (y % 8)) != 0
    }

    /// Raw page data
    pub fn page(&self, page: usize) -> Option<&[u8; WIDTH]> {
        self.pages.get(page)
    }

    /// Send the tiles of `area` to the panel
    pub fn flush_area<B: DisplayBackend + ?Sized>(
        &self,
        backend: &mut B,
        area: TileArea,
    ) -> Result<(), DisplayError> {
        let columns = area.columns();
        for page in area.pages() {
            let data = &self.pages[usize::from(page)][columns.clone()];
            backend.write_page(page, columns.start as u8, data)?;
        }
        Ok(())
    }
}

impl Surface for FrameBuffer {
    fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        if !(0..WIDTH as i32).contains(&x) || !(0..HEIGHT as i32).contains(&y) {
            return;
        }
        let byte = &mut self.pages[y as usize / 8][x as usize];
        let mask = 1 << (y % 8);
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    fn fill(&mut self, on: bool) {
        let value = if on { 0xFF } else { 0x00 };
        for page in self.pages.iter_mut() {
            page.fill(value);
        }
    }
}

/// Number of pages held by a [`StripBuffer`]
pub const STRIP_PAGES: usize = 2;

/// Number of strips covering the display
pub const STRIP_COUNT: usize = PAGES / STRIP_PAGES;

/// A horizontal band of the display
///
/// Used by the paged renderer to draw a frame in several passes with a
/// quarter of the memory. Writes outside the selected band are dropped.
#[derive(Clone)]
pub struct StripBuffer {
    pages: [[u8; WIDTH]; STRIP_PAGES],
    first_page: usize,
}

impl Default for StripBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl StripBuffer {
    pub const fn new() -> Self {
        Self {
            pages: [[0; WIDTH]; STRIP_PAGES],
            first_page: 0,
        }
    }

    /// Select strip `index` and clear it
    pub fn select(&mut self, index: usize) {
        self.first_page = index.min(STRIP_COUNT - 1) * STRIP_PAGES;
        self.fill(false);
    }

    /// First display page covered by the strip
    pub fn first_page(&self) -> usize {
        self.first_page
    }

    /// Send the whole strip to the panel
    pub fn flush<B: DisplayBackend + ?Sized>(&self, backend: &mut B) -> Result<(), DisplayError> {
        for (i, data) in self.pages.iter().enumerate() {
            backend.write_page((self.first_page + i) as u8, 0, data)?;
        }
        Ok(())
    }
}

impl Surface for StripBuffer {
    fn set_pixel(&mut self, x: i32, y: i32, on: bool) {
        let top = (self.first_page * 8) as i32;
        let local_y = y - top;
        if !(0..WIDTH as i32).contains(&x) || !(0..(STRIP_PAGES * 8) as i32).contains(&local_y) {
            return;
        }
        let byte = &mut self.pages[local_y as usize / 8][x as usize];
        let mask = 1 << (local_y % 8);
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    fn fill(&mut self, on: bool) {
        let value = if on { 0xFF } else { 0x00 };
        for page in self.pages.iter_mut() {
            page.fill(value);
        }
    }
}
