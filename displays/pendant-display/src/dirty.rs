//! Dirty rectangle tracking
//!
//! Every pixel write must be covered by an [`invalidate`](DirtyRect::invalidate)
//! call. Over-invalidating only costs bus time, under-invalidating leaves
//! stale pixels on the panel.

use crate::backend::TileArea;
use crate::{HEIGHT, WIDTH};

/// Bounding box of pixels changed since the last flush
///
/// Stored as half-open pixel bounds `x1..x2`, `y1..y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRect {
    x1: u8,
    y1: u8,
    x2: u8,
    y2: u8,
}

impl Default for DirtyRect {
    fn default() -> Self {
        Self::empty()
    }
}

impl DirtyRect {
    /// Nothing to flush
    pub const fn empty() -> Self {
        Self {
            x1: WIDTH as u8,
            y1: HEIGHT as u8,
            x2: 0,
            y2: 0,
        }
    }

    /// Everything must be flushed
    pub const fn full() -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: WIDTH as u8,
            y2: HEIGHT as u8,
        }
    }

    /// Reset after a flush
    pub fn clear(&mut self) {
        *self = Self::empty();
    }

    /// Mark the whole display
    pub fn invalidate_all(&mut self) {
        *self = Self::full();
    }

    /// Grow the box to cover `w` x `h` pixels at `(x, y)`
    ///
    /// The rectangle is clipped to the display first; nothing happens if
    /// it lies entirely outside.
    pub fn invalidate(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let x2 = (x + w).min(WIDTH as i32);
        let y2 = (y + h).min(HEIGHT as i32);
        let x = x.max(0);
        let y = y.max(0);
        if x < x2 && y < y2 {
            self.x1 = self.x1.min(x as u8);
            self.y1 = self.y1.min(y as u8);
            self.x2 = self.x2.max(x2 as u8);
            self.y2 = self.y2.max(y2 as u8);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x1 >= self.x2 || self.y1 >= self.y2
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }

    /// Pixel bounds `(x1, y1, x2, y2)`, `None` when empty
    pub fn bounds(&self) -> Option<(u8, u8, u8, u8)> {
        if self.is_empty() {
            None
        } else {
            Some((self.x1, self.y1, self.x2, self.y2))
        }
    }

    /// Smallest tile area covering the box
    pub fn tile_area(&self) -> Option<TileArea> {
        let (x1, y1, x2, y2) = self.bounds()?;
        let tx1 = x1 / 8;
        let ty1 = y1 / 8;
        let tx2 = x2.div_ceil(8);
        let ty2 = y2.div_ceil(8);
        Some(TileArea {
            x: tx1,
            y: ty1,
            width: tx2 - tx1,
            height: ty2 - ty1,
        })
    }
}
