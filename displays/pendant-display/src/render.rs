//! Render strategies
//!
//! A strategy owns the pixel store and decides how a frame reaches the
//! panel. Screens only see a [`Canvas`] and draw the same way under either.
//!
//! ```text
//! FullBufferRenderer:  draw once ──▶ flush dirty tiles ──▶ clear rect
//! PagedRenderer:       for strip in 0..4 { draw ──▶ flush strip }
//! ```

use crate::backend::{DisplayBackend, DisplayError, TileArea};
use crate::canvas::Canvas;
use crate::dirty::DirtyRect;
use crate::framebuffer::{FrameBuffer, StripBuffer, STRIP_COUNT};

/// What a render pass sent to the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushKind {
    /// Nothing changed
    None,
    /// Only the given tiles were sent
    Region(TileArea),
    /// The whole panel was sent
    Full,
}

/// Draw callback: canvas plus whether the whole screen must be painted
pub type DrawFn<'f> = dyn FnMut(&mut Canvas<'_>, bool) + 'f;

/// How frames are produced and flushed
pub trait RenderStrategy {
    /// Run one frame
    ///
    /// With `redraw_all` the surface is cleared and `draw` is asked to
    /// paint everything. Otherwise `draw` may paint only what changed.
    fn render<B: DisplayBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        redraw_all: bool,
        draw: &mut DrawFn<'_>,
    ) -> Result<FlushKind, DisplayError>;

    /// Force the next flush to cover the whole panel
    fn invalidate_all(&mut self);
}

/// Keeps a full frame in RAM and flushes only dirty tiles
pub struct FullBufferRenderer {
    frame: FrameBuffer,
    dirty: DirtyRect,
}

impl Default for FullBufferRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FullBufferRenderer {
    pub fn new() -> Self {
        Self {
            frame: FrameBuffer::new(),
            dirty: DirtyRect::full(),
        }
    }

    /// Current frame contents
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Pending dirty area
    pub fn dirty(&self) -> &DirtyRect {
        &self.dirty
    }
}

impl RenderStrategy for FullBufferRenderer {
    fn render<B: DisplayBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        redraw_all: bool,
        draw: &mut DrawFn<'_>,
    ) -> Result<FlushKind, DisplayError> {
        {
            let mut canvas = Canvas::new(&mut self.frame, &mut self.dirty);
            if redraw_all {
                canvas.clear();
            }
            draw(&mut canvas, redraw_all);
        }

        let kind = if self.dirty.is_full() {
            self.frame.flush_area(backend, TileArea::FULL)?;
            FlushKind::Full
        } else if let Some(area) = self.dirty.tile_area() {
            self.frame.flush_area(backend, area)?;
            FlushKind::Region(area)
        } else {
            FlushKind::None
        };
        self.dirty.clear();
        Ok(kind)
    }

    fn invalidate_all(&mut self) {
        self.dirty.invalidate_all();
    }
}

/// Draws the frame once per strip, for boards short on RAM
///
/// Every frame repaints and sends the whole panel, so screens are always
/// asked for a full draw.
#[derive(Default)]
pub struct PagedRenderer {
    strip: StripBuffer,
    scratch: DirtyRect,
}

impl PagedRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderStrategy for PagedRenderer {
    fn render<B: DisplayBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        _redraw_all: bool,
        draw: &mut DrawFn<'_>,
    ) -> Result<FlushKind, DisplayError> {
        for index in 0..STRIP_COUNT {
            self.strip.select(index);
            {
                let mut canvas = Canvas::new(&mut self.strip, &mut self.scratch);
                draw(&mut canvas, true);
            }
            self.strip.flush(backend)?;
        }
        self.scratch.clear();
        Ok(FlushKind::Full)
    }

    fn invalidate_all(&mut self) {}
}
