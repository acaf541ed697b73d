//! Drawing surface for screens
//!
//! Text is laid out on a fixed 7 pixel grid. Glyphs are drawn opaque: each
//! cell is filled with the background first, so text drawn over old text
//! replaces it without a clear. A few control characters render as icons.

use core::convert::Infallible;

use embedded_graphics::mono_font::ascii::FONT_6X9;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::dirty::DirtyRect;
use crate::{CHAR_HEIGHT, CHAR_WIDTH, HEIGHT, WIDTH};

/// Empty check box
pub const GLYPH_UNCHECKED: char = '\x01';
/// Ticked check box
pub const GLYPH_CHECKED: char = '\x02';
/// Marks a button that must be held
pub const GLYPH_HOLD: char = '\x03';
/// Marks a button without a function
pub const GLYPH_PLACEHOLDER: char = '\x04';

/// Raw pixel store a [`Canvas`] draws into
pub trait Surface {
    /// Set or clear one pixel, ignoring coordinates outside the store
    fn set_pixel(&mut self, x: i32, y: i32, on: bool);

    /// Set every pixel to `on`
    fn fill(&mut self, on: bool);
}

/// Drawing context handed to screens
///
/// Holds the current draw color. Every operation invalidates the pixels it
/// touches in the shared [`DirtyRect`].
pub struct Canvas<'a> {
    surface: &'a mut dyn Surface,
    dirty: &'a mut DirtyRect,
    color: BinaryColor,
}

impl<'a> Canvas<'a> {
    pub fn new(surface: &'a mut dyn Surface, dirty: &'a mut DirtyRect) -> Self {
        Self {
            surface,
            dirty,
            color: BinaryColor::On,
        }
    }

    /// Select the draw color, `true` lights pixels
    pub fn set_color(&mut self, on: bool) {
        self.color = BinaryColor::from(on);
    }

    pub fn color(&self) -> bool {
        self.color.is_on()
    }

    /// Blank the whole surface
    pub fn clear(&mut self) {
        self.surface.fill(false);
        self.dirty.invalidate_all();
    }

    /// Mark an area for flushing without drawing
    pub fn invalidate(&mut self, x: i32, y: i32, w: i32, h: i32) {
        self.dirty.invalidate(x, y, w, h);
    }

    /// Fill a rectangle with the draw color
    pub fn fill_box(&mut self, x: i32, y: i32, w: i32, h: i32) {
        if w <= 0 || h <= 0 {
            return;
        }
        let on = self.color.is_on();
        for py in y.max(0)..(y + h).min(HEIGHT as i32) {
            for px in x.max(0)..(x + w).min(WIDTH as i32) {
                self.surface.set_pixel(px, py, on);
            }
        }
        self.dirty.invalidate(x, y, w, h);
    }

    /// Width of `text` in pixels
    pub fn text_width(text: &str) -> i32 {
        text.chars().count() as i32 * CHAR_WIDTH
    }

    /// Draw `text` with its top left corner at `(x, y)`
    pub fn text(&mut self, x: i32, y: i32, text: &str) {
        self.text_styled(x, y, text, false);
    }

    /// Draw `text` with a double-struck stroke
    pub fn text_bold(&mut self, x: i32, y: i32, text: &str) {
        self.text_styled(x, y, text, true);
    }

    fn text_styled(&mut self, x: i32, y: i32, text: &str, bold: bool) {
        let fg = self.color;
        let mut cx = x;
        for ch in text.chars() {
            self.fill_cell(cx, y, fg.invert());
            self.glyph(cx, y, ch, fg);
            if bold {
                self.glyph(cx + 1, y, ch, fg);
            }
            cx += CHAR_WIDTH;
        }
        self.dirty.invalidate(x, y, cx - x, CHAR_HEIGHT);
    }

    fn fill_cell(&mut self, x: i32, y: i32, color: BinaryColor) {
        let on = color.is_on();
        for py in y..y + CHAR_HEIGHT {
            for px in x..x + CHAR_WIDTH {
                self.surface.set_pixel(px, py, on);
            }
        }
    }

    fn glyph(&mut self, x: i32, y: i32, ch: char, color: BinaryColor) {
        let stroke = PrimitiveStyle::with_stroke(color, 1);
        let fill = PrimitiveStyle::with_fill(color);
        match ch {
            GLYPH_UNCHECKED => {
                let _ = Rectangle::new(Point::new(x, y + 1), Size::new(7, 7))
                    .into_styled(stroke)
                    .draw(self);
            }
            GLYPH_CHECKED => {
                let _ = Rectangle::new(Point::new(x, y + 1), Size::new(7, 7))
                    .into_styled(stroke)
                    .draw(self);
                let _ = Rectangle::new(Point::new(x + 2, y + 3), Size::new(3, 3))
                    .into_styled(fill)
                    .draw(self);
            }
            GLYPH_HOLD => {
                let _ = Circle::new(Point::new(x, y + 1), 7)
                    .into_styled(stroke)
                    .draw(self);
                let _ = Line::new(Point::new(x + 3, y + 2), Point::new(x + 3, y + 4))
                    .into_styled(stroke)
                    .draw(self);
                let _ = Line::new(Point::new(x + 3, y + 4), Point::new(x + 5, y + 4))
                    .into_styled(stroke)
                    .draw(self);
            }
            GLYPH_PLACEHOLDER => {
                let _ = Line::new(Point::new(x + 1, y + 4), Point::new(x + 5, y + 4))
                    .into_styled(stroke)
                    .draw(self);
            }
            ' ' => {}
            _ => {
                let mut buf = [0u8; 4];
                let style = MonoTextStyle::new(&FONT_6X9, color);
                let _ = Text::with_baseline(
                    ch.encode_utf8(&mut buf),
                    Point::new(x, y),
                    style,
                    Baseline::Top,
                )
                .draw(self);
            }
        }
    }
}

impl OriginDimensions for Canvas<'_> {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for Canvas<'_> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.surface.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    fn lit_in(fb: &FrameBuffer, x: i32, y: i32, w: i32, h: i32) -> usize {
        let mut count = 0;
        for py in y..y + h {
            for px in x..x + w {
                if fb.pixel(px, py) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_fill_box_invalidates() {
        let mut fb = FrameBuffer::new();
        let mut dirty = DirtyRect::empty();
        {
            let mut canvas = Canvas::new(&mut fb, &mut dirty);
            canvas.fill_box(0, 10, 128, 1);
        }
        assert_eq!(dirty.bounds(), Some((0, 10, 128, 11)));
        assert_eq!(lit_in(&fb, 0, 10, 128, 1), 128);
    }

    #[test]
    fn test_text_draws_in_cells() {
        let mut fb = FrameBuffer::new();
        let mut dirty = DirtyRect::empty();
        {
            let mut canvas = Canvas::new(&mut fb, &mut dirty);
            canvas.text(1, 16, "AB");
        }
        assert_eq!(dirty.bounds(), Some((1, 16, 15, 25)));
        assert!(lit_in(&fb, 1, 16, 7, 9) > 0);
        assert!(lit_in(&fb, 8, 16, 7, 9) > 0);
        assert_eq!(lit_in(&fb, 15, 16, 20, 9), 0);
    }

    #[test]
    fn test_text_is_opaque() {
        let mut fb = FrameBuffer::new();
        let mut dirty = DirtyRect::empty();
        let mut canvas = Canvas::new(&mut fb, &mut dirty);
        canvas.fill_box(0, 0, 14, 9);
        canvas.text(0, 0, "  ");
        drop(canvas);
        assert_eq!(lit_in(&fb, 0, 0, 14, 9), 0);
    }

    #[test]
    fn test_inverted_text_on_box() {
        let mut fb = FrameBuffer::new();
        let mut dirty = DirtyRect::empty();
        let mut canvas = Canvas::new(&mut fb, &mut dirty);
        canvas.fill_box(0, 0, 7, 9);
        canvas.set_color(false);
        canvas.text(0, 0, "I");
        drop(canvas);
        let lit = lit_in(&fb, 0, 0, 7, 9);
        assert!(lit > 0 && lit < 63);
    }

    #[test]
    fn test_bold_lights_more_pixels() {
        let mut plain = FrameBuffer::new();
        let mut bold = FrameBuffer::new();
        let mut dirty = DirtyRect::empty();
        Canvas::new(&mut plain, &mut dirty).text(0, 0, "1");
        Canvas::new(&mut bold, &mut dirty).text_bold(0, 0, "1");
        assert!(lit_in(&bold, 0, 0, 8, 9) > lit_in(&plain, 0, 0, 8, 9));
    }

    #[test]
    fn test_icons_render() {
        let mut fb = FrameBuffer::new();
        let mut dirty = DirtyRect::empty();
        let mut canvas = Canvas::new(&mut fb, &mut dirty);
        canvas.text(0, 0, "\x01\x02\x03\x04");
        drop(canvas);
        for i in 0..4 {
            assert!(lit_in(&fb, i * 7, 0, 7, 9) > 0, "glyph {}", i);
        }
        assert!(lit_in(&fb, 7, 0, 7, 9) > lit_in(&fb, 0, 0, 7, 9));
    }

    #[test]
    fn test_clear_marks_everything() {
        let mut fb = FrameBuffer::new();
        let mut dirty = DirtyRect::empty();
        let mut canvas = Canvas::new(&mut fb, &mut dirty);
        canvas.fill_box(5, 5, 5, 5);
        canvas.clear();
        drop(canvas);
        assert!(dirty.is_full());
        assert_eq!(lit_in(&fb, 0, 0, 128, 64), 0);
    }
}
