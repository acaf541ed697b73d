//! Display layer for the pendant
//!
//! This crate provides:
//! - [`FrameBuffer`] and [`StripBuffer`]: 1bpp pixel stores in the
//!   controller's page layout (8 vertical pixels per byte)
//! - [`DirtyRect`]: bounding box of pixels written since the last flush
//! - [`Canvas`]: the drawing surface screens paint on; every write
//!   invalidates what it touches
//! - [`DisplayBackend`]: the narrow driver interface (write one page span)
//! - [`RenderStrategy`]: how a frame reaches the panel, either a full
//!   buffer flushing only the dirty tiles or a paged strip renderer that
//!   runs the draw pass once per strip
//!
//! # Architecture
//!
//! ```text
//! screen draw ──▶ Canvas ──▶ FrameBuffer / StripBuffer
//!                   │
//!                   └──▶ DirtyRect ──▶ RenderStrategy ──▶ DisplayBackend
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod backend;
pub mod canvas;
pub mod dirty;
pub mod framebuffer;
pub mod render;

pub use backend::{DisplayBackend, DisplayError, TileArea};
pub use canvas::{Canvas, Surface, GLYPH_CHECKED, GLYPH_HOLD, GLYPH_PLACEHOLDER, GLYPH_UNCHECKED};
pub use dirty::DirtyRect;
pub use framebuffer::{FrameBuffer, StripBuffer, STRIP_COUNT, STRIP_PAGES};
pub use render::{DrawFn, FlushKind, FullBufferRenderer, PagedRenderer, RenderStrategy};

/// Display width in pixels
pub const WIDTH: usize = 128;

/// Display height in pixels
pub const HEIGHT: usize = 64;

/// Number of 8-pixel pages
pub const PAGES: usize = HEIGHT / 8;

/// Horizontal advance of one text cell
pub const CHAR_WIDTH: i32 = 7;

/// Height of one text cell
pub const CHAR_HEIGHT: i32 = 9;
