//! datatrack_canvas - immediate-mode drawing surfaces for region overlays
//!
//! This crate knows nothing about regions or jobs. It provides colors, an
//! overlay scene description, and a small `Canvas` trait modeled on the
//! browser's 2D context, with a raster implementation (tiny-skia), a
//! recording implementation for tests, and on wasm the real browser context.

mod canvas;
mod color;
mod error;
mod overlay;
mod pixmap;
mod recording;

#[cfg(target_arch = "wasm32")]
mod web;

pub use canvas::{draw_overlay, Canvas};
pub use color::{Color, ParseColorError};
pub use error::CanvasError;
pub use overlay::{Overlay, OverlayItem, OverlayLabel, OverlayShape};
pub use pixmap::PixmapCanvas;
pub use recording::{DrawCommand, RecordingCanvas};
