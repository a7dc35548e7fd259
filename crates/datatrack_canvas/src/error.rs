use thiserror::Error;

/// Errors raised by drawing surfaces.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// The surface could not be allocated (zero or oversized dimensions).
    #[error("Cannot allocate a {width}x{height} surface")]
    InvalidSize { width: u32, height: u32 },

    /// Background pixel data does not match the declared dimensions.
    #[error("Background has {actual} bytes, expected {expected}")]
    BackgroundSize { expected: usize, actual: usize },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
