//! Global constants for the DataTrack client.

/// Region editing limits.
pub mod editor {
    /// Minimum number of vertices for a committed polygon.
    pub const MIN_POLYGON_VERTICES: usize = 3;
    /// Rectangles narrower or shorter than this (intrinsic pixels) are discarded.
    pub const MIN_RECT_SIZE: f32 = 20.0;
    /// Round-robin palette for committed regions.
    pub const DEFAULT_PALETTE: [&str; 6] = [
        "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F",
    ];
    /// Color for the region under construction; not part of the palette.
    pub const DRAFT_COLOR: &str = "#10B981";
}

/// Overlay styling, in intrinsic pixels.
pub mod render {
    pub const FILL_ALPHA: f32 = 0.25;
    pub const LINE_WIDTH: f32 = 2.0;
    pub const VERTEX_RADIUS: f32 = 4.0;
    pub const DRAFT_VERTEX_RADIUS: f32 = 5.0;
    pub const LABEL_FONT_PX: f32 = 12.0;
    /// Labels sit this far above the first vertex.
    pub const LABEL_OFFSET: f32 = 10.0;
}

/// Job polling.
pub mod polling {
    pub const INTERVAL_MS: u64 = 500;
    /// Progress shown while processing never reaches 100.
    pub const MAX_PROCESSING_PROGRESS: f32 = 99.0;
    pub const DEFAULT_MAX_ELAPSED_SECS: u64 = 3600;
}

/// Detection defaults sent with each job.
pub mod detection {
    pub const DEFAULT_CONF_THRESHOLD: f32 = 0.5;
    pub const DEFAULT_FRAME_SKIP: u32 = 1;
    /// Vehicle types shown on their own; everything else is "other".
    pub const PRIMARY_TYPES: [&str; 2] = ["car", "motorcycle"];
}

/// Accepted video containers.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Default backend API root.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000/api";
