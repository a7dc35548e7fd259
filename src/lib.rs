//! DataTrack - vehicle counting client
//!
//! Draw counting regions over a video frame, submit the video to a detection
//! backend, follow the job by polling, and present or export the counts.
//! Runs natively (CLI) and in the browser (wasm).

pub mod app;
pub mod autosave;
pub mod backend;
pub mod config;
pub mod constants;
pub mod coords;
pub mod editor;
pub mod export;
pub mod handlers;
pub mod job;
pub mod keybindings;
pub mod message;
pub mod model;
pub mod render;
pub mod results;
pub mod runtime;
pub mod store;

#[cfg(test)]
mod tests;

pub use app::DataTrackApp;

// WASM entry point
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::*;
