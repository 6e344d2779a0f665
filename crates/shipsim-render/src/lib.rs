//! shipsim rendering backend.
//!
//! This crate owns the batched renderer for the ship scene: per-category
//! geometry batches, their shader programs, and the camera/projection state
//! that maps the simulated world onto the canvas.

pub mod api;
pub mod device;
pub mod error;
pub mod logging;
pub mod render;
pub mod scene;
pub mod settings;

pub use error::RenderError;
pub use render::{RenderContext, Vec2};
pub use scene::{render_scene, SceneFrame, TileSpan};
pub use settings::RenderSettings;
