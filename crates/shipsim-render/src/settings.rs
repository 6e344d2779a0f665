//! Rendering constants.

use crate::render::ColorRgba;

/// Tunables of the scene renderer.
///
/// Defaults reproduce the reference look: cornflower sky, grey sea floor,
/// half-transparent blue water, red stressed springs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// World half-height visible at zoom 1 (`world_height = 2 * K / zoom`).
    pub world_half_height: f32,

    /// Orthographic depth range. All geometry lies on `SCENE_DEPTH`, inside it.
    pub z_near: f32,
    pub z_far: f32,

    /// Zoom applied at construction.
    pub initial_zoom: f32,

    /// Zoom is clamped to this range; zero or negative zoom has no projection.
    pub min_zoom: f32,
    pub max_zoom: f32,

    /// Canvas size assumed until the first `set_canvas_size`.
    pub initial_canvas_size: (u32, u32),

    /// Clear color at full ambient light.
    pub clear_color: ColorRgba,

    pub land_color: ColorRgba,
    pub water_color: ColorRgba,
    pub stressed_spring_color: ColorRgba,

    /// Ambient light intensity applied at construction, in `[0, 1]`.
    pub initial_ambient_light_intensity: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            world_half_height: 70.0,
            z_near: 1.0,
            z_far: 1000.0,
            initial_zoom: 1.0,
            min_zoom: 0.01,
            max_zoom: 1000.0,
            initial_canvas_size: (100, 100),
            clear_color: ColorRgba::new(0.529, 0.808, 0.980, 1.0),
            land_color: ColorRgba::new(0.5, 0.5, 0.5, 1.0),
            water_color: ColorRgba::new(0.0, 0.25, 1.0, 0.5),
            stressed_spring_color: ColorRgba::new(1.0, 0.0, 0.0, 1.0),
            initial_ambient_light_intensity: 1.0,
        }
    }
}
