//! Camera and orthographic projection.
//!
//! Conventions:
//! - screen space is canvas pixels, origin top-left, +Y down
//! - world space is +Y up, with the camera position at the canvas center
//! - the visible world height is `2 * K / zoom`; width follows the aspect ratio

use crate::settings::RenderSettings;

use super::coords::Vec2;

/// Column-major 4x4 matrix, `m[col][row]`.
pub type Mat4 = [[f32; 4]; 4];

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    world_half_height: f32,
    z_near: f32,
    z_far: f32,
    min_zoom: f32,
    max_zoom: f32,

    zoom: f32,
    position: Vec2,
    canvas_width: u32,
    canvas_height: u32,

    world_width: f32,
    world_height: f32,
    ortho_matrix: Mat4,
}

impl Camera {
    pub fn new(settings: &RenderSettings) -> Self {
        let (canvas_width, canvas_height) = settings.initial_canvas_size;
        let mut camera = Self {
            world_half_height: settings.world_half_height,
            z_near: settings.z_near,
            z_far: settings.z_far,
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom,
            zoom: settings
                .initial_zoom
                .clamp(settings.min_zoom, settings.max_zoom),
            position: Vec2::ZERO,
            canvas_width,
            canvas_height,
            world_width: 0.0,
            world_height: 0.0,
            ortho_matrix: [[0.0; 4]; 4],
        };
        camera.recalculate();
        camera
    }

    /// Sets the zoom factor, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            log::warn!("ignoring NaN zoom");
            return;
        }
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.recalculate();
    }

    pub fn set_position(&mut self, position: Vec2) {
        if !position.is_finite() {
            log::warn!("ignoring non-finite camera position {position:?}");
            return;
        }
        self.position = position;
        self.recalculate();
    }

    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.canvas_width = width;
        self.canvas_height = height;
        self.recalculate();
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world_width, self.world_height)
    }

    pub fn ortho_matrix(&self) -> &Mat4 {
        &self.ortho_matrix
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let (cw, ch) = self.canvas_extent();
        Vec2::new(
            (screen.x / cw - 0.5) * self.world_width + self.position.x,
            (0.5 - screen.y / ch) * self.world_height + self.position.y,
        )
    }

    /// Converts a pixel displacement (e.g. a mouse drag) to world units.
    pub fn screen_offset_to_world_offset(&self, offset: Vec2) -> Vec2 {
        let (cw, ch) = self.canvas_extent();
        Vec2::new(
            offset.x * self.world_width / cw,
            -offset.y * self.world_height / ch,
        )
    }

    /// Projects a world point through the rendering matrix onto the canvas.
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let m = &self.ortho_matrix;
        let ndc_x = m[0][0] * world.x + m[3][0];
        let ndc_y = m[1][1] * world.y + m[3][1];

        let (cw, ch) = self.canvas_extent();
        Vec2::new((ndc_x + 1.0) * 0.5 * cw, (1.0 - ndc_y) * 0.5 * ch)
    }

    fn canvas_extent(&self) -> (f32, f32) {
        (
            self.canvas_width.max(1) as f32,
            self.canvas_height.max(1) as f32,
        )
    }

    fn recalculate(&mut self) {
        let (cw, ch) = self.canvas_extent();
        self.world_height = 2.0 * self.world_half_height / self.zoom;
        self.world_width = cw / ch * self.world_height;
        self.ortho_matrix = ortho_matrix(
            self.world_width,
            self.world_height,
            self.position,
            self.z_near,
            self.z_far,
        );
    }
}

/// Orthographic projection of a `width` x `height` world window centered on
/// `center`, GL depth convention.
pub fn ortho_matrix(width: f32, height: f32, center: Vec2, near: f32, far: f32) -> Mat4 {
    let mut m = [[0.0; 4]; 4];
    m[0][0] = 2.0 / width;
    m[1][1] = 2.0 / height;
    m[2][2] = -2.0 / (far - near);
    m[3][0] = -2.0 * center.x / width;
    m[3][1] = -2.0 * center.y / height;
    m[3][2] = -(far + near) / (far - near);
    m[3][3] = 1.0;
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < EPS
    }

    fn camera() -> Camera {
        Camera::new(&RenderSettings::default())
    }

    // ── projection ────────────────────────────────────────────────────────

    #[test]
    fn world_size_follows_zoom_and_aspect() {
        let mut c = camera();
        c.set_canvas_size(800, 600);
        c.set_zoom(35.0);

        let size = c.world_size();
        assert!((size.y - 4.0).abs() < 1e-6);
        assert!((size.x - 4.0 * 800.0 / 600.0).abs() < 1e-5);
    }

    #[test]
    fn matrix_matches_closed_form() {
        let mut c = camera();
        c.set_canvas_size(200, 100);
        c.set_zoom(2.0);
        c.set_position(Vec2::new(3.0, -4.0));

        let m = c.ortho_matrix();
        let (w, h) = (140.0, 70.0);
        assert!((m[0][0] - 2.0 / w).abs() < 1e-7);
        assert!((m[1][1] - 2.0 / h).abs() < 1e-7);
        assert!((m[3][0] + 2.0 * 3.0 / w).abs() < 1e-7);
        assert!((m[3][1] - 2.0 * 4.0 / h).abs() < 1e-7);
        assert!((m[2][2] + 2.0 / 999.0).abs() < 1e-7);
        assert!((m[3][2] + 1001.0 / 999.0).abs() < 1e-6);
        assert_eq!(m[3][3], 1.0);
        assert_eq!(m[0][1], 0.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut c = camera();
        c.set_zoom(0.0);
        assert_eq!(c.zoom(), RenderSettings::default().min_zoom);
        assert!(c.world_size().y.is_finite());

        c.set_zoom(f32::INFINITY);
        assert_eq!(c.zoom(), RenderSettings::default().max_zoom);

        c.set_zoom(f32::NAN);
        assert_eq!(c.zoom(), RenderSettings::default().max_zoom);
    }

    #[test]
    fn zero_canvas_keeps_matrix_finite() {
        let mut c = camera();
        c.set_canvas_size(0, 0);
        assert!(c.ortho_matrix().iter().flatten().all(|v| v.is_finite()));
    }

    // ── conversions ───────────────────────────────────────────────────────

    #[test]
    fn canvas_center_is_camera_position() {
        let mut c = camera();
        c.set_canvas_size(800, 600);
        c.set_zoom(35.0);
        c.set_position(Vec2::ZERO);
        assert!(approx(c.screen_to_world(Vec2::new(400.0, 300.0)), Vec2::ZERO));

        c.set_position(Vec2::new(10.0, -5.0));
        assert!(approx(
            c.screen_to_world(Vec2::new(400.0, 300.0)),
            Vec2::new(10.0, -5.0)
        ));
    }

    #[test]
    fn screen_corners_map_to_world_edges() {
        let mut c = camera();
        c.set_canvas_size(800, 600);
        c.set_zoom(35.0);

        let top_left = c.screen_to_world(Vec2::ZERO);
        let half = c.world_size() * 0.5;
        assert!(approx(top_left, Vec2::new(-half.x, half.y)));
    }

    #[test]
    fn world_screen_round_trip() {
        let mut c = camera();
        for (w, h, zoom, cam) in [
            (800, 600, 1.0, Vec2::ZERO),
            (1024, 768, 35.0, Vec2::new(12.5, -3.0)),
            (300, 900, 0.25, Vec2::new(-100.0, 40.0)),
        ] {
            c.set_canvas_size(w, h);
            c.set_zoom(zoom);
            c.set_position(cam);

            for p in [Vec2::ZERO, Vec2::new(1.0, 2.0), Vec2::new(-50.0, 7.5)] {
                let back = c.screen_to_world(c.world_to_screen(p));
                assert!(
                    (back - p).length() < 1e-3 * (1.0 + p.length()) / zoom.min(1.0),
                    "{p:?} -> {back:?}"
                );
            }
        }
    }

    #[test]
    fn offset_flips_y() {
        let mut c = camera();
        c.set_canvas_size(800, 600);
        c.set_zoom(35.0);

        let size = c.world_size();
        let d = c.screen_offset_to_world_offset(Vec2::new(80.0, 60.0));
        assert!(approx(d, Vec2::new(size.x * 0.1, -size.y * 0.1)));
    }

    #[test]
    fn non_finite_position_is_ignored() {
        let mut c = camera();
        c.set_position(Vec2::new(1.0, 2.0));
        let before = c.ortho_matrix;

        c.set_position(Vec2::new(f32::NAN, 0.0));
        c.set_position(Vec2::new(0.0, f32::INFINITY));

        assert_eq!(c.position(), Vec2::new(1.0, 2.0));
        assert_eq!(c.ortho_matrix, before);
    }
}
