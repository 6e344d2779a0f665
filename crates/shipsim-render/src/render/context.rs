use std::rc::Rc;

use crate::api::{BufferKind, DrawCall, GraphicsApi, ParameterValue, RawHandle};
use crate::error::RenderError;
use crate::settings::RenderSettings;

use super::batch::GpuBatch;
use super::camera::{Camera, Mat4};
use super::coords::{ColorRgba, Vec2};
use super::programs;
use super::records::{
    LandElement, ShipPointElement, ShipTriangleElement, SpringElement, TileElement, WaterElement,
};
use super::shader::{Parameter, ShaderProgram};

/// Vertex attributes used by the widest layout (ship point position + color).
const REQUIRED_VERTEX_ATTRIBUTES: u32 = 2;

/// Scene renderer: one program and one batch per geometry category, plus the
/// camera that maps world coordinates onto the canvas.
///
/// A frame is issued as:
///
/// ```text
/// render_start
///   land_start(n)             land_append × n             land_end
///   water_start(n)            water_append × n            water_end
///   ship_points_start(n)      ship_point_append × n       ship_points_end
///   ship_triangles_start(n)   ship_triangle_append × n    ship_triangles_end
///   springs_start(n)          spring_append × n           springs_end
///   stressed_springs_start(n) stressed_spring_append × n  stressed_springs_end
///   render_ship_points
/// render_end
/// ```
///
/// Categories may be issued in any order and any subset, except that the
/// indexed ones (triangles, springs, stressed springs) and
/// `render_ship_points` need the ship points of the current frame to be
/// uploaded first. Breaking that rule, or appending a different number of
/// records than announced by `*_start`, panics.
pub struct RenderContext<A: GraphicsApi> {
    api: Rc<A>,
    settings: RenderSettings,
    camera: Camera,
    ambient_light_intensity: f32,

    land_program: ShaderProgram<A>,
    land: GpuBatch<A, LandElement>,

    water_program: ShaderProgram<A>,
    water: GpuBatch<A, WaterElement>,

    ship_point_program: ShaderProgram<A>,
    ship_points: GpuBatch<A, ShipPointElement>,

    spring_program: ShaderProgram<A>,
    springs: GpuBatch<A, SpringElement>,

    stressed_spring_program: ShaderProgram<A>,
    stressed_springs: GpuBatch<A, SpringElement>,

    ship_triangle_program: ShaderProgram<A>,
    ship_triangles: GpuBatch<A, ShipTriangleElement>,

    /// Ship points uploaded since the last `render_start`.
    points_uploaded: bool,
    point_count: u32,
}

impl<A: GraphicsApi> RenderContext<A> {
    /// Builds every category program and batch.
    ///
    /// Fails if the API does not meet the backend's requirements or a program
    /// does not build. Nothing created before the failure outlives the call.
    pub fn new(api: Rc<A>, settings: RenderSettings) -> Result<Self, RenderError> {
        let limits = api.limits();
        if limits.max_vertex_attributes < REQUIRED_VERTEX_ATTRIBUTES {
            return Err(RenderError::environment(format!(
                "{} supports {} vertex attributes, {} required",
                limits.description, limits.max_vertex_attributes, REQUIRED_VERTEX_ATTRIBUTES
            )));
        }
        log::info!("scene renderer on {}", limits.description);

        let land_program = ShaderProgram::build(&api, &programs::LAND)?;
        let water_program = ShaderProgram::build(&api, &programs::WATER)?;
        let ship_point_program = ShaderProgram::build(&api, &programs::SHIP_POINT)?;
        let spring_program = ShaderProgram::build(&api, &programs::SPRING)?;
        let stressed_spring_program = ShaderProgram::build(&api, &programs::STRESSED_SPRING)?;
        let ship_triangle_program = ShaderProgram::build(&api, &programs::SHIP_TRIANGLE)?;

        let ambient_light_intensity = settings.initial_ambient_light_intensity.clamp(0.0, 1.0);

        Ok(Self {
            camera: Camera::new(&settings),
            ambient_light_intensity,

            land_program,
            land: GpuBatch::new(&api, BufferKind::Vertex),
            water_program,
            water: GpuBatch::new(&api, BufferKind::Vertex),
            ship_point_program,
            ship_points: GpuBatch::new(&api, BufferKind::Vertex),
            spring_program,
            springs: GpuBatch::new(&api, BufferKind::Index),
            stressed_spring_program,
            stressed_springs: GpuBatch::new(&api, BufferKind::Index),
            ship_triangle_program,
            ship_triangles: GpuBatch::new(&api, BufferKind::Index),

            points_uploaded: false,
            point_count: 0,

            settings,
            api,
        })
    }

    pub fn api(&self) -> &Rc<A> {
        &self.api
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    // ── camera and lighting ───────────────────────────────────────────────

    pub fn set_zoom(&mut self, zoom: f32) {
        self.camera.set_zoom(zoom);
    }

    pub fn set_camera_world_position(&mut self, position: Vec2) {
        self.camera.set_position(position);
    }

    /// Resizes the projection and the drawable area.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.camera.set_canvas_size(width, height);
        self.api.set_viewport(width, height);
    }

    /// Clamped to `[0, 1]`.
    pub fn set_ambient_light_intensity(&mut self, intensity: f32) {
        self.ambient_light_intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };
    }

    pub fn zoom(&self) -> f32 {
        self.camera.zoom()
    }

    pub fn camera_world_position(&self) -> Vec2 {
        self.camera.position()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.camera.canvas_size()
    }

    pub fn visible_world_size(&self) -> Vec2 {
        self.camera.world_size()
    }

    pub fn ortho_matrix(&self) -> &Mat4 {
        self.camera.ortho_matrix()
    }

    pub fn ambient_light_intensity(&self) -> f32 {
        self.ambient_light_intensity
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.camera.screen_to_world(screen)
    }

    pub fn screen_offset_to_world_offset(&self, offset: Vec2) -> Vec2 {
        self.camera.screen_offset_to_world_offset(offset)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        self.camera.world_to_screen(world)
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Clears the canvas to the sky color dimmed by the ambient light.
    pub fn render_start(&mut self) {
        let clear = self
            .settings
            .clear_color
            .scaled(self.ambient_light_intensity);
        self.api.clear(clear.to_array());

        self.points_uploaded = false;
        self.point_count = 0;
    }

    pub fn render_end(&mut self) {
        self.api.flush();
    }

    // ── land ──────────────────────────────────────────────────────────────

    pub fn land_start(&mut self, tiles: usize) {
        self.land.start(tiles);
    }

    /// Appends the wall segment between `left` and `right`, from the given
    /// top heights down to `bottom`.
    #[inline]
    pub fn land_append(&mut self, left: f32, right: f32, left_top: f32, right_top: f32, bottom: f32) {
        self.land
            .append(TileElement::new(left, right, left_top, right_top, bottom));
    }

    pub fn land_end(&mut self) {
        let count = self.land.end(&*self.api);
        self.draw(
            &self.land_program,
            self.land.buffer(),
            None,
            count,
            Some(self.settings.land_color),
        );
    }

    // ── water ─────────────────────────────────────────────────────────────

    pub fn water_start(&mut self, tiles: usize) {
        self.water.start(tiles);
    }

    #[inline]
    pub fn water_append(
        &mut self,
        left: f32,
        right: f32,
        left_top: f32,
        right_top: f32,
        bottom: f32,
    ) {
        self.water
            .append(TileElement::new(left, right, left_top, right_top, bottom));
    }

    pub fn water_end(&mut self) {
        let count = self.water.end(&*self.api);
        self.draw(
            &self.water_program,
            self.water.buffer(),
            None,
            count,
            Some(self.settings.water_color),
        );
    }

    // ── ship points ───────────────────────────────────────────────────────

    pub fn ship_points_start(&mut self, points: usize) {
        self.ship_points.start(points);
        self.points_uploaded = false;
        self.point_count = 0;
    }

    #[inline]
    pub fn ship_point_append(&mut self, x: f32, y: f32, r: f32, g: f32, b: f32) {
        self.ship_points.append(ShipPointElement {
            position: [x, y],
            color: [r, g, b],
        });
    }

    /// Uploads the point cloud. Nothing is drawn; the points become the vertex
    /// source of the indexed categories for the rest of the frame.
    pub fn ship_points_end(&mut self) {
        self.point_count = self.ship_points.end(&*self.api);
        self.points_uploaded = true;
    }

    /// Draws the uploaded ship points as a point cloud.
    pub fn render_ship_points(&mut self) {
        self.assert_points_uploaded("ship points");
        self.draw(
            &self.ship_point_program,
            self.ship_points.buffer(),
            None,
            self.point_count,
            None,
        );
    }

    // ── springs ───────────────────────────────────────────────────────────

    pub fn springs_start(&mut self, springs: usize) {
        self.assert_points_uploaded("springs");
        self.springs.start(springs);
    }

    #[inline]
    pub fn spring_append(&mut self, point_a: u32, point_b: u32) {
        self.debug_assert_indices("spring", &[point_a, point_b]);
        self.springs.append(SpringElement { point_a, point_b });
    }

    pub fn springs_end(&mut self) {
        let count = self.springs.end(&*self.api);
        self.draw(
            &self.spring_program,
            self.ship_points.buffer(),
            Some(self.springs.buffer()),
            count,
            None,
        );
    }

    // ── stressed springs ──────────────────────────────────────────────────

    pub fn stressed_springs_start(&mut self, springs: usize) {
        self.assert_points_uploaded("stressed springs");
        self.stressed_springs.start(springs);
    }

    #[inline]
    pub fn stressed_spring_append(&mut self, point_a: u32, point_b: u32) {
        self.debug_assert_indices("stressed spring", &[point_a, point_b]);
        self.stressed_springs
            .append(SpringElement { point_a, point_b });
    }

    pub fn stressed_springs_end(&mut self) {
        let count = self.stressed_springs.end(&*self.api);
        self.draw(
            &self.stressed_spring_program,
            self.ship_points.buffer(),
            Some(self.stressed_springs.buffer()),
            count,
            Some(self.settings.stressed_spring_color),
        );
    }

    // ── ship triangles ────────────────────────────────────────────────────

    pub fn ship_triangles_start(&mut self, triangles: usize) {
        self.assert_points_uploaded("ship triangles");
        self.ship_triangles.start(triangles);
    }

    #[inline]
    pub fn ship_triangle_append(&mut self, point_a: u32, point_b: u32, point_c: u32) {
        self.debug_assert_indices("ship triangle", &[point_a, point_b, point_c]);
        self.ship_triangles.append(ShipTriangleElement {
            point_a,
            point_b,
            point_c,
        });
    }

    pub fn ship_triangles_end(&mut self) {
        let count = self.ship_triangles.end(&*self.api);
        self.draw(
            &self.ship_triangle_program,
            self.ship_points.buffer(),
            Some(self.ship_triangles.buffer()),
            count,
            None,
        );
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn assert_points_uploaded(&self, category: &str) {
        assert!(
            self.points_uploaded,
            "{category} rendered before ship points were uploaded this frame"
        );
    }

    #[inline]
    fn debug_assert_indices(&self, category: &str, indices: &[u32]) {
        debug_assert!(
            indices.iter().all(|&i| i < self.point_count),
            "{category} {indices:?} references a point outside the {} uploaded",
            self.point_count
        );
    }

    /// Sets the program's parameters and issues one draw.
    fn draw(
        &self,
        program: &ShaderProgram<A>,
        vertex_buffer: RawHandle,
        index_buffer: Option<RawHandle>,
        count: u32,
        color: Option<ColorRgba>,
    ) {
        if count == 0 {
            return;
        }

        let api = &*self.api;

        program.set(
            api,
            Parameter::OrthoMatrix,
            ParameterValue::Mat4(*self.camera.ortho_matrix()),
        );
        if let Some(color) = color {
            program.set(api, Parameter::Color, ParameterValue::Vec4(color.to_array()));
        }
        if program.has(Parameter::AmbientLightIntensity) {
            program.set(
                api,
                Parameter::AmbientLightIntensity,
                ParameterValue::Float(self.ambient_light_intensity),
            );
        }

        api.draw(&DrawCall {
            program: program.raw(),
            vertex_buffer,
            index_buffer,
            count,
        });
    }
}
