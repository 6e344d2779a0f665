//! Procedural demo scene: a rolling sea floor, a moving water surface and a
//! grid-shaped ship that rides the waves.
//!
//! Nothing here is simulated. The ship is moved and flexed kinematically; a
//! spring counts as stressed when that flex stretches it past a threshold.

use shipsim_render::render::records::{ShipPointElement, ShipTriangleElement, SpringElement};
use shipsim_render::{SceneFrame, TileSpan};

#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Scene extends from `-half_width` to `half_width`.
    pub half_width: f32,
    pub tile_width: f32,
    /// Bottom edge of land and water.
    pub floor_depth: f32,
    /// Mean sea-floor height.
    pub sea_floor: f32,

    pub ship_columns: u32,
    pub ship_rows: u32,
    pub ship_spacing: f32,

    /// Relative spring elongation above which a spring is drawn as stressed.
    pub stress_threshold: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            half_width: 400.0,
            tile_width: 2.0,
            floor_depth: -200.0,
            sea_floor: -40.0,
            ship_columns: 40,
            ship_rows: 8,
            ship_spacing: 1.0,
            stress_threshold: 0.01,
        }
    }
}

pub struct DemoScene {
    config: DemoConfig,
    time: f32,

    land: Vec<TileSpan>,
    water: Vec<TileSpan>,

    rest_positions: Vec<[f32; 2]>,
    points: Vec<ShipPointElement>,
    springs: Vec<SpringElement>,
    rest_lengths: Vec<f32>,
    stressed_springs: Vec<SpringElement>,
    triangles: Vec<ShipTriangleElement>,
}

impl DemoScene {
    pub fn new(config: DemoConfig) -> Self {
        let land = tiles(&config, |x| {
            config.sea_floor + 6.0 * (x * 0.021).sin() + 2.5 * (x * 0.077 + 1.0).sin()
        });
        let water = tiles(&config, |x| wave_height(x, 0.0));

        let (rest_positions, colors) = ship_points(&config);
        let springs = ship_springs(&config);
        let triangles = ship_triangles(&config);
        let rest_lengths = springs
            .iter()
            .map(|s| distance(rest_positions[s.point_a as usize], rest_positions[s.point_b as usize]))
            .collect();

        let points = rest_positions
            .iter()
            .zip(colors)
            .map(|(&position, color)| ShipPointElement { position, color })
            .collect();

        log::info!(
            "demo scene: {} land tiles, {} points, {} springs, {} triangles",
            land.len(),
            rest_positions.len(),
            springs.len(),
            triangles.len()
        );

        let mut scene = Self {
            config,
            time: 0.0,
            land,
            water,
            rest_positions,
            points,
            springs,
            rest_lengths,
            stressed_springs: Vec::new(),
            triangles,
        };
        scene.place_ship();
        scene
    }

    /// Moves the scene forward by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt;

        let t = self.time;
        for tile in &mut self.water {
            tile.height_left = wave_height(tile.x_left, t);
            tile.height_right = wave_height(tile.x_right, t);
        }

        self.place_ship();
    }

    pub fn frame(
        &self,
        ambient_light_intensity: f32,
        transparent_water: bool,
        points_only: bool,
    ) -> SceneFrame<'_> {
        SceneFrame {
            ambient_light_intensity,
            transparent_water,
            points_only,
            land: &self.land,
            water: &self.water,
            points: &self.points,
            springs: &self.springs,
            stressed_springs: &self.stressed_springs,
            triangles: &self.triangles,
        }
    }

    /// Poses the ship on the current wave and refreshes the stressed set.
    fn place_ship(&mut self) {
        let t = self.time;
        let half_length =
            self.config.ship_columns.saturating_sub(1) as f32 * self.config.ship_spacing * 0.5;

        let bow = wave_height(half_length, t);
        let stern = wave_height(-half_length, t);
        let heave = wave_height(0.0, t);
        let pitch = ((bow - stern) / (2.0 * half_length.max(1.0))).atan() * 0.6;
        let flex = 0.8 * (t * 1.7).sin();

        let (sin, cos) = pitch.sin_cos();
        for (point, rest) in self.points.iter_mut().zip(&self.rest_positions) {
            let [x, y] = *rest;
            let u = if half_length > 0.0 { x / half_length } else { 0.0 };
            let y = y + flex * (u * u - 0.33);
            point.position = [x * cos - y * sin, x * sin + y * cos + heave];
        }

        self.stressed_springs.clear();
        for (spring, rest) in self.springs.iter().zip(&self.rest_lengths) {
            let a = self.points[spring.point_a as usize].position;
            let b = self.points[spring.point_b as usize].position;
            let strain = (distance(a, b) - rest) / rest;
            if strain > self.config.stress_threshold {
                self.stressed_springs.push(*spring);
            }
        }
    }
}

fn wave_height(x: f32, t: f32) -> f32 {
    1.6 * (0.045 * x - 1.1 * t).sin() + 0.6 * (0.13 * x + 0.7 * t).sin()
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

fn tiles(config: &DemoConfig, height: impl Fn(f32) -> f32) -> Vec<TileSpan> {
    let count = ((2.0 * config.half_width) / config.tile_width).ceil().max(0.0) as usize;
    (0..count)
        .map(|i| {
            let x_left = -config.half_width + i as f32 * config.tile_width;
            let x_right = x_left + config.tile_width;
            TileSpan {
                x_left,
                x_right,
                height_left: height(x_left),
                height_right: height(x_right),
                baseline: config.floor_depth,
            }
        })
        .collect()
}

fn point_index(config: &DemoConfig, column: u32, row: u32) -> u32 {
    row * config.ship_columns + column
}

/// Rest positions centered on the origin, with the keel a little below the
/// waterline, and hull colors darkening towards the keel.
fn ship_points(config: &DemoConfig) -> (Vec<[f32; 2]>, Vec<[f32; 3]>) {
    let s = config.ship_spacing;
    let x0 = -(config.ship_columns.saturating_sub(1) as f32) * s * 0.5;
    let draft = config.ship_rows as f32 * s * 0.4;

    let mut positions = Vec::new();
    let mut colors = Vec::new();
    for row in 0..config.ship_rows {
        let shade = 0.5 + 0.5 * row as f32 / config.ship_rows.max(1) as f32;
        for column in 0..config.ship_columns {
            positions.push([x0 + column as f32 * s, row as f32 * s - draft]);
            colors.push([0.55 * shade, 0.35 * shade, 0.2 * shade]);
        }
    }
    (positions, colors)
}

fn ship_springs(config: &DemoConfig) -> Vec<SpringElement> {
    let mut springs = Vec::new();
    let mut push = |a, b| springs.push(SpringElement { point_a: a, point_b: b });

    for row in 0..config.ship_rows {
        for column in 0..config.ship_columns {
            let here = point_index(config, column, row);
            if column + 1 < config.ship_columns {
                push(here, point_index(config, column + 1, row));
            }
            if row + 1 < config.ship_rows {
                push(here, point_index(config, column, row + 1));
            }
            if column + 1 < config.ship_columns && row + 1 < config.ship_rows {
                push(here, point_index(config, column + 1, row + 1));
            }
        }
    }
    springs
}

fn ship_triangles(config: &DemoConfig) -> Vec<ShipTriangleElement> {
    let mut triangles = Vec::new();
    for row in 0..config.ship_rows.saturating_sub(1) {
        for column in 0..config.ship_columns.saturating_sub(1) {
            let a = point_index(config, column, row);
            let b = point_index(config, column + 1, row);
            let c = point_index(config, column, row + 1);
            let d = point_index(config, column + 1, row + 1);
            triangles.push(ShipTriangleElement {
                point_a: a,
                point_b: b,
                point_c: d,
            });
            triangles.push(ShipTriangleElement {
                point_a: a,
                point_b: d,
                point_c: c,
            });
        }
    }
    triangles
}
