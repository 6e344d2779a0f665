//! One frame of the ship scene, as handed over by the simulation side.

use crate::api::GraphicsApi;
use crate::render::records::{ShipPointElement, ShipTriangleElement, SpringElement};
use crate::render::RenderContext;

/// One column of the land or water silhouette.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TileSpan {
    pub x_left: f32,
    pub x_right: f32,
    pub height_left: f32,
    pub height_right: f32,
    /// Bottom edge of the tile.
    pub baseline: f32,
}

/// Everything drawn in a frame.
///
/// Spring and triangle indices refer to positions in `points`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SceneFrame<'a> {
    pub ambient_light_intensity: f32,
    /// Draw the water after the ship so the hull shows through it.
    pub transparent_water: bool,
    /// Draw the ship as its bare point cloud.
    pub points_only: bool,

    pub land: &'a [TileSpan],
    pub water: &'a [TileSpan],

    pub points: &'a [ShipPointElement],
    pub springs: &'a [SpringElement],
    pub stressed_springs: &'a [SpringElement],
    pub triangles: &'a [ShipTriangleElement],
}

/// Issues `frame` through `ctx`, from `render_start` to `render_end`.
pub fn render_scene<A: GraphicsApi>(ctx: &mut RenderContext<A>, frame: &SceneFrame<'_>) {
    ctx.set_ambient_light_intensity(frame.ambient_light_intensity);
    ctx.render_start();

    render_land(ctx, frame.land);

    if frame.transparent_water {
        render_ship(ctx, frame);
        render_water(ctx, frame.water);
    } else {
        render_water(ctx, frame.water);
        render_ship(ctx, frame);
    }

    ctx.render_end();
}

fn render_land<A: GraphicsApi>(ctx: &mut RenderContext<A>, tiles: &[TileSpan]) {
    ctx.land_start(tiles.len());
    for t in tiles {
        ctx.land_append(t.x_left, t.x_right, t.height_left, t.height_right, t.baseline);
    }
    ctx.land_end();
}

fn render_water<A: GraphicsApi>(ctx: &mut RenderContext<A>, tiles: &[TileSpan]) {
    ctx.water_start(tiles.len());
    for t in tiles {
        ctx.water_append(t.x_left, t.x_right, t.height_left, t.height_right, t.baseline);
    }
    ctx.water_end();
}

fn render_ship<A: GraphicsApi>(ctx: &mut RenderContext<A>, frame: &SceneFrame<'_>) {
    ctx.ship_points_start(frame.points.len());
    for p in frame.points {
        let [x, y] = p.position;
        let [r, g, b] = p.color;
        ctx.ship_point_append(x, y, r, g, b);
    }
    ctx.ship_points_end();

    if frame.points_only {
        ctx.render_ship_points();
        return;
    }

    ctx.ship_triangles_start(frame.triangles.len());
    for t in frame.triangles {
        ctx.ship_triangle_append(t.point_a, t.point_b, t.point_c);
    }
    ctx.ship_triangles_end();

    ctx.springs_start(frame.springs.len());
    for s in frame.springs {
        ctx.spring_append(s.point_a, s.point_b);
    }
    ctx.springs_end();

    ctx.stressed_springs_start(frame.stressed_springs.len());
    for s in frame.stressed_springs {
        ctx.stressed_spring_append(s.point_a, s.point_b);
    }
    ctx.stressed_springs_end();
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::api::{ApiCall, RecordingApi, Topology};
    use crate::settings::RenderSettings;

    const LAND: [TileSpan; 2] = [
        TileSpan {
            x_left: 0.0,
            x_right: 1.0,
            height_left: -5.0,
            height_right: -4.0,
            baseline: -20.0,
        },
        TileSpan {
            x_left: 1.0,
            x_right: 2.0,
            height_left: -4.0,
            height_right: -6.0,
            baseline: -20.0,
        },
    ];

    const WATER: [TileSpan; 1] = [TileSpan {
        x_left: 0.0,
        x_right: 2.0,
        height_left: 0.5,
        height_right: -0.5,
        baseline: -20.0,
    }];

    fn point(x: f32, y: f32) -> ShipPointElement {
        ShipPointElement {
            position: [x, y],
            color: [0.6, 0.6, 0.6],
        }
    }

    const SPRINGS: [SpringElement; 3] = [
        SpringElement { point_a: 0, point_b: 1 },
        SpringElement { point_a: 1, point_b: 2 },
        SpringElement { point_a: 2, point_b: 0 },
    ];

    const STRESSED: [SpringElement; 1] = [SpringElement { point_a: 0, point_b: 2 }];

    const TRIANGLES: [ShipTriangleElement; 1] = [ShipTriangleElement {
        point_a: 0,
        point_b: 1,
        point_c: 2,
    }];

    fn run(transparent_water: bool, points_only: bool) -> (RenderContext<RecordingApi>, Vec<Topology>) {
        let mut ctx =
            RenderContext::new(Rc::new(RecordingApi::new()), RenderSettings::default()).unwrap();
        ctx.api().take_calls();

        let points = [point(0.0, 0.0), point(1.0, 0.0), point(0.5, 1.0)];
        let frame = SceneFrame {
            ambient_light_intensity: 0.8,
            transparent_water,
            points_only,
            land: &LAND,
            water: &WATER,
            points: &points,
            springs: &SPRINGS,
            stressed_springs: &STRESSED,
            triangles: &TRIANGLES,
        };
        render_scene(&mut ctx, &frame);

        let topologies = ctx
            .api()
            .draws()
            .iter()
            .map(|d| ctx.api().program_desc(d.program).unwrap().topology)
            .collect();
        (ctx, topologies)
    }

    fn draw_programs(ctx: &RenderContext<RecordingApi>) -> Vec<u32> {
        ctx.api().draws().iter().map(|d| d.program).collect()
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn opaque_water_is_drawn_before_ship() {
        let (ctx, topologies) = run(false, false);
        assert_eq!(
            topologies,
            vec![
                Topology::TriangleStrip, // land
                Topology::TriangleStrip, // water
                Topology::TriangleList,
                Topology::LineList,
                Topology::LineList,
            ]
        );

        let programs = draw_programs(&ctx);
        assert_ne!(programs[0], programs[1]);
    }

    #[test]
    fn transparent_water_is_drawn_after_ship() {
        let (ctx, topologies) = run(true, false);
        assert_eq!(
            topologies,
            vec![
                Topology::TriangleStrip, // land
                Topology::TriangleList,
                Topology::LineList,
                Topology::LineList,
                Topology::TriangleStrip, // water
            ]
        );

        let programs = draw_programs(&ctx);
        let opaque = draw_programs(&run(false, false).0);
        assert_eq!(programs[4], opaque[1]);
    }

    #[test]
    fn points_only_replaces_connectivity() {
        let (ctx, topologies) = run(false, true);
        assert_eq!(
            topologies,
            vec![
                Topology::TriangleStrip,
                Topology::TriangleStrip,
                Topology::PointList,
            ]
        );
        assert_eq!(ctx.api().draws()[2].count, 3);
    }

    // ── frame bracket ─────────────────────────────────────────────────────

    #[test]
    fn frame_is_bracketed_by_clear_and_flush() {
        let (ctx, _) = run(false, false);
        let calls = ctx.api().calls();
        assert!(matches!(calls.first(), Some(ApiCall::Clear(_))));
        assert_eq!(calls.last(), Some(&ApiCall::Flush));
        assert!((ctx.ambient_light_intensity() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn empty_scene_only_clears_and_flushes() {
        let mut ctx =
            RenderContext::new(Rc::new(RecordingApi::new()), RenderSettings::default()).unwrap();
        ctx.api().take_calls();

        render_scene(&mut ctx, &SceneFrame::default());

        let calls = ctx.api().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], ApiCall::Clear([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(calls[1], ApiCall::Flush);
    }
}
