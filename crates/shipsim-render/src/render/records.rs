//! Batch record types and the vertex layouts they are read with.
//!
//! Every record is a flat run of `f32` or `u32` with no padding, so a batch is
//! uploaded as-is through `bytemuck::cast_slice`.

use bytemuck::{Pod, Zeroable};

use crate::api::{AttributeFormat, VertexAttribute, VertexLayout};

/// A record type stored in a geometry batch.
pub trait Record: Pod {
    /// Vertices or indices one record contributes to its draw call.
    const ELEMENTS_PER_RECORD: u32;
}

// ── tiles ─────────────────────────────────────────────────────────────────

/// One vertical wall segment of the land or water silhouette.
///
/// Corner order is top-left, top-right, bottom-left, bottom-right, which is
/// the vertex order of a two-triangle strip.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TileElement {
    pub top_left: [f32; 2],
    pub top_right: [f32; 2],
    pub bottom_left: [f32; 2],
    pub bottom_right: [f32; 2],
}

impl TileElement {
    #[inline]
    pub fn new(left: f32, right: f32, left_top: f32, right_top: f32, bottom: f32) -> Self {
        Self {
            top_left: [left, left_top],
            top_right: [right, right_top],
            bottom_left: [left, bottom],
            bottom_right: [right, bottom],
        }
    }
}

impl Record for TileElement {
    const ELEMENTS_PER_RECORD: u32 = 4;
}

pub type LandElement = TileElement;
pub type WaterElement = TileElement;

// ── ship ──────────────────────────────────────────────────────────────────

/// One ship point. Its index is its position in the upload order.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct ShipPointElement {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl Record for ShipPointElement {
    const ELEMENTS_PER_RECORD: u32 = 1;
}

/// A line between two ship points.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SpringElement {
    pub point_a: u32,
    pub point_b: u32,
}

impl Record for SpringElement {
    const ELEMENTS_PER_RECORD: u32 = 2;
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ShipTriangleElement {
    pub point_a: u32,
    pub point_b: u32,
    pub point_c: u32,
}

impl Record for ShipTriangleElement {
    const ELEMENTS_PER_RECORD: u32 = 3;
}

// ── layouts ───────────────────────────────────────────────────────────────

/// Tile buffers are read as a stream of `vec2<f32>` corners.
pub const TILE_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: 8,
    attributes: &[VertexAttribute {
        location: 0,
        format: AttributeFormat::Float32x2,
        offset: 0,
    }],
};

/// The ship-point buffer: position at location 0, color at location 1.
///
/// Indexed categories use the same layout since they draw from this buffer.
pub const SHIP_POINT_VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: std::mem::size_of::<ShipPointElement>() as u64,
    attributes: &[
        VertexAttribute {
            location: 0,
            format: AttributeFormat::Float32x2,
            offset: 0,
        },
        VertexAttribute {
            location: 1,
            format: AttributeFormat::Float32x3,
            offset: 8,
        },
    ],
};
