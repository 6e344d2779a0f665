//! Per-category program sources and fixed-function state.

use crate::api::{BlendMode, PipelineDesc, Topology};

use super::records::{SHIP_POINT_VERTEX_LAYOUT, TILE_VERTEX_LAYOUT};
use super::shader::{Parameter, ProgramSource};

use Parameter::{AmbientLightIntensity, Color, OrthoMatrix};

pub const LAND: ProgramSource = ProgramSource {
    name: "Land",
    source: include_str!("shaders/land.wgsl"),
    pipeline: PipelineDesc {
        topology: Topology::TriangleStrip,
        blend: BlendMode::Replace,
        vertex: TILE_VERTEX_LAYOUT,
        indexed: false,
    },
    parameters: &[OrthoMatrix, Color, AmbientLightIntensity],
};

pub const WATER: ProgramSource = ProgramSource {
    name: "Water",
    source: include_str!("shaders/water.wgsl"),
    pipeline: PipelineDesc {
        topology: Topology::TriangleStrip,
        blend: BlendMode::Alpha,
        vertex: TILE_VERTEX_LAYOUT,
        indexed: false,
    },
    parameters: &[OrthoMatrix, Color, AmbientLightIntensity],
};

pub const SHIP_POINT: ProgramSource = ProgramSource {
    name: "Ship Point",
    source: include_str!("shaders/ship_point.wgsl"),
    pipeline: PipelineDesc {
        topology: Topology::PointList,
        blend: BlendMode::Replace,
        vertex: SHIP_POINT_VERTEX_LAYOUT,
        indexed: false,
    },
    parameters: &[OrthoMatrix, AmbientLightIntensity],
};

pub const SPRING: ProgramSource = ProgramSource {
    name: "Spring",
    source: include_str!("shaders/spring.wgsl"),
    pipeline: PipelineDesc {
        topology: Topology::LineList,
        blend: BlendMode::Replace,
        vertex: SHIP_POINT_VERTEX_LAYOUT,
        indexed: true,
    },
    parameters: &[OrthoMatrix],
};

pub const STRESSED_SPRING: ProgramSource = ProgramSource {
    name: "Stressed Spring",
    source: include_str!("shaders/stressed_spring.wgsl"),
    pipeline: PipelineDesc {
        topology: Topology::LineList,
        blend: BlendMode::Replace,
        vertex: SHIP_POINT_VERTEX_LAYOUT,
        indexed: true,
    },
    parameters: &[OrthoMatrix, Color, AmbientLightIntensity],
};

pub const SHIP_TRIANGLE: ProgramSource = ProgramSource {
    name: "Ship Triangle",
    source: include_str!("shaders/ship_triangle.wgsl"),
    pipeline: PipelineDesc {
        topology: Topology::TriangleList,
        blend: BlendMode::Replace,
        vertex: SHIP_POINT_VERTEX_LAYOUT,
        indexed: true,
    },
    parameters: &[OrthoMatrix],
};

pub const ALL: [&ProgramSource; 6] = [
    &LAND,
    &WATER,
    &SHIP_POINT,
    &SPRING,
    &STRESSED_SPRING,
    &SHIP_TRIANGLE,
];
