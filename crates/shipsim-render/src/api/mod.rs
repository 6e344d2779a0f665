//! Graphics API seam.
//!
//! The renderer talks to the GPU through [`GraphicsApi`], a small GL-shaped
//! interface: resources are plain integer handles, programs are built from
//! stage sources and then linked, parameters are looked up by name.
//!
//! Implementations:
//! - [`WgpuApi`] drives a real device through wgpu
//! - [`RecordingApi`] validates shaders the same way but only records calls
//!
//! All methods take `&self`; implementations are single-threaded and use
//! interior mutability, like a GL context bound to the current thread.

pub mod recording;
pub mod reflect;
pub mod wgpu_api;

use std::fmt;

pub use recording::{ApiCall, RecordingApi};
pub use wgpu_api::WgpuApi;

/// Raw GPU resource identifier. Zero is never a live resource.
pub type RawHandle = u32;

/// The "absent" handle.
pub const NO_HANDLE: RawHandle = 0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Byte range of a named member inside a program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ParameterLocation {
    pub offset: u32,
    pub size: u32,
}

/// Value written to a program parameter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ParameterValue {
    Float(f32),
    Vec4([f32; 4]),
    /// Column-major, `m[col][row]`.
    Mat4([[f32; 4]; 4]),
}

impl ParameterValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float(v) => bytemuck::bytes_of(v),
            Self::Vec4(v) => bytemuck::bytes_of(v),
            Self::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendMode {
    Replace,
    /// Straight-alpha "over" blending.
    Alpha,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
}

impl AttributeFormat {
    pub const fn size(self) -> u64 {
        match self {
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    pub format: AttributeFormat,
    pub offset: u64,
}

/// Per-vertex field layout of a vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub stride: u64,
    pub attributes: &'static [VertexAttribute],
}

/// Fixed-function state a program is linked against.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineDesc {
    pub topology: Topology,
    pub blend: BlendMode,
    pub vertex: VertexLayout,
    /// Draws read `u32` indices from a separate index buffer.
    pub indexed: bool,
}

/// One draw call.
///
/// `count` is a vertex count for non-indexed programs and an index count for
/// indexed ones.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub program: RawHandle,
    pub vertex_buffer: RawHandle,
    pub index_buffer: Option<RawHandle>,
    pub count: u32,
}

/// Capabilities reported by an implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiLimits {
    /// Human-readable backend/adapter description.
    pub description: String,
    pub max_vertex_attributes: u32,
}

pub trait GraphicsApi {
    fn limits(&self) -> ApiLimits;

    /// Creates an empty program with no attached stages.
    fn create_program(&self) -> RawHandle;

    /// Compiles `source` for `stage` and attaches it to `program`.
    ///
    /// On failure returns the compiler diagnostic log.
    fn compile_stage(
        &self,
        program: RawHandle,
        stage: ShaderStage,
        source: &str,
    ) -> Result<(), String>;

    /// Links the attached stages. On failure returns the linker log.
    fn link_program(&self, program: RawHandle, desc: &PipelineDesc) -> Result<(), String>;

    /// Looks up a named parameter of a linked program.
    fn parameter_location(&self, program: RawHandle, name: &str) -> Option<ParameterLocation>;

    fn set_parameter(
        &self,
        program: RawHandle,
        location: ParameterLocation,
        value: ParameterValue,
    );

    fn delete_program(&self, program: RawHandle);

    fn create_buffer(&self, kind: BufferKind) -> RawHandle;

    /// Replaces the whole content of `buffer`.
    fn upload_buffer(&self, buffer: RawHandle, bytes: &[u8]);

    fn delete_buffer(&self, buffer: RawHandle);

    /// Resizes the drawable area, in physical pixels.
    fn set_viewport(&self, width: u32, height: u32);

    /// Starts a frame by clearing the framebuffer.
    fn clear(&self, color: [f32; 4]);

    fn draw(&self, call: &DrawCall);

    /// Ends the frame; pending commands become visible.
    fn flush(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_value_bytes_are_tightly_packed() {
        assert_eq!(ParameterValue::Float(1.0).as_bytes().len(), 4);
        assert_eq!(ParameterValue::Vec4([0.0; 4]).as_bytes().len(), 16);
        assert_eq!(ParameterValue::Mat4([[0.0; 4]; 4]).as_bytes().len(), 64);
    }

    #[test]
    fn mat4_bytes_are_column_major() {
        let mut m = [[0.0f32; 4]; 4];
        m[3][0] = 7.0;
        let value = ParameterValue::Mat4(m);
        let floats: &[f32] = bytemuck::cast_slice(value.as_bytes());
        assert_eq!(floats[12], 7.0);
    }
}
