//! Batched scene renderer.
//!
//! Each geometry category (land, water, ship points, springs, stressed
//! springs, ship triangles) pairs one shader program with one geometry batch.
//! Batches are filled on the CPU every frame and uploaded in a single transfer
//! before their draw.
//!
//! Convention:
//! - geometry is in world units, +Y up
//! - vertex shaders project with the context's orthographic matrix

pub mod batch;
pub mod camera;
mod context;
mod coords;
pub mod handle;
pub mod programs;
pub mod records;
pub mod shader;

pub use batch::{GeometryBatch, GpuBatch};
pub use camera::{Camera, Mat4};
pub use context::RenderContext;
pub use coords::{ColorRgba, Vec2};
pub use handle::{BufferHandle, GpuHandle, ProgramHandle};
pub use shader::{Parameter, ShaderProgram};
