//! Window-bound wgpu device.
//!
//! [`Gpu`] owns the adapter, the logical device and the window surface. Its
//! only client is [`WgpuApi`](crate::api::WgpuApi), which acquires one
//! [`AcquiredFrame`] when a frame is cleared and submits it when the frame is
//! flushed.

mod gpu;
mod surface;

pub use gpu::Gpu;

/// Device and surface preferences.
#[derive(Debug, Clone)]
pub struct GpuOptions {
    /// Pick an sRGB swapchain format when the surface offers one.
    pub srgb: bool,
    pub present_mode: wgpu::PresentMode,
    /// Falls back to the first supported mode when unsupported.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub power_preference: wgpu::PowerPreference,
    /// Limits the device is created with. The adapter must meet them.
    pub limits: wgpu::Limits,
    /// Hint for how many frames may be queued ahead of presentation.
    pub frame_latency: u32,
}

impl Default for GpuOptions {
    fn default() -> Self {
        Self {
            srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            // Scene pipelines use two vertex attributes and one uniform
            // block, well inside GL-class limits.
            limits: wgpu::Limits::downlevel_webgl2_defaults(),
            frame_latency: 2,
        }
    }
}

/// Swapchain image being drawn into, with the encoder recording its passes.
///
/// The next image cannot be acquired while this one is held.
pub struct AcquiredFrame {
    pub texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// What happened after a failed frame acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceRecovery {
    /// The swapchain was rebuilt; the next frame should succeed.
    Reconfigured,
    /// Transient; only this frame is lost.
    Skip,
    /// The surface cannot be used any more.
    Lost,
}
