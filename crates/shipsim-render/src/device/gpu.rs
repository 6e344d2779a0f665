use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::surface::{self, WindowSurface};
use super::{AcquiredFrame, GpuOptions, SurfaceRecovery};

/// Adapter, device and window surface.
///
/// `'w` ties the surface to the window it presents to.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: WindowSurface<'w>,
}

impl<'w> Gpu<'w> {
    pub async fn new(window: &'w Window, options: GpuOptions) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(
            size.width > 0 && size.height > 0,
            "cannot create a surface for a {}x{} window",
            size.width,
            size.height
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let raw_surface = instance
            .create_surface(window)
            .context("failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                compatible_surface: Some(&raw_surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter can present to the window")?;

        let info = adapter.get_info();
        log::info!(
            "adapter \"{}\" ({:?}, {:?}), driver {} {}",
            info.name,
            info.backend,
            info.device_type,
            info.driver,
            info.driver_info
        );
        anyhow::ensure!(
            options.limits.check_limits(&adapter.limits()),
            "adapter \"{}\" is below the required device limits",
            info.name
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("shipsim device"),
                required_features: wgpu::Features::empty(),
                required_limits: options.limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to open the GPU device")?;

        let caps = raw_surface.get_capabilities(&adapter);
        let format = surface::pick_format(&caps.formats, options.srgb)
            .context("the surface reports no texture formats")?;
        let alpha_mode = surface::pick_alpha_mode(&caps.alpha_modes, options.alpha_mode);
        log::debug!("surface format {format:?}, alpha mode {alpha_mode:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: options.present_mode,
            alpha_mode,
            view_formats: Vec::new(),
            desired_maximum_frame_latency: options.frame_latency,
        };
        let surface = WindowSurface::new(raw_surface, config, &device);

        Ok(Self {
            _instance: instance,
            adapter,
            device,
            queue,
            surface,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Limits granted to the device.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface.format()
    }

    /// Drawable size in physical pixels. May be zero while minimized.
    pub fn size(&self) -> PhysicalSize<u32> {
        self.surface.size()
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.surface.resize(&self.device, size);
    }

    /// Acquires the next swapchain image and opens an encoder for it.
    pub fn begin_frame(&self) -> Result<AcquiredFrame, wgpu::SurfaceError> {
        let texture = self.surface.acquire()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("shipsim frame"),
            });

        Ok(AcquiredFrame {
            texture,
            view,
            encoder,
        })
    }

    /// Submits everything recorded into `frame` and presents it.
    pub fn present(&self, frame: AcquiredFrame) {
        let AcquiredFrame {
            texture,
            view,
            encoder,
        } = frame;
        self.queue.submit([encoder.finish()]);
        drop(view);
        texture.present();
    }

    /// Reacts to a failed [`begin_frame`](Self::begin_frame).
    pub fn recover(&self, err: &wgpu::SurfaceError) -> SurfaceRecovery {
        self.surface.recover(&self.device, err)
    }
}
