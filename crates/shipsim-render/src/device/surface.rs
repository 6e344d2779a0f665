use winit::dpi::PhysicalSize;

use super::SurfaceRecovery;

/// A window surface together with its swapchain configuration.
pub(super) struct WindowSurface<'w> {
    surface: wgpu::Surface<'w>,
    config: wgpu::SurfaceConfiguration,
    /// Last size requested by the window, possibly zero.
    size: PhysicalSize<u32>,
}

impl<'w> WindowSurface<'w> {
    pub(super) fn new(
        surface: wgpu::Surface<'w>,
        config: wgpu::SurfaceConfiguration,
        device: &wgpu::Device,
    ) -> Self {
        surface.configure(device, &config);
        let size = PhysicalSize::new(config.width, config.height);
        Self {
            surface,
            config,
            size,
        }
    }

    pub(super) fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(super) fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn is_visible(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    /// Records the new size. A zero-area surface keeps its old swapchain
    /// until it becomes visible again.
    pub(super) fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.size = size;
        if !self.is_visible() || (self.config.width, self.config.height) == (size.width, size.height)
        {
            return;
        }

        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(device, &self.config);
        log::debug!("surface reconfigured to {}x{}", size.width, size.height);
    }

    pub(super) fn acquire(&self) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }

    pub(super) fn recover(&self, device: &wgpu::Device, err: &wgpu::SurfaceError) -> SurfaceRecovery {
        let recovery = recovery_for(err);
        if recovery == SurfaceRecovery::Reconfigured && self.is_visible() {
            self.surface.configure(device, &self.config);
        }
        recovery
    }
}

pub(super) fn pick_format(
    formats: &[wgpu::TextureFormat],
    srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = *formats.first()?;
    if !srgb {
        return Some(first);
    }

    [
        wgpu::TextureFormat::Bgra8UnormSrgb,
        wgpu::TextureFormat::Rgba8UnormSrgb,
    ]
    .into_iter()
    .find(|f| formats.contains(f))
    .or(Some(first))
}

pub(super) fn pick_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|mode| supported.contains(mode))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

fn recovery_for(err: &wgpu::SurfaceError) -> SurfaceRecovery {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Lost,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceRecovery::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode, SurfaceError, TextureFormat};

    // ── format ────────────────────────────────────────────────────────────

    #[test]
    fn srgb_format_preferred_when_offered() {
        let formats = [TextureFormat::Bgra8Unorm, TextureFormat::Rgba8UnormSrgb];
        assert_eq!(pick_format(&formats, true), Some(TextureFormat::Rgba8UnormSrgb));
        assert_eq!(pick_format(&formats, false), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn first_format_when_no_srgb() {
        let formats = [TextureFormat::Rgba16Float, TextureFormat::Bgra8Unorm];
        assert_eq!(pick_format(&formats, true), Some(TextureFormat::Rgba16Float));
    }

    #[test]
    fn no_formats_means_unusable_surface() {
        assert_eq!(pick_format(&[], true), None);
    }

    // ── alpha ─────────────────────────────────────────────────────────────

    #[test]
    fn unsupported_alpha_mode_falls_back() {
        let supported = [CompositeAlphaMode::Opaque];
        assert_eq!(
            pick_alpha_mode(&supported, Some(CompositeAlphaMode::PreMultiplied)),
            CompositeAlphaMode::Opaque
        );
        assert_eq!(pick_alpha_mode(&[], None), CompositeAlphaMode::Auto);
    }

    // ── errors ────────────────────────────────────────────────────────────

    #[test]
    fn surface_errors_map_to_recovery() {
        assert_eq!(recovery_for(&SurfaceError::Outdated), SurfaceRecovery::Reconfigured);
        assert_eq!(recovery_for(&SurfaceError::Lost), SurfaceRecovery::Reconfigured);
        assert_eq!(recovery_for(&SurfaceError::Timeout), SurfaceRecovery::Skip);
        assert_eq!(recovery_for(&SurfaceError::OutOfMemory), SurfaceRecovery::Lost);
    }
}
