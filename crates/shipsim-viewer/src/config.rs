use std::time::Duration;

use shipsim_render::device::GpuOptions;
use shipsim_render::logging::LoggingConfig;
use shipsim_render::RenderSettings;
use winit::dpi::LogicalSize;

use crate::demo::DemoConfig;

/// Viewer configuration.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,

    /// How often the window title's frame rate is refreshed.
    pub stats_interval: Duration,

    /// Zoom factor applied per wheel line.
    pub zoom_step: f32,
    /// Ambient light change per key press.
    pub ambient_step: f32,

    pub logging: LoggingConfig,
    pub gpu: GpuOptions,
    pub render: RenderSettings,
    pub demo: DemoConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "shipsim".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
            stats_interval: Duration::from_secs(1),
            zoom_step: 1.1,
            ambient_step: 0.1,
            logging: LoggingConfig::default(),
            gpu: GpuOptions::default(),
            render: RenderSettings {
                initial_zoom: 2.0,
                ..RenderSettings::default()
            },
            demo: DemoConfig::default(),
        }
    }
}
