//! Logger setup.
//!
//! Library code only uses the `log` macros; binaries call [`init_logging`]
//! once to install the `env_logger` backend.

use std::sync::Once;

use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

/// GPU stack crates that are noisy at the default level.
const QUIET_MODULES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. `"shipsim_render=debug,wgpu_core=warn"`.
    /// Takes precedence over `RUST_LOG`.
    pub filter: Option<String>,
    pub style: WriteStyle,
    /// Prefix records with a millisecond timestamp.
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            style: WriteStyle::Auto,
            timestamps: true,
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has an effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").ok();
        // Another logger installed by the host wins.
        if builder(&config, env_filter.as_deref()).try_init().is_ok() {
            log::debug!("logging initialized");
        }
    });
}

fn builder(config: &LoggingConfig, env_filter: Option<&str>) -> Builder {
    let mut builder = Builder::new();

    match config.filter.as_deref().or(env_filter) {
        Some(directives) => {
            builder.parse_filters(directives);
        }
        None => {
            builder.filter_level(LevelFilter::Info);
            for module in QUIET_MODULES {
                builder.filter_module(module, LevelFilter::Warn);
            }
        }
    }

    if config.timestamps {
        builder.format_timestamp_millis();
    } else {
        builder.format_timestamp(None);
    }
    builder.write_style(config.style);
    builder
}
