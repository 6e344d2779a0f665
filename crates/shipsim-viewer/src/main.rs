//! shipsim viewer.
//!
//! Controls: mouse wheel zooms, right-drag pans, `T` toggles transparent
//! water, `P` toggles the point-cloud view, `+`/`-` change the ambient light,
//! `Esc` quits.

mod app;
mod config;
mod demo;
mod time;

use std::process::ExitCode;

use shipsim_render::logging::init_logging;

use crate::app::Viewer;
use crate::config::ViewerConfig;

fn main() -> ExitCode {
    let config = ViewerConfig::default();
    init_logging(config.logging.clone());

    match Viewer::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("shipsim exited with an error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
