//! Instanced triangles on a golden-angle spiral.

mod color_module;
mod layout;
mod scene;

use winit::dpi::LogicalSize;

use phyllo_engine::device::GpuInit;
use phyllo_engine::logging::{init_logging, LoggingConfig};
use phyllo_engine::window::{Runtime, RuntimeConfig};

use crate::scene::{InstancedTriangles, SceneConfig};

fn main() {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "phyllo · instanced triangles".to_string(),
        initial_size: LogicalSize::new(1000.0, 1000.0),
        ..Default::default()
    };

    // The shader writes gray levels directly; keep the surface linear so they
    // reach the screen unchanged.
    let gpu_init = GpuInit {
        prefer_srgb: false,
        debug: true,
        ..Default::default()
    };

    let app = InstancedTriangles::new(SceneConfig::default());

    if let Err(err) = Runtime::run(config, gpu_init, app) {
        log::error!("phyllo runtime error: {err:#}");
        std::process::exit(1);
    }
}
