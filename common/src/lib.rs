//! Shared windowing, GPU setup and camera controls for the visualizers

pub mod graphics;
pub mod camera;

pub use graphics::*;
pub use camera::*;

/// Initialise `env_logger` with an `info` default. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
