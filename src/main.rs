//! fixstep - fixed-timestep rigid body demo
//!
//! Drops boxes and spheres onto a ground plane and reports the frame rate and
//! physics step cost. Runs headless; input comes from the `[run]` script in
//! the configuration.

use fixstep::config::AppConfig;
use fixstep::systems::SimulationSystem;

fn main() {
    let loaded = AppConfig::load();
    let log_level = loaded
        .as_ref()
        .map(|c| c.debug.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    log::info!("Starting {}", config.window.title);
    let mut system = SimulationSystem::new(config);
    let summary = system.run();

    log::info!(
        "{} frames, {} physics steps ({:.2}s simulated), {} objects dropped, {} resets",
        summary.frames,
        summary.physics_steps,
        summary.simulated_seconds,
        summary.dropped,
        summary.resets
    );
    if summary.render_errors > 0 {
        log::warn!("{} frames failed to render", summary.render_errors);
    }
}
