//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`FIXSTEP_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use fixstep_core::SimulationSettings;
use fixstep_math::Vec3;
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window configuration
    #[serde(default)]
    pub window: WindowConfig,
    /// Physics configuration
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Demo scene configuration
    #[serde(default)]
    pub demo: DemoConfig,
    /// Headless run configuration
    #[serde(default)]
    pub run: RunConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`FIXSTEP_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // FIXSTEP_PHYSICS__STEP_HZ=120 -> physics.step_hz = 120
        figment = figment.merge(Env::prefixed("FIXSTEP_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Window configuration
///
/// There is no window in a headless run; the size still decides which half
/// of the screen a click lands in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "fixstep - bullet demo".to_string(),
            width: 800,
            height: 480,
        }
    }
}

/// Physics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Physics steps per second
    pub step_hz: f32,
    /// Gravity vector [x, y, z]
    pub gravity: [f32; 3],
    /// Samples averaged for the step cost shown on the overlay
    pub stats_window: usize,
    /// Most steps per frame; unset catches up without limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps_per_frame: Option<u32>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            step_hz: 60.0,
            gravity: [0.0, 0.0, -9.8],
            stats_window: 30,
            max_steps_per_frame: None,
        }
    }
}

impl PhysicsConfig {
    /// Convert to the settings the simulation world is built from
    pub fn to_settings(&self) -> SimulationSettings {
        // The accumulator counts whole nanoseconds
        let step_seconds = 1.0 / self.step_hz;
        let step_seconds = if step_seconds.is_finite() && (step_seconds * 1e9_f32) as u64 > 0 {
            step_seconds
        } else {
            log::warn!("Invalid physics.step_hz {}, using 60", self.step_hz);
            1.0 / 60.0
        };
        SimulationSettings {
            step_seconds,
            gravity: Vec3::new(self.gravity[0], self.gravity[1], self.gravity[2]),
            stats_window: self.stats_window.max(1),
            max_steps_per_frame: self.max_steps_per_frame,
        }
    }
}

/// What the demo uses as ground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    /// Infinite static plane
    #[default]
    Plane,
    /// Triangle mesh height field
    Mesh,
}

/// Demo scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Ground type
    pub terrain: TerrainKind,
    /// Side length of the drawn ground plane
    pub plane_size: f32,
    /// Height dropped objects start from
    pub drop_height: f32,
    /// Objects dropped per drop command
    pub drop_count: u32,
    /// Mass of dropped objects
    pub drop_mass: f32,
    /// Seed for drop positions and shapes
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainKind::Plane,
            plane_size: 50.0,
            drop_height: 20.0,
            drop_count: 20,
            drop_mass: 50.0,
            seed: 0,
        }
    }
}

/// A command fed to the demo at a point in the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Seconds after the start of the run
    pub at: f32,
    /// Typed key, e.g. "d" or "p"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<char>,
    /// Click x position in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_x: Option<f32>,
}

/// Headless run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seconds to run for
    pub duration: f32,
    /// Frames per second to render at
    pub target_fps: f32,
    /// Follow the wall clock (sleeping between frames) instead of a simulated clock
    pub realtime: bool,
    /// Log the overlay line this often, in seconds (0 disables)
    pub overlay_log_interval: f32,
    /// Inputs to feed, in time order
    #[serde(default)]
    pub script: Vec<ScriptedInput>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: 10.0,
            target_fps: 60.0,
            realtime: true,
            overlay_log_interval: 1.0,
            script: vec![
                ScriptedInput { at: 0.5, key: Some('d'), click_x: None },
                ScriptedInput { at: 4.0, key: Some('p'), click_x: None },
                ScriptedInput { at: 5.0, key: Some('p'), click_x: None },
            ],
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Show the diagnostic overlay line
    pub show_overlay: bool,
    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_overlay: true,
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.physics.step_hz, 60.0);
        assert_eq!(config.physics.gravity, [0.0, 0.0, -9.8]);
        assert_eq!(config.demo.terrain, TerrainKind::Plane);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("step_hz"));
        assert!(toml.contains("gravity"));
        assert!(!toml.contains("max_steps_per_frame"));
    }

    #[test]
    fn test_to_settings() {
        let physics = PhysicsConfig {
            step_hz: 120.0,
            max_steps_per_frame: Some(8),
            ..PhysicsConfig::default()
        };
        let settings = physics.to_settings();
        assert_eq!(settings.step_seconds, 1.0 / 120.0);
        assert_eq!(settings.gravity, Vec3::new(0.0, 0.0, -9.8));
        assert_eq!(settings.max_steps_per_frame, Some(8));
    }

    #[test]
    fn test_invalid_step_falls_back() {
        let physics = PhysicsConfig {
            step_hz: 0.0,
            ..PhysicsConfig::default()
        };
        assert_eq!(physics.to_settings().step_seconds, 1.0 / 60.0);
    }

    #[test]
    fn test_out_of_range_step_falls_back() {
        for step_hz in [2.0e9, f32::INFINITY, f32::NAN, -30.0] {
            let physics = PhysicsConfig {
                step_hz,
                ..PhysicsConfig::default()
            };
            let settings = physics.to_settings();
            assert_eq!(settings.step_seconds, 1.0 / 60.0, "step_hz {}", step_hz);
            // Must be accepted by the accumulator
            let world = fixstep_core::SimulationWorld::new(settings);
            assert_eq!(world.object_count(), 0);
        }
    }

    #[test]
    fn test_terrain_kind_parses_lowercase() {
        let demo: DemoConfig = toml::from_str(
            "terrain = \"mesh\"\nplane_size = 10.0\ndrop_height = 5.0\ndrop_count = 3\ndrop_mass = 1.0\nseed = 7\n",
        )
        .unwrap();
        assert_eq!(demo.terrain, TerrainKind::Mesh);
        assert_eq!(demo.seed, 7);
    }
}
