//! Session configuration: terrain, player, flight and feature flags.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::terrain::TerrainParams;

/// Full configuration handed to the height field and the locomotion
/// controller at construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Terrain generation parameters.
    pub terrain: TerrainParams,
    /// Pedestrian movement and collision thresholds.
    pub player: PlayerParams,
    /// Lift and flight speed parameters.
    pub flight: FlightParams,
    /// Optional subsystems.
    pub features: FeatureFlags,
}

/// Pedestrian movement, collision and camera parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerParams {
    /// Walking speed (units/s)
    pub speed: f32,
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    /// Vertical velocity applied by a jump
    pub jump_force: f32,
    /// Standing eye height above the terrain
    pub player_height: f32,
    /// Crouched height as a fraction of `player_height`
    pub crouch_ratio: f32,
    /// Steepest slope (degrees) that can be walked up
    pub max_climb_angle: f32,
    /// Largest height discontinuity crossable while airborne
    pub max_jump_height: f32,
    /// Largest ledge climbable without a jump
    pub step_height: f32,
    /// Degrees of rotation per unit of look delta
    pub mouse_sensitivity: f32,
    /// Seconds between accepted mode changes
    pub mode_cooldown: f32,
    /// Third-person camera distance behind the player
    pub camera_distance: f32,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self {
            speed: 4.5,
            gravity: 9.8,
            jump_force: 6.0,
            player_height: 1.8,
            crouch_ratio: 0.65,
            max_climb_angle: 45.0,
            max_jump_height: 1.2,
            step_height: 0.5,
            mouse_sensitivity: 0.15,
            mode_cooldown: 0.5,
            camera_distance: 5.0,
        }
    }
}

impl PlayerParams {
    /// Height of the crouched stance
    pub fn crouch_height(&self) -> f32 {
        self.player_height * self.crouch_ratio
    }
}

/// Flight-mode parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightParams {
    /// Lift restored on every mode transition
    pub base_lift: f32,
    /// Upper bound for lift
    pub max_lift: f32,
    /// Step applied by increase/decrease lift
    pub lift_increment: f32,
    /// Horizontal speed multiplier while flying
    pub flight_speed_multiplier: f32,
    /// Extra multiplier while sprinting in flight
    pub sprint_multiplier: f32,
    /// Scales the passive vertical drift
    pub flight_control_sensitivity: f32,
    /// Extra multiplier on top of flight speed in free flight
    pub free_flight_multiplier: f32,
    /// Descent speed as a fraction of lift
    pub descend_ratio: f32,
}

impl Default for FlightParams {
    fn default() -> Self {
        Self {
            base_lift: 5.0,
            max_lift: 15.0,
            lift_increment: 1.0,
            flight_speed_multiplier: 2.0,
            sprint_multiplier: 1.5,
            flight_control_sensitivity: 0.5,
            free_flight_multiplier: 2.0,
            descend_ratio: 0.7,
        }
    }
}

/// Switches for optional subsystems
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Allow entering powered flight
    pub flight: bool,
    /// Allow entering free flight from flight
    pub free_flight: bool,
    /// Refresh the biome under the player every tick
    pub classification: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            flight: true,
            free_flight: true,
            classification: true,
        }
    }
}

impl WorldConfig {
    /// Config with the given seed and defaults everywhere else
    pub fn with_seed(seed: u32) -> Self {
        Self {
            terrain: TerrainParams { seed, ..Default::default() },
            ..Default::default()
        }
    }

    /// Check values that cannot be clamped into something meaningful.
    pub fn validate(&self) -> Result<()> {
        let t = &self.terrain;
        if !(t.block_size.is_finite() && t.block_size > 0.0) {
            return Err(Error::Config(format!("block_size must be > 0, got {}", t.block_size)));
        }
        if !(1..=32).contains(&t.octaves) {
            return Err(Error::Config(format!("octaves must be in 1..=32, got {}", t.octaves)));
        }
        if !t.height_scale.is_finite() || !t.terrain_scale.is_finite() {
            return Err(Error::Config("terrain scales must be finite".into()));
        }
        if t.load_radius < 0.0 {
            return Err(Error::Config(format!("load_radius must be >= 0, got {}", t.load_radius)));
        }

        let p = &self.player;
        if !(p.crouch_ratio > 0.0 && p.crouch_ratio <= 1.0) {
            return Err(Error::Config(format!("crouch_ratio must be in (0, 1], got {}", p.crouch_ratio)));
        }
        if p.player_height <= 0.0 {
            return Err(Error::Config(format!("player_height must be > 0, got {}", p.player_height)));
        }
        if p.mode_cooldown < 0.0 || p.step_height < 0.0 || p.max_jump_height < 0.0 {
            return Err(Error::Config("cooldown and height thresholds must be >= 0".into()));
        }

        let f = &self.flight;
        if f.max_lift < 0.0 {
            return Err(Error::Config(format!("max_lift must be >= 0, got {}", f.max_lift)));
        }
        if !(0.0..=f.max_lift).contains(&f.base_lift) {
            return Err(Error::Config(format!(
                "base_lift {} outside [0, {}]",
                f.base_lift, f.max_lift
            )));
        }

        Ok(())
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("Loaded config from {} (seed {})", path.display(), config.terrain.seed);
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.terrain.seed, 12345);
        assert_eq!(config.terrain.block_size, 1.0);
        assert!(config.terrain.smooth);
        assert_eq!(config.player.gravity, 9.8);
        assert_eq!(config.player.step_height, 0.5);
        assert_eq!(config.flight.max_lift, 15.0);
        assert!(config.features.flight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_crouch_height() {
        let params = PlayerParams::default();
        assert!((params.crouch_height() - 1.17).abs() < 1e-5);
    }

    #[test]
    fn test_validate_rejects_bad_block_size() {
        let mut config = WorldConfig::default();
        config.terrain.block_size = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.terrain.block_size = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_base_lift_above_max() {
        let mut config = WorldConfig::default();
        config.flight.base_lift = 20.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("world.json");

        let mut config = WorldConfig::with_seed(42);
        config.terrain.smooth = false;
        config.features.free_flight = false;
        config.save(&path).unwrap();

        let loaded = WorldConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "terrain": { "seed": 7 }, "player": { "speed": 6.0 } }"#).unwrap();

        let loaded = WorldConfig::load(&path).unwrap();
        assert_eq!(loaded.terrain.seed, 7);
        assert_eq!(loaded.terrain.octaves, 6);
        assert_eq!(loaded.player.speed, 6.0);
        assert_eq!(loaded.player.gravity, 9.8);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(WorldConfig::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = WorldConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
