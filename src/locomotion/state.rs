//! Player kinematic state and snapshots

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::Collision;
use crate::terrain::Biome;

/// Pitch limit in degrees, both directions
pub const MAX_PITCH: f32 = 89.0;

/// Active locomotion mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    /// Walking with gravity and terrain collision
    #[default]
    Grounded,
    /// Powered flight with lift against gravity
    Flight,
    /// Unconstrained flight, no gravity, no ground
    FreeFlight,
}

impl MovementMode {
    pub fn name(&self) -> &'static str {
        match self {
            MovementMode::Grounded => "Grounded",
            MovementMode::Flight => "Flight",
            MovementMode::FreeFlight => "FreeFlight",
        }
    }

    pub fn is_flying(&self) -> bool {
        !matches!(self, MovementMode::Grounded)
    }
}

impl std::fmt::Display for MovementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Kinematic state of the player.
///
/// Owned by [`LocomotionController`](super::LocomotionController) and mutated
/// once per tick; everything else sees it read-only or as a snapshot clone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Eye position (feet + stance height)
    pub position: Vec3,
    pub velocity: Vec3,
    /// Yaw in degrees, unbounded
    pub yaw: f32,
    /// Pitch in degrees, clamped to [-MAX_PITCH, MAX_PITCH]
    pub pitch: f32,
    pub mode: MovementMode,
    /// Counter-gravity thrust used in Flight
    pub lift_force: f32,
    pub max_lift_active: bool,
    /// Lift in effect before max lift was engaged
    #[serde(skip)]
    pub(crate) lift_before_max: f32,
    pub crouching: bool,
    pub on_ground: bool,
    /// Outcome of the most recent collision check (diagnostic only)
    pub last_collision: Option<Collision>,
    /// Seconds until the next mode change is accepted
    pub mode_cooldown: f32,
    pub current_biome: Option<Biome>,
}

impl PlayerState {
    pub(crate) fn new(position: Vec3, base_lift: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            mode: MovementMode::Grounded,
            lift_force: base_lift,
            max_lift_active: false,
            lift_before_max: base_lift,
            crouching: false,
            on_ground: true,
            last_collision: None,
            mode_cooldown: 0.0,
            current_biome: None,
        }
    }

    /// Horizontal speed in units per second
    pub fn horizontal_speed(&self) -> f32 {
        Vec2::new(self.velocity.x, self.velocity.z).length()
    }
}

/// Partial state written by an external controller.
///
/// Unset fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOverride {
    pub position: Option<Vec3>,
    pub yaw: Option<f32>,
    pub pitch: Option<f32>,
    pub mode: Option<MovementMode>,
    pub lift: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_default_and_names() {
        assert_eq!(MovementMode::default(), MovementMode::Grounded);
        assert_eq!(MovementMode::FreeFlight.to_string(), "FreeFlight");
        assert!(MovementMode::Flight.is_flying());
        assert!(!MovementMode::Grounded.is_flying());
    }

    #[test]
    fn test_new_state() {
        let state = PlayerState::new(Vec3::new(0.0, 1.8, 0.0), 5.0);
        assert_eq!(state.mode, MovementMode::Grounded);
        assert!(state.on_ground);
        assert_eq!(state.lift_force, 5.0);
        assert_eq!(state.velocity, Vec3::ZERO);
        assert!(state.last_collision.is_none());
    }

    #[test]
    fn test_state_serializes() {
        let state = PlayerState::new(Vec3::new(1.0, 2.0, 3.0), 5.0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["mode"], "Grounded");
        assert_eq!(json["position"][1], 2.0);
        assert!(json.get("lift_before_max").is_none());
    }

    #[test]
    fn test_override_partial_json() {
        let o: PlayerOverride = serde_json::from_str(r#"{ "yaw": 90.0, "mode": "Flight" }"#).unwrap();
        assert_eq!(o.yaw, Some(90.0));
        assert_eq!(o.mode, Some(MovementMode::Flight));
        assert!(o.position.is_none());
    }
}
