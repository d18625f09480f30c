//! Horizontal movement decisions against the height field
//!
//! Only Grounded movement is collided. The policy is a fixed priority list;
//! the first rule that matches decides whether the displacement happens.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::PlayerParams;
use crate::terrain::{HeightField, NoiseSource};

/// Result of a collision check
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Collision {
    /// Flat, downhill, or a climbable slope
    WalkOver,
    /// Small ledge; the player is lifted by `rise`
    StepUp { rise: f32 },
    /// Airborne player clearing a discontinuity
    JumpOver,
    /// Movement rejected; `slope` is the angle at the target in degrees
    Blocked { slope: f32 },
}

impl Collision {
    /// Whether the displacement is applied
    pub fn allows_movement(&self) -> bool {
        !matches!(self, Collision::Blocked { .. })
    }

    /// Vertical snap applied with the displacement
    pub fn rise(&self) -> f32 {
        match self {
            Collision::StepUp { rise } => *rise,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for Collision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collision::WalkOver => write!(f, "Walkable slope"),
            Collision::StepUp { rise } => write!(f, "Stepped up {:.2}", rise),
            Collision::JumpOver => write!(f, "Jumpable obstacle"),
            Collision::Blocked { slope } => write!(f, "Blocked by slope {:.1}°", slope),
        }
    }
}

/// Thresholds for the collision rules
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionPolicy {
    /// Steepest climbable slope in degrees
    pub max_climb_angle: f32,
    /// Largest ledge climbed without jumping
    pub step_height: f32,
    /// Largest discontinuity cleared while airborne (exclusive)
    pub max_jump_height: f32,
}

impl CollisionPolicy {
    pub fn from_params(params: &PlayerParams) -> Self {
        Self {
            max_climb_angle: params.max_climb_angle,
            step_height: params.step_height,
            max_jump_height: params.max_jump_height,
        }
    }

    /// Decide whether moving by (dx, dz) from `position` is allowed.
    ///
    /// Descending is always allowed regardless of steepness; only climbing is
    /// gated by slope.
    pub fn evaluate<N: NoiseSource>(
        &self,
        field: &mut HeightField<N>,
        position: Vec3,
        on_ground: bool,
        dx: f32,
        dz: f32,
    ) -> Collision {
        let target_x = position.x + dx;
        let target_z = position.z + dz;

        let current = field.sample(position.x, position.z);
        let target = field.sample(target_x, target_z);
        let diff = target - current;

        if diff <= 0.0 {
            return Collision::WalkOver;
        }

        let slope = field.slope(target_x, target_z);
        if slope <= self.max_climb_angle {
            return Collision::WalkOver;
        }

        if diff <= self.step_height {
            return Collision::StepUp { rise: diff };
        }

        if !on_ground && diff.abs() < self.max_jump_height {
            return Collision::JumpOver;
        }

        Collision::Blocked { slope }
    }
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        Self::from_params(&PlayerParams::default())
    }
}
