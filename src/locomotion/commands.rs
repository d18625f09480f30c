//! Per-tick player intents
//!
//! Movement intents are "held" flags sampled every tick. Mode and lift
//! commands are one-shot: the host sets them for the tick they should fire.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Structured set of intents for one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Commands {
    pub move_forward: bool,
    pub move_back: bool,
    pub move_left: bool,
    pub move_right: bool,
    /// Jump while walking
    pub jump: bool,
    /// Crouch while walking
    pub crouch: bool,
    /// Climb while flying
    pub ascend: bool,
    /// Sink while flying
    pub descend: bool,
    /// Speed boost while flying
    pub sprint: bool,

    pub toggle_flight: bool,
    pub toggle_free_flight: bool,
    pub reset_flight: bool,
    pub increase_lift: bool,
    pub decrease_lift: bool,
    pub hover_lift: bool,
    pub toggle_max_lift: bool,

    /// Look delta (x = yaw, y = pitch) in input units
    pub look: Vec2,
}

impl Commands {
    /// No intents at all
    pub fn idle() -> Self {
        Self::default()
    }

    /// Combine two intent sets: flags are OR-ed, look deltas summed.
    pub fn merge(&mut self, other: &Commands) {
        self.move_forward |= other.move_forward;
        self.move_back |= other.move_back;
        self.move_left |= other.move_left;
        self.move_right |= other.move_right;
        self.jump |= other.jump;
        self.crouch |= other.crouch;
        self.ascend |= other.ascend;
        self.descend |= other.descend;
        self.sprint |= other.sprint;
        self.toggle_flight |= other.toggle_flight;
        self.toggle_free_flight |= other.toggle_free_flight;
        self.reset_flight |= other.reset_flight;
        self.increase_lift |= other.increase_lift;
        self.decrease_lift |= other.decrease_lift;
        self.hover_lift |= other.hover_lift;
        self.toggle_max_lift |= other.toggle_max_lift;
        self.look += other.look;
    }

    /// Whether any planar movement intent is set
    pub fn has_planar_movement(&self) -> bool {
        self.move_forward || self.move_back || self.move_left || self.move_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_is_empty() {
        let c = Commands::idle();
        assert!(!c.has_planar_movement());
        assert_eq!(c.look, Vec2::ZERO);
    }

    #[test]
    fn test_merge() {
        let mut a = Commands { move_forward: true, look: Vec2::new(1.0, 2.0), ..Default::default() };
        let b = Commands { jump: true, toggle_flight: true, look: Vec2::new(0.5, -1.0), ..Default::default() };
        a.merge(&b);
        assert!(a.move_forward);
        assert!(a.jump);
        assert!(a.toggle_flight);
        assert!(!a.crouch);
        assert_eq!(a.look, Vec2::new(1.5, 1.0));
    }

    #[test]
    fn test_deserialize_partial() {
        let c: Commands = serde_json::from_str(r#"{ "move_left": true, "look": [3.0, 0.0] }"#).unwrap();
        assert!(c.move_left);
        assert!(c.has_planar_movement());
        assert_eq!(c.look.x, 3.0);
    }
}
