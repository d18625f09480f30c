//! Per-tick locomotion controller
//!
//! Owns the player state and advances it once per tick in a fixed order:
//! look, mode changes, lift controls, the active mode's movement update, then
//! terrain classification. Mode changes share a cooldown; unsupported
//! transitions are silently ignored.

use glam::{Vec2, Vec3};
use log::{debug, trace};

use super::collision::{Collision, CollisionPolicy};
use super::commands::Commands;
use super::state::{MovementMode, PlayerOverride, PlayerState, MAX_PITCH};
use crate::core::{FeatureFlags, FlightParams, PlayerParams, WorldConfig};
use crate::terrain::{HeightField, NoiseSource};

/// Planar (x, z) movement direction from yaw and WASD intents, normalized
fn planar_direction(yaw_degrees: f32, commands: &Commands) -> Vec2 {
    let (sin, cos) = yaw_degrees.to_radians().sin_cos();
    let forward = Vec2::new(cos, sin);
    let right = Vec2::new(-sin, cos);

    let mut dir = Vec2::ZERO;
    if commands.move_forward {
        dir += forward;
    }
    if commands.move_back {
        dir -= forward;
    }
    if commands.move_right {
        dir += right;
    }
    if commands.move_left {
        dir -= right;
    }
    dir.normalize_or_zero()
}

/// Locomotion controller for a single player
pub struct LocomotionController {
    player: PlayerParams,
    flight: FlightParams,
    features: FeatureFlags,
    policy: CollisionPolicy,
    state: PlayerState,
}

impl LocomotionController {
    /// Spawn a grounded player standing on the terrain at the origin
    pub fn spawn<N: NoiseSource>(config: &WorldConfig, field: &mut HeightField<N>) -> Self {
        let ground = field.sample(0.0, 0.0);
        let position = Vec3::new(0.0, ground + config.player.player_height, 0.0);

        let mut controller = Self {
            player: config.player.clone(),
            flight: config.flight.clone(),
            features: config.features,
            policy: CollisionPolicy::from_params(&config.player),
            state: PlayerState::new(position, config.flight.base_lift),
        };
        controller.refresh_biome(field);

        debug!("Spawned player at {:?} (ground {:.2})", position, ground);
        controller
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> PlayerState {
        self.state.clone()
    }

    pub fn mode(&self) -> MovementMode {
        self.state.mode
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn player_params(&self) -> &PlayerParams {
        &self.player
    }

    pub fn flight_params(&self) -> &FlightParams {
        &self.flight
    }

    /// Current stance height (eye above ground)
    pub fn stance_height(&self) -> f32 {
        if self.state.crouching {
            self.player.crouch_height()
        } else {
            self.player.player_height
        }
    }

    /// Advance the player by `dt` seconds
    pub fn tick<N: NoiseSource>(&mut self, field: &mut HeightField<N>, dt: f32, commands: &Commands) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.state.mode_cooldown = (self.state.mode_cooldown - dt).max(0.0);

        if commands.look != Vec2::ZERO {
            self.look(commands.look);
        }

        // Free flight is checked first so both toggles in one tick resolve
        // to a single transition.
        if commands.toggle_free_flight {
            self.toggle_free_flight();
        }
        if commands.toggle_flight {
            self.toggle_flight();
        }
        if commands.reset_flight {
            self.reset_flight();
        }

        if commands.increase_lift {
            self.increase_lift();
        }
        if commands.decrease_lift {
            self.decrease_lift();
        }
        if commands.hover_lift {
            self.set_hover_lift();
        }
        if commands.toggle_max_lift {
            self.toggle_max_lift();
        }

        match self.state.mode {
            MovementMode::Grounded => self.update_grounded(field, dt, commands),
            MovementMode::Flight => self.update_flight(field, dt, commands),
            MovementMode::FreeFlight => self.update_free_flight(dt, commands),
        }

        self.refresh_biome(field);
    }

    /// Apply a look delta in input units
    pub fn look(&mut self, delta: Vec2) {
        let sensitivity = self.player.mouse_sensitivity;
        self.state.yaw += delta.x * sensitivity;
        self.state.pitch = (self.state.pitch - delta.y * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Grounded <-> Flight. Returns whether the mode changed.
    pub fn toggle_flight(&mut self) -> bool {
        if self.state.mode_cooldown > 0.0 {
            return false;
        }
        let target = match self.state.mode {
            MovementMode::Grounded if self.features.flight => MovementMode::Flight,
            MovementMode::Flight => MovementMode::Grounded,
            _ => return false,
        };
        self.transition(target);
        true
    }

    /// Flight <-> FreeFlight. Returns whether the mode changed.
    pub fn toggle_free_flight(&mut self) -> bool {
        if self.state.mode_cooldown > 0.0 {
            return false;
        }
        let target = match self.state.mode {
            MovementMode::Flight if self.features.free_flight => MovementMode::FreeFlight,
            MovementMode::FreeFlight => MovementMode::Flight,
            _ => return false,
        };
        self.transition(target);
        true
    }

    /// Force Grounded and clear flight state, ignoring the cooldown
    pub fn reset_flight(&mut self) {
        debug!("Flight reset from {}", self.state.mode);
        self.state.mode = MovementMode::Grounded;
        self.clear_flight_state();
    }

    fn transition(&mut self, to: MovementMode) {
        debug!("Mode {} -> {}", self.state.mode, to);
        self.state.mode = to;
        self.clear_flight_state();
        self.state.mode_cooldown = self.player.mode_cooldown;
        if to == MovementMode::FreeFlight {
            self.state.on_ground = false;
        }
    }

    fn clear_flight_state(&mut self) {
        self.state.lift_force = self.flight.base_lift;
        self.state.lift_before_max = self.flight.base_lift;
        self.state.max_lift_active = false;
        self.state.velocity.y = 0.0;
    }

    pub fn increase_lift(&mut self) {
        self.state.lift_force = (self.state.lift_force + self.flight.lift_increment).clamp(0.0, self.flight.max_lift);
    }

    pub fn decrease_lift(&mut self) {
        self.state.lift_force = (self.state.lift_force - self.flight.lift_increment).clamp(0.0, self.flight.max_lift);
    }

    /// Set lift to exactly cancel gravity
    pub fn set_hover_lift(&mut self) {
        self.state.lift_force = self.player.gravity.clamp(0.0, self.flight.max_lift);
    }

    /// Engage max lift, or restore the lift in effect before it was engaged
    pub fn toggle_max_lift(&mut self) {
        if self.state.max_lift_active {
            self.state.lift_force = self.state.lift_before_max;
            self.state.max_lift_active = false;
        } else {
            self.state.lift_before_max = self.state.lift_force;
            self.state.lift_force = self.flight.max_lift;
            self.state.max_lift_active = true;
        }
    }

    /// Overwrite parts of the state from an external controller.
    ///
    /// A mode set here bypasses the transition rules and the cooldown.
    pub fn apply_override(&mut self, o: &PlayerOverride) {
        if let Some(position) = o.position {
            self.state.position = position;
        }
        if let Some(yaw) = o.yaw {
            self.state.yaw = yaw;
        }
        if let Some(pitch) = o.pitch {
            self.state.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        }
        if let Some(mode) = o.mode {
            if mode != self.state.mode {
                debug!("Mode {} -> {} (override)", self.state.mode, mode);
                self.state.mode = mode;
                self.state.velocity.y = 0.0;
                if mode == MovementMode::FreeFlight {
                    self.state.on_ground = false;
                }
            }
        }
        if let Some(lift) = o.lift {
            self.state.lift_force = lift.clamp(0.0, self.flight.max_lift);
            self.state.max_lift_active = false;
        }
    }

    fn update_grounded<N: NoiseSource>(&mut self, field: &mut HeightField<N>, dt: f32, commands: &Commands) {
        let mut step = planar_direction(self.state.yaw, commands) * self.player.speed * dt;

        if step != Vec2::ZERO {
            let collision = self
                .policy
                .evaluate(field, self.state.position, self.state.on_ground, step.x, step.y);
            trace!("Collision at {:?}: {}", self.state.position, collision);

            self.state.position.y += collision.rise();
            if !collision.allows_movement() {
                step = Vec2::ZERO;
            }
            self.state.last_collision = Some(collision);
        }

        let state = &mut self.state;
        state.velocity.y -= self.player.gravity * dt;
        state.position.x += step.x + state.velocity.x * dt;
        state.position.z += step.y + state.velocity.z * dt;
        state.position.y += state.velocity.y * dt;

        let previous_stance = self.stance_height();
        self.state.crouching = commands.crouch;
        let stance = self.stance_height();
        if self.state.on_ground && stance != previous_stance {
            self.state.position.y += stance - previous_stance;
        }

        let floor = field.sample(self.state.position.x, self.state.position.z) + stance;
        let state = &mut self.state;
        if state.position.y < floor {
            state.position.y = floor;
            state.velocity.y = 0.0;
            state.on_ground = true;
        } else {
            state.on_ground = false;
        }

        if commands.jump && state.on_ground {
            state.velocity.y = self.player.jump_force;
            state.on_ground = false;
        }
    }

    fn update_flight<N: NoiseSource>(&mut self, field: &mut HeightField<N>, dt: f32, commands: &Commands) {
        let mut speed = self.player.speed * self.flight.flight_speed_multiplier;
        if commands.sprint {
            speed *= self.flight.sprint_multiplier;
        }
        let step = planar_direction(self.state.yaw, commands) * speed * dt;

        let state = &mut self.state;
        state.position.x += step.x;
        state.position.z += step.y;

        if commands.ascend {
            state.velocity.y = state.lift_force;
        } else if commands.descend {
            state.velocity.y = -self.flight.descend_ratio * state.lift_force;
        } else {
            state.velocity.y +=
                (self.player.gravity - state.lift_force) * self.flight.flight_control_sensitivity * dt;
        }
        state.position.y += state.velocity.y * dt;

        state.crouching = false;
        let floor = field.sample(state.position.x, state.position.z) + self.player.player_height;
        if state.position.y < floor {
            state.position.y = floor;
            state.velocity.y = 0.0;
            state.on_ground = true;
        } else {
            state.on_ground = false;
        }
    }

    fn update_free_flight(&mut self, dt: f32, commands: &Commands) {
        let state = &mut self.state;
        let (sin_yaw, cos_yaw) = state.yaw.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = state.pitch.to_radians().sin_cos();

        let forward = Vec3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch);
        let right = Vec3::new(-sin_yaw, 0.0, cos_yaw);

        let mut dir = Vec3::ZERO;
        if commands.move_forward {
            dir += forward;
        }
        if commands.move_back {
            dir -= forward;
        }
        if commands.move_right {
            dir += right;
        }
        if commands.move_left {
            dir -= right;
        }
        if commands.ascend {
            dir += Vec3::Y;
        }
        if commands.descend {
            dir -= Vec3::Y;
        }

        let speed = self.player.speed * self.flight.flight_speed_multiplier * self.flight.free_flight_multiplier;
        state.position += dir.normalize_or_zero() * speed * dt;
        state.crouching = false;
        state.on_ground = false;
    }

    fn refresh_biome<N: NoiseSource>(&mut self, field: &HeightField<N>) {
        if self.features.classification {
            self.state.current_biome = Some(field.classify(self.state.position.x, self.state.position.z));
        }
    }

    /// Last collision outcome, if any movement was checked
    pub fn last_collision(&self) -> Option<Collision> {
        self.state.last_collision
    }
}
