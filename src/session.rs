//! Session shell: owns the world and drives it one tick at a time
//!
//! Per tick: merge remote intents and run pre-tick hooks, advance the
//! locomotion controller, reload the active area around the player, then
//! hand a telemetry snapshot to post-tick hooks.

use glam::Vec2;
use log::{debug, info};
use serde::Serialize;

use crate::core::camera::{Camera, ViewMode};
use crate::core::time::{TickClock, TickStats, DEFAULT_MAX_DT};
use crate::core::{Result, WorldConfig};
use crate::locomotion::{Commands, LocomotionController, PlayerOverride, PlayerState};
use crate::terrain::{Biome, HeightField};

/// Per-tick extension point
pub trait TickHook: Send {
    /// Inspect or rewrite the intents before the controller sees them
    fn pre_tick(&mut self, _commands: &mut Commands) {}

    /// Observe the world after the tick
    fn post_tick(&mut self, _telemetry: &TelemetrySnapshot) {}
}

/// Everything a HUD or external observer needs after a tick
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub tick: u64,
    pub player: PlayerState,
    /// Terrain height under the player
    pub ground_height: f32,
    /// Slope under the player in degrees
    pub slope_degrees: f32,
    pub active_chunks: usize,
    pub cache_entries: usize,
    pub epoch: u64,
    pub block_size: f32,
    pub smooth: bool,
    pub view: ViewMode,
}

/// A running world: terrain, player and the glue between them
pub struct Session {
    config: WorldConfig,
    field: HeightField,
    controller: LocomotionController,
    view: ViewMode,
    clock: TickClock,
    /// Intents held by a remote client
    held: Commands,
    /// One-shot intents queued for the next tick only
    queued: Commands,
    hooks: Vec<Box<dyn TickHook>>,
}

impl Session {
    /// Validate the config, build the height field and spawn the player
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;

        let mut field = HeightField::new(config.terrain.clone());
        let controller = LocomotionController::spawn(&config, &mut field);
        let mut session = Self {
            config,
            field,
            controller,
            view: ViewMode::default(),
            clock: TickClock::new(DEFAULT_MAX_DT),
            held: Commands::default(),
            queued: Commands::default(),
            hooks: Vec::new(),
        };
        session.reload_area();

        info!(
            "Session started: seed {}, spawn {:?}, {} active chunks",
            session.field.seed(),
            session.controller.position(),
            session.field.active_area().len()
        );
        Ok(session)
    }

    /// Advance by `dt` seconds (clamped to the clock's max step)
    pub fn tick(&mut self, dt: f32, commands: &Commands) -> TelemetrySnapshot {
        let dt = self.clock.record(dt);
        self.step(dt, commands)
    }

    /// Advance by the wall-clock time since the previous call
    pub fn tick_realtime(&mut self, commands: &Commands) -> TelemetrySnapshot {
        let dt = self.clock.tick();
        self.step(dt, commands)
    }

    fn step(&mut self, dt: f32, commands: &Commands) -> TelemetrySnapshot {
        let mut commands = commands.clone();
        commands.merge(&self.held);
        commands.merge(&std::mem::take(&mut self.queued));
        for hook in self.hooks.iter_mut() {
            hook.pre_tick(&mut commands);
        }

        self.controller.tick(&mut self.field, dt, &commands);
        self.reload_area();

        let telemetry = self.telemetry();
        for hook in self.hooks.iter_mut() {
            hook.post_tick(&telemetry);
        }
        telemetry
    }

    fn reload_area(&mut self) {
        let position = self.controller.position();
        let radius = self.field.params().load_radius_cells();
        self.field.generate_area(position.x, position.z, radius);
    }

    pub fn add_hook(&mut self, hook: Box<dyn TickHook>) {
        self.hooks.push(hook);
    }

    /// Press or release a held remote intent
    pub fn set_held(&mut self, apply: impl FnOnce(&mut Commands)) {
        apply(&mut self.held);
    }

    pub fn held(&self) -> &Commands {
        &self.held
    }

    /// Queue intents for the next tick only
    pub fn queue(&mut self, commands: &Commands) {
        self.queued.merge(commands);
    }

    /// Add a look delta to the next tick
    pub fn queue_look(&mut self, delta: Vec2) {
        self.queued.look += delta;
    }

    pub fn set_smooth(&mut self, smooth: bool) {
        self.field.set_smooth(smooth);
        self.config.terrain.smooth = smooth;
        self.reload_area();
    }

    pub fn toggle_smooth(&mut self) -> bool {
        let smooth = !self.field.is_smooth();
        self.set_smooth(smooth);
        smooth
    }

    /// Set the block size (clamped), returning the effective value
    pub fn set_block_size(&mut self, block_size: f32) -> f32 {
        let effective = self.field.set_block_size(block_size);
        self.config.terrain.block_size = effective;
        self.reload_area();
        effective
    }

    /// Change the block size by `delta` (clamped), returning the new value
    pub fn adjust_terrain_detail(&mut self, delta: f32) -> f32 {
        let effective = self.field.adjust_block_size(delta);
        self.config.terrain.block_size = effective;
        self.reload_area();
        debug!("Terrain detail: block size {:.2}", effective);
        effective
    }

    pub fn toggle_camera_view(&mut self) -> ViewMode {
        self.view = self.view.toggled();
        self.view
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Camera for the current view mode
    pub fn camera(&self) -> Camera {
        let state = self.controller.state();
        Camera::for_view(
            self.view,
            state.position,
            state.yaw,
            state.pitch,
            self.config.player.camera_distance,
        )
    }

    pub fn apply_override(&mut self, o: &PlayerOverride) {
        self.controller.apply_override(o);
        if o.position.is_some() {
            self.reload_area();
        }
    }

    /// Height, slope and biome at a world position
    pub fn terrain_info(&mut self, x: f32, z: f32) -> (f32, f32, Biome) {
        let height = self.field.sample(x, z);
        let slope = self.field.slope(x, z);
        (height, slope, self.field.classify(x, z))
    }

    pub fn telemetry(&mut self) -> TelemetrySnapshot {
        let player = self.controller.snapshot();
        let (x, z) = (player.position.x, player.position.z);
        TelemetrySnapshot {
            tick: self.clock.tick_count(),
            ground_height: self.field.sample(x, z),
            slope_degrees: self.field.slope(x, z),
            player,
            active_chunks: self.field.active_area().len(),
            cache_entries: self.field.cache_len(),
            epoch: self.field.epoch(),
            block_size: self.field.block_size(),
            smooth: self.field.is_smooth(),
            view: self.view,
        }
    }

    pub fn player(&self) -> &PlayerState {
        self.controller.state()
    }

    pub fn controller(&self) -> &LocomotionController {
        &self.controller
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn tick_stats(&self) -> TickStats {
        self.clock.stats()
    }
}
