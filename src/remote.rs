//! Control-server handler backed by a shared [`Session`]
//!
//! Held intents and look deltas land in the session's intent buffers and are
//! merged into the next tick; terrain and camera actions apply immediately.

use std::sync::{Arc, Mutex, MutexGuard};

use glam::{Vec2, Vec3};
use terrawalk_control::{
    Action, ControlCommand, ControlHandler, ControlResponse, Intent, PlayerStateInfo, ResponseData,
    SessionInfo,
};

use crate::locomotion::{Commands, MovementMode, PlayerOverride, PlayerState};
use crate::session::Session;

fn parse_mode(name: &str) -> Option<MovementMode> {
    match name.to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
        "grounded" | "walk" | "walking" => Some(MovementMode::Grounded),
        "flight" | "fly" | "flying" => Some(MovementMode::Flight),
        "freeflight" | "free" => Some(MovementMode::FreeFlight),
        _ => None,
    }
}

fn set_intent(commands: &mut Commands, intent: Intent, active: bool) {
    let flag = match intent {
        Intent::Forward => &mut commands.move_forward,
        Intent::Back => &mut commands.move_back,
        Intent::Left => &mut commands.move_left,
        Intent::Right => &mut commands.move_right,
        Intent::Jump => &mut commands.jump,
        Intent::Crouch => &mut commands.crouch,
        Intent::Ascend => &mut commands.ascend,
        Intent::Descend => &mut commands.descend,
        Intent::Sprint => &mut commands.sprint,
    };
    *flag = active;
}

/// Commands with a single one-shot flag set
fn one_shot(set: fn(&mut Commands)) -> Commands {
    let mut c = Commands::default();
    set(&mut c);
    c
}

impl From<&PlayerState> for PlayerStateInfo {
    fn from(s: &PlayerState) -> Self {
        Self {
            position: s.position.to_array(),
            velocity: s.velocity.to_array(),
            yaw: s.yaw,
            pitch: s.pitch,
            mode: s.mode.name().to_string(),
            lift: s.lift_force,
            max_lift_active: s.max_lift_active,
            crouching: s.crouching,
            on_ground: s.on_ground,
            mode_cooldown: s.mode_cooldown,
            last_collision: s.last_collision.map(|c| c.to_string()),
            biome: s.current_biome.map(|b| b.name().to_string()),
        }
    }
}

/// [`ControlHandler`] driving a session shared with the tick loop
pub struct SessionControl {
    session: Arc<Mutex<Session>>,
}

impl SessionControl {
    pub fn new(session: Arc<Mutex<Session>>) -> Self {
        Self { session }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // A panicked tick leaves the session usable; keep serving it
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn trigger(&self, action: Action) -> ControlResponse {
        let mut session = self.session();

        match action {
            Action::ToggleFlight => session.queue(&one_shot(|c| c.toggle_flight = true)),
            Action::ToggleFreeFlight => session.queue(&one_shot(|c| c.toggle_free_flight = true)),
            Action::ResetFlight => session.queue(&one_shot(|c| c.reset_flight = true)),
            Action::IncreaseLift => session.queue(&one_shot(|c| c.increase_lift = true)),
            Action::DecreaseLift => session.queue(&one_shot(|c| c.decrease_lift = true)),
            Action::HoverLift => session.queue(&one_shot(|c| c.hover_lift = true)),
            Action::ToggleMaxLift => session.queue(&one_shot(|c| c.toggle_max_lift = true)),
            Action::ToggleSmooth => {
                let smooth = session.toggle_smooth();
                return ControlResponse::updated(format!("smooth = {}", smooth));
            }
            Action::ToggleCamera => {
                let view = session.toggle_camera_view();
                return ControlResponse::updated(format!("view = {:?}", view));
            }
            Action::IncreaseDetail => {
                let bs = session.adjust_terrain_detail(-0.1);
                return ControlResponse::updated(format!("block_size = {:.2}", bs));
            }
            Action::DecreaseDetail => {
                let bs = session.adjust_terrain_detail(0.1);
                return ControlResponse::updated(format!("block_size = {:.2}", bs));
            }
        }
        ControlResponse::none()
    }
}

impl ControlHandler for SessionControl {
    fn handle_command(&mut self, cmd: ControlCommand) -> ControlResponse {
        match cmd {
            ControlCommand::Ping => ControlResponse::pong(),

            ControlCommand::SetIntent { intent, active } => {
                self.session().set_held(|c| set_intent(c, intent, active));
                ControlResponse::none()
            }

            ControlCommand::Look { dx, dy } => {
                if !(dx.is_finite() && dy.is_finite()) {
                    return ControlResponse::error("Look delta must be finite");
                }
                self.session().queue_look(Vec2::new(dx, dy));
                ControlResponse::none()
            }

            ControlCommand::Trigger { action } => self.trigger(action),

            ControlCommand::GetPlayerState => {
                let session = self.session();
                ControlResponse::ok(ResponseData::PlayerState(session.player().into()))
            }

            ControlCommand::SetPlayerState {
                position,
                yaw,
                pitch,
                mode,
                lift,
            } => {
                let mode = match mode.as_deref().map(|m| (m, parse_mode(m))) {
                    None => None,
                    Some((_, Some(mode))) => Some(mode),
                    Some((name, None)) => return ControlResponse::error(format!("Unknown mode: {}", name)),
                };
                let o = PlayerOverride {
                    position: position.map(Vec3::from_array),
                    yaw,
                    pitch,
                    mode,
                    lift,
                };
                let mut session = self.session();
                session.apply_override(&o);
                ControlResponse::ok(ResponseData::PlayerState(session.player().into()))
            }

            ControlCommand::GetTerrainInfo { x, z } => {
                let (height, slope_degrees, biome) = self.session().terrain_info(x, z);
                ControlResponse::ok(ResponseData::TerrainInfo {
                    x,
                    z,
                    height,
                    slope_degrees,
                    biome: biome.name().to_string(),
                })
            }

            ControlCommand::GetSessionInfo => {
                let session = self.session();
                let field = session.field();
                let stats = session.tick_stats();
                ControlResponse::ok(ResponseData::SessionInfo(SessionInfo {
                    seed: field.seed(),
                    block_size: field.block_size(),
                    smooth: field.is_smooth(),
                    cache_entries: field.cache_len(),
                    active_chunks: field.active_area().len(),
                    epoch: field.epoch(),
                    tick_count: stats.tick_count,
                    ticks_per_second: stats.ticks_per_second,
                    view: format!("{:?}", session.view()),
                }))
            }

            ControlCommand::SetTerrainParams { smooth, block_size } => {
                let mut session = self.session();
                let mut changed = Vec::new();
                if let Some(smooth) = smooth {
                    session.set_smooth(smooth);
                    changed.push(format!("smooth = {}", smooth));
                }
                if let Some(bs) = block_size {
                    if !bs.is_finite() {
                        return ControlResponse::error("block_size must be finite");
                    }
                    let effective = session.set_block_size(bs);
                    changed.push(format!("block_size = {:.2}", effective));
                }
                if changed.is_empty() {
                    ControlResponse::updated("nothing changed")
                } else {
                    ControlResponse::updated(changed.join(", "))
                }
            }
        }
    }
}
