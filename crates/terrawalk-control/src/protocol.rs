//! Control protocol - JSON command/response definitions
//!
//! One JSON object per line in each direction. Commands are tagged by `cmd`
//! with their arguments under `params`; responses carry `status`.

use serde::{Deserialize, Serialize};

/// Held movement intents a client can press and release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Crouch,
    Ascend,
    Descend,
    Sprint,
}

/// One-shot actions, applied once on the next tick or immediately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ToggleFlight,
    ToggleFreeFlight,
    ResetFlight,
    IncreaseLift,
    DecreaseLift,
    HoverLift,
    ToggleMaxLift,
    ToggleSmooth,
    ToggleCamera,
    IncreaseDetail,
    DecreaseDetail,
}

/// Commands sent from a client to the control server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum ControlCommand {
    /// Press or release a held intent
    SetIntent { intent: Intent, active: bool },
    /// Add a look delta to the next tick
    Look { dx: f32, dy: f32 },
    /// Fire a one-shot action
    Trigger { action: Action },
    /// Get the player snapshot
    GetPlayerState,
    /// Overwrite parts of the player state (only specified fields are updated)
    SetPlayerState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<[f32; 3]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        yaw: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pitch: Option<f32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lift: Option<f32>,
    },
    /// Query height, slope and biome at a world position
    GetTerrainInfo { x: f32, z: f32 },
    /// Get terrain parameters, cache and tick statistics
    GetSessionInfo,
    /// Change terrain parameters (only specified fields are updated)
    SetTerrainParams {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        smooth: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        block_size: Option<f32>,
    },
    /// Ping (health check)
    Ping,
}

/// Responses from the control server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ControlResponse {
    #[serde(rename = "ok")]
    Ok { data: ResponseData },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Response data variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    None,
    Pong { message: String },
    PlayerState(PlayerStateInfo),
    TerrainInfo {
        x: f32,
        z: f32,
        height: f32,
        slope_degrees: f32,
        biome: String,
    },
    SessionInfo(SessionInfo),
    ParamsUpdated { description: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStateInfo {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub mode: String,
    pub lift: f32,
    pub max_lift_active: bool,
    pub crouching: bool,
    pub on_ground: bool,
    pub mode_cooldown: f32,
    pub last_collision: Option<String>,
    pub biome: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub seed: u32,
    pub block_size: f32,
    pub smooth: bool,
    pub cache_entries: usize,
    pub active_chunks: usize,
    pub epoch: u64,
    pub tick_count: u64,
    pub ticks_per_second: f32,
    pub view: String,
}

impl ControlResponse {
    pub fn ok(data: ResponseData) -> Self {
        ControlResponse::Ok { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ControlResponse::Error {
            message: message.into(),
        }
    }

    pub fn pong() -> Self {
        ControlResponse::Ok {
            data: ResponseData::Pong {
                message: "pong".to_string(),
            },
        }
    }

    pub fn none() -> Self {
        ControlResponse::Ok {
            data: ResponseData::None,
        }
    }

    pub fn updated(description: impl Into<String>) -> Self {
        ControlResponse::Ok {
            data: ResponseData::ParamsUpdated {
                description: description.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ControlResponse::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_shapes() {
        let cmd: ControlCommand =
            serde_json::from_str(r#"{"cmd":"SetIntent","params":{"intent":"forward","active":true}}"#).unwrap();
        assert_eq!(cmd, ControlCommand::SetIntent { intent: Intent::Forward, active: true });

        let cmd: ControlCommand = serde_json::from_str(r#"{"cmd":"Ping"}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Ping);

        let cmd: ControlCommand =
            serde_json::from_str(r#"{"cmd":"Trigger","params":{"action":"toggle_free_flight"}}"#).unwrap();
        assert_eq!(cmd, ControlCommand::Trigger { action: Action::ToggleFreeFlight });
    }

    #[test]
    fn test_partial_set_player_state() {
        let cmd: ControlCommand =
            serde_json::from_str(r#"{"cmd":"SetPlayerState","params":{"yaw":45.0,"mode":"Flight"}}"#).unwrap();
        match cmd {
            ControlCommand::SetPlayerState { position, yaw, mode, lift, .. } => {
                assert!(position.is_none());
                assert_eq!(yaw, Some(45.0));
                assert_eq!(mode.as_deref(), Some("Flight"));
                assert!(lift.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_intent_rejected() {
        let r = serde_json::from_str::<ControlCommand>(r#"{"cmd":"SetIntent","params":{"intent":"fly","active":true}}"#);
        assert!(r.is_err());
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(
            serde_json::to_value(ControlResponse::pong()).unwrap(),
            json!({"status": "ok", "data": {"message": "pong"}})
        );
        assert_eq!(
            serde_json::to_value(ControlResponse::error("nope")).unwrap(),
            json!({"status": "error", "message": "nope"})
        );
        assert_eq!(
            serde_json::to_value(ControlResponse::none()).unwrap(),
            json!({"status": "ok", "data": null})
        );
    }

    #[test]
    fn test_terrain_info_shape() {
        let resp = ControlResponse::ok(ResponseData::TerrainInfo {
            x: 1.0,
            z: 2.0,
            height: 3.5,
            slope_degrees: 10.0,
            biome: "Hills".into(),
        });
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["data"]["height"], 3.5);
        assert_eq!(v["data"]["biome"], "Hills");
    }
}
