//! Error types for terrawalk
//!
//! The simulation core never fails; these cover the fallible edges around it
//! (config files, the control server).

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Control error: {0}")]
    Control(#[from] terrawalk_control::ControlError),
}
