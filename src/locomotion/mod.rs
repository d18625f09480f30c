//! Player locomotion: walking, powered flight and free flight over a height field

pub mod state;
pub use state::{MovementMode, PlayerState, PlayerOverride, MAX_PITCH};

pub mod commands;
pub use commands::Commands;

pub mod collision;
pub use collision::{Collision, CollisionPolicy};

pub mod controller;
pub use controller::LocomotionController;
