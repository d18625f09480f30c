//! Terrawalk - procedural height-field terrain with walk/fly locomotion

pub mod core;
pub mod terrain;
pub mod locomotion;
pub mod session;
pub mod remote;
