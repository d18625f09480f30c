//! Camera derived from the player's position and orientation
//!
//! Rendering is done elsewhere; this only produces the view the renderer
//! should use.

use serde::{Deserialize, Serialize};

use crate::core::types::{Mat4, Vec3};

/// Height of the third-person eye above the orbit point
const THIRD_PERSON_LIFT: f32 = 2.0;

/// First- or third-person view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::FirstPerson => ViewMode::ThirdPerson,
            ViewMode::ThirdPerson => ViewMode::FirstPerson,
        }
    }
}

/// Unit look direction for yaw/pitch in degrees.
///
/// Yaw 0 looks down +X, yaw 90 down +Z; positive pitch looks up.
pub fn look_direction(yaw_degrees: f32, pitch_degrees: f32) -> Vec3 {
    let yaw = yaw_degrees.to_radians();
    let pitch = pitch_degrees.to_radians();
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
}

/// Eye/target pair plus projection parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// World position of the eye
    pub position: Vec3,
    /// Point the eye looks at
    pub target: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Camera {
    fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            fov_y: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Camera at the player's eye
    pub fn first_person(eye: Vec3, yaw: f32, pitch: f32) -> Self {
        Self::new(eye, eye + look_direction(yaw, pitch))
    }

    /// Camera orbiting `distance` behind the player's eye
    pub fn third_person(eye: Vec3, yaw: f32, pitch: f32, distance: f32) -> Self {
        let look = look_direction(yaw, pitch);
        let position = eye - look * distance + Vec3::Y * THIRD_PERSON_LIFT;
        Self::new(position, eye + look)
    }

    /// Camera for the given view mode
    pub fn for_view(mode: ViewMode, eye: Vec3, yaw: f32, pitch: f32, distance: f32) -> Self {
        match mode {
            ViewMode::FirstPerson => Self::first_person(eye, yaw, pitch),
            ViewMode::ThirdPerson => Self::third_person(eye, yaw, pitch, distance),
        }
    }

    /// Normalized direction from eye to target
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// View matrix (world to camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Projection matrix (camera to clip space)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio (call on window resize)
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }
}
