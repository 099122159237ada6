use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::config::CameraConfig;
use crate::input::Input;

/// Keeps the elevation off the poles, where the look-at basis degenerates.
const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// A camera controller that orbits around a target point.
///
/// Position is kept in spherical coordinates: dragging with the right mouse
/// button changes the two angles and the scroll wheel changes the distance.
///
/// # Example
/// ```ignore
/// let mut orbit = OrbitCamera::new().distance(2.0);
///
/// // In frame loop:
/// orbit.update(&input);
/// let camera = orbit.camera();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitCamera {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target.
    pub distance: f32,
    /// Horizontal angle in radians (yaw).
    pub azimuth: f32,
    /// Vertical angle in radians (pitch).
    pub elevation: f32,
    /// Field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per pixel of drag.
    pub sensitivity: f32,
    /// Distance per scroll line.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a camera from its config section.
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: config.distance,
            azimuth: config.azimuth,
            elevation: config.elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT),
            fov: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            sensitivity: config.sensitivity,
            zoom_sensitivity: config.zoom_sensitivity,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
        }
        .distance(config.distance)
    }

    /// Set the distance from target.
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = self.clamp_distance(distance);
        self
    }

    // max/min rather than clamp: inverted or NaN limits must not panic.
    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.max(self.min_distance).min(self.max_distance)
    }

    /// Update the camera from this frame's input.
    pub fn update(&mut self, input: &Input) {
        if input.mouse_down(MouseButton::Right) {
            let delta = input.mouse_delta();
            self.azimuth -= delta.x * self.sensitivity;
            self.elevation = (self.elevation + delta.y * self.sensitivity)
                .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        }

        let scroll = input.scroll_delta();
        if scroll.y != 0.0 {
            self.distance = self.clamp_distance(self.distance - scroll.y * self.zoom_sensitivity);
        }
    }

    /// World-space camera position.
    pub fn position(&self) -> Vec3 {
        // Spherical to Cartesian conversion
        let offset = Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        );
        self.target + offset
    }

    /// Get the current camera state.
    pub fn camera(&self) -> Camera {
        Camera {
            position: self.position(),
            target: self.target,
            up: Vec3::Y,
            fov: self.fov,
            near: self.near,
            far: self.far,
        }
    }
}
