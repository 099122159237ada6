//! # Orrery
//!
//! A toy solar system: a star field, a sun, an earth and a moon drawn as
//! textured UV spheres and moved by a hierarchical transform pipeline.
//!
//! The geometry and the orbital math are plain values with no GPU involved,
//! so they can be used and tested on their own:
//!
//! ```
//! use orrery::{BodyKind, Orrery, SphereBuilder};
//!
//! let sphere = SphereBuilder::new(0.2).step(0.1).build().unwrap();
//! assert_eq!(sphere.vertex_count(), sphere.triangle_count() * 3);
//!
//! let frame = Orrery::solar_system().evaluate(1.0);
//! let earth = frame.get(BodyKind::Earth).unwrap();
//! let moon = frame.get(BodyKind::Moon).unwrap();
//! assert_ne!(earth, moon);
//! ```
//!
//! [`run`] opens a window and drives everything from a [`Simulation`] clock:
//! space pauses and resumes, a right-mouse drag orbits the camera, the scroll
//! wheel zooms and escape quits.

mod app;
mod body_pass;
mod camera;
mod cli;
mod config;
mod error;
mod gpu;
mod input;
mod mesh;
mod orbit_camera;
mod orrery;
mod simulation;
mod sphere;
mod texture;

pub use app::run;
pub use body_pass::{BodyPass, DEPTH_FORMAT, DrawCall, FrameUniforms, ModelUniforms};
pub use camera::Camera;
pub use cli::CliArgs;
pub use config::{CameraConfig, ConfigError, OrreryConfig, SceneConfig, WindowConfig};
pub use error::AppError;
pub use gpu::{GpuContext, GpuError};
pub use input::Input;
pub use mesh::{Mesh, Vertex3d};
pub use orbit_camera::OrbitCamera;
pub use orrery::{
    BodyDescriptor, BodyKind, BodyTransforms, Orbit, Orrery, OrreryError, solar_system_bodies,
};
pub use simulation::Simulation;
pub use sphere::{
    DEFAULT_STEP, PLACEHOLDER_COLOR, PLACEHOLDER_NORMAL, POLE_UV, SphereBuilder, SphereError,
    SphereGeometry,
};
pub use texture::Texture;

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3};
