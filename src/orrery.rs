//! Hierarchical body transforms.
//!
//! An [`Orrery`] is an ordered list of [`BodyDescriptor`]s. Each frame,
//! [`Orrery::evaluate`] walks that list once and builds every body's model
//! matrix from scratch:
//!
//! ```text
//! M = M_parent · S(scale) · R_y(spin_rate · t) · T(orbit(t)) · R_x(axial_tilt)
//! ```
//!
//! Parents always precede their children in the list, so a child is composed
//! from its parent's matrix of the *same* frame.
//!
//! # Example
//!
//! ```
//! use orrery::{BodyKind, Orrery};
//!
//! let orrery = Orrery::solar_system();
//! let frame = orrery.evaluate(1.5);
//!
//! let sun = frame.get(BodyKind::Sun).unwrap();
//! let earth = frame.get(BodyKind::Earth).unwrap();
//! assert_ne!(sun, earth);
//! ```

use std::fmt;
use std::path::PathBuf;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Celestial bodies known to the demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Stars,
    Sun,
    Earth,
    Moon,
}

impl BodyKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Stars => "stars",
            Self::Sun => "sun",
            Self::Earth => "earth",
            Self::Moon => "moon",
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Elliptical path of a body around its parent's origin.
///
/// The offset at time `t` is
/// `(radius·cos(rate·t + phase), bob·cos(bob_rate·t), radius·sin(rate·t + phase))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Distance from the parent in the horizontal plane.
    pub radius: f32,
    /// Angular rate in radians per second. Negative values orbit clockwise.
    pub rate: f32,
    /// Angle at `t = 0`, in radians.
    pub phase: f32,
    /// Vertical amplitude.
    pub bob: f32,
    /// Angular rate of the vertical motion.
    pub bob_rate: f32,
}

impl Orbit {
    /// Local offset from the parent at time `t`.
    pub fn offset(&self, t: f32) -> Vec3 {
        let angle = self.rate * t + self.phase;
        Vec3::new(
            self.radius * angle.cos(),
            self.bob * (self.bob_rate * t).cos(),
            self.radius * angle.sin(),
        )
    }
}

/// Everything needed to place and draw one body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyDescriptor {
    pub kind: BodyKind,
    /// Body whose matrix this one is composed onto. `None` means world space.
    #[serde(default)]
    pub parent: Option<BodyKind>,
    /// Radius of the sphere mesh. Bodies with equal radii share one mesh.
    pub radius: f32,
    /// Uniform scale applied on top of the parent's matrix.
    #[serde(default = "one")]
    pub scale: f32,
    /// Spin about the local Y axis, in radians per second.
    #[serde(default)]
    pub spin_rate: f32,
    #[serde(default)]
    pub orbit: Option<Orbit>,
    /// Tilt about the local X axis, applied last.
    #[serde(default)]
    pub axial_tilt_degrees: f32,
    /// Image file for the surface. `None` draws the flat `tint` instead.
    #[serde(default)]
    pub texture: Option<PathBuf>,
    #[serde(default = "white")]
    pub tint: [f32; 3],
    /// Skip diffuse lighting (the star field and the sun glow on their own).
    #[serde(default)]
    pub emissive: bool,
}

fn one() -> f32 {
    1.0
}

fn white() -> [f32; 3] {
    [1.0; 3]
}

impl BodyDescriptor {
    /// A world-space body at rest with unit scale.
    pub fn new(kind: BodyKind, radius: f32) -> Self {
        Self {
            kind,
            parent: None,
            radius,
            scale: 1.0,
            spin_rate: 0.0,
            orbit: None,
            axial_tilt_degrees: 0.0,
            texture: None,
            tint: white(),
            emissive: false,
        }
    }

    pub fn parent(mut self, parent: BodyKind) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn spin_rate(mut self, rate: f32) -> Self {
        self.spin_rate = rate;
        self
    }

    pub fn orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn axial_tilt(mut self, degrees: f32) -> Self {
        self.axial_tilt_degrees = degrees;
        self
    }

    pub fn texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture = Some(path.into());
        self
    }

    pub fn tint(mut self, tint: [f32; 3]) -> Self {
        self.tint = tint;
        self
    }

    pub fn emissive(mut self, emissive: bool) -> Self {
        self.emissive = emissive;
        self
    }

    /// Transform relative to the parent's matrix at time `t`.
    pub fn local_matrix(&self, t: f32) -> Mat4 {
        let offset = self.orbit.map_or(Vec3::ZERO, |orbit| orbit.offset(t));
        Mat4::from_scale(Vec3::splat(self.scale))
            * Mat4::from_rotation_y(self.spin_rate * t)
            * Mat4::from_translation(offset)
            * Mat4::from_rotation_x(self.axial_tilt_degrees.to_radians())
    }
}

/// Errors raised when a body list cannot be evaluated parent-first.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrreryError {
    #[error("body list is empty")]
    Empty,
    #[error("{0} is listed more than once")]
    DuplicateBody(BodyKind),
    #[error("{child} names {parent} as its parent, but {parent} is not in the body list")]
    UnknownParent { child: BodyKind, parent: BodyKind },
    #[error("{child} is listed before its parent {parent}")]
    ParentAfterChild { child: BodyKind, parent: BodyKind },
    #[error("{body} has an invalid {field}: {value}")]
    InvalidValue {
        body: BodyKind,
        field: &'static str,
        value: f32,
    },
}

/// Validated, parent-ordered body list.
#[derive(Clone, Debug, PartialEq)]
pub struct Orrery {
    bodies: Vec<BodyDescriptor>,
}

impl Orrery {
    /// Validates `bodies` and keeps them in the given order.
    pub fn new(bodies: Vec<BodyDescriptor>) -> Result<Self, OrreryError> {
        if bodies.is_empty() {
            return Err(OrreryError::Empty);
        }

        for (index, body) in bodies.iter().enumerate() {
            let earlier = &bodies[..index];
            if earlier.iter().any(|b| b.kind == body.kind) {
                return Err(OrreryError::DuplicateBody(body.kind));
            }

            for (field, value) in [("radius", body.radius), ("scale", body.scale)] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(OrreryError::InvalidValue {
                        body: body.kind,
                        field,
                        value,
                    });
                }
            }

            if let Some(parent) = body.parent {
                if !earlier.iter().any(|b| b.kind == parent) {
                    return Err(if bodies.iter().any(|b| b.kind == parent) {
                        OrreryError::ParentAfterChild {
                            child: body.kind,
                            parent,
                        }
                    } else {
                        OrreryError::UnknownParent {
                            child: body.kind,
                            parent,
                        }
                    });
                }
            }
        }

        Ok(Self { bodies })
    }

    /// Star field, sun, earth and moon.
    pub fn solar_system() -> Self {
        Self {
            bodies: solar_system_bodies(),
        }
    }

    pub fn bodies(&self) -> &[BodyDescriptor] {
        &self.bodies
    }

    /// Computes every body's model matrix at simulation time `t`.
    pub fn evaluate(&self, t: f32) -> BodyTransforms {
        let mut frame = BodyTransforms {
            entries: Vec::with_capacity(self.bodies.len()),
        };
        for body in &self.bodies {
            // Validation guarantees the parent was pushed earlier this frame.
            let base = body
                .parent
                .and_then(|parent| frame.get(parent))
                .unwrap_or(Mat4::IDENTITY);
            frame.entries.push((body.kind, base * body.local_matrix(t)));
        }
        frame
    }
}

/// The default body list, parents first.
pub fn solar_system_bodies() -> Vec<BodyDescriptor> {
    vec![
        BodyDescriptor::new(BodyKind::Stars, 5.0)
            .texture("images/stars.jpg")
            .emissive(true),
        BodyDescriptor::new(BodyKind::Sun, 0.2)
            .spin_rate(0.5)
            .texture("images/sun.jpg")
            .emissive(true),
        BodyDescriptor::new(BodyKind::Earth, 0.2)
            .parent(BodyKind::Sun)
            .scale(0.5)
            .spin_rate(2.0)
            .orbit(Orbit {
                radius: 1.0,
                rate: 1.0,
                phase: 0.0,
                bob: 0.5,
                bob_rate: 1.0,
            })
            .axial_tilt(23.5)
            .texture("images/earth.jpg"),
        BodyDescriptor::new(BodyKind::Moon, 0.2)
            .parent(BodyKind::Earth)
            .scale(0.5)
            .spin_rate(2.0)
            .orbit(Orbit {
                radius: 0.7,
                rate: -2.0,
                phase: std::f32::consts::FRAC_PI_2,
                bob: 0.5,
                bob_rate: 4.0,
            })
            .axial_tilt(1.5)
            .texture("images/moon.jpg"),
    ]
}

/// Model matrices for one frame, in evaluation order.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyTransforms {
    entries: Vec<(BodyKind, Mat4)>,
}

impl BodyTransforms {
    pub fn get(&self, kind: BodyKind) -> Option<Mat4> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, m)| *m)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyKind, Mat4)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;

    const EPS: f32 = 1e-5;

    #[test]
    fn stars_stay_put() {
        let orrery = Orrery::solar_system();
        for t in [0.0, 1.0, 42.0] {
            assert_eq!(orrery.evaluate(t).get(BodyKind::Stars), Some(Mat4::IDENTITY));
        }
    }

    #[test]
    fn sun_spins_at_half_rate() {
        let frame = Orrery::solar_system().evaluate(2.0);
        let sun = frame.get(BodyKind::Sun).unwrap();
        assert!(sun.abs_diff_eq(Mat4::from_rotation_y(1.0), EPS));
    }

    #[test]
    fn earth_composes_onto_sun() {
        let t = 0.8_f32;
        let frame = Orrery::solar_system().evaluate(t);
        let sun = frame.get(BodyKind::Sun).unwrap();
        let earth = frame.get(BodyKind::Earth).unwrap();

        let expected = sun
            * Mat4::from_scale(Vec3::splat(0.5))
            * Mat4::from_rotation_y(t * 2.0)
            * Mat4::from_translation(Vec3::new(t.cos(), t.cos() * 0.5, t.sin()))
            * Mat4::from_rotation_x(23.5_f32.to_radians());
        assert!(earth.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn moon_path_matches_table() {
        let moon = solar_system_bodies()
            .into_iter()
            .find(|b| b.kind == BodyKind::Moon)
            .unwrap();
        let orbit = moon.orbit.unwrap();

        for t in [0.0_f32, 0.3, 1.7, 5.0] {
            let expected = Vec3::new(
                (t * 2.0).sin() * 0.7,
                (t * 4.0).cos() * 0.5,
                (t * 2.0).cos() * 0.7,
            );
            assert!(orbit.offset(t).abs_diff_eq(expected, EPS), "t = {t}");
        }
    }

    #[test]
    fn children_follow_parents_every_frame() {
        let orrery = Orrery::solar_system();
        let bodies = orrery.bodies().to_vec();

        for step in 0..50 {
            let t = step as f32 * 0.37;
            let frame = orrery.evaluate(t);
            for body in &bodies {
                let Some(parent) = body.parent else { continue };
                let parent_matrix = frame.get(parent).unwrap();
                let child_origin = frame.get(body.kind).unwrap().transform_point3(Vec3::ZERO);
                let offset = body.local_matrix(t).transform_point3(Vec3::ZERO);
                assert!(
                    child_origin.abs_diff_eq(parent_matrix.transform_point3(offset), 1e-4),
                    "{} drifted from {} at t = {t}",
                    body.kind,
                    parent
                );
            }
        }
    }

    #[test]
    fn pausing_freezes_every_body() {
        let orrery = Orrery::solar_system();
        let mut sim = Simulation::new().advance(3.3).toggled();
        let frozen = orrery.evaluate(sim.time());

        for _ in 0..30 {
            sim = sim.advance(1.0 / 60.0);
            assert_eq!(orrery.evaluate(sim.time()), frozen);
        }
    }

    #[test]
    fn resume_is_continuous() {
        let orrery = Orrery::solar_system();
        let running = Simulation::new().advance(1.25);
        let before = orrery.evaluate(running.time());

        let resumed = running.toggled().advance(4.0).toggled();
        assert_eq!(orrery.evaluate(resumed.time()), before);

        let next = orrery.evaluate(resumed.advance(1.0 / 120.0).time());
        for ((kind, a), (_, b)) in before.iter().zip(next.iter()) {
            assert!(a.abs_diff_eq(b, 0.05), "{kind} jumped on resume");
        }
    }

    #[test]
    fn evaluates_in_list_order() {
        let frame = Orrery::solar_system().evaluate(0.0);
        let order: Vec<BodyKind> = frame.iter().map(|(k, _)| k).collect();
        assert_eq!(
            order,
            [BodyKind::Stars, BodyKind::Sun, BodyKind::Earth, BodyKind::Moon]
        );
        assert_eq!(frame.len(), 4);
    }

    #[test]
    fn validates_body_lists() {
        assert_eq!(Orrery::new(vec![]), Err(OrreryError::Empty));

        let sun = BodyDescriptor::new(BodyKind::Sun, 0.2);
        let earth = BodyDescriptor::new(BodyKind::Earth, 0.2).parent(BodyKind::Sun);
        let moon = BodyDescriptor::new(BodyKind::Moon, 0.2).parent(BodyKind::Earth);

        assert_eq!(
            Orrery::new(vec![sun.clone(), sun.clone()]),
            Err(OrreryError::DuplicateBody(BodyKind::Sun))
        );
        assert_eq!(
            Orrery::new(vec![sun.clone(), moon.clone()]),
            Err(OrreryError::UnknownParent {
                child: BodyKind::Moon,
                parent: BodyKind::Earth
            })
        );
        assert_eq!(
            Orrery::new(vec![earth.clone(), sun.clone()]),
            Err(OrreryError::ParentAfterChild {
                child: BodyKind::Earth,
                parent: BodyKind::Sun
            })
        );
        assert!(matches!(
            Orrery::new(vec![sun.clone().scale(0.0)]),
            Err(OrreryError::InvalidValue { field: "scale", .. })
        ));
        assert!(Orrery::new(vec![sun, earth, moon]).is_ok());
    }

    #[test]
    fn default_list_is_valid() {
        assert_eq!(
            Orrery::new(solar_system_bodies()),
            Ok(Orrery::solar_system())
        );
    }
}
