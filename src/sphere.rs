//! Procedural UV-sphere tessellation.
//!
//! [`SphereBuilder`] samples a latitude/longitude grid over polar angle
//! θ ∈ \[0, π\] and azimuth φ ∈ \[0, 2π\] at a fixed angular step and emits an
//! **unindexed** triangle list: every three consecutive entries of
//! [`SphereGeometry::positions`] form one triangle, and the colour, normal and
//! texture-coordinate arrays run parallel to it.
//!
//! # Example
//!
//! ```
//! use orrery::SphereBuilder;
//!
//! let sphere = SphereBuilder::new(0.2).step(0.1).build().unwrap();
//! assert_eq!(sphere.vertex_count(), sphere.triangle_count() * 3);
//! ```
//!
//! # Grid layout
//!
//! Ring `i` sits at θ = `i · step` and column `j` at φ = `j · step`, for every
//! index whose angle does not exceed π (rings) or 2π (columns). A sample lands
//! at `(r·sinθ·cosφ, −r·cosθ, r·sinθ·sinφ)`, so θ = 0 is the −Y end of the
//! sphere and θ = π the +Y end.
//!
//! Adjacent rings are stitched with two triangles per quad, and the last
//! column is stitched back to column 0 so the seam has no gap. The θ = π end
//! is not sampled exactly by the grid, so it is closed with a fan of triangles
//! around a single pole vertex whose texture coordinate is pinned to (1, 1).
//!
//! The θ = 0 end gets no fan. Ring 0 is sampled exactly at the pole, so all
//! of its vertices coincide and the first band of quads collapses into a fan
//! on its own (one proper triangle and one degenerate triangle per column).
//!
//! Emission order: every band is emitted first, ring by ring, and the pole fan
//! comes last as one block. A renderer that interleaves each fan triangle with
//! the last band's quads produces the same triangle set in a different vertex
//! order.
//!
//! Steps so fine that the mesh would exceed `u32::MAX` vertices are rejected
//! with [`SphereError::TooFine`], since the vertex count is drawn as a `u32`.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Angular step used by [`SphereBuilder::new`], in radians.
pub const DEFAULT_STEP: f32 = 0.01;

/// Colour written to every vertex. Textures replace it when drawing.
pub const PLACEHOLDER_COLOR: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Normal written to every vertex unless outward normals are requested.
pub const PLACEHOLDER_NORMAL: Vec3 = Vec3::new(0.0, 0.0, 0.1);

/// Texture coordinate of the θ = π pole vertex.
pub const POLE_UV: Vec2 = Vec2::ONE;

// Slack for `i * step <= PI` so steps that divide π evenly keep their last ring.
const ANGLE_EPSILON: f32 = 1e-4;

/// Errors produced when a sphere cannot be tessellated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SphereError {
    #[error("sphere radius must be positive and finite, got {0}")]
    InvalidRadius(f32),
    #[error("angular step must be positive and finite, got {0}")]
    InvalidStep(f32),
    #[error("angular step {step} is too coarse: {rings} ring(s) and {columns} column(s)")]
    TooCoarse {
        step: f32,
        rings: usize,
        columns: usize,
    },
    #[error("angular step {0} is too fine: the mesh would exceed u32::MAX vertices")]
    TooFine(f32),
}

/// CPU-side sphere mesh as parallel per-vertex arrays.
///
/// All four arrays have the same length, which is always a multiple of three.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SphereGeometry {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl SphereGeometry {
    /// Number of vertices (three per triangle, no sharing).
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles in the list.
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates over triangle corner positions in emission order.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    fn push(&mut self, sample: Sample) {
        self.positions.push(sample.position);
        self.uvs.push(sample.uv);
    }
}

#[derive(Clone, Copy, Debug)]
struct Sample {
    position: Vec3,
    uv: Vec2,
}

/// Builder for [`SphereGeometry`].
///
/// ```
/// use orrery::SphereBuilder;
///
/// let stars = SphereBuilder::new(5.0).build().unwrap();
/// let lit = SphereBuilder::new(0.2).step(0.05).outward_normals(true).build().unwrap();
/// # let _ = (stars, lit);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereBuilder {
    radius: f32,
    step: f32,
    outward_normals: bool,
}

impl SphereBuilder {
    /// Starts a sphere of the given radius at [`DEFAULT_STEP`] resolution.
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            step: DEFAULT_STEP,
            outward_normals: false,
        }
    }

    /// Sets the angular step between rings and columns, in radians.
    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    /// Emit unit normals pointing away from the centre instead of
    /// [`PLACEHOLDER_NORMAL`].
    pub fn outward_normals(mut self, enabled: bool) -> Self {
        self.outward_normals = enabled;
        self
    }

    /// Returns `(rings, columns)` of the sampling grid for the current step.
    ///
    /// Saturates at `usize::MAX` for vanishingly small steps.
    pub fn grid_size(&self) -> (usize, usize) {
        let count = |span: f32| {
            ((span / self.step + ANGLE_EPSILON).floor() as usize).saturating_add(1)
        };
        (count(PI), count(TAU))
    }

    /// Number of vertices [`SphereBuilder::build`] will emit, or `None` if it
    /// does not fit in a `u32`.
    pub fn vertex_count(&self) -> Option<u32> {
        let (rings, columns) = self.grid_size();
        let triangles = rings
            .checked_sub(1)?
            .checked_mul(columns)?
            .checked_mul(2)?
            .checked_add(columns)?;
        u32::try_from(triangles.checked_mul(3)?).ok()
    }

    /// Tessellates the sphere.
    pub fn build(&self) -> Result<SphereGeometry, SphereError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SphereError::InvalidRadius(self.radius));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(SphereError::InvalidStep(self.step));
        }

        let (rings, columns) = self.grid_size();
        if rings < 2 || columns < 3 {
            return Err(SphereError::TooCoarse {
                step: self.step,
                rings,
                columns,
            });
        }
        let capacity = self
            .vertex_count()
            .ok_or(SphereError::TooFine(self.step))? as usize;

        let grid: Vec<Vec<Sample>> = (0..rings)
            .map(|i| {
                let theta = i as f32 * self.step;
                (0..columns)
                    .map(|j| self.sample(theta, j as f32 * self.step))
                    .collect()
            })
            .collect();

        let mut geometry = SphereGeometry::default();
        geometry.positions.reserve(capacity);
        geometry.uvs.reserve(capacity);

        for band in grid.windows(2) {
            let (upper, lower) = (&band[0], &band[1]);
            for j in 0..columns {
                // k wraps to 0 on the last column, which closes the seam.
                let k = (j + 1) % columns;
                geometry.push(upper[j]);
                geometry.push(lower[j]);
                geometry.push(lower[k]);

                geometry.push(lower[k]);
                geometry.push(upper[k]);
                geometry.push(upper[j]);
            }
        }

        let pole = Sample {
            uv: POLE_UV,
            ..self.sample(PI, TAU)
        };
        let last = &grid[rings - 1];
        for j in 0..columns {
            let k = (j + 1) % columns;
            geometry.push(last[j]);
            geometry.push(last[k]);
            geometry.push(pole);
        }

        let count = geometry.positions.len();
        geometry.colors = vec![PLACEHOLDER_COLOR; count];
        geometry.normals = if self.outward_normals {
            geometry
                .positions
                .iter()
                .map(|p| p.normalize_or(Vec3::Y))
                .collect()
        } else {
            vec![PLACEHOLDER_NORMAL; count]
        };

        Ok(geometry)
    }

    fn sample(&self, theta: f32, phi: f32) -> Sample {
        let r = self.radius;
        Sample {
            position: Vec3::new(
                r * theta.sin() * phi.cos(),
                -r * theta.cos(),
                r * theta.sin() * phi.sin(),
            ),
            uv: Vec2::new(phi / TAU, theta / PI),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Ring 0 mixes 0.0 and -0.0, which compare equal but hash apart.
    fn key(p: Vec3) -> [u32; 3] {
        p.to_array()
            .map(|c| if c == 0.0 { 0.0f32 } else { c }.to_bits())
    }

    fn is_degenerate(tri: &[Vec3; 3]) -> bool {
        (tri[1] - tri[0]).cross(tri[2] - tri[0]).length_squared() < 1e-14
    }

    #[test]
    fn vertices_lie_on_the_sphere() {
        for radius in [0.2, 1.0, 5.0] {
            let sphere = SphereBuilder::new(radius).step(0.05).build().unwrap();
            for p in &sphere.positions {
                assert!(
                    (p.length() - radius).abs() < radius * 1e-5,
                    "{p} is not at distance {radius}"
                );
            }
        }
    }

    #[test]
    fn arrays_stay_parallel() {
        let sphere = SphereBuilder::new(1.0).step(0.1).build().unwrap();
        let n = sphere.vertex_count();
        assert_eq!(n % 3, 0);
        assert_eq!(sphere.colors.len(), n);
        assert_eq!(sphere.normals.len(), n);
        assert_eq!(sphere.uvs.len(), n);
    }

    #[test]
    fn default_step_grid_and_triangle_count() {
        let builder = SphereBuilder::new(0.2);
        assert_eq!(builder.grid_size(), (315, 629));

        let sphere = builder.build().unwrap();
        assert_eq!(sphere.triangle_count(), 2 * 314 * 629 + 629);
    }

    #[test]
    fn triangle_count_matches_bands_plus_pole_fan() {
        for step in [0.05, 0.1, 0.3, 1.0] {
            let builder = SphereBuilder::new(1.0).step(step);
            let (rings, columns) = builder.grid_size();
            let sphere = builder.build().unwrap();
            assert_eq!(sphere.triangle_count(), 2 * (rings - 1) * columns + columns);
        }
    }

    #[test]
    fn surface_is_closed_across_the_seam() {
        let sphere = SphereBuilder::new(1.0).step(0.05).build().unwrap();

        let mut edges: HashMap<([u32; 3], [u32; 3]), usize> = HashMap::new();
        for tri in sphere.triangles().filter(|t| !is_degenerate(t)) {
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                let (ka, kb) = (key(tri[a]), key(tri[b]));
                let edge = if ka < kb { (ka, kb) } else { (kb, ka) };
                *edges.entry(edge).or_default() += 1;
            }
        }

        assert!(!edges.is_empty());
        for (edge, count) in &edges {
            assert_eq!(*count, 2, "edge {edge:?} is shared by {count} triangle(s)");
        }
    }

    #[test]
    fn seam_quads_join_last_column_to_first() {
        let builder = SphereBuilder::new(1.0).step(0.1);
        let (rings, columns) = builder.grid_size();
        let sphere = builder.build().unwrap();

        let first = builder.sample(0.1, 0.0).position;
        let last = builder.sample(0.1, (columns - 1) as f32 * 0.1).position;
        let joined = sphere
            .triangles()
            .filter(|t| t.contains(&first) && t.contains(&last))
            .count();
        // One band above ring 1 and one below it each contribute two triangles.
        assert!(rings > 2);
        assert_eq!(joined, 2);
    }

    #[test]
    fn south_pole_fan_uses_fixed_uv() {
        let builder = SphereBuilder::new(2.0).step(0.1);
        let (_, columns) = builder.grid_size();
        let sphere = builder.build().unwrap();

        let pole = Vec3::new(0.0, 2.0, 0.0);
        let pole_vertices: Vec<usize> = sphere
            .positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.abs_diff_eq(pole, 1e-5))
            .map(|(i, _)| i)
            .collect();

        assert_eq!(pole_vertices.len(), columns);
        for i in pole_vertices {
            assert_eq!(sphere.uvs[i], POLE_UV);
        }
    }

    #[test]
    fn north_pole_has_no_explicit_cap() {
        let builder = SphereBuilder::new(1.0).step(0.1);
        let (_, columns) = builder.grid_size();
        let sphere = builder.build().unwrap();
        let north = Vec3::new(0.0, -1.0, 0.0);

        let touching: Vec<[Vec3; 3]> = sphere
            .triangles()
            .filter(|t| t.contains(&north))
            .collect();
        let degenerate = touching.iter().filter(|t| is_degenerate(t)).count();

        // The collapsed first band: one real and one degenerate triangle per column.
        assert_eq!(touching.len(), 2 * columns);
        assert_eq!(degenerate, columns);
    }

    #[test]
    fn texture_coordinates_follow_angles() {
        let sphere = SphereBuilder::new(1.0).step(0.1).build().unwrap();
        for uv in &sphere.uvs {
            assert!((0.0..=1.0).contains(&uv.x), "u out of range: {uv}");
            assert!((0.0..=1.0).contains(&uv.y), "v out of range: {uv}");
        }
        assert_eq!(sphere.uvs[0], Vec2::ZERO);
    }

    #[test]
    fn placeholder_attributes_by_default() {
        let sphere = SphereBuilder::new(1.0).step(0.2).build().unwrap();
        assert!(sphere.colors.iter().all(|c| *c == PLACEHOLDER_COLOR));
        assert!(sphere.normals.iter().all(|n| *n == PLACEHOLDER_NORMAL));
    }

    #[test]
    fn outward_normals_are_unit_and_radial() {
        let sphere = SphereBuilder::new(3.0)
            .step(0.2)
            .outward_normals(true)
            .build()
            .unwrap();
        for (p, n) in sphere.positions.iter().zip(&sphere.normals) {
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.abs_diff_eq(*p / 3.0, 1e-5));
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            SphereBuilder::new(0.0).build(),
            Err(SphereError::InvalidRadius(0.0))
        );
        assert!(matches!(
            SphereBuilder::new(f32::NAN).build(),
            Err(SphereError::InvalidRadius(_))
        ));
        assert_eq!(
            SphereBuilder::new(1.0).step(-0.1).build(),
            Err(SphereError::InvalidStep(-0.1))
        );
        assert!(matches!(
            SphereBuilder::new(1.0).step(4.0).build(),
            Err(SphereError::TooCoarse { rings: 1, .. })
        ));
    }

    #[test]
    fn rejects_steps_too_fine_to_draw() {
        for step in [1e-30, 1e-5, 1e-4] {
            assert_eq!(
                SphereBuilder::new(1.0).step(step).build(),
                Err(SphereError::TooFine(step)),
                "step = {step}"
            );
            assert_eq!(SphereBuilder::new(1.0).step(step).vertex_count(), None);
        }
        assert_eq!(SphereBuilder::new(1.0).step(1e-30).grid_size().0, usize::MAX);
    }

    #[test]
    fn vertex_count_predicts_build() {
        for step in [DEFAULT_STEP, 0.05, 0.3] {
            let builder = SphereBuilder::new(1.0).step(step);
            let sphere = builder.build().unwrap();
            assert_eq!(builder.vertex_count(), Some(sphere.vertex_count() as u32));
        }
    }
}
