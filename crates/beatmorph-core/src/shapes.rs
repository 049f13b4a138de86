//! Procedural particle shapes
//!
//! Pure functions mapping a shape kind and a particle count to a buffer of
//! target positions. Organic shapes draw from the injected RNG; lattice and
//! curve shapes are closed-form in the particle index.
//!
//! The [`ShapeLibrary`] generates every shape exactly once per session and
//! serves read-only slices afterwards.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use tracing::{debug, warn};

/// Half-extent of the scatter cube. Unknown shapes land inside it.
pub const SCATTER_HALF_EXTENT: f32 = 25.0;

/// Enumerated particle shapes
///
/// Serializes as its identifier. Deserializing goes through
/// [`ShapeKind::from_name`], so an unknown identifier in a config file
/// becomes [`ShapeKind::Scatter`] instead of an error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ShapeKind {
    /// Uniform sphere shell (inverse-CDF polar sampling)
    #[default]
    Sphere,
    /// Filled cube
    Cube,
    /// Long helical tube along Z
    Tunnel,
    /// Two interleaved helix strands
    Dna,
    /// Flat Archimedean whirl with vertical noise
    Vortex,
    /// Flat lattice by index decomposition
    Grid,
    /// Uniform cube of side 50 (the fallback shape)
    Scatter,
    /// Torus via (R, r) parametrization
    Torus,
    /// Spiral disc thinning toward the rim
    Galaxy,
    /// Solid square pyramid
    Pyramid,
    /// Two cones meeting at the waist
    Hourglass,
    /// Three orthogonal bars
    Cross,
    /// Trefoil knot
    Knot,
    /// Five-pointed star
    Star,
    /// Flat expanding spiral
    Spiral,
    /// Sine sheet
    Wave,
    /// Widening upward spray
    Fountain,
    /// Cube faces only
    CubeHollow,
    /// Thin flat ring
    Ring,
    /// Five vertical slabs
    Monolith,
    /// Upward spike clustered at the base
    Spikes,
    /// Broken ring of wavy fragments
    Shards,
    /// Three-sided expanding prism
    Prism,
    /// 10x10x10 jittered lattice
    Structure,
}

impl ShapeKind {
    /// Every shape, in declaration order
    pub const ALL: [ShapeKind; 24] = [
        ShapeKind::Sphere,
        ShapeKind::Cube,
        ShapeKind::Tunnel,
        ShapeKind::Dna,
        ShapeKind::Vortex,
        ShapeKind::Grid,
        ShapeKind::Scatter,
        ShapeKind::Torus,
        ShapeKind::Galaxy,
        ShapeKind::Pyramid,
        ShapeKind::Hourglass,
        ShapeKind::Cross,
        ShapeKind::Knot,
        ShapeKind::Star,
        ShapeKind::Spiral,
        ShapeKind::Wave,
        ShapeKind::Fountain,
        ShapeKind::CubeHollow,
        ShapeKind::Ring,
        ShapeKind::Monolith,
        ShapeKind::Spikes,
        ShapeKind::Shards,
        ShapeKind::Prism,
        ShapeKind::Structure,
    ];

    /// Shapes the glitch morph flickers to
    pub const GLITCH: [ShapeKind; 4] = [
        ShapeKind::Scatter,
        ShapeKind::Vortex,
        ShapeKind::Spikes,
        ShapeKind::Shards,
    ];

    /// Stable identifier used in configs and logs
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cube => "cube",
            ShapeKind::Tunnel => "tunnel",
            ShapeKind::Dna => "dna",
            ShapeKind::Vortex => "vortex",
            ShapeKind::Grid => "grid",
            ShapeKind::Scatter => "scatter",
            ShapeKind::Torus => "torus",
            ShapeKind::Galaxy => "galaxy",
            ShapeKind::Pyramid => "pyramid",
            ShapeKind::Hourglass => "hourglass",
            ShapeKind::Cross => "cross",
            ShapeKind::Knot => "knot",
            ShapeKind::Star => "star",
            ShapeKind::Spiral => "spiral",
            ShapeKind::Wave => "wave",
            ShapeKind::Fountain => "fountain",
            ShapeKind::CubeHollow => "cube_hollow",
            ShapeKind::Ring => "ring",
            ShapeKind::Monolith => "monolith",
            ShapeKind::Spikes => "spikes",
            ShapeKind::Shards => "shards",
            ShapeKind::Prism => "prism",
            ShapeKind::Structure => "structure",
        }
    }

    /// Exact lookup by identifier
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Lenient lookup: unknown identifiers resolve to [`ShapeKind::Scatter`].
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or_else(|| {
            warn!("Unknown shape '{}', falling back to scatter", name);
            ShapeKind::Scatter
        })
    }
}

impl From<String> for ShapeKind {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Centered uniform sample in `[-0.5, 0.5)`
#[inline]
fn centered<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.random::<f32>() - 0.5
}

/// Generate `count` target positions for `shape`.
pub fn generate<R: Rng + ?Sized>(shape: ShapeKind, count: usize, rng: &mut R) -> Vec<Vec3> {
    let n = count.max(1) as f32;
    let grid_side = (count as f32).sqrt().ceil().max(1.0) as usize;

    (0..count)
        .map(|i| {
            let fi = i as f32;
            match shape {
                ShapeKind::Sphere => {
                    let theta = rng.random::<f32>() * TAU;
                    let phi = (rng.random::<f32>() * 2.0 - 1.0).acos();
                    let r = 8.0;
                    Vec3::new(
                        r * phi.sin() * theta.cos(),
                        r * phi.sin() * theta.sin(),
                        r * phi.cos(),
                    )
                }
                ShapeKind::Cube => {
                    let size = 10.0;
                    Vec3::new(centered(rng), centered(rng), centered(rng)) * size
                }
                ShapeKind::Tunnel => {
                    let angle = (fi / n) * PI * 40.0;
                    let r = 5.0 + rng.random::<f32>();
                    let z = (fi / n) * 100.0 - 50.0;
                    Vec3::new(angle.cos() * r, angle.sin() * r, z)
                }
                ShapeKind::Dna => {
                    let t = (fi / n) * PI * 20.0;
                    let r = 3.0;
                    let strand = if i % 2 == 0 { 1.0 } else { -1.0 };
                    let y = (fi / n) * 40.0 - 20.0;
                    Vec3::new(t.cos() * r * strand, y, t.sin() * r * strand)
                }
                ShapeKind::Vortex => {
                    let angle = fi * 0.1;
                    let r = (fi / n) * 15.0;
                    Vec3::new(angle.cos() * r, centered(rng) * 5.0, angle.sin() * r)
                }
                ShapeKind::Grid => {
                    let half = grid_side as f32 / 2.0;
                    let x = (i % grid_side) as f32 - half;
                    let z = (i / grid_side) as f32 - half;
                    Vec3::new(x * 0.5, 0.0, z * 0.5)
                }
                ShapeKind::Torus => {
                    let u = rng.random::<f32>() * TAU;
                    let v = rng.random::<f32>() * TAU;
                    let (major, minor) = (8.0, 3.0);
                    Vec3::new(
                        (major + minor * v.cos()) * u.cos(),
                        (major + minor * v.cos()) * u.sin(),
                        minor * v.sin(),
                    )
                }
                ShapeKind::Galaxy => {
                    let angle = rng.random::<f32>() * TAU;
                    let distance = rng.random::<f32>().sqrt() * 20.0;
                    let spiral = distance * 0.5;
                    let thickness = (1.0 - distance / 20.0) * 2.0;
                    Vec3::new(
                        (angle + spiral).cos() * distance,
                        centered(rng) * thickness,
                        (angle + spiral).sin() * distance,
                    )
                }
                ShapeKind::Pyramid => {
                    let h = 10.0;
                    let y = rng.random::<f32>() * h;
                    let width = h - y;
                    Vec3::new(centered(rng) * width, y - h / 2.0, centered(rng) * width)
                }
                ShapeKind::Hourglass => {
                    let h = 10.0;
                    let y = centered(rng) * h * 2.0;
                    let r = (y * 0.8).abs() + 0.5;
                    let theta = rng.random::<f32>() * TAU;
                    Vec3::new(theta.cos() * r, y, theta.sin() * r)
                }
                ShapeKind::Cross => {
                    let axis = rng.random_range(0..3usize);
                    let size = 15.0;
                    let mut p = Vec3::new(centered(rng), centered(rng), centered(rng)) * 2.0;
                    p[axis] = centered(rng) * size;
                    p
                }
                ShapeKind::Knot => {
                    let t = (fi / n) * TAU;
                    let x = t.sin() + 2.0 * (2.0 * t).sin();
                    let y = t.cos() - 2.0 * (2.0 * t).cos();
                    let z = -(3.0 * t).sin();
                    Vec3::new(x, y, z) * 4.0
                }
                ShapeKind::Star => {
                    let points = 5;
                    let r = if i % 2 == 0 { 10.0 } else { 4.0 };
                    let angle = rng.random_range(0..points) as f32 * (TAU / points as f32);
                    Vec3::new(
                        angle.cos() * r + centered(rng) * 2.0,
                        angle.sin() * r + centered(rng) * 2.0,
                        centered(rng) * 5.0,
                    )
                }
                ShapeKind::Spiral => {
                    let t = (fi / n) * PI * 20.0;
                    let r = t * 0.8;
                    Vec3::new(t.cos() * r, t.sin() * r, centered(rng) * 2.0)
                }
                ShapeKind::Wave => {
                    let x = (fi / n) * 40.0 - 20.0;
                    let z = centered(rng) * 20.0;
                    let y = (x * 0.5).sin() * 5.0 + (z * 0.5).cos() * 5.0;
                    Vec3::new(x, y, z)
                }
                ShapeKind::Fountain => {
                    let t = rng.random::<f32>() * TAU;
                    let r = rng.random::<f32>().sqrt() * 5.0;
                    let h = 20.0 * rng.random::<f32>();
                    Vec3::new(t.cos() * r * (h * 0.1), h - 10.0, t.sin() * r * (h * 0.1))
                }
                ShapeKind::CubeHollow => {
                    let side = rng.random_range(0..3usize);
                    let face = if rng.random::<f32>() > 0.5 { 5.0 } else { -5.0 };
                    let mut p = Vec3::new(centered(rng), centered(rng), centered(rng)) * 10.0;
                    p[side] = face;
                    p
                }
                ShapeKind::Ring => {
                    let t = rng.random::<f32>() * TAU;
                    let r = 12.0 + centered(rng) * 0.5;
                    Vec3::new(t.cos() * r, centered(rng) * 0.5, t.sin() * r)
                }
                ShapeKind::Monolith => {
                    let slab = (i * 5 / count.max(1)) as f32;
                    Vec3::new(
                        (slab - 2.0) * 15.0 + centered(rng) * 2.0,
                        centered(rng) * 40.0,
                        centered(rng) * 2.0,
                    )
                }
                ShapeKind::Spikes => {
                    let angle = rng.random::<f32>() * TAU;
                    let h = 30.0 * rng.random::<f32>().powi(2);
                    Vec3::new(angle.cos() * (h * 0.2), h - 15.0, angle.sin() * (h * 0.2))
                }
                ShapeKind::Shards => {
                    let angle = rng.random::<f32>() * TAU;
                    let r = 5.0 + rng.random::<f32>() * 20.0;
                    let y = centered(rng) * 10.0;
                    Vec3::new(angle.cos() * r, y + (angle * 4.0).sin() * 5.0, angle.sin() * r)
                }
                ShapeKind::Prism => {
                    let side = (i % 3) as f32;
                    let h = 20.0 * rng.random::<f32>();
                    let angle = side * TAU / 3.0;
                    Vec3::new(angle.cos() * (h * 0.5), h - 10.0, angle.sin() * (h * 0.5))
                }
                ShapeKind::Structure => {
                    let step = 5.0;
                    let x = ((i % 10) as f32 - 5.0) * step;
                    let y = (((i % 100) / 10) as f32 - 5.0) * step;
                    let z = (((i / 100) % 10) as f32 - 5.0) * step;
                    Vec3::new(x, y, z) + Vec3::new(centered(rng), centered(rng), centered(rng))
                }
                ShapeKind::Scatter => {
                    Vec3::new(centered(rng), centered(rng), centered(rng))
                        * (SCATTER_HALF_EXTENT * 2.0)
                }
            }
        })
        .collect()
}

/// Generate by identifier; unknown identifiers produce the scatter cube.
pub fn generate_named<R: Rng + ?Sized>(name: &str, count: usize, rng: &mut R) -> Vec<Vec3> {
    generate(ShapeKind::from_name(name), count, rng)
}

/// Every shape's target buffer, generated once per session
#[derive(Debug, Clone)]
pub struct ShapeLibrary {
    count: usize,
    /// Indexed by position in [`ShapeKind::ALL`]
    buffers: Vec<Vec<Vec3>>,
}

impl ShapeLibrary {
    /// Generate all shapes for `count` particles
    pub fn new<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Self {
        let buffers = ShapeKind::ALL
            .iter()
            .map(|&shape| generate(shape, count, rng))
            .collect();

        debug!(
            "ShapeLibrary created: {} shapes x {} particles",
            ShapeKind::ALL.len(),
            count
        );

        Self { count, buffers }
    }

    /// Particles per shape
    pub fn count(&self) -> usize {
        self.count
    }

    /// Target buffer for `shape`
    pub fn get(&self, shape: ShapeKind) -> &[Vec3] {
        let index = ShapeKind::ALL
            .iter()
            .position(|&s| s == shape)
            .unwrap_or(ShapeKind::ALL.len() - 1);
        &self.buffers[index]
    }

    /// Target buffer by identifier, scatter for unknown identifiers
    pub fn get_named(&self, name: &str) -> &[Vec3] {
        self.get(ShapeKind::from_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounds(points: &[Vec3]) -> (Vec3, Vec3) {
        points.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), p| (lo.min(*p), hi.max(*p)),
        )
    }

    #[test]
    fn test_every_shape_fills_buffer() {
        let mut rng = StdRng::seed_from_u64(7);
        for shape in ShapeKind::ALL {
            let points = generate(shape, 1000, &mut rng);
            assert_eq!(points.len(), 1000, "{} wrong length", shape);
            assert!(
                points.iter().all(|p| p.is_finite()),
                "{} produced non-finite points",
                shape
            );
        }
    }

    #[test]
    fn test_zero_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for shape in ShapeKind::ALL {
            assert!(generate(shape, 0, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_names_round_trip() {
        for shape in ShapeKind::ALL {
            assert_eq!(ShapeKind::lookup(shape.name()), Some(shape));
        }
        assert_eq!(ShapeKind::lookup("hypercube"), None);
        assert_eq!(ShapeKind::from_name("hypercube"), ShapeKind::Scatter);
    }

    #[test]
    fn test_sphere_radius() {
        let mut rng = StdRng::seed_from_u64(1);
        for p in generate(ShapeKind::Sphere, 500, &mut rng) {
            assert!((p.length() - 8.0).abs() < 1e-3, "radius was {}", p.length());
        }
    }

    #[test]
    fn test_torus_tube_distance() {
        let mut rng = StdRng::seed_from_u64(2);
        for p in generate(ShapeKind::Torus, 500, &mut rng) {
            // Distance from the ring of radius R in the XY plane equals r
            let ring = (p.x * p.x + p.y * p.y).sqrt() - 8.0;
            let tube = (ring * ring + p.z * p.z).sqrt();
            assert!((tube - 3.0).abs() < 1e-3, "tube distance was {}", tube);
        }
    }

    #[test]
    fn test_grid_is_flat_lattice() {
        let mut rng = StdRng::seed_from_u64(3);
        let points = generate(ShapeKind::Grid, 100, &mut rng);
        assert!(points.iter().all(|p| p.y == 0.0));
        // 10x10 lattice at 0.5 spacing, centered
        assert_eq!(points[0], Vec3::new(-2.5, 0.0, -2.5));
        assert_eq!(points[11], Vec3::new(-2.0, 0.0, -2.0));
    }

    #[test]
    fn test_scatter_envelope() {
        let mut rng = StdRng::seed_from_u64(4);
        let points = generate(ShapeKind::Scatter, 5000, &mut rng);
        let (lo, hi) = bounds(&points);
        assert!(lo.min_element() >= -SCATTER_HALF_EXTENT);
        assert!(hi.max_element() <= SCATTER_HALF_EXTENT);
        // Uniform cube should reach close to every face
        assert!(lo.max_element() < -20.0);
        assert!(hi.min_element() > 20.0);
    }

    #[test]
    fn test_unknown_name_matches_scatter() {
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        let unknown = generate_named("not-a-shape", 2000, &mut a);
        let scatter = generate(ShapeKind::Scatter, 2000, &mut b);
        assert_eq!(unknown, scatter);
    }

    #[test]
    fn test_library_serves_each_shape() {
        let mut rng = StdRng::seed_from_u64(5);
        let library = ShapeLibrary::new(256, &mut rng);
        assert_eq!(library.count(), 256);
        for shape in ShapeKind::ALL {
            assert_eq!(library.get(shape).len(), 256);
        }
        assert_eq!(library.get_named("???"), library.get(ShapeKind::Scatter));
    }
}
