//! Geometry oracle: volumes of convex regions given as half-space intersections.
//!
//! Slant-clipped container volumes and the share of an obstacle that lies inside its
//! container are delegated to a [`VolumeOracle`]. They are computed once when a
//! container is sealed and cached there, never on the placement hot path.
//!
//! [`ClippingOracle`] is the built-in implementation: it derives an axis-aligned seed box
//! from the axis-aligned half-spaces and clips it by every oblique plane
//! (Sutherland-Hodgman per face plus a cap polygon per cut), then sums face pyramids
//! around an interior point.

use nalgebra::Vector3;
use stowage_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;

/// The closed half-space `normal . p <= offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HalfSpace {
    /// Outward normal of the bounding plane.
    pub normal: Vector3<f64>,
    /// Plane offset.
    pub offset: f64,
}

impl HalfSpace {
    /// Creates a half-space.
    pub fn new(normal: Vector3<f64>, offset: f64) -> Self {
        Self { normal, offset }
    }

    /// The six half-spaces of the box `[min, max]`.
    pub fn cuboid(min: &Vector3<f64>, max: &Vector3<f64>) -> [HalfSpace; 6] {
        [
            HalfSpace::new(Vector3::new(-1.0, 0.0, 0.0), -min.x),
            HalfSpace::new(Vector3::new(1.0, 0.0, 0.0), max.x),
            HalfSpace::new(Vector3::new(0.0, -1.0, 0.0), -min.y),
            HalfSpace::new(Vector3::new(0.0, 1.0, 0.0), max.y),
            HalfSpace::new(Vector3::new(0.0, 0.0, -1.0), -min.z),
            HalfSpace::new(Vector3::new(0.0, 0.0, 1.0), max.z),
        ]
    }

    /// Whether `point` satisfies the inequality (with a small tolerance).
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        self.normal.dot(point) <= self.offset + EPS
    }

    fn signed(&self, point: &Vector3<f64>) -> f64 {
        self.normal.dot(point) - self.offset
    }

    /// The axis and bound kind if the plane is axis-aligned.
    fn axis_bound(&self) -> Option<(usize, bool, f64)> {
        let nonzero: Vec<usize> = (0..3).filter(|i| self.normal[*i] != 0.0).collect();
        match nonzero.as_slice() {
            [axis] => {
                let n = self.normal[*axis];
                // n > 0 bounds the axis from above, n < 0 from below.
                Some((*axis, n > 0.0, self.offset / n))
            }
            _ => None,
        }
    }
}

/// Computes volumes of bounded convex regions.
pub trait VolumeOracle {
    /// Volume of the intersection of `half_spaces`.
    ///
    /// Returns [`Error::VolumeUnknown`] when the volume cannot be determined
    /// (unbounded region, non-finite input, numerical breakdown). An empty region has
    /// volume zero.
    fn volume(&self, half_spaces: &[HalfSpace]) -> Result<f64>;
}

/// Built-in oracle clipping an axis-aligned box by the oblique half-spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClippingOracle;

#[derive(Debug, Clone)]
struct Face {
    normal: Vector3<f64>,
    points: Vec<Vector3<f64>>,
}

impl ClippingOracle {
    /// Creates the oracle.
    pub fn new() -> Self {
        Self
    }

    fn seed_box(half_spaces: &[HalfSpace]) -> Result<Option<(Vector3<f64>, Vector3<f64>)>> {
        let mut min = Vector3::repeat(f64::NEG_INFINITY);
        let mut max = Vector3::repeat(f64::INFINITY);
        for hs in half_spaces {
            if let Some((axis, upper, bound)) = hs.axis_bound() {
                if upper {
                    max[axis] = max[axis].min(bound);
                } else {
                    min[axis] = min[axis].max(bound);
                }
            }
        }
        if min.iter().chain(max.iter()).any(|v| !v.is_finite()) {
            return Err(Error::VolumeUnknown(
                "region is not bounded by axis-aligned half-spaces".to_string(),
            ));
        }
        if (0..3).any(|i| min[i] >= max[i]) {
            return Ok(None);
        }
        Ok(Some((min, max)))
    }

    fn box_faces(min: &Vector3<f64>, max: &Vector3<f64>) -> Vec<Face> {
        let p = |x: f64, y: f64, z: f64| Vector3::new(x, y, z);
        let (a, b) = (min, max);
        vec![
            Face {
                normal: -Vector3::x(),
                points: vec![p(a.x, a.y, a.z), p(a.x, a.y, b.z), p(a.x, b.y, b.z), p(a.x, b.y, a.z)],
            },
            Face {
                normal: Vector3::x(),
                points: vec![p(b.x, a.y, a.z), p(b.x, b.y, a.z), p(b.x, b.y, b.z), p(b.x, a.y, b.z)],
            },
            Face {
                normal: -Vector3::y(),
                points: vec![p(a.x, a.y, a.z), p(b.x, a.y, a.z), p(b.x, a.y, b.z), p(a.x, a.y, b.z)],
            },
            Face {
                normal: Vector3::y(),
                points: vec![p(a.x, b.y, a.z), p(a.x, b.y, b.z), p(b.x, b.y, b.z), p(b.x, b.y, a.z)],
            },
            Face {
                normal: -Vector3::z(),
                points: vec![p(a.x, a.y, a.z), p(a.x, b.y, a.z), p(b.x, b.y, a.z), p(b.x, a.y, a.z)],
            },
            Face {
                normal: Vector3::z(),
                points: vec![p(a.x, a.y, b.z), p(b.x, a.y, b.z), p(b.x, b.y, b.z), p(a.x, b.y, b.z)],
            },
        ]
    }

    /// Clips the polytope by one half-space. Returns false if nothing is left.
    fn clip(faces: &mut Vec<Face>, hs: &HalfSpace) -> bool {
        let cuts = faces
            .iter()
            .flat_map(|f| f.points.iter())
            .any(|p| hs.signed(p) > EPS);
        if !cuts {
            return true;
        }

        let mut cap: Vec<Vector3<f64>> = Vec::new();
        let mut clipped = Vec::with_capacity(faces.len() + 1);
        for face in faces.iter() {
            let n = face.points.len();
            let mut out = Vec::with_capacity(n + 1);
            for i in 0..n {
                let a = face.points[i];
                let b = face.points[(i + 1) % n];
                let (sa, sb) = (hs.signed(&a), hs.signed(&b));
                if sa <= EPS {
                    out.push(a);
                    if sa.abs() <= EPS {
                        cap.push(a);
                    }
                }
                if (sa < -EPS && sb > EPS) || (sa > EPS && sb < -EPS) {
                    let t = sa / (sa - sb);
                    let p = a + (b - a) * t;
                    out.push(p);
                    cap.push(p);
                }
            }
            if out.len() >= 3 {
                clipped.push(Face {
                    normal: face.normal,
                    points: out,
                });
            }
        }

        let mut unique: Vec<Vector3<f64>> = Vec::with_capacity(cap.len());
        for p in cap {
            if !unique.iter().any(|q| (q - p).norm() <= 1e-7) {
                unique.push(p);
            }
        }
        if unique.len() >= 3 {
            let normal = hs.normal.normalize();
            let center = unique.iter().sum::<Vector3<f64>>() / unique.len() as f64;
            let helper = if normal.x.abs() < 0.9 {
                Vector3::x()
            } else {
                Vector3::y()
            };
            let u = normal.cross(&helper).normalize();
            let v = normal.cross(&u);
            unique.sort_by(|p, q| {
                let ap = (p - center).dot(&v).atan2((p - center).dot(&u));
                let aq = (q - center).dot(&v).atan2((q - center).dot(&u));
                ap.total_cmp(&aq)
            });
            clipped.push(Face {
                normal,
                points: unique,
            });
        }

        *faces = clipped;
        faces.len() >= 4
    }

    fn polytope_volume(faces: &[Face]) -> f64 {
        let count = faces.iter().map(|f| f.points.len()).sum::<usize>();
        if count == 0 {
            return 0.0;
        }
        let center = faces
            .iter()
            .flat_map(|f| f.points.iter())
            .sum::<Vector3<f64>>()
            / count as f64;

        faces
            .iter()
            .map(|f| {
                let origin = f.points[0];
                let mut doubled = Vector3::zeros();
                for i in 1..f.points.len() - 1 {
                    doubled += (f.points[i] - origin).cross(&(f.points[i + 1] - origin));
                }
                let area = doubled.norm() / 2.0;
                let height = f.normal.dot(&(origin - center));
                area * height / 3.0
            })
            .sum()
    }
}

impl VolumeOracle for ClippingOracle {
    fn volume(&self, half_spaces: &[HalfSpace]) -> Result<f64> {
        if half_spaces
            .iter()
            .any(|hs| !hs.offset.is_finite() || hs.normal.iter().any(|v| !v.is_finite()))
        {
            return Err(Error::VolumeUnknown("non-finite half-space".to_string()));
        }
        let Some((min, max)) = Self::seed_box(half_spaces)? else {
            return Ok(0.0);
        };

        let mut faces = Self::box_faces(&min, &max);
        for hs in half_spaces.iter().filter(|hs| hs.axis_bound().is_none()) {
            if hs.normal.norm() == 0.0 {
                if hs.offset < 0.0 {
                    return Ok(0.0);
                }
                continue;
            }
            if !Self::clip(&mut faces, hs) {
                return Ok(0.0);
            }
        }

        let volume = Self::polytope_volume(&faces);
        if !volume.is_finite() {
            return Err(Error::VolumeUnknown(
                "numerical breakdown while clipping".to_string(),
            ));
        }
        Ok(volume.max(0.0))
    }
}
