//! Read-only feasibility audit of a packing state.
//!
//! Containers are audited in volatile-id order. Within a container, pieces are visited
//! by ascending external id:
//!
//! 1. every component against every slant;
//! 2. per piece: forbidden orientation, then every component against the container
//!    walls, then every later piece (material compatibility, then component overlap).
//!
//! Coordinates are rounded to [`VALIDATION_DIGITS`] decimals before the wall and overlap
//! tests.

use crate::solution::Solution;
use nalgebra::Vector3;
use stowage_core::transform::AABB3D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decimal digits kept when comparing coordinates.
pub const VALIDATION_DIGITS: i32 = 7;

/// Kind of a feasibility violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlawType {
    /// A component leaves the container.
    OverlapContainer,
    /// Components of two pieces share volume.
    OverlapPiece,
    /// A component reaches into the part cut away by a slant.
    OverlapSlant,
    /// A piece uses one of its forbidden orientations.
    ForbiddenOrientation,
    /// Incompatible materials share a container.
    Compatibility,
}

/// One feasibility violation. Ids are volatile ids; cubes are component indices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Flaw {
    /// What is wrong.
    pub flaw_type: FlawType,
    /// Container volatile id.
    pub container: usize,
    /// First (or only) piece involved.
    pub piece1: usize,
    /// Offending component of `piece1`.
    pub cube1: Option<usize>,
    /// Position of `piece1`, of its component, or the corner crossing a slant.
    pub position1: Vector3<f64>,
    /// Second piece for pairwise flaws.
    pub piece2: Option<usize>,
    /// Offending component of `piece2`.
    pub cube2: Option<usize>,
    /// Position of `piece2` or of its component.
    pub position2: Option<Vector3<f64>>,
    /// Slant index within the container.
    pub slant: Option<usize>,
}

impl Flaw {
    fn single(flaw_type: FlawType, container: usize, piece: usize, position: Vector3<f64>) -> Self {
        Self {
            flaw_type,
            container,
            piece1: piece,
            cube1: None,
            position1: position,
            piece2: None,
            cube2: None,
            position2: None,
            slant: None,
        }
    }
}

impl Solution {
    /// Lists every flaw of the current state. Never mutates the solution.
    pub fn validate(&self) -> Vec<Flaw> {
        let mut flaws = Vec::new();
        for c in 0..self.container_content.len() {
            self.validate_container(c, &mut flaws);
        }
        if !flaws.is_empty() {
            log::debug!("validation found {} flaws", flaws.len());
        }
        flaws
    }

    fn validate_container(&self, c: usize, flaws: &mut Vec<Flaw>) {
        let pieces = self.instance.pieces();
        let Some(container) = self.instance.containers().get(c) else {
            return;
        };
        let mut content: Vec<usize> = self.container_content[c].iter().copied().collect();
        content.sort_by_key(|&p| pieces[p].id());

        let boxes = |p: usize| -> Vec<AABB3D> {
            let shape = pieces[p].variant(self.orientations[p]);
            shape
                .components()
                .iter()
                .map(|cube| cube.bounds_at(&self.positions[p]))
                .collect()
        };

        for &p in &content {
            for (cube, bounds) in boxes(p).iter().enumerate() {
                for (s, slant) in container.slants().iter().enumerate() {
                    let corner = bounds.support_corner(slant.normal());
                    if slant.excess(&corner) > 0.0 {
                        flaws.push(Flaw {
                            cube1: Some(cube),
                            slant: Some(s),
                            ..Flaw::single(FlawType::OverlapSlant, c, p, corner)
                        });
                    }
                }
            }
        }

        let extent = container.extent();
        for (i, &p1) in content.iter().enumerate() {
            if pieces[p1].is_forbidden(self.orientations[p1]) {
                flaws.push(Flaw::single(
                    FlawType::ForbiddenOrientation,
                    c,
                    p1,
                    self.positions[p1],
                ));
            }
            let boxes1 = boxes(p1);
            for (cube, bounds) in boxes1.iter().enumerate() {
                if !bounds.rounded(VALIDATION_DIGITS).within(extent) {
                    flaws.push(Flaw {
                        cube1: Some(cube),
                        ..Flaw::single(FlawType::OverlapContainer, c, p1, bounds.min)
                    });
                }
            }
            for &p2 in &content[i + 1..] {
                if pieces[p1].material().is_incompatible_with(pieces[p2].material()) {
                    flaws.push(Flaw {
                        piece2: Some(p2),
                        position2: Some(self.positions[p2]),
                        ..Flaw::single(FlawType::Compatibility, c, p1, self.positions[p1])
                    });
                }
                let boxes2 = boxes(p2);
                for (cube1, b1) in boxes1.iter().enumerate() {
                    let r1 = b1.rounded(VALIDATION_DIGITS);
                    for (cube2, b2) in boxes2.iter().enumerate() {
                        if r1.overlaps(&b2.rounded(VALIDATION_DIGITS)) {
                            flaws.push(Flaw {
                                cube1: Some(cube1),
                                piece2: Some(p2),
                                cube2: Some(cube2),
                                position2: Some(b2.min),
                                ..Flaw::single(FlawType::OverlapPiece, c, p1, b1.min)
                            });
                        }
                    }
                }
            }
        }
    }
}
