//! Placement records exported from a packing state.

use crate::transform::{orientation_angles, OrientationAngles};
use crate::Result;
use nalgebra::Vector3;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One packed piece: where it went, in which container and which orientation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// External id of the piece.
    pub piece_id: usize,

    /// External id of the container.
    pub container_id: usize,

    /// Orientation id (0..24).
    pub orientation: usize,

    /// Container-local position of the oriented piece's reference corner.
    pub position: Vector3<f64>,
}

impl Placement {
    /// Creates a new placement.
    pub fn new(piece_id: usize, container_id: usize, orientation: usize, position: Vector3<f64>) -> Self {
        Self {
            piece_id,
            container_id,
            orientation,
            position,
        }
    }

    /// Returns the Euler angles (degrees) of the placement's orientation.
    pub fn angles(&self) -> Result<OrientationAngles> {
        orientation_angles(self.orientation)
    }
}

/// Placement statistics for a set of placements.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementStats {
    /// Total number of placements.
    pub count: usize,
    /// Distribution of orientation ids used.
    pub orientation_distribution: HashMap<usize, usize>,
    /// Distribution of placements per container id.
    pub container_distribution: HashMap<usize, usize>,
}

impl PlacementStats {
    /// Computes statistics from a set of placements.
    pub fn from_placements(placements: &[Placement]) -> Self {
        let mut stats = Self {
            count: placements.len(),
            ..Default::default()
        };

        for p in placements {
            *stats.orientation_distribution.entry(p.orientation).or_insert(0) += 1;
            *stats.container_distribution.entry(p.container_id).or_insert(0) += 1;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_angles() {
        let p = Placement::new(3, 1, 5, Vector3::new(1.0, 2.0, 3.0));
        let a = p.angles().unwrap();
        assert_eq!((a.alpha, a.beta, a.gamma), (90.0, 0.0, 90.0));
    }

    #[test]
    fn test_placement_stats() {
        let placements = vec![
            Placement::new(0, 0, 0, Vector3::zeros()),
            Placement::new(1, 0, 4, Vector3::zeros()),
            Placement::new(2, 7, 0, Vector3::zeros()),
        ];

        let stats = PlacementStats::from_placements(&placements);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.orientation_distribution.get(&0), Some(&2));
        assert_eq!(stats.orientation_distribution.get(&4), Some(&1));
        assert_eq!(stats.container_distribution.get(&7), Some(&1));
    }
}
