//! Read-only summaries of a packing state for reporting layers.

use crate::placement::{Placement, PlacementStats};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Statistics for a single container.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContainerStats {
    /// External id of the container.
    pub container_id: usize,
    /// Usable volume of the container (after slants and virtual pieces).
    pub volume: f64,
    /// Volume accounted to the packed pieces.
    pub volume_contained: f64,
    /// Weight of the packed pieces.
    pub weight_contained: f64,
    /// Number of packed pieces.
    pub piece_count: usize,
    /// Highest z reached by a packed piece.
    pub packing_height: f64,
}

impl ContainerStats {
    /// Contained volume relative to the usable volume (0.0 when the container has no volume).
    pub fn utilization(&self) -> f64 {
        if self.volume > 0.0 {
            self.volume_contained / self.volume
        } else {
            0.0
        }
    }
}

/// Snapshot of a packing state.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackingSummary {
    /// All placements, ordered by container then piece id.
    pub placements: Vec<Placement>,

    /// External ids of the pieces that are not packed.
    pub offloaded: Vec<usize>,

    /// Per-container statistics, ordered by container id.
    pub containers: Vec<ContainerStats>,

    /// Objective value at the time of the snapshot.
    pub objective: f64,
}

impl PackingSummary {
    /// Returns true if every piece was packed.
    pub fn all_placed(&self) -> bool {
        self.offloaded.is_empty()
    }

    /// Returns the number of packed pieces.
    pub fn placed_count(&self) -> usize {
        self.placements.len()
    }

    /// Returns the number of containers holding at least one piece.
    pub fn containers_used(&self) -> usize {
        self.containers.iter().filter(|c| c.piece_count > 0).count()
    }

    /// Contained volume over the usable volume of the containers in use.
    pub fn utilization(&self) -> f64 {
        let (contained, offered) = self
            .containers
            .iter()
            .filter(|c| c.piece_count > 0)
            .fold((0.0, 0.0), |(a, b), c| (a + c.volume_contained, b + c.volume));
        if offered > 0.0 {
            contained / offered
        } else {
            0.0
        }
    }

    /// Returns utilization as a percentage string.
    pub fn utilization_percent(&self) -> String {
        format!("{:.1}%", self.utilization() * 100.0)
    }

    /// Computes placement statistics.
    pub fn placement_stats(&self) -> PlacementStats {
        PlacementStats::from_placements(&self.placements)
    }
}
