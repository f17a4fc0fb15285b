//! Extreme points for multi-container 3D packing.
//!
//! An extreme point (EP) is a container-local candidate position for the reference
//! corner of the next piece. Every container starts with the origin. Each placed box
//! (a whole piece, or every component in Tetris mode) contributes six candidates: for
//! each axis the far face coordinate, projected to zero along each of the two other
//! axes in turn.
//!
//! # Algorithm Overview
//!
//! ```text
//! ep11 = (x + L, 0,     z    )    ep12 = (x + L, y,     0    )
//! ep21 = (0,     y + W, z    )    ep22 = (x,     y + W, 0    )
//! ep31 = (0,     y,     z + H)    ep32 = (x,     0,     z + H)
//! ```
//!
//! Points are not deduplicated on insertion; [`ExtremePointSet::prune`] removes exact
//! duplicates. When residual space is tracked, every point receives a dense id and a
//! free-extent vector that starts at the distance to the far container walls and is
//! tightened by each later placement.
//!
//! # References
//!
//! - Crainic, T. G., Perboli, G., & Tadei, R. (2008). Extreme point-based heuristics
//!   for three-dimensional bin packing.

use nalgebra::Vector3;
use stowage_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A candidate anchor position.
///
/// Equality compares coordinates exactly and ignores the id.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtremePoint {
    /// Container-local position.
    pub position: Vector3<f64>,
    /// Dense id, assigned when residual space is tracked.
    pub id: Option<usize>,
}

impl ExtremePoint {
    /// Creates an untracked point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::at(Vector3::new(x, y, z))
    }

    /// Creates an untracked point from a vector.
    pub fn at(position: Vector3<f64>) -> Self {
        Self { position, id: None }
    }

    /// Returns the position as a tuple.
    pub fn pos(&self) -> (f64, f64, f64) {
        (self.position.x, self.position.y, self.position.z)
    }
}

impl PartialEq for ExtremePoint {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

/// The six candidates contributed by a box at `origin` with extent `extent`.
pub fn box_candidates(origin: &Vector3<f64>, extent: &Vector3<f64>) -> [Vector3<f64>; 6] {
    let far = origin + extent;
    [
        Vector3::new(far.x, 0.0, origin.z),
        Vector3::new(far.x, origin.y, 0.0),
        Vector3::new(0.0, far.y, origin.z),
        Vector3::new(origin.x, far.y, 0.0),
        Vector3::new(0.0, origin.y, far.z),
        Vector3::new(origin.x, 0.0, far.z),
    ]
}

/// Extreme points of every container of a solution.
#[derive(Debug, Clone)]
pub struct ExtremePointSet {
    /// Points per container volatile id.
    points: Vec<Vec<ExtremePoint>>,
    /// Container extents, for initial residual space.
    extents: Vec<Vector3<f64>>,
    /// Residual space per point id, when tracked.
    residual: Option<Vec<Vector3<f64>>>,
}

impl ExtremePointSet {
    /// Creates empty point lists for containers with the given extents.
    pub fn new(extents: Vec<Vector3<f64>>, track_residual: bool) -> Self {
        Self {
            points: vec![Vec::new(); extents.len()],
            extents,
            residual: track_residual.then(Vec::new),
        }
    }

    /// Whether residual space is tracked.
    pub fn tracks_residual(&self) -> bool {
        self.residual.is_some()
    }

    /// Number of containers.
    pub fn container_count(&self) -> usize {
        self.points.len()
    }

    /// Points of one container in insertion order.
    pub fn points(&self, container: usize) -> &[ExtremePoint] {
        self.points.get(container).map_or(&[], Vec::as_slice)
    }

    /// Total number of points across containers.
    pub fn len(&self) -> usize {
        self.points.iter().map(Vec::len).sum()
    }

    /// Returns true if no container has a point.
    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Vec::is_empty)
    }

    fn check_container(&self, container: usize) -> Result<()> {
        if container < self.points.len() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "unknown container volatile id {}",
                container
            )))
        }
    }

    /// Appends a point and returns it (with its id when residual space is tracked).
    pub fn add(&mut self, container: usize, position: Vector3<f64>) -> Result<ExtremePoint> {
        self.check_container(container)?;
        let mut ep = ExtremePoint::at(position);
        if let Some(residual) = &mut self.residual {
            ep.id = Some(residual.len());
            residual.push(self.extents[container] - position);
        }
        self.points[container].push(ep);
        Ok(ep)
    }

    /// Appends several points.
    pub fn add_all<I>(&mut self, container: usize, positions: I) -> Result<()>
    where
        I: IntoIterator<Item = Vector3<f64>>,
    {
        for position in positions {
            self.add(container, position)?;
        }
        Ok(())
    }

    /// Removes the first point equal to `ep`. Returns whether one was removed.
    pub fn remove(&mut self, container: usize, ep: &ExtremePoint) -> Result<bool> {
        self.check_container(container)?;
        let list = &mut self.points[container];
        match list.iter().position(|p| p == ep) {
            Some(i) => {
                list.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every point of one container. Residual entries stay addressable.
    pub fn clear_container(&mut self, container: usize) -> Result<()> {
        self.check_container(container)?;
        self.points[container].clear();
        Ok(())
    }

    /// Removes all points and residual entries; ids restart at zero.
    pub fn clear(&mut self) {
        for list in &mut self.points {
            list.clear();
        }
        if let Some(residual) = &mut self.residual {
            residual.clear();
        }
    }

    /// Prunes the points of one container.
    ///
    /// The non-exhaustive mode drops exact duplicates and keeps the first occurrence.
    /// Exhaustive geometric-dominance pruning is not supported.
    pub fn prune(&mut self, container: usize, exhaustive: bool) -> Result<()> {
        self.check_container(container)?;
        if exhaustive {
            return Err(Error::Unsupported(
                "exhaustive extreme point pruning".to_string(),
            ));
        }
        let list = &mut self.points[container];
        let mut kept: Vec<ExtremePoint> = Vec::with_capacity(list.len());
        for ep in list.drain(..) {
            if !kept.contains(&ep) {
                kept.push(ep);
            }
        }
        *list = kept;
        Ok(())
    }

    /// Residual space tracked for `ep`.
    pub fn residual(&self, ep: &ExtremePoint) -> Result<Vector3<f64>> {
        let residual = self.residual.as_ref().ok_or_else(|| {
            Error::UnknownExtremePoint("residual space is not tracked".to_string())
        })?;
        ep.id
            .and_then(|id| residual.get(id).copied())
            .ok_or_else(|| {
                Error::UnknownExtremePoint(format!("point {:?} carries no residual id", ep.pos()))
            })
    }

    /// Tightens the residual space of one container's points after a box with bounding
    /// extent `extent` was placed at `anchor`.
    pub fn tighten(&mut self, container: usize, anchor: &Vector3<f64>, extent: &Vector3<f64>) {
        let (Some(residual), Some(points)) = (self.residual.as_mut(), self.points.get(container))
        else {
            return;
        };
        let far = anchor + extent;
        for ep in points {
            let Some(slot) = ep.id.and_then(|id| residual.get_mut(id)) else {
                continue;
            };
            let p = &ep.position;
            let within_x = anchor.x <= p.x && p.x <= far.x;
            let within_y = anchor.y <= p.y && p.y <= far.y;
            if p.z >= anchor.z && p.z < far.z {
                if p.x <= anchor.x && within_y {
                    slot.x = slot.x.min(anchor.x - p.x);
                }
                if p.y <= anchor.y && within_x {
                    slot.y = slot.y.min(anchor.y - p.y);
                }
            }
            if p.z <= anchor.z && within_x && within_y {
                slot.z = slot.z.min(anchor.z - p.z);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn set(track: bool) -> ExtremePointSet {
        ExtremePointSet::new(vec![Vector3::new(10.0, 10.0, 10.0); 2], track)
    }

    #[test]
    fn test_box_candidates() {
        let eps = box_candidates(&Vector3::new(1.0, 2.0, 3.0), &Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(eps[0], Vector3::new(5.0, 0.0, 3.0));
        assert_eq!(eps[1], Vector3::new(5.0, 2.0, 0.0));
        assert_eq!(eps[2], Vector3::new(0.0, 7.0, 3.0));
        assert_eq!(eps[3], Vector3::new(1.0, 7.0, 0.0));
        assert_eq!(eps[4], Vector3::new(0.0, 2.0, 9.0));
        assert_eq!(eps[5], Vector3::new(1.0, 0.0, 9.0));
    }

    #[test]
    fn test_no_implicit_dedup_then_prune() {
        let mut eps = set(false);
        eps.add(0, Vector3::zeros()).unwrap();
        eps.add(0, Vector3::new(1.0, 0.0, 0.0)).unwrap();
        eps.add(0, Vector3::zeros()).unwrap();
        assert_eq!(eps.points(0).len(), 3);
        eps.prune(0, false).unwrap();
        assert_eq!(eps.points(0).len(), 2);
        assert_eq!(eps.points(0)[1].pos(), (1.0, 0.0, 0.0));
    }

    #[test]
    fn test_prune_is_exact() {
        let mut eps = set(false);
        eps.add(0, Vector3::new(0.1 + 0.2, 0.0, 0.0)).unwrap();
        eps.add(0, Vector3::new(0.3, 0.0, 0.0)).unwrap();
        eps.prune(0, false).unwrap();
        assert_eq!(eps.points(0).len(), 2);
    }

    #[test]
    fn test_exhaustive_prune_unsupported() {
        let mut eps = set(false);
        assert!(matches!(eps.prune(0, true), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_residual_ids_and_initial_space() {
        let mut eps = set(true);
        let a = eps.add(0, Vector3::zeros()).unwrap();
        let b = eps.add(1, Vector3::new(2.0, 3.0, 4.0)).unwrap();
        assert_eq!((a.id, b.id), (Some(0), Some(1)));
        assert_relative_eq!(eps.residual(&b).unwrap(), Vector3::new(8.0, 7.0, 6.0));
        assert!(eps.residual(&ExtremePoint::new(0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_residual_untracked() {
        let mut eps = set(false);
        let a = eps.add(0, Vector3::zeros()).unwrap();
        assert!(a.id.is_none());
        assert!(matches!(eps.residual(&a), Err(Error::UnknownExtremePoint(_))));
    }

    #[test]
    fn test_tighten() {
        let mut eps = set(true);
        let origin = eps.add(0, Vector3::zeros()).unwrap();
        let below = eps.add(0, Vector3::new(5.0, 5.0, 0.0)).unwrap();
        let beside = eps.add(0, Vector3::new(0.0, 5.0, 1.0)).unwrap();

        // Box at (4, 4, 2) with extent 3 x 3 x 3.
        eps.tighten(0, &Vector3::new(4.0, 4.0, 2.0), &Vector3::new(3.0, 3.0, 3.0));

        // Origin is below z = 2 but outside the footprint: untouched.
        assert_relative_eq!(eps.residual(&origin).unwrap(), Vector3::new(10.0, 10.0, 10.0));
        // (5, 5, 0) sits under the box: z shrinks to 2.
        assert_relative_eq!(eps.residual(&below).unwrap(), Vector3::new(5.0, 5.0, 2.0));
        // (0, 5, 1) is not in the box's z range: untouched.
        assert_relative_eq!(eps.residual(&beside).unwrap(), Vector3::new(10.0, 5.0, 9.0));

        let level = eps.add(0, Vector3::new(0.0, 5.0, 2.0)).unwrap();
        eps.tighten(0, &Vector3::new(4.0, 4.0, 2.0), &Vector3::new(3.0, 3.0, 3.0));
        assert_relative_eq!(eps.residual(&level).unwrap(), Vector3::new(4.0, 5.0, 8.0));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut eps = set(false);
        eps.add(1, Vector3::new(1.0, 1.0, 1.0)).unwrap();
        assert!(eps.remove(1, &ExtremePoint::new(1.0, 1.0, 1.0)).unwrap());
        assert!(!eps.remove(1, &ExtremePoint::new(1.0, 1.0, 1.0)).unwrap());
        eps.add(0, Vector3::zeros()).unwrap();
        eps.clear();
        assert!(eps.is_empty());
        assert!(eps.add(2, Vector3::zeros()).is_err());
    }
}
