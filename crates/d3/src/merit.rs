//! Merit functions ranking candidate placements.
//!
//! Lower scores are better. Scoring never mutates the solution; the caller commits the
//! winning candidate through [`Solution::add`] or [`Solution::insert`].

use crate::extreme_point::ExtremePoint;
use crate::solution::Solution;
use stowage_core::transform::check_orientation;
use stowage_core::{MeritType, Result};

impl Solution {
    /// Scores placing `piece` into `container` at `ep` in `orientation`.
    ///
    /// Open containers receive a bonus of `-open_container_big_m`; the configured merit
    /// term is added on top.
    pub fn score_piece_allocation(
        &self,
        container: usize,
        piece: usize,
        orientation: usize,
        ep: &ExtremePoint,
    ) -> Result<f64> {
        check_orientation(orientation)?;
        let bin = self.instance.container(container)?;
        let item = self.instance.variable_piece(piece)?;
        let extent = item.variant(orientation).extent();
        let p = &ep.position;

        let mut score = 0.0;
        if self.container_order.is_open(container) {
            score -= self.container_order.big_m();
        }

        score += match self.config.merit_type {
            MeritType::None => 0.0,
            MeritType::FreeVolume => {
                bin.volume() - self.infos[container].volume_contained - item.volume()
            }
            MeritType::MaxExtentXY => {
                let overshoot_x = p.x + extent.x - self.packing_max_x[container];
                let overshoot_y = p.y + extent.y - self.packing_max_y[container];
                overshoot_x.max(0.0) + overshoot_y.max(0.0)
            }
            MeritType::LevelPackingXY => {
                let level = |start: f64, length: f64, max: f64| {
                    if start + length > max {
                        (start + length - max) * self.level_packing_c
                    } else {
                        max - start + length
                    }
                };
                level(p.x, extent.x, self.packing_max_x[container])
                    + level(p.y, extent.y, self.packing_max_y[container])
            }
            MeritType::ResidualSpace => {
                let residual = self.extreme_points.residual(ep)?;
                (residual - extent).sum()
            }
            MeritType::EuclideanXYZ => (p + extent).norm(),
            MeritType::EuclideanXY => (p.x + extent.x).hypot(p.y + extent.y),
            MeritType::Height => p.z + extent.z,
        };
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use crate::container::Container;
    use crate::extreme_point::ExtremePoint;
    use crate::instance::Instance;
    use crate::oracle::ClippingOracle;
    use crate::piece::Piece;
    use crate::solution::Solution;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::sync::Arc;
    use stowage_core::{Config, Error, MeritType};

    fn solution(merit: MeritType) -> Solution {
        let mut instance = Instance::new("merit")
            .with_piece(Piece::cuboid(0, 4.0, 3.0, 2.0).unwrap())
            .unwrap()
            .with_piece(Piece::cuboid(1, 1.0, 1.0, 1.0).unwrap())
            .unwrap()
            .with_container(Container::new(0, 10.0, 10.0, 10.0).unwrap())
            .unwrap();
        instance.seal(&ClippingOracle).unwrap();
        let config = Config::default().with_merit_type(merit).with_seed(1);
        Solution::new(Arc::new(instance), config).unwrap()
    }

    #[test]
    fn test_simple_merits() {
        let ep = ExtremePoint::new(1.0, 2.0, 3.0);
        let score = |m| solution(m).score_piece_allocation(0, 0, 0, &ep).unwrap();
        assert_relative_eq!(score(MeritType::None), 0.0);
        assert_relative_eq!(score(MeritType::FreeVolume), 1000.0 - 24.0);
        assert_relative_eq!(score(MeritType::Height), 5.0);
        assert_relative_eq!(score(MeritType::EuclideanXY), (25.0f64 + 25.0).sqrt());
        assert_relative_eq!(score(MeritType::EuclideanXYZ), (25.0f64 + 25.0 + 25.0).sqrt());
    }

    #[test]
    fn test_extent_merits() {
        let mut s = solution(MeritType::MaxExtentXY);
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        let inside = ExtremePoint::new(0.0, 0.0, 2.0);
        let outside = ExtremePoint::new(4.0, 0.0, 0.0);
        assert_relative_eq!(s.score_piece_allocation(0, 1, 0, &inside).unwrap(), 0.0);
        assert_relative_eq!(s.score_piece_allocation(0, 1, 0, &outside).unwrap(), 1.0);

        let mut s = solution(MeritType::LevelPackingXY);
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        // C = max(10, 10) + 1 = 11.
        assert_relative_eq!(
            s.score_piece_allocation(0, 1, 0, &outside).unwrap(),
            1.0 * 11.0 + (3.0 - 0.0 + 1.0)
        );
        // Widening by the full 4 x 3 footprint: 4 * 11 + (3 - 0 + 3).
        assert_relative_eq!(s.score_piece_allocation(0, 0, 0, &outside).unwrap(), 50.0);
        assert_relative_eq!(
            s.score_piece_allocation(0, 1, 0, &inside).unwrap(),
            (4.0 + 1.0) + (3.0 + 1.0)
        );
    }

    #[test]
    fn test_residual_space_merit() {
        let mut s = solution(MeritType::ResidualSpace);
        let origin = s.extreme_points(0)[0];
        assert_relative_eq!(
            s.score_piece_allocation(0, 0, 0, &origin).unwrap(),
            (10.0 - 4.0) + (10.0 - 3.0) + (10.0 - 2.0)
        );
        s.insert(0, 0, 0, &origin).unwrap();
        let untracked = ExtremePoint::new(4.0, 0.0, 0.0);
        assert!(matches!(
            s.score_piece_allocation(0, 1, 0, &untracked),
            Err(Error::UnknownExtremePoint(_))
        ));
        let ep = s.extreme_points(0)[0];
        assert!(s.score_piece_allocation(0, 1, 0, &ep).is_ok());
    }

    #[test]
    fn test_scoring_is_read_only() {
        let s = solution(MeritType::FreeVolume);
        let before = s.summary();
        s.score_piece_allocation(0, 0, 0, &ExtremePoint::new(0.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(before.placements, s.summary().placements);
        assert_eq!(s.extreme_points(0).len(), 1);
    }

    #[test]
    fn test_open_container_bonus() {
        let mut instance = Instance::new("open")
            .with_piece(Piece::cuboid(0, 1.0, 1.0, 1.0).unwrap())
            .unwrap()
            .with_container(Container::new(0, 2.0, 2.0, 2.0).unwrap())
            .unwrap();
        instance.seal(&ClippingOracle).unwrap();
        let config = Config::default()
            .with_merit_type(MeritType::Height)
            .with_container_open_by_piece_ratio(1.0);
        let s = Solution::new(Arc::new(instance), config).unwrap();
        let score = s
            .score_piece_allocation(0, 0, 0, &ExtremePoint::new(0.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(score, 1.0 - 1e6);
    }
}
