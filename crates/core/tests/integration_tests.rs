//! Integration tests for stowage-core.

use nalgebra::{Matrix3, Vector3};
use stowage_core::placement::{Placement, PlacementStats};
use stowage_core::result::{ContainerStats, PackingSummary};
use stowage_core::transform::{rotate, AABB3D};
use stowage_core::{
    rotation_group, Config, ContainerReorder, Error, MeritType, ObjectiveType, PieceOrder,
    ORIENTATION_COUNT,
};

mod transform_tests {
    use super::*;

    #[test]
    fn test_rotation_group_is_closed() {
        let group = rotation_group();
        for a in group.iter() {
            for b in group.iter() {
                let product = a * b;
                assert!(
                    group.iter().any(|m| *m == product),
                    "product outside group: {}",
                    product
                );
            }
        }
    }

    #[test]
    fn test_rotations_are_distinct() {
        let group = rotation_group();
        for i in 0..ORIENTATION_COUNT {
            for j in (i + 1)..ORIENTATION_COUNT {
                assert_ne!(group[i], group[j], "orientations {} and {}", i, j);
            }
        }
        assert!(group.iter().any(|m| *m == Matrix3::identity()));
    }

    #[test]
    fn test_rotate_permutes_axes() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        for o in 0..ORIENTATION_COUNT {
            let r = rotate(o, &v).unwrap();
            let mut abs: Vec<f64> = r.iter().map(|c| c.abs()).collect();
            abs.sort_by(f64::total_cmp);
            assert_eq!(abs, vec![1.0, 2.0, 3.0]);
        }
        assert!(rotate(ORIENTATION_COUNT, &v).is_err());
    }

    #[test]
    fn test_aabb_touching_faces() {
        let a = AABB3D::from_origin_extent(Vector3::zeros(), Vector3::new(2.0, 2.0, 2.0));
        let b = AABB3D::from_origin_extent(Vector3::new(2.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0));
        let c = AABB3D::from_origin_extent(Vector3::new(1.5, 1.5, 1.5), Vector3::new(1.0, 1.0, 1.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
        assert!(a.within(&Vector3::new(2.0, 2.0, 2.0)));
        assert!(!c.within(&Vector3::new(2.0, 2.0, 2.0)));
    }

    #[test]
    fn test_aabb_rounding_removes_noise() {
        let a = AABB3D::new(Vector3::new(-1e-9, 0.0, 0.0), Vector3::new(2.0 + 1e-9, 1.0, 1.0));
        assert!(!a.within(&Vector3::new(2.0, 1.0, 1.0)));
        assert!(a.rounded(7).within(&Vector3::new(2.0, 1.0, 1.0)));
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_parse_codes_and_names() {
        assert_eq!("MRSU".parse::<MeritType>().unwrap(), MeritType::ResidualSpace);
        assert_eq!("residualspace".parse::<MeritType>().unwrap(), MeritType::ResidualSpace);
        assert_eq!(" HwV ".parse::<PieceOrder>().unwrap(), PieceOrder::HeightThenVolume);
        assert_eq!(
            "roundrobin".parse::<ContainerReorder>().unwrap(),
            ContainerReorder::RoundRobin
        );
        assert_eq!(
            "MaxDensity".parse::<ObjectiveType>().unwrap(),
            ObjectiveType::MaxDensity
        );
    }

    #[test]
    fn test_unknown_name_is_config_error() {
        assert!(matches!("spiral".parse::<MeritType>(), Err(Error::ConfigError(_))));
        assert!(matches!("".parse::<PieceOrder>(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_codes_round_trip_through_parse() {
        for m in MeritType::ALL {
            assert_eq!(m.code().parse::<MeritType>().unwrap(), m);
        }
        for o in PieceOrder::ALL {
            assert_eq!(o.code().parse::<PieceOrder>().unwrap(), o);
        }
    }

    #[test]
    fn test_builder_defaults() {
        let config = Config::default();
        assert!(!config.tetris);
        assert!(config.handle_gravity);
        assert_eq!(config.container_open_by_piece_ratio, 0.0);

        let config = Config::new()
            .with_tetris(true)
            .with_gravity(false)
            .with_open_container_big_m(50.0)
            .with_seed(9);
        assert!(config.tetris);
        assert!(!config.handle_gravity);
        assert_eq!(config.open_container_big_m, 50.0);
        assert_eq!(config.seed, Some(9));
    }
}

mod summary_tests {
    use super::*;

    fn summary() -> PackingSummary {
        PackingSummary {
            placements: vec![
                Placement::new(1, 10, 0, Vector3::zeros()),
                Placement::new(2, 10, 5, Vector3::new(4.0, 0.0, 0.0)),
                Placement::new(3, 11, 0, Vector3::zeros()),
            ],
            offloaded: vec![4],
            containers: vec![
                ContainerStats {
                    container_id: 10,
                    volume: 100.0,
                    volume_contained: 30.0,
                    piece_count: 2,
                    ..Default::default()
                },
                ContainerStats {
                    container_id: 11,
                    volume: 100.0,
                    volume_contained: 10.0,
                    piece_count: 1,
                    ..Default::default()
                },
                ContainerStats {
                    container_id: 12,
                    volume: 500.0,
                    ..Default::default()
                },
            ],
            objective: 40.0,
        }
    }

    #[test]
    fn test_summary_counts() {
        let s = summary();
        assert!(!s.all_placed());
        assert_eq!(s.placed_count(), 3);
        assert_eq!(s.containers_used(), 2);
        assert!((s.utilization() - 0.2).abs() < 1e-12);
        assert_eq!(s.utilization_percent(), "20.0%");
    }

    #[test]
    fn test_summary_stats() {
        let stats: PlacementStats = summary().placement_stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.container_distribution.get(&10), Some(&2));
        assert_eq!(stats.orientation_distribution.get(&5), Some(&1));
    }

    #[test]
    fn test_empty_container_utilization() {
        let empty = ContainerStats::default();
        assert_eq!(empty.utilization(), 0.0);
        assert_eq!(PackingSummary::default().utilization(), 0.0);
    }
}
