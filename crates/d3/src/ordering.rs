//! Ordering heuristics for containers and pieces.
//!
//! [`ContainerOrderSupply`] fixes an initial container order and an "open" subset that
//! the scorer prefers, and reorders containers per construction step.
//! [`compare_pieces`] provides the total orders used to sequence pieces.

use crate::instance::Instance;
use crate::piece::Piece;
use rand::Rng;
use std::cmp::Ordering;
use stowage_core::{Config, ContainerInitOrder, ContainerReorder, PieceOrder};

/// Pieces processed before round-robin moves on to the next open container.
pub const ROUND_ROBIN_PERIOD: usize = 10;

/// Container order and open-container selection.
#[derive(Debug, Clone)]
pub struct ContainerOrderSupply {
    init_order: Vec<usize>,
    open: Vec<usize>,
    reserve: Vec<usize>,
    reorder: ContainerReorder,
    big_m: f64,
}

impl ContainerOrderSupply {
    /// Builds the initial order and open set for a sealed instance.
    ///
    /// Open containers are taken greedily in initial order until their volume covers
    /// `container_open_by_piece_ratio` times the total piece volume.
    pub fn new(instance: &Instance, config: &Config) -> Self {
        let containers = instance.containers();
        let mut init_order: Vec<usize> = (0..containers.len()).collect();
        match config.container_order_init {
            ContainerInitOrder::None => {}
            ContainerInitOrder::Capacity => {
                init_order.sort_by(|a, b| containers[*b].volume().total_cmp(&containers[*a].volume()));
            }
        }

        let mut open = Vec::new();
        let ratio = config.container_open_by_piece_ratio;
        if ratio > 0.0 {
            let piece_volume = instance.total_piece_volume();
            if piece_volume <= 0.0 {
                log::warn!("total piece volume is zero; opening only the first container");
            }
            let mut offered = 0.0;
            for &c in &init_order {
                offered += containers[c].volume();
                open.push(c);
                if offered / piece_volume >= ratio {
                    break;
                }
            }
        }
        let reserve = init_order
            .iter()
            .copied()
            .filter(|c| !open.contains(c))
            .collect();

        log::debug!("container order {:?}, open {:?}", init_order, open);
        Self {
            init_order,
            open,
            reserve,
            reorder: config.container_order_reorder,
            big_m: config.open_container_big_m,
        }
    }

    /// Initial container order (volatile ids).
    pub fn init_order(&self) -> &[usize] {
        &self.init_order
    }

    /// Open containers in initial order.
    pub fn open_containers(&self) -> &[usize] {
        &self.open
    }

    /// Containers outside the open set, in initial order.
    pub fn reserve_containers(&self) -> &[usize] {
        &self.reserve
    }

    /// Whether `container` belongs to the open set.
    pub fn is_open(&self, container: usize) -> bool {
        self.open.contains(&container)
    }

    /// Bias applied to open containers.
    pub fn big_m(&self) -> f64 {
        self.big_m
    }

    /// Reorders `containers` for the step that processes piece number `piece_counter`.
    ///
    /// - `None`: unchanged.
    /// - `Capacity`: descending by open bonus plus mesh volume.
    /// - `Random`: descending by `big_m * (1 + u) + id` for open containers (`u`
    ///   uniform in `[0, 1)`) and by `id` for the rest, so open containers come first
    ///   in random order and the reserve follows by descending external id.
    /// - `RoundRobin`: the open set rotated to start at
    ///   `(piece_counter / 10) % open_count`, then the reserve containers in initial
    ///   order. `containers` is ignored in this mode.
    pub fn reorder<R: Rng + ?Sized>(
        &self,
        containers: &[usize],
        piece_counter: usize,
        instance: &Instance,
        rng: &mut R,
    ) -> Vec<usize> {
        match self.reorder {
            ContainerReorder::None => containers.to_vec(),
            ContainerReorder::Capacity => {
                let key = |c: usize| {
                    let volume = instance.container(c).map_or(0.0, |k| k.mesh().volume());
                    self.bonus(c) + volume
                };
                let mut order = containers.to_vec();
                order.sort_by(|a, b| key(*b).total_cmp(&key(*a)));
                order
            }
            ContainerReorder::Random => {
                let mut keyed: Vec<(f64, usize)> = containers
                    .iter()
                    .map(|&c| {
                        let id = instance.container(c).map_or(0.0, |k| k.id() as f64);
                        let bias = if self.is_open(c) {
                            self.big_m + self.big_m * rng.gen::<f64>()
                        } else {
                            0.0
                        };
                        (bias + id, c)
                    })
                    .collect();
                keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
                keyed.into_iter().map(|(_, c)| c).collect()
            }
            ContainerReorder::RoundRobin => self.round_robin(piece_counter),
        }
    }

    fn bonus(&self, container: usize) -> f64 {
        if self.is_open(container) {
            self.big_m
        } else {
            0.0
        }
    }

    fn round_robin(&self, piece_counter: usize) -> Vec<usize> {
        if self.open.is_empty() {
            log::warn!("round-robin reorder without open containers");
            return self.reserve.clone();
        }
        let start = (piece_counter / ROUND_ROBIN_PERIOD) % self.open.len();
        self.open[start..]
            .iter()
            .chain(&self.open[..start])
            .chain(&self.reserve)
            .copied()
            .collect()
    }
}

fn dims(piece: &Piece) -> (f64, f64, f64) {
    let e = piece.original().extent();
    (e.x, e.y, e.z)
}

/// Compares two pieces under `order`. Larger keys sort first; remaining ties are
/// broken by ascending external id, so every order is total.
pub fn compare_pieces(order: PieceOrder, a: &Piece, b: &Piece) -> Ordering {
    let (la, wa, ha) = dims(a);
    let (lb, wb, hb) = dims(b);
    let keys: [(f64, f64); 3] = match order {
        PieceOrder::Volume => [(a.volume(), b.volume()), (0.0, 0.0), (0.0, 0.0)],
        PieceOrder::HeightWidthLength => [(ha, hb), (wa, wb), (la, lb)],
        PieceOrder::VolumeThenHeight => [(a.volume(), b.volume()), (ha, hb), (0.0, 0.0)],
        PieceOrder::HeightThenVolume => [(ha, hb), (a.volume(), b.volume()), (0.0, 0.0)],
        PieceOrder::AreaThenHeight => [(la * wa, lb * wb), (ha, hb), (0.0, 0.0)],
        PieceOrder::HeightThenArea => [(ha, hb), (la * wa, lb * wb), (0.0, 0.0)],
    };
    keys.iter()
        .map(|(ka, kb)| kb.total_cmp(ka))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.id().cmp(&b.id()))
}

/// Volatile ids of the instance's packable pieces sorted by `order`.
pub fn sort_pieces(instance: &Instance, order: PieceOrder) -> Vec<usize> {
    let pieces = instance.pieces();
    let mut ids: Vec<usize> = (0..pieces.len()).collect();
    ids.sort_by(|a, b| compare_pieces(order, &pieces[*a], &pieces[*b]));
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::oracle::ClippingOracle;
    use nalgebra::Vector3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn instance(sizes: &[f64]) -> Instance {
        let mut instance = Instance::new("order");
        for (i, s) in sizes.iter().enumerate() {
            instance
                .add_container(Container::new(i, *s, *s, *s).unwrap())
                .unwrap();
        }
        instance
            .add_piece(Piece::cuboid(0, 2.0, 2.0, 2.0).unwrap())
            .unwrap();
        instance.seal(&ClippingOracle).unwrap();
        instance
    }

    #[test]
    fn test_capacity_init_order() {
        let instance = instance(&[1.0, 3.0, 2.0]);
        let supply = ContainerOrderSupply::new(&instance, &Config::default());
        assert_eq!(supply.init_order(), &[1, 2, 0]);
        assert!(supply.open_containers().is_empty());
        assert_eq!(supply.reserve_containers(), &[1, 2, 0]);
    }

    #[test]
    fn test_open_set_by_ratio() {
        let instance = instance(&[2.0, 2.0, 2.0]);
        // Piece volume 8, each container 8: ratio 2 needs two containers.
        let config = Config::default().with_container_open_by_piece_ratio(2.0);
        let supply = ContainerOrderSupply::new(&instance, &config);
        assert_eq!(supply.open_containers(), &[0, 1]);
        assert_eq!(supply.reserve_containers(), &[2]);
        assert!(supply.is_open(1));
        assert!(!supply.is_open(2));
    }

    #[test]
    fn test_capacity_reorder_prefers_open() {
        let instance = instance(&[3.0, 1.0, 2.0]);
        let config = Config::default()
            .with_container_order_init(ContainerInitOrder::None)
            .with_container_order_reorder(ContainerReorder::Capacity)
            .with_container_open_by_piece_ratio(0.01);
        let supply = ContainerOrderSupply::new(&instance, &config);
        assert_eq!(supply.open_containers(), &[0]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(supply.reorder(&[1, 2, 0], 0, &instance, &mut rng), vec![0, 2, 1]);
    }

    #[test]
    fn test_random_reorder_keeps_open_first() {
        let instance = instance(&[2.0, 2.0, 2.0, 2.0]);
        let config = Config::default()
            .with_container_order_init(ContainerInitOrder::None)
            .with_container_order_reorder(ContainerReorder::Random)
            .with_container_open_by_piece_ratio(2.0);
        let supply = ContainerOrderSupply::new(&instance, &config);
        assert_eq!(supply.open_containers(), &[0, 1]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let order = supply.reorder(&[0, 1, 2, 3], 0, &instance, &mut rng);
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec![0, 1, 2, 3]);
            assert!(order[..2].iter().all(|c| supply.is_open(*c)));
            assert_eq!(&order[2..], &[3, 2]);
        }
    }

    #[test]
    fn test_capacity_reorder_uses_mesh_volume() {
        let obstacle = Piece::obstacle(50, Vector3::zeros(), 0)
            .unwrap()
            .with_component(Vector3::zeros(), Vector3::new(10.0, 10.0, 5.0))
            .unwrap();
        let mut instance = Instance::new("mesh")
            .with_container(
                Container::new(0, 10.0, 10.0, 10.0)
                    .unwrap()
                    .with_virtual_piece(obstacle)
                    .unwrap(),
            )
            .unwrap()
            .with_container(Container::new(1, 9.0, 9.0, 9.0).unwrap())
            .unwrap();
        instance.seal(&ClippingOracle).unwrap();
        // Usable 500 vs 729, mesh 1000 vs 729.
        assert!(instance.containers()[0].volume() < instance.containers()[1].volume());
        let config = Config::default()
            .with_container_order_init(ContainerInitOrder::None)
            .with_container_order_reorder(ContainerReorder::Capacity);
        let supply = ContainerOrderSupply::new(&instance, &config);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(supply.reorder(&[1, 0], 0, &instance, &mut rng), vec![0, 1]);
    }

    #[test]
    fn test_round_robin_without_open_yields_reserve() {
        let instance = instance(&[1.0, 2.0]);
        let config = Config::default().with_container_order_reorder(ContainerReorder::RoundRobin);
        let supply = ContainerOrderSupply::new(&instance, &config);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(supply.reorder(&[], 25, &instance, &mut rng), vec![1, 0]);
    }

    #[test]
    fn test_piece_comparators() {
        let tall = Piece::cuboid(1, 1.0, 1.0, 5.0).unwrap();
        let big = Piece::cuboid(2, 3.0, 3.0, 3.0).unwrap();
        let twin = Piece::cuboid(3, 3.0, 3.0, 3.0).unwrap();
        let mut pieces = [tall, big, twin];
        for p in &mut pieces {
            p.seal().unwrap();
        }
        let [tall, big, twin] = &pieces;
        assert_eq!(compare_pieces(PieceOrder::Volume, big, tall), Ordering::Less);
        assert_eq!(compare_pieces(PieceOrder::HeightThenVolume, tall, big), Ordering::Less);
        assert_eq!(compare_pieces(PieceOrder::Volume, big, twin), Ordering::Less);
        assert_eq!(compare_pieces(PieceOrder::Volume, twin, big), Ordering::Greater);
        assert_eq!(compare_pieces(PieceOrder::AreaThenHeight, big, big), Ordering::Equal);
    }
}
