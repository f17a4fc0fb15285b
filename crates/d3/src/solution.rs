//! Incrementally maintained packing state.
//!
//! A [`Solution`] addresses pieces and containers by the dense volatile ids fixed when
//! the [`Instance`] was sealed and keeps every per-piece attribute in index-aligned
//! vectors. Obstacles occupy the slots after the packable pieces and are placed once,
//! at construction.
//!
//! Sealed geometry is shared through an [`Arc`]; cloning a solution copies only the
//! mutable state, so clones can be explored on separate threads without locking.

use crate::extreme_point::{box_candidates, ExtremePoint, ExtremePointSet};
use crate::geometry::ComponentsSet;
use crate::instance::Instance;
use crate::ordering::ContainerOrderSupply;
use crate::piece::MaterialClass;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use stowage_core::transform::check_orientation;
use stowage_core::{
    Config, ContainerStats, Error, ObjectiveType, PackingSummary, Placement, Result,
};

/// Running aggregates of one container.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContainerInfo {
    /// Volume accounted to the packed pieces (component or bounding-box volume).
    pub volume_contained: f64,
    /// Weight of the packed pieces.
    pub weight_contained: f64,
    /// Number of packed pieces.
    pub piece_count: usize,
    /// Highest z reached by a packed piece.
    pub packing_height: f64,
}

/// Packing state over a sealed instance.
#[derive(Debug, Clone)]
pub struct Solution {
    pub(crate) instance: Arc<Instance>,
    pub(crate) config: Config,
    pub(crate) rng: StdRng,

    contained: BTreeSet<usize>,
    offloaded: BTreeSet<usize>,
    pub(crate) orientations: Vec<usize>,
    pub(crate) positions: Vec<Vector3<f64>>,
    pub(crate) container_of: Vec<Option<usize>>,
    pub(crate) container_content: Vec<BTreeSet<usize>>,

    pub(crate) materials: Vec<[usize; MaterialClass::COUNT]>,
    flag_counts: Vec<BTreeMap<(i32, i32), usize>>,
    flag_values: Vec<BTreeMap<i32, BTreeSet<i32>>>,
    pub(crate) infos: Vec<ContainerInfo>,
    volume_objective: f64,

    pub(crate) extreme_points: ExtremePointSet,
    pub(crate) packing_max_x: Vec<f64>,
    pub(crate) packing_max_y: Vec<f64>,
    pub(crate) level_packing_c: f64,
    pub(crate) container_order: ContainerOrderSupply,
}

impl Solution {
    /// Creates the all-offloaded state for a sealed instance.
    pub fn new(instance: Arc<Instance>, config: Config) -> Result<Self> {
        if !instance.is_sealed() {
            return Err(Error::NotSealed(format!("instance {}", instance.name())));
        }
        let slots = instance.slot_count();
        let containers = instance.containers().len();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let extents = instance.containers().iter().map(|c| *c.extent()).collect();
        let container_order = ContainerOrderSupply::new(&instance, &config);

        let mut solution = Self {
            extreme_points: ExtremePointSet::new(extents, config.merit_type.tracks_residual_space()),
            config,
            rng,
            contained: BTreeSet::new(),
            offloaded: (0..instance.piece_count()).collect(),
            orientations: vec![0; slots],
            positions: vec![Vector3::zeros(); slots],
            container_of: vec![None; slots],
            container_content: vec![BTreeSet::new(); containers],
            materials: vec![[0; MaterialClass::COUNT]; containers],
            flag_counts: vec![BTreeMap::new(); containers],
            flag_values: vec![BTreeMap::new(); containers],
            infos: vec![ContainerInfo::default(); containers],
            volume_objective: 0.0,
            packing_max_x: vec![0.0; containers],
            packing_max_y: vec![0.0; containers],
            level_packing_c: Self::level_packing_constant(&instance),
            container_order,
            instance,
        };

        for (slot, c) in solution.instance.virtual_piece_ids().collect::<Vec<_>>() {
            let piece = solution.instance.piece(slot)?;
            if let Some(obstacle) = piece.obstacle_info() {
                solution.orientations[slot] = obstacle.orientation;
                solution.positions[slot] = obstacle.position;
                solution.container_of[slot] = Some(c);
            }
        }
        solution.generate_default_extreme_points()?;

        log::debug!(
            "solution over {} created: {} pieces, {} containers, merit {}",
            solution.instance.name(),
            solution.instance.piece_count(),
            containers,
            solution.config.merit_type
        );
        Ok(solution)
    }

    /// One more than the largest mesh length or width over all containers.
    fn level_packing_constant(instance: &Instance) -> f64 {
        instance
            .containers()
            .iter()
            .map(|c| c.mesh().length().max(c.mesh().width()))
            .fold(0.0, f64::max)
            + 1.0
    }

    /// Replaces the random source with one seeded from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// The instance this solution is defined over.
    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Container order and open-container selection.
    pub fn container_order_supply(&self) -> &ContainerOrderSupply {
        &self.container_order
    }

    /// Container processing order for the step handling piece number `piece_counter`.
    pub fn container_order(&mut self, piece_counter: usize) -> Vec<usize> {
        self.container_order.reorder(
            self.container_order.init_order(),
            piece_counter,
            &self.instance,
            &mut self.rng,
        )
    }

    fn check_container(&self, container: usize) -> Result<()> {
        self.instance.container(container).map(|_| ())
    }

    fn piece_contribution(&self, piece: usize) -> Result<f64> {
        let piece = self.instance.variable_piece(piece)?;
        Ok(if self.config.tetris {
            piece.volume()
        } else {
            piece.bounding_volume()
        })
    }

    /// Places packable piece `piece` into `container` at `position` in `orientation`.
    pub fn add(
        &mut self,
        container: usize,
        piece: usize,
        orientation: usize,
        position: Vector3<f64>,
    ) -> Result<()> {
        self.check_container(container)?;
        check_orientation(orientation)?;
        let instance = Arc::clone(&self.instance);
        let item = instance.variable_piece(piece)?;
        if !position.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "non-finite position for piece {}",
                item.id()
            )));
        }
        if let Some(current) = self.container_of[piece] {
            return Err(Error::Precondition(format!(
                "piece {} is already packed in container {}",
                item.id(),
                instance.containers()[current].id()
            )));
        }

        let extent = item.variant(orientation).extent();
        let volume = self.piece_contribution(piece)?;

        self.volume_objective += volume;
        let info = &mut self.infos[container];
        info.volume_contained += volume;
        info.weight_contained += item.weight();
        info.piece_count += 1;
        info.packing_height = info.packing_height.max(position.z + extent.z);
        self.materials[container][item.material().index()] += 1;
        for (flag, value) in item.flags() {
            *self.flag_counts[container].entry((flag, value)).or_insert(0) += 1;
            self.flag_values[container].entry(flag).or_default().insert(value);
        }

        self.contained.insert(piece);
        self.offloaded.remove(&piece);
        self.container_content[container].insert(piece);
        self.orientations[piece] = orientation;
        self.positions[piece] = position;
        self.container_of[piece] = Some(container);

        if self.config.merit_type.tracks_packing_extent() {
            self.packing_max_x[container] = self.packing_max_x[container].max(position.x + extent.x);
            self.packing_max_y[container] = self.packing_max_y[container].max(position.y + extent.y);
        }
        if self.config.merit_type.tracks_residual_space() {
            if self.config.tetris {
                for component in item.variant(orientation).components() {
                    let anchor = position + component.rel_position();
                    self.extreme_points.tighten(container, &anchor, component.size());
                }
            } else {
                self.extreme_points.tighten(container, &position, &extent);
            }
        }

        log::trace!(
            "added piece {} to container {} at ({:.3}, {:.3}, {:.3}) orientation {}",
            item.id(),
            instance.containers()[container].id(),
            position.x,
            position.y,
            position.z,
            orientation
        );
        Ok(())
    }

    fn ensure_packed_in(&self, container: usize, piece: usize) -> Result<()> {
        self.check_container(container)?;
        let item = self.instance.variable_piece(piece)?;
        if self.container_of[piece] != Some(container) {
            return Err(Error::Precondition(format!(
                "piece {} is not packed in container {}",
                item.id(),
                self.instance.containers()[container].id()
            )));
        }
        Ok(())
    }

    /// Unassigns one piece's bookkeeping except the container's height.
    fn detach(&mut self, container: usize, piece: usize) -> Result<Vector3<f64>> {
        let instance = Arc::clone(&self.instance);
        let item = instance.variable_piece(piece)?;
        let volume = self.piece_contribution(piece)?;

        self.volume_objective -= volume;
        let info = &mut self.infos[container];
        info.volume_contained -= volume;
        info.weight_contained -= item.weight();
        info.piece_count -= 1;
        let material = &mut self.materials[container][item.material().index()];
        *material = material.saturating_sub(1);
        for (flag, value) in item.flags() {
            self.remove_flag(container, flag, value);
        }

        self.contained.remove(&piece);
        self.offloaded.insert(piece);
        let position = self.positions[piece];
        self.orientations[piece] = 0;
        self.positions[piece] = Vector3::zeros();
        self.container_of[piece] = None;
        Ok(position)
    }

    fn remove_flag(&mut self, container: usize, flag: i32, value: i32) {
        let counts = &mut self.flag_counts[container];
        let remaining = match counts.get_mut(&(flag, value)) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            counts.remove(&(flag, value));
            if let Some(values) = self.flag_values[container].get_mut(&flag) {
                values.remove(&value);
                if values.is_empty() {
                    self.flag_values[container].remove(&flag);
                }
            }
        }
    }

    /// Removes `piece` from `container` and returns the position it occupied.
    ///
    /// When the piece determined the container's packing height, the height is
    /// recomputed from the remaining content.
    pub fn remove(&mut self, container: usize, piece: usize) -> Result<Vector3<f64>> {
        self.ensure_packed_in(container, piece)?;
        let top = self.positions[piece].z
            + self.instance.pieces()[piece]
                .variant(self.orientations[piece])
                .extent()
                .z;
        let position = self.detach(container, piece)?;
        self.container_content[container].remove(&piece);

        if top >= self.infos[container].packing_height {
            let pieces = self.instance.pieces();
            self.infos[container].packing_height = self.container_content[container]
                .iter()
                .map(|&p| self.positions[p].z + pieces[p].variant(self.orientations[p]).extent().z)
                .fold(0.0, f64::max);
        }
        log::trace!(
            "removed piece {} from container {}",
            self.instance.pieces()[piece].id(),
            self.instance.containers()[container].id()
        );
        Ok(position)
    }

    /// Removes every piece of one container.
    pub fn remove_container(&mut self, container: usize) -> Result<()> {
        self.check_container(container)?;
        let content: Vec<usize> = self.container_content[container].iter().copied().collect();
        if let Some(&stray) = content
            .iter()
            .find(|&&piece| self.container_of[piece] != Some(container))
        {
            return Err(Error::Internal(format!(
                "content of container {} lists piece {} placed elsewhere",
                container,
                self.instance.pieces()[stray].id()
            )));
        }
        for &piece in &content {
            self.detach(container, piece)?;
            self.container_content[container].remove(&piece);
        }
        self.infos[container] = ContainerInfo::default();
        log::trace!(
            "emptied container {} ({} pieces)",
            self.instance.containers()[container].id(),
            content.len()
        );
        Ok(())
    }

    /// Resets to the all-offloaded state and regenerates the default extreme points.
    pub fn clear(&mut self) -> Result<()> {
        let instance = Arc::clone(&self.instance);
        self.contained.clear();
        self.offloaded = (0..instance.piece_count()).collect();
        for piece in 0..instance.piece_count() {
            self.orientations[piece] = 0;
            self.positions[piece] = Vector3::zeros();
            self.container_of[piece] = None;
        }
        for c in 0..instance.containers().len() {
            self.container_content[c].clear();
            self.materials[c] = [0; MaterialClass::COUNT];
            self.flag_counts[c].clear();
            self.flag_values[c].clear();
            self.infos[c] = ContainerInfo::default();
            self.packing_max_x[c] = 0.0;
            self.packing_max_y[c] = 0.0;
        }
        self.volume_objective = 0.0;
        self.level_packing_c = Self::level_packing_constant(&instance);
        self.extreme_points.clear();
        self.generate_default_extreme_points()?;
        log::debug!("solution over {} cleared", instance.name());
        Ok(())
    }

    // ---- extreme points ----

    /// Origin of every container, then the points of obstacles and packed pieces, then
    /// the slant edge intersections.
    fn generate_default_extreme_points(&mut self) -> Result<()> {
        let containers = self.instance.containers().len();
        for c in 0..containers {
            self.extreme_points.add(c, Vector3::zeros())?;
        }
        let virtuals: Vec<(usize, usize)> = self.instance.virtual_piece_ids().collect();
        for (slot, c) in virtuals {
            self.generate_extreme_points(c, slot)?;
        }
        let placed: Vec<(usize, usize)> = self
            .contained
            .iter()
            .filter_map(|&p| self.container_of[p].map(|c| (c, p)))
            .collect();
        for (c, p) in placed {
            self.generate_extreme_points(c, p)?;
        }
        let instance = Arc::clone(&self.instance);
        for (c, container) in instance.containers().iter().enumerate() {
            for slant in container.slants().iter().filter(|s| s.exposes_corners()) {
                self.extreme_points
                    .add_all(c, slant.container_intersections().iter().copied())?;
            }
        }
        Ok(())
    }

    fn placed_shape(&self, container: usize, slot: usize) -> Result<(&ComponentsSet, Vector3<f64>)> {
        let piece = self.instance.piece(slot)?;
        if self.container_of.get(slot).copied().flatten() != Some(container) {
            return Err(Error::Precondition(format!(
                "piece {} is not placed in container volatile id {}",
                piece.id(),
                container
            )));
        }
        Ok((piece.variant(self.orientations[slot]), self.positions[slot]))
    }

    /// Boxes (origin, extent) a placed piece contributes to extreme-point generation.
    fn contributing_boxes(&self, container: usize, slot: usize) -> Result<Vec<(Vector3<f64>, Vector3<f64>)>> {
        let (shape, position) = self.placed_shape(container, slot)?;
        Ok(if self.config.tetris {
            shape
                .components()
                .iter()
                .map(|c| (position + c.rel_position(), *c.size()))
                .collect()
        } else {
            vec![(position, shape.extent())]
        })
    }

    /// Adds the six candidate points of every contributing box of `slot`, which must be
    /// placed in `container` (packable piece or obstacle).
    pub fn generate_extreme_points(&mut self, container: usize, slot: usize) -> Result<()> {
        for (origin, extent) in self.contributing_boxes(container, slot)? {
            self.extreme_points
                .add_all(container, box_candidates(&origin, &extent))?;
        }
        Ok(())
    }

    /// Candidate points of `slot` projected back along their zeroed axis until they hit
    /// another piece's bounding box or a slant.
    ///
    /// Read-only; equal consecutive pairs are reported once.
    pub fn projected_extreme_points(&self, container: usize, slot: usize) -> Result<Vec<Vector3<f64>>> {
        let (shape, position) = self.placed_shape(container, slot)?;
        let extent = shape.extent();
        let mesh = *self.instance.container(container)?.extent();
        let others: Vec<(Vector3<f64>, Vector3<f64>)> = self
            .pieces_in(container)
            .filter(|&other| other != slot)
            .filter_map(|other| {
                self.instance.piece(other).ok().map(|p| {
                    let inner = self.positions[other];
                    (inner, inner + p.variant(self.orientations[other]).extent())
                })
            })
            .collect();
        let slants = self.instance.container(container)?.slants();

        // (candidate, projection axis)
        let candidates = box_candidates(&position, &extent);
        let axes = [1, 2, 0, 2, 0, 1];
        let mut result: Vec<Vector3<f64>> = Vec::with_capacity(6);
        for (i, (mut ep, axis)) in candidates.into_iter().zip(axes).enumerate() {
            let (a, b) = match axis {
                0 => (1, 2),
                1 => (0, 2),
                _ => (0, 1),
            };
            let block = others
                .iter()
                .filter(|(inner, outer)| {
                    outer[axis] <= position[axis]
                        && ep[a] >= inner[a]
                        && ep[a] <= outer[a]
                        && ep[b] >= inner[b]
                        && ep[b] <= outer[b]
                })
                .map(|(_, outer)| outer[axis])
                .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))));
            if let Some(stop) = block {
                ep[axis] = stop;
            }
            for slant in slants {
                let hit = match axis {
                    0 => slant.project_x(ep.y, ep.z),
                    1 => slant.project_y(ep.x, ep.z),
                    _ => slant.project_z(ep.x, ep.y),
                };
                if hit >= 0.0 && hit < mesh[axis] && (hit < ep[axis] || block.is_none()) {
                    ep[axis] = hit;
                }
            }
            if i % 2 == 1 && result.last() == Some(&ep) {
                continue;
            }
            result.push(ep);
        }
        Ok(result)
    }

    /// Places `piece` at `ep`, generates its extreme points and drops the used point.
    pub fn insert(
        &mut self,
        container: usize,
        piece: usize,
        orientation: usize,
        ep: &ExtremePoint,
    ) -> Result<()> {
        self.add(container, piece, orientation, ep.position)?;
        self.generate_extreme_points(container, piece)?;
        self.extreme_points.remove(container, ep)?;
        Ok(())
    }

    /// Extreme points of one container.
    pub fn extreme_points(&self, container: usize) -> &[ExtremePoint] {
        self.extreme_points.points(container)
    }

    /// All extreme points with their residual-space bookkeeping.
    pub fn extreme_point_set(&self) -> &ExtremePointSet {
        &self.extreme_points
    }

    /// Appends an extreme point.
    pub fn add_extreme_point(&mut self, container: usize, position: Vector3<f64>) -> Result<ExtremePoint> {
        self.extreme_points.add(container, position)
    }

    /// Removes the first extreme point equal to `ep`.
    pub fn remove_extreme_point(&mut self, container: usize, ep: &ExtremePoint) -> Result<bool> {
        self.extreme_points.remove(container, ep)
    }

    /// Drops every extreme point of one container.
    pub fn clear_extreme_points(&mut self, container: usize) -> Result<()> {
        self.extreme_points.clear_container(container)
    }

    /// Prunes one container's extreme points; see [`ExtremePointSet::prune`].
    pub fn prune_extreme_points(&mut self, container: usize, exhaustive: bool) -> Result<()> {
        self.extreme_points.prune(container, exhaustive)
    }

    // ---- read-only state ----

    /// Volatile ids of the packed pieces.
    pub fn contained_pieces(&self) -> &BTreeSet<usize> {
        &self.contained
    }

    /// Volatile ids of the unpacked pieces.
    pub fn offloaded_pieces(&self) -> &BTreeSet<usize> {
        &self.offloaded
    }

    /// Packed pieces of one container.
    pub fn container_content(&self, container: usize) -> Result<&BTreeSet<usize>> {
        self.container_content.get(container).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown container volatile id {}", container))
        })
    }

    /// Slots placed in `container`: packed pieces, then obstacles.
    pub(crate) fn pieces_in(&self, container: usize) -> impl Iterator<Item = usize> + '_ {
        self.container_content
            .get(container)
            .into_iter()
            .flatten()
            .copied()
            .chain(
                self.instance
                    .virtual_piece_ids()
                    .filter(move |(_, c)| *c == container)
                    .map(|(slot, _)| slot),
            )
    }

    /// Container a slot is placed in.
    pub fn container_of(&self, slot: usize) -> Option<usize> {
        self.container_of.get(slot).copied().flatten()
    }

    /// Orientation of a placed slot.
    pub fn orientation(&self, slot: usize) -> Option<usize> {
        self.container_of(slot).map(|_| self.orientations[slot])
    }

    /// Position of a placed slot.
    pub fn position(&self, slot: usize) -> Option<Vector3<f64>> {
        self.container_of(slot).map(|_| self.positions[slot])
    }

    /// Aggregates of one container.
    pub fn container_info(&self, container: usize) -> Result<&ContainerInfo> {
        self.infos.get(container).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown container volatile id {}", container))
        })
    }

    /// Number of packed pieces of `material` in `container`.
    pub fn material_count(&self, container: usize, material: MaterialClass) -> usize {
        self.materials
            .get(container)
            .map_or(0, |m| m[material.index()])
    }

    /// Values of `flag` present in `container`.
    pub fn flag_values_contained(&self, container: usize, flag: i32) -> Option<&BTreeSet<i32>> {
        self.flag_values.get(container).and_then(|f| f.get(&flag))
    }

    /// Number of pieces in `container` carrying `flag = value`.
    pub fn flag_pieces_contained(&self, container: usize, flag: i32, value: i32) -> usize {
        self.flag_counts
            .get(container)
            .and_then(|f| f.get(&(flag, value)))
            .copied()
            .unwrap_or(0)
    }

    /// Running maximum packing extent (x, y) of a container.
    pub fn packing_extent(&self, container: usize) -> Option<(f64, f64)> {
        Some((
            *self.packing_max_x.get(container)?,
            *self.packing_max_y.get(container)?,
        ))
    }

    /// Objective value under the configured objective type.
    ///
    /// `MaxVolume` is the accumulated contributed volume. `MaxDensity` penalizes
    /// offloaded pieces by `2M`, used containers by `M` and the relative packing height
    /// of every container, with `M` the largest container height.
    pub fn objective_value(&self) -> f64 {
        match self.config.objective {
            ObjectiveType::MaxVolume => self.volume_objective,
            ObjectiveType::MaxDensity => {
                let containers = self.instance.containers();
                let big_m = containers
                    .iter()
                    .map(|c| c.extent().z)
                    .fold(0.0, f64::max);
                let relative_height: f64 = containers
                    .iter()
                    .zip(&self.infos)
                    .map(|(c, info)| info.packing_height / c.extent().z)
                    .sum();
                -(self.offloaded.len() as f64) * big_m * 2.0
                    - self.containers_in_use() as f64 * big_m
                    - relative_height
            }
        }
    }

    /// Component volume of all packed pieces.
    pub fn volume_contained(&self) -> f64 {
        let pieces = self.instance.pieces();
        self.contained.iter().map(|&p| pieces[p].volume()).sum()
    }

    /// Usable volume of all containers.
    pub fn volume_of_containers(&self) -> f64 {
        self.instance.containers().iter().map(|c| c.volume()).sum()
    }

    /// Usable volume of the containers holding at least one piece.
    pub fn volume_of_containers_in_use(&self) -> f64 {
        self.instance
            .containers()
            .iter()
            .zip(&self.container_content)
            .filter(|(_, content)| !content.is_empty())
            .map(|(c, _)| c.volume())
            .sum()
    }

    /// Number of containers holding at least one piece.
    pub fn containers_in_use(&self) -> usize {
        self.container_content.iter().filter(|c| !c.is_empty()).count()
    }

    /// Number of packed pieces.
    pub fn pieces_packed(&self) -> usize {
        self.contained.len()
    }

    /// Contained volume relative to the container's usable volume.
    pub fn utilization(&self, container: usize) -> Result<f64> {
        let volume = self.instance.container(container)?.volume();
        let info = self.container_info(container)?;
        Ok(if volume > 0.0 {
            info.volume_contained / volume
        } else {
            0.0
        })
    }

    /// Placements of all packed pieces, by container then piece volatile id.
    pub fn placements(&self) -> Vec<Placement> {
        let containers = self.instance.containers();
        let pieces = self.instance.pieces();
        self.container_content
            .iter()
            .enumerate()
            .flat_map(|(c, content)| {
                content.iter().map(move |&p| {
                    Placement::new(
                        pieces[p].id(),
                        containers[c].id(),
                        self.orientations[p],
                        self.positions[p],
                    )
                })
            })
            .collect()
    }

    /// Snapshot for reporting layers.
    pub fn summary(&self) -> PackingSummary {
        let pieces = self.instance.pieces();
        PackingSummary {
            placements: self.placements(),
            offloaded: self.offloaded.iter().map(|&p| pieces[p].id()).collect(),
            containers: self
                .instance
                .containers()
                .iter()
                .zip(&self.infos)
                .map(|(c, info)| ContainerStats {
                    container_id: c.id(),
                    volume: c.volume(),
                    volume_contained: info.volume_contained,
                    weight_contained: info.weight_contained,
                    piece_count: info.piece_count,
                    packing_height: info.packing_height,
                })
                .collect(),
            objective: self.objective_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::oracle::ClippingOracle;
    use crate::piece::Piece;
    use crate::slant::Slant;
    use approx::assert_relative_eq;
    use stowage_core::MeritType;

    fn instance() -> Arc<Instance> {
        let mut instance = Instance::new("unit")
            .with_piece(Piece::cuboid(10, 4.0, 3.0, 2.0).unwrap().with_weight(5.0).with_flag(1, 7))
            .unwrap()
            .with_piece(Piece::cuboid(11, 2.0, 2.0, 2.0).unwrap().with_weight(1.0).with_flag(1, 7))
            .unwrap()
            .with_container(Container::new(0, 10.0, 10.0, 10.0).unwrap())
            .unwrap()
            .with_container(Container::new(1, 5.0, 5.0, 5.0).unwrap())
            .unwrap();
        instance.seal(&ClippingOracle).unwrap();
        Arc::new(instance)
    }

    fn solution(config: Config) -> Solution {
        Solution::new(instance(), config.with_seed(3)).unwrap()
    }

    #[test]
    fn test_default_extreme_points() {
        let s = solution(Config::default());
        assert_eq!(s.extreme_points(0), &[ExtremePoint::new(0.0, 0.0, 0.0)]);
        assert_eq!(s.extreme_points(1).len(), 1);
        assert_eq!(s.offloaded_pieces().len(), 2);
    }

    #[test]
    fn test_requires_sealed_instance() {
        let instance = Arc::new(Instance::new("raw"));
        assert!(matches!(
            Solution::new(instance, Config::default()),
            Err(Error::NotSealed(_))
        ));
    }

    #[test]
    fn test_add_updates_aggregates() {
        let mut s = solution(Config::default());
        s.add(0, 0, 0, Vector3::new(0.0, 0.0, 1.0)).unwrap();
        let info = s.container_info(0).unwrap();
        assert_relative_eq!(info.volume_contained, 24.0);
        assert_relative_eq!(info.weight_contained, 5.0);
        assert_eq!(info.piece_count, 1);
        assert_relative_eq!(info.packing_height, 3.0);
        assert_eq!(s.flag_pieces_contained(0, 1, 7), 1);
        assert!(s.flag_values_contained(0, 1).unwrap().contains(&7));
        assert_eq!(s.material_count(0, MaterialClass::Default), 1);
        assert_relative_eq!(s.objective_value(), 24.0);
    }

    #[test]
    fn test_add_twice_is_precondition_error() {
        let mut s = solution(Config::default());
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        assert!(matches!(
            s.add(1, 0, 0, Vector3::zeros()),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(s.remove(1, 0), Err(Error::Precondition(_))));
        assert!(matches!(s.remove(0, 1), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_remove_rescans_height() {
        let mut s = solution(Config::default());
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        s.add(0, 1, 0, Vector3::new(0.0, 0.0, 2.0)).unwrap();
        assert_relative_eq!(s.container_info(0).unwrap().packing_height, 4.0);
        let position = s.remove(0, 1).unwrap();
        assert_eq!(position, Vector3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(s.container_info(0).unwrap().packing_height, 2.0);
        assert_eq!(s.flag_pieces_contained(0, 1, 7), 1);
        s.remove(0, 0).unwrap();
        assert!(s.flag_values_contained(0, 1).is_none());
        assert_relative_eq!(s.container_info(0).unwrap().packing_height, 0.0);
    }

    #[test]
    fn test_remove_container() {
        let mut s = solution(Config::default());
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        s.add(0, 1, 0, Vector3::new(4.0, 0.0, 0.0)).unwrap();
        s.remove_container(0).unwrap();
        assert_eq!(*s.container_info(0).unwrap(), ContainerInfo::default());
        assert_eq!(s.offloaded_pieces().len(), 2);
        assert_eq!(s.flag_pieces_contained(0, 1, 7), 0);
        assert_relative_eq!(s.objective_value(), 0.0);
        assert_eq!(s.containers_in_use(), 0);
    }

    #[test]
    fn test_remove_container_rejects_inconsistent_content() {
        let mut s = solution(Config::default());
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        s.add(1, 1, 0, Vector3::zeros()).unwrap();
        s.container_content[0].insert(1);
        assert!(matches!(s.remove_container(0), Err(Error::Internal(_))));
        assert_eq!(s.container_of(0), Some(0));
        assert!(s.container_content(0).unwrap().contains(&0));
        assert_eq!(s.container_info(0).unwrap().piece_count, 1);
        assert_eq!(s.pieces_packed(), 2);
    }

    #[test]
    fn test_level_packing_constant_follows_containers() {
        let s = solution(Config::default().with_merit_type(MeritType::LevelPackingXY));
        // Containers 10 x 10 x 10 and 5 x 5 x 5.
        assert_relative_eq!(s.level_packing_c, 11.0);
    }

    #[test]
    fn test_clear_restores_default_state() {
        let mut s = solution(Config::default().with_merit_type(MeritType::MaxExtentXY));
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        s.generate_extreme_points(0, 0).unwrap();
        assert_eq!(s.packing_extent(0), Some((4.0, 3.0)));
        s.clear().unwrap();
        assert_eq!(s.pieces_packed(), 0);
        assert_eq!(s.packing_extent(0), Some((0.0, 0.0)));
        assert_eq!(s.extreme_points(0).len(), 1);
        assert_relative_eq!(s.level_packing_c, 11.0);
    }

    #[test]
    fn test_generate_extreme_points() {
        let mut s = solution(Config::default());
        s.add(0, 0, 0, Vector3::new(1.0, 1.0, 1.0)).unwrap();
        s.generate_extreme_points(0, 0).unwrap();
        let points: Vec<_> = s.extreme_points(0).iter().map(ExtremePoint::pos).collect();
        assert_eq!(
            points,
            vec![
                (0.0, 0.0, 0.0),
                (5.0, 0.0, 1.0),
                (5.0, 1.0, 0.0),
                (0.0, 4.0, 1.0),
                (1.0, 4.0, 0.0),
                (0.0, 1.0, 3.0),
                (1.0, 0.0, 3.0),
            ]
        );
        assert!(s.generate_extreme_points(1, 0).is_err());
    }

    #[test]
    fn test_insert_consumes_point() {
        let mut s = solution(Config::default());
        let origin = s.extreme_points(0)[0];
        s.insert(0, 0, 0, &origin).unwrap();
        assert_eq!(s.extreme_points(0).len(), 6);
        assert!(!s.extreme_points(0).contains(&origin));
    }

    #[test]
    fn test_projected_points_stop_at_blocking_piece() {
        let mut s = solution(Config::default());
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        s.add(0, 1, 0, Vector3::new(0.0, 0.0, 2.0)).unwrap();
        let points = s.projected_extreme_points(0, 1).unwrap();
        // ep12 = (2, 0, 2) drops onto the top of the 4 x 3 x 2 box.
        assert!(points.contains(&Vector3::new(2.0, 0.0, 2.0)));
        // ep22 = (0, 2, 0) lands on that box too: z = 2.
        assert!(points.contains(&Vector3::new(0.0, 2.0, 2.0)));
    }

    #[test]
    fn test_slant_points_are_default_points() {
        let slant = Slant::new(Vector3::new(0.0, 4.0, 0.0), Vector3::new(0.0, 1.0, -1.0)).unwrap();
        let mut instance = Instance::new("slanted")
            .with_container(Container::new(0, 6.0, 6.0, 6.0).unwrap().with_slant(slant).unwrap())
            .unwrap();
        instance.seal(&ClippingOracle).unwrap();
        let s = Solution::new(Arc::new(instance), Config::default()).unwrap();
        let intersections = s.instance().containers()[0].slants()[0]
            .container_intersections()
            .len();
        assert!(intersections > 0);
        assert_eq!(s.extreme_points(0).len(), 1 + intersections);
    }

    #[test]
    fn test_max_density_objective() {
        let mut s = solution(Config::default().with_objective(ObjectiveType::MaxDensity));
        // M = 10: two offloaded pieces.
        assert_relative_eq!(s.objective_value(), -40.0);
        s.add(0, 0, 0, Vector3::zeros()).unwrap();
        assert_relative_eq!(s.objective_value(), -20.0 - 10.0 - 0.2);
    }

    #[test]
    fn test_summary() {
        let mut s = solution(Config::default());
        s.add(1, 1, 3, Vector3::zeros()).unwrap();
        let summary = s.summary();
        assert_eq!(summary.placements.len(), 1);
        assert_eq!(summary.placements[0].piece_id, 11);
        assert_eq!(summary.placements[0].container_id, 1);
        assert_eq!(summary.offloaded, vec![10]);
        assert_eq!(summary.containers[1].piece_count, 1);
        assert_relative_eq!(s.utilization(1).unwrap(), 8.0 / 125.0);
    }
}
