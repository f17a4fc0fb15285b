//! Packing configuration.
//!
//! A [`Config`] selects the accounting mode (Tetris or bounding box), the merit
//! function used to rank placements, the ordering heuristics that feed the search
//! driver and the constraint families that feasibility checks honour.
//!
//! Every selector enum parses from its name (case-insensitive) or its short code,
//! e.g. `"LevelPackingXY"` or `"LPXY"`. Unknown names are a configuration error.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Scalar rule used to rank candidate placements (lower is better).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeritType {
    /// Constant zero; only the open-container bias applies.
    #[default]
    None,
    /// Free volume left in the container after the insertion.
    FreeVolume,
    /// Growth of the maximal packing extent in X and Y.
    MaxExtentXY,
    /// Like [`MeritType::MaxExtentXY`] but overshooting the footprint is weighted heavily.
    LevelPackingXY,
    /// Consumption of the residual space tracked at the extreme point.
    ResidualSpace,
    /// Distance of the far corner from the origin.
    EuclideanXYZ,
    /// Distance of the far corner from the origin, in the XY plane only.
    EuclideanXY,
    /// Height of the far corner.
    Height,
}

impl MeritType {
    /// All merit types in declaration order.
    pub const ALL: [MeritType; 8] = [
        MeritType::None,
        MeritType::FreeVolume,
        MeritType::MaxExtentXY,
        MeritType::LevelPackingXY,
        MeritType::ResidualSpace,
        MeritType::EuclideanXYZ,
        MeritType::EuclideanXY,
        MeritType::Height,
    ];

    /// Short code of the merit function.
    pub fn code(&self) -> &'static str {
        match self {
            MeritType::None => "None",
            MeritType::FreeVolume => "MFV",
            MeritType::MaxExtentXY => "MMPSXY",
            MeritType::LevelPackingXY => "LPXY",
            MeritType::ResidualSpace => "MRSU",
            MeritType::EuclideanXYZ => "MEDXYZ",
            MeritType::EuclideanXY => "MEDXY",
            MeritType::Height => "H",
        }
    }

    /// Whether the solution has to track max packing extents for this merit.
    pub fn tracks_packing_extent(&self) -> bool {
        matches!(self, MeritType::MaxExtentXY | MeritType::LevelPackingXY)
    }

    /// Whether extreme points need residual space bookkeeping for this merit.
    pub fn tracks_residual_space(&self) -> bool {
        matches!(self, MeritType::ResidualSpace)
    }
}

/// Order in which pieces are handed to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PieceOrder {
    /// Volume.
    #[default]
    Volume,
    /// Bounding box height, then width, then length.
    HeightWidthLength,
    /// Volume, then height.
    VolumeThenHeight,
    /// Height, then volume.
    HeightThenVolume,
    /// Base area (length x width), then height.
    AreaThenHeight,
    /// Height, then base area.
    HeightThenArea,
}

impl PieceOrder {
    /// All piece orders in declaration order.
    pub const ALL: [PieceOrder; 6] = [
        PieceOrder::Volume,
        PieceOrder::HeightWidthLength,
        PieceOrder::VolumeThenHeight,
        PieceOrder::HeightThenVolume,
        PieceOrder::AreaThenHeight,
        PieceOrder::HeightThenArea,
    ];

    /// Short code of the order.
    pub fn code(&self) -> &'static str {
        match self {
            PieceOrder::Volume => "V",
            PieceOrder::HeightWidthLength => "HWL",
            PieceOrder::VolumeThenHeight => "VwH",
            PieceOrder::HeightThenVolume => "HwV",
            PieceOrder::AreaThenHeight => "AwH",
            PieceOrder::HeightThenArea => "HwA",
        }
    }
}

/// Initial container ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContainerInitOrder {
    /// Keep the instance order (containers by id).
    None,
    /// Descending usable volume.
    #[default]
    Capacity,
}

impl ContainerInitOrder {
    /// All init orders in declaration order.
    pub const ALL: [ContainerInitOrder; 2] = [ContainerInitOrder::None, ContainerInitOrder::Capacity];

    /// Short code of the order.
    pub fn code(&self) -> &'static str {
        match self {
            ContainerInitOrder::None => "None",
            ContainerInitOrder::Capacity => "Capacity",
        }
    }
}

/// Per-call container reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContainerReorder {
    /// Identity.
    #[default]
    None,
    /// Descending mesh volume, open containers first.
    Capacity,
    /// Open containers first in random order, then the rest by descending id.
    Random,
    /// Rotate the open containers every ten pieces, reserves appended last.
    RoundRobin,
}

impl ContainerReorder {
    /// All reorder modes in declaration order.
    pub const ALL: [ContainerReorder; 4] = [
        ContainerReorder::None,
        ContainerReorder::Capacity,
        ContainerReorder::Random,
        ContainerReorder::RoundRobin,
    ];

    /// Short code of the mode.
    pub fn code(&self) -> &'static str {
        match self {
            ContainerReorder::None => "None",
            ContainerReorder::Capacity => "Capacity",
            ContainerReorder::Random => "Random",
            ContainerReorder::RoundRobin => "RoundRobin",
        }
    }
}

/// Objective reported by a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObjectiveType {
    /// Packed volume (bounding box or component volume depending on Tetris mode).
    #[default]
    MaxVolume,
    /// Penalises offloaded pieces, used containers and relative packing height.
    MaxDensity,
}

impl ObjectiveType {
    /// All objective types in declaration order.
    pub const ALL: [ObjectiveType; 2] = [ObjectiveType::MaxVolume, ObjectiveType::MaxDensity];

    /// Short code of the objective.
    pub fn code(&self) -> &'static str {
        match self {
            ObjectiveType::MaxVolume => "MaxVolume",
            ObjectiveType::MaxDensity => "MaxDensity",
        }
    }
}

fn parse_named<T: Copy + fmt::Debug>(
    kind: &str,
    input: &str,
    all: &[T],
    code: fn(&T) -> &'static str,
) -> Result<T> {
    let wanted = input.trim();
    all.iter()
        .copied()
        .find(|v| {
            format!("{:?}", v).eq_ignore_ascii_case(wanted) || code(v).eq_ignore_ascii_case(wanted)
        })
        .ok_or_else(|| Error::ConfigError(format!("unknown {}: {:?}", kind, input)))
}

impl FromStr for MeritType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("merit type", s, &MeritType::ALL, MeritType::code)
    }
}

impl FromStr for PieceOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("piece order", s, &PieceOrder::ALL, PieceOrder::code)
    }
}

impl FromStr for ContainerInitOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_named(
            "container init order",
            s,
            &ContainerInitOrder::ALL,
            ContainerInitOrder::code,
        )
    }
}

impl FromStr for ContainerReorder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_named(
            "container reorder type",
            s,
            &ContainerReorder::ALL,
            ContainerReorder::code,
        )
    }
}

impl FromStr for ObjectiveType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("objective type", s, &ObjectiveType::ALL, ObjectiveType::code)
    }
}

impl fmt::Display for MeritType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for PieceOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for ContainerInitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for ContainerReorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for ObjectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Configuration shared by a solution and the heuristics operating on it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Use exact per-component volume and component extreme points.
    pub tetris: bool,

    /// Merit function used by scoring.
    pub merit_type: MeritType,

    /// Piece ordering heuristic.
    pub piece_order: PieceOrder,

    /// Initial container order.
    pub container_order_init: ContainerInitOrder,

    /// Container reorder mode.
    pub container_order_reorder: ContainerReorder,

    /// Objective reported by the solution.
    pub objective: ObjectiveType,

    /// Respect gravity (pieces may not float). Consumed by the driver.
    pub handle_gravity: bool,

    /// Respect material compatibility.
    pub handle_compatibility: bool,

    /// Respect non-stackable pieces. Consumed by the driver.
    pub handle_stackability: bool,

    /// Allow rotations other than orientation 0.
    pub handle_rotatability: bool,

    /// Respect per-piece forbidden orientations.
    pub handle_forbidden_orientations: bool,

    /// Fraction of the total piece volume the open containers have to cover (0 = none).
    pub container_open_by_piece_ratio: f64,

    /// Bias subtracted from the score of open containers.
    pub open_container_big_m: f64,

    /// Seed for the per-solution random source (`None` = entropy).
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tetris: false,
            merit_type: MeritType::default(),
            piece_order: PieceOrder::default(),
            container_order_init: ContainerInitOrder::default(),
            container_order_reorder: ContainerReorder::default(),
            objective: ObjectiveType::default(),
            handle_gravity: true,
            handle_compatibility: true,
            handle_stackability: true,
            handle_rotatability: true,
            handle_forbidden_orientations: true,
            container_open_by_piece_ratio: 0.0,
            open_container_big_m: 1e6,
            seed: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables Tetris mode.
    pub fn with_tetris(mut self, tetris: bool) -> Self {
        self.tetris = tetris;
        self
    }

    /// Sets the merit function.
    pub fn with_merit_type(mut self, merit_type: MeritType) -> Self {
        self.merit_type = merit_type;
        self
    }

    /// Sets the piece order.
    pub fn with_piece_order(mut self, order: PieceOrder) -> Self {
        self.piece_order = order;
        self
    }

    /// Sets the initial container order.
    pub fn with_container_order_init(mut self, order: ContainerInitOrder) -> Self {
        self.container_order_init = order;
        self
    }

    /// Sets the container reorder mode.
    pub fn with_container_order_reorder(mut self, reorder: ContainerReorder) -> Self {
        self.container_order_reorder = reorder;
        self
    }

    /// Sets the objective type.
    pub fn with_objective(mut self, objective: ObjectiveType) -> Self {
        self.objective = objective;
        self
    }

    /// Sets gravity handling.
    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.handle_gravity = enabled;
        self
    }

    /// Sets material compatibility handling.
    pub fn with_compatibility(mut self, enabled: bool) -> Self {
        self.handle_compatibility = enabled;
        self
    }

    /// Sets stackability handling.
    pub fn with_stackability(mut self, enabled: bool) -> Self {
        self.handle_stackability = enabled;
        self
    }

    /// Sets whether pieces may be rotated.
    pub fn with_rotatability(mut self, enabled: bool) -> Self {
        self.handle_rotatability = enabled;
        self
    }

    /// Sets forbidden-orientation handling.
    pub fn with_forbidden_orientations(mut self, enabled: bool) -> Self {
        self.handle_forbidden_orientations = enabled;
        self
    }

    /// Sets the open-container coverage ratio. Negative values are clamped to zero.
    pub fn with_container_open_by_piece_ratio(mut self, ratio: f64) -> Self {
        self.container_open_by_piece_ratio = ratio.max(0.0);
        self
    }

    /// Sets the open-container bias.
    pub fn with_open_container_big_m(mut self, big_m: f64) -> Self {
        self.open_container_big_m = big_m;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
