//! # Stowage 3D
//!
//! Incremental placement engine for packing rigid, possibly multi-box pieces into
//! several containers with slants and fixed obstacles.
//!
//! ## Core Components
//!
//! - **Geometry**: [`MeshCube`], [`ComponentsSet`] and the 24 orientation variants
//! - **Entities**: [`Piece`], [`Container`], [`Slant`], [`FlagRule`] and the sealed [`Instance`]
//! - **State**: [`Solution`] with add/remove, extreme points, scoring and validation
//! - **Heuristics**: [`ContainerOrderSupply`] and the piece comparators
//! - **Oracle**: [`VolumeOracle`] with the built-in [`ClippingOracle`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stowage_d3::{ClippingOracle, Container, Instance, Piece, Solution};
//! use stowage_core::{Config, MeritType};
//!
//! let mut instance = Instance::new("demo")
//!     .with_piece(Piece::cuboid(1, 4.0, 3.0, 2.0)?)?
//!     .with_container(Container::new(1, 10.0, 10.0, 10.0)?)?;
//! instance.seal(&ClippingOracle)?;
//!
//! let config = Config::default().with_merit_type(MeritType::Height).with_seed(42);
//! let mut solution = Solution::new(Arc::new(instance), config)?;
//! let placed = solution.insert_best(0, 0)?;
//! assert!(placed.is_some());
//! assert!(solution.validate().is_empty());
//! # Ok::<(), stowage_core::Error>(())
//! ```

pub mod container;
pub mod extreme_point;
pub mod geometry;
pub mod insertion;
pub mod instance;
pub mod merit;
pub mod oracle;
pub mod ordering;
pub mod orientation;
pub mod piece;
pub mod rules;
pub mod slant;
pub mod solution;
pub mod validation;

// Re-exports
pub use container::{Container, ContainerVolumes};
pub use extreme_point::{ExtremePoint, ExtremePointSet};
pub use geometry::{ComponentsSet, MeshCube, MeshPoint, Vertex};
pub use insertion::Candidate;
pub use instance::Instance;
pub use oracle::{ClippingOracle, HalfSpace, VolumeOracle};
pub use ordering::{compare_pieces, sort_pieces, ContainerOrderSupply};
pub use piece::{Cargo, MaterialClass, Obstacle, Piece, PieceKind};
pub use rules::{FlagRule, FlagRuleType};
pub use slant::Slant;
pub use solution::{ContainerInfo, Solution};
pub use validation::{Flaw, FlawType};
pub use stowage_core::{Config, Error, Placement, Result};
