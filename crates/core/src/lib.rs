//! # Stowage Core
//!
//! Shared types for the stowage multi-container packing engine.
//!
//! ## Core Components
//!
//! - **Errors**: [`Error`] and the [`Result`] alias used by every crate
//! - **Configuration**: [`Config`] and the merit, ordering and objective selectors
//! - **Transforms**: the 24-element rotation group and axis-aligned boxes
//! - **Reporting**: [`Placement`] records and [`PackingSummary`] snapshots
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod config;
pub mod error;
pub mod placement;
pub mod result;
pub mod transform;

// Re-exports
pub use config::{
    Config, ContainerInitOrder, ContainerReorder, MeritType, ObjectiveType, PieceOrder,
};
pub use error::{Error, Result};
pub use placement::{Placement, PlacementStats};
pub use result::{ContainerStats, PackingSummary};
pub use transform::{
    orientation_angles, rotation_group, rotation_matrix, OrientationAngles, AABB3D,
    ORIENTATION_COUNT,
};
