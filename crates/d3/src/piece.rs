//! Pieces: packable cargo and fixed obstacles.
//!
//! Both kinds share their geometry (an original [`ComponentsSet`] plus 24 sealed
//! orientation variants) and differ in what the packing state does with them, which is
//! captured by [`PieceKind`].

use crate::geometry::ComponentsSet;
use crate::orientation::generate_orientations;
use nalgebra::Vector3;
use std::collections::{BTreeMap, BTreeSet};
use stowage_core::transform::check_orientation;
use stowage_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Material classification used for co-loading rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MaterialClass {
    /// No special handling.
    #[default]
    Default,
    /// Explosives.
    Explosive,
    /// Flammable gases.
    FlammableGas,
    /// Flammable liquids.
    FlammableLiquid,
    /// Toxic substances.
    Toxic,
    /// Live animals.
    LiveAnimals,
    /// Fresh food.
    FreshFood,
    /// Mixed consolidated cargo.
    Merged,
}

impl MaterialClass {
    /// Number of material classes.
    pub const COUNT: usize = 8;

    /// Dense index of the class.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Classes that may not share a container with this one.
    pub fn incompatible(self) -> &'static [MaterialClass] {
        match self {
            MaterialClass::Explosive => &[MaterialClass::FlammableGas],
            MaterialClass::FlammableGas => &[MaterialClass::Explosive],
            _ => &[],
        }
    }

    /// Whether the two classes may not be co-loaded.
    pub fn is_incompatible_with(self, other: MaterialClass) -> bool {
        self.incompatible().contains(&other)
    }
}

/// Packing attributes of a packable piece.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cargo {
    /// Material classification.
    pub material: MaterialClass,
    /// Whether other pieces may rest on top of this one.
    pub stackable: bool,
    /// Orientation ids this piece may not be packed in.
    pub forbidden_orientations: BTreeSet<usize>,
    /// Custom flags (flag type -> flag value) used by flag rules.
    pub flags: BTreeMap<i32, i32>,
}

impl Default for Cargo {
    fn default() -> Self {
        Self {
            material: MaterialClass::Default,
            stackable: true,
            forbidden_orientations: BTreeSet::new(),
            flags: BTreeMap::new(),
        }
    }
}

/// Attributes of a fixed obstacle placed inside a container.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Obstacle {
    /// Container-local position.
    pub position: Vector3<f64>,
    /// Fixed orientation id.
    pub orientation: usize,
    /// Volume actually occupied inside the container, set when the container is sealed.
    pub volume_inside_container: Option<f64>,
}

/// What a piece is used for.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PieceKind {
    /// Packable piece.
    Variable(Cargo),
    /// Pre-placed obstacle.
    Virtual(Obstacle),
}

/// A rigid piece with its 24 orientation variants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Piece {
    id: usize,
    weight: f64,
    data: Option<String>,
    original: ComponentsSet,
    orientations: Vec<ComponentsSet>,
    kind: PieceKind,
}

impl Piece {
    /// Creates a packable piece.
    pub fn variable(id: usize) -> Self {
        Self {
            id,
            weight: 0.0,
            data: None,
            original: ComponentsSet::new(),
            orientations: Vec::new(),
            kind: PieceKind::Variable(Cargo::default()),
        }
    }

    /// Creates a fixed obstacle at `position` in `orientation`.
    pub fn obstacle(id: usize, position: Vector3<f64>, orientation: usize) -> Result<Self> {
        check_orientation(orientation)?;
        Ok(Self {
            id,
            weight: 0.0,
            data: None,
            original: ComponentsSet::new(),
            orientations: Vec::new(),
            kind: PieceKind::Virtual(Obstacle {
                position,
                orientation,
                volume_inside_container: None,
            }),
        })
    }

    /// Convenience constructor for a packable single box.
    pub fn cuboid(id: usize, length: f64, width: f64, height: f64) -> Result<Self> {
        let mut piece = Self::variable(id);
        piece.add_component(Vector3::zeros(), Vector3::new(length, width, height))?;
        Ok(piece)
    }

    /// Sets the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Attaches an opaque payload.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the material class (ignored for obstacles).
    pub fn with_material(mut self, material: MaterialClass) -> Self {
        if let PieceKind::Variable(cargo) = &mut self.kind {
            cargo.material = material;
        }
        self
    }

    /// Sets stackability (ignored for obstacles).
    pub fn with_stackable(mut self, stackable: bool) -> Self {
        if let PieceKind::Variable(cargo) = &mut self.kind {
            cargo.stackable = stackable;
        }
        self
    }

    /// Forbids an orientation (ignored for obstacles).
    pub fn with_forbidden_orientation(mut self, orientation: usize) -> Result<Self> {
        check_orientation(orientation)?;
        if let PieceKind::Variable(cargo) = &mut self.kind {
            cargo.forbidden_orientations.insert(orientation);
        }
        Ok(self)
    }

    /// Sets a custom flag (ignored for obstacles).
    pub fn with_flag(mut self, flag: i32, value: i32) -> Self {
        if let PieceKind::Variable(cargo) = &mut self.kind {
            cargo.flags.insert(flag, value);
        }
        self
    }

    /// Adds a component to the original shape and returns its dense id.
    pub fn add_component(&mut self, rel_position: Vector3<f64>, size: Vector3<f64>) -> Result<usize> {
        self.original.add_component(rel_position, size)
    }

    /// Builder form of [`Piece::add_component`].
    pub fn with_component(mut self, rel_position: Vector3<f64>, size: Vector3<f64>) -> Result<Self> {
        self.add_component(rel_position, size)?;
        Ok(self)
    }

    /// Seals the original shape and generates the 24 orientation variants.
    pub fn seal(&mut self) -> Result<()> {
        if self.is_sealed() {
            return Err(Error::AlreadySealed(format!("piece {} sealed twice", self.id)));
        }
        if !(self.weight.is_finite() && self.weight >= 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "weight of piece {} must be finite and non-negative",
                self.id
            )));
        }
        self.original.seal()?;
        self.orientations = generate_orientations(&self.original)?;
        Ok(())
    }

    /// Whether orientation variants exist.
    pub fn is_sealed(&self) -> bool {
        !self.orientations.is_empty()
    }

    /// External id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Opaque payload.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Shape as defined.
    pub fn original(&self) -> &ComponentsSet {
        &self.original
    }

    /// Sum of the component volumes.
    pub fn volume(&self) -> f64 {
        self.original.volume()
    }

    /// Volume of the original bounding box.
    pub fn bounding_volume(&self) -> f64 {
        self.original.bounding_volume()
    }

    /// Sealed variant for `orientation`.
    pub fn oriented(&self, orientation: usize) -> Result<&ComponentsSet> {
        check_orientation(orientation)?;
        self.orientations
            .get(orientation)
            .ok_or_else(|| Error::NotSealed(format!("piece {} has no orientations yet", self.id)))
    }

    /// Sealed variant for `orientation`.
    ///
    /// Panics when the piece is unsealed or the orientation is out of range; callers
    /// inside the crate validate both first.
    pub(crate) fn variant(&self, orientation: usize) -> &ComponentsSet {
        &self.orientations[orientation]
    }

    /// Kind of the piece.
    pub fn kind(&self) -> &PieceKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut PieceKind {
        &mut self.kind
    }

    /// Packing attributes, if this is a packable piece.
    pub fn cargo(&self) -> Option<&Cargo> {
        match &self.kind {
            PieceKind::Variable(cargo) => Some(cargo),
            PieceKind::Virtual(_) => None,
        }
    }

    /// Obstacle attributes, if this is a fixed obstacle.
    pub fn obstacle_info(&self) -> Option<&Obstacle> {
        match &self.kind {
            PieceKind::Virtual(obstacle) => Some(obstacle),
            PieceKind::Variable(_) => None,
        }
    }

    /// Material class (obstacles report [`MaterialClass::Default`]).
    pub fn material(&self) -> MaterialClass {
        self.cargo().map_or(MaterialClass::Default, |c| c.material)
    }

    /// Whether other pieces may rest on top.
    pub fn is_stackable(&self) -> bool {
        self.cargo().map_or(true, |c| c.stackable)
    }

    /// Whether `orientation` is forbidden for this piece.
    pub fn is_forbidden(&self, orientation: usize) -> bool {
        self.cargo()
            .is_some_and(|c| c.forbidden_orientations.contains(&orientation))
    }

    /// Value of `flag`, if set.
    pub fn flag(&self, flag: i32) -> Option<i32> {
        self.cargo().and_then(|c| c.flags.get(&flag).copied())
    }

    /// All (flag, value) pairs.
    pub fn flags(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cargo()
            .into_iter()
            .flat_map(|c| c.flags.iter().map(|(k, v)| (*k, *v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_material_pairs_are_symmetric() {
        assert!(MaterialClass::Explosive.is_incompatible_with(MaterialClass::FlammableGas));
        assert!(MaterialClass::FlammableGas.is_incompatible_with(MaterialClass::Explosive));
        assert!(!MaterialClass::Toxic.is_incompatible_with(MaterialClass::FreshFood));
        assert_eq!(MaterialClass::Merged.index(), MaterialClass::COUNT - 1);
    }

    #[test]
    fn test_seal_generates_orientations() {
        let mut piece = Piece::cuboid(1, 4.0, 3.0, 2.0).unwrap().with_weight(5.0);
        assert!(piece.oriented(0).is_err());
        piece.seal().unwrap();
        assert!(piece.is_sealed());
        for o in 0..24 {
            assert_relative_eq!(piece.oriented(o).unwrap().volume(), 24.0);
        }
        assert!(piece.oriented(24).is_err());
        assert!(piece.seal().is_err());
    }

    #[test]
    fn test_cargo_attributes() {
        let piece = Piece::cuboid(2, 1.0, 1.0, 1.0)
            .unwrap()
            .with_material(MaterialClass::Toxic)
            .with_stackable(false)
            .with_flag(3, 7)
            .with_forbidden_orientation(5)
            .unwrap();
        assert_eq!(piece.material(), MaterialClass::Toxic);
        assert!(!piece.is_stackable());
        assert_eq!(piece.flag(3), Some(7));
        assert_eq!(piece.flag(4), None);
        assert!(piece.is_forbidden(5));
        assert!(!piece.is_forbidden(0));
        assert_eq!(piece.flags().collect::<Vec<_>>(), vec![(3, 7)]);
    }

    #[test]
    fn test_obstacle_ignores_cargo_builders() {
        let piece = Piece::obstacle(9, Vector3::new(1.0, 0.0, 0.0), 0)
            .unwrap()
            .with_flag(1, 1)
            .with_material(MaterialClass::Explosive);
        assert!(piece.cargo().is_none());
        assert_eq!(piece.material(), MaterialClass::Default);
        assert_eq!(piece.flags().count(), 0);
        assert!(Piece::obstacle(9, Vector3::zeros(), 30).is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut piece = Piece::cuboid(1, 1.0, 1.0, 1.0).unwrap().with_weight(-1.0);
        assert!(matches!(piece.seal(), Err(Error::InvalidGeometry(_))));
    }
}
