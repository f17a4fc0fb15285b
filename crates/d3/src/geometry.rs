//! 3D geometry primitives: corner-tagged points, cuboids and rigid component sets.
//!
//! A [`ComponentsSet`] is an ordered list of [`MeshCube`] components forming one rigid
//! shape (one component for a plain box, several for tetris-like composites). Sets are
//! built with [`ComponentsSet::add_component`] and sealed once, which fixes the bounding
//! box and the memoized volume.

use nalgebra::Vector3;
use stowage_core::{Error, Result, AABB3D};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named box corners plus the center.
///
/// Front/rear is the y axis, left/right the x axis, bottom/top the z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Vertex {
    /// Center of the box (id 0).
    Center,
    /// (0, 0, 0), id 1.
    FrontLeftBottom,
    /// (L, 0, 0), id 2.
    FrontRightBottom,
    /// (0, W, 0), id 3.
    RearLeftBottom,
    /// (L, W, 0), id 4.
    RearRightBottom,
    /// (0, 0, H), id 5.
    FrontLeftTop,
    /// (L, 0, H), id 6.
    FrontRightTop,
    /// (0, W, H), id 7.
    RearLeftTop,
    /// (L, W, H), id 8.
    RearRightTop,
}

impl Vertex {
    /// All vertices ordered by id.
    pub const ALL: [Vertex; 9] = [
        Vertex::Center,
        Vertex::FrontLeftBottom,
        Vertex::FrontRightBottom,
        Vertex::RearLeftBottom,
        Vertex::RearRightBottom,
        Vertex::FrontLeftTop,
        Vertex::FrontRightTop,
        Vertex::RearLeftTop,
        Vertex::RearRightTop,
    ];

    /// Returns the numeric id (0 = center, 1..=8 corners).
    pub fn id(self) -> usize {
        self as usize
    }

    /// Looks up a vertex by numeric id.
    pub fn from_id(id: usize) -> Result<Self> {
        Self::ALL
            .get(id)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("vertex id {} outside 0..=8", id)))
    }

    /// Fraction of (L, W, H) this vertex sits at.
    fn factors(self) -> (f64, f64, f64) {
        match self {
            Vertex::Center => (0.5, 0.5, 0.5),
            Vertex::FrontLeftBottom => (0.0, 0.0, 0.0),
            Vertex::FrontRightBottom => (1.0, 0.0, 0.0),
            Vertex::RearLeftBottom => (0.0, 1.0, 0.0),
            Vertex::RearRightBottom => (1.0, 1.0, 0.0),
            Vertex::FrontLeftTop => (0.0, 0.0, 1.0),
            Vertex::FrontRightTop => (1.0, 0.0, 1.0),
            Vertex::RearLeftTop => (0.0, 1.0, 1.0),
            Vertex::RearRightTop => (1.0, 1.0, 1.0),
        }
    }

    /// Position of this vertex for a box at `origin` with extent `size`.
    pub fn locate(self, origin: &Vector3<f64>, size: &Vector3<f64>) -> Vector3<f64> {
        let (fx, fy, fz) = self.factors();
        Vector3::new(
            origin.x + fx * size.x,
            origin.y + fy * size.y,
            origin.z + fz * size.z,
        )
    }
}

/// A point, optionally tagged with the box corner it represents and the piece it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshPoint {
    /// Coordinates.
    pub position: Vector3<f64>,
    /// Corner tag.
    pub vertex: Option<Vertex>,
    /// Volatile id of the owning piece (non-owning back reference).
    pub piece: Option<usize>,
}

impl MeshPoint {
    /// Creates an untagged point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            vertex: None,
            piece: None,
        }
    }

    /// Tags the point with a corner.
    pub fn with_vertex(mut self, vertex: Vertex) -> Self {
        self.vertex = Some(vertex);
        self
    }

    /// Tags the point with its owning piece.
    pub fn with_piece(mut self, piece: usize) -> Self {
        self.piece = Some(piece);
        self
    }
}

/// An axis-aligned cuboid with a position relative to its owner.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshCube {
    id: usize,
    rel_position: Vector3<f64>,
    size: Vector3<f64>,
    vertices: [MeshPoint; 9],
    volume: f64,
}

impl MeshCube {
    /// Creates a cube with the given dense id, relative position and (L, W, H).
    pub fn new(id: usize, rel_position: Vector3<f64>, size: Vector3<f64>) -> Result<Self> {
        if !size.iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "cube extents must be positive and finite, got ({}, {}, {})",
                size.x, size.y, size.z
            )));
        }
        if !rel_position.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidGeometry(
                "cube position must be finite".to_string(),
            ));
        }
        Ok(Self::from_parts(id, rel_position, size))
    }

    fn from_parts(id: usize, rel_position: Vector3<f64>, size: Vector3<f64>) -> Self {
        let vertices = Vertex::ALL.map(|v| MeshPoint {
            position: v.locate(&rel_position, &size),
            vertex: Some(v),
            piece: None,
        });
        Self {
            id,
            rel_position,
            size,
            vertices,
            volume: size.x * size.y * size.z,
        }
    }

    /// Dense id of the cube within its owner.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Position relative to the owner's reference corner.
    pub fn rel_position(&self) -> &Vector3<f64> {
        &self.rel_position
    }

    /// Extent (L, W, H).
    pub fn size(&self) -> &Vector3<f64> {
        &self.size
    }

    /// Extent along x.
    pub fn length(&self) -> f64 {
        self.size.x
    }

    /// Extent along y.
    pub fn width(&self) -> f64 {
        self.size.y
    }

    /// Extent along z.
    pub fn height(&self) -> f64 {
        self.size.z
    }

    /// L x W x H.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Returns the (relative) vertex.
    pub fn vertex(&self, vertex: Vertex) -> &MeshPoint {
        &self.vertices[vertex.id()]
    }

    /// Returns the (relative) vertex with numeric id `id`.
    pub fn vertex_by_id(&self, id: usize) -> Result<&MeshPoint> {
        Ok(self.vertex(Vertex::from_id(id)?))
    }

    /// All nine vertices ordered by id.
    pub fn vertices(&self) -> &[MeshPoint; 9] {
        &self.vertices
    }

    /// Generates the vertex with numeric id `id` from the cube's extent only,
    /// ignoring its relative position.
    pub fn generate_vertex(&self, id: usize) -> Result<MeshPoint> {
        let vertex = Vertex::from_id(id)?;
        Ok(MeshPoint {
            position: vertex.locate(&Vector3::zeros(), &self.size),
            vertex: Some(vertex),
            piece: None,
        })
    }

    /// Axis-aligned bounds of this cube when its owner sits at `anchor`.
    pub fn bounds_at(&self, anchor: &Vector3<f64>) -> AABB3D {
        AABB3D::from_origin_extent(anchor + self.rel_position, self.size)
    }
}

/// Rigid shape made of one or more cuboid components.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ComponentsSet {
    components: Vec<MeshCube>,
    bounding_box: Option<MeshCube>,
    volume: f64,
}

impl Default for ComponentsSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentsSet {
    /// Creates an empty, unsealed set.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            bounding_box: None,
            volume: 0.0,
        }
    }

    /// Appends a component and returns its dense id.
    pub fn add_component(&mut self, rel_position: Vector3<f64>, size: Vector3<f64>) -> Result<usize> {
        if self.is_sealed() {
            return Err(Error::AlreadySealed(
                "cannot add components to a sealed shape".to_string(),
            ));
        }
        let id = self.components.len();
        self.components.push(MeshCube::new(id, rel_position, size)?);
        Ok(id)
    }

    /// Fixes the bounding box (max over components of offset + extent per axis)
    /// and the total component volume.
    pub fn seal(&mut self) -> Result<()> {
        if self.is_sealed() {
            return Err(Error::AlreadySealed("shape sealed twice".to_string()));
        }
        if self.components.is_empty() {
            return Err(Error::InvalidGeometry(
                "shape needs at least one component".to_string(),
            ));
        }
        let mut extent = Vector3::zeros();
        for c in &self.components {
            extent = extent.sup(&(c.rel_position + c.size));
        }
        self.bounding_box = Some(MeshCube::new(0, Vector3::zeros(), extent)?);
        self.volume = self.components.iter().map(MeshCube::volume).sum();
        Ok(())
    }

    /// Builds and seals a set from already positioned cubes, keeping their ids.
    pub(crate) fn sealed_from(components: Vec<MeshCube>) -> Result<Self> {
        let mut set = Self {
            components,
            bounding_box: None,
            volume: 0.0,
        };
        set.seal()?;
        Ok(set)
    }

    /// Whether the set has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.bounding_box.is_some()
    }

    /// The components in insertion order.
    pub fn components(&self) -> &[MeshCube] {
        &self.components
    }

    /// Bounding box anchored at the origin.
    pub fn bounding_box(&self) -> Result<&MeshCube> {
        self.bounding_box
            .as_ref()
            .ok_or_else(|| Error::NotSealed("bounding box of an unsealed shape".to_string()))
    }

    /// Bounding box extent (L, W, H); zero before sealing.
    pub fn extent(&self) -> Vector3<f64> {
        self.bounding_box
            .as_ref()
            .map(|b| b.size)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Sum of the component volumes; zero before sealing.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Volume of the bounding box; zero before sealing.
    pub fn bounding_volume(&self) -> f64 {
        self.bounding_box.as_ref().map_or(0.0, MeshCube::volume)
    }

    pub(crate) fn create_cube(id: usize, rel_position: Vector3<f64>, size: Vector3<f64>) -> MeshCube {
        MeshCube::from_parts(id, rel_position, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn l_shape() -> ComponentsSet {
        let mut set = ComponentsSet::new();
        set.add_component(Vector3::zeros(), Vector3::new(4.0, 2.0, 1.0))
            .unwrap();
        set.add_component(Vector3::new(0.0, 0.0, 1.0), Vector3::new(2.0, 2.0, 1.0))
            .unwrap();
        set
    }

    #[test]
    fn test_vertex_ids() {
        for (i, v) in Vertex::ALL.iter().enumerate() {
            assert_eq!(v.id(), i);
            assert_eq!(Vertex::from_id(i).unwrap(), *v);
        }
        assert!(matches!(Vertex::from_id(9), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_cube_vertices() {
        let cube = MeshCube::new(0, Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0))
            .unwrap();
        assert_relative_eq!(cube.vertex(Vertex::FrontLeftBottom).position, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(cube.vertex(Vertex::RearRightTop).position, Vector3::new(5.0, 7.0, 9.0));
        assert_relative_eq!(cube.vertex(Vertex::Center).position, Vector3::new(3.0, 4.5, 6.0));
        assert_relative_eq!(cube.vertex_by_id(3).unwrap().position, Vector3::new(1.0, 7.0, 3.0));
        assert_relative_eq!(cube.volume(), 120.0);
    }

    #[test]
    fn test_generate_vertex_ignores_offset() {
        let cube = MeshCube::new(0, Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0))
            .unwrap();
        let p = cube.generate_vertex(6).unwrap();
        assert_relative_eq!(p.position, Vector3::new(4.0, 0.0, 6.0));
        assert_eq!(p.vertex, Some(Vertex::FrontRightTop));
        assert!(cube.generate_vertex(12).is_err());
    }

    #[test]
    fn test_invalid_cube() {
        assert!(MeshCube::new(0, Vector3::zeros(), Vector3::new(0.0, 1.0, 1.0)).is_err());
        assert!(MeshCube::new(0, Vector3::zeros(), Vector3::new(f64::NAN, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_seal_bounding_box() {
        let mut set = l_shape();
        assert!(set.bounding_box().is_err());
        set.seal().unwrap();
        assert_relative_eq!(*set.bounding_box().unwrap().size(), Vector3::new(4.0, 2.0, 2.0));
        assert_relative_eq!(set.volume(), 12.0);
        assert_relative_eq!(set.bounding_volume(), 16.0);
    }

    #[test]
    fn test_seal_once() {
        let mut set = l_shape();
        set.seal().unwrap();
        assert!(matches!(set.seal(), Err(Error::AlreadySealed(_))));
        assert!(set
            .add_component(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0))
            .is_err());
    }

    #[test]
    fn test_empty_set_cannot_seal() {
        assert!(ComponentsSet::new().seal().is_err());
    }
}
