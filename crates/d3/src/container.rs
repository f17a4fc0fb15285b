//! Containers: a cuboid mesh with optional slants and fixed obstacles.

use crate::geometry::MeshCube;
use crate::oracle::{HalfSpace, VolumeOracle};
use crate::piece::{Piece, PieceKind};
use crate::slant::Slant;
use nalgebra::Vector3;
use std::collections::BTreeMap;
use stowage_core::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Volumes fixed when a container is sealed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContainerVolumes {
    /// Mesh volume minus the parts cut away by slants.
    pub after_slants: f64,
    /// Volume occupied by obstacles inside the (slant-clipped) container.
    pub occupied_by_virtual_pieces: f64,
    /// Net usable volume.
    pub usable: f64,
}

/// A container pieces are packed into.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container {
    id: usize,
    mesh: MeshCube,
    slants: Vec<Slant>,
    virtual_pieces: Vec<Piece>,
    max_weight: f64,
    capacity: BTreeMap<String, f64>,
    volumes: Option<ContainerVolumes>,
}

impl Container {
    /// Creates a container with the given inner extent (L, W, H).
    pub fn new(id: usize, length: f64, width: f64, height: f64) -> Result<Self> {
        let mesh = MeshCube::new(0, Vector3::zeros(), Vector3::new(length, width, height))
            .map_err(|e| Error::InvalidGeometry(format!("container {}: {}", id, e)))?;
        Ok(Self {
            id,
            mesh,
            slants: Vec::new(),
            virtual_pieces: Vec::new(),
            max_weight: f64::INFINITY,
            capacity: BTreeMap::new(),
            volumes: None,
        })
    }

    fn ensure_unsealed(&self) -> Result<()> {
        if self.is_sealed() {
            return Err(Error::AlreadySealed(format!("container {}", self.id)));
        }
        Ok(())
    }

    /// Sets the maximal total weight.
    pub fn with_max_weight(mut self, max_weight: f64) -> Self {
        self.max_weight = max_weight;
        self
    }

    /// Sets a named auxiliary capacity.
    pub fn with_capacity(mut self, name: impl Into<String>, value: f64) -> Self {
        self.capacity.insert(name.into(), value);
        self
    }

    /// Adds a slant and returns its dense sub-id.
    pub fn add_slant(&mut self, slant: Slant) -> Result<usize> {
        self.ensure_unsealed()?;
        self.slants.push(slant);
        Ok(self.slants.len() - 1)
    }

    /// Builder form of [`Container::add_slant`].
    pub fn with_slant(mut self, slant: Slant) -> Result<Self> {
        self.add_slant(slant)?;
        Ok(self)
    }

    /// Adds a fixed obstacle and returns its dense sub-id.
    pub fn add_virtual_piece(&mut self, piece: Piece) -> Result<usize> {
        self.ensure_unsealed()?;
        if !matches!(piece.kind(), PieceKind::Virtual(_)) {
            return Err(Error::InvalidArgument(format!(
                "piece {} is not a virtual piece",
                piece.id()
            )));
        }
        self.virtual_pieces.push(piece);
        Ok(self.virtual_pieces.len() - 1)
    }

    /// Builder form of [`Container::add_virtual_piece`].
    pub fn with_virtual_piece(mut self, piece: Piece) -> Result<Self> {
        self.add_virtual_piece(piece)?;
        Ok(self)
    }

    /// Seals slants and obstacles and fixes the container volumes.
    ///
    /// Without slants the volume is plain L x W x H; otherwise the clipped volume comes
    /// from the oracle. Each obstacle's share inside the clipped container is subtracted.
    /// Slants and obstacles are sealed on working copies and committed only when every
    /// oracle call succeeds, so a failed seal leaves the container untouched.
    pub fn seal(&mut self, oracle: &dyn VolumeOracle) -> Result<()> {
        self.ensure_unsealed()?;
        let extent = *self.mesh.size();
        let mut slants = self.slants.clone();
        for slant in &mut slants {
            slant.seal(&extent)?;
        }

        let container_space: Vec<HalfSpace> = HalfSpace::cuboid(&Vector3::zeros(), &extent)
            .into_iter()
            .chain(slants.iter().map(Slant::half_space))
            .collect();

        let mut virtual_pieces = self.virtual_pieces.clone();
        let mut occupied = 0.0;
        for piece in &mut virtual_pieces {
            piece.seal()?;
            let inside = Self::obstacle_volume(piece, &container_space, oracle)
                .map_err(|e| Error::VolumeUnknown(format!("container {}: {}", self.id, e)))?;
            if let PieceKind::Virtual(obstacle) = piece.kind_mut() {
                obstacle.volume_inside_container = Some(inside);
            }
            occupied += inside;
        }

        let after_slants = if slants.is_empty() {
            self.mesh.volume()
        } else {
            oracle
                .volume(&container_space)
                .map_err(|e| Error::VolumeUnknown(format!("container {}: {}", self.id, e)))?
        };

        self.slants = slants;
        self.virtual_pieces = virtual_pieces;
        self.volumes = Some(ContainerVolumes {
            after_slants,
            occupied_by_virtual_pieces: occupied,
            usable: after_slants - occupied,
        });
        log::debug!(
            "container {} sealed: mesh {:.3}, after slants {:.3}, usable {:.3}",
            self.id,
            self.mesh.volume(),
            after_slants,
            after_slants - occupied
        );
        Ok(())
    }

    fn obstacle_volume(
        piece: &Piece,
        container_space: &[HalfSpace],
        oracle: &dyn VolumeOracle,
    ) -> Result<f64> {
        let Some(obstacle) = piece.obstacle_info() else {
            return Ok(0.0);
        };
        let shape = piece.oriented(obstacle.orientation)?;
        let mut total = 0.0;
        for component in shape.components() {
            let bounds = component.bounds_at(&obstacle.position);
            let mut region: Vec<HalfSpace> = HalfSpace::cuboid(&bounds.min, &bounds.max).to_vec();
            region.extend_from_slice(container_space);
            total += oracle.volume(&region)?;
        }
        Ok(total)
    }

    /// Whether the container has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.volumes.is_some()
    }

    /// External id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The container mesh anchored at the origin.
    pub fn mesh(&self) -> &MeshCube {
        &self.mesh
    }

    /// Inner extent (L, W, H).
    pub fn extent(&self) -> &Vector3<f64> {
        self.mesh.size()
    }

    /// Slants in insertion order.
    pub fn slants(&self) -> &[Slant] {
        &self.slants
    }

    /// Obstacles in insertion order.
    pub fn virtual_pieces(&self) -> &[Piece] {
        &self.virtual_pieces
    }

    /// Maximal total weight (infinite by default).
    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    /// Named auxiliary capacities.
    pub fn capacity(&self) -> &BTreeMap<String, f64> {
        &self.capacity
    }

    /// Volumes computed at seal time.
    pub fn volumes(&self) -> Result<&ContainerVolumes> {
        self.volumes
            .as_ref()
            .ok_or_else(|| Error::NotSealed(format!("container {}", self.id)))
    }

    /// Net usable volume; zero before sealing.
    pub fn volume(&self) -> f64 {
        self.volumes.map_or(0.0, |v| v.usable)
    }
}
