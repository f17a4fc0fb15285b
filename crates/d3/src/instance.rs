//! Problem instances and dense volatile-id assignment.
//!
//! Sealing an instance seals every piece and container and fixes the dense ids used by
//! [`crate::solution::Solution`] for array addressing:
//!
//! - containers get ids `0..m` in ascending external-id order;
//! - packable pieces get ids `0..n` in insertion order;
//! - obstacles continue at `n..` in container order, then insertion order.

use crate::container::Container;
use crate::oracle::VolumeOracle;
use crate::piece::{Piece, PieceKind};
use crate::rules::FlagRule;
use std::collections::BTreeSet;
use stowage_core::{Error, Result};

/// A set of pieces, containers and flag rules.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    name: String,
    pieces: Vec<Piece>,
    containers: Vec<Container>,
    flag_rules: Vec<FlagRule>,
    virtual_slots: Vec<(usize, usize)>,
    sealed: bool,
}

impl Instance {
    /// Creates an empty instance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn ensure_unsealed(&self) -> Result<()> {
        if self.sealed {
            return Err(Error::AlreadySealed(format!("instance {}", self.name)));
        }
        Ok(())
    }

    /// Adds a packable piece.
    pub fn add_piece(&mut self, piece: Piece) -> Result<()> {
        self.ensure_unsealed()?;
        if !matches!(piece.kind(), PieceKind::Variable(_)) {
            return Err(Error::InvalidArgument(format!(
                "piece {} is a virtual piece; add it to its container",
                piece.id()
            )));
        }
        self.pieces.push(piece);
        Ok(())
    }

    /// Builder form of [`Instance::add_piece`].
    pub fn with_piece(mut self, piece: Piece) -> Result<Self> {
        self.add_piece(piece)?;
        Ok(self)
    }

    /// Adds a container.
    pub fn add_container(&mut self, container: Container) -> Result<()> {
        self.ensure_unsealed()?;
        self.containers.push(container);
        Ok(())
    }

    /// Builder form of [`Instance::add_container`].
    pub fn with_container(mut self, container: Container) -> Result<Self> {
        self.add_container(container)?;
        Ok(self)
    }

    /// Adds a flag rule.
    pub fn add_flag_rule(&mut self, rule: FlagRule) -> Result<()> {
        self.ensure_unsealed()?;
        self.flag_rules.push(rule);
        Ok(())
    }

    /// Seals all geometry and assigns volatile ids.
    pub fn seal(&mut self, oracle: &dyn VolumeOracle) -> Result<()> {
        self.ensure_unsealed()?;

        let mut ids = BTreeSet::new();
        for piece in &self.pieces {
            if !ids.insert(piece.id()) {
                return Err(Error::InvalidArgument(format!("duplicate piece id {}", piece.id())));
            }
        }
        let mut container_ids = BTreeSet::new();
        for container in &self.containers {
            if !container_ids.insert(container.id()) {
                return Err(Error::InvalidArgument(format!(
                    "duplicate container id {}",
                    container.id()
                )));
            }
        }

        for piece in &mut self.pieces {
            piece.seal()?;
        }
        self.containers.sort_by_key(Container::id);
        for container in &mut self.containers {
            container.seal(oracle)?;
        }

        self.virtual_slots = self
            .containers
            .iter()
            .enumerate()
            .flat_map(|(c, container)| (0..container.virtual_pieces().len()).map(move |v| (c, v)))
            .collect();
        self.sealed = true;

        log::debug!(
            "instance {} sealed: {} pieces, {} containers, {} virtual pieces",
            self.name,
            self.pieces.len(),
            self.containers.len(),
            self.virtual_slots.len()
        );
        Ok(())
    }

    /// Whether the instance has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Packable pieces ordered by volatile id.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Containers ordered by volatile id.
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// Flag rules.
    pub fn flag_rules(&self) -> &[FlagRule] {
        &self.flag_rules
    }

    /// Number of packable pieces.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// Number of packable pieces plus obstacles.
    pub fn slot_count(&self) -> usize {
        self.pieces.len() + self.virtual_slots.len()
    }

    /// Volatile ids of all obstacles with their container's volatile id.
    pub fn virtual_piece_ids(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let offset = self.pieces.len();
        self.virtual_slots
            .iter()
            .enumerate()
            .map(move |(i, (c, _))| (offset + i, *c))
    }

    /// Piece (packable or obstacle) with the given volatile id.
    pub fn piece(&self, volatile_id: usize) -> Result<&Piece> {
        if let Some(piece) = self.pieces.get(volatile_id) {
            return Ok(piece);
        }
        volatile_id
            .checked_sub(self.pieces.len())
            .and_then(|i| self.virtual_slots.get(i))
            .map(|(c, v)| &self.containers[*c].virtual_pieces()[*v])
            .ok_or_else(|| Error::InvalidArgument(format!("unknown piece volatile id {}", volatile_id)))
    }

    /// Packable piece with the given volatile id.
    pub fn variable_piece(&self, volatile_id: usize) -> Result<&Piece> {
        self.pieces.get(volatile_id).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown packable piece volatile id {}", volatile_id))
        })
    }

    /// Container with the given volatile id.
    pub fn container(&self, volatile_id: usize) -> Result<&Container> {
        self.containers.get(volatile_id).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown container volatile id {}", volatile_id))
        })
    }

    /// Volatile id of the packable piece with external id `id`.
    pub fn piece_volatile_id(&self, id: usize) -> Option<usize> {
        self.pieces.iter().position(|p| p.id() == id)
    }

    /// Volatile id of the container with external id `id`.
    pub fn container_volatile_id(&self, id: usize) -> Option<usize> {
        self.containers.iter().position(|c| c.id() == id)
    }

    /// Sum of the component volumes of all packable pieces.
    pub fn total_piece_volume(&self) -> f64 {
        self.pieces.iter().map(Piece::volume).sum()
    }
}
