//! Feasibility checks and candidate evaluation for a single piece.
//!
//! A candidate is a (container, orientation, extreme point) triple. Candidates pass a
//! container-level check (materials, flag rules, weight) and a geometric insertion
//! check, and the survivors are scored in parallel with rayon. The lowest score wins;
//! equal scores keep enumeration order (containers in the given order, orientations
//! ascending, points in list order).

use crate::extreme_point::ExtremePoint;
use crate::solution::Solution;
use nalgebra::Vector3;
use rayon::prelude::*;
use std::collections::BTreeSet;
use stowage_core::transform::{check_orientation, AABB3D};
use stowage_core::{Result, ORIENTATION_COUNT};

/// Tolerance for "resting on" comparisons of z coordinates.
const SUPPORT_EPS: f64 = 1e-9;

/// A scored placement option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Container volatile id.
    pub container: usize,
    /// Orientation id.
    pub orientation: usize,
    /// Extreme point the piece is anchored at.
    pub ep: ExtremePoint,
    /// Merit score (lower is better).
    pub score: f64,
}

fn overlaps_xy(a: &AABB3D, b: &AABB3D) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

impl Solution {
    /// Whether `piece` conflicts with a material already loaded into `container`.
    /// Always false when compatibility handling is off.
    pub fn is_material_incompatible(&self, container: usize, piece: usize) -> Result<bool> {
        if !self.config.handle_compatibility {
            return Ok(false);
        }
        self.instance.container(container)?;
        let material = self.instance.variable_piece(piece)?.material();
        Ok(material
            .incompatible()
            .iter()
            .any(|m| self.materials[container][m.index()] > 0))
    }

    /// Whether adding `piece` to `container` would break one of the instance's flag rules.
    pub fn is_flag_rule_incompatible(&self, container: usize, piece: usize) -> Result<bool> {
        self.instance.container(container)?;
        let item = self.instance.variable_piece(piece)?;
        let empty = BTreeSet::new();
        for rule in self.instance.flag_rules() {
            let Some(value) = item.flag(rule.flag_id) else {
                continue;
            };
            let contained = self
                .flag_values_contained(container, rule.flag_id)
                .unwrap_or(&empty);
            let same = self.flag_pieces_contained(container, rule.flag_id, value);
            if !rule.admits(value, contained, same)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Container-level admission: materials, flag rules, then weight capacity.
    pub fn container_check(&self, container: usize, piece: usize) -> Result<bool> {
        if self.is_material_incompatible(container, piece)? {
            return Ok(false);
        }
        if self.is_flag_rule_incompatible(container, piece)? {
            return Ok(false);
        }
        let weight = self.instance.variable_piece(piece)?.weight();
        let max_weight = self.instance.container(container)?.max_weight();
        Ok(self.infos[container].weight_contained + weight <= max_weight)
    }

    /// Boxes a slot occupies at `position` in `orientation`: its components in Tetris
    /// mode, otherwise its bounding box.
    fn occupied_boxes(&self, slot: usize, orientation: usize, position: &Vector3<f64>) -> Result<Vec<AABB3D>> {
        let shape = self.instance.piece(slot)?.variant(orientation);
        Ok(if self.config.tetris {
            shape.components().iter().map(|c| c.bounds_at(position)).collect()
        } else {
            vec![AABB3D::from_origin_extent(*position, shape.extent())]
        })
    }

    /// Geometric admission of `piece` at `position` in `orientation`.
    ///
    /// The piece must stay inside the container, avoid all placed pieces and obstacles,
    /// and stay on the usable side of every slant. With gravity handling the bottom
    /// face must rest on the floor or on another piece; with stackability handling it
    /// must not rest on a non-stackable piece.
    pub fn insertion_check(
        &self,
        container: usize,
        piece: usize,
        orientation: usize,
        position: &Vector3<f64>,
    ) -> Result<bool> {
        check_orientation(orientation)?;
        let bin = self.instance.container(container)?;
        self.instance.variable_piece(piece)?;
        let boxes = self.occupied_boxes(piece, orientation, position)?;

        if !boxes.iter().all(|b| b.within(bin.extent())) {
            return Ok(false);
        }
        for slant in bin.slants() {
            if boxes
                .iter()
                .any(|b| slant.excess(&b.support_corner(slant.normal())) > 0.0)
            {
                return Ok(false);
            }
        }

        let mut others: Vec<(usize, AABB3D)> = Vec::new();
        for other in self.pieces_in(container).filter(|&o| o != piece) {
            for b in self.occupied_boxes(other, self.orientations[other], &self.positions[other])? {
                others.push((other, b));
            }
        }
        if boxes
            .iter()
            .any(|b| others.iter().any(|(_, o)| b.overlaps(o)))
        {
            return Ok(false);
        }

        let footprint = AABB3D::from_origin_extent(
            *position,
            self.instance.variable_piece(piece)?.variant(orientation).extent(),
        );
        let below: Vec<usize> = others
            .iter()
            .filter(|(_, o)| (o.max.z - position.z).abs() <= SUPPORT_EPS && overlaps_xy(&footprint, o))
            .map(|(slot, _)| *slot)
            .collect();
        if self.config.handle_gravity && position.z.abs() > SUPPORT_EPS && below.is_empty() {
            return Ok(false);
        }
        if self.config.handle_stackability {
            for slot in below {
                if !self.instance.piece(slot)?.is_stackable() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Orientations `piece` may use under the configuration.
    pub fn allowed_orientations(&self, piece: usize) -> Result<Vec<usize>> {
        let item = self.instance.variable_piece(piece)?;
        if !self.config.handle_rotatability {
            return Ok(vec![0]);
        }
        Ok((0..ORIENTATION_COUNT)
            .filter(|&o| !(self.config.handle_forbidden_orientations && item.is_forbidden(o)))
            .collect())
    }

    /// Best feasible candidate for `piece` over `containers`, or `None`.
    pub fn evaluate_candidates(&self, piece: usize, containers: &[usize]) -> Result<Option<Candidate>> {
        let orientations = self.allowed_orientations(piece)?;
        let mut options: Vec<(usize, usize, ExtremePoint)> = Vec::new();
        for &c in containers {
            if !self.container_check(c, piece)? {
                continue;
            }
            for &o in &orientations {
                options.extend(self.extreme_points(c).iter().map(|ep| (c, o, *ep)));
            }
        }

        let scored: Vec<Option<f64>> = options
            .par_iter()
            .map(|(c, o, ep)| -> Result<Option<f64>> {
                if self.insertion_check(*c, piece, *o, &ep.position)? {
                    self.score_piece_allocation(*c, piece, *o, ep).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let best = scored
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
            .fold(None, |best: Option<(usize, f64)>, (i, s)| match best {
                Some((_, b)) if b <= s => best,
                _ => Some((i, s)),
            });
        log::trace!(
            "piece {}: {} candidates, {} feasible",
            piece,
            options.len(),
            scored.iter().filter(|s| s.is_some()).count()
        );
        Ok(best.map(|(i, score)| {
            let (container, orientation, ep) = options[i];
            Candidate {
                container,
                orientation,
                ep,
                score,
            }
        }))
    }

    /// Best candidate for `piece` over the container order of step `piece_counter`.
    pub fn best_insertion(&mut self, piece: usize, piece_counter: usize) -> Result<Option<Candidate>> {
        let order = self.container_order(piece_counter);
        self.evaluate_candidates(piece, &order)
    }

    /// Finds and commits the best candidate for `piece`. Returns the committed one.
    pub fn insert_best(&mut self, piece: usize, piece_counter: usize) -> Result<Option<Candidate>> {
        let best = self.best_insertion(piece, piece_counter)?;
        if let Some(candidate) = &best {
            self.insert(candidate.container, piece, candidate.orientation, &candidate.ep)?;
        }
        Ok(best)
    }
}
