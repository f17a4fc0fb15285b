//! Orientation variants of rigid shapes.
//!
//! Each of the 24 rotations is applied to every component's corners and extent vector.
//! A rotation may flip axis directions, so the rotated component is rebuilt from the
//! extrema of its rotated corners: the new front-left-bottom corner is the per-axis
//! minimum and the extent is the absolute rotated extent. The whole shape is then
//! translated so that no coordinate is negative.

use crate::geometry::{ComponentsSet, MeshCube, Vertex};
use nalgebra::Vector3;
use stowage_core::transform::{rotation_matrix, ORIENTATION_COUNT};
use stowage_core::Result;

/// Builds the sealed variant of `original` in the given orientation.
///
/// Pure function of (shape, orientation): the same input always yields the same output.
pub fn orient(original: &ComponentsSet, orientation: usize) -> Result<ComponentsSet> {
    let matrix = rotation_matrix(orientation)?;

    let mut rotated: Vec<(usize, Vector3<f64>, Vector3<f64>)> =
        Vec::with_capacity(original.components().len());
    let mut shift = Vector3::zeros();

    for component in original.components() {
        let mut min = Vector3::repeat(f64::INFINITY);
        for vertex in &Vertex::ALL[1..] {
            let corner = matrix * component.vertex(*vertex).position;
            min = min.inf(&corner);
        }
        let extent = (matrix * component.size()).abs();
        shift = shift.inf(&min);
        rotated.push((component.id(), min, extent));
    }

    // Only negative minima are pulled back into the first octant.
    let shift = -shift;

    let components = rotated
        .into_iter()
        .map(|(id, min, extent)| ComponentsSet::create_cube(id, min + shift, extent))
        .collect::<Vec<MeshCube>>();

    ComponentsSet::sealed_from(components)
}

/// Builds all 24 sealed orientation variants of `original`, indexed by orientation id.
pub fn generate_orientations(original: &ComponentsSet) -> Result<Vec<ComponentsSet>> {
    (0..ORIENTATION_COUNT)
        .map(|orientation| orient(original, orientation))
        .collect()
}
