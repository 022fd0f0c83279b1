//! Uniform-grid spatial index for radius queries.
//!
//! Points are bucketed into cubic cells of edge `cell_size`; a query of
//! radius `r <= cell_size` only has to visit the 27 cells around the probe.

use glam::Vec3;
use std::collections::HashMap;

use crate::types::model::{AtomRef, Model, ResidueRef};

/// Bucketed point set carrying a payload per point.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f32,
    cells: HashMap<[i32; 3], Vec<(Vec3, T)>>,
}

impl<T: Copy> SpatialGrid<T> {
    /// Build a grid. `cell_size` is clamped to a small positive minimum.
    pub fn new(items: impl IntoIterator<Item = (Vec3, T)>, cell_size: f32) -> Self {
        let cell_size = cell_size.max(1e-3);
        let mut cells: HashMap<[i32; 3], Vec<(Vec3, T)>> = HashMap::new();
        for (pos, item) in items {
            cells.entry(cell_key(pos, cell_size)).or_default().push((pos, item));
        }
        Self { cell_size, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Visit every stored point whose distance to `probe` lies in `[min_dist, max_dist]`.
    ///
    /// Stops early and returns `true` as soon as `visit` returns `true`.
    pub fn any_within(
        &self,
        probe: Vec3,
        min_dist: f32,
        max_dist: f32,
        mut visit: impl FnMut(T) -> bool,
    ) -> bool {
        let reach = (max_dist / self.cell_size).ceil().max(1.0) as i32;
        let [cx, cy, cz] = cell_key(probe, self.cell_size);
        let min_sq = min_dist * min_dist;
        let max_sq = max_dist * max_dist;

        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let Some(bucket) = self.cells.get(&[cx + dx, cy + dy, cz + dz]) else {
                        continue;
                    };
                    for &(pos, item) in bucket {
                        let d_sq = pos.distance_squared(probe);
                        if d_sq >= min_sq && d_sq <= max_sq && visit(item) {
                            return true;
                        }
                    }
                }
            }
        }
        false
    }
}

fn cell_key(pos: Vec3, cell_size: f32) -> [i32; 3] {
    let scaled = (pos / cell_size).floor();
    [scaled.x as i32, scaled.y as i32, scaled.z as i32]
}

/// Residues with at least one atom at a distance in `[min_dist, max_dist]`
/// from any of the `central` atoms, in model order.
pub fn select_residues_within_radius(
    model: &Model,
    central: &[AtomRef],
    min_dist: f32,
    max_dist: f32,
) -> Vec<ResidueRef> {
    if central.is_empty() || max_dist < min_dist {
        return Vec::new();
    }

    let grid = SpatialGrid::new(
        central
            .iter()
            .filter_map(|&r| model.atom(r).map(|a| (a.pos, r))),
        max_dist,
    );

    let residues: Vec<ResidueRef> = model
        .residues()
        .filter(|(_, residue)| {
            residue
                .atoms
                .iter()
                .any(|atom| grid.any_within(atom.pos, min_dist, max_dist, |_| true))
        })
        .map(|(r, _)| r)
        .collect();

    tracing::trace!(
        central = central.len(),
        found = residues.len(),
        min_dist,
        max_dist,
        "residues within radius"
    );
    residues
}
