//! Find the symmetry-related copies of a model that come within a radius
//! of a point.
//!
//! The model is first moved into the origin cell by the integer cell
//! translation of its centroid. Each operator is then tried with the
//! whole-cell shifts that can bring its copy near the point.

use glam::DVec3;
use serde::Serialize;
use thiserror::Error;

use crate::types::cell::CrystalCell;
use crate::types::model::Model;
use crate::types::symmetry::{CellTranslation, SymOp, SymmTrans};

/// Largest cell-shift window searched along any axis, per side.
pub const MAX_CELL_WINDOW: i32 = 32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymmetryError {
    #[error("symmetry search radius must be positive, got {0}")]
    InvalidRadius(f64),
    #[error("symmetry search point must be finite, got {0}")]
    InvalidPoint(DVec3),
    #[error("radius {radius} needs {cells} cell shifts per side, limit is {}", MAX_CELL_WINDOW)]
    WindowTooLarge { radius: f64, cells: f64 },
    #[error("symmetry operator {isym} is not in the table ({len} operators)")]
    UnknownOperator { isym: usize, len: usize },
}

/// Result of a symmetry search: the cell and the placements found near the point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymmetryInfo {
    pub cell: Option<CrystalCell>,
    pub symm_trans: Vec<(SymmTrans, CellTranslation)>,
}

impl SymmetryInfo {
    fn empty(cell: Option<CrystalCell>) -> Self {
        Self {
            cell,
            symm_trans: Vec::new(),
        }
    }
}

/// Search for symmetry mates with any atom within `radius` of `point`.
///
/// Returns pairs ordered by operator index, then by shift. The placement
/// that reproduces the model itself is not reported. A model without a
/// cell, or without atoms, gives an empty result.
pub fn search_symmetry(model: &Model, radius: f64, point: DVec3) -> Result<SymmetryInfo, SymmetryError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(SymmetryError::InvalidRadius(radius));
    }
    if !point.is_finite() {
        return Err(SymmetryError::InvalidPoint(point));
    }
    let Some(cell) = model.cell.as_ref() else {
        tracing::debug!(model = %model.name, "no crystal cell, skipping symmetry search");
        return Ok(SymmetryInfo::empty(None));
    };
    let Some(centroid) = model.centroid() else {
        return Ok(SymmetryInfo::empty(Some(cell.clone())));
    };

    let positions: Vec<DVec3> = model.atoms().map(|(_, a)| a.pos.as_dvec3()).collect();
    let extent = positions
        .iter()
        .map(|p| p.distance(centroid))
        .fold(0.0_f64, f64::max);

    let centroid_frac = cell.to_fractional(centroid);
    let cell_trans = centroid_frac.floor().as_ivec3();
    let cell_translation = CellTranslation::new(cell_trans.x, cell_trans.y, cell_trans.z);
    let home_shift = cell_translation.as_dvec3();
    let origin_shift = cell.origin_shift_transform(&cell_translation);

    let point_frac = cell.to_fractional(point);
    let widths = cell.perpendicular_widths();
    let window = ((radius + extent) / widths).ceil() + DVec3::ONE;
    let cells = window.max_element();
    if cells > f64::from(MAX_CELL_WINDOW) {
        return Err(SymmetryError::WindowTooLarge { radius, cells });
    }
    let reach = window.as_ivec3();
    let radius_sq = radius * radius;

    let mut symm_trans = Vec::new();
    for (isym, op) in model.symops.iter().enumerate() {
        let mate_centre = op.apply(centroid_frac - home_shift);
        // whole-cell shifts stay in f64 so far-away points cannot overflow
        let nearest = (point_frac - mate_centre).round();

        for dx in -reach.x..=reach.x {
            for dy in -reach.y..=reach.y {
                for dz in -reach.z..=reach.z {
                    let shift = nearest + DVec3::new(f64::from(dx), f64::from(dy), f64::from(dz));
                    if isym == 0 && shift == home_shift {
                        continue;
                    }

                    let centre = cell.to_cartesian(mate_centre + shift);
                    if centre.distance(point) > radius + extent {
                        continue;
                    }

                    if mate_within(cell, op, shift, &origin_shift, &positions, point, radius_sq) {
                        symm_trans.push((
                            SymmTrans::new(isym, shift.x, shift.y, shift.z),
                            cell_translation,
                        ));
                    }
                }
            }
        }
    }

    tracing::debug!(
        model = %model.name,
        radius,
        operators = model.symops.len(),
        found = symm_trans.len(),
        "symmetry search"
    );
    Ok(SymmetryInfo {
        cell: Some(cell.clone()),
        symm_trans,
    })
}

fn mate_within(
    cell: &CrystalCell,
    op: &SymOp,
    shift: DVec3,
    origin_shift: &glam::DMat4,
    positions: &[DVec3],
    point: DVec3,
    radius_sq: f64,
) -> bool {
    let m = cell.symop_transform(op, shift) * *origin_shift;
    positions
        .iter()
        .any(|&p| m.transform_point3(p).distance_squared(point) <= radius_sq)
}
