//! Compose render-ready transforms for symmetry mates.
//!
//! Each mate is placed by two orthogonal-frame matrices:
//! - `origin_shift`: moves the model back by its cell translation `(-u, -v, -w)`
//! - `op`: applies operator `isym` plus its extra fractional shift
//!
//! and the mate transform is `op * origin_shift`, i.e. the origin shift is
//! applied to coordinates first. The order matters whenever the operator
//! has a rotation and the cell translation is non-zero.
//!
//! # Output layout
//!
//! Matrices are handed out as 16 `f32` values in column-major order:
//! `out[col * 4 + row] = m[row][col]`, so the translation occupies
//! `out[12..15]`. This is the layout WebGL-style uniform uploads expect;
//! a row-major reading of the same array silently corrupts geometry.

use glam::{DMat4, DVec3};
use serde::Serialize;

use super::symmetry_search::{search_symmetry, SymmetryError};
use crate::types::cell::CrystalCell;
use crate::types::model::Model;
use crate::types::symmetry::{CellTranslation, SymOpTable, SymmTrans};

/// One symmetry-equivalent copy of the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymmetryMate {
    pub symm_trans: SymmTrans,
    pub cell_translation: CellTranslation,
    /// Column-major 4x4 transform.
    pub matrix: [f32; 16],
}

/// Cell info plus one mate per placement, in search order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymmetryMates {
    pub cell: Option<CrystalCell>,
    pub mates: Vec<SymmetryMate>,
}

impl SymmetryMates {
    /// Just the matrices, aligned with `mates`.
    pub fn matrices(&self) -> Vec<[f32; 16]> {
        self.mates.iter().map(|m| m.matrix).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// `op * origin_shift` for one (operator, cell translation) pair.
pub fn compose_symmetry_transform(
    cell: &CrystalCell,
    symops: &SymOpTable,
    symm_trans: &SymmTrans,
    cell_translation: &CellTranslation,
) -> Result<DMat4, SymmetryError> {
    let op = symops
        .get(symm_trans.isym)
        .ok_or(SymmetryError::UnknownOperator {
            isym: symm_trans.isym,
            len: symops.len(),
        })?;
    let origin_shift = cell.origin_shift_transform(cell_translation);
    let op_transform = cell.symop_transform(op, symm_trans.shift());
    Ok(op_transform * origin_shift)
}

/// Flatten to the column-major `f32` layout described in the module docs.
pub fn to_render_layout(m: &DMat4) -> [f32; 16] {
    m.to_cols_array().map(|v| v as f32)
}

/// Compose one transform per pair, preserving order. No filtering.
pub fn compose_symmetry_transforms(
    cell: &CrystalCell,
    symops: &SymOpTable,
    pairs: &[(SymmTrans, CellTranslation)],
) -> Result<Vec<SymmetryMate>, SymmetryError> {
    pairs
        .iter()
        .map(|(symm_trans, cell_translation)| {
            let m = compose_symmetry_transform(cell, symops, symm_trans, cell_translation)?;
            Ok(SymmetryMate {
                symm_trans: *symm_trans,
                cell_translation: *cell_translation,
                matrix: to_render_layout(&m),
            })
        })
        .collect()
}

/// Symmetry mates of `model` within `radius` of `origin`.
///
/// A model without a crystal cell yields an empty list.
pub fn symmetry_mates(model: &Model, radius: f64, origin: DVec3) -> Result<SymmetryMates, SymmetryError> {
    let info = search_symmetry(model, radius, origin)?;
    let Some(cell) = info.cell else {
        return Ok(SymmetryMates {
            cell: None,
            mates: Vec::new(),
        });
    };
    let mates = compose_symmetry_transforms(&cell, &model.symops, &info.symm_trans)?;
    Ok(SymmetryMates {
        cell: Some(cell),
        mates,
    })
}
