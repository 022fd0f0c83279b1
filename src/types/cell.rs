//! Crystallographic unit cell.
//!
//! Holds the six cell parameters together with the precomputed
//! orthogonalisation (fractional -> Cartesian) and fractionalisation
//! (Cartesian -> fractional) matrices. The orthogonal frame follows the
//! PDB convention: `a` along x, `b` in the xy plane.

use glam::{DMat3, DMat4, DVec3};
use serde::Serialize;
use thiserror::Error;

use super::symmetry::{CellTranslation, SymOp};

/// Errors raised when building a cell from invalid parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("cell edge {axis} must be positive, got {value}")]
    NonPositiveLength { axis: char, value: f64 },
    #[error("cell angle {axis} must lie in (0, 180) degrees, got {value}")]
    AngleOutOfRange { axis: char, value: f64 },
    #[error("cell angles ({0}, {1}, {2}) do not describe a cell with positive volume")]
    DegenerateAngles(f64, f64, f64),
}

/// Unit cell with cached orthogonalisation matrices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrystalCell {
    /// Edge lengths a, b, c in Angstroms.
    pub lengths: [f64; 3],
    /// Angles alpha, beta, gamma in degrees.
    pub angles: [f64; 3],
    #[serde(skip)]
    ro: DMat3,
    #[serde(skip)]
    rf: DMat3,
}

impl CrystalCell {
    /// Build a cell from edge lengths (Angstroms) and angles (degrees).
    pub fn new(lengths: [f64; 3], angles: [f64; 3]) -> Result<Self, CellError> {
        for (axis, &value) in ['a', 'b', 'c'].iter().zip(lengths.iter()) {
            if !(value.is_finite() && value > 0.0) {
                return Err(CellError::NonPositiveLength { axis: *axis, value });
            }
        }
        for (axis, &value) in ['α', 'β', 'γ'].iter().zip(angles.iter()) {
            if !(value.is_finite() && value > 0.0 && value < 180.0) {
                return Err(CellError::AngleOutOfRange { axis: *axis, value });
            }
        }

        let [a, b, c] = lengths;
        let [ca, cb, cg] = angles.map(|deg| deg.to_radians().cos());
        let sb = angles[1].to_radians().sin();
        let sg = angles[2].to_radians().sin();

        let volume_factor = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        if volume_factor <= 1e-12 {
            return Err(CellError::DegenerateAngles(angles[0], angles[1], angles[2]));
        }

        // cos(alpha*) of the reciprocal cell
        let cas = (cb * cg - ca) / (sb * sg);
        let sas = (1.0 - cas * cas).max(0.0).sqrt();

        let ro = DMat3::from_cols(
            DVec3::new(a, 0.0, 0.0),
            DVec3::new(b * cg, b * sg, 0.0),
            DVec3::new(c * cb, -c * sb * cas, c * sb * sas),
        );
        let rf = ro.inverse();

        Ok(Self {
            lengths,
            angles,
            ro,
            rf,
        })
    }

    /// Cell volume in cubic Angstroms.
    pub fn volume(&self) -> f64 {
        self.ro.determinant()
    }

    /// Fractional -> Cartesian (RO) as a homogeneous 4x4 matrix.
    pub fn orthogonalisation(&self) -> DMat4 {
        DMat4::from_mat3(self.ro)
    }

    /// Cartesian -> fractional (RF) as a homogeneous 4x4 matrix.
    pub fn fractionalisation(&self) -> DMat4 {
        DMat4::from_mat3(self.rf)
    }

    pub fn to_fractional(&self, p: DVec3) -> DVec3 {
        self.rf * p
    }

    pub fn to_cartesian(&self, f: DVec3) -> DVec3 {
        self.ro * f
    }

    /// Distance between opposite faces of the cell along each fractional axis.
    ///
    /// A Cartesian displacement of length `d` changes fractional coordinate
    /// `i` by at most `d / widths[i]`.
    pub fn perpendicular_widths(&self) -> DVec3 {
        DVec3::new(
            1.0 / self.rf.row(0).length(),
            1.0 / self.rf.row(1).length(),
            1.0 / self.rf.row(2).length(),
        )
    }

    /// Orthogonal-frame matrix for a symmetry operator plus an extra
    /// fractional shift: `RO · [R | t + shift] · RF`.
    pub fn symop_transform(&self, op: &SymOp, shift: DVec3) -> DMat4 {
        let fractional = DMat4::from_cols(
            op.rotation.x_axis.extend(0.0),
            op.rotation.y_axis.extend(0.0),
            op.rotation.z_axis.extend(0.0),
            (op.translation + shift).extend(1.0),
        );
        self.orthogonalisation() * fractional * self.fractionalisation()
    }

    /// Pure translation that moves the model back by a whole number of cells.
    pub fn origin_shift_transform(&self, cell_trans: &CellTranslation) -> DMat4 {
        self.symop_transform(&SymOp::identity(), -cell_trans.as_dvec3())
    }
}
