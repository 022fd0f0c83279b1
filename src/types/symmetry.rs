//! Space-group symmetry operators and the per-mate symmetry metadata.
//!
//! Operators act on fractional coordinates: `x' = R·x + t`. A `SymOpTable`
//! always starts with the identity so that `isym == 0` means "no operator".

use glam::{DMat3, DVec3};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while parsing operator strings or building a table.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymOpError {
    #[error("operator '{0}' must have three comma-separated components")]
    ComponentCount(String),
    #[error("cannot parse term '{term}' in operator '{op}'")]
    InvalidTerm { op: String, term: String },
    #[error("operator '{0}' has a singular rotation part")]
    SingularRotation(String),
    #[error("first operator of a table must be the identity, got '{0}'")]
    MissingIdentity(String),
}

/// One space-group operation in fractional space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymOp {
    pub rotation: DMat3,
    pub translation: DVec3,
}

impl SymOp {
    pub fn new(rotation: DMat3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(DMat3::IDENTITY, DVec3::ZERO)
    }

    pub fn is_identity(&self) -> bool {
        self.rotation.abs_diff_eq(DMat3::IDENTITY, 1e-9)
            && self.translation.abs_diff_eq(DVec3::ZERO, 1e-9)
    }

    /// Apply to a fractional coordinate.
    pub fn apply(&self, f: DVec3) -> DVec3 {
        self.rotation * f + self.translation
    }

    /// Parse an xyz-triplet such as `-x,y+1/2,-z` or `x-y,x,z+5/6`.
    pub fn parse(triplet: &str) -> Result<Self, SymOpError> {
        let components: Vec<&str> = triplet.split(',').collect();
        if components.len() != 3 {
            return Err(SymOpError::ComponentCount(triplet.to_string()));
        }

        let mut rows = [DVec3::ZERO; 3];
        let mut translation = DVec3::ZERO;
        for (i, component) in components.iter().enumerate() {
            let (row, constant) = parse_component(triplet, component)?;
            rows[i] = row;
            translation[i] = constant;
        }

        let rotation = DMat3::from_cols(rows[0], rows[1], rows[2]).transpose();
        if rotation.determinant().abs() < 1e-9 {
            return Err(SymOpError::SingularRotation(triplet.to_string()));
        }
        Ok(Self::new(rotation, translation))
    }

    /// Render back to xyz-triplet form, e.g. `-x,y+1/2,-z`.
    pub fn to_triplet(&self) -> String {
        (0..3)
            .map(|i| format_component(self.rotation.row(i), self.translation[i]))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Split one component into signed terms and accumulate axis coefficients.
fn parse_component(op: &str, component: &str) -> Result<(DVec3, f64), SymOpError> {
    let cleaned: String = component
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    let invalid = |term: &str| SymOpError::InvalidTerm {
        op: op.to_string(),
        term: term.to_string(),
    };
    if cleaned.is_empty() {
        return Err(invalid(component));
    }

    let mut terms: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in cleaned.chars() {
        if (ch == '+' || ch == '-') && !current.is_empty() && current != "+" && current != "-" {
            terms.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    terms.push(current);

    let mut row = DVec3::ZERO;
    let mut constant = 0.0;
    for term in &terms {
        let (sign, body) = match term.strip_prefix('-') {
            Some(rest) => (-1.0, rest),
            None => (1.0, term.strip_prefix('+').unwrap_or(term)),
        };
        if body.is_empty() {
            return Err(invalid(term));
        }

        let axis = match body.chars().last() {
            Some('x') => Some(0),
            Some('y') => Some(1),
            Some('z') => Some(2),
            _ => None,
        };
        match axis {
            Some(axis) => {
                let coefficient = body[..body.len() - 1].trim_end_matches('*');
                let value = if coefficient.is_empty() {
                    1.0
                } else {
                    parse_number(coefficient).ok_or_else(|| invalid(term))?
                };
                row[axis] += sign * value;
            }
            None => constant += sign * parse_number(body).ok_or_else(|| invalid(term))?,
        }
    }
    Ok((row, constant))
}

/// Decimal or `a/b` fraction.
fn parse_number(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            Some(num.parse::<f64>().ok()? / den)
        }
        None => s.parse().ok(),
    }
}

fn format_component(row: DVec3, constant: f64) -> String {
    let mut out = String::new();
    for (axis, name) in ['x', 'y', 'z'].iter().enumerate() {
        let coefficient = row[axis];
        if coefficient.abs() < 1e-9 {
            continue;
        }
        let sign = if coefficient < 0.0 { "-" } else if out.is_empty() { "" } else { "+" };
        if (coefficient.abs() - 1.0).abs() < 1e-9 {
            out.push_str(&format!("{sign}{name}"));
        } else {
            out.push_str(&format!("{sign}{}*{name}", format_number(coefficient.abs())));
        }
    }
    if constant.abs() > 1e-9 {
        let sign = if constant < 0.0 { "-" } else if out.is_empty() { "" } else { "+" };
        out.push_str(&format!("{sign}{}", format_number(constant.abs())));
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

/// Prefer small-denominator fractions, the way operator tables are written.
fn format_number(value: f64) -> String {
    for den in [1u32, 2, 3, 4, 6, 8, 12] {
        let num = value * den as f64;
        if (num - num.round()).abs() < 1e-6 {
            let num = num.round() as i64;
            return if den == 1 {
                num.to_string()
            } else {
                format!("{num}/{den}")
            };
        }
    }
    format!("{value}")
}

/// Ordered operator list for one space group; index 0 is the identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SymOpTable {
    ops: Vec<SymOp>,
}

impl SymOpTable {
    /// Build from explicit operators. The first must be the identity.
    pub fn from_ops(ops: Vec<SymOp>) -> Result<Self, SymOpError> {
        match ops.first().map(SymOp::is_identity) {
            None => Ok(Self::p1()),
            Some(true) => Ok(Self { ops }),
            Some(false) => Err(SymOpError::MissingIdentity(ops[0].to_triplet())),
        }
    }

    /// Build from xyz-triplet strings, e.g. the `_symmetry_equiv_pos_as_xyz` loop.
    pub fn from_triplets(triplets: &[&str]) -> Result<Self, SymOpError> {
        let ops = triplets
            .iter()
            .map(|t| SymOp::parse(t))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_ops(ops)
    }

    /// The trivial space group: identity only.
    pub fn p1() -> Self {
        Self {
            ops: vec![SymOp::identity()],
        }
    }

    pub fn get(&self, isym: usize) -> Option<&SymOp> {
        self.ops.get(isym)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymOp> {
        self.ops.iter()
    }
}

impl Default for SymOpTable {
    fn default() -> Self {
        Self::p1()
    }
}

/// Operator index plus an extra fractional translation placing one mate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SymmTrans {
    pub isym: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SymmTrans {
    pub fn new(isym: usize, x: f64, y: f64, z: f64) -> Self {
        Self { isym, x, y, z }
    }

    pub fn shift(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Identity operator with no extra translation.
    pub fn is_identity(&self) -> bool {
        self.isym == 0 && self.shift() == DVec3::ZERO
    }

    pub fn add_shift(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Operator with the shift folded in, as an xyz-triplet.
    pub fn symm_as_string(&self, table: &SymOpTable) -> Option<String> {
        let op = table.get(self.isym)?;
        Some(SymOp::new(op.rotation, op.translation + self.shift()).to_triplet())
    }
}

/// Whole-cell shift of the model relative to the origin cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CellTranslation {
    pub us: i32,
    pub vs: i32,
    pub ws: i32,
}

impl CellTranslation {
    pub fn new(us: i32, vs: i32, ws: i32) -> Self {
        Self { us, vs, ws }
    }

    pub fn is_zero(&self) -> bool {
        self.us == 0 && self.vs == 0 && self.ws == 0
    }

    pub fn as_dvec3(&self) -> DVec3 {
        DVec3::new(self.us as f64, self.vs as f64, self.ws as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identity_and_screw() {
        assert!(SymOp::parse("x,y,z").unwrap().is_identity());

        let op = SymOp::parse("-x, y+1/2, -z").unwrap();
        let f = op.apply(DVec3::new(0.1, 0.2, 0.3));
        assert!(f.abs_diff_eq(DVec3::new(-0.1, 0.7, -0.3), 1e-12));
    }

    #[test]
    fn test_parse_hexagonal_terms() {
        // P6(1) style operator with mixed axes and a leading constant
        let op = SymOp::parse("X-Y,1/6+X,Z").unwrap();
        let f = op.apply(DVec3::new(0.5, 0.25, 0.0));
        assert!(f.abs_diff_eq(DVec3::new(0.25, 0.5 + 1.0 / 6.0, 0.0), 1e-12));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            SymOp::parse("x,y"),
            Err(SymOpError::ComponentCount("x,y".to_string()))
        );
        assert!(matches!(SymOp::parse("x,q,z"), Err(SymOpError::InvalidTerm { .. })));
        assert!(matches!(SymOp::parse("x,x,z"), Err(SymOpError::SingularRotation(_))));
        assert!(matches!(SymOp::parse("x,y,z+1/0"), Err(SymOpError::InvalidTerm { .. })));
    }

    #[test]
    fn test_triplet_rendering() {
        assert_eq!(SymOp::parse("-x,y+1/2,-z").unwrap().to_triplet(), "-x,y+1/2,-z");
        assert_eq!(SymOp::parse("x-y,x,z+5/6").unwrap().to_triplet(), "x-y,x,z+5/6");
        assert_eq!(SymOp::identity().to_triplet(), "x,y,z");
    }

    #[test]
    fn test_table_requires_identity_first() {
        let table = SymOpTable::from_triplets(&["x,y,z", "-x,y+1/2,-z"]).unwrap();
        assert_eq!(table.len(), 2);
        assert!(matches!(
            SymOpTable::from_triplets(&["-x,y+1/2,-z", "x,y,z"]),
            Err(SymOpError::MissingIdentity(_))
        ));
        assert_eq!(SymOpTable::from_ops(Vec::new()).unwrap(), SymOpTable::p1());
    }

    #[test]
    fn test_symm_trans_string_includes_shift() {
        let table = SymOpTable::from_triplets(&["x,y,z", "-x,y+1/2,-z"]).unwrap();
        let mut st = SymmTrans::new(1, 0.0, 0.0, 0.0);
        st.add_shift(1.0, 0.0, -1.0);
        assert_eq!(st.symm_as_string(&table).unwrap(), "-x+1,y+1/2,-z-1");
        assert!(!st.is_identity());
        assert!(SymmTrans::new(0, 0.0, 0.0, 0.0).is_identity());
        assert!(SymmTrans::new(5, 0.0, 0.0, 0.0).symm_as_string(&table).is_none());
    }
}
