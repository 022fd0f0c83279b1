//! In-memory macromolecular model: chains -> residues -> atoms, plus the
//! crystal cell and operator table needed for symmetry queries.
//!
//! Atoms are addressed by index triples (`AtomRef`) rather than references,
//! so selection results stay valid across borrows and are cheap to copy.

use glam::{DVec3, Vec3};

use super::cell::CrystalCell;
use super::symmetry::SymOpTable;

/// Single atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom name, e.g. `CA` (stored trimmed).
    pub name: String,
    /// Element symbol, e.g. `C`, `SE`.
    pub element: String,
    /// Alternate location indicator, empty when absent.
    pub alt_loc: String,
    pub pos: Vec3,
}

impl Atom {
    pub fn new(name: impl Into<String>, element: impl Into<String>, pos: Vec3) -> Self {
        Self {
            name: name.into().trim().to_string(),
            element: element.into().trim().to_ascii_uppercase(),
            alt_loc: String::new(),
            pos,
        }
    }

    pub fn with_alt_loc(mut self, alt_loc: impl Into<String>) -> Self {
        self.alt_loc = alt_loc.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub seq_num: i32,
    /// Insertion code, empty when absent.
    pub ins_code: String,
    /// Residue name, e.g. `ALA`, `HOH`.
    pub name: String,
    pub atoms: Vec<Atom>,
}

impl Residue {
    pub fn new(seq_num: i32, ins_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            seq_num,
            ins_code: ins_code.into().trim().to_string(),
            name: name.into().trim().to_string(),
            atoms: Vec::new(),
        }
    }

    pub fn with_atom(mut self, atom: Atom) -> Self {
        self.atoms.push(atom);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: String,
    pub residues: Vec<Residue>,
}

impl Chain {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            residues: Vec::new(),
        }
    }

    pub fn with_residue(mut self, residue: Residue) -> Self {
        self.residues.push(residue);
        self
    }
}

/// Index of an atom inside a `Model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomRef {
    pub chain: usize,
    pub residue: usize,
    pub atom: usize,
}

impl AtomRef {
    pub fn residue_ref(&self) -> ResidueRef {
        ResidueRef {
            chain: self.chain,
            residue: self.residue,
        }
    }
}

/// Index of a residue inside a `Model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueRef {
    pub chain: usize,
    pub residue: usize,
}

/// A loaded model. `cell` is `None` for models without crystal data
/// (e.g. cryo-EM or predicted structures).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub name: String,
    pub cell: Option<CrystalCell>,
    pub symops: SymOpTable,
    pub chains: Vec<Chain>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_cell(mut self, cell: CrystalCell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn with_symops(mut self, symops: SymOpTable) -> Self {
        self.symops = symops;
        self
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chains.push(chain);
        self
    }

    // -- Lookup --

    pub fn atom(&self, r: AtomRef) -> Option<&Atom> {
        self.chains.get(r.chain)?.residues.get(r.residue)?.atoms.get(r.atom)
    }

    pub fn residue(&self, r: ResidueRef) -> Option<&Residue> {
        self.chains.get(r.chain)?.residues.get(r.residue)
    }

    pub fn chain_of(&self, r: ResidueRef) -> Option<&Chain> {
        self.chains.get(r.chain)
    }

    /// All atoms in model order (chain, residue, atom).
    pub fn atoms(&self) -> impl Iterator<Item = (AtomRef, &Atom)> + '_ {
        self.chains.iter().enumerate().flat_map(|(ci, chain)| {
            chain.residues.iter().enumerate().flat_map(move |(ri, residue)| {
                residue.atoms.iter().enumerate().map(move |(ai, atom)| {
                    (
                        AtomRef {
                            chain: ci,
                            residue: ri,
                            atom: ai,
                        },
                        atom,
                    )
                })
            })
        })
    }

    /// All residues in model order.
    pub fn residues(&self) -> impl Iterator<Item = (ResidueRef, &Residue)> + '_ {
        self.chains.iter().enumerate().flat_map(|(ci, chain)| {
            chain.residues.iter().enumerate().map(move |(ri, residue)| {
                (
                    ResidueRef {
                        chain: ci,
                        residue: ri,
                    },
                    residue,
                )
            })
        })
    }

    // -- Derived data --

    pub fn atom_count(&self) -> usize {
        self.chains
            .iter()
            .flat_map(|c| c.residues.iter())
            .map(|r| r.atoms.len())
            .sum()
    }

    /// Geometric centre of all atoms. `None` for an empty model.
    pub fn centroid(&self) -> Option<DVec3> {
        let n = self.atom_count();
        if n == 0 {
            return None;
        }
        let sum: DVec3 = self.atoms().map(|(_, a)| a.pos.as_dvec3()).sum();
        Some(sum / n as f64)
    }
}
