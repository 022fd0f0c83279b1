//! Core data types: unit cell, symmetry operators and the model store.

pub mod cell;
pub mod model;
pub mod symmetry;

// Re-export commonly used items
pub use cell::{CellError, CrystalCell};
pub use model::{Atom, AtomRef, Chain, Model, Residue, ResidueRef};
pub use symmetry::{CellTranslation, SymOp, SymOpError, SymOpTable, SymmTrans};
