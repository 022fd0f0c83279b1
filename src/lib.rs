//! Symmetry-mate transforms and residue neighbour queries for crystallographic
//! macromolecular models.
//!
//! - [`ops::symmetry_mates()`]: one column-major 4x4 transform per symmetry copy
//!   visible around a point
//! - [`ops::neighbours_cid()`]: residues near an atom selection, as
//!   `chain/res,res|chain/res`
//! - [`registry::ModelRegistry`]: handle-indexed model store exposing both queries

pub mod config;
pub mod error;
pub mod ops;
pub mod registry;
pub mod types;

pub use config::Config;
pub use error::Error;
pub use ops::{neighbours_cid, symmetry_mates, SymmetryMate, SymmetryMates};
pub use registry::{ModelHandle, ModelRegistry};
pub use types::{CrystalCell, Model, SymOpTable};
