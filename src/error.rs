//! Crate-level error wrapping the per-module errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::ops::{CidError, NeighborError, SymmetryError};
use crate::registry::RegistryError;
use crate::types::{CellError, SymOpError};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cell(#[from] CellError),
    #[error(transparent)]
    SymOp(#[from] SymOpError),
    #[error(transparent)]
    Cid(#[from] CidError),
    #[error(transparent)]
    Symmetry(#[from] SymmetryError),
    #[error(transparent)]
    Neighbor(#[from] NeighborError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
