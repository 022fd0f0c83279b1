//! Handle-indexed store of loaded models.
//!
//! Each model lives in an arena slot addressed by a `ModelHandle`. Slots
//! are never reused, so a handle to a removed model stays invalid instead
//! of silently pointing at a newer model.

use glam::DVec3;
use std::fmt;
use thiserror::Error;

use crate::config::Config;
use crate::ops::neighbors::{neighbours_cid, NeighborError};
use crate::ops::symmetry_mates::{symmetry_mates, SymmetryMates};
use crate::ops::symmetry_search::SymmetryError;
use crate::types::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(u32);

impl ModelHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("no model loaded for handle {0}")]
    InvalidHandle(ModelHandle),
    #[error(transparent)]
    Symmetry(#[from] SymmetryError),
    #[error(transparent)]
    Neighbor(#[from] NeighborError),
}

#[derive(Debug, Default)]
pub struct ModelRegistry {
    slots: Vec<Option<Model>>,
    config: Config,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            slots: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // -- Lifecycle --

    pub fn insert(&mut self, model: Model) -> ModelHandle {
        let handle = ModelHandle(self.slots.len() as u32);
        tracing::debug!(%handle, name = %model.name, atoms = model.atom_count(), "model registered");
        self.slots.push(Some(model));
        handle
    }

    pub fn remove(&mut self, handle: ModelHandle) -> Option<Model> {
        self.slots.get_mut(handle.0 as usize)?.take()
    }

    pub fn get(&self, handle: ModelHandle) -> Result<&Model, RegistryError> {
        self.slots
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(RegistryError::InvalidHandle(handle))
    }

    pub fn get_mut(&mut self, handle: ModelHandle) -> Result<&mut Model, RegistryError> {
        self.slots
            .get_mut(handle.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(RegistryError::InvalidHandle(handle))
    }

    /// Number of live models.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn handles(&self) -> impl Iterator<Item = ModelHandle> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| ModelHandle(i as u32))
    }

    // -- Queries --

    /// Symmetry mates within `radius` of `(x, y, z)`.
    pub fn symmetry_mates(
        &self,
        handle: ModelHandle,
        radius: f64,
        x: f64,
        y: f64,
        z: f64,
    ) -> Result<SymmetryMates, RegistryError> {
        let model = self.get(handle)?;
        Ok(symmetry_mates(model, radius, DVec3::new(x, y, z))?)
    }

    /// Symmetry mates using the configured radius.
    pub fn symmetry_mates_default(
        &self,
        handle: ModelHandle,
        x: f64,
        y: f64,
        z: f64,
    ) -> Result<SymmetryMates, RegistryError> {
        self.symmetry_mates(handle, self.config.symmetry.radius, x, y, z)
    }

    /// `|`-separated CID of residues within `max_dist` of `central_cid`.
    pub fn neighbours_cid(
        &self,
        handle: ModelHandle,
        central_cid: &str,
        max_dist: f32,
    ) -> Result<String, RegistryError> {
        let model = self.get(handle)?;
        Ok(neighbours_cid(model, central_cid, max_dist)?)
    }

    /// Neighbour CID using the configured radius.
    pub fn neighbours_cid_default(&self, handle: ModelHandle, central_cid: &str) -> Result<String, RegistryError> {
        self.neighbours_cid(handle, central_cid, self.config.neighbors.max_dist)
    }
}
