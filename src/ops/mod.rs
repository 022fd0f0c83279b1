//! Queries over a model: selections, spatial search, symmetry mates and neighbours.

pub mod cid;
pub mod neighbors;
pub mod spatial;
pub mod symmetry_mates;
pub mod symmetry_search;

// Re-export commonly used items
pub use cid::{resolve_selection, Cid, CidError, CidSelection, ResPos, ResidueSpec};
pub use neighbors::{
    decode_neighbor_cid, encode_neighbor_groups, group_by_chain, neighbour_residues,
    neighbours_cid, residue_token, NeighborError, NeighborGroup, NEIGHBOR_MIN_DIST,
};
pub use spatial::{select_residues_within_radius, SpatialGrid};
pub use symmetry_mates::{
    compose_symmetry_transform, compose_symmetry_transforms, symmetry_mates, to_render_layout,
    SymmetryMate, SymmetryMates,
};
pub use symmetry_search::{search_symmetry, SymmetryError, SymmetryInfo, MAX_CELL_WINDOW};
