//! Residues near an atom selection, encoded as a chain-grouped CID string.
//!
//! Encoding: `chain/token,token|chain/token`, where a token is the residue
//! sequence number, followed by `.insCode` when the insertion code is set.
//! Chains appear in the order they are first encountered, not sorted, and
//! tokens keep the order the spatial search returned them in.

use std::collections::HashMap;
use thiserror::Error;

use super::cid::resolve_selection;
use super::spatial::select_residues_within_radius;
use crate::types::model::{Model, ResidueRef};

/// Atoms closer than this to a central atom are treated as the central atom
/// itself and never count as neighbours.
pub const NEIGHBOR_MIN_DIST: f32 = 0.4;

const GROUP_SEPARATOR: char = '|';
const CHAIN_SEPARATOR: char = '/';
const TOKEN_SEPARATOR: char = ',';

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeighborError {
    #[error("neighbour search radius must be a non-negative number, got {0}")]
    InvalidRadius(f32),
    #[error("malformed neighbour group '{0}'")]
    MalformedGroup(String),
}

/// Residue tokens of one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborGroup {
    pub chain_id: String,
    pub tokens: Vec<String>,
}

/// `12` or `12.A`.
pub fn residue_token(seq_num: i32, ins_code: &str) -> String {
    if ins_code.is_empty() {
        seq_num.to_string()
    } else {
        format!("{seq_num}.{ins_code}")
    }
}

/// Group residues by chain, in first-encountered chain order.
///
/// Residues of a chain with a blank identifier are dropped: they cannot be
/// addressed as `chain/token`.
pub fn group_by_chain(model: &Model, residues: &[ResidueRef]) -> Vec<NeighborGroup> {
    let mut groups: Vec<NeighborGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for &r in residues {
        let (Some(chain), Some(residue)) = (model.chain_of(r), model.residue(r)) else {
            continue;
        };
        if chain.id.trim().is_empty() {
            tracing::warn!(
                model = %model.name,
                seq_num = residue.seq_num,
                "skipping neighbour residue in chain with blank id"
            );
            continue;
        }
        let slot = *index.entry(chain.id.as_str()).or_insert_with(|| {
            groups.push(NeighborGroup {
                chain_id: chain.id.clone(),
                tokens: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot]
            .tokens
            .push(residue_token(residue.seq_num, &residue.ins_code));
    }
    groups
}

/// Serialise groups as `A/1,2|B/7`. No groups gives an empty string.
pub fn encode_neighbor_groups(groups: &[NeighborGroup]) -> String {
    let mut out = String::new();
    for group in groups.iter().filter(|g| !g.tokens.is_empty()) {
        out.push_str(&group.chain_id);
        out.push(CHAIN_SEPARATOR);
        out.push_str(&group.tokens.join(&TOKEN_SEPARATOR.to_string()));
        out.push(GROUP_SEPARATOR);
    }
    // drop the trailing group separator
    out.pop();
    out
}

/// Parse an encoded string back into its groups.
pub fn decode_neighbor_cid(encoded: &str) -> Result<Vec<NeighborGroup>, NeighborError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    encoded
        .split(GROUP_SEPARATOR)
        .map(|group| {
            let (chain_id, tokens) = group
                .split_once(CHAIN_SEPARATOR)
                .ok_or_else(|| NeighborError::MalformedGroup(group.to_string()))?;
            let tokens: Vec<String> = tokens.split(TOKEN_SEPARATOR).map(str::to_string).collect();
            if chain_id.is_empty() || tokens.iter().any(String::is_empty) {
                return Err(NeighborError::MalformedGroup(group.to_string()));
            }
            Ok(NeighborGroup {
                chain_id: chain_id.to_string(),
                tokens,
            })
        })
        .collect()
}

/// Residues within `max_dist` of the atoms selected by `central_cid`,
/// in model order. An unmatched or unparsable CID gives no residues.
pub fn neighbour_residues(
    model: &Model,
    central_cid: &str,
    max_dist: f32,
) -> Result<Vec<ResidueRef>, NeighborError> {
    if !(max_dist.is_finite() && max_dist >= 0.0) {
        return Err(NeighborError::InvalidRadius(max_dist));
    }
    let central = resolve_selection(model, central_cid);
    if central.is_empty() {
        tracing::debug!(model = %model.name, cid = central_cid, "central selection is empty");
        return Ok(Vec::new());
    }
    Ok(select_residues_within_radius(
        model,
        &central,
        NEIGHBOR_MIN_DIST,
        max_dist,
    ))
}

/// Encoded CID of the residues within `max_dist` of `central_cid`.
pub fn neighbours_cid(model: &Model, central_cid: &str, max_dist: f32) -> Result<String, NeighborError> {
    let residues = neighbour_residues(model, central_cid, max_dist)?;
    let encoded = encode_neighbor_groups(&group_by_chain(model, &residues));
    tracing::debug!(
        model = %model.name,
        cid = central_cid,
        max_dist,
        residues = residues.len(),
        "neighbours cid"
    );
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::model::{Atom, Chain, Residue};
    use glam::Vec3;

    fn residue(seq: i32, ins: &str, pos: Vec3) -> Residue {
        Residue::new(seq, ins, "ALA").with_atom(Atom::new("CA", "C", pos))
    }

    /// Chain A residues 5 (origin), 6 (3.8 A) and 9 (far); chain B residue 10 (3 A).
    fn neighbour_model() -> Model {
        Model::new("neighbours")
            .with_chain(
                Chain::new("A")
                    .with_residue(residue(5, "", Vec3::ZERO))
                    .with_residue(residue(6, "", Vec3::new(3.8, 0.0, 0.0)))
                    .with_residue(residue(9, "", Vec3::new(20.0, 0.0, 0.0))),
            )
            .with_chain(Chain::new("B").with_residue(residue(10, "", Vec3::new(0.0, 3.0, 0.0))))
    }

    #[test]
    fn test_residue_token() {
        assert_eq!(residue_token(12, ""), "12");
        assert_eq!(residue_token(12, "A"), "12.A");
        assert_eq!(residue_token(-3, ""), "-3");
    }

    #[test]
    fn test_seed_residue_excluded_by_floor() {
        let model = neighbour_model();
        assert_eq!(neighbours_cid(&model, "//A/5", 4.0).unwrap(), "A/6|B/10");
    }

    #[test]
    fn test_empty_selection_gives_empty_string() {
        let model = neighbour_model();
        assert_eq!(neighbours_cid(&model, "//Z/1", 4.0).unwrap(), "");
        assert_eq!(neighbours_cid(&model, "A/not-a-number", 4.0).unwrap(), "");
        // a valid selection with nothing around it
        assert_eq!(neighbours_cid(&model, "A/9", 4.0).unwrap(), "");
    }

    #[test]
    fn test_insertion_codes_and_chain_order() {
        // chain B is encountered first in model order
        let model = Model::new("ins")
            .with_chain(Chain::new("B").with_residue(residue(7, "", Vec3::new(0.0, 0.0, 2.0))))
            .with_chain(
                Chain::new("A")
                    .with_residue(residue(1, "", Vec3::ZERO))
                    .with_residue(residue(12, "", Vec3::new(2.0, 0.0, 0.0)))
                    .with_residue(residue(12, "A", Vec3::new(0.0, 2.0, 0.0))),
            );
        assert_eq!(neighbours_cid(&model, "A/1", 3.0).unwrap(), "B/7|A/12,12.A");
    }

    #[test]
    fn test_encode_scenario() {
        let groups = vec![
            NeighborGroup {
                chain_id: "A".to_string(),
                tokens: vec!["12".to_string(), "12.A".to_string()],
            },
            NeighborGroup {
                chain_id: "B".to_string(),
                tokens: vec!["7".to_string()],
            },
        ];
        let encoded = encode_neighbor_groups(&groups);
        assert_eq!(encoded, "A/12,12.A|B/7");
        assert_eq!(decode_neighbor_cid(&encoded).unwrap(), groups);
        assert_eq!(encode_neighbor_groups(&[]), "");
    }

    #[test]
    fn test_group_by_chain_keeps_first_encounter_order() {
        let model = neighbour_model();
        let residues = vec![
            ResidueRef { chain: 1, residue: 0 },
            ResidueRef { chain: 0, residue: 2 },
            ResidueRef { chain: 0, residue: 1 },
        ];
        let groups = group_by_chain(&model, &residues);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].chain_id, "B");
        assert_eq!(groups[1].tokens, vec!["9", "6"]);
        assert_eq!(encode_neighbor_groups(&groups), "B/10|A/9,6");
    }

    #[test]
    fn test_blank_chain_id_is_not_encoded() {
        let model = Model::new("waters")
            .with_chain(Chain::new("A").with_residue(residue(5, "", Vec3::ZERO)))
            .with_chain(Chain::new("").with_residue(residue(301, "", Vec3::new(3.0, 0.0, 0.0))))
            .with_chain(Chain::new("B").with_residue(residue(10, "", Vec3::new(0.0, 3.0, 0.0))));

        let encoded = neighbours_cid(&model, "A/5", 4.0).unwrap();
        assert_eq!(encoded, "B/10");
        assert!(decode_neighbor_cid(&encoded).is_ok());

        // only the blank chain is nearby
        let alone = Model::new("water")
            .with_chain(Chain::new("A").with_residue(residue(5, "", Vec3::ZERO)))
            .with_chain(Chain::new(" ").with_residue(residue(301, "", Vec3::new(3.0, 0.0, 0.0))));
        assert_eq!(neighbours_cid(&alone, "A/5", 4.0).unwrap(), "");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode_neighbor_cid("").unwrap().is_empty());
        assert!(matches!(decode_neighbor_cid("A12"), Err(NeighborError::MalformedGroup(_))));
        assert!(matches!(decode_neighbor_cid("A/1|"), Err(NeighborError::MalformedGroup(_))));
        assert!(matches!(decode_neighbor_cid("A/1,,2"), Err(NeighborError::MalformedGroup(_))));
    }

    #[test]
    fn test_invalid_radius() {
        let model = neighbour_model();
        assert_eq!(
            neighbours_cid(&model, "A/5", -1.0),
            Err(NeighborError::InvalidRadius(-1.0))
        );
        assert!(neighbours_cid(&model, "A/5", f32::INFINITY).is_err());
        // zero radius is allowed and finds nothing past the floor
        assert_eq!(neighbours_cid(&model, "A/5", 0.0).unwrap(), "");
    }
}
