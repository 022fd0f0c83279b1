//! Compact atom-selection identifiers (CIDs).
//!
//! Grammar, per selection:
//! - `/model/chains/residues/atoms` when the CID starts with `/`
//! - `chains[/residues[/atoms]]` otherwise
//!
//! An empty field or `*` matches anything. Chains may be a comma list
//! (`A,B`). Residues are `n`, `n.i`, or a range `n-m` / `n.i-m.j`, optionally
//! followed by a residue-name filter `(ALA,GLY)`. Atoms are a name with an
//! optional element `[S]` and alternate location `:A`. Several selections
//! can be unioned with `||`.

use thiserror::Error;

use crate::types::model::{Atom, AtomRef, Chain, Model, Residue};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CidError {
    #[error("empty selection")]
    Empty,
    #[error("too many fields in selection '{0}'")]
    TooManyFields(String),
    #[error("invalid model number '{0}'")]
    InvalidModel(String),
    #[error("invalid residue specification '{0}'")]
    InvalidResidue(String),
    #[error("unterminated bracket in '{0}'")]
    Unterminated(String),
}

/// Residue position: sequence number plus insertion code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResPos {
    pub seq_num: i32,
    pub ins_code: String,
}

impl ResPos {
    fn parse(s: &str) -> Option<Self> {
        let (num, ins) = match s.split_once('.') {
            Some((num, ins)) => (num, ins),
            None => (s, ""),
        };
        Some(Self {
            seq_num: num.trim().parse().ok()?,
            ins_code: ins.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidueSpec {
    Any,
    /// A single position. A missing insertion code matches only blank ones.
    Single(ResPos),
    /// Inclusive range. A blank insertion code on either bound is open.
    Range(ResPos, ResPos),
}

impl ResidueSpec {
    fn matches(&self, residue: &Residue) -> bool {
        match self {
            ResidueSpec::Any => true,
            ResidueSpec::Single(p) => residue.seq_num == p.seq_num && residue.ins_code == p.ins_code,
            ResidueSpec::Range(start, end) => {
                let after_start = residue.seq_num > start.seq_num
                    || (residue.seq_num == start.seq_num && residue.ins_code >= start.ins_code);
                let before_end = residue.seq_num < end.seq_num
                    || (residue.seq_num == end.seq_num
                        && (end.ins_code.is_empty() || residue.ins_code <= end.ins_code));
                after_start && before_end
            }
        }
    }
}

/// One `||`-separated selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidSelection {
    /// `None` matches any model.
    pub model: Option<u32>,
    /// `None` matches any chain.
    pub chains: Option<Vec<String>>,
    pub residues: ResidueSpec,
    /// `None` matches any residue name.
    pub residue_names: Option<Vec<String>>,
    /// `None` matches any atom name.
    pub atom_name: Option<String>,
    pub element: Option<String>,
    pub alt_loc: Option<String>,
}

impl CidSelection {
    fn parse(text: &str) -> Result<Self, CidError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CidError::Empty);
        }

        let (model_field, rest) = match text.strip_prefix('/') {
            Some(rest) => {
                let mut parts = rest.splitn(2, '/');
                let model = parts.next().unwrap_or("");
                (Some(model), parts.next().unwrap_or(""))
            }
            None => (None, text),
        };

        let fields: Vec<&str> = rest.split('/').collect();
        if fields.len() > 3 {
            return Err(CidError::TooManyFields(text.to_string()));
        }
        let field = |i: usize| fields.get(i).map(|s| s.trim()).unwrap_or("");

        let model = match model_field.map(str::trim) {
            None | Some("") | Some("*") => None,
            Some(m) => Some(m.parse().map_err(|_| CidError::InvalidModel(m.to_string()))?),
        };

        let chains = match field(0) {
            "" | "*" => None,
            list => Some(list.split(',').map(|c| c.trim().to_string()).collect()),
        };

        let (residues, residue_names) = parse_residue_field(field(1))?;
        let (atom_name, element, alt_loc) = parse_atom_field(field(2))?;

        Ok(Self {
            model,
            chains,
            residues,
            residue_names,
            atom_name,
            element,
            alt_loc,
        })
    }

    fn matches(&self, model_number: u32, chain: &Chain, residue: &Residue, atom: &Atom) -> bool {
        if self.model.is_some_and(|m| m != model_number) {
            return false;
        }
        if let Some(chains) = &self.chains {
            if !chains.iter().any(|c| c == &chain.id) {
                return false;
            }
        }
        if !self.residues.matches(residue) {
            return false;
        }
        if let Some(names) = &self.residue_names {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(&residue.name)) {
                return false;
            }
        }
        if let Some(name) = &self.atom_name {
            if !name.eq_ignore_ascii_case(&atom.name) {
                return false;
            }
        }
        if let Some(element) = &self.element {
            if !element.eq_ignore_ascii_case(&atom.element) {
                return false;
            }
        }
        if let Some(alt_loc) = &self.alt_loc {
            if alt_loc != &atom.alt_loc {
                return false;
            }
        }
        true
    }
}

/// Split `5-10(ALA,GLY)` into the residue range and the name filter.
fn parse_residue_field(field: &str) -> Result<(ResidueSpec, Option<Vec<String>>), CidError> {
    let (range, names) = match field.find('(') {
        Some(open) => {
            let close = field[open..]
                .find(')')
                .ok_or_else(|| CidError::Unterminated(field.to_string()))?;
            let list = &field[open + 1..open + close];
            let names: Vec<String> = list
                .split(',')
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty() && n != "*")
                .collect();
            (&field[..open], (!names.is_empty()).then_some(names))
        }
        None => (field, None),
    };

    let range = range.trim();
    let invalid = || CidError::InvalidResidue(field.to_string());
    let spec = if range.is_empty() || range == "*" {
        ResidueSpec::Any
    } else {
        // A '-' past the first character separates the bounds; a leading one is a sign.
        match range.char_indices().skip(1).find(|&(_, c)| c == '-') {
            Some((dash, _)) => {
                let start = ResPos::parse(&range[..dash]).ok_or_else(invalid)?;
                let end = ResPos::parse(&range[dash + 1..]).ok_or_else(invalid)?;
                ResidueSpec::Range(start, end)
            }
            None => ResidueSpec::Single(ResPos::parse(range).ok_or_else(invalid)?),
        }
    };
    Ok((spec, names))
}

type AtomField = (Option<String>, Option<String>, Option<String>);

/// Split `CA[C]:A` into atom name, element and alternate location.
fn parse_atom_field(field: &str) -> Result<AtomField, CidError> {
    let (field, alt_loc) = match field.split_once(':') {
        Some((f, alt)) => (f, Some(alt.trim().to_string())),
        None => (field, None),
    };

    let (name, element) = match field.find('[') {
        Some(open) => {
            let close = field[open..]
                .find(']')
                .ok_or_else(|| CidError::Unterminated(field.to_string()))?;
            let element = field[open + 1..open + close].trim();
            let element = (!element.is_empty() && element != "*").then(|| element.to_string());
            (&field[..open], element)
        }
        None => (field, None),
    };

    let name = match name.trim() {
        "" | "*" => None,
        n => Some(n.to_string()),
    };
    Ok((name, element, alt_loc))
}

/// A parsed CID: the union of one or more selections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cid {
    pub selections: Vec<CidSelection>,
}

impl Cid {
    pub fn parse(text: &str) -> Result<Self, CidError> {
        let selections = text
            .split("||")
            .map(CidSelection::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selections })
    }

    /// Matching atoms in model order, each at most once.
    pub fn select(&self, model: &Model) -> Vec<AtomRef> {
        let mut selected = Vec::new();
        for (r, atom) in model.atoms() {
            let chain = &model.chains[r.chain];
            let residue = &chain.residues[r.residue];
            if self
                .selections
                .iter()
                .any(|s| s.matches(MODEL_NUMBER, chain, residue, atom))
            {
                selected.push(r);
            }
        }
        selected
    }
}

/// The store holds a single model, numbered 1 as in PDB files.
const MODEL_NUMBER: u32 = 1;

/// Resolve a CID to atoms. A CID that does not parse selects nothing.
pub fn resolve_selection(model: &Model, cid: &str) -> Vec<AtomRef> {
    match Cid::parse(cid) {
        Ok(parsed) => {
            let atoms = parsed.select(model);
            tracing::trace!(cid, atoms = atoms.len(), "resolved selection");
            atoms
        }
        Err(e) => {
            tracing::warn!(cid, error = %e, "unparsable selection, treating as empty");
            Vec::new()
        }
    }
}
