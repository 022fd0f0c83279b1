//! End-to-end queries through the model registry.

use glam::Vec3;
use std::io::Write;

use xtal_mates::ops::{compose_symmetry_transforms, decode_neighbor_cid};
use xtal_mates::registry::RegistryError;
use xtal_mates::types::{Atom, CellTranslation, Chain, Residue, SymmTrans};
use xtal_mates::{Config, CrystalCell, Model, ModelRegistry, SymOpTable};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ca(seq: i32, ins: &str, pos: Vec3) -> Residue {
    Residue::new(seq, ins, "ALA").with_atom(Atom::new("CA", "C", pos))
}

/// P2(1) crystal with two chains near the origin.
fn crystal_model() -> xtal_mates::error::Result<Model> {
    let cell = CrystalCell::new([30.0, 40.0, 50.0], [90.0, 100.0, 90.0])?;
    let symops = SymOpTable::from_triplets(&["x,y,z", "-x,y+1/2,-z"])?;
    Ok(Model::new("p21")
        .with_cell(cell)
        .with_symops(symops)
        .with_chain(
            Chain::new("A")
                .with_residue(ca(5, "", Vec3::new(5.0, 5.0, 5.0)))
                .with_residue(ca(6, "", Vec3::new(8.8, 5.0, 5.0)))
                .with_residue(ca(12, "", Vec3::new(5.0, 8.0, 5.0)))
                .with_residue(ca(12, "A", Vec3::new(5.0, 5.0, 8.0))),
        )
        .with_chain(Chain::new("B").with_residue(ca(10, "", Vec3::new(5.0, 5.0, 2.5)))))
}

#[test]
fn test_identity_pair_scenario() {
    let cell = CrystalCell::new([10.0, 10.0, 10.0], [90.0, 90.0, 90.0]).unwrap();
    let pairs = vec![(SymmTrans::new(0, 0.0, 0.0, 0.0), CellTranslation::new(0, 0, 0))];
    let mates = compose_symmetry_transforms(&cell, &SymOpTable::p1(), &pairs).unwrap();
    let expected = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];
    for (a, e) in mates[0].matrix.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-6);
    }
}

#[test]
fn test_registry_neighbour_scenarios() -> xtal_mates::error::Result<()> {
    init_tracing();
    let mut registry = ModelRegistry::new();
    let h = registry.insert(crystal_model()?);

    // residue 5 is only the seed atom, so the floor drops it
    assert_eq!(registry.neighbours_cid(h, "//A/5", 4.0)?, "A/6,12,12.A|B/10");
    assert_eq!(registry.neighbours_cid(h, "//A/99", 4.0)?, "");
    assert_eq!(registry.neighbours_cid(h, "A/12-12", 3.0)?, "A/5");

    let groups = decode_neighbor_cid(&registry.neighbours_cid(h, "//A/5", 4.0)?)?;
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].chain_id, "A");
    assert_eq!(groups[0].tokens, vec!["6", "12", "12.A"]);
    assert_eq!(groups[1].tokens, vec!["10"]);
    Ok(())
}

#[test]
fn test_registry_symmetry_mates_place_copies_near_point() -> xtal_mates::error::Result<()> {
    init_tracing();
    let mut registry = ModelRegistry::new();
    let model = crystal_model()?;
    let atoms: Vec<Vec3> = model.atoms().map(|(_, a)| a.pos).collect();
    let h = registry.insert(model);

    let (x, y, z) = (0.0, 20.0, 0.0);
    let radius = 12.0;
    let mates = registry.symmetry_mates(h, radius, x, y, z)?;
    assert!(!mates.mates.is_empty());
    assert_eq!(mates.matrices().len(), mates.mates.len());

    let point = Vec3::new(x as f32, y as f32, z as f32);
    for mate in &mates.mates {
        let m = glam::Mat4::from_cols_array(&mate.matrix);
        let closest = atoms
            .iter()
            .map(|&p| m.transform_point3(p).distance(point))
            .fold(f32::INFINITY, f32::min);
        assert!(closest <= radius as f32 + 1e-3, "mate {:?} is {closest} A away", mate.symm_trans);
    }

    // the same query twice gives identical results
    assert_eq!(registry.symmetry_mates(h, radius, x, y, z)?, mates);
    Ok(())
}

#[test]
fn test_registry_without_cell_and_bad_handle() {
    let mut registry = ModelRegistry::new();
    let h = registry.insert(Model::new("em").with_chain(Chain::new("A").with_residue(ca(1, "", Vec3::ZERO))));
    let mates = registry.symmetry_mates(h, 25.0, 0.0, 0.0, 0.0).unwrap();
    assert!(mates.cell.is_none());
    assert!(mates.mates.is_empty());

    registry.remove(h);
    let err = registry.neighbours_cid(h, "A/1", 4.0).unwrap_err();
    assert_eq!(err, RegistryError::InvalidHandle(h));
    let wrapped: xtal_mates::Error = err.into();
    assert!(wrapped.to_string().contains("no model loaded"));
}

#[test]
fn test_config_file_drives_default_queries() -> xtal_mates::error::Result<()> {
    let mut file = tempfile::NamedTempFile::new().map_err(xtal_mates::config::ConfigError::from)?;
    writeln!(file, "[symmetry]\nradius = 12.0\n\n[neighbors]\nmax_dist = 3.0")
        .map_err(xtal_mates::config::ConfigError::from)?;
    let config = Config::load(file.path())?;
    assert_eq!(config.neighbors.max_dist, 3.0);

    let mut registry = ModelRegistry::with_config(config);
    let h = registry.insert(crystal_model()?);
    assert_eq!(registry.neighbours_cid_default(h, "A/12-12")?, "A/5");
    assert_eq!(
        registry.symmetry_mates_default(h, 0.0, 20.0, 0.0)?,
        registry.symmetry_mates(h, 12.0, 0.0, 20.0, 0.0)?
    );
    Ok(())
}

#[test]
fn test_registry_rejects_oversized_symmetry_window() -> xtal_mates::error::Result<()> {
    let mut registry = ModelRegistry::new();
    let h = registry.insert(crystal_model()?);
    let err = registry.symmetry_mates(h, 1e12, 0.0, 0.0, 0.0).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Symmetry(xtal_mates::ops::SymmetryError::WindowTooLarge { .. })
    ));
    Ok(())
}
