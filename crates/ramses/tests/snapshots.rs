//! Integration tests on synthetic snapshots

mod common;

use amrtools_ramses::reader::SnapshotReader;
use amrtools_ramses::{
    Center, Config, Dataset, Error, FieldDefinition, FieldSource, Frame, LoadParams, Output,
    UpdateOptions,
};
use common::{config, Grid, Snapshot, VARIABLES};
use rstest::{fixture, rstest};
use std::path::Path;
use tempfile::TempDir;

fn params(dir: &Path, output: u32) -> LoadParams {
    LoadParams {
        output: Output::Number(output),
        scale: "cm".into(),
        path: dir.to_path_buf(),
        ..Default::default()
    }
}

fn reader() -> SnapshotReader {
    let mut reader = SnapshotReader::new();
    reader.disable_progress();
    reader
}

fn load(params: LoadParams) -> Dataset {
    Dataset::load_with(reader(), params, config()).unwrap()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut values = values.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

fn close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| (a - b).abs() < 1e-12)
}

#[fixture]
fn two_levels() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    Snapshot::two_levels().write(dir.path(), 1);
    dir
}

#[rstest]
#[case([0; 8], 8)] // case 1
#[case([0, 3, 0, 0, 5, 0, 0, 0], 6)] // case 2
#[case([1; 8], 0)] // case 3
fn childless_octants_are_kept(#[case] son: [i32; 8], #[case] expected: usize) {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = Snapshot::new(1, 0, 2);
    let mut grid = Grid::leaf([0.5; 3], 1.0);
    grid.son = son;
    snapshot.grids[0][0].push(grid);
    snapshot.write(dir.path(), 1);

    let dataset = load(params(dir.path(), 1));
    assert_eq!(dataset.ncells(), expected);
    assert_eq!(dataset.info().int("ncells").unwrap(), expected as i64);
}

#[rstest]
#[case(0, 7, 15)] // case 1
#[case(1, 8, 8)] // case 2
#[case(2, 7, 15)] // case 3
#[case(5, 7, 15)] // case 4
fn refined_cells_kept_at_deepest_level(
    two_levels: TempDir,
    #[case] lmax: usize,
    #[case] coarse: usize,
    #[case] expected: usize,
) {
    let dataset = load(LoadParams {
        lmax,
        ..params(two_levels.path(), 1)
    });

    assert_eq!(dataset.ncells(), expected);
    let levels = dataset.values("level").unwrap();
    assert_eq!(levels.iter().filter(|l| **l == 1.0).count(), coarse);
}

#[rstest]
fn values_come_from_the_owning_cpu(two_levels: TempDir) {
    let dataset = load(params(two_levels.path(), 1));

    let raw: Vec<f64> = (2..=8).chain(20..=27).map(|v| 3.0 * v as f64).collect();
    assert_eq!(sorted(dataset.values("density").unwrap()), raw);

    // velocity_x is the density plus the grid base, when both are in code units
    let rho = dataset.values("density").unwrap();
    let vx = dataset.values("velocity_x").unwrap();
    let level = dataset.values("level").unwrap();
    for i in 0..dataset.ncells() {
        let base = if level[i] == 1.0 { 1.0 } else { 20.0 };
        assert_eq!(vx[i] / 0.5 - rho[i] / 3.0, base);
    }

    for name in VARIABLES {
        assert!(dataset.values(name).unwrap().iter().all(|v| *v > 0.0));
    }
}

#[rstest]
fn units_follow_names(two_levels: TempDir) {
    let dataset = load(params(two_levels.path(), 1));

    let unit = |name: &str| dataset.field(name).unwrap().unit.clone();
    assert_eq!(unit("density"), "g/cm3");
    assert_eq!(unit("velocity_x"), "cm/s");
    assert_eq!(unit("thermal_pressure"), "erg/cm3");
    assert_eq!(unit("level"), "");
    assert_eq!(unit("x"), "cm");
    assert_eq!(unit("mass"), "msun");

    // code value 3 + 1 in octant 1 of level 1, scaled by 3 * (2/4)^2
    let pressure = sorted(dataset.values("thermal_pressure").unwrap());
    assert_eq!(pressure[0], 0.75 * 4.0);

    let info = dataset.info();
    assert_eq!(info.float("time").unwrap(), 1.0);
    assert_eq!(info.float("boxsize").unwrap(), 2.0);
    assert_eq!(info.float("length_unit").unwrap(), 1.0);
    assert_eq!(info.int("nvar").unwrap(), 3);
}

#[rstest]
fn geometry_is_centred(two_levels: TempDir) {
    let dataset = load(params(two_levels.path(), 1));
    assert!(matches!(dataset.frame(), Frame::Relative { .. }));
    assert_eq!(dataset.info().float("xc").unwrap(), 1.0);

    let level = dataset.values("level").unwrap();
    let dx = dataset.values("dx").unwrap();
    for axis in ["x", "y", "z"] {
        let values = dataset.values(axis).unwrap();
        for i in 0..dataset.ncells() {
            let expected: &[f64] = if level[i] == 1.0 {
                assert_eq!(dx[i], 1.0);
                &[-0.5, 0.5]
            } else {
                assert_eq!(dx[i], 0.5);
                &[-0.75, -0.25]
            };
            assert!(expected.contains(&values[i]), "{axis} = {}", values[i]);
        }
    }
}

#[rstest]
#[case([0.5, 0.5, 0.5], 8)] // case 1
#[case([0.5, 0.0, 0.0], 11)] // case 2
#[case([0.0, 0.0, 0.0], 15)] // case 3
fn region_of_interest(two_levels: TempDir, #[case] extents: [f64; 3], #[case] expected: usize) {
    let dataset = load(LoadParams {
        extents,
        ..params(two_levels.path(), 1)
    });
    assert_eq!(dataset.ncells(), expected);
}

#[rstest]
fn recentring_is_idempotent(two_levels: TempDir) {
    let mut dataset = load(params(two_levels.path(), 1));
    let center = Center::Max("density".into());

    dataset.re_center(&center).unwrap();
    let once: Vec<Vec<f64>> = ["x", "y", "z"]
        .iter()
        .map(|a| dataset.values(a).unwrap().to_vec())
        .collect();

    dataset.re_center(&center).unwrap();
    for (axis, values) in ["x", "y", "z"].iter().zip(&once) {
        assert!(close(dataset.values(axis).unwrap(), values));
    }

    // densest cell is octant 7 of the level 2 grid
    assert!((dataset.info().float("xc").unwrap() - 0.75).abs() < 1e-12);
}

#[rstest]
fn recentring_round_trip(two_levels: TempDir) {
    let mut dataset = load(params(two_levels.path(), 1));
    let relative = dataset.values("x").unwrap().to_vec();

    dataset.to_absolute();
    assert_eq!(dataset.frame(), Frame::Absolute);
    assert_eq!(dataset.info().float("boxsize").unwrap(), 2.0);
    assert!(dataset.values("x").unwrap().iter().all(|x| *x > 0.0));

    dataset.to_relative(&Center::Default).unwrap();
    assert!(close(dataset.values("x").unwrap(), &relative));
}

#[rstest]
fn bad_center_aborts_without_changes(two_levels: TempDir) {
    let mut dataset = load(params(two_levels.path(), 1));
    let before = dataset.values("x").unwrap().to_vec();

    let result = dataset.re_center(&Center::Average("density < 0".into()));
    assert!(matches!(result, Err(Error::EmptySelection(_))));
    assert_eq!(dataset.values("x").unwrap(), before.as_slice());
    assert_eq!(dataset.params().center, Center::Default);
}

#[rstest]
fn sinks_move_with_the_frame() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = Snapshot::two_levels();
    snapshot.sinks = Some("# id, mass, dmf, x, y, z\n1, 2.0, 0.0, 0.25, 0.25, 0.25\n".into());
    snapshot.write(dir.path(), 1);

    let dataset = load(LoadParams {
        center: Center::Sink("sink1".into()),
        ..params(dir.path(), 1)
    });

    assert_eq!(dataset.info().int("nsinks").unwrap(), 1);
    let sink = dataset.sinks().get("sink1").unwrap();
    assert_eq!(sink.position(), [0.0; 3]);
    assert_eq!(sink.get("mass"), Some(2.0));
    // 4 cells at the deepest level, in a box of 2 cm
    assert_eq!(sink.get("radius"), Some(2.0));

    assert!(dataset.values("x").unwrap().contains(&-0.25));
}

#[rstest]
fn missing_sink_is_an_error(two_levels: TempDir) {
    let result = Dataset::load_with(
        reader(),
        LoadParams {
            center: Center::Sink("sink1".into()),
            ..params(two_levels.path(), 1)
        },
        config(),
    );
    assert!(matches!(result, Err(Error::SinkNotFound(_))));
}

#[rstest]
fn descriptor_falls_back_to_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = Snapshot::two_levels();
    snapshot.descriptor = false;
    snapshot.write(dir.path(), 1);

    let mut config = config();
    config.var_names = VARIABLES.iter().map(|s| s.to_string()).collect();
    let dataset = Dataset::load_with(reader(), params(dir.path(), 1), config).unwrap();

    for name in VARIABLES {
        assert!(dataset.field(name).is_some());
    }
    assert_eq!(dataset.ncells(), 15);
}

#[rstest]
fn variable_filter(two_levels: TempDir) {
    let dataset = load(LoadParams {
        variables: vec!["velocity_x".into(), "not_a_variable".into()],
        ..params(two_levels.path(), 1)
    });

    assert_eq!(
        dataset.names(),
        vec!["dx", "level", "velocity_x", "x", "y", "z"]
    );
    // no density means no mass
    assert!(dataset.field("mass").is_none());
}

#[rstest]
fn missing_info_is_not_found(two_levels: TempDir) {
    let result = Dataset::load_with(reader(), params(two_levels.path(), 4), config());
    assert!(matches!(result, Err(Error::InfoNotFound(_))));
}

#[rstest]
fn latest_output() {
    let dir = tempfile::tempdir().unwrap();
    Snapshot::two_levels().write(dir.path(), 1);
    Snapshot::two_levels().scaled(2.0).write(dir.path(), 3);
    std::fs::create_dir_all(dir.path().join("output_notes")).unwrap();

    let dataset = load(LoadParams {
        output: Output::Latest,
        ..params(dir.path(), 1)
    });

    assert_eq!(dataset.info().int("nout").unwrap(), 3);
    assert_eq!(dataset.field("density").unwrap().max().unwrap(), 2.0 * 27.0 * 3.0);
}

#[rstest]
fn parallel_scan_matches_serial(two_levels: TempDir) {
    let serial = load(params(two_levels.path(), 1));

    let mut reader = reader();
    reader.set_parallel(true);
    let parallel = Dataset::load_with(reader, params(two_levels.path(), 1), config()).unwrap();

    assert_eq!(serial.names(), parallel.names());
    for (name, field) in serial.fields() {
        assert_eq!(parallel.field(name).unwrap(), field);
    }
}

#[rstest]
fn boundaries_and_coarse_offset() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = Snapshot::new(1, 2, 1);
    snapshot.nx = [3, 3, 3];
    snapshot.boxlen = 1.0;
    snapshot.grids[0][0].push(Grid::leaf([1.5; 3], 1.0));
    snapshot.grids[0][1].push(Grid::leaf([0.5; 3], 50.0));
    snapshot.grids[0][2].push(Grid::leaf([2.5; 3], 60.0));
    snapshot.grids[0][2].push(Grid::leaf([2.5, 0.5, 0.5], 70.0));
    snapshot.write(dir.path(), 1);

    let dataset = load(params(dir.path(), 1));
    assert_eq!(dataset.ncells(), 8);
    assert_eq!(
        sorted(dataset.values("density").unwrap()),
        (1..=8).map(|v| 3.0 * v as f64).collect::<Vec<f64>>()
    );
    assert!(dataset
        .values("x")
        .unwrap()
        .iter()
        .all(|x| *x == -0.5 || *x == 0.5));
}

#[rstest]
fn flat_runs() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = Snapshot::new(1, 0, 1);
    snapshot.ndim = 2;
    snapshot.grids[0][0].push(Grid::leaf([0.5, 0.5, 0.0], 1.0));
    snapshot.write(dir.path(), 1);

    let dataset = load(params(dir.path(), 1));
    assert_eq!(dataset.ncells(), 4);
    assert!(dataset.values("z").unwrap().iter().all(|z| *z == 0.0));
    assert_eq!(sorted(dataset.values("x").unwrap()), vec![-0.5, -0.5, 0.5, 0.5]);
}

#[rstest]
fn derived_fields_recomputed_in_depth_order(two_levels: TempDir) {
    Snapshot::two_levels()
        .scaled(2.0)
        .write(two_levels.path(), 2);

    let mut dataset = load(params(two_levels.path(), 1));
    dataset
        .new_field("b", FieldSource::Operation("2 * density".into()), "g/cm3", None)
        .unwrap();
    dataset
        .new_field("c", FieldSource::Operation("b + density".into()), "g/cm3", Some("C"))
        .unwrap();

    dataset
        .update_values(UpdateOptions::output(Output::Number(2)))
        .unwrap();

    assert_eq!(dataset.info().int("nout").unwrap(), 2);
    assert_eq!(dataset.field("b").unwrap().depth, 1);
    let c = dataset.field("c").unwrap();
    assert_eq!(c.depth, 2);
    assert_eq!(c.label, "C");

    let rho = dataset.values("density").unwrap();
    let expected: Vec<f64> = rho.iter().map(|r| 3.0 * r).collect();
    assert!(close(&c.values, &expected));
    assert_eq!(dataset.field("density").unwrap().max().unwrap(), 2.0 * 27.0 * 3.0);
}

#[rstest]
fn given_values_survive_update(two_levels: TempDir) {
    Snapshot::two_levels()
        .scaled(2.0)
        .write(two_levels.path(), 2);

    let mut dataset = load(params(two_levels.path(), 1));
    dataset
        .new_field("w", FieldSource::Values(vec![2.0; 15]), "", Some("Weight"))
        .unwrap();
    dataset
        .new_field("c", FieldSource::Operation("w * density".into()), "g/cm3", None)
        .unwrap();
    assert!(!dataset.field("w").unwrap().is_loaded());
    assert!(dataset.field("density").unwrap().is_loaded());

    dataset
        .update_values(UpdateOptions::output(Output::Number(2)))
        .unwrap();

    let w = dataset.field("w").unwrap();
    assert_eq!(w.values, vec![2.0; 15]);
    assert_eq!(w.label, "Weight");

    let rho = dataset.values("density").unwrap();
    let expected: Vec<f64> = rho.iter().map(|r| 2.0 * r).collect();
    assert!(close(dataset.values("c").unwrap(), &expected));

    // only 8 cells down to level 1, so "w" no longer fits and "c" fails
    let coarse = dataset.update_values(UpdateOptions {
        lmax: Some(1),
        ..Default::default()
    });
    assert!(matches!(coarse, Err(Error::FieldNotFound(name)) if name == "w"));
    assert_eq!(dataset.ncells(), 15);
    assert!(dataset.field("w").is_some());
}

#[rstest]
fn failed_update_leaves_dataset_unchanged(two_levels: TempDir) {
    let mut dataset = load(params(two_levels.path(), 1));
    dataset
        .new_field("p", FieldSource::Operation("thermal_pressure + 1".into()), "", None)
        .unwrap();
    let before = dataset.clone();

    let missing = dataset.update_values(UpdateOptions::output(Output::Number(9)));
    assert!(matches!(missing, Err(Error::InfoNotFound(_))));

    // "p" can not be computed without thermal pressure
    let filtered = dataset.update_values(UpdateOptions {
        variables: Some(vec!["density".into()]),
        ..Default::default()
    });
    assert!(matches!(filtered, Err(Error::FieldNotFound(_))));

    assert_eq!(dataset.params(), before.params());
    assert_eq!(dataset.info(), before.info());
    assert_eq!(dataset.names(), before.names());
    for (name, field) in before.fields() {
        assert_eq!(dataset.field(name).unwrap(), field);
    }
}

#[rstest]
fn additional_fields_dropped_when_unavailable(two_levels: TempDir) {
    let mut config = config();
    config.additional_fields.push(FieldDefinition {
        name: "pressure_2".into(),
        operation: "2 * thermal_pressure".into(),
        unit: "erg/cm3".into(),
    });

    let mut dataset = Dataset::load_with(reader(), params(two_levels.path(), 1), config).unwrap();
    assert!(dataset.field("pressure_2").is_some());
    assert!(dataset.field("B_field_x").is_none());

    dataset
        .update_values(UpdateOptions {
            variables: Some(vec!["density".into()]),
            ..Default::default()
        })
        .unwrap();

    assert!(dataset.field("pressure_2").is_none());
    assert!(dataset.field("thermal_pressure").is_none());
    assert!(dataset.field("mass").is_some());
}

#[rstest]
fn mass_of_cells(two_levels: TempDir) {
    let dataset = load(params(two_levels.path(), 1));
    let msun = Config::default().constant("msun").unwrap();

    let rho = dataset.values("density").unwrap();
    let dx = dataset.values("dx").unwrap();
    let mass = dataset.values("mass").unwrap();
    for i in 0..dataset.ncells() {
        let expected = rho[i] * dx[i].powi(3) / msun;
        assert!(((mass[i] - expected) / expected).abs() < 1e-12);
    }
}
