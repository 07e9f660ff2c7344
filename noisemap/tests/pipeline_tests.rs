//! Integration tests for the mapping pipeline

use noisemap::prelude::*;
use noisemap::{Floorplan, PowerTrace, Region, Span};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_paths() -> InputPaths {
    InputPaths {
        name_mappings: fixture_path("names.json"),
        floorplan: fixture_path("chip.flp"),
        power_trace: fixture_path("power.csv"),
        netlist: fixture_path("grid.sp"),
    }
}

fn fixture_options() -> MapOptions {
    MapOptions::from_json_file(&fixture_path("options.json")).expect("Should load options")
}

const CORE_PWL: &str = "PWL(0.0N 0 0.1N 1.50 0.2N 0 1.0N 0 1.1N 0.00 1.2N 0)";

#[test]
fn test_run_files_rewrites_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("grid_pwl.sp");
    let report_path = dir.path().join("inductors.json");

    let result = NoiseMapCore::run_files(
        &fixture_paths(),
        &out,
        Some(report_path.as_path()),
        &fixture_options(),
    )
    .expect("Run should succeed");

    assert_eq!(result.stats.hit, 2);
    assert_eq!(result.stats.miss, 1);
    assert_eq!(result.stats.unpositioned, 1);
    assert_eq!(result.floorplan.len(), 2, "NoC has no mapping and is skipped");
    assert_eq!(result.target_box.as_array(), [[0.0, 400.0], [0.0, 400.0]]);

    let written = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[3], format!("I1 n1_100_100 0 {}", CORE_PWL));
    assert_eq!(lines[4], "*I2 n1_300_300 0 PULSE(0 1m 0 1p 1p 1n 2n)");
    // on the shared Core/Cache edge, the first region wins
    assert_eq!(lines[5], format!("I3 n1_200_200 0 {}", CORE_PWL));
    assert_eq!(lines[6], "I4 vdd 0 1m");
    assert_eq!(lines[7], "L1 n1_100_50 n2_100_50 1n");
    assert!(written.ends_with(".end\n"));

    assert!(report_path.exists(), "Report should be written");
}

#[test]
fn test_inductor_report_ranking() {
    let inputs = NoiseMapCore::load(&fixture_paths(), &fixture_options()).unwrap();
    let result = NoiseMapCore::run(inputs, &fixture_options()).unwrap();
    let report = result.report.expect("Complete mode produces a report");

    assert_eq!(report.list, vec!["L1", "L2", "L3"]);

    let core = report.nearest("Core").unwrap();
    let core_names: Vec<&str> = core.entries().map(|e| e.inductor.as_str()).collect();
    assert_eq!(core_names, vec!["L1", "L3"]);
    assert_eq!(core.get("L1").unwrap().distance, 0.0);
    assert!((core.get("L3").unwrap().distance - 300.0).abs() < 1e-9);

    let cache = report.nearest("Cache").unwrap();
    let cache_names: Vec<&str> = cache.entries().map(|e| e.inductor.as_str()).collect();
    assert_eq!(cache_names, vec!["L2", "L3"]);
    assert_eq!(cache.get("L2").unwrap().left, "n1_150_380");
    assert_eq!(cache.get("L2").unwrap().right, "n2_150_380");
}

#[test]
fn test_report_json_shape() {
    let inputs = NoiseMapCore::load(&fixture_paths(), &fixture_options()).unwrap();
    let result = NoiseMapCore::run(inputs, &fixture_options()).unwrap();
    let json = result.report.unwrap().to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["list"], serde_json::json!(["L1", "L2", "L3"]));
    assert_eq!(value["nearest"]["Core"]["L1"]["left"], "n1_100_50");
    assert_eq!(value["nearest"]["Cache"]["L3"]["distance"], 200.0);
    assert!(value["nearest"].get("NoC").is_none());
}

#[test]
fn test_legacy_mode_requires_every_mapping() {
    let options = MapOptions {
        mode: Mode::Legacy,
        ..fixture_options()
    };
    let err = NoiseMapCore::load(&fixture_paths(), &options).unwrap_err();
    assert!(matches!(err, NoiseMapError::MissingMapping(ref label) if label == "NoC"));
}

#[test]
fn test_failed_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.sp");
    let mut paths = fixture_paths();
    paths.power_trace = dir.path().join("missing.csv");

    let result = NoiseMapCore::run_files(&paths, &out, None, &MapOptions::default());
    assert!(matches!(result, Err(NoiseMapError::Io(_))));
    assert!(!out.exists());
}

#[test]
fn test_second_pass_is_byte_identical() {
    let options = fixture_options();
    let inputs = NoiseMapCore::load(&fixture_paths(), &options).unwrap();
    let floorplan = inputs.floorplan.clone();
    let power_trace = inputs.power_trace.clone();

    let first = NoiseMapCore::run(inputs, &options).unwrap();
    let first_text = first.netlist.render();

    let again = RunInputs {
        floorplan,
        power_trace,
        netlist: Netlist::parse(&first_text),
    };
    let second = NoiseMapCore::run(again, &options).unwrap();
    assert_eq!(second.netlist.render(), first_text);
}

#[test]
fn test_runs_are_deterministic() {
    let options = fixture_options();
    let a = NoiseMapCore::run(NoiseMapCore::load(&fixture_paths(), &options).unwrap(), &options)
        .unwrap();
    let b = NoiseMapCore::run(NoiseMapCore::load(&fixture_paths(), &options).unwrap(), &options)
        .unwrap();
    assert_eq!(a.netlist.render(), b.netlist.render());
    assert_eq!(
        a.report.unwrap().to_json_pretty().unwrap(),
        b.report.unwrap().to_json_pretty().unwrap()
    );
}

#[test]
fn test_single_region_scenario() {
    let floorplan: Floorplan = [Region::new(
        "A",
        "A",
        Span::new(0.0, 10.0),
        Span::new(0.0, 10.0),
    )]
    .into_iter()
    .collect();
    let inputs = RunInputs {
        floorplan,
        power_trace: PowerTrace::from_columns([("A".to_string(), vec![2.0])]),
        netlist: Netlist::parse("I1 n1 n2 PULSE(0 1 0 0 0 0 0) ; pos n_5_5\n"),
    };
    let options = MapOptions {
        time_precision: 1,
        amplitude_precision: 4,
        ..MapOptions::default()
    };

    let result = NoiseMapCore::run(inputs, &options).unwrap();
    assert_eq!(result.netlist.elements[0].kind(), ElementKind::CurrentSource);
    assert_eq!(result.stats.hit, 1);
    assert_eq!(
        result.netlist.render(),
        "I1 n1 n2 PWL(0.0N 0 0.1N 2.0000 0.2N 0)\n"
    );
}

#[test]
fn test_miss_accounting() {
    // A covers the left half, B the lower right quarter; the upper right is a gap.
    let floorplan: Floorplan = [
        Region::new("A", "A", Span::new(0.0, 5.0), Span::new(0.0, 10.0)),
        Region::new("B", "B", Span::new(5.0, 10.0), Span::new(0.0, 5.0)),
    ]
    .into_iter()
    .collect();
    let inside = [(1, 1), (2, 8), (4, 4), (6, 1), (9, 4), (0, 0), (3, 3)];
    let outside = [(7, 7), (9, 9), (10, 10)];

    let mut text = String::new();
    for (i, (x, y)) in inside.iter().chain(outside.iter()).enumerate() {
        text.push_str(&format!("I{} n_{}_{} 0 PULSE(0 1 0 0 0 0 0)\n", i, x, y));
    }
    let inputs = RunInputs {
        floorplan,
        power_trace: PowerTrace::from_columns([
            ("A".to_string(), vec![1.0]),
            ("B".to_string(), vec![2.0]),
        ]),
        netlist: Netlist::parse(&text),
    };

    let result = NoiseMapCore::run(inputs, &MapOptions::default()).unwrap();
    assert_eq!(result.stats.hit, 7);
    assert_eq!(result.stats.miss, 3);

    let original: Vec<&str> = text.lines().collect();
    for (i, element) in result.netlist.elements.iter().enumerate().skip(inside.len()) {
        assert_eq!(element.to_line(), format!("*{}", original[i]));
    }
}

#[test]
fn test_sources_on_the_netlist_edge_are_hits() {
    let floorplan: Floorplan = [Region::new("A", "A", Span::new(0.0, 10.0), Span::new(0.0, 10.0))]
        .into_iter()
        .collect();
    let inputs = RunInputs {
        floorplan,
        power_trace: PowerTrace::from_columns([("A".to_string(), vec![1.0])]),
        netlist: Netlist::parse("I1 n_0.3_0.3 0 1m\nI2 n_2.3_2.3 0 1m\n"),
    };

    let result = NoiseMapCore::run(inputs, &MapOptions::default()).unwrap();
    assert_eq!(result.floorplan.regions()[0].x, Span::new(0.3, 2.3));
    assert_eq!(result.stats.hit, 2);
    assert_eq!(result.stats.miss, 0);
    assert!(result
        .netlist
        .elements
        .iter()
        .all(|e| !e.to_line().starts_with('*')));
}

#[test]
fn test_degenerate_floorplan_is_fatal() {
    let floorplan: Floorplan = [Region::new("A", "A", Span::new(1.0, 1.0), Span::new(0.0, 2.0))]
        .into_iter()
        .collect();
    let inputs = RunInputs {
        floorplan,
        power_trace: PowerTrace::default(),
        netlist: Netlist::parse("I1 n_1_1 0 1m\nR1 n_3_3 0 1\n"),
    };
    let err = NoiseMapCore::run(inputs, &MapOptions::default()).unwrap_err();
    assert!(matches!(err, NoiseMapError::DegenerateBoundingBox { axis: 'x' }));
}

#[test]
fn test_clock_frequency_options_drive_waveform_timing() {
    let options = MapOptions {
        time_precision: 2,
        amplitude_precision: 1,
        ..MapOptions::from_clock_ghz(2.0).unwrap()
    };
    let trace = noisemap::inputs::load_power_trace(&fixture_path("power.csv")).unwrap();
    let waveforms = NoiseMapCore::waveforms(&trace, &options);
    assert_eq!(
        waveforms["cache_pwr"],
        "PWL(0.00N 0 0.05N 0.0 0.10N 0 0.50N 0 0.55N 2.5 0.60N 0)"
    );
}
