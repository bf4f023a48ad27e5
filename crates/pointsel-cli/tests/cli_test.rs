//! Integration tests for the pointsel binary
//!
//! These tests run the built binary and check exit codes, files and JSON output.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const ENV_VARS: [&str; 5] = [
    "POINTSEL_PREDICATE",
    "POINTSEL_CASE_SENSITIVE",
    "POINTSEL_DELIMITER",
    "POINTSEL_MAX_FILE_SIZE_MB",
    "POINTSEL_TEMP_DIR",
];

const WELLS: &str = r#"{"type": "FeatureCollection", "features": [
    {"type": "Feature", "properties": {"WELL_ID": "W1"}, "geometry": {"type": "Point", "coordinates": [5, 5]}},
    {"type": "Feature", "properties": {"WELL_ID": "W2"}, "geometry": {"type": "Point", "coordinates": [50, 5]}}
]}"#;

const DISTRICTS: &str = r#"{"type": "FeatureCollection", "features": [
    {"type": "Feature", "properties": {"NAME": "Bankura"},
     "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]}},
    {"type": "Feature", "properties": {"NAME": "Purulia"},
     "geometry": {"type": "Polygon", "coordinates": [[[40, 0], [60, 0], [60, 10], [40, 10], [40, 0]]]}}
]}"#;

fn pointsel_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove 'deps' directory
    path.push("pointsel");
    path
}

/// Run the binary in `dir` with no POINTSEL_* variables set
fn run(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(pointsel_bin());
    command.current_dir(dir).args(args);
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command.output().expect("Failed to execute command")
}

fn fixtures() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("wells.geojson"), WELLS).unwrap();
    fs::write(dir.path().join("districts.geojson"), DISTRICTS).unwrap();
    dir
}

fn parse_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

#[test]
fn test_extract_writes_output_file() {
    let dir = fixtures();

    let output = run(
        dir.path(),
        &[
            "extract",
            "--points", "wells.geojson",
            "--polygons", "districts.geojson",
            "--name-column", "NAME",
            "--name-value", "bankura",
            "--output", "selected.csv",
        ],
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let csv = fs::read_to_string(dir.path().join("selected.csv")).unwrap();
    assert_eq!(csv, "WELL_ID\nW1\n");
}

#[test]
fn test_extract_to_stdout() {
    let dir = fixtures();

    let output = run(
        dir.path(),
        &[
            "extract",
            "--points", "wells.geojson",
            "--polygons", "districts.geojson",
            "--name-column", "NAME",
            "--name-value", "Purulia",
            "--predicate", "intersects",
        ],
    );

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "WELL_ID\nW2\n");
}

#[test]
fn test_no_match_exits_with_status_2_and_writes_nothing() {
    let dir = fixtures();

    let output = run(
        dir.path(),
        &[
            "extract",
            "--points", "wells.geojson",
            "--polygons", "districts.geojson",
            "--name-column", "NAME",
            "--name-value", "nonexistent",
            "--output", "selected.csv",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.path().join("selected.csv").exists());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nonexistent"));
}

#[test]
fn test_case_sensitive_flag() {
    let dir = fixtures();

    let output = run(
        dir.path(),
        &[
            "extract",
            "--points", "wells.geojson",
            "--polygons", "districts.geojson",
            "--name-column", "NAME",
            "--name-value", "BANKURA",
            "--case-sensitive",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unsupported_predicate_fails() {
    let dir = fixtures();

    let output = run(
        dir.path(),
        &[
            "extract",
            "--points", "wells.geojson",
            "--polygons", "districts.geojson",
            "--name-column", "NAME",
            "--name-value", "Bankura",
            "--predicate", "touches",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("touches"));
}

#[test]
fn test_extract_json_summary() {
    let dir = fixtures();

    let output = run(
        dir.path(),
        &[
            "--json",
            "extract",
            "--points", "wells.geojson",
            "--polygons", "districts.geojson",
            "--name-column", "NAME",
            "--name-value", "Bankura",
            "--output", "selected.csv",
        ],
    );

    assert!(output.status.success());
    let parsed = parse_json(&output);
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["data"]["row_count"], 1);
    assert_eq!(parsed["data"]["points_read"], 2);
    assert_eq!(parsed["data"]["polygons_matched"], 1);
    assert_eq!(parsed["data"]["predicate"], "within");
    assert!(parsed["data"].get("csv").is_none());
}

#[test]
fn test_inspect_json() {
    let dir = fixtures();

    let output = run(dir.path(), &["--json", "inspect", "wells.geojson"]);

    assert!(output.status.success());
    let parsed = parse_json(&output);
    let data = &parsed["data"];
    assert_eq!(data["format"], "GeoJSON");
    assert_eq!(data["layers"], serde_json::json!(["wells"]));
    assert_eq!(data["layer"]["feature_count"], 2);
    assert_eq!(data["layer"]["geometry_types"], serde_json::json!(["Point"]));
    assert_eq!(data["layer"]["crs"], "EPSG:4326");
    assert_eq!(data["layer"]["columns"], serde_json::json!(["WELL_ID"]));
    assert!(data.get("archive").is_none());
}

#[test]
fn test_inspect_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["inspect", "absent.geojson"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Dataset file not found"));
}

#[test]
fn test_config_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let output = run(dir.path(), &["--json", "config"]);

    assert!(output.status.success());
    let values = &parse_json(&output)["data"]["values"];
    assert_eq!(values["predicate"]["value"], "within");
    assert_eq!(values["predicate"]["source"], "Default");
    assert_eq!(values["case_sensitive"]["value"], "false");
    assert_eq!(values["max_file_size_mb"]["value"], "200");
}

#[test]
fn test_config_file_and_environment() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("custom.toml"),
        "predicate = \"intersects\"\nmax_file_size_mb = 50\n",
    )
    .unwrap();

    let output = Command::new(pointsel_bin())
        .current_dir(dir.path())
        .args(["--json", "--config", "custom.toml", "config"])
        .env_remove("POINTSEL_PREDICATE")
        .env_remove("POINTSEL_DELIMITER")
        .env_remove("POINTSEL_CASE_SENSITIVE")
        .env_remove("POINTSEL_TEMP_DIR")
        .env("POINTSEL_MAX_FILE_SIZE_MB", "75")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let values = &parse_json(&output)["data"]["values"];
    assert_eq!(values["predicate"]["value"], "intersects");
    assert_eq!(values["predicate"]["source"], "File");
    assert_eq!(values["max_file_size_mb"]["value"], "75");
    assert_eq!(values["max_file_size_mb"]["source"], "Environment");
}

#[test]
fn test_default_config_file_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pointsel.toml"), "case_sensitive = true\n").unwrap();

    let output = run(dir.path(), &["--json", "config"]);

    assert!(output.status.success());
    let values = &parse_json(&output)["data"]["values"];
    assert_eq!(values["case_sensitive"]["value"], "true");
    assert_eq!(values["case_sensitive"]["source"], "File");
}
