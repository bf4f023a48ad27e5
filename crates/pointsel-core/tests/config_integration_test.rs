//! Integration tests for layered configuration
//!
//! Precedence: CLI arguments > Environment variables > Config file > Defaults

use pointsel_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig, PipelineConfig};
use pointsel_core::models::SpatialPredicate;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    for key in [
        "POINTSEL_PREDICATE",
        "POINTSEL_CASE_SENSITIVE",
        "POINTSEL_DELIMITER",
        "POINTSEL_MAX_FILE_SIZE_MB",
        "POINTSEL_TEMP_DIR",
    ] {
        env::remove_var(key);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
#[serial]
fn test_defaults_without_sources() {
    clear_env();
    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.predicate.value, SpatialPredicate::Within);
    assert_eq!(config.case_sensitive.source, ConfigSource::Default);
    assert_eq!(config.pipeline_config(), PipelineConfig::default());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = config_file(
        r#"
predicate = "within"
case_sensitive = false
max_file_size_mb = 50
"#,
    );

    env::set_var("POINTSEL_CASE_SENSITIVE", "true");
    env::set_var("POINTSEL_TEMP_DIR", "/scratch/pointsel");

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    clear_env();

    assert!(config.case_sensitive.value);
    assert_eq!(config.case_sensitive.source, ConfigSource::Environment);
    assert_eq!(config.max_file_size_mb.value, 50);
    assert_eq!(config.max_file_size_mb.source, ConfigSource::File);
    assert_eq!(config.temp_dir.value, Some(PathBuf::from("/scratch/pointsel")));
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();
    env::set_var("POINTSEL_PREDICATE", "touches");
    env::set_var("POINTSEL_DELIMITER", "::");
    env::set_var("POINTSEL_CASE_SENSITIVE", "sometimes");

    let config = LayeredConfig::with_defaults().load_from_env();
    clear_env();

    assert_eq!(config.predicate.value, SpatialPredicate::Within);
    assert_eq!(config.predicate.source, ConfigSource::Default);
    assert_eq!(config.delimiter.value, b',');
    assert!(!config.case_sensitive.value);
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    clear_env();
    let file = config_file(r#"predicate = "within""#);
    env::set_var("POINTSEL_PREDICATE", "within");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();
    clear_env();

    config.update_from_cli(CliConfigOverrides {
        predicate: Some(SpatialPredicate::Intersects),
        delimiter: Some(b'|'),
        ..Default::default()
    });

    assert_eq!(config.predicate.value, SpatialPredicate::Intersects);
    assert_eq!(config.predicate.source, ConfigSource::Cli);
    assert_eq!(config.pipeline_config().delimiter, b'|');

    let map = config.to_inspection_map();
    assert_eq!(map["predicate"], ("intersects".to_string(), ConfigSource::Cli));
}

#[test]
fn test_malformed_file() {
    let file = config_file("predicate = ");
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());

    let missing = LayeredConfig::with_defaults().load_from_file("/nonexistent/pointsel.toml");
    assert!(missing.is_err());
}
