use crate::error::{PointselError, Result};
use crate::models::SpatialPredicate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default upper bound for an input file
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 200;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Process-wide settings handed explicitly to the reader and exporter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Parent for extraction and spooling directories; `None` uses the system default
    pub temp_dir: Option<PathBuf>,
    pub max_file_size_mb: u64,
    pub delimiter: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            delimiter: b',',
        }
    }
}

/// Layered configuration for pointsel
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub predicate: ConfigValue<SpatialPredicate>,
    pub case_sensitive: ConfigValue<bool>,
    pub delimiter: ConfigValue<u8>,
    pub max_file_size_mb: ConfigValue<u64>,
    pub temp_dir: ConfigValue<Option<PathBuf>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            predicate: ConfigValue::new(SpatialPredicate::Within, ConfigSource::Default),
            case_sensitive: ConfigValue::new(false, ConfigSource::Default),
            delimiter: ConfigValue::new(b',', ConfigSource::Default),
            max_file_size_mb: ConfigValue::new(DEFAULT_MAX_FILE_SIZE_MB, ConfigSource::Default),
            temp_dir: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| PointselError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig = toml::from_str(&content).map_err(|e| PointselError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to parse TOML: {}", e),
        })?;

        if let Some(predicate) = file_config.predicate {
            self.predicate.update(predicate.parse()?, ConfigSource::File);
        }

        if let Some(case_sensitive) = file_config.case_sensitive {
            self.case_sensitive.update(case_sensitive, ConfigSource::File);
        }

        if let Some(delimiter) = file_config.delimiter {
            self.delimiter.update(parse_delimiter(&delimiter)?, ConfigSource::File);
        }

        if let Some(max_file_size_mb) = file_config.max_file_size_mb {
            self.max_file_size_mb.update(max_file_size_mb, ConfigSource::File);
        }

        if let Some(temp_dir) = file_config.temp_dir {
            self.temp_dir.update(Some(temp_dir), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(predicate_str) = env::var("POINTSEL_PREDICATE") {
            match predicate_str.parse::<SpatialPredicate>() {
                Ok(predicate) => self.predicate.update(predicate, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid POINTSEL_PREDICATE value '{}': expected within or intersects",
                    predicate_str
                ),
            }
        }

        if let Ok(flag_str) = env::var("POINTSEL_CASE_SENSITIVE") {
            match parse_bool(&flag_str) {
                Ok(flag) => self.case_sensitive.update(flag, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid POINTSEL_CASE_SENSITIVE value '{}': expected true or false",
                    flag_str
                ),
            }
        }

        if let Ok(delimiter_str) = env::var("POINTSEL_DELIMITER") {
            match parse_delimiter(&delimiter_str) {
                Ok(delimiter) => self.delimiter.update(delimiter, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid POINTSEL_DELIMITER value '{}': expected a single ASCII character",
                    delimiter_str
                ),
            }
        }

        if let Ok(size_str) = env::var("POINTSEL_MAX_FILE_SIZE_MB") {
            match size_str.trim().parse::<u64>() {
                Ok(size) if size > 0 => self.max_file_size_mb.update(size, ConfigSource::Environment),
                _ => tracing::warn!(
                    "Invalid POINTSEL_MAX_FILE_SIZE_MB value '{}': expected a positive integer",
                    size_str
                ),
            }
        }

        if let Ok(temp_dir) = env::var("POINTSEL_TEMP_DIR") {
            if temp_dir.trim().is_empty() {
                tracing::warn!("Ignoring empty POINTSEL_TEMP_DIR");
            } else {
                self.temp_dir.update(Some(PathBuf::from(temp_dir)), ConfigSource::Environment);
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(predicate) = overrides.predicate {
            self.predicate.update(predicate, ConfigSource::Cli);
        }

        if let Some(case_sensitive) = overrides.case_sensitive {
            self.case_sensitive.update(case_sensitive, ConfigSource::Cli);
        }

        if let Some(delimiter) = overrides.delimiter {
            self.delimiter.update(delimiter, ConfigSource::Cli);
        }

        if let Some(temp_dir) = overrides.temp_dir {
            self.temp_dir.update(Some(temp_dir), ConfigSource::Cli);
        }
    }

    /// Resolve the settings the pipeline needs
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            temp_dir: self.temp_dir.value.clone(),
            max_file_size_mb: self.max_file_size_mb.value,
            delimiter: self.delimiter.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "predicate".to_string(),
            (self.predicate.value.to_string(), self.predicate.source),
        );

        map.insert(
            "case_sensitive".to_string(),
            (self.case_sensitive.value.to_string(), self.case_sensitive.source),
        );

        map.insert(
            "delimiter".to_string(),
            (format!("{:?}", self.delimiter.value as char), self.delimiter.source),
        );

        map.insert(
            "max_file_size_mb".to_string(),
            (self.max_file_size_mb.value.to_string(), self.max_file_size_mb.source),
        );

        let temp_dir = match &self.temp_dir.value {
            Some(dir) => dir.display().to_string(),
            None => "(system default)".to_string(),
        };
        map.insert("temp_dir".to_string(), (temp_dir, self.temp_dir.source));

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    predicate: Option<String>,
    case_sensitive: Option<bool>,
    delimiter: Option<String>,
    max_file_size_mb: Option<u64>,
    temp_dir: Option<PathBuf>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub predicate: Option<SpatialPredicate>,
    pub case_sensitive: Option<bool>,
    pub delimiter: Option<u8>,
    pub temp_dir: Option<PathBuf>,
}

/// Parse a field delimiter; `tab` and `\t` name the tab character
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }

    match s.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' && *byte != b'\r' => Ok(*byte),
        _ => Err(PointselError::ConfigInvalid {
            key: "delimiter".to_string(),
            reason: format!("Invalid delimiter: {:?}. Use a single ASCII character", s),
        }),
    }
}

/// Parse a boolean flag from string
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(PointselError::ConfigInvalid {
            key: "case_sensitive".to_string(),
            reason: format!("Invalid boolean: {}. Use true or false", s),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.predicate.value, SpatialPredicate::Within);
        assert_eq!(config.predicate.source, ConfigSource::Default);
        assert!(!config.case_sensitive.value);
        assert_eq!(config.delimiter.value, b',');
        assert_eq!(config.pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.source, ConfigSource::Environment);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
predicate = "intersects"
case_sensitive = true
delimiter = ";"
max_file_size_mb = 50
temp_dir = "/var/tmp/pointsel"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.predicate.value, SpatialPredicate::Intersects);
        assert_eq!(config.predicate.source, ConfigSource::File);
        assert!(config.case_sensitive.value);
        assert_eq!(config.delimiter.value, b';');

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.max_file_size_mb, 50);
        assert_eq!(pipeline.temp_dir, Some(PathBuf::from("/var/tmp/pointsel")));
    }

    #[test]
    fn test_file_with_bad_predicate() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"predicate = "touches""#).unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(PointselError::UnsupportedPredicate { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        env::set_var("POINTSEL_PREDICATE", "intersects");
        env::set_var("POINTSEL_MAX_FILE_SIZE_MB", "not-a-number");
        env::set_var("POINTSEL_DELIMITER", "tab");

        let config = LayeredConfig::with_defaults().load_from_env();

        env::remove_var("POINTSEL_PREDICATE");
        env::remove_var("POINTSEL_MAX_FILE_SIZE_MB");
        env::remove_var("POINTSEL_DELIMITER");

        assert_eq!(config.predicate.value, SpatialPredicate::Intersects);
        assert_eq!(config.predicate.source, ConfigSource::Environment);
        assert_eq!(config.max_file_size_mb.value, DEFAULT_MAX_FILE_SIZE_MB);
        assert_eq!(config.max_file_size_mb.source, ConfigSource::Default);
        assert_eq!(config.delimiter.value, b'\t');
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            predicate: Some(SpatialPredicate::Intersects),
            case_sensitive: Some(true),
            ..Default::default()
        });

        assert_eq!(config.predicate.value, SpatialPredicate::Intersects);
        assert_eq!(config.predicate.source, ConfigSource::Cli);
        assert!(config.case_sensitive.value);
        assert_eq!(config.delimiter.source, ConfigSource::Default);
        assert_eq!(config.temp_dir.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("|").unwrap(), b'|');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("\"").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();

        assert_eq!(map.len(), 5);
        let (predicate, source) = &map["predicate"];
        assert_eq!(predicate, "within");
        assert_eq!(*source, ConfigSource::Default);
        assert_eq!(map["delimiter"].0, "','");
    }
}
