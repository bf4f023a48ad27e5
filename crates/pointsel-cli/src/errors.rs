use console::style;
use pointsel_core::error::{LayerRole, PointselError};
use std::fmt;

/// Exit status when the name filter matched no polygon
pub const EXIT_NO_MATCH: i32 = 2;

/// Exit status for every other failure
pub const EXIT_FAILURE: i32 = 1;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create error for a dataset path that does not exist
pub fn dataset_not_found(path: &str) -> CliError {
    CliError::new("Dataset file not found")
        .with_context(format!("The specified dataset file does not exist.\n\nPath: {}", path))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Use absolute path or path relative to current directory")
        .with_help("Run: pointsel inspect --help")
}

/// Attach context and suggestions to a library error
pub fn from_pointsel(error: &PointselError) -> CliError {
    let message = error.to_string();

    match error {
        PointselError::UnreadableSource { attempts, .. } if !attempts.is_empty() => {
            let tried = attempts
                .iter()
                .map(|a| format!("  - {}: {}", a.strategy, a.reason))
                .collect::<Vec<_>>()
                .join("\n");
            CliError::new("Could not read the archive")
                .with_context(format!("Every read strategy failed:\n\n{}", tried))
                .with_suggestion("Put the .shp, .shx and .dbf files (and the .prj) at the root of the zip")
                .with_suggestion("Inspect the archive layout: pointsel inspect <archive.zip>")
                .with_help("Run: pointsel inspect --help")
        }
        PointselError::UnreadableSource { .. } | PointselError::FormatError { .. } => {
            CliError::new(message)
                .with_suggestion("Check that the file is not corrupt and opens in a GIS application")
                .with_help("Run: pointsel inspect --help")
        }
        PointselError::MissingCrs { role } => {
            let which = match role {
                LayerRole::Points => "the point layer",
                LayerRole::Polygons => "the polygon layer",
                LayerRole::Both => "both layers",
            };
            CliError::new(message)
                .with_context(format!("No coordinate reference system is declared for {}.", which))
                .with_suggestion("Add a .prj file next to the Shapefile")
                .with_suggestion("Or define the CRS in a GIS application and export again")
        }
        PointselError::SchemaMismatch { available, .. } => CliError::new(message)
            .with_suggestion(format!("Use one of: {}", available.join(", ")))
            .with_help("Run: pointsel inspect <polygons>"),
        PointselError::NoMatch { .. } => CliError::new(message)
            .with_suggestion("Check the spelling of the name")
            .with_suggestion("Drop --case-sensitive to ignore case")
            .with_help("Run: pointsel inspect <polygons>"),
        PointselError::UnsupportedFormat { .. } => CliError::new(message)
            .with_suggestion("Convert the dataset to GeoJSON, GeoPackage or a zipped Shapefile"),
        PointselError::LayerNotFound { available, .. } => CliError::new(message)
            .with_suggestion(format!("Pick one of: {}", available.join(", ")))
            .with_suggestion("Or omit the layer to read the first one"),
        PointselError::FileNotFound { path } => dataset_not_found(&path.display().to_string()),
        PointselError::MixedGeometry { .. } => CliError::new(message)
            .with_suggestion("Check that --points and --polygons are not swapped"),
        PointselError::ConfigInvalid { .. } => CliError::new(message)
            .with_suggestion("Check pointsel.toml and the POINTSEL_* environment variables")
            .with_help("Run: pointsel config"),
        _ => CliError::new(message),
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(inner) = error.downcast_ref::<PointselError>() {
        return from_pointsel(inner);
    }
    if let Some(inner) = error.downcast_ref::<CliError>() {
        return CliError {
            message: inner.message.clone(),
            context: inner.context.clone(),
            suggestions: inner.suggestions.clone(),
            help_command: inner.help_command.clone(),
        };
    }

    let message = format!("{:#}", error);

    // Try to provide context based on error message
    if message.contains("No such file or directory") {
        CliError::new("File not found")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check the file path and try again")
    } else if message.contains("ermission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check file permissions")
    } else {
        CliError::new(message)
    }
}

/// Process exit status for a failed command
pub fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<PointselError>() {
        Some(PointselError::NoMatch { .. }) => EXIT_NO_MATCH,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointsel_core::error::StrategyFailure;
    use std::path::PathBuf;

    #[test]
    fn test_no_match_exit_code() {
        let error = anyhow::Error::from(PointselError::NoMatch {
            column: "NAME".to_string(),
            value: "nowhere".to_string(),
        });
        assert_eq!(exit_code(&error), EXIT_NO_MATCH);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), EXIT_FAILURE);
    }

    #[test]
    fn test_exit_code_survives_context() {
        use anyhow::Context;

        let result: Result<(), PointselError> = Err(PointselError::NoMatch {
            column: "NAME".to_string(),
            value: "nowhere".to_string(),
        });
        let error = result.context("selection failed").unwrap_err();
        assert_eq!(exit_code(&error), EXIT_NO_MATCH);
    }

    #[test]
    fn test_unreadable_archive_lists_attempts() {
        let error = PointselError::UnreadableSource {
            path: PathBuf::from("wells.zip"),
            reason: "all strategies failed".to_string(),
            attempts: vec![
                StrategyFailure { strategy: "vsizip".to_string(), reason: "no layer".to_string() },
                StrategyFailure { strategy: "extract".to_string(), reason: "no .shp".to_string() },
            ],
        };

        let cli_error = from_pointsel(&error);
        let context = cli_error.context.unwrap();
        assert!(context.contains("vsizip: no layer"));
        assert!(context.contains("extract: no .shp"));
        assert!(!cli_error.suggestions.is_empty());
    }

    #[test]
    fn test_schema_mismatch_suggests_columns() {
        let error = PointselError::SchemaMismatch {
            column: "DISTRICT".to_string(),
            available: vec!["NAME".to_string(), "CODE".to_string()],
        };
        let cli_error = from_anyhow(error.into());
        assert_eq!(cli_error.suggestions[0], "Use one of: NAME, CODE");
    }
}
