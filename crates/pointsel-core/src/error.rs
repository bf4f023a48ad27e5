//! Error types for pointsel

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of the selection is missing a coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Points,
    Polygons,
    Both,
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerRole::Points => write!(f, "Point layer CRS is missing"),
            LayerRole::Polygons => write!(f, "Polygon layer CRS is missing"),
            LayerRole::Both => write!(f, "Both layers are missing CRS"),
        }
    }
}

/// Failure of a single attempt in the archive fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub strategy: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum PointselError {
    // Source errors
    #[error("Could not read {path}: {reason}")]
    UnreadableSource {
        path: PathBuf,
        reason: String,
        attempts: Vec<StrategyFailure>,
    },

    #[error("Unsupported file type '.{extension}'. Supported: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    #[error("Layer '{requested}' not found. Available layers: {}", available.join(", "))]
    LayerNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    // Selection errors
    #[error("{role}. Please define it before running.")]
    MissingCrs { role: LayerRole },

    #[error("Column '{column}' not found in polygons. Available columns: {}", available.join(", "))]
    SchemaMismatch {
        column: String,
        available: Vec<String>,
    },

    #[error("No polygon matched the name '{value}' in column '{column}'. Try a different value or check spelling.")]
    NoMatch { column: String, value: String },

    #[error("Unsupported predicate: {predicate}. Use one of: {}", supported.join(", "))]
    UnsupportedPredicate {
        predicate: String,
        supported: Vec<String>,
    },

    #[error("Layer '{layer}' must contain only {expected} geometries, found {found}")]
    MixedGeometry {
        layer: String,
        expected: String,
        found: String,
    },

    #[error("Cannot build a union from an empty set of polygons")]
    EmptyUnion,

    #[error("Failed to reproject from {from} to {to}: {reason}")]
    Reprojection {
        from: String,
        to: String,
        reason: String,
    },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Output errors
    #[error("Export error: {0}")]
    Export(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PointselError {
    /// Per-strategy failures when the source was an archive, empty otherwise
    pub fn attempts(&self) -> &[StrategyFailure] {
        match self {
            PointselError::UnreadableSource { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, PointselError>;
