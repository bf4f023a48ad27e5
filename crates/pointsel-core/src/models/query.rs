use std::path::{Path, PathBuf};

use super::geometry::SpatialPredicate;
use crate::error::{PointselError, Result};

/// Where a dataset's bytes come from
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// A file already on disk
    Path(PathBuf),
    /// An in-memory upload; `file_name` carries the extension used for format detection
    Bytes { file_name: String, bytes: Vec<u8> },
}

impl DatasetSource {
    /// File name used for format detection and messages
    pub fn file_name(&self) -> String {
        match self {
            DatasetSource::Path(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string(),
            DatasetSource::Bytes { file_name, .. } => file_name.clone(),
        }
    }
}

impl From<PathBuf> for DatasetSource {
    fn from(path: PathBuf) -> Self {
        DatasetSource::Path(path)
    }
}

impl From<&Path> for DatasetSource {
    fn from(path: &Path) -> Self {
        DatasetSource::Path(path.to_path_buf())
    }
}

/// A dataset plus the optional layer to read from it
#[derive(Debug, Clone)]
pub struct DatasetRef {
    pub source: DatasetSource,
    pub layer: Option<String>,
}

impl DatasetRef {
    pub fn new(source: impl Into<DatasetSource>) -> Self {
        Self { source: source.into(), layer: None }
    }

    /// Select a named layer; blank names mean "first layer"
    pub fn with_layer(mut self, layer: Option<String>) -> Self {
        self.layer = layer.filter(|l| !l.trim().is_empty());
        self
    }
}

/// Parameters selecting the target polygon and the predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionQuery {
    pub name_column: String,
    pub name_value: String,
    pub case_sensitive: bool,
    pub predicate: SpatialPredicate,
}

impl SelectionQuery {
    /// Build a query from raw caller input
    ///
    /// The predicate string is validated here so that an unsupported predicate is
    /// rejected before any dataset is opened.
    pub fn parse(
        name_column: &str,
        name_value: &str,
        case_sensitive: bool,
        predicate: &str,
    ) -> Result<Self> {
        let name_column = name_column.trim();
        let name_value = name_value.trim();

        if name_column.is_empty() {
            return Err(PointselError::ConfigInvalid {
                key: "name_column".to_string(),
                reason: "Name column is required".to_string(),
            });
        }
        if name_value.is_empty() {
            return Err(PointselError::ConfigInvalid {
                key: "name_value".to_string(),
                reason: "Name value is required".to_string(),
            });
        }

        Ok(Self {
            name_column: name_column.to_string(),
            name_value: name_value.to_string(),
            case_sensitive,
            predicate: predicate.parse()?,
        })
    }
}
