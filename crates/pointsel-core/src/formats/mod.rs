//! Format abstraction layer for multi-format support
//!
//! Each container format implements [`FormatReader`], and [`FormatRegistry`] maps
//! file extensions to the reader responsible for them.

use std::path::Path;

use crate::error::{PointselError, Result};
use crate::models::FeatureCollection;

pub mod archive;
pub mod gdal_utils;
pub mod geojson;
pub mod geopackage;
pub mod shapefile;
pub mod validation;

/// Format reader trait that all format implementations must implement
pub trait FormatReader: Send + Sync {
    /// Read one layer of the dataset at `path`
    ///
    /// `layer` selects a named layer; `None` picks the first (or only) layer.
    fn read(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection>;

    /// Supported file extensions, lowercase and without the dot
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name
    fn format_name(&self) -> &str;

    /// Names of the layers the dataset declares
    ///
    /// Single-layer formats expose one layer named after the file stem.
    fn layer_names(&self, path: &Path) -> Result<Vec<String>> {
        Ok(vec![file_stem(path)])
    }

    /// Validate file structure without a full read
    fn validate(&self, path: &Path) -> Result<FormatValidation> {
        Ok(validation::FormatValidator::validate_file_exists(path))
    }
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Problems that prevent reading
    pub errors: Vec<String>,

    /// Issues that don't prevent reading
    pub warnings: Vec<String>,
}

impl FormatValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Dataset name derived from a file path
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

/// Lowercase extension of a path, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Enforce the single-layer rule: an explicit layer must name the dataset itself
pub fn check_single_layer(path: &Path, layer: Option<&str>) -> Result<String> {
    let own = file_stem(path);
    match layer {
        Some(requested) if requested != own => Err(PointselError::LayerNotFound {
            requested: requested.to_string(),
            available: vec![own],
        }),
        _ => Ok(own),
    }
}

/// Central registry for format readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry holding every reader this crate ships
    pub fn with_defaults(temp_root: Option<&Path>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(geojson::GeoJsonReader));
        registry.register(Box::new(shapefile::ShapefileFormatReader));
        registry.register(Box::new(geopackage::GeoPackageReader));
        registry.register(Box::new(archive::ZipArchiveReader::new(temp_root.map(Path::to_path_buf))));
        registry
    }

    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Find the reader responsible for a path's extension
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FormatReader> {
        let extension = extension_of(path).ok_or_else(|| PointselError::UnsupportedFormat {
            extension: "none".to_string(),
            supported: self.supported_formats(),
        })?;

        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| PointselError::UnsupportedFormat {
                extension,
                supported: self.supported_formats(),
            })
    }

    /// Every extension some registered reader accepts
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn readers(&self) -> &[Box<dyn FormatReader>] {
        &self.readers
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
