//! Dataset entry point: validation, format dispatch and upload spooling

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::{PointselError, Result};
use crate::formats::validation::pre_read_validation;
use crate::formats::{FormatReader, FormatRegistry, FormatValidation};
use crate::models::{DatasetRef, DatasetSource, FeatureCollection};

/// Reads a [`DatasetRef`] into a [`FeatureCollection`]
pub struct LayerReader {
    registry: FormatRegistry,
    max_file_size_mb: u64,
    temp_root: Option<PathBuf>,
}

impl LayerReader {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            registry: FormatRegistry::with_defaults(config.temp_dir.as_deref()),
            max_file_size_mb: config.max_file_size_mb,
            temp_root: config.temp_dir.clone(),
        }
    }

    /// Name of the format `path` would be read as
    pub fn format_name(&self, path: &Path) -> Result<&str> {
        Ok(self.registry.detect_format(path)?.format_name())
    }

    /// Read the referenced layer
    pub fn read(&self, dataset: &DatasetRef) -> Result<FeatureCollection> {
        let layer = dataset.layer.as_deref();
        match &dataset.source {
            DatasetSource::Path(path) => self.read_path(path, layer),
            DatasetSource::Bytes { file_name, bytes } => {
                let (_spool, path) = self.spool(file_name, bytes)?;
                self.read_path(&path, layer)
            }
        }
    }

    /// Read a layer from a file on disk
    pub fn read_path(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
        let reader = self.reader_for(path)?;

        tracing::info!("Reading {} as {}", path.display(), reader.format_name());
        let collection = reader.read(path, layer)?;
        tracing::debug!(
            "Layer '{}' holds {} features, CRS {}",
            collection.name,
            collection.len(),
            collection.crs.as_ref().map(|c| c.label()).unwrap_or_else(|| "undefined".to_string())
        );

        Ok(collection)
    }

    /// Layer names the dataset declares
    pub fn layer_names(&self, path: &Path) -> Result<Vec<String>> {
        self.reader_for(path)?.layer_names(path)
    }

    /// Structural checks without a full read
    pub fn validate(&self, path: &Path) -> Result<FormatValidation> {
        self.reader_for(path)?.validate(path)
    }

    fn reader_for(&self, path: &Path) -> Result<&dyn FormatReader> {
        let reader = self.registry.detect_format(path)?;
        pre_read_validation(path, self.max_file_size_mb)?;
        Ok(reader)
    }

    /// Write an upload into a scoped directory; the file lives as long as the returned guard
    fn spool(&self, file_name: &str, bytes: &[u8]) -> Result<(tempfile::TempDir, PathBuf)> {
        let safe_name = Path::new(file_name)
            .file_name()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PointselError::InvalidPath {
                path: PathBuf::from(file_name),
                reason: "Upload has no usable file name".to_string(),
            })?;

        // Reject unsupported uploads before touching the disk
        self.registry.detect_format(Path::new(safe_name))?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("pointsel-upload-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let path = dir.path().join(safe_name);
        fs::write(&path, bytes)?;
        tracing::debug!("Spooled {} bytes to {}", bytes.len(), path.display());

        Ok((dir, path))
    }
}

impl Default for LayerReader {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}
