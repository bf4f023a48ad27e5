//! GeoPackage format reader backed by GDAL

use std::path::Path;

use crate::error::{PointselError, Result};
use crate::formats::gdal_utils::{convert_gdal_error, get_layer_names, open_dataset, read_layer};
use crate::formats::validation::FormatValidator;
use crate::formats::{FormatReader, FormatValidation};
use crate::models::FeatureCollection;

/// GeoPackage reader; a container may hold several layers
pub struct GeoPackageReader;

impl FormatReader for GeoPackageReader {
    fn read(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
        let dataset = open_dataset(path)?;
        let available = get_layer_names(&dataset);

        let layer_name = match layer {
            Some(requested) if !available.iter().any(|name| name == requested) => {
                return Err(PointselError::LayerNotFound {
                    requested: requested.to_string(),
                    available,
                });
            }
            Some(requested) => requested.to_string(),
            None => available.first().cloned().ok_or_else(|| PointselError::FormatError {
                format: "GeoPackage".to_string(),
                message: format!("{} contains no vector layers", path.display()),
            })?,
        };

        tracing::debug!("Reading GeoPackage layer '{}' from {}", layer_name, path.display());

        let mut gdal_layer = dataset
            .layer_by_name(&layer_name)
            .map_err(|e| convert_gdal_error(e, &format!("Failed to open layer '{}'", layer_name)))?;

        read_layer(&mut gdal_layer, "GeoPackage", "gdal")
    }

    fn supported_extensions(&self) -> &[&str] {
        &["gpkg"]
    }

    fn format_name(&self) -> &str {
        "GeoPackage"
    }

    fn layer_names(&self, path: &Path) -> Result<Vec<String>> {
        Ok(get_layer_names(&open_dataset(path)?))
    }

    fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        match open_dataset(path) {
            Ok(dataset) => {
                if get_layer_names(&dataset).is_empty() {
                    validation.errors.push("GeoPackage contains no vector layers".to_string());
                }
            }
            Err(e) => validation.errors.push(e.to_string()),
        }

        Ok(validation)
    }
}
