//! GDAL utility functions and error handling helpers
//!
//! Shared by the GeoPackage reader and the archive strategies that go through
//! GDAL's virtual file system.

use gdal::errors::GdalError;
use gdal::vector::{FieldValue, Layer, LayerAccess};
use gdal::Dataset;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PointselError, Result};
use crate::formats::geojson::geometry_from_geojson;
use crate::models::{Crs, Feature, FeatureCollection, FeatureId, FormatMetadata, Geometry};

/// Convert GDAL errors to crate errors with context
pub fn convert_gdal_error(err: GdalError, context: &str) -> PointselError {
    PointselError::FormatError {
        format: "GDAL".to_string(),
        message: format!("{}: {}", context, err),
    }
}

/// GDAL virtual path that reads straight from inside a zip archive
pub fn vsizip_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("/vsizip/{}", path.display()))
}

pub fn open_dataset(path: &Path) -> Result<Dataset> {
    Dataset::open(path).map_err(|e| convert_gdal_error(e, "Failed to open dataset"))
}

/// Get layer names from an opened GDAL dataset
pub fn get_layer_names(dataset: &Dataset) -> Vec<String> {
    dataset.layers().map(|layer| layer.name()).collect()
}

/// Extract CRS information from a GDAL spatial reference
///
/// An authority code wins; otherwise the WKT is kept as the definition.
pub fn extract_crs_from_spatial_ref(spatial_ref: &gdal::spatial_ref::SpatialRef) -> Result<Crs> {
    if let Ok(code) = spatial_ref.auth_code() {
        if let Ok(code) = u32::try_from(code) {
            return Ok(Crs::from_epsg(code));
        }
    }

    spatial_ref
        .to_wkt()
        .map(|wkt| Crs::from_wkt(&wkt))
        .map_err(|e| convert_gdal_error(e, "Failed to extract CRS as WKT"))
}

/// Read every feature of a GDAL layer into a collection
///
/// `format_name` and `method` end up in the collection's format metadata.
pub fn read_layer(layer: &mut Layer, format_name: &str, method: &str) -> Result<FeatureCollection> {
    let name = layer.name();
    let schema: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
    let crs = layer
        .spatial_ref()
        .map(|srs| extract_crs_from_spatial_ref(&srs))
        .transpose()?;

    let mut features = Vec::new();
    for feature in layer.features() {
        let geometry = match feature.geometry() {
            Some(geom) => Some(convert_geometry(geom)?),
            None => None,
        };

        let properties: HashMap<String, serde_json::Value> = feature
            .fields()
            .map(|(field, value)| (field, convert_field_value(value)))
            .collect();

        features.push(Feature::new(FeatureId(features.len() as u64), geometry, properties));
    }

    tracing::debug!("Read {} features from GDAL layer '{}'", features.len(), name);

    Ok(FeatureCollection {
        format_metadata: FormatMetadata::new(format_name)
            .with_layer(name.clone())
            .with_method(method),
        name,
        schema,
        crs,
        features,
    })
}

/// Route a GDAL geometry through its GeoJSON rendering
fn convert_geometry(geometry: &gdal::vector::Geometry) -> Result<Geometry> {
    let json = geometry
        .json()
        .map_err(|e| convert_gdal_error(e, "Failed to export geometry"))?;
    let parsed: geojson::Geometry = json.parse().map_err(|e| PointselError::FormatError {
        format: "GDAL".to_string(),
        message: format!("Failed to parse exported geometry: {}", e),
    })?;

    geometry_from_geojson(&parsed.value)
}

fn convert_field_value(value: Option<FieldValue>) -> serde_json::Value {
    match value {
        None => serde_json::Value::Null,
        Some(FieldValue::IntegerValue(i)) => serde_json::Value::from(i),
        Some(FieldValue::Integer64Value(i)) => serde_json::Value::from(i),
        Some(FieldValue::RealValue(r)) => serde_json::Number::from_f64(r)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(FieldValue::StringValue(s)) => serde_json::Value::String(s),
        Some(other) => other
            .into_string()
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null),
    }
}

/// Check if a path has a specific extension
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
