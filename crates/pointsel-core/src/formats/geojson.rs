//! GeoJSON format reader implementation

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{PointselError, Result};
use crate::formats::validation::FormatValidator;
use crate::formats::{check_single_layer, FormatReader, FormatValidation};
use crate::models::{
    schema_from_features, Crs, Feature, FeatureCollection, FeatureId, FormatMetadata, Geometry,
};

/// GeoJSON format reader
pub struct GeoJsonReader;

impl FormatReader for GeoJsonReader {
    fn read(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
        let name = check_single_layer(path, layer)?;

        let content = fs::read_to_string(path)?;
        let geojson: geojson::GeoJson = content.parse().map_err(|e| PointselError::FormatError {
            format: "GeoJSON".to_string(),
            message: format!("Failed to parse GeoJSON: {}", e),
        })?;

        let (features, schema, crs) = self.extract_features_and_crs(&geojson)?;

        Ok(FeatureCollection {
            format_metadata: FormatMetadata::new("GeoJSON")
                .with_layer(name.clone())
                .with_method("geojson"),
            name,
            schema,
            crs: Some(crs),
            features,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }

    fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        Ok(FormatValidator::merge_validations(vec![
            validation,
            FormatValidator::validate_json_structure(path),
        ]))
    }
}

impl GeoJsonReader {
    /// Extract features, schema and CRS from a parsed document
    ///
    /// Without a legacy `crs` member the document is WGS 84, as RFC 7946 mandates.
    fn extract_features_and_crs(
        &self,
        geojson: &geojson::GeoJson,
    ) -> Result<(Vec<Feature>, Vec<String>, Crs)> {
        match geojson {
            geojson::GeoJson::FeatureCollection(fc) => {
                let features = fc
                    .features
                    .iter()
                    .enumerate()
                    .map(|(idx, feature)| self.convert_feature(feature, idx))
                    .collect::<Result<Vec<_>>>()?;

                let schema = schema_from_features(fc.features.iter().filter_map(|f| f.properties.as_ref()));

                let crs = fc
                    .foreign_members
                    .as_ref()
                    .and_then(|fm| fm.get("crs"))
                    .and_then(extract_epsg_from_crs)
                    .map(Crs::from_epsg)
                    .unwrap_or_else(Crs::wgs84);

                Ok((features, schema, crs))
            }
            geojson::GeoJson::Feature(feature) => {
                let schema = schema_from_features(feature.properties.as_ref());
                Ok((vec![self.convert_feature(feature, 0)?], schema, Crs::wgs84()))
            }
            geojson::GeoJson::Geometry(geom) => {
                let feature = Feature::new(FeatureId(0), Some(geometry_from_geojson(&geom.value)?), HashMap::new());
                Ok((vec![feature], Vec::new(), Crs::wgs84()))
            }
        }
    }

    fn convert_feature(&self, feature: &geojson::Feature, idx: usize) -> Result<Feature> {
        let geometry = feature
            .geometry
            .as_ref()
            .map(|geom| geometry_from_geojson(&geom.value))
            .transpose()?;

        let properties = feature
            .properties
            .as_ref()
            .map(|props| props.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(Feature::new(FeatureId(idx as u64), geometry, properties))
    }
}

/// Convert a GeoJSON geometry value to the canonical 2D geometry
pub fn geometry_from_geojson(value: &geojson::Value) -> Result<Geometry> {
    fn position(p: &[f64]) -> Result<[f64; 2]> {
        match p {
            [x, y, ..] => Ok([*x, *y]),
            _ => Err(PointselError::FormatError {
                format: "GeoJSON".to_string(),
                message: format!("Position needs at least two ordinates, found {}", p.len()),
            }),
        }
    }

    fn line(points: &[Vec<f64>]) -> Result<Vec<[f64; 2]>> {
        points.iter().map(|p| position(p)).collect()
    }

    fn rings(rings: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<[f64; 2]>>> {
        rings.iter().map(|r| line(r)).collect()
    }

    Ok(match value {
        geojson::Value::Point(p) => Geometry::Point { coordinates: position(p)? },
        geojson::Value::MultiPoint(points) => Geometry::MultiPoint { coordinates: line(points)? },
        geojson::Value::LineString(points) => Geometry::LineString { coordinates: line(points)? },
        geojson::Value::MultiLineString(lines) => {
            Geometry::MultiLineString { coordinates: rings(lines)? }
        }
        geojson::Value::Polygon(polygon) => Geometry::Polygon { coordinates: rings(polygon)? },
        geojson::Value::MultiPolygon(polygons) => Geometry::MultiPolygon {
            coordinates: polygons.iter().map(|p| rings(p)).collect::<Result<_>>()?,
        },
        geojson::Value::GeometryCollection(_) => {
            return Err(PointselError::FormatError {
                format: "GeoJSON".to_string(),
                message: "GeometryCollection is not supported".to_string(),
            })
        }
    })
}

/// Extract EPSG code from a legacy GeoJSON `crs` member
fn extract_epsg_from_crs(crs: &serde_json::Value) -> Option<u32> {
    let name = crs.get("properties")?.get("name")?.as_str()?;
    // "EPSG:4326" or "urn:ogc:def:crs:EPSG::4326"; CRS84 is lon/lat WGS 84
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    name.rsplit(':').next()?.parse().ok()
}
