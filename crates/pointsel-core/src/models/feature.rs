use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::geometry::{Crs, Geometry, GeometryType};

/// Unique identifier for a feature within its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

/// One record of a vector dataset
///
/// Geometries are shared between stages and never modified in place.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: FeatureId,

    /// None for records with a null shape
    pub geometry: Option<Arc<Geometry>>,

    pub properties: HashMap<String, serde_json::Value>,
}

impl Feature {
    pub fn new(
        id: FeatureId,
        geometry: Option<Geometry>,
        properties: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self { id, geometry: geometry.map(Arc::new), properties }
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// Attribute value, treating a missing key as null
    pub fn property(&self, column: &str) -> &serde_json::Value {
        static NULL: serde_json::Value = serde_json::Value::Null;
        self.properties.get(column).unwrap_or(&NULL)
    }
}

/// Where a collection came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatMetadata {
    /// Format name (e.g., "Shapefile", "GeoJSON", "GeoPackage")
    pub format_name: String,

    /// Layer name inside the container, or the file stem for single-layer formats
    pub layer_name: Option<String>,

    /// Reader or archive strategy that produced the collection
    pub extraction_method: Option<String>,
}

impl FormatMetadata {
    pub fn new(format_name: impl Into<String>) -> Self {
        Self { format_name: format_name.into(), layer_name: None, extraction_method: None }
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer_name = Some(layer.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.extraction_method = Some(method.into());
        self
    }
}

/// An ordered set of features sharing one attribute schema and one CRS
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    pub name: String,
    pub format_metadata: FormatMetadata,

    /// Column names in source order
    pub schema: Vec<String>,

    /// None when the source does not declare a reference system
    pub crs: Option<Crs>,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.schema.iter().any(|c| c == column)
    }

    /// Distinct geometry types present, in first-seen order
    pub fn geometry_types(&self) -> Vec<GeometryType> {
        let mut types = Vec::new();
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_deref()) {
            let geometry_type = geometry.geometry_type();
            if !types.contains(&geometry_type) {
                types.push(geometry_type);
            }
        }
        types
    }

    /// New collection with the same schema and CRS holding only the kept features
    pub fn retain<F>(&self, mut keep: F) -> FeatureCollection
    where
        F: FnMut(&Feature) -> bool,
    {
        FeatureCollection {
            name: self.name.clone(),
            format_metadata: self.format_metadata.clone(),
            schema: self.schema.clone(),
            crs: self.crs.clone(),
            features: self.features.iter().filter(|f| keep(f)).cloned().collect(),
        }
    }

    /// New collection with the same attributes and replaced geometries and CRS
    pub fn with_geometries(&self, geometries: Vec<Option<Arc<Geometry>>>, crs: Crs) -> FeatureCollection {
        let features = self
            .features
            .iter()
            .zip(geometries)
            .map(|(feature, geometry)| Feature {
                id: feature.id,
                geometry,
                properties: feature.properties.clone(),
            })
            .collect();

        FeatureCollection {
            name: self.name.clone(),
            format_metadata: self.format_metadata.clone(),
            schema: self.schema.clone(),
            crs: Some(crs),
            features,
        }
    }
}

/// Collect the schema from feature properties, keeping first-seen order
pub fn schema_from_features<'a, I>(properties: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a serde_json::Map<String, serde_json::Value>>,
{
    let mut schema: Vec<String> = Vec::new();
    for map in properties {
        for key in map.keys() {
            if !schema.iter().any(|k| k == key) {
                schema.push(key.clone());
            }
        }
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> FeatureCollection {
        let features = (0..4)
            .map(|i| {
                let mut properties = HashMap::new();
                properties.insert("n".to_string(), serde_json::json!(i));
                Feature::new(FeatureId(i), Some(Geometry::point(i as f64, 0.0)), properties)
            })
            .collect();

        FeatureCollection {
            name: "points".to_string(),
            format_metadata: FormatMetadata::new("GeoJSON"),
            schema: vec!["n".to_string()],
            crs: Some(Crs::wgs84()),
            features,
        }
    }

    #[test]
    fn test_retain_keeps_schema_and_crs() {
        let points = collection();
        let even = points.retain(|f| f.id.0 % 2 == 0);

        assert_eq!(even.len(), 2);
        assert_eq!(even.schema, points.schema);
        assert_eq!(even.crs, points.crs);
        assert_eq!(points.len(), 4, "source collection is untouched");
    }

    #[test]
    fn test_missing_property_is_null() {
        let points = collection();
        assert!(points.features[0].property("missing").is_null());
        assert_eq!(points.features[1].property("n"), &serde_json::json!(1));
    }

    #[test]
    fn test_geometry_types() {
        let mut points = collection();
        points.features.push(Feature::new(FeatureId(9), None, HashMap::new()));
        assert_eq!(points.geometry_types(), vec![GeometryType::Point]);
    }

    #[test]
    fn test_schema_from_features_preserves_order() {
        let a: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"NAME": "x", "CODE": 1}"#).unwrap();
        let b: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(r#"{"CODE": 2, "AREA": 3.5}"#).unwrap();

        assert_eq!(schema_from_features([&a, &b]), vec!["NAME", "CODE", "AREA"]);
    }
}
