//! Merge matched polygons into one query geometry

use geo::BooleanOps;

use crate::models::{to_geo_multi_polygon, FeatureCollection};
use pointsel_core::error::{PointselError, Result};

/// Union of every polygonal geometry in the collection
///
/// Null geometries are skipped. Fails with `EmptyUnion` when nothing remains.
pub fn build_union(polygons: &FeatureCollection) -> Result<geo::MultiPolygon> {
    let mut parts = polygons
        .features
        .iter()
        .filter_map(|f| f.geometry.as_deref())
        .filter_map(to_geo_multi_polygon);

    let first = parts.next().ok_or(PointselError::EmptyUnion)?;
    let merged = parts.fold(first, |acc, next| acc.union(&next));

    tracing::debug!("Union of {} polygons has {} parts", polygons.len(), merged.0.len());
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Geometry;
    use geo::Area;
    use pointsel_core::models::{Feature, FeatureId, FormatMetadata};
    use std::collections::HashMap;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
        Geometry::polygon(vec![vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]])
    }

    fn collection(geometries: Vec<Option<Geometry>>) -> FeatureCollection {
        FeatureCollection {
            name: "districts".to_string(),
            format_metadata: FormatMetadata::new("GeoJSON"),
            schema: vec![],
            crs: None,
            features: geometries
                .into_iter()
                .enumerate()
                .map(|(i, g)| Feature::new(FeatureId(i as u64), g, HashMap::new()))
                .collect(),
        }
    }

    #[test]
    fn test_overlapping_union() {
        let merged = build_union(&collection(vec![
            Some(rect(0.0, 0.0, 2.0, 2.0)),
            Some(rect(1.0, 0.0, 3.0, 2.0)),
        ]))
        .unwrap();

        assert_eq!(merged.0.len(), 1);
        assert!((merged.unsigned_area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_union_is_multi_part() {
        let merged = build_union(&collection(vec![
            Some(rect(0.0, 0.0, 1.0, 1.0)),
            None,
            Some(rect(5.0, 5.0, 6.0, 6.0)),
        ]))
        .unwrap();

        assert_eq!(merged.0.len(), 2);
        assert!((merged.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_union() {
        assert!(matches!(build_union(&collection(vec![])), Err(PointselError::EmptyUnion)));
        assert!(matches!(build_union(&collection(vec![None])), Err(PointselError::EmptyUnion)));
    }
}
