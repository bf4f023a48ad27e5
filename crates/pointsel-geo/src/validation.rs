use crate::models::{FeatureCollection, GeometryType};
use pointsel_core::error::{PointselError, Result};

/// Check that every non-null geometry is a point or multipoint
pub fn ensure_points(collection: &FeatureCollection) -> Result<()> {
    ensure_homogeneous(collection, "point", GeometryType::is_puntal)
}

/// Check that every non-null geometry is a polygon or multipolygon
pub fn ensure_polygons(collection: &FeatureCollection) -> Result<()> {
    ensure_homogeneous(collection, "polygon", GeometryType::is_polygonal)
}

fn ensure_homogeneous(
    collection: &FeatureCollection,
    expected: &str,
    accepts: fn(&GeometryType) -> bool,
) -> Result<()> {
    let types = collection.geometry_types();
    if types.iter().all(accepts) {
        return Ok(());
    }

    Err(PointselError::MixedGeometry {
        layer: collection.name.clone(),
        expected: expected.to_string(),
        found: types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", "),
    })
}
