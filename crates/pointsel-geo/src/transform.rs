//! CRS alignment between the point and polygon layers

use std::sync::Arc;

use crate::models::{Crs, FeatureCollection, Geometry};
use pointsel_core::error::{LayerRole, PointselError, Result};
use proj::Proj;

/// Bring the points into the polygons' CRS
///
/// Both layers must declare a CRS. Polygons are never reprojected; when the two
/// already match the points come back unchanged.
pub fn align_crs(points: &FeatureCollection, polygons: &FeatureCollection) -> Result<FeatureCollection> {
    let (from, to) = match (&points.crs, &polygons.crs) {
        (Some(from), Some(to)) => (from, to),
        (None, Some(_)) => return Err(PointselError::MissingCrs { role: LayerRole::Points }),
        (Some(_), None) => return Err(PointselError::MissingCrs { role: LayerRole::Polygons }),
        (None, None) => return Err(PointselError::MissingCrs { role: LayerRole::Both }),
    };

    if from.matches(to) {
        tracing::debug!("Layers already share {}", to);
        return Ok(points.clone());
    }

    tracing::info!("Reprojecting {} points from {} to {}", points.len(), from, to);

    let proj = build_proj(from, to)?;
    let geometries = points
        .features
        .iter()
        .map(|feature| match &feature.geometry {
            Some(geometry) => transform(&proj, geometry, from, to).map(|g| Some(Arc::new(g))),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(points.with_geometries(geometries, to.clone()))
}

/// Reproject a single geometry from one CRS to another
pub fn reproject_geometry(geometry: &Geometry, from_crs: &Crs, to_crs: &Crs) -> Result<Geometry> {
    if from_crs.matches(to_crs) {
        return Ok(geometry.clone());
    }

    let proj = build_proj(from_crs, to_crs)?;
    transform(&proj, geometry, from_crs, to_crs)
}

fn build_proj(from: &Crs, to: &Crs) -> Result<Proj> {
    Proj::new_known_crs(&from.definition, &to.definition, None).map_err(|e| PointselError::Reprojection {
        from: from.label(),
        to: to.label(),
        reason: format!("Failed to create projection: {}", e),
    })
}

fn transform(proj: &Proj, geometry: &Geometry, from: &Crs, to: &Crs) -> Result<Geometry> {
    geometry.try_map_coords(|[x, y]| {
        proj.convert((x, y))
            .map(|(x, y)| [x, y])
            .map_err(|e| PointselError::Reprojection {
                from: from.label(),
                to: to.label(),
                reason: format!("Projection failed: {}", e),
            })
    })
}
