//! Conversions between the canonical geometry and `geo` types.

use geo::Geometry as GeoGeometry;

pub use pointsel_core::models::{Crs, Feature, FeatureCollection, Geometry, GeometryType, SpatialPredicate};

fn to_coord(c: &[f64; 2]) -> geo::Coord {
    geo::Coord { x: c[0], y: c[1] }
}

fn to_line(coords: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(coords.iter().map(to_coord).collect())
}

/// First ring is the exterior, the rest are holes
fn to_polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => {
            geo::Polygon::new(to_line(exterior), interiors.iter().map(|r| to_line(r)).collect())
        }
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => GeoGeometry::Point(geo::Point::from(to_coord(coordinates))),
        Geometry::LineString { coordinates } => GeoGeometry::LineString(to_line(coordinates)),
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(to_polygon(coordinates)),
        Geometry::MultiPoint { coordinates } => GeoGeometry::MultiPoint(geo::MultiPoint::new(
            coordinates.iter().map(|c| geo::Point::from(to_coord(c))).collect(),
        )),
        Geometry::MultiLineString { coordinates } => GeoGeometry::MultiLineString(
            geo::MultiLineString::new(coordinates.iter().map(|l| to_line(l)).collect()),
        ),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(to_multi_polygon(coordinates)),
    }
}

fn to_multi_polygon(polygons: &[Vec<Vec<[f64; 2]>>]) -> geo::MultiPolygon {
    geo::MultiPolygon::new(polygons.iter().map(|p| to_polygon(p)).collect())
}

/// Polygonal geometry as a MultiPolygon; other types yield None
pub fn to_geo_multi_polygon(geom: &Geometry) -> Option<geo::MultiPolygon> {
    match geom {
        Geometry::Polygon { coordinates } => Some(geo::MultiPolygon::new(vec![to_polygon(coordinates)])),
        Geometry::MultiPolygon { coordinates } => Some(to_multi_polygon(coordinates)),
        _ => None,
    }
}

/// Extension trait for Geometry with geo-crate operations
pub trait GeometryExt {
    /// Convert to geo::Geometry
    fn to_geo(&self) -> GeoGeometry;

    /// Points making up a puntal geometry; empty for other types
    fn points(&self) -> Vec<geo::Point>;
}

impl GeometryExt for Geometry {
    fn to_geo(&self) -> GeoGeometry {
        to_geo_geometry(self)
    }

    fn points(&self) -> Vec<geo::Point> {
        match self {
            Geometry::Point { coordinates } => vec![geo::Point::from(to_coord(coordinates))],
            Geometry::MultiPoint { coordinates } => {
                coordinates.iter().map(|c| geo::Point::from(to_coord(c))).collect()
            }
            _ => Vec::new(),
        }
    }
}
