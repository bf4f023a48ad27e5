//! Canonical geometry types shared by the readers and the spatial stages.
//!
//! These types mirror GeoJSON geometry objects so every reader can produce them
//! directly. The `pointsel-geo` crate converts them to `geo` types for computation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PointselError;

/// Coordinate reference system of a feature collection
///
/// `definition` is anything PROJ understands: `EPSG:nnnn` when an authority code is
/// known, the WKT text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: Option<u32>,
    pub definition: String,
}

impl Crs {
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: Some(code), definition: format!("EPSG:{}", code) }
    }

    /// Build a CRS from WKT, keeping the authority code when the WKT declares one
    pub fn from_wkt(wkt: &str) -> Self {
        let wkt = wkt.trim();
        match parse_epsg_from_wkt(wkt) {
            Some(code) => Self::from_epsg(code),
            None => Self { epsg: None, definition: wkt.to_string() },
        }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Two CRSs match when their EPSG codes agree, or failing that their definitions do
    pub fn matches(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => self.definition == other.definition,
        }
    }

    /// Short human-readable label
    pub fn label(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        // WKT: the outermost object's name is the first quoted string
        self.definition
            .split('"')
            .nth(1)
            .map(|name| name.to_string())
            .unwrap_or_else(|| self.definition.clone())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Parse the EPSG code of the outermost object from a WKT string
///
/// In WKT1 the outer AUTHORITY clause comes last, after any nested GEOGCS authority.
pub fn parse_epsg_from_wkt(wkt: &str) -> Option<u32> {
    if let Some(start) = wkt.rfind("AUTHORITY[\"EPSG\",") {
        let rest = &wkt[start + "AUTHORITY[\"EPSG\",".len()..];
        let digits: String = rest
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse::<u32>() {
            return Some(code);
        }
    }

    // Bare "EPSG:3857" style references
    if let Some(start) = wkt.find("EPSG:") {
        let digits: String = wkt[start + 5..]
            .chars()
            .skip_while(|c| *c == ':')
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(code) = digits.parse::<u32>() {
            return Some(code);
        }
    }

    None
}

/// Spatial predicate applied between each point and the query geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpatialPredicate {
    /// Point lies inside the geometry or on its boundary
    #[default]
    Within,
    /// Point touches the geometry at all
    Intersects,
}

impl SpatialPredicate {
    pub const SUPPORTED: [&'static str; 2] = ["within", "intersects"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialPredicate::Within => "within",
            SpatialPredicate::Intersects => "intersects",
        }
    }
}

impl fmt::Display for SpatialPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpatialPredicate {
    type Err = PointselError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "within" => Ok(SpatialPredicate::Within),
            "intersects" => Ok(SpatialPredicate::Intersects),
            _ => Err(PointselError::UnsupportedPredicate {
                predicate: s.to_string(),
                supported: Self::SUPPORTED.iter().map(|p| p.to_string()).collect(),
            }),
        }
    }
}

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryType {
    pub fn is_puntal(&self) -> bool {
        matches!(self, GeometryType::Point | GeometryType::MultiPoint)
    }

    pub fn is_polygonal(&self) -> bool {
        matches!(self, GeometryType::Polygon | GeometryType::MultiPolygon)
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// GeoJSON-compatible geometry representation
///
/// Coordinates are always 2D; readers drop Z and M values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: [x, y] }
    }

    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    pub fn multi_polygon(polygons: Vec<Vec<Vec<[f64; 2]>>>) -> Self {
        Geometry::MultiPolygon { coordinates: polygons }
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
        }
    }

    /// Return a new geometry with every coordinate passed through `f`
    pub fn try_map_coords<E, F>(&self, mut f: F) -> Result<Geometry, E>
    where
        F: FnMut([f64; 2]) -> Result<[f64; 2], E>,
    {
        fn ring<E>(
            coords: &[[f64; 2]],
            f: &mut impl FnMut([f64; 2]) -> Result<[f64; 2], E>,
        ) -> Result<Vec<[f64; 2]>, E> {
            coords.iter().map(|c| f(*c)).collect()
        }

        Ok(match self {
            Geometry::Point { coordinates } => Geometry::Point { coordinates: f(*coordinates)? },
            Geometry::LineString { coordinates } => {
                Geometry::LineString { coordinates: ring(coordinates, &mut f)? }
            }
            Geometry::MultiPoint { coordinates } => {
                Geometry::MultiPoint { coordinates: ring(coordinates, &mut f)? }
            }
            Geometry::Polygon { coordinates } => Geometry::Polygon {
                coordinates: coordinates
                    .iter()
                    .map(|r| ring(r, &mut f))
                    .collect::<Result<_, E>>()?,
            },
            Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
                coordinates: coordinates
                    .iter()
                    .map(|r| ring(r, &mut f))
                    .collect::<Result<_, E>>()?,
            },
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates
                    .iter()
                    .map(|poly| poly.iter().map(|r| ring(r, &mut f)).collect::<Result<_, E>>())
                    .collect::<Result<_, E>>()?,
            },
        })
    }
}
