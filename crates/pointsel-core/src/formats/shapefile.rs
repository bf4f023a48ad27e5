//! Shapefile format reader implementation
//!
//! Reads ESRI Shapefiles using pure Rust. A Shapefile is a set of sidecar files
//! (.shp, .shx, .dbf and the optional .prj) sharing one base name.

use shapefile::dbase::{FieldType, FieldValue as DbaseFieldValue};
use shapefile::{PolygonRing, Reader as ShapefileReader, Shape, ShapeReader};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use crate::error::{PointselError, Result};
use crate::formats::validation::{find_component_file, FormatValidator};
use crate::formats::{check_single_layer, FormatReader, FormatValidation};
use crate::models::{Crs, Feature, FeatureCollection, FeatureId, FormatMetadata, Geometry};

/// Size of the fixed .dbf header and of each field descriptor after it
const DBF_BLOCK: usize = 32;
/// Offset of the decimal count inside a field descriptor
const DBF_DECIMALS_OFFSET: usize = 17;

/// Shapefile format reader
pub struct ShapefileFormatReader;

/// Sidecar files of one Shapefile, resolved on disk
struct Components {
    shp: PathBuf,
    shx: PathBuf,
    dbf: PathBuf,
    prj: Option<PathBuf>,
}

/// Column names in header order, and the numeric columns declared with no decimals
struct DbfSchema {
    columns: Vec<String>,
    integer_columns: HashSet<String>,
}

impl FormatReader for ShapefileFormatReader {
    fn read(&self, path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
        let name = check_single_layer(path, layer)?;
        let components = self.resolve_components(path)?;

        let crs = self.extract_crs(path, components.prj.as_deref())?;
        let schema = read_dbf_schema(&components.dbf)?;

        let mut reader = open_reader(&components)?;
        let features = self.read_features(&mut reader, &schema.integer_columns)?;

        Ok(FeatureCollection {
            format_metadata: FormatMetadata::new("Shapefile")
                .with_layer(name.clone())
                .with_method("shapefile-rs"),
            name,
            schema: schema.columns,
            crs,
            features,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }

    fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = FormatValidator::validate_file_exists(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let base = match get_shapefile_base(path) {
            Ok(b) => b,
            Err(e) => {
                validation.errors.push(format!("Invalid Shapefile path: {}", e));
                return Ok(validation);
            }
        };

        let component_validation =
            FormatValidator::validate_component_files(&base, &["shp", "shx", "dbf"], &["prj"]);

        Ok(FormatValidator::merge_validations(vec![validation, component_validation]))
    }
}

impl ShapefileFormatReader {
    /// Find every sidecar, ignoring extension case; .shx and .dbf are required
    fn resolve_components(&self, path: &Path) -> Result<Components> {
        let base = get_shapefile_base(path)?;
        let shx = find_component_file(&base, "shx");
        let dbf = find_component_file(&base, "dbf");

        match (path.is_file(), shx, dbf) {
            (true, Some(shx), Some(dbf)) => Ok(Components {
                shp: path.to_path_buf(),
                shx,
                dbf,
                prj: find_component_file(&base, "prj"),
            }),
            (has_shp, shx, dbf) => {
                let missing: Vec<&str> = [(has_shp, ".shp"), (shx.is_some(), ".shx"), (dbf.is_some(), ".dbf")]
                    .iter()
                    .filter(|(found, _)| !found)
                    .map(|(_, ext)| *ext)
                    .collect();

                Err(PointselError::FormatError {
                    format: "Shapefile".to_string(),
                    message: format!("Missing required component files: {}", missing.join(", ")),
                })
            }
        }
    }

    /// Read the CRS from the .prj sidecar; no sidecar means no CRS
    fn extract_crs(&self, path: &Path, prj_path: Option<&Path>) -> Result<Option<Crs>> {
        let prj_path = match prj_path {
            Some(p) => p,
            None => {
                tracing::warn!("{} has no .prj file; its CRS is undefined", path.display());
                return Ok(None);
            }
        };

        let prj_content = fs::read_to_string(prj_path).map_err(|e| PointselError::FormatError {
            format: "Shapefile".to_string(),
            message: format!("Failed to read .prj file: {}", e),
        })?;

        if prj_content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Crs::from_wkt(&prj_content)))
    }

    fn read_features<T, D>(
        &self,
        reader: &mut ShapefileReader<T, D>,
        integer_columns: &HashSet<String>,
    ) -> Result<Vec<Feature>>
    where
        T: Read + Seek,
        D: Read + Seek,
    {
        let mut features = Vec::new();

        for result in reader.iter_shapes_and_records() {
            let (shape, record) = result.map_err(|e| shapefile_error("Failed to read feature", e))?;

            let geometry = convert_shape(&shape)?;
            let properties: HashMap<String, serde_json::Value> = record
                .into_iter()
                .map(|(name, value)| {
                    let json = if integer_columns.contains(&name) {
                        convert_integer_value(&value)
                    } else {
                        convert_dbase_value(&value)
                    };
                    (name, json)
                })
                .collect();

            features.push(Feature::new(FeatureId(features.len() as u64), geometry, properties));
        }

        Ok(features)
    }
}

/// Open the shape and attribute readers from the resolved sidecar paths
fn open_reader(components: &Components) -> Result<ShapefileReader<BufReader<File>, BufReader<File>>> {
    let open = |path: &Path| {
        File::open(path)
            .map(BufReader::new)
            .map_err(|e| shapefile_error(&format!("Failed to open {}", path.display()), e))
    };

    let shapes = ShapeReader::with_shx(open(&components.shp)?, open(&components.shx)?)
        .map_err(|e| shapefile_error("Failed to open Shapefile", e))?;
    let table = shapefile::dbase::Reader::new(open(&components.dbf)?)
        .map_err(|e| shapefile_error("Failed to read .dbf file", e))?;

    Ok(ShapefileReader::new(shapes, table))
}

/// Read column names and integer columns from the .dbf header.
///
/// The dbase crate keeps the decimal count private, so it is taken from the raw
/// field descriptors, which follow the 32-byte table header in field order.
fn read_dbf_schema(dbf_path: &Path) -> Result<DbfSchema> {
    let table = shapefile::dbase::Reader::from_path(dbf_path)
        .map_err(|e| shapefile_error("Failed to read .dbf header", e))?;
    let fields = table.fields();

    let header_len = DBF_BLOCK * (fields.len() + 1);
    let mut header = vec![0u8; header_len];
    File::open(dbf_path)
        .and_then(|mut file| file.read_exact(&mut header))
        .map_err(|e| shapefile_error("Failed to read .dbf header", e))?;

    let integer_columns = fields
        .iter()
        .enumerate()
        .filter(|(i, field)| {
            field.field_type() == FieldType::Numeric
                && header[DBF_BLOCK * (i + 1) + DBF_DECIMALS_OFFSET] == 0
        })
        .map(|(_, field)| field.name().to_string())
        .collect();

    Ok(DbfSchema {
        columns: fields.iter().map(|f| f.name().to_string()).collect(),
        integer_columns,
    })
}

fn shapefile_error(context: &str, err: impl std::fmt::Display) -> PointselError {
    PointselError::FormatError {
        format: "Shapefile".to_string(),
        message: format!("{}: {}", context, err),
    }
}

/// Base path of a Shapefile (without extension), used to find sidecar files
pub fn get_shapefile_base(path: &Path) -> Result<PathBuf> {
    let is_shp = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("shp"))
        .unwrap_or(false);

    if !is_shp {
        return Err(PointselError::InvalidPath {
            path: path.to_path_buf(),
            reason: "Not a Shapefile (.shp)".to_string(),
        });
    }

    Ok(path.with_extension(""))
}

/// Convert a shape to the canonical geometry; Z and M values are dropped
fn convert_shape(shape: &Shape) -> Result<Option<Geometry>> {
    Ok(Some(match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Geometry::point(p.x, p.y),
        Shape::PointM(p) => Geometry::point(p.x, p.y),
        Shape::PointZ(p) => Geometry::point(p.x, p.y),
        Shape::Multipoint(mp) => Geometry::MultiPoint {
            coordinates: mp.points().iter().map(|p| [p.x, p.y]).collect(),
        },
        Shape::MultipointM(mp) => Geometry::MultiPoint {
            coordinates: mp.points().iter().map(|p| [p.x, p.y]).collect(),
        },
        Shape::MultipointZ(mp) => Geometry::MultiPoint {
            coordinates: mp.points().iter().map(|p| [p.x, p.y]).collect(),
        },
        Shape::Polyline(line) => line_geometry(line.parts(), |p| [p.x, p.y]),
        Shape::PolylineM(line) => line_geometry(line.parts(), |p| [p.x, p.y]),
        Shape::PolylineZ(line) => line_geometry(line.parts(), |p| [p.x, p.y]),
        Shape::Polygon(polygon) => polygon_geometry(polygon.rings(), |p| [p.x, p.y]),
        Shape::PolygonM(polygon) => polygon_geometry(polygon.rings(), |p| [p.x, p.y]),
        Shape::PolygonZ(polygon) => polygon_geometry(polygon.rings(), |p| [p.x, p.y]),
        Shape::Multipatch(_) => {
            return Err(PointselError::FormatError {
                format: "Shapefile".to_string(),
                message: "Multipatch geometry type is not supported".to_string(),
            })
        }
    }))
}

fn line_geometry<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> [f64; 2]) -> Geometry {
    let mut lines: Vec<Vec<[f64; 2]>> = parts.iter().map(|part| part.iter().map(&xy).collect()).collect();
    if lines.len() == 1 {
        Geometry::LineString { coordinates: lines.remove(0) }
    } else {
        Geometry::MultiLineString { coordinates: lines }
    }
}

/// Group rings into polygons: every outer ring opens a polygon, an inner ring becomes
/// a hole of the latest polygon whose shell contains it, or a polygon of its own
/// when no shell does (writers that emit counter-clockwise shells)
fn polygon_geometry<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> [f64; 2]) -> Geometry {
    let mut polygons: Vec<Vec<Vec<[f64; 2]>>> = Vec::new();

    for ring in rings {
        let coords: Vec<[f64; 2]> = ring.points().iter().map(&xy).collect();
        match ring {
            PolygonRing::Outer(_) => polygons.push(vec![coords]),
            PolygonRing::Inner(_) => {
                let first = coords.first().copied();
                let shell = first.and_then(|point| {
                    polygons
                        .iter_mut()
                        .rev()
                        .find(|polygon| ring_contains(&polygon[0], point))
                });
                match shell {
                    Some(polygon) => polygon.push(coords),
                    None => polygons.push(vec![coords]),
                }
            }
        }
    }

    if polygons.len() == 1 {
        Geometry::polygon(polygons.remove(0))
    } else {
        Geometry::multi_polygon(polygons)
    }
}

/// Even-odd ray cast of `point` against a closed ring
fn ring_contains(ring: &[[f64; 2]], point: [f64; 2]) -> bool {
    let [x, y] = point;
    let mut inside = false;

    for edge in ring.windows(2) {
        let ([x1, y1], [x2, y2]) = (edge[0], edge[1]);
        if (y1 > y) != (y2 > y) && x < (x2 - x1) * (y - y1) / (y2 - y1) + x1 {
            inside = !inside;
        }
    }

    inside
}

/// Numeric values of a column declared with no decimals stay integers, so a code
/// stored as N(10,0) reads as `42` rather than `42.0`
fn convert_integer_value(value: &DbaseFieldValue) -> serde_json::Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    match value {
        DbaseFieldValue::Numeric(Some(n)) if n.fract() == 0.0 && n.abs() <= MAX_EXACT => {
            serde_json::Value::from(*n as i64)
        }
        other => convert_dbase_value(other),
    }
}

/// Convert dBase field value to JSON value
fn convert_dbase_value(value: &DbaseFieldValue) -> serde_json::Value {
    fn number(n: f64) -> serde_json::Value {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }

    match value {
        DbaseFieldValue::Character(Some(s)) => serde_json::Value::String(s.trim_end().to_string()),
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Logical(Some(b)) => serde_json::Value::Bool(*b),
        DbaseFieldValue::Date(Some(date)) => serde_json::Value::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Integer(i) => serde_json::Value::Number((*i).into()),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::DateTime(dt) => serde_json::Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Memo(s) => serde_json::Value::String(s.clone()),
        DbaseFieldValue::Character(None)
        | DbaseFieldValue::Numeric(None)
        | DbaseFieldValue::Logical(None)
        | DbaseFieldValue::Date(None)
        | DbaseFieldValue::Float(None) => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::dbase::{FieldName, Record, TableWriterBuilder};

    const WGS84_PRJ: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

    fn write_points(dir: &Path, with_prj: bool) -> PathBuf {
        let path = dir.join("wells.shp");
        let table = TableWriterBuilder::new()
            .add_character_field(FieldName::try_from("WELL_ID").unwrap(), 10)
            .add_numeric_field(FieldName::try_from("DEPTH").unwrap(), 10, 2);
        let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

        for (i, (x, y)) in [(1.0, 1.0), (2.0, 2.0)].iter().enumerate() {
            let mut record = Record::default();
            record.insert("WELL_ID".to_string(), DbaseFieldValue::Character(Some(format!("W{}", i))));
            record.insert("DEPTH".to_string(), DbaseFieldValue::Numeric(Some(12.5)));
            writer.write_shape_and_record(&shapefile::Point::new(*x, *y), &record).unwrap();
        }
        drop(writer);

        if with_prj {
            fs::write(dir.join("wells.prj"), WGS84_PRJ).unwrap();
        }
        path
    }

    #[test]
    fn test_supported_extensions() {
        assert_eq!(ShapefileFormatReader.supported_extensions(), &["shp"]);
        assert_eq!(ShapefileFormatReader.format_name(), "Shapefile");
    }

    #[test]
    fn test_read_points_with_prj() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write_points(temp_dir.path(), true);

        let result = ShapefileFormatReader.read(&path, None).unwrap();

        assert_eq!(result.name, "wells");
        assert_eq!(result.crs, Some(Crs::wgs84()));
        assert_eq!(result.schema, vec!["WELL_ID", "DEPTH"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.features[1].geometry.as_deref(), Some(&Geometry::point(2.0, 2.0)));
        assert_eq!(result.features[0].property("WELL_ID"), &serde_json::json!("W0"));
    }

    #[test]
    fn test_missing_prj_means_undefined_crs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write_points(temp_dir.path(), false);

        let result = ShapefileFormatReader.read(&path, None).unwrap();
        assert_eq!(result.crs, None);
    }

    #[test]
    fn test_missing_components() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write_points(temp_dir.path(), true);
        fs::remove_file(temp_dir.path().join("wells.shx")).unwrap();

        let err = ShapefileFormatReader.read(&path, None).unwrap_err();
        assert!(err.to_string().contains(".shx"));

        let validation = ShapefileFormatReader.validate(&path).unwrap();
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_validation_missing_file() {
        let validation = ShapefileFormatReader.validate(Path::new("/nonexistent/test.shp")).unwrap();
        assert!(!validation.is_valid());
    }

    #[test]
    fn test_polygon_rings_grouping() {
        let outer_a = PolygonRing::Outer(vec![
            shapefile::Point::new(0.0, 0.0),
            shapefile::Point::new(0.0, 4.0),
            shapefile::Point::new(4.0, 4.0),
            shapefile::Point::new(0.0, 0.0),
        ]);
        let hole = PolygonRing::Inner(vec![
            shapefile::Point::new(1.0, 2.0),
            shapefile::Point::new(1.0, 3.0),
            shapefile::Point::new(2.0, 3.0),
            shapefile::Point::new(1.0, 2.0),
        ]);
        let outer_b = PolygonRing::Outer(vec![
            shapefile::Point::new(10.0, 0.0),
            shapefile::Point::new(10.0, 4.0),
            shapefile::Point::new(14.0, 4.0),
            shapefile::Point::new(10.0, 0.0),
        ]);

        let geometry = polygon_geometry(&[outer_a, hole, outer_b], |p| [p.x, p.y]);
        match geometry {
            Geometry::MultiPolygon { coordinates } => {
                assert_eq!(coordinates.len(), 2);
                assert_eq!(coordinates[0].len(), 2, "hole belongs to the first polygon");
                assert_eq!(coordinates[1].len(), 1);
            }
            other => panic!("expected MultiPolygon, got {:?}", other),
        }
    }

    fn square(x: f64, y: f64) -> Vec<shapefile::Point> {
        vec![
            shapefile::Point::new(x, y),
            shapefile::Point::new(x + 1.0, y),
            shapefile::Point::new(x + 1.0, y + 1.0),
            shapefile::Point::new(x, y + 1.0),
            shapefile::Point::new(x, y),
        ]
    }

    #[test]
    fn test_inner_rings_outside_any_shell_are_separate_polygons() {
        let rings = [PolygonRing::Inner(square(0.0, 0.0)), PolygonRing::Inner(square(10.0, 0.0))];

        match polygon_geometry(&rings, |p| [p.x, p.y]) {
            Geometry::MultiPolygon { coordinates } => {
                assert_eq!(coordinates.len(), 2);
                assert!(coordinates.iter().all(|polygon| polygon.len() == 1));
            }
            other => panic!("expected MultiPolygon, got {:?}", other),
        }
    }

    #[test]
    fn test_ring_contains() {
        let ring: Vec<[f64; 2]> = square(0.0, 0.0).iter().map(|p| [p.x, p.y]).collect();
        assert!(ring_contains(&ring, [0.5, 0.5]));
        assert!(!ring_contains(&ring, [1.5, 0.5]));
    }

    #[test]
    fn test_zero_decimal_numeric_reads_as_integer() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("districts.shp");
        let table = TableWriterBuilder::new()
            .add_numeric_field(FieldName::try_from("CODE").unwrap(), 10, 0)
            .add_numeric_field(FieldName::try_from("AREA").unwrap(), 10, 2);
        let mut writer = shapefile::Writer::from_path(&path, table).unwrap();

        let mut record = Record::default();
        record.insert("CODE".to_string(), DbaseFieldValue::Numeric(Some(42.0)));
        record.insert("AREA".to_string(), DbaseFieldValue::Numeric(Some(3.0)));
        writer
            .write_shape_and_record(&shapefile::Polygon::new(PolygonRing::Outer(square(0.0, 0.0))), &record)
            .unwrap();
        drop(writer);

        let result = ShapefileFormatReader.read(&path, None).unwrap();

        assert_eq!(result.features[0].property("CODE"), &serde_json::json!(42));
        assert_eq!(result.features[0].property("AREA"), &serde_json::json!(3.0));
    }

    #[test]
    fn test_integer_value_conversion() {
        assert_eq!(convert_integer_value(&DbaseFieldValue::Numeric(Some(-7.0))), serde_json::json!(-7));
        assert_eq!(convert_integer_value(&DbaseFieldValue::Numeric(Some(1.5))), serde_json::json!(1.5));
        assert_eq!(convert_integer_value(&DbaseFieldValue::Numeric(None)), serde_json::Value::Null);
    }

    #[test]
    fn test_uppercase_sidecars() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_points(temp_dir.path(), true);
        for ext in ["shp", "shx", "dbf", "prj"] {
            fs::rename(
                temp_dir.path().join(format!("wells.{}", ext)),
                temp_dir.path().join(format!("WELLS.{}", ext.to_uppercase())),
            )
            .unwrap();
        }
        let path = temp_dir.path().join("WELLS.SHP");

        let result = ShapefileFormatReader.read(&path, None).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.crs, Some(Crs::wgs84()));
        assert!(ShapefileFormatReader.validate(&path).unwrap().is_valid());
    }

    #[test]
    fn test_get_shapefile_base() {
        let base = get_shapefile_base(Path::new("/data/districts.shp")).unwrap();
        assert_eq!(base, PathBuf::from("/data/districts"));
        assert!(get_shapefile_base(Path::new("/data/districts.gpkg")).is_err());
    }
}
