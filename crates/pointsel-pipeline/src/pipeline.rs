use pointsel_core::config::PipelineConfig;
use pointsel_core::error::Result;
use pointsel_core::matcher::match_by_name;
use pointsel_core::models::FeatureCollection;
use pointsel_core::{LayerReader, TabularExporter};
use pointsel_geo::spatial::PointSelector;
use pointsel_geo::transform::align_crs;
use pointsel_geo::union::build_union;
use pointsel_geo::validation::{ensure_points, ensure_polygons};

use crate::models::{LayerSummary, SelectionReport, SelectionRequest, StageSummary};

/// Selection pipeline: read, align, match, union, select, export
pub struct SelectionPipeline {
    reader: LayerReader,
    exporter: TabularExporter,
}

impl SelectionPipeline {
    /// Create a new selection pipeline
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            reader: LayerReader::new(config),
            exporter: TabularExporter::new(config.delimiter),
        }
    }

    /// Run every stage and export the selected points
    ///
    /// `NoMatch` stops the run; an empty point selection yields a header-only table.
    pub fn run(&self, request: &SelectionRequest) -> Result<SelectionReport> {
        let (selected, stages) = self.select(request)?;

        let csv = self.exporter.export(&selected)?;
        tracing::info!("Exported {} rows", selected.len());

        Ok(SelectionReport {
            csv,
            row_count: selected.len(),
            points_read: stages.points.feature_count,
            polygons_read: stages.polygons.feature_count,
            polygons_matched: stages.polygons_matched,
            predicate: request.query.predicate,
            stages,
        })
    }

    /// Run every stage up to, but not including, export
    pub fn select(&self, request: &SelectionRequest) -> Result<(FeatureCollection, StageSummary)> {
        // Phase 1: read both layers
        tracing::info!("Reading layers...");
        let points = self.reader.read(&request.points)?;
        let polygons = self.reader.read(&request.polygons)?;

        ensure_points(&points)?;
        ensure_polygons(&polygons)?;

        // Phase 2: CRS alignment
        let aligned = align_crs(&points, &polygons)?;
        let reprojected = match (&points.crs, &polygons.crs) {
            (Some(from), Some(to)) => !from.matches(to),
            _ => false,
        };

        // Phase 3: attribute match and union
        tracing::info!(
            "Filtering polygons where {} = '{}'",
            request.query.name_column,
            request.query.name_value
        );
        let matched = match_by_name(&polygons, &request.query)?;
        let union = build_union(&matched)?;

        // Phase 4: spatial selection
        let selected = PointSelector::new(&union, request.query.predicate).select(&aligned);

        let stages = StageSummary {
            points: LayerSummary::of(&points),
            polygons: LayerSummary::of(&polygons),
            reprojected,
            polygons_matched: matched.len(),
            union_parts: union.0.len(),
        };

        Ok((selected, stages))
    }
}

impl Default for SelectionPipeline {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointsel_core::error::PointselError;
    use pointsel_core::models::{DatasetRef, SelectionQuery};
    use std::fs;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const DISTRICT: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"NAME": "Bankura"},
         "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]}}
    ]}"#;

    #[test]
    fn test_run_reports_counts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let points = write(
            &temp_dir,
            "wells.geojson",
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"ID": "a"}, "geometry": {"type": "Point", "coordinates": [5, 5]}},
                {"type": "Feature", "properties": {"ID": "b"}, "geometry": {"type": "Point", "coordinates": [50, 5]}}
            ]}"#,
        );
        let polygons = write(&temp_dir, "districts.geojson", DISTRICT);

        let request = SelectionRequest::new(
            DatasetRef::new(points),
            DatasetRef::new(polygons),
            SelectionQuery::parse("NAME", "bankura", false, "within").unwrap(),
        );

        let report = SelectionPipeline::default().run(&request).unwrap();
        assert_eq!(report.row_count, 1);
        assert_eq!(report.points_read, 2);
        assert_eq!(report.polygons_matched, 1);
        assert!(!report.stages.reprojected);
        assert_eq!(report.csv_text(), "ID\na\n");
    }

    #[test]
    fn test_polygon_layer_of_points_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let points = write(&temp_dir, "districts_a.geojson", DISTRICT);
        let polygons = write(&temp_dir, "districts_b.geojson", DISTRICT);

        let request = SelectionRequest::new(
            DatasetRef::new(points),
            DatasetRef::new(polygons),
            SelectionQuery::parse("NAME", "Bankura", false, "within").unwrap(),
        );

        assert!(matches!(
            SelectionPipeline::default().run(&request),
            Err(PointselError::MixedGeometry { .. })
        ));
    }
}
