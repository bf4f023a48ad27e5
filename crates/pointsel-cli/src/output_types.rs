use pointsel_pipeline::{SelectionReport, StageSummary};
use serde::Serialize;
use std::collections::BTreeMap;

/// Output for extract command
#[derive(Debug, Serialize)]
pub struct ExtractOutput {
    /// Destination file; None when the table went to stdout
    pub output: Option<String>,
    pub row_count: usize,
    pub points_read: usize,
    pub polygons_read: usize,
    pub polygons_matched: usize,
    pub predicate: String,
    pub stages: StageSummary,

    /// The table itself, when no output file was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

impl ExtractOutput {
    pub fn from_report(report: &SelectionReport, output: Option<String>) -> Self {
        let csv = match output {
            Some(_) => None,
            None => Some(report.csv_text()),
        };
        Self {
            output,
            row_count: report.row_count,
            points_read: report.points_read,
            polygons_read: report.polygons_read,
            polygons_matched: report.polygons_matched,
            predicate: report.predicate.to_string(),
            stages: report.stages.clone(),
            csv,
        }
    }
}

/// Output for inspect command
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub path: String,
    pub format: String,
    pub layers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveInfo>,
    pub layer: LayerInfo,
    pub warnings: Vec<String>,
}

/// Archive layout of a zipped dataset
#[derive(Debug, Serialize)]
pub struct ArchiveInfo {
    pub entries: Vec<String>,
    pub shp: usize,
    pub shx: usize,
    pub dbf: usize,
    pub prj: usize,
    pub nested: bool,
    pub missing: Vec<String>,
}

/// Contents of the layer that was read
#[derive(Debug, Serialize)]
pub struct LayerInfo {
    pub name: String,
    pub method: Option<String>,
    pub feature_count: usize,
    pub geometry_types: Vec<String>,
    pub crs: Option<String>,
    pub columns: Vec<String>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: BTreeMap<String, ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}
