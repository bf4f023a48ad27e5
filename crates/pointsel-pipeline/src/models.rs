use pointsel_core::models::{DatasetRef, FeatureCollection, SelectionQuery, SpatialPredicate};
use serde::{Deserialize, Serialize};

/// Everything one selection run needs
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub points: DatasetRef,
    pub polygons: DatasetRef,
    pub query: SelectionQuery,
}

impl SelectionRequest {
    pub fn new(points: DatasetRef, polygons: DatasetRef, query: SelectionQuery) -> Self {
        Self { points, polygons, query }
    }
}

/// How one input layer was read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub name: String,
    pub format: String,

    /// Reader or archive strategy that produced the layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    pub feature_count: usize,
    pub crs: String,
}

impl LayerSummary {
    pub fn of(collection: &FeatureCollection) -> Self {
        Self {
            name: collection.name.clone(),
            format: collection.format_metadata.format_name.clone(),
            method: collection.format_metadata.extraction_method.clone(),
            feature_count: collection.len(),
            crs: collection
                .crs
                .as_ref()
                .map(|c| c.label())
                .unwrap_or_else(|| "undefined".to_string()),
        }
    }
}

/// Per-stage counts of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub points: LayerSummary,
    pub polygons: LayerSummary,

    /// Whether the points had to be reprojected into the polygons' CRS
    pub reprojected: bool,

    pub polygons_matched: usize,

    /// Parts of the union geometry
    pub union_parts: usize,
}

/// Outcome of a selection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Delimited text, header first
    #[serde(skip)]
    pub csv: Vec<u8>,

    pub row_count: usize,
    pub points_read: usize,
    pub polygons_read: usize,
    pub polygons_matched: usize,
    pub predicate: SpatialPredicate,
    pub stages: StageSummary,
}

impl SelectionReport {
    /// The exported table as text
    pub fn csv_text(&self) -> String {
        String::from_utf8_lossy(&self.csv).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}
