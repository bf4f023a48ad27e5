//! pointsel pipeline - the end-to-end selection use case
//!
//! Reads both layers, aligns their CRS, narrows the polygons by name, unions
//! them and exports the points that fall inside.

pub mod models;
pub mod pipeline;

pub use models::{SelectionReport, SelectionRequest, StageSummary};
pub use pipeline::SelectionPipeline;
