//! pointsel core - data model, configuration, format readers and attribute stages
//!
//! Everything here is free of spatial computation: reading datasets into
//! [`models::FeatureCollection`]s, filtering polygons by name and exporting
//! attribute tables. Geometry work lives in `pointsel-geo`.

pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod matcher;
pub mod models;
pub mod reader;

pub use config::{LayeredConfig, PipelineConfig};
pub use error::{LayerRole, PointselError, Result, StrategyFailure};
pub use export::TabularExporter;
pub use matcher::{match_by_name, NameMatcher};
pub use reader::LayerReader;
