pub mod feature;
pub mod geometry;
pub mod query;

pub use feature::{schema_from_features, Feature, FeatureCollection, FeatureId, FormatMetadata};
pub use geometry::{parse_epsg_from_wkt, Crs, Geometry, GeometryType, SpatialPredicate};
pub use query::{DatasetRef, DatasetSource, SelectionQuery};
