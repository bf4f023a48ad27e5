//! pointsel geo - CRS alignment, polygon union and point selection
//!
//! Works on the canonical collections from `pointsel-core`, converting to `geo`
//! types for the actual computation.

pub mod models;
pub mod spatial;
pub mod transform;
pub mod union;
pub mod validation;

pub use spatial::{select_points, PointSelector};
pub use transform::{align_crs, reproject_geometry};
pub use union::build_union;
pub use validation::{ensure_points, ensure_polygons};
