//! Point-in-polygon selection against the union geometry

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BoundingRect, Intersects, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};

use crate::models::{FeatureCollection, Geometry, GeometryExt, SpatialPredicate};

/// One part of the query geometry, indexed by its bounding box
struct IndexedPart {
    polygon: Polygon,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPart {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedPart {
    fn new(polygon: Polygon) -> Option<Self> {
        let rect = polygon.bounding_rect()?;
        Some(Self {
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
            polygon,
        })
    }

    fn satisfies(&self, point: &Point, predicate: SpatialPredicate) -> bool {
        match predicate {
            // Boundary counts as inside
            SpatialPredicate::Within => self.polygon.coordinate_position(&point.0) != CoordPos::Outside,
            SpatialPredicate::Intersects => self.polygon.intersects(point),
        }
    }
}

/// Tests points against a query geometry with one predicate
pub struct PointSelector {
    tree: RTree<IndexedPart>,
    predicate: SpatialPredicate,
}

impl PointSelector {
    pub fn new(query: &geo::MultiPolygon, predicate: SpatialPredicate) -> Self {
        let parts: Vec<IndexedPart> = query.iter().cloned().filter_map(IndexedPart::new).collect();
        Self { tree: RTree::bulk_load(parts), predicate }
    }

    pub fn predicate(&self) -> SpatialPredicate {
        self.predicate
    }

    /// Whether a single point satisfies the predicate
    pub fn matches_point(&self, point: &Point) -> bool {
        let envelope = AABB::from_point([point.x(), point.y()]);

        // R-tree narrows to parts whose bounding box holds the point; the exact test decides
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .any(|part| part.satisfies(point, self.predicate))
    }

    /// Whether a puntal geometry satisfies the predicate
    ///
    /// A multipoint is within when all its points are, and intersects when any is.
    pub fn matches(&self, geometry: &Geometry) -> bool {
        let points = geometry.points();
        if points.is_empty() {
            return false;
        }

        match self.predicate {
            SpatialPredicate::Within => points.iter().all(|p| self.matches_point(p)),
            SpatialPredicate::Intersects => points.iter().any(|p| self.matches_point(p)),
        }
    }

    /// Keep the features whose geometry satisfies the predicate
    ///
    /// Features without geometry never match. Zero matches is a valid result.
    pub fn select(&self, points: &FeatureCollection) -> FeatureCollection {
        let selected = points.retain(|feature| {
            feature
                .geometry
                .as_deref()
                .map(|geometry| self.matches(geometry))
                .unwrap_or(false)
        });

        tracing::info!(
            "{} of {} points satisfy '{}'",
            selected.len(),
            points.len(),
            self.predicate
        );
        selected
    }
}

/// Select the points satisfying `predicate` against `query`
pub fn select_points(
    points: &FeatureCollection,
    query: &geo::MultiPolygon,
    predicate: SpatialPredicate,
) -> FeatureCollection {
    PointSelector::new(query, predicate).select(points)
}
