//! Spatial queries consumed by the constraints
//!
//! The engine only reads from the index. Implementors answer two questions:
//! which placed objects intersect a box, and which objects overlap a region
//! (with their tags, for surface and clearance reasoning).

use super::types::{BoundingBox, NearbyObject};

/// A placed object whose bounds intersect a queried box
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub id: String,
    pub bounds: BoundingBox,
}

/// Read-only bounding-box queries over placed objects
pub trait SpatialIndex {
    /// All objects other than `exclude_id` whose bounds intersect `bounds`
    fn check_collisions(&self, bounds: &BoundingBox, exclude_id: Option<&str>) -> Vec<Collision>;

    /// All objects overlapping `bounds`, with their type and category tags
    fn query_bounds(&self, bounds: &BoundingBox) -> Vec<NearbyObject>;
}

/// Linear scan over a list of objects
impl SpatialIndex for [NearbyObject] {
    fn check_collisions(&self, bounds: &BoundingBox, exclude_id: Option<&str>) -> Vec<Collision> {
        self.iter()
            .filter(|o| Some(o.id.as_str()) != exclude_id)
            .filter(|o| o.bounds.intersects(bounds))
            .map(|o| Collision {
                id: o.id.clone(),
                bounds: o.bounds,
            })
            .collect()
    }

    fn query_bounds(&self, bounds: &BoundingBox) -> Vec<NearbyObject> {
        self.iter()
            .filter(|o| o.bounds.intersects(bounds))
            .cloned()
            .collect()
    }
}

impl SpatialIndex for Vec<NearbyObject> {
    fn check_collisions(&self, bounds: &BoundingBox, exclude_id: Option<&str>) -> Vec<Collision> {
        self.as_slice().check_collisions(bounds, exclude_id)
    }

    fn query_bounds(&self, bounds: &BoundingBox) -> Vec<NearbyObject> {
        self.as_slice().query_bounds(bounds)
    }
}
