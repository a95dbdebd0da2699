//! Per-evaluation inputs shared by every constraint

use super::config::PlacementConfig;
use super::spatial::SpatialIndex;
use super::types::{NearbyObject, SnapPoint, TargetObjectDescriptor};

/// Everything a constraint may read while scoring or correcting a transform.
///
/// Built once per evaluation call and never mutated by constraints.
#[derive(Clone, Copy)]
pub struct PlacementContext<'a> {
    pub spatial_index: &'a dyn SpatialIndex,
    pub target: &'a TargetObjectDescriptor,
    /// Objects around the candidate, gathered once per evaluation. The
    /// built-in constraints query `spatial_index` instead; this list serves
    /// custom constraints.
    pub nearby_objects: &'a [NearbyObject],
    pub snap_points: &'a [SnapPoint],
    pub grid_size: f64,
    pub snap_tolerance: f64,
}

impl<'a> PlacementContext<'a> {
    /// Context with default grid size and tolerance and no nearby objects or
    /// snap points
    pub fn new(spatial_index: &'a dyn SpatialIndex, target: &'a TargetObjectDescriptor) -> Self {
        let defaults = PlacementConfig::default();
        Self {
            spatial_index,
            target,
            nearby_objects: &[],
            snap_points: &[],
            grid_size: defaults.grid_size,
            snap_tolerance: defaults.snap_tolerance,
        }
    }

    /// Take grid size and snap tolerance from `config`
    pub fn with_config(mut self, config: &PlacementConfig) -> Self {
        self.grid_size = config.grid_size;
        self.snap_tolerance = config.snap_tolerance;
        self
    }

    pub fn with_nearby_objects(mut self, objects: &'a [NearbyObject]) -> Self {
        self.nearby_objects = objects;
        self
    }

    pub fn with_snap_points(mut self, points: &'a [SnapPoint]) -> Self {
        self.snap_points = points;
        self
    }

    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance;
        self
    }
}

impl std::fmt::Debug for PlacementContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementContext")
            .field("target", &self.target.id)
            .field("nearby_objects", &self.nearby_objects.len())
            .field("snap_points", &self.snap_points.len())
            .field("grid_size", &self.grid_size)
            .field("snap_tolerance", &self.snap_tolerance)
            .finish()
    }
}
