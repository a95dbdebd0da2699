//! Grid alignment (soft)
//!
//! Vertically the grid applies to the face the object rests on, not to its
//! center, so an object seated on a surface at grid height stays seated
//! whatever its own height.

use crate::placement::context::PlacementContext;
use crate::placement::types::{snap_to_grid, PlacementTransform, ValidationResult, Vec3};

use super::{Constraint, ConstraintKind};

/// Positions closer than this to a grid point count as aligned
const ALIGNED_DISTANCE: f64 = 0.1;

/// Score lost per foot of distance from the nearest grid point
const PENALTY_PER_UNIT: f64 = 10.0;

/// Point of the object that is aligned to the grid
fn grid_anchor(transform: &PlacementTransform, context: &PlacementContext<'_>) -> Vec3 {
    transform.position + Vec3::new(0.0, context.target.resting_offset(), 0.0)
}

/// Prefers positions on the placement grid. Never invalidates a placement.
#[derive(Debug, Clone)]
pub struct GridSnapConstraint {
    priority: i32,
}

impl GridSnapConstraint {
    pub const DEFAULT_PRIORITY: i32 = 100;

    pub fn new() -> Self {
        Self {
            priority: Self::DEFAULT_PRIORITY,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for GridSnapConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl Constraint for GridSnapConstraint {
    fn id(&self) -> &str {
        "grid-snap"
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Grid
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn description(&self) -> &str {
        "Align the object to the placement grid"
    }

    fn validate(
        &self,
        transform: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> ValidationResult {
        let anchor = grid_anchor(transform, context);
        let nearest = snap_to_grid(anchor, context.grid_size);
        let distance = (anchor - nearest).norm();

        if distance < ALIGNED_DISTANCE {
            return ValidationResult::pass();
        }

        let score = (100.0 - PENALTY_PER_UNIT * distance).max(0.0);
        let center = nearest - Vec3::new(0.0, context.target.resting_offset(), 0.0);
        ValidationResult::new(true, score).with_suggestion(format!(
            "Snap to grid at ({}, {}, {})",
            center.x, center.y, center.z
        ))
    }

    fn solve(
        &self,
        transform: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> PlacementTransform {
        let offset = Vec3::new(0.0, context.target.resting_offset(), 0.0);
        let snapped = snap_to_grid(grid_anchor(transform, context), context.grid_size);
        transform.with_position(snapped - offset)
    }
}
