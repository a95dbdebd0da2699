//! Collision avoidance (critical)
//!
//! Validation asks the spatial index for anything intersecting the object's
//! box. Solving walks a deterministic golden-angle spiral outward from the
//! original position and takes the first collision-free sample:
//!
//! ```text
//! angle_i  = i * 0.6180339887 * 2π
//! radius_i = ceil(i / 8) * grid_size
//! offset_i = (cos(angle_i) * radius_i, 0, sin(angle_i) * radius_i)
//! ```
//!
//! Sample 0 has radius zero, so an unobstructed position is returned as is.

use std::f64::consts::TAU;

use crate::placement::context::PlacementContext;
use crate::placement::types::{PlacementTransform, ValidationResult, Vec3};

use super::{Constraint, ConstraintKind, CRITICAL_PRIORITY};

/// Number of spiral samples tried before giving up
pub const SPIRAL_ATTEMPTS: usize = 50;

/// Fraction of a turn between consecutive spiral samples
const GOLDEN_RATIO_FRACTION: f64 = 0.6180339887;

/// Samples per ring before the radius grows by one grid step
const SAMPLES_PER_RING: f64 = 8.0;

/// Offset of spiral sample `i` from the original position
pub fn spiral_offset(i: usize, grid_size: f64) -> Vec3 {
    let angle = i as f64 * GOLDEN_RATIO_FRACTION * TAU;
    let radius = (i as f64 / SAMPLES_PER_RING).ceil() * grid_size;
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}

/// Rejects placements whose box intersects another placed object
#[derive(Debug, Clone)]
pub struct CollisionConstraint {
    priority: i32,
}

impl CollisionConstraint {
    pub const DEFAULT_PRIORITY: i32 = CRITICAL_PRIORITY;

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

impl Default for CollisionConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl Constraint for CollisionConstraint {
    fn id(&self) -> &str {
        "collision"
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Collision
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn description(&self) -> &str {
        "Keep the object clear of every placed object"
    }

    fn validate(
        &self,
        transform: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> ValidationResult {
        let bounds = context.target.bounds_at(transform.position);
        let collisions = context
            .spatial_index
            .check_collisions(&bounds, Some(context.target.id.as_str()));

        if collisions.is_empty() {
            return ValidationResult::pass();
        }

        let mut result = ValidationResult::new(false, 0.0);
        for collision in &collisions {
            result = result.with_issue(format!("Collides with {}", collision.id));
        }
        result.with_suggestion("Move the object to an unoccupied area")
    }

    fn solve(
        &self,
        transform: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> PlacementTransform {
        for i in 0..SPIRAL_ATTEMPTS {
            let candidate = transform
                .with_position(transform.position + spiral_offset(i, context.grid_size));
            if self.validate(&candidate, context).is_valid {
                if i > 0 {
                    tracing::trace!(attempt = i, target = %context.target.id, "Spiral search found a clear position");
                }
                return candidate;
            }
        }

        tracing::debug!(
            attempts = SPIRAL_ATTEMPTS,
            target = %context.target.id,
            "Spiral search found no collision-free position"
        );
        *transform
    }
}
