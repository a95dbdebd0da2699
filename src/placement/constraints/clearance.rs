//! Minimum clearance around the placed object

use crate::placement::context::PlacementContext;
use crate::placement::types::{Clearance, PlacementTransform, ValidationResult, Vec3};

use super::{Constraint, ConstraintKind};

/// Score lost for each object inside the clearance zone
const PENALTY_PER_CONFLICT: f64 = 20.0;

/// Checks that nothing intrudes into the target's clearance zone, the box
/// grown by the per-side clearance distances.
///
/// Each intruder is attributed to the side its center lies on. This
/// constraint does not correct placements; `solve` returns its input.
#[derive(Debug, Clone)]
pub struct ClearanceConstraint {
    priority: i32,
}

impl ClearanceConstraint {
    pub const DEFAULT_PRIORITY: i32 = 700;

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

impl Default for ClearanceConstraint {
    fn default() -> Self {
        Self::new()
    }
}

/// Side of the object an intruder at `offset` (relative to the object's
/// center) violates, with the clearance required on that side
fn violated_side(offset: Vec3, clearance: &Clearance) -> (&'static str, f64) {
    if offset.z.abs() >= offset.x.abs() {
        if offset.z >= 0.0 {
            ("front", clearance.front)
        } else {
            ("back", clearance.back)
        }
    } else if offset.x >= 0.0 {
        ("right", clearance.right)
    } else {
        ("left", clearance.left)
    }
}

impl Constraint for ClearanceConstraint {
    fn id(&self) -> &str {
        "clearance"
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Clearance
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn description(&self) -> &str {
        "Keep the required clearance free on every side of the object"
    }

    fn validate(
        &self,
        transform: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> ValidationResult {
        let clearance = &context.target.clearance;
        if clearance.is_zero() {
            return ValidationResult::pass();
        }

        let zone = context
            .target
            .bounds_at(transform.position)
            .expanded_by_clearance(clearance);
        let conflicts = context
            .spatial_index
            .check_collisions(&zone, Some(context.target.id.as_str()));

        if conflicts.is_empty() {
            return ValidationResult::pass();
        }

        let score = (100.0 - PENALTY_PER_CONFLICT * conflicts.len() as f64).max(0.0);
        let mut result = ValidationResult::new(false, score);
        for conflict in &conflicts {
            let (side, required) = violated_side(conflict.bounds.center() - transform.position, clearance);
            result = result.with_issue(format!(
                "Insufficient {} clearance: {} is within {} ft",
                side, conflict.id, required
            ));
        }
        result.with_suggestion("Move the object away from neighbouring objects")
    }

    fn solve(
        &self,
        transform: &PlacementTransform,
        _context: &PlacementContext<'_>,
    ) -> PlacementTransform {
        *transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::types::{BoundingBox, Dimensions, NearbyObject, TargetObjectDescriptor};

    fn post(id: &str, x: f64, z: f64) -> NearbyObject {
        NearbyObject {
            id: id.to_string(),
            bounds: BoundingBox::from_center(Vec3::new(x, 1.0, z), &Dimensions::new(1.0, 2.0, 1.0)),
            object_type: "column".to_string(),
            categories: vec!["structural".to_string()],
        }
    }

    fn target() -> TargetObjectDescriptor {
        TargetObjectDescriptor::new("rack", "rack", Dimensions::new(2.0, 2.0, 2.0)).with_clearance(Clearance {
            front: 3.0,
            back: 1.0,
            left: 1.0,
            right: 1.0,
            top: 0.0,
            bottom: 0.0,
        })
    }

    #[test]
    fn test_clear_zone_passes() {
        let index = vec![post("far", 10.0, 10.0)];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);
        let result = ClearanceConstraint::new().validate(&PlacementTransform::at(0.0, 1.0, 0.0), &ctx);
        assert!(result.is_valid);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_side_specific_issues() {
        let index = vec![post("front-post", 0.0, 3.0), post("left-post", -2.2, 0.0)];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);
        let result = ClearanceConstraint::new().validate(&PlacementTransform::at(0.0, 1.0, 0.0), &ctx);

        assert!(!result.is_valid);
        assert_eq!(result.score, 60.0);
        assert_eq!(
            result.issues,
            vec![
                "Insufficient front clearance: front-post is within 3 ft".to_string(),
                "Insufficient left clearance: left-post is within 1 ft".to_string(),
            ]
        );
    }

    #[test]
    fn test_score_floors_at_zero() {
        let index: Vec<NearbyObject> = (0..6).map(|i| post(&format!("p{}", i), i as f64 * 0.1, 2.5)).collect();
        let target = target();
        let ctx = PlacementContext::new(&index, &target);
        let result = ClearanceConstraint::new().validate(&PlacementTransform::at(0.0, 1.0, 0.0), &ctx);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.issues.len(), 6);
    }

    #[test]
    fn test_zero_clearance_passes() {
        let index = vec![post("touching", 1.5, 0.0)];
        let target = TargetObjectDescriptor::new("rack", "rack", Dimensions::new(2.0, 2.0, 2.0));
        let ctx = PlacementContext::new(&index, &target);
        assert!(ClearanceConstraint::new()
            .validate(&PlacementTransform::at(0.0, 1.0, 0.0), &ctx)
            .is_valid);
    }

    #[test]
    fn test_violated_side() {
        let clearance = Clearance {
            front: 1.0,
            back: 2.0,
            left: 3.0,
            right: 4.0,
            top: 0.0,
            bottom: 0.0,
        };
        assert_eq!(violated_side(Vec3::new(0.5, 0.0, 2.0), &clearance), ("front", 1.0));
        assert_eq!(violated_side(Vec3::new(0.5, 0.0, -2.0), &clearance), ("back", 2.0));
        assert_eq!(violated_side(Vec3::new(-3.0, 0.0, 1.0), &clearance), ("left", 3.0));
        assert_eq!(violated_side(Vec3::new(3.0, 0.0, 1.0), &clearance), ("right", 4.0));
    }
}
