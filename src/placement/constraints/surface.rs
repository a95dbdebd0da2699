//! Supporting surface requirement

use crate::placement::context::PlacementContext;
use crate::placement::types::{PlacementKind, PlacementTransform, ValidationResult, Vec3};

use super::{Constraint, ConstraintKind};

/// How far beyond the object's box a supporting surface may be
const SURFACE_SEARCH_MARGIN: f64 = 1.0;

/// Score when the required surface is missing
const MISSING_SURFACE_SCORE: f64 = 20.0;

/// Requires a surface matching the target's placement kind next to the
/// object: a floor for floor objects, a wall for wall-mounted ones and so on.
///
/// Freestanding objects always pass. This constraint does not correct
/// placements; `solve` returns its input.
#[derive(Debug, Clone)]
pub struct SurfacePlacementConstraint {
    priority: i32,
}

impl SurfacePlacementConstraint {
    pub const DEFAULT_PRIORITY: i32 = 800;

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

impl Default for SurfacePlacementConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl Constraint for SurfacePlacementConstraint {
    fn id(&self) -> &str {
        "surface-placement"
    }

    fn kind(&self) -> ConstraintKind {
        ConstraintKind::Surface
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn description(&self) -> &str {
        "Require a supporting surface for the object's placement kind"
    }

    fn validate(
        &self,
        transform: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> ValidationResult {
        let kind = context.target.placement_kind;
        if kind == PlacementKind::Freestanding {
            return ValidationResult::pass();
        }

        let region = context
            .target
            .bounds_at(transform.position)
            .expanded(Vec3::repeat(SURFACE_SEARCH_MARGIN));
        let tags = kind.supporting_tags();
        let supported = context
            .spatial_index
            .query_bounds(&region)
            .iter()
            .filter(|o| o.id != context.target.id)
            .any(|o| tags.iter().any(|tag| o.has_tag(tag)));

        if supported {
            return ValidationResult::pass();
        }

        ValidationResult::new(false, MISSING_SURFACE_SCORE)
            .with_issue(format!(
                "No {} surface found to support {} ({} expected)",
                kind,
                context.target.id,
                tags.join(" or ")
            ))
            .with_suggestion(format!("Place the object against a {} surface", kind))
    }

    fn solve(
        &self,
        transform: &PlacementTransform,
        _context: &PlacementContext<'_>,
    ) -> PlacementTransform {
        *transform
    }
}
