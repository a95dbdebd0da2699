//! Placement constraints
//!
//! A constraint is a named, prioritized unit of placement policy. It can score
//! a transform (`validate`) and propose a transform likely to score better
//! (`solve`). Constraints hold configuration only; each call receives the
//! transform and context it needs.

pub mod clearance;
pub mod collision;
pub mod grid;
pub mod surface;

pub use clearance::ClearanceConstraint;
pub use collision::CollisionConstraint;
pub use grid::GridSnapConstraint;
pub use surface::SurfacePlacementConstraint;

use std::fmt;

use super::context::PlacementContext;
use super::types::{PlacementTransform, ValidationResult};

/// Constraints at or above this priority veto a placement when they fail
pub const CRITICAL_PRIORITY: i32 = 1000;

/// Type tag of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Grid,
    Collision,
    Surface,
    Clearance,
    Custom,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Grid => "grid",
            ConstraintKind::Collision => "collision",
            ConstraintKind::Surface => "surface",
            ConstraintKind::Clearance => "clearance",
            ConstraintKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A placement rule that scores transforms and may correct them.
///
/// Neither operation fails: degraded outcomes are reported through the
/// score, validity flag and issue lists of the [`ValidationResult`].
pub trait Constraint: fmt::Debug {
    fn id(&self) -> &str;

    fn kind(&self) -> ConstraintKind;

    /// Ordering key for the solver and weight in aggregate scoring
    fn priority(&self) -> i32;

    fn description(&self) -> &str;

    fn validate(&self, transform: &PlacementTransform, context: &PlacementContext<'_>)
        -> ValidationResult;

    /// Propose a transform likely to score better. Returning the input
    /// unchanged means the constraint cannot correct placements.
    fn solve(&self, transform: &PlacementTransform, context: &PlacementContext<'_>)
        -> PlacementTransform;

    fn is_critical(&self) -> bool {
        self.priority() >= CRITICAL_PRIORITY
    }
}
