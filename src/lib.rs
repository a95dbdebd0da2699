//! Warehouse Placement - constraint-based placement for warehouse floor plans
//!
//! This library validates and resolves where building elements (walls,
//! fixtures, doors, racks) may be placed: a snap point detector proposes
//! anchors near the cursor, and a priority-weighted constraint solver scores
//! candidate transforms and searches for acceptable ones.
//!
//! # Example
//!
//! ```rust
//! use warehouse_placement::{
//!     resolve_placement, Dimensions, Element, FloorPlan, PlacementConfig, PlacementKind,
//!     TargetObjectDescriptor, Vec3,
//! };
//!
//! let plan = FloorPlan::new()
//!     .with_element(Element::new(
//!         "rack-1",
//!         "rack",
//!         Vec3::new(0.0, 2.0, 0.0),
//!         Dimensions::new(4.0, 4.0, 4.0),
//!     ))
//!     .unwrap();
//! let target = TargetObjectDescriptor::new("rack-2", "rack", Dimensions::new(4.0, 4.0, 4.0))
//!     .with_placement_kind(PlacementKind::Freestanding);
//!
//! // Dropped right on top of rack-1: the solver moves it somewhere clear
//! let outcome = resolve_placement(&plan, target, Vec3::zeros(), PlacementConfig::default());
//! assert!(outcome.is_valid());
//! assert_ne!(outcome.transform.position, Vec3::new(0.0, 2.0, 0.0));
//! ```

pub mod error;
pub mod floorplan;
pub mod placement;

pub use error::PlacementError;
pub use floorplan::{FloorPlan, PlacementScene};
pub use placement::{
    ConstraintSolver, Dimensions, Element, ElementSnapshot, PlacementConfig, PlacementContext,
    PlacementKind, PlacementOutcome, PlacementSession, PlacementTransform, SnapPoint,
    SnapPointDetector, SnapPointType, TargetObjectDescriptor, ValidationResult, Vec3,
};

/// Resolve a single placement of `target` at a world-space contact point
///
/// Runs a one-off [`PlacementSession`] with the default constraint set from
/// `config`, using `plan` as element snapshot and spatial index.
pub fn resolve_placement(
    plan: &FloorPlan,
    target: TargetObjectDescriptor,
    contact: Vec3,
    config: PlacementConfig,
) -> PlacementOutcome {
    let mut session = PlacementSession::new(target, config);
    let ticket = session.begin_request();
    session.evaluate(ticket, contact, &plan.snapshot(), plan)
}
