//! Constraint-based placement engine
//!
//! Given a candidate transform for an object being dragged or inserted, this
//! module decides whether the transform is acceptable, scores it, and searches
//! for a nearby acceptable one when it is not. It is a pure, synchronous
//! function of (candidate, context) with no state shared between calls.

pub mod config;
pub mod constraints;
pub mod context;
pub mod session;
pub mod snap;
pub mod solver;
pub mod spatial;
pub mod types;

pub use config::{ConstraintSet, ConstraintSettings, PlacementConfig};
pub use constraints::{
    ClearanceConstraint, CollisionConstraint, Constraint, ConstraintKind, GridSnapConstraint,
    SurfacePlacementConstraint, CRITICAL_PRIORITY,
};
pub use context::PlacementContext;
pub use session::{ElementStore, PlacementOutcome, PlacementSession, Ray, RayCaster};
pub use snap::SnapPointDetector;
pub use solver::{default_constraints, ConstraintSolver, SolveOutcome, MAX_ITERATIONS};
pub use spatial::{Collision, SpatialIndex};
pub use types::*;
