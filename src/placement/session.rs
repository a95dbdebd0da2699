//! Placement session: pointer input to a resolved, committable transform
//!
//! A session wires the pieces together for one object being dragged or
//! inserted:
//!
//! 1. Turn a pointer ray into a world-space contact point, using the scene's
//!    ray caster and falling back to the ground plane.
//! 2. Detect snap points around the contact point and merge the best one into
//!    a candidate transform.
//! 3. Run the constraint solver and hand back the outcome.
//!
//! Every request gets a ticket. Only the newest ticket may be committed;
//! results of superseded requests are discarded rather than cancelled.

use std::fmt;

use crate::error::PlacementError;

use super::config::PlacementConfig;
use super::context::PlacementContext;
use super::snap::SnapPointDetector;
use super::solver::{ConstraintSolver, SolveOutcome};
use super::spatial::SpatialIndex;
use super::types::{
    Element, ElementSnapshot, PlacementTransform, SnapPoint, SnapPointType,
    TargetObjectDescriptor, ValidationResult, Vec3,
};

/// Rays closer than this to horizontal never reach the ground plane
const PARALLEL_EPSILON: f64 = 1e-9;

/// A pointer ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray pointing straight down onto plan position (x, z)
    pub fn vertical(x: f64, z: f64, height: f64) -> Self {
        Self::new(Vec3::new(x, height, z), Vec3::new(0.0, -1.0, 0.0))
    }

    /// Intersection with the horizontal plane at `level`, if the ray reaches it
    pub fn ground_intersection(&self, level: f64) -> Option<Vec3> {
        if self.direction.y.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (level - self.origin.y) / self.direction.y;
        if t < 0.0 {
            return None;
        }
        Some(self.origin + self.direction * t)
    }
}

/// Scene-side ray casting against existing geometry
pub trait RayCaster {
    /// Closest hit point of `ray`, if it hits anything
    fn cast(&self, ray: &Ray) -> Option<Vec3>;
}

/// Model store that receives committed placements
pub trait ElementStore {
    fn contains(&self, id: &str) -> bool;

    fn create_element(&mut self, element: Element) -> Result<(), PlacementError>;

    fn update_element(
        &mut self,
        id: &str,
        transform: &PlacementTransform,
    ) -> Result<(), PlacementError>;
}

/// Everything produced for one placement request
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementOutcome {
    pub ticket: u64,
    /// Detected snap points, highest confidence first
    pub snap_points: Vec<SnapPoint>,
    /// The snap point merged into the candidate transform
    pub anchor: Option<SnapPoint>,
    /// Candidate transform before solving
    pub candidate: PlacementTransform,
    pub transform: PlacementTransform,
    pub result: ValidationResult,
    pub iterations: usize,
}

impl PlacementOutcome {
    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }
}

impl fmt::Display for PlacementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Some(anchor) => writeln!(
                f,
                "anchor: {} ({:.2}) {}",
                anchor.kind,
                anchor.confidence,
                anchor.description.as_deref().unwrap_or("")
            )?,
            None => writeln!(f, "anchor: none")?,
        }
        let p = self.transform.position;
        let r = self.transform.rotation;
        writeln!(f, "position: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)?;
        writeln!(f, "rotation: ({:.2}, {:.2}, {:.2})", r.x, r.y, r.z)?;
        writeln!(f, "iterations: {}", self.iterations)?;
        write!(f, "{}", self.result)
    }
}

/// Resolves placements of one target object
#[derive(Debug)]
pub struct PlacementSession {
    target: TargetObjectDescriptor,
    config: PlacementConfig,
    detector: SnapPointDetector,
    solver: ConstraintSolver,
    latest_ticket: u64,
}

impl PlacementSession {
    /// Session with the default constraint set from `config`
    pub fn new(target: TargetObjectDescriptor, config: PlacementConfig) -> Self {
        let solver = ConstraintSolver::from_config(&config);
        Self::with_solver(target, config, solver)
    }

    /// Session with a caller-supplied constraint set
    pub fn with_solver(
        target: TargetObjectDescriptor,
        config: PlacementConfig,
        solver: ConstraintSolver,
    ) -> Self {
        Self {
            detector: SnapPointDetector::from_config(&config),
            target,
            config,
            solver,
            latest_ticket: 0,
        }
    }

    pub fn target(&self) -> &TargetObjectDescriptor {
        &self.target
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn solver(&self) -> &ConstraintSolver {
        &self.solver
    }

    /// Start a new request, superseding all earlier ones
    pub fn begin_request(&mut self) -> u64 {
        self.latest_ticket += 1;
        self.latest_ticket
    }

    /// Whether `ticket` belongs to the newest request
    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest_ticket
    }

    /// World-space contact point for a pointer ray
    pub fn contact_point(
        &self,
        ray: &Ray,
        ray_caster: Option<&dyn RayCaster>,
    ) -> Result<Vec3, PlacementError> {
        ray_caster
            .and_then(|caster| caster.cast(ray))
            .or_else(|| ray.ground_intersection(self.config.ground_level))
            .ok_or_else(|| PlacementError::NoGroundIntersection {
                ground_level: self.config.ground_level,
            })
    }

    /// Object center for a contact point: resting on top of the surface for
    /// floor-like kinds, hanging below it for ceiling objects
    pub fn center_from_contact(&self, contact: Vec3) -> Vec3 {
        contact - Vec3::new(0.0, self.target.resting_offset(), 0.0)
    }

    /// Merge a snap anchor into a candidate transform.
    ///
    /// The anchor supplies X and Z; Y stays with the candidate. A corner
    /// anchor also orients a new wall along the corner normal.
    pub fn merge_anchor(&self, center: Vec3, anchor: Option<&SnapPoint>) -> PlacementTransform {
        let mut transform = PlacementTransform::new(center);
        let Some(anchor) = anchor else {
            return transform;
        };

        transform.position.x = anchor.position.x;
        transform.position.z = anchor.position.z;

        if anchor.kind == SnapPointType::Corner && self.target.is_wall() {
            if let Some(normal) = anchor.normal {
                transform.rotation.y = normal.z.atan2(normal.x);
            }
        }
        transform
    }

    /// Resolve a placement for a world-space contact point under `ticket`.
    ///
    /// The resolved transform keeps the candidate's height: solving may move
    /// the object across the plan but never lifts it off, or sinks it into,
    /// the surface it was dropped on.
    pub fn evaluate(
        &self,
        ticket: u64,
        contact: Vec3,
        elements: &ElementSnapshot,
        spatial_index: &dyn SpatialIndex,
    ) -> PlacementOutcome {
        let center = self.center_from_contact(contact);
        let snap_points = self.detector.detect(center, elements.elements(), &self.target);
        let anchor = snap_points.first().cloned();
        let candidate = self.merge_anchor(center, anchor.as_ref());

        // The built-in constraints query the index directly; the nearby list is
        // part of the context for custom constraints registered by the caller.
        let reach = 3.0 * self.config.snap_tolerance;
        let region = self
            .target
            .bounds_at(candidate.position)
            .expanded(Vec3::new(reach, reach, reach));
        let nearby: Vec<_> = spatial_index
            .query_bounds(&region)
            .into_iter()
            .filter(|o| o.id != self.target.id)
            .collect();

        let context = PlacementContext::new(spatial_index, &self.target)
            .with_config(&self.config)
            .with_nearby_objects(&nearby)
            .with_snap_points(&snap_points);
        let SolveOutcome {
            mut transform,
            mut result,
            iterations,
        } = self.solver.solve(&candidate, &context);

        if transform.position.y != candidate.position.y {
            tracing::trace!(
                solved = transform.position.y,
                seated = candidate.position.y,
                "Re-seating solved transform on its contact surface"
            );
            transform.position.y = candidate.position.y;
            result = self.solver.validate(&transform, &context);
        }

        PlacementOutcome {
            ticket,
            snap_points,
            anchor,
            candidate,
            transform,
            result,
            iterations,
        }
    }

    /// Handle a pointer move: start a new request and resolve it
    pub fn pointer_moved(
        &mut self,
        ray: &Ray,
        ray_caster: Option<&dyn RayCaster>,
        elements: &ElementSnapshot,
        spatial_index: &dyn SpatialIndex,
    ) -> Result<PlacementOutcome, PlacementError> {
        let ticket = self.begin_request();
        let contact = self.contact_point(ray, ray_caster)?;
        Ok(self.evaluate(ticket, contact, elements, spatial_index))
    }

    /// Validate the target at `transform` without solving, for live feedback
    pub fn validate(
        &self,
        transform: &PlacementTransform,
        spatial_index: &dyn SpatialIndex,
    ) -> ValidationResult {
        let context = PlacementContext::new(spatial_index, &self.target).with_config(&self.config);
        self.solver.validate(transform, &context)
    }

    /// Write a resolved placement to the model store.
    ///
    /// Refuses outcomes of superseded requests and invalid placements.
    pub fn commit(
        &self,
        outcome: &PlacementOutcome,
        store: &mut dyn ElementStore,
    ) -> Result<Element, PlacementError> {
        if !self.is_current(outcome.ticket) {
            return Err(PlacementError::stale(outcome.ticket, self.latest_ticket));
        }
        if !outcome.result.is_valid {
            return Err(PlacementError::rejected(outcome.result.issues.clone()));
        }

        let element = Element::new(
            self.target.id.clone(),
            self.target.object_type.clone(),
            outcome.transform.position,
            self.target.dimensions,
        )
        .with_rotation(outcome.transform.rotation);

        if store.contains(&element.id) {
            store.update_element(&element.id, &outcome.transform)?;
        } else {
            store.create_element(element.clone())?;
        }
        tracing::debug!(id = %element.id, "Committed placement");
        Ok(element)
    }
}
