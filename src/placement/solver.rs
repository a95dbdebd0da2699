//! Constraint solver for placement transforms
//!
//! The solver keeps its constraints sorted by priority (highest first) and
//! offers two operations:
//!
//! - `validate` scores a transform against every constraint. The overall
//!   score is the priority-weighted mean `Σ(score·priority) / Σ(priority)`;
//!   a failing critical constraint makes the whole result invalid no matter
//!   how high that mean is.
//! - `solve` repeatedly applies each constraint's correction step in priority
//!   order, keeping a candidate only when it raises the overall score. The
//!   result therefore depends on constraint order; equal priorities keep
//!   registration order.

use std::collections::HashSet;

use super::config::PlacementConfig;
use super::constraints::{
    ClearanceConstraint, CollisionConstraint, Constraint, GridSnapConstraint,
    SurfacePlacementConstraint,
};
use super::context::PlacementContext;
use super::types::{PlacementTransform, ValidationResult};

/// Upper bound on refinement passes over the constraint set
pub const MAX_ITERATIONS: usize = 10;

/// Result of [`ConstraintSolver::solve`]
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Best transform found, possibly still invalid
    pub transform: PlacementTransform,
    pub result: ValidationResult,
    /// Refinement passes actually performed
    pub iterations: usize,
}

/// Build the standard constraint set described by `config`.
///
/// Disabled constraints are left out.
pub fn default_constraints(config: &PlacementConfig) -> Vec<Box<dyn Constraint>> {
    let settings = &config.constraints;
    let mut constraints: Vec<Box<dyn Constraint>> = Vec::new();
    if settings.collision.enabled {
        constraints.push(Box::new(
            CollisionConstraint::new().with_priority(settings.collision.priority),
        ));
    }
    if settings.surface.enabled {
        constraints.push(Box::new(
            SurfacePlacementConstraint::new().with_priority(settings.surface.priority),
        ));
    }
    if settings.clearance.enabled {
        constraints.push(Box::new(
            ClearanceConstraint::new().with_priority(settings.clearance.priority),
        ));
    }
    if settings.grid.enabled {
        constraints.push(Box::new(
            GridSnapConstraint::new().with_priority(settings.grid.priority),
        ));
    }
    constraints
}

/// Ordered set of constraints with aggregate validation and iterative solving
#[derive(Debug, Default)]
pub struct ConstraintSolver {
    constraints: Vec<Box<dyn Constraint>>,
    min_valid_score: f64,
}

impl ConstraintSolver {
    /// Create a solver with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a solver with the default constraint set and acceptance floor
    /// from `config`
    pub fn from_config(config: &PlacementConfig) -> Self {
        let mut solver = Self::new().with_min_valid_score(config.min_valid_score);
        for constraint in default_constraints(config) {
            solver.add_constraint(constraint);
        }
        solver
    }

    /// Set the aggregate score below which results are invalid
    pub fn with_min_valid_score(mut self, score: f64) -> Self {
        self.min_valid_score = score;
        self
    }

    /// Register a constraint, keeping the list sorted by priority
    pub fn add_constraint(&mut self, constraint: Box<dyn Constraint>) {
        self.constraints.push(constraint);
        self.sort();
    }

    /// Remove every constraint with `id`. Returns whether anything was removed.
    pub fn remove_constraint(&mut self, id: &str) -> bool {
        let before = self.constraints.len();
        self.constraints.retain(|c| c.id() != id);
        self.sort();
        self.constraints.len() != before
    }

    /// Registered constraints, highest priority first
    pub fn constraints(&self) -> &[Box<dyn Constraint>] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    fn sort(&mut self) {
        // Stable, so equal priorities keep registration order
        self.constraints
            .sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Score `transform` against every constraint.
    ///
    /// With no constraints registered the result is valid with a score of 0.
    pub fn validate(
        &self,
        transform: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> ValidationResult {
        if self.constraints.is_empty() {
            return ValidationResult::new(true, 0.0);
        }

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        let mut critical_failed = false;
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();
        let mut seen_issues = HashSet::new();
        let mut seen_suggestions = HashSet::new();

        for constraint in &self.constraints {
            let result = constraint.validate(transform, context);
            let weight = f64::from(constraint.priority());
            weighted_sum += result.score * weight;
            total_weight += weight;

            if constraint.is_critical() && !result.is_valid {
                critical_failed = true;
            }

            for issue in result.issues {
                if seen_issues.insert(issue.clone()) {
                    issues.push(issue);
                }
            }
            for suggestion in result.suggestions {
                if seen_suggestions.insert(suggestion.clone()) {
                    suggestions.push(suggestion);
                }
            }
        }

        let score = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        };

        ValidationResult {
            is_valid: !critical_failed && score >= self.min_valid_score,
            score,
            issues,
            suggestions,
        }
    }

    /// Search for a better transform than `initial`.
    ///
    /// Always returns the best transform seen, even when no valid one was
    /// found within [`MAX_ITERATIONS`] passes. Callers must check
    /// `result.is_valid` before committing.
    pub fn solve(
        &self,
        initial: &PlacementTransform,
        context: &PlacementContext<'_>,
    ) -> SolveOutcome {
        let mut best = *initial;
        let mut best_result = self.validate(&best, context);
        let mut iterations = 0;

        while !best_result.is_valid && iterations < MAX_ITERATIONS {
            iterations += 1;
            let mut improved = false;

            for constraint in &self.constraints {
                let candidate = constraint.solve(&best, context);
                let result = self.validate(&candidate, context);
                tracing::trace!(
                    iteration = iterations,
                    constraint = constraint.id(),
                    score = result.score,
                    best = best_result.score,
                    "Constraint solve step"
                );

                if result.score > best_result.score {
                    best = candidate;
                    best_result = result;
                    improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        tracing::debug!(
            target_id = %context.target.id,
            iterations,
            score = best_result.score,
            valid = best_result.is_valid,
            "Solved placement"
        );

        SolveOutcome {
            transform: best,
            result: best_result,
            iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::constraints::ConstraintKind;
    use crate::placement::types::{Dimensions, NearbyObject, TargetObjectDescriptor, Vec3};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    /// Constraint with a canned validation result
    #[derive(Debug)]
    struct Fixed {
        id: &'static str,
        priority: i32,
        score: f64,
        valid: bool,
        issue: Option<&'static str>,
    }

    impl Fixed {
        fn boxed(id: &'static str, priority: i32, score: f64) -> Box<dyn Constraint> {
            Box::new(Fixed {
                id,
                priority,
                score,
                valid: true,
                issue: None,
            })
        }
    }

    impl Constraint for Fixed {
        fn id(&self) -> &str {
            self.id
        }

        fn kind(&self) -> ConstraintKind {
            ConstraintKind::Custom
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn description(&self) -> &str {
            "fixed"
        }

        fn validate(&self, _: &PlacementTransform, _: &PlacementContext<'_>) -> ValidationResult {
            let mut result = ValidationResult::new(self.valid, self.score);
            if let Some(issue) = self.issue {
                result = result.with_issue(issue);
            }
            result
        }

        fn solve(&self, transform: &PlacementTransform, _: &PlacementContext<'_>) -> PlacementTransform {
            *transform
        }
    }

    fn target() -> TargetObjectDescriptor {
        TargetObjectDescriptor::new("t", "crate", Dimensions::new(1.0, 1.0, 1.0))
    }

    fn priorities(solver: &ConstraintSolver) -> Vec<i32> {
        solver.constraints().iter().map(|c| c.priority()).collect()
    }

    #[test]
    fn test_constraints_sorted_by_priority() {
        let mut solver = ConstraintSolver::new();
        solver.add_constraint(Fixed::boxed("a", 100, 0.0));
        solver.add_constraint(Fixed::boxed("b", 1000, 0.0));
        solver.add_constraint(Fixed::boxed("c", 700, 0.0));
        solver.add_constraint(Fixed::boxed("d", 800, 0.0));
        assert_eq!(priorities(&solver), vec![1000, 800, 700, 100]);

        assert!(solver.remove_constraint("d"));
        assert!(!solver.remove_constraint("missing"));
        assert_eq!(priorities(&solver), vec![1000, 700, 100]);
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let mut solver = ConstraintSolver::new();
        solver.add_constraint(Fixed::boxed("first", 500, 0.0));
        solver.add_constraint(Fixed::boxed("high", 900, 0.0));
        solver.add_constraint(Fixed::boxed("second", 500, 0.0));
        let ids: Vec<&str> = solver.constraints().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["high", "first", "second"]);
    }

    #[test]
    fn test_weighted_score() {
        let index: Vec<NearbyObject> = vec![];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);

        let mut solver = ConstraintSolver::new();
        solver.add_constraint(Fixed::boxed("a", 800, 20.0));
        solver.add_constraint(Fixed::boxed("b", 700, 60.0));
        solver.add_constraint(Fixed::boxed("c", 100, 95.0));

        let result = solver.validate(&PlacementTransform::default(), &ctx);
        let expected = (20.0 * 800.0 + 60.0 * 700.0 + 95.0 * 100.0) / 1600.0;
        assert_relative_eq!(result.score, expected, epsilon = 1e-6);
        assert!(result.is_valid);
    }

    #[test]
    fn test_critical_failure_overrides_score() {
        let index: Vec<NearbyObject> = vec![];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);

        let mut solver = ConstraintSolver::new();
        solver.add_constraint(Fixed::boxed("heavy", 50_000, 100.0));
        solver.add_constraint(Box::new(Fixed {
            id: "critical",
            priority: 1000,
            score: 0.0,
            valid: false,
            issue: Some("blocked"),
        }));

        let result = solver.validate(&PlacementTransform::default(), &ctx);
        assert!(result.score >= 90.0);
        assert!(!result.is_valid);
        assert_eq!(result.issues, vec!["blocked".to_string()]);
    }

    #[test]
    fn test_soft_failure_does_not_invalidate() {
        let index: Vec<NearbyObject> = vec![];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);

        let mut solver = ConstraintSolver::new();
        solver.add_constraint(Box::new(Fixed {
            id: "soft",
            priority: 999,
            score: 10.0,
            valid: false,
            issue: Some("meh"),
        }));
        assert!(solver.validate(&PlacementTransform::default(), &ctx).is_valid);

        let strict = ConstraintSolver {
            constraints: vec![Fixed::boxed("soft", 999, 10.0)],
            min_valid_score: 50.0,
        };
        assert!(!strict.validate(&PlacementTransform::default(), &ctx).is_valid);
    }

    #[test]
    fn test_issues_deduplicated_in_order() {
        let index: Vec<NearbyObject> = vec![];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);

        let mut solver = ConstraintSolver::new();
        for (id, priority, issue) in [("a", 3, "x"), ("b", 2, "y"), ("c", 1, "x")] {
            solver.add_constraint(Box::new(Fixed {
                id,
                priority,
                score: 50.0,
                valid: true,
                issue: Some(issue),
            }));
        }
        let result = solver.validate(&PlacementTransform::default(), &ctx);
        assert_eq!(result.issues, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_empty_solver() {
        let index: Vec<NearbyObject> = vec![];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);
        let solver = ConstraintSolver::new();

        let result = solver.validate(&PlacementTransform::default(), &ctx);
        assert_eq!(result.score, 0.0);
        assert!(result.is_valid);

        let outcome = solver.solve(&PlacementTransform::at(1.5, 0.0, 2.5), &ctx);
        assert_eq!(outcome.transform, PlacementTransform::at(1.5, 0.0, 2.5));
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_solve_stops_without_improvement() {
        let index: Vec<NearbyObject> = vec![];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);

        let mut solver = ConstraintSolver::new();
        solver.add_constraint(Box::new(Fixed {
            id: "stuck",
            priority: 1000,
            score: 0.0,
            valid: false,
            issue: None,
        }));

        let outcome = solver.solve(&PlacementTransform::default(), &ctx);
        assert_eq!(outcome.iterations, 1);
        assert!(!outcome.result.is_valid);
    }

    #[test]
    fn test_default_constraints_follow_config() {
        let mut config = PlacementConfig::default();
        config.constraints.grid.enabled = false;
        config.constraints.clearance.priority = 900;

        let solver = ConstraintSolver::from_config(&config);
        let ids: Vec<&str> = solver.constraints().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec!["collision", "clearance", "surface-placement"]);
        assert_eq!(priorities(&solver), vec![1000, 900, 800]);
    }

    #[test]
    fn test_solve_moves_off_grid_transform() {
        let index: Vec<NearbyObject> = vec![];
        let target = target();
        let ctx = PlacementContext::new(&index, &target);

        let mut solver = ConstraintSolver::new().with_min_valid_score(99.0);
        solver.add_constraint(Box::new(GridSnapConstraint::new()));

        let outcome = solver.solve(&PlacementTransform::at(2.3, 0.5, 5.7), &ctx);
        assert_eq!(outcome.transform.position, Vec3::new(2.0, 0.5, 6.0));
        assert!(outcome.result.is_valid);
        assert_eq!(outcome.iterations, 1);
    }
}
