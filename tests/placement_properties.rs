//! Integration tests for the placement invariants: grid rounding, collision
//! detection and avoidance, priority ordering and the weighted score.

use approx::assert_relative_eq;
use pretty_assertions::assert_eq;

use warehouse_placement::placement::{
    constraints::collision::SPIRAL_ATTEMPTS, BoundingBox, ClearanceConstraint,
    CollisionConstraint, Constraint, ConstraintSolver, Dimensions, GridSnapConstraint,
    NearbyObject, PlacementConfig, PlacementContext, PlacementKind, PlacementTransform,
    SpatialIndex, SurfacePlacementConstraint, TargetObjectDescriptor, Vec3,
};

fn cube(id: &str, center: Vec3, size: f64) -> NearbyObject {
    NearbyObject {
        id: id.to_string(),
        bounds: BoundingBox::from_center(center, &Dimensions::new(size, size, size)),
        object_type: "rack".to_string(),
        categories: vec![],
    }
}

fn cube_target(id: &str) -> TargetObjectDescriptor {
    TargetObjectDescriptor::new(id, "rack", Dimensions::new(4.0, 4.0, 4.0))
        .with_placement_kind(PlacementKind::Freestanding)
}

fn priorities(solver: &ConstraintSolver) -> Vec<i32> {
    solver.constraints().iter().map(|c| c.priority()).collect()
}

#[test]
fn test_grid_solve_is_idempotent_on_grid_points() {
    let index: Vec<NearbyObject> = vec![];
    let target = cube_target("t");
    let grid = GridSnapConstraint::new();

    for grid_size in [0.5, 1.0, 2.0] {
        let ctx = PlacementContext::new(&index, &target).with_grid_size(grid_size);
        for (i, j, k) in [(0, 0, 0), (3, 1, -7), (-12, 4, 9)] {
            let position = Vec3::new(i as f64, j as f64, k as f64) * grid_size;
            let input = PlacementTransform::new(position);
            assert_eq!(grid.solve(&input, &ctx), input);
        }
    }
}

#[test]
fn test_grid_rounding() {
    let index: Vec<NearbyObject> = vec![];
    let target = cube_target("t");
    let ctx = PlacementContext::new(&index, &target).with_grid_size(1.0);
    let solved = GridSnapConstraint::new().solve(&PlacementTransform::at(2.3, 0.0, 5.7), &ctx);
    assert_eq!(solved.position, Vec3::new(2.0, 0.0, 6.0));
}

/// The collision constraint fails exactly when the index reports collisions
/// for the target's box.
#[test]
fn test_collision_validity_matches_index() {
    let index = vec![
        cube("a", Vec3::new(0.0, 2.0, 0.0), 4.0),
        cube("b", Vec3::new(9.0, 2.0, 3.0), 2.0),
    ];
    let target = cube_target("t");
    let ctx = PlacementContext::new(&index, &target);
    let constraint = CollisionConstraint::new();

    for x in [-6.0, -4.0, -3.5, 0.0, 3.0, 4.0, 6.5, 7.0, 9.0, 12.0] {
        for z in [-4.0, 0.0, 2.5, 4.5] {
            let transform = PlacementTransform::at(x, 2.0, z);
            let hits = index.check_collisions(&target.bounds_at(transform.position), Some("t"));
            let result = constraint.validate(&transform, &ctx);
            assert_eq!(!result.is_valid, !hits.is_empty(), "at ({}, {})", x, z);
            assert_eq!(result.issues.len(), hits.len());
        }
    }
}

#[test]
fn test_priority_order_after_mutations() {
    let mut solver = ConstraintSolver::new();
    solver.add_constraint(Box::new(GridSnapConstraint::new()));
    assert_eq!(priorities(&solver), vec![100]);

    solver.add_constraint(Box::new(ClearanceConstraint::new()));
    solver.add_constraint(Box::new(CollisionConstraint::new()));
    assert_eq!(priorities(&solver), vec![1000, 700, 100]);

    solver.add_constraint(Box::new(SurfacePlacementConstraint::new()));
    assert_eq!(priorities(&solver), vec![1000, 800, 700, 100]);

    solver.remove_constraint("collision");
    assert_eq!(priorities(&solver), vec![800, 700, 100]);

    solver.add_constraint(Box::new(GridSnapConstraint::new().with_priority(750)));
    assert_eq!(priorities(&solver), vec![800, 750, 700, 100]);

    // Both grid constraints share the id and go together
    solver.remove_constraint("grid-snap");
    assert_eq!(priorities(&solver), vec![800, 700]);
}

/// Aggregate score equals Σ(score·priority)/Σ(priority) of the individual
/// constraint results.
#[test]
fn test_weighted_score_formula() {
    let index = vec![
        cube("a", Vec3::new(0.0, 2.0, 0.0), 4.0),
        cube("near", Vec3::new(0.0, 1.0, 4.0), 2.0),
    ];
    let target = cube_target("t")
        .with_placement_kind(PlacementKind::Floor)
        .with_clearance(warehouse_placement::placement::Clearance::uniform(2.0));
    let ctx = PlacementContext::new(&index, &target);
    let solver = ConstraintSolver::from_config(&PlacementConfig::default());

    for transform in [
        PlacementTransform::at(0.3, 2.0, 0.0),
        PlacementTransform::at(5.0, 2.0, 0.4),
        PlacementTransform::at(20.2, 2.1, 20.0),
    ] {
        let (weighted, weights) = solver
            .constraints()
            .iter()
            .map(|c| (c.validate(&transform, &ctx).score, f64::from(c.priority())))
            .fold((0.0, 0.0), |(s, w), (score, p)| (s + score * p, w + p));
        let result = solver.validate(&transform, &ctx);
        assert_relative_eq!(result.score, weighted / weights, epsilon = 1e-6);
    }
}

/// A high weighted score cannot rescue a placement a critical constraint
/// rejects.
#[test]
fn test_critical_constraint_overrides_score() {
    let index = vec![cube("a", Vec3::new(0.0, 2.0, 0.0), 4.0)];
    let target = cube_target("t");
    let ctx = PlacementContext::new(&index, &target);

    let mut solver = ConstraintSolver::new();
    solver.add_constraint(Box::new(CollisionConstraint::new()));
    solver.add_constraint(Box::new(GridSnapConstraint::new().with_priority(20_000)));

    let result = solver.validate(&PlacementTransform::at(1.0, 2.0, 0.0), &ctx);
    assert!(result.score >= 90.0, "score was {}", result.score);
    assert!(!result.is_valid);
    assert_eq!(result.issues, vec!["Collides with a".to_string()]);
}

#[test]
fn test_empty_solver_is_vacuously_valid() {
    let index: Vec<NearbyObject> = vec![];
    let target = cube_target("t");
    let ctx = PlacementContext::new(&index, &target);
    let result = ConstraintSolver::new().validate(&PlacementTransform::at(0.3, 0.0, 0.3), &ctx);
    assert_eq!(result.score, 0.0);
    assert!(result.is_valid);
}

/// Two 4x4x4 objects at the same spot: the collision is reported, and the
/// solver finds a collision-free transform.
#[test]
fn test_overlapping_cubes_end_to_end() {
    let index = vec![cube("existing", Vec3::new(0.0, 2.0, 0.0), 4.0)];
    let target = cube_target("new");
    let ctx = PlacementContext::new(&index, &target);
    let start = PlacementTransform::at(0.0, 2.0, 0.0);

    let mut solver = ConstraintSolver::new();
    solver.add_constraint(Box::new(CollisionConstraint::new()));

    let before = solver.validate(&start, &ctx);
    assert!(!before.is_valid);
    assert_eq!(before.score, 0.0);
    assert_eq!(before.issues, vec!["Collides with existing".to_string()]);

    let outcome = solver.solve(&start, &ctx);
    let after = solver.validate(&outcome.transform, &ctx);
    assert!(after.is_valid);
    assert_eq!(after, outcome.result);

    // The escape lies on the spiral, so it is at most SPIRAL_ATTEMPTS samples out
    let max_radius = ((SPIRAL_ATTEMPTS - 1) as f64 / 8.0).ceil() * ctx.grid_size;
    assert!((outcome.transform.position - start.position).norm() <= max_radius + 1e-9);
}

#[test]
fn test_overlapping_cubes_with_default_constraints() {
    let index = vec![cube("existing", Vec3::new(0.0, 2.0, 0.0), 4.0)];
    let target = cube_target("new");
    let ctx = PlacementContext::new(&index, &target);
    let solver = ConstraintSolver::from_config(&PlacementConfig::default());

    let outcome = solver.solve(&PlacementTransform::at(0.0, 2.0, 0.0), &ctx);
    assert!(outcome.result.is_valid);
    assert!(solver.validate(&outcome.transform, &ctx).is_valid);
    // Collision escape followed by grid snapping in the same pass
    assert_eq!(outcome.transform.position, Vec3::new(5.0, 2.0, 0.0));
    assert_eq!(outcome.iterations, 1);
}

#[test]
fn test_spiral_search_without_obstacles_returns_input() {
    let index: Vec<NearbyObject> = vec![];
    let target = cube_target("t");
    let ctx = PlacementContext::new(&index, &target);
    let input = PlacementTransform::at(3.7, 2.0, -1.2).with_rotation(Vec3::new(0.0, 0.5, 0.0));

    let first = CollisionConstraint::new().solve(&input, &ctx);
    let second = CollisionConstraint::new().solve(&input, &ctx);
    assert_eq!(first, input);
    assert_eq!(second, first);
}
