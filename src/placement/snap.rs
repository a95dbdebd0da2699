//! Snap point detection
//!
//! Turns a raw cursor position into a ranked list of candidate anchors: the
//! nearest grid point, features along nearby walls (ends, center, quarter
//! points, unit steps, corner attachments) and centers of other elements.
//!
//! All distances are measured in plan (XZ). Points are rebuilt from scratch
//! on every call and refer back to their source element by id only.

use std::cmp::Ordering;

use super::config::PlacementConfig;
use super::types::{
    plan_distance, round_to_grid, Element, SnapPoint, SnapPointType, TargetObjectDescriptor,
    Vec3, WallSegment,
};

/// Walls farther than this multiple of the snap tolerance are not inspected
const WALL_SEARCH_FACTOR: f64 = 3.0;

/// Spacing of the points walked along a wall
const WALL_EDGE_STEP: f64 = 1.0;

/// Proposes snap points near a candidate position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPointDetector {
    pub grid_size: f64,
    pub snap_tolerance: f64,
}

impl Default for SnapPointDetector {
    fn default() -> Self {
        Self::from_config(&PlacementConfig::default())
    }
}

impl SnapPointDetector {
    pub fn new(grid_size: f64, snap_tolerance: f64) -> Self {
        Self {
            grid_size,
            snap_tolerance,
        }
    }

    pub fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.grid_size, config.snap_tolerance)
    }

    /// Detect snap points around `position`, sorted by confidence (highest
    /// first). Points of equal confidence keep detection order.
    ///
    /// The target's own element, if present in `elements`, is ignored.
    pub fn detect(
        &self,
        position: Vec3,
        elements: &[Element],
        target: &TargetObjectDescriptor,
    ) -> Vec<SnapPoint> {
        let mut points = vec![self.grid_point(position)];

        for element in elements.iter().filter(|e| e.id != target.id) {
            match element.wall_segment() {
                Some(segment) => {
                    if segment.distance_to(position) <= WALL_SEARCH_FACTOR * self.snap_tolerance {
                        self.detect_wall_points(position, element, &segment, target, &mut points);
                    }
                }
                None => {
                    if self.within_tolerance(position, element.position) {
                        points.push(
                            SnapPoint::new(element.position, SnapPointType::ElementCenter)
                                .with_description(format!("Center of {}", element.id))
                                .from_element(element.id.clone()),
                        );
                    }
                }
            }
        }

        points.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        tracing::trace!(count = points.len(), x = position.x, z = position.z, "Detected snap points");
        points
    }

    /// The highest-confidence snap point, if any
    pub fn best_snap_point(
        &self,
        position: Vec3,
        elements: &[Element],
        target: &TargetObjectDescriptor,
    ) -> Option<SnapPoint> {
        self.detect(position, elements, target).into_iter().next()
    }

    fn within_tolerance(&self, position: Vec3, point: Vec3) -> bool {
        plan_distance(position, point) <= self.snap_tolerance
    }

    fn grid_point(&self, position: Vec3) -> SnapPoint {
        let snapped = Vec3::new(
            round_to_grid(position.x, self.grid_size),
            position.y,
            round_to_grid(position.z, self.grid_size),
        );
        SnapPoint::new(snapped, SnapPointType::Grid)
            .with_description(format!("Grid ({}, {})", snapped.x, snapped.z))
    }

    fn detect_wall_points(
        &self,
        position: Vec3,
        wall: &Element,
        segment: &WallSegment,
        target: &TargetObjectDescriptor,
        points: &mut Vec<SnapPoint>,
    ) {
        let wall_point = |point: Vec3, kind: SnapPointType, description: String| {
            SnapPoint::new(point, kind)
                .with_description(description)
                .from_element(wall.id.clone())
        };

        for (point, label) in [(segment.start, "start"), (segment.end, "end")] {
            if self.within_tolerance(position, point) {
                points.push(wall_point(
                    point,
                    SnapPointType::WallEnd,
                    format!("Wall {} {}", wall.id, label),
                ));
            }
        }

        let center = segment.center();
        if self.within_tolerance(position, center) {
            points.push(wall_point(
                center,
                SnapPointType::WallCenter,
                format!("Wall {} center", wall.id),
            ));
        }

        for (t, label) in [(0.25, "25%"), (0.75, "75%")] {
            let quarter = segment.point_at(t);
            if self.within_tolerance(position, quarter) {
                points.push(wall_point(
                    quarter,
                    SnapPointType::WallQuarter,
                    format!("Wall {} at {}", wall.id, label),
                ));
            }
        }

        // Only steps within the tolerance of the cursor's projection can be
        // within tolerance of the cursor
        let length = segment.length();
        let along = segment.project(position);
        let first = ((along - self.snap_tolerance) / WALL_EDGE_STEP).ceil().max(0.0);
        let last = ((along + self.snap_tolerance) / WALL_EDGE_STEP)
            .floor()
            .min((length / WALL_EDGE_STEP).floor());
        if length > 0.0 && first <= last {
            for i in first as usize..=last as usize {
                let distance = i as f64 * WALL_EDGE_STEP;
                let point = segment.point_at(distance / length);
                if self.within_tolerance(position, point) {
                    points.push(wall_point(
                        point,
                        SnapPointType::WallEdge,
                        format!("Wall {} at {:.1} ft", wall.id, distance),
                    ));
                }
            }
        }

        if target.is_wall() {
            let offset = segment.normal * target.dimensions.width;
            for (endpoint, label) in [(segment.start, "start"), (segment.end, "end")] {
                let corner = endpoint + offset;
                if self.within_tolerance(position, corner) {
                    points.push(
                        wall_point(
                            corner,
                            SnapPointType::Corner,
                            format!("Corner at wall {} {}", wall.id, label),
                        )
                        .with_normal(segment.normal),
                    );
                }
            }
        }
    }
}
