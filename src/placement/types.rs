//! Core types for the placement engine
//!
//! Coordinates are in feet with Y pointing up; the floor plan lies in the XZ
//! plane. Every candidate evaluation works on fresh values: transforms, snap
//! points and validation results are plain data with no identity.

use std::collections::HashMap;
use std::fmt;

use nalgebra::Vector3;
use serde::Deserialize;

/// 3D vector used for positions, rotations, scales and normals
pub type Vec3 = Vector3<f64>;

/// Position, rotation and scale of an object in the floor plan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementTransform {
    /// Position in feet
    pub position: Vec3,
    /// Euler angles in radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl PlacementTransform {
    /// Transform at `position` with no rotation and unit scale
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(Vec3::new(x, y, z))
    }

    /// Copy of this transform moved to `position`
    pub fn with_position(&self, position: Vec3) -> Self {
        Self { position, ..*self }
    }

    /// Copy of this transform with a new rotation
    pub fn with_rotation(&self, rotation: Vec3) -> Self {
        Self { rotation, ..*self }
    }
}

impl Default for PlacementTransform {
    fn default() -> Self {
        Self::new(Vec3::zeros())
    }
}

/// Width (X), height (Y) and depth (Z) of an object
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Dimensions {
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn as_vector(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }
}

/// Minimum empty distance required on each side of an object
///
/// Sides map to axes as: left = -X, right = +X, bottom = -Y, top = +Y,
/// back = -Z, front = +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Clearance {
    pub front: f64,
    pub back: f64,
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Clearance {
    /// Same clearance on the four horizontal sides, none above or below
    pub fn uniform(distance: f64) -> Self {
        Self {
            front: distance,
            back: distance,
            left: distance,
            right: distance,
            top: 0.0,
            bottom: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        [
            self.front,
            self.back,
            self.left,
            self.right,
            self.top,
            self.bottom,
        ]
        .iter()
        .all(|d| *d == 0.0)
    }
}

/// An axis-aligned box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given dimensions centered on `center`
    pub fn from_center(center: Vec3, dimensions: &Dimensions) -> Self {
        Self::from_half_extents(center, dimensions.as_vector() / 2.0)
    }

    pub fn from_half_extents(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if this box overlaps another. Boxes that only share a face do not
    /// intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Grow the box symmetrically by `amount` on each axis
    pub fn expanded(&self, amount: Vec3) -> BoundingBox {
        BoundingBox::new(self.min - amount, self.max + amount)
    }

    /// Grow each side of the box by its own clearance distance
    pub fn expanded_by_clearance(&self, clearance: &Clearance) -> BoundingBox {
        BoundingBox::new(
            self.min - Vec3::new(clearance.left, clearance.bottom, clearance.back),
            self.max + Vec3::new(clearance.right, clearance.top, clearance.front),
        )
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }
}

/// How an object must be supported once placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementKind {
    #[default]
    Floor,
    Wall,
    Ceiling,
    Table,
    Freestanding,
}

impl PlacementKind {
    /// Category tags that count as a supporting surface for this kind
    pub fn supporting_tags(&self) -> &'static [&'static str] {
        match self {
            PlacementKind::Floor => &["floor", "structural"],
            PlacementKind::Wall => &["wall"],
            PlacementKind::Ceiling => &["ceiling", "roof"],
            PlacementKind::Table => &["table", "furniture"],
            PlacementKind::Freestanding => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementKind::Floor => "floor",
            PlacementKind::Wall => "wall",
            PlacementKind::Ceiling => "ceiling",
            PlacementKind::Table => "table",
            PlacementKind::Freestanding => "freestanding",
        }
    }
}

impl fmt::Display for PlacementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The object being placed, fixed for the lifetime of a placement session
#[derive(Debug, Clone, PartialEq)]
pub struct TargetObjectDescriptor {
    pub id: String,
    pub object_type: String,
    pub dimensions: Dimensions,
    pub placement_kind: PlacementKind,
    pub clearance: Clearance,
}

impl TargetObjectDescriptor {
    pub fn new(id: impl Into<String>, object_type: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            id: id.into(),
            object_type: object_type.into(),
            dimensions,
            placement_kind: PlacementKind::default(),
            clearance: Clearance::default(),
        }
    }

    pub fn with_placement_kind(mut self, kind: PlacementKind) -> Self {
        self.placement_kind = kind;
        self
    }

    pub fn with_clearance(mut self, clearance: Clearance) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn is_wall(&self) -> bool {
        self.object_type.eq_ignore_ascii_case("wall")
    }

    /// Box occupied by this object when placed at `position`
    pub fn bounds_at(&self, position: Vec3) -> BoundingBox {
        BoundingBox::from_center(position, &self.dimensions)
    }

    /// Height of the face that rests on the supporting surface, relative to
    /// the object's center: the bottom for floor, table and freestanding
    /// objects, the top for ceiling objects, the center for wall mounts.
    pub fn resting_offset(&self) -> f64 {
        let half_height = self.dimensions.height / 2.0;
        match self.placement_kind {
            PlacementKind::Ceiling => half_height,
            PlacementKind::Wall => 0.0,
            PlacementKind::Floor | PlacementKind::Table | PlacementKind::Freestanding => {
                -half_height
            }
        }
    }
}

/// Lightweight record of an already placed object near the candidate
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyObject {
    pub id: String,
    pub bounds: BoundingBox,
    pub object_type: String,
    pub categories: Vec<String>,
}

impl NearbyObject {
    /// Check the type tag and category tags, ignoring case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.object_type.eq_ignore_ascii_case(tag)
            || self.categories.iter().any(|c| c.eq_ignore_ascii_case(tag))
    }
}

/// Outcome of validating a transform against one or more constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// 0-100, higher is better
    pub score: f64,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn new(is_valid: bool, score: f64) -> Self {
        Self {
            is_valid,
            score,
            issues: vec![],
            suggestions: vec![],
        }
    }

    /// A valid result with a perfect score
    pub fn pass() -> Self {
        Self::new(true, 100.0)
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_valid { "valid" } else { "invalid" };
        write!(f, "{} (score {:.1})", status, self.score)?;
        for issue in &self.issues {
            write!(f, "\n  issue: {}", issue)?;
        }
        for suggestion in &self.suggestions {
            write!(f, "\n  suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

/// Kind of geometric feature a snap point was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapPointType {
    Grid,
    WallEnd,
    WallCenter,
    WallQuarter,
    WallEdge,
    Corner,
    ElementCenter,
}

impl SnapPointType {
    /// Confidence assigned to points of this type
    pub fn confidence(&self) -> f64 {
        match self {
            SnapPointType::WallCenter => 0.95,
            SnapPointType::WallEnd => 0.9,
            SnapPointType::WallQuarter | SnapPointType::Corner => 0.85,
            SnapPointType::WallEdge | SnapPointType::ElementCenter => 0.7,
            SnapPointType::Grid => 0.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapPointType::Grid => "grid",
            SnapPointType::WallEnd => "wall-end",
            SnapPointType::WallCenter => "wall-center",
            SnapPointType::WallQuarter => "wall-quarter",
            SnapPointType::WallEdge => "wall-edge",
            SnapPointType::Corner => "corner",
            SnapPointType::ElementCenter => "element-center",
        }
    }
}

impl fmt::Display for SnapPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate anchor position proposed by the snap point detector
#[derive(Debug, Clone, PartialEq)]
pub struct SnapPoint {
    pub position: Vec3,
    pub kind: SnapPointType,
    /// Always within [0, 1]
    pub confidence: f64,
    pub normal: Option<Vec3>,
    pub description: Option<String>,
    /// Id of the element this point was derived from. Resolve it with
    /// [`SnapPoint::source_in`] against the snapshot it was detected from.
    pub source_element: Option<String>,
}

impl SnapPoint {
    pub fn new(position: Vec3, kind: SnapPointType) -> Self {
        Self {
            position,
            kind,
            confidence: kind.confidence(),
            normal: None,
            description: None,
            source_element: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn from_element(mut self, id: impl Into<String>) -> Self {
        self.source_element = Some(id.into());
        self
    }

    /// Look up the source element in `snapshot`
    pub fn source_in<'a>(&self, snapshot: &'a ElementSnapshot) -> Option<&'a Element> {
        self.source_element
            .as_deref()
            .and_then(|id| snapshot.get(id))
    }
}

/// A placed building element as seen by the model store
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: String,
    pub element_type: String,
    /// Center of the element
    pub position: Vec3,
    pub dimensions: Dimensions,
    pub rotation: Vec3,
    pub categories: Vec<String>,
}

impl Element {
    pub fn new(
        id: impl Into<String>,
        element_type: impl Into<String>,
        position: Vec3,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            position,
            dimensions,
            rotation: Vec3::zeros(),
            categories: vec![],
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn is_wall(&self) -> bool {
        self.element_type.eq_ignore_ascii_case("wall")
            || self.categories.iter().any(|c| c.eq_ignore_ascii_case("wall"))
    }

    /// Axis-aligned bounds of the element's footprint rotated about Y
    ///
    /// Uses the loose-bounds approach: the AABB of the rotated box corners.
    pub fn bounds(&self) -> BoundingBox {
        let (sin, cos) = self.rotation.y.sin_cos();
        let half_w = self.dimensions.width / 2.0;
        let half_d = self.dimensions.depth / 2.0;
        let half = Vec3::new(
            cos.abs() * half_w + sin.abs() * half_d,
            self.dimensions.height / 2.0,
            sin.abs() * half_w + cos.abs() * half_d,
        );
        BoundingBox::from_half_extents(self.position, half)
    }

    /// Centerline of a wall element, None for anything else
    pub fn wall_segment(&self) -> Option<WallSegment> {
        if !self.is_wall() {
            return None;
        }
        let (sin, cos) = self.rotation.y.sin_cos();
        let direction = Vec3::new(cos, 0.0, sin);
        let half = direction * (self.dimensions.width / 2.0);
        Some(WallSegment {
            start: self.position - half,
            end: self.position + half,
            normal: Vec3::new(-sin, 0.0, cos),
        })
    }

    pub fn to_nearby(&self) -> NearbyObject {
        NearbyObject {
            id: self.id.clone(),
            bounds: self.bounds(),
            object_type: self.element_type.clone(),
            categories: self.categories.clone(),
        }
    }
}

/// The centerline of a wall, from start to end, with its horizontal normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSegment {
    pub start: Vec3,
    pub end: Vec3,
    pub normal: Vec3,
}

impl WallSegment {
    pub fn length(&self) -> f64 {
        plan_distance(self.start, self.end)
    }

    /// Linear interpolation along the wall, `t` in [0, 1]
    pub fn point_at(&self, t: f64) -> Vec3 {
        self.start + (self.end - self.start) * t
    }

    pub fn center(&self) -> Vec3 {
        self.point_at(0.5)
    }

    /// Plan distance from the start to the projection of `point` onto the
    /// wall's line. Not clamped to the segment.
    pub fn project(&self, point: Vec3) -> f64 {
        let length = self.length();
        if length == 0.0 {
            return 0.0;
        }
        let dx = self.end.x - self.start.x;
        let dz = self.end.z - self.start.z;
        ((point.x - self.start.x) * dx + (point.z - self.start.z) * dz) / length
    }

    /// Plan distance from `point` to the closest point on the segment
    pub fn distance_to(&self, point: Vec3) -> f64 {
        let dx = self.end.x - self.start.x;
        let dz = self.end.z - self.start.z;
        let len_sq = dx * dx + dz * dz;
        if len_sq == 0.0 {
            return plan_distance(point, self.start);
        }
        let t = (((point.x - self.start.x) * dx + (point.z - self.start.z) * dz) / len_sq)
            .clamp(0.0, 1.0);
        plan_distance(point, self.point_at(t))
    }
}

/// Read-only view of the placed elements for one detection call
#[derive(Debug, Clone, Default)]
pub struct ElementSnapshot {
    elements: Vec<Element>,
    index: HashMap<String, usize>,
}

impl ElementSnapshot {
    pub fn new(elements: Vec<Element>) -> Self {
        let index = elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Self { elements, index }
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index.get(id).map(|&i| &self.elements[i])
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Distance between two points projected onto the XZ plane
pub fn plan_distance(a: Vec3, b: Vec3) -> f64 {
    ((a.x - b.x).powi(2) + (a.z - b.z).powi(2)).sqrt()
}

/// Round a single value to the nearest multiple of `grid_size`
pub fn round_to_grid(value: f64, grid_size: f64) -> f64 {
    if grid_size <= 0.0 {
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// Round every component of `v` to the nearest multiple of `grid_size`
pub fn snap_to_grid(v: Vec3, grid_size: f64) -> Vec3 {
    v.map(|c| round_to_grid(c, grid_size))
}
