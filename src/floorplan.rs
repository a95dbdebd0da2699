//! In-memory floor plan
//!
//! Holds the placed building elements of one floor and serves them to the
//! placement engine: as an element snapshot for snap detection, as a
//! brute-force spatial index for the constraints, and as the element store
//! that committed placements are written to.
//!
//! Floor plans load from TOML:
//!
//! ```toml
//! [metadata]
//! name = "Warehouse A"
//!
//! [[elements]]
//! id = "slab"
//! type = "slab"
//! position = [0.0, -0.5, 0.0]
//! dimensions = { width = 100.0, height = 1.0, depth = 100.0 }
//! categories = ["floor"]
//!
//! [target]
//! id = "rack-9"
//! type = "rack"
//! dimensions = { width = 4.0, height = 6.0, depth = 2.0 }
//! placement = "floor"
//! ```
//!
//! The optional `[target]` table describes the object to place; its
//! clearance falls back to the configured clearance for its type.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::PlacementError;
use crate::placement::{
    BoundingBox, Clearance, Collision, Dimensions, Element, ElementSnapshot, ElementStore,
    NearbyObject, PlacementConfig, PlacementKind, PlacementTransform, SpatialIndex,
    TargetObjectDescriptor, Vec3,
};

/// TOML structure for deserializing floor plans
#[derive(Deserialize)]
struct TomlFloorPlan {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    elements: Vec<TomlElement>,
    target: Option<TomlTarget>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct TomlElement {
    id: String,
    #[serde(rename = "type")]
    element_type: String,
    position: [f64; 3],
    dimensions: Dimensions,
    #[serde(default)]
    rotation: [f64; 3],
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct TomlTarget {
    id: String,
    #[serde(rename = "type")]
    object_type: String,
    dimensions: Dimensions,
    #[serde(default)]
    placement: PlacementKind,
    clearance: Option<Clearance>,
}

/// The placed elements of one floor
#[derive(Debug, Clone, Default)]
pub struct FloorPlan {
    pub name: Option<String>,
    pub description: Option<String>,
    elements: Vec<Element>,
}

impl FloorPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a floor plan from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, PlacementError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a floor plan from a TOML string, ignoring any `[target]` table
    pub fn from_toml(content: &str) -> Result<Self, PlacementError> {
        let parsed: TomlFloorPlan = toml::from_str(content)?;
        Self::from_parsed(parsed.metadata, parsed.elements)
    }

    fn from_parsed(
        metadata: Option<TomlMetadata>,
        elements: Vec<TomlElement>,
    ) -> Result<Self, PlacementError> {
        let mut plan = FloorPlan::new();
        if let Some(metadata) = metadata {
            plan.name = metadata.name;
            plan.description = metadata.description;
        }
        for e in elements {
            let mut element = Element::new(e.id, e.element_type, Vec3::from(e.position), e.dimensions)
                .with_rotation(Vec3::from(e.rotation));
            element.categories = e.categories;
            plan.insert(element)?;
        }
        Ok(plan)
    }

    /// Add an element. Ids must be unique.
    pub fn insert(&mut self, element: Element) -> Result<(), PlacementError> {
        if self.get(&element.id).is_some() {
            return Err(PlacementError::DuplicateElement(element.id));
        }
        self.elements.push(element);
        Ok(())
    }

    /// Builder-style [`FloorPlan::insert`] for plans assembled in code
    pub fn with_element(mut self, element: Element) -> Result<Self, PlacementError> {
        self.insert(element)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
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

    /// Read-only copy of the current elements for one detection call
    pub fn snapshot(&self) -> ElementSnapshot {
        ElementSnapshot::new(self.elements.clone())
    }

    /// Bounds of everything on the floor, None for an empty plan
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut iter = self.elements.iter().map(Element::bounds);
        let first = iter.next()?;
        Some(iter.fold(first, |acc, b| acc.union(&b)))
    }

    /// Distinct element types, in first-seen order
    pub fn element_types(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.elements
            .iter()
            .map(|e| e.element_type.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }
}

impl SpatialIndex for FloorPlan {
    fn check_collisions(&self, bounds: &BoundingBox, exclude_id: Option<&str>) -> Vec<Collision> {
        self.elements
            .iter()
            .filter(|e| Some(e.id.as_str()) != exclude_id)
            .map(|e| (e, e.bounds()))
            .filter(|(_, b)| b.intersects(bounds))
            .map(|(e, b)| Collision {
                id: e.id.clone(),
                bounds: b,
            })
            .collect()
    }

    fn query_bounds(&self, bounds: &BoundingBox) -> Vec<NearbyObject> {
        self.elements
            .iter()
            .map(Element::to_nearby)
            .filter(|o| o.bounds.intersects(bounds))
            .collect()
    }
}

impl ElementStore for FloorPlan {
    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn create_element(&mut self, element: Element) -> Result<(), PlacementError> {
        self.insert(element)
    }

    fn update_element(
        &mut self,
        id: &str,
        transform: &PlacementTransform,
    ) -> Result<(), PlacementError> {
        let element = self
            .elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| PlacementError::unknown_element(id))?;
        element.position = transform.position;
        element.rotation = transform.rotation;
        Ok(())
    }
}

/// A floor plan together with the object to place in it
#[derive(Debug, Clone)]
pub struct PlacementScene {
    pub plan: FloorPlan,
    pub target: Option<TargetObjectDescriptor>,
}

impl PlacementScene {
    /// Load a scene from a TOML file
    pub fn from_file(path: &Path, config: &PlacementConfig) -> Result<Self, PlacementError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content, config)
    }

    /// Load a scene from a TOML string
    pub fn from_toml(content: &str, config: &PlacementConfig) -> Result<Self, PlacementError> {
        let parsed: TomlFloorPlan = toml::from_str(content)?;
        let target = parsed.target.map(|t| {
            let clearance = t
                .clearance
                .unwrap_or_else(|| config.clearance_for(&t.object_type));
            TargetObjectDescriptor::new(t.id, t.object_type, t.dimensions)
                .with_placement_kind(t.placement)
                .with_clearance(clearance)
        });
        let plan = FloorPlan::from_parsed(parsed.metadata, parsed.elements)?;
        Ok(Self { plan, target })
    }
}
