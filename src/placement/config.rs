//! Configuration for the placement engine
//!
//! Loaded from TOML or built in code. Every option has a default so an empty
//! document is a valid configuration:
//!
//! ```toml
//! grid_size = 0.5
//! snap_tolerance = 2.0
//!
//! [constraints.clearance]
//! priority = 650
//!
//! [clearances.rack]
//! front = 4.0
//! back = 1.0
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::PlacementError;

use super::types::Clearance;

/// Whether a constraint is registered and with which priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConstraintSettings {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub priority: i32,
}

fn enabled_by_default() -> bool {
    true
}

impl ConstraintSettings {
    pub fn new(priority: i32) -> Self {
        Self {
            enabled: true,
            priority,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Settings for the default constraint set
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConstraintSet {
    pub collision: ConstraintSettings,
    pub surface: ConstraintSettings,
    pub clearance: ConstraintSettings,
    pub grid: ConstraintSettings,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            collision: ConstraintSettings::new(1000),
            surface: ConstraintSettings::new(800),
            clearance: ConstraintSettings::new(700),
            grid: ConstraintSettings::new(100),
        }
    }
}

/// Configuration options for snap detection and constraint solving
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Spacing of the placement grid
    pub grid_size: f64,

    /// Maximum plan distance at which a feature attracts the cursor
    pub snap_tolerance: f64,

    /// Height of the fallback ground plane for pointer rays
    pub ground_level: f64,

    /// Aggregate score below which a placement is rejected even when every
    /// critical constraint passes
    pub min_valid_score: f64,

    pub constraints: ConstraintSet,

    /// Clearance requirements keyed by object type
    pub clearances: HashMap<String, Clearance>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            snap_tolerance: 1.5,
            ground_level: 0.0,
            min_valid_score: 0.0,
            constraints: ConstraintSet::default(),
            clearances: HashMap::new(),
        }
    }
}

impl PlacementConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, PlacementError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, PlacementError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the grid spacing
    pub fn with_grid_size(mut self, grid_size: f64) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the snap tolerance
    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance;
        self
    }

    /// Set the ground plane height
    pub fn with_ground_level(mut self, level: f64) -> Self {
        self.ground_level = level;
        self
    }

    /// Set the minimum aggregate score for a valid placement
    pub fn with_min_valid_score(mut self, score: f64) -> Self {
        self.min_valid_score = score;
        self
    }

    /// Replace the constraint settings
    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// Register a clearance requirement for an object type
    pub fn with_clearance(mut self, object_type: impl Into<String>, clearance: Clearance) -> Self {
        self.clearances.insert(object_type.into(), clearance);
        self
    }

    /// Clearance for `object_type`, zero on every side when none is configured
    pub fn clearance_for(&self, object_type: &str) -> Clearance {
        self.clearances
            .get(object_type)
            .or_else(|| {
                self.clearances
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(object_type))
                    .map(|(_, v)| v)
            })
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlacementConfig::default();
        assert_eq!(config.grid_size, 1.0);
        assert_eq!(config.snap_tolerance, 1.5);
        assert_eq!(config.ground_level, 0.0);
        assert_eq!(config.min_valid_score, 0.0);
        assert_eq!(config.constraints.collision.priority, 1000);
        assert_eq!(config.constraints.surface.priority, 800);
        assert_eq!(config.constraints.clearance.priority, 700);
        assert_eq!(config.constraints.grid.priority, 100);
        assert!(config.clearances.is_empty());
    }

    #[test]
    fn test_builder_pattern() {
        let config = PlacementConfig::new()
            .with_grid_size(0.5)
            .with_snap_tolerance(2.0)
            .with_clearance("rack", Clearance::uniform(3.0));

        assert_eq!(config.grid_size, 0.5);
        assert_eq!(config.snap_tolerance, 2.0);
        assert_eq!(config.clearance_for("rack").front, 3.0);
        assert_eq!(config.clearance_for("RACK").left, 3.0);
        assert!(config.clearance_for("pallet").is_zero());
    }

    #[test]
    fn test_parse_toml() {
        let config = PlacementConfig::from_toml(
            r#"
grid_size = 0.5

[constraints.grid]
enabled = false
priority = 50

[constraints.clearance]
priority = 650

[clearances.rack]
front = 4.0
back = 1.0
"#,
        )
        .expect("Should parse");

        assert_eq!(config.grid_size, 0.5);
        assert_eq!(config.snap_tolerance, 1.5);
        assert!(!config.constraints.grid.enabled);
        assert_eq!(config.constraints.grid.priority, 50);
        assert!(config.constraints.clearance.enabled);
        assert_eq!(config.constraints.clearance.priority, 650);
        assert_eq!(config.constraints.collision.priority, 1000);
        let rack = config.clearance_for("rack");
        assert_eq!(rack.front, 4.0);
        assert_eq!(rack.back, 1.0);
        assert_eq!(rack.left, 0.0);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = PlacementConfig::from_toml("").expect("Should parse");
        assert_eq!(config, PlacementConfig::default());
    }

    #[test]
    fn test_invalid_toml_error() {
        let result = PlacementConfig::from_toml("grid_size = {{{{");
        assert!(result.is_err());
    }
}
