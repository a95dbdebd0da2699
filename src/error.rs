//! Error types for the outer placement surface
//!
//! Constraint evaluation never fails; these errors cover loading
//! configuration and floor plans, resolving pointer rays, and committing
//! results to the element store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The pointer ray hit no geometry and never reaches the ground plane
    #[error("pointer ray does not intersect the ground plane at y = {ground_level}")]
    NoGroundIntersection { ground_level: f64 },

    /// Attempt to commit a placement whose validation failed
    #[error("placement rejected: {}", issues.join("; "))]
    Rejected { issues: Vec<String> },

    /// Attempt to commit a result that a newer request superseded
    #[error("stale placement result (request {ticket}, latest is {latest})")]
    Stale { ticket: u64, latest: u64 },

    #[error("unknown element '{0}'")]
    UnknownElement(String),

    #[error("duplicate element id '{0}'")]
    DuplicateElement(String),
}

impl PlacementError {
    /// Create a rejection error from validation issues
    pub fn rejected(issues: Vec<String>) -> Self {
        Self::Rejected { issues }
    }

    /// Create a stale-result error
    pub fn stale(ticket: u64, latest: u64) -> Self {
        Self::Stale { ticket, latest }
    }

    pub fn unknown_element(id: impl Into<String>) -> Self {
        Self::UnknownElement(id.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = PlacementError::rejected(vec![
            "Collides with rack-1".to_string(),
            "Collides with rack-2".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "placement rejected: Collides with rack-1; Collides with rack-2"
        );
    }

    #[test]
    fn test_stale_display() {
        let err = PlacementError::stale(3, 5);
        assert!(err.to_string().contains("request 3"));
        assert!(err.to_string().contains("latest is 5"));
    }
}
