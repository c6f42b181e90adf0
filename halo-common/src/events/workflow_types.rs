//! Workflow stage shared between the controller and event consumers

use serde::{Deserialize, Serialize};

/// Position of a session in the entity-resolution workflow
///
/// Progression: Idle → CategorySelected → Staged → Extracting → Extracted → Resolving → Resolved.
/// Any stage may be reset back to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Nothing selected yet
    #[default]
    Idle,
    /// Category chosen, waiting for an image
    CategorySelected,
    /// Image accepted and held for extraction
    Staged,
    /// Extraction call outstanding
    Extracting,
    /// Entities available, resolution may be triggered
    Extracted,
    /// Resolution (possibly a search call) outstanding
    Resolving,
    /// Results available
    Resolved,
}

impl Stage {
    /// True while an extraction or search call is outstanding
    pub fn is_in_flight(self) -> bool {
        matches!(self, Stage::Extracting | Stage::Resolving)
    }

    /// Stages from which a new image may be staged
    pub fn allows_staging(self) -> bool {
        matches!(self, Stage::CategorySelected | Stage::Staged | Stage::Extracted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::CategorySelected => "category_selected",
            Stage::Staged => "staged",
            Stage::Extracting => "extracting",
            Stage::Extracted => "extracted",
            Stage::Resolving => "resolving",
            Stage::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_stages() {
        assert!(Stage::Extracting.is_in_flight());
        assert!(Stage::Resolving.is_in_flight());
        assert!(!Stage::Staged.is_in_flight());
        assert!(!Stage::Resolved.is_in_flight());
    }

    #[test]
    fn test_staging_is_blocked_mid_flight() {
        assert!(Stage::CategorySelected.allows_staging());
        assert!(Stage::Extracted.allows_staging());
        assert!(!Stage::Idle.allows_staging());
        assert!(!Stage::Extracting.allows_staging());
        assert!(!Stage::Resolving.allows_staging());
        assert!(!Stage::Resolved.allows_staging());
    }

    #[test]
    fn test_display_matches_serde_name() {
        assert_eq!(Stage::CategorySelected.to_string(), "category_selected");
        assert_eq!(Stage::default(), Stage::Idle);
    }
}
