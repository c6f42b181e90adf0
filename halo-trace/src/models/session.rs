//! Entity-resolution session state
//!
//! The session is the single source of truth for workflow progress. It is
//! owned by the [`WorkflowController`](crate::workflow::WorkflowController);
//! nothing else mutates it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{Category, ProfileMatch};
use crate::services::ImageFile;
use crate::workflow::reporting::ResultSummary;

pub use halo_common::events::Stage;

/// Stage transition record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub old_stage: Stage,
    pub new_stage: Stage,
    pub transitioned_at: DateTime<Utc>,
}

/// Mutable session aggregate
///
/// Equality ignores `session_id`, so two freshly reset sessions compare equal.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Correlation id for logs and events; replaced on reset
    pub session_id: Uuid,

    pub stage: Stage,

    pub category: Option<Category>,

    /// Extracted entity names in extraction order; duplicates are kept
    pub entities: Vec<String>,

    /// Entity name → candidate profile URL supplied alongside extraction
    pub candidate_urls: HashMap<String, String>,

    /// One result per entity, in entity order
    pub results: Vec<ProfileMatch>,

    /// `data:` URL preview of the staged image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_data: Option<String>,

    pub status_message: String,

    /// Image held for (re)trying extraction
    #[serde(skip)]
    pub staged_image: Option<ImageFile>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            stage: Stage::Idle,
            category: None,
            entities: Vec::new(),
            candidate_urls: HashMap::new(),
            results: Vec::new(),
            preview_data: None,
            status_message: String::new(),
            staged_image: None,
        }
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.stage == other.stage
            && self.category == other.category
            && self.entities == other.entities
            && self.candidate_urls == other.candidate_urls
            && self.results == other.results
            && self.preview_data == other.preview_data
            && self.status_message == other.status_message
            && self.staged_image == other.staged_image
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `new_stage`, returning the transition record
    pub fn transition_to(&mut self, new_stage: Stage) -> StateTransition {
        let transition = StateTransition {
            old_stage: self.stage,
            new_stage,
            transitioned_at: Utc::now(),
        };
        self.stage = new_stage;
        transition
    }

    /// Clear everything derived from a previous image
    pub fn clear_extraction(&mut self) {
        self.entities.clear();
        self.candidate_urls.clear();
        self.results.clear();
    }

    /// True when the session holds no state beyond its id
    pub fn is_initial(&self) -> bool {
        *self == Session::default()
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_initial() {
        let session = Session::new();
        assert_eq!(session.stage, Stage::Idle);
        assert!(session.category.is_none());
        assert!(session.status_message.is_empty());
        assert!(session.is_initial());
    }

    #[test]
    fn test_equality_ignores_session_id() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a, b);
    }

    #[test]
    fn test_transition_records_old_and_new() {
        let mut session = Session::new();
        let t = session.transition_to(Stage::CategorySelected);
        assert_eq!(t.old_stage, Stage::Idle);
        assert_eq!(t.new_stage, Stage::CategorySelected);
        assert_eq!(session.stage, Stage::CategorySelected);
        assert!(!session.is_initial());
    }

    #[test]
    fn test_clear_extraction_keeps_category_and_stage() {
        let mut session = Session::new();
        session.category = Some(Category::People);
        session.stage = Stage::Extracted;
        session.entities = vec!["Jane Doe".to_string(), "Jane Doe".to_string()];
        session.candidate_urls.insert("Jane Doe".to_string(), "https://x/in/jane".to_string());
        session.results.push(ProfileMatch::not_found("Jane Doe"));

        session.clear_extraction();

        assert!(session.entities.is_empty());
        assert!(session.candidate_urls.is_empty());
        assert!(session.results.is_empty());
        assert_eq!(session.category, Some(Category::People));
        assert_eq!(session.stage, Stage::Extracted);
    }
}
