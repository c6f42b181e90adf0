//! Resolution strategy
//!
//! Turns extracted entities into one [`ProfileMatch`] per entity. The
//! strategy is chosen once per run from the candidate URL map:
//!
//! - **Direct**: candidate URLs were supplied with the extraction. Entities
//!   with a candidate become exact matches, the rest are not found. No
//!   network call is made.
//! - **FallbackSearch**: no candidates at all. One batched call to the
//!   search service provides every result.
//!
//! The two are never mixed within a run.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Category, ProfileMatch};
use crate::services::{ProfileSearchService, ServiceError};
use crate::workflow::reporting::{direct_summary_message, search_summary_message, ResultSummary};

/// Which strategy produced a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    Direct,
    FallbackSearch,
}

/// Strategy selected for one resolution run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPlan {
    /// Resolve from the candidate URL map only
    Direct(HashMap<String, String>),
    /// Resolve through the search service
    FallbackSearch,
}

/// Results of one resolution run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub kind: ResolutionKind,
    pub results: Vec<ProfileMatch>,
}

impl Resolution {
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }

    /// Status line; wording differs between strategies
    pub fn status_message(&self) -> String {
        let summary = self.summary();
        match self.kind {
            ResolutionKind::Direct => direct_summary_message(&summary),
            ResolutionKind::FallbackSearch => search_summary_message(&summary),
        }
    }
}

impl ResolutionPlan {
    /// Non-empty candidate map selects Direct, empty selects FallbackSearch
    pub fn select(candidate_urls: &HashMap<String, String>) -> Self {
        if candidate_urls.is_empty() {
            ResolutionPlan::FallbackSearch
        } else {
            ResolutionPlan::Direct(candidate_urls.clone())
        }
    }

    pub fn kind(&self) -> ResolutionKind {
        match self {
            ResolutionPlan::Direct(_) => ResolutionKind::Direct,
            ResolutionPlan::FallbackSearch => ResolutionKind::FallbackSearch,
        }
    }

    /// Run the plan over `entities`
    ///
    /// `search` is only touched by `FallbackSearch`.
    pub async fn execute(
        &self,
        entities: &[String],
        category: Category,
        search: &dyn ProfileSearchService,
    ) -> Result<Resolution, ServiceError> {
        let results = match self {
            ResolutionPlan::Direct(candidates) => {
                tracing::debug!(
                    entities = entities.len(),
                    candidates = candidates.len(),
                    "Resolving from candidate URLs"
                );
                resolve_direct(entities, candidates)
            }
            ResolutionPlan::FallbackSearch => {
                tracing::debug!(entities = entities.len(), "Resolving through profile search");
                let results = search.search(entities, category).await?;
                check_search_results(entities, &results)?;
                results
            }
        };

        Ok(Resolution {
            kind: self.kind(),
            results,
        })
    }
}

/// One result per entity, exact exactly when the entity has a candidate URL
pub fn resolve_direct(entities: &[String], candidates: &HashMap<String, String>) -> Vec<ProfileMatch> {
    entities
        .iter()
        .map(|name| match candidates.get(name) {
            Some(url) => ProfileMatch::exact(name.clone(), url.clone()),
            None => ProfileMatch::not_found(name.clone()),
        })
        .collect()
}

/// Search results are used verbatim; only the count is enforced
fn check_search_results(entities: &[String], results: &[ProfileMatch]) -> Result<(), ServiceError> {
    if results.len() != entities.len() {
        return Err(ServiceError::ResultCountMismatch {
            expected: entities.len(),
            actual: results.len(),
        });
    }

    for (entity, result) in entities.iter().zip(results) {
        if !result.is_consistent() {
            tracing::warn!(
                name = %result.name,
                exact = result.is_exact_match,
                has_url = result.profile_url.is_some(),
                has_title = result.profile_title.is_some(),
                "Search returned an inconsistent match, using it as-is"
            );
        }
        if result.name.trim() != entity.trim() {
            tracing::debug!(entity = %entity, result = %result.name, "Search result name differs from entity");
        }
    }
    Ok(())
}
