//! External service boundary
//!
//! The extraction and profile-search backends are opaque to the workflow.
//! The controller only sees these traits; [`HaloApiClient`] is the HTTP
//! implementation used by the binary, tests substitute scripted fakes.

pub mod halo_api_client;
pub mod image_intake;

pub use halo_api_client::{HaloApiClient, HealthStatus};
pub use image_intake::{ImageFile, IntakeAdvisory, IntakeError};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::models::{Category, ProfileMatch};

/// Transport-level failure talking to a backend
///
/// Any non-2xx status is a failure regardless of body content.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Request could not be built locally; nothing was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Search returned a different number of results than names sent
    #[error("Search returned {actual} results for {expected} names")]
    ResultCountMismatch { expected: usize, actual: usize },
}

/// Normalized extraction response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Entity names in the order the backend reported them
    pub names: Vec<String>,

    /// Entity name → candidate profile URL; absent, null and `{}` all mean "none"
    #[serde(rename = "linkedin_urls", default, deserialize_with = "null_as_empty")]
    pub candidate_urls: HashMap<String, String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Image → entity names (+ optional candidate URLs)
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, image: &ImageFile, category: Category) -> Result<Extraction, ServiceError>;
}

/// Batched name → profile lookup used when no candidate URLs were supplied
#[async_trait]
pub trait ProfileSearchService: Send + Sync {
    /// One result per name, in the order of `names`
    async fn search(&self, names: &[String], category: Category) -> Result<Vec<ProfileMatch>, ServiceError>;
}
