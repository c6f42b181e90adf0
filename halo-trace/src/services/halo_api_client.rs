//! HTTP client for the recognition backend
//!
//! Endpoints:
//! - `POST /api/ocr` (multipart `file` + `tag`) → `{ names, linkedin_urls? }`
//! - `POST /api/search` (JSON `{ names, tag }`) → `{ results: [...] }`
//! - `GET /health` → `{ status }`

use async_trait::async_trait;
use halo_common::config::ServiceConfig;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Extraction, ExtractionService, ImageFile, ProfileSearchService, ServiceError};
use crate::models::{Category, ProfileMatch};

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    names: &'a [String],
    tag: Category,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<ProfileMatch>,
}

/// Backend health report
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Recognition backend client
///
/// Implements both service traits over one pooled `reqwest::Client`.
pub struct HaloApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HaloApiClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query `GET /health`
    pub async fn health_check(&self) -> Result<HealthStatus, ServiceError> {
        let response = self
            .http_client
            .get(self.endpoint("/health"))
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        let response = ensure_success(response).await?;
        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))
    }
}

/// Map non-2xx responses to `ApiError`, body included for diagnostics only
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(ServiceError::ApiError(status.as_u16(), error_text))
}

/// Multipart `file` part; fails only on a malformed content type
fn file_part(bytes: &[u8], file_name: &str, content_type: &str) -> Result<Part, ServiceError> {
    Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(content_type)
        .map_err(|e| ServiceError::InvalidRequest(format!("content type '{}': {}", content_type, e)))
}

#[async_trait]
impl ExtractionService for HaloApiClient {
    async fn extract(&self, image: &ImageFile, category: Category) -> Result<Extraction, ServiceError> {
        let form = Form::new()
            .part("file", file_part(image.bytes(), image.file_name(), image.content_type())?)
            .text("tag", category.as_tag());

        tracing::debug!(
            file = %image.file_name(),
            size = image.len(),
            content_type = %image.content_type(),
            tag = %category,
            "Sending image to extraction endpoint"
        );

        let response = self
            .http_client
            .post(self.endpoint("/api/ocr"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        let response = ensure_success(response).await?;
        let extraction: Extraction = response
            .json()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))?;

        tracing::info!(
            names = extraction.names.len(),
            candidate_urls = extraction.candidate_urls.len(),
            "Extraction successful"
        );

        Ok(extraction)
    }
}

#[async_trait]
impl ProfileSearchService for HaloApiClient {
    async fn search(&self, names: &[String], category: Category) -> Result<Vec<ProfileMatch>, ServiceError> {
        tracing::debug!(names = names.len(), tag = %category, "Querying profile search endpoint");

        let response = self
            .http_client
            .post(self.endpoint("/api/search"))
            .json(&SearchRequest { names, tag: category })
            .send()
            .await
            .map_err(|e| ServiceError::NetworkError(e.to_string()))?;

        let response = ensure_success(response).await?;
        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::ParseError(e.to_string()))?;

        tracing::info!(
            results = search.results.len(),
            exact = search.results.iter().filter(|r| r.is_exact_match).count(),
            "Profile search successful"
        );

        Ok(search.results)
    }
}
