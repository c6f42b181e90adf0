//! Workflow controller
//!
//! Owns the [`Session`] and sequences image intake → extraction →
//! resolution → reporting.
//!
//! # Concurrency
//! The extraction and search calls are the only suspension points. The
//! session lock is never held across them: each operation checks its stage
//! guard and moves to an in-flight stage under the lock, releases it for the
//! call, then re-acquires it to apply the response. The in-flight stage is
//! what blocks re-entry.
//!
//! Calls are not cancelled on reset. Instead every request captures the
//! current request token; [`WorkflowController::reset`] and
//! [`WorkflowController::stage_image`] advance the token, and a response
//! whose token no longer matches is discarded.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use halo_common::events::{EventBus, WorkflowEvent};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{Category, Session, Stage};
use crate::services::{
    ExtractionService, HaloApiClient, ImageFile, IntakeAdvisory, ProfileSearchService,
};
use crate::workflow::reporting::{
    extraction_message, ResultSummary, EXTRACTION_FAILED_MESSAGE, RESOLVING_MESSAGE,
    SEARCH_FAILED_MESSAGE,
};
use crate::workflow::resolution::{ResolutionKind, ResolutionPlan};

/// Result of an extraction attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtractOutcome {
    /// Entities stored, stage is Extracted
    Extracted { entities: usize, candidate_urls: usize },
    /// Call failed, stage rolled back to Staged with a failure status
    Failed { reason: String },
    /// Session was reset while the call was outstanding; response dropped
    Discarded,
}

/// Result of a resolution attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// Results stored, stage is Resolved
    Resolved {
        kind: ResolutionKind,
        summary: ResultSummary,
    },
    /// No entities to resolve; nothing changed
    Skipped,
    /// Search failed, stage rolled back to Extracted with empty results
    Failed { reason: String },
    /// Session was reset while the call was outstanding; response dropped
    Discarded,
}

/// Outcome of staging and extracting an image in one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub advisories: Vec<IntakeAdvisory>,
    pub outcome: ExtractOutcome,
}

struct ControllerState {
    session: Session,
    /// Monotonically increasing; never reset
    request_token: u64,
}

/// Entity-resolution workflow controller
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct WorkflowController {
    state: Arc<Mutex<ControllerState>>,
    extraction: Arc<dyn ExtractionService>,
    search: Arc<dyn ProfileSearchService>,
    event_bus: EventBus,
}

impl WorkflowController {
    pub fn new(
        extraction: Arc<dyn ExtractionService>,
        search: Arc<dyn ProfileSearchService>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                session: Session::default(),
                request_token: 0,
            })),
            extraction,
            search,
            event_bus,
        }
    }

    /// Controller backed by one HTTP client for both services
    pub fn with_client(client: Arc<HaloApiClient>, event_bus: EventBus) -> Self {
        Self::new(client.clone(), client, event_bus)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Consistent copy of the session
    pub async fn snapshot(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn stage(&self) -> Stage {
        self.state.lock().await.session.stage
    }

    /// Counts for the current results
    pub async fn summary(&self) -> ResultSummary {
        self.state.lock().await.session.summary()
    }

    /// Choose what to look for. Legal before any image is staged.
    pub async fn select_category(&self, category: Category) -> WorkflowResult<()> {
        let mut state = self.state.lock().await;
        let stage = state.session.stage;
        if !matches!(stage, Stage::Idle | Stage::CategorySelected) {
            return Err(WorkflowError::InvalidTransition {
                operation: "select a category",
                stage,
            });
        }

        state.session.category = Some(category);
        info!(session_id = %state.session.session_id, category = %category, "Category selected");
        self.transition(&mut state.session, Stage::CategorySelected);
        Ok(())
    }

    /// Accept an image for extraction
    ///
    /// Clears entities, candidate URLs and results, and starts building the
    /// preview in the background. Advisory problems with the file are
    /// returned and logged but never block staging.
    pub async fn stage_image(&self, image: ImageFile) -> WorkflowResult<Vec<IntakeAdvisory>> {
        let mut state = self.state.lock().await;
        let stage = state.session.stage;
        if !stage.allows_staging() {
            return Err(WorkflowError::InvalidTransition {
                operation: "stage an image",
                stage,
            });
        }
        let category = state.session.category.ok_or(WorkflowError::CategoryNotSelected)?;

        let advisories = image.advisories();
        for advisory in &advisories {
            warn!(file = %image.file_name(), "Upload advisory: {}", advisory);
        }

        state.request_token += 1;
        let token = state.request_token;

        let session = &mut state.session;
        session.clear_extraction();
        session.preview_data = None;
        session.staged_image = Some(image.clone());
        info!(
            session_id = %session.session_id,
            file = %image.file_name(),
            size = image.len(),
            content_type = %image.content_type(),
            "Image staged"
        );
        self.set_status(session, category.analyzing_message());
        self.transition(session, Stage::Staged);
        drop(state);

        self.spawn_preview(image, token);
        Ok(advisories)
    }

    /// Read an image from disk and stage it
    pub async fn stage_path(&self, path: impl AsRef<Path>) -> WorkflowResult<Vec<IntakeAdvisory>> {
        match ImageFile::from_path(path).await {
            Ok(image) => self.stage_image(image).await,
            Err(e) => {
                warn!("Image intake failed: {}", e);
                let mut state = self.state.lock().await;
                self.set_status(&mut state.session, &format!("Failed to read image: {}", e));
                Err(e.into())
            }
        }
    }

    /// Send the staged image to the extraction service
    pub async fn extract(&self) -> WorkflowResult<ExtractOutcome> {
        let (image, category, token) = {
            let mut state = self.state.lock().await;
            let stage = state.session.stage;
            if stage != Stage::Staged {
                return Err(WorkflowError::InvalidTransition {
                    operation: "extract",
                    stage,
                });
            }
            let category = state.session.category.ok_or(WorkflowError::CategoryNotSelected)?;
            let image = state
                .session
                .staged_image
                .clone()
                .ok_or(WorkflowError::InvalidTransition {
                    operation: "extract without an image",
                    stage,
                })?;
            let token = state.request_token;
            self.transition(&mut state.session, Stage::Extracting);
            (image, category, token)
        };

        let result = self.extraction.extract(&image, category).await;

        let mut state = self.state.lock().await;
        if state.request_token != token {
            self.discard_stale(&state.session, "extract");
            return Ok(ExtractOutcome::Discarded);
        }

        let session = &mut state.session;
        match result {
            Ok(extraction) => {
                let outcome = ExtractOutcome::Extracted {
                    entities: extraction.names.len(),
                    candidate_urls: extraction.candidate_urls.len(),
                };
                info!(
                    session_id = %session.session_id,
                    entities = extraction.names.len(),
                    candidate_urls = extraction.candidate_urls.len(),
                    "Extraction applied"
                );
                let message = extraction_message(category, extraction.names.len());
                session.entities = extraction.names;
                session.candidate_urls = extraction.candidate_urls;
                self.set_status(session, &message);
                self.transition(session, Stage::Extracted);
                Ok(outcome)
            }
            Err(e) => {
                error!(session_id = %session.session_id, "Extraction failed: {}", e);
                session.clear_extraction();
                self.set_status(session, EXTRACTION_FAILED_MESSAGE);
                self.transition(session, Stage::Staged);
                Ok(ExtractOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Stage an image and extract it
    pub async fn submit_image(&self, image: ImageFile) -> WorkflowResult<Submission> {
        let advisories = self.stage_image(image).await?;
        let outcome = self.extract().await?;
        Ok(Submission { advisories, outcome })
    }

    /// Resolve every extracted entity to a profile match
    ///
    /// A no-op returning [`ResolveOutcome::Skipped`] when nothing was extracted.
    pub async fn resolve(&self) -> WorkflowResult<ResolveOutcome> {
        let (plan, entities, category, token) = {
            let mut state = self.state.lock().await;
            let stage = state.session.stage;
            if stage != Stage::Extracted {
                return Err(WorkflowError::InvalidTransition {
                    operation: "resolve",
                    stage,
                });
            }
            if state.session.entities.is_empty() {
                debug!(session_id = %state.session.session_id, "Nothing to resolve");
                return Ok(ResolveOutcome::Skipped);
            }
            let category = state.session.category.ok_or(WorkflowError::CategoryNotSelected)?;

            let plan = ResolutionPlan::select(&state.session.candidate_urls);
            let entities = state.session.entities.clone();
            let token = state.request_token;
            info!(
                session_id = %state.session.session_id,
                entities = entities.len(),
                strategy = ?plan.kind(),
                "Resolving entities"
            );
            self.set_status(&mut state.session, RESOLVING_MESSAGE);
            self.transition(&mut state.session, Stage::Resolving);
            (plan, entities, category, token)
        };

        let result = plan.execute(&entities, category, self.search.as_ref()).await;

        let mut state = self.state.lock().await;
        if state.request_token != token {
            self.discard_stale(&state.session, "resolve");
            return Ok(ResolveOutcome::Discarded);
        }

        let session = &mut state.session;
        match result {
            Ok(resolution) => {
                let summary = resolution.summary();
                let message = resolution.status_message();
                info!(
                    session_id = %session.session_id,
                    exact = summary.exact_count,
                    not_found = summary.no_match_count,
                    "Resolution applied"
                );
                session.results = resolution.results;
                self.set_status(session, &message);
                self.transition(session, Stage::Resolved);
                Ok(ResolveOutcome::Resolved {
                    kind: resolution.kind,
                    summary,
                })
            }
            Err(e) => {
                error!(session_id = %session.session_id, "Profile search failed: {}", e);
                session.results.clear();
                self.set_status(session, SEARCH_FAILED_MESSAGE);
                self.transition(session, Stage::Extracted);
                Ok(ResolveOutcome::Failed {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Leave the results view for the upload view, keeping everything
    pub async fn back_to_upload(&self) -> WorkflowResult<()> {
        let mut state = self.state.lock().await;
        let stage = state.session.stage;
        if stage != Stage::Resolved {
            return Err(WorkflowError::InvalidTransition {
                operation: "go back to upload",
                stage,
            });
        }
        self.transition(&mut state.session, Stage::Extracted);
        Ok(())
    }

    /// Start a new search: the whole session returns to its initial value
    ///
    /// Legal from any stage. Outstanding calls keep running; their responses
    /// are discarded when they arrive.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        let previous_session_id = state.session.session_id;
        let previous_stage = state.session.stage;

        state.request_token += 1;
        state.session = Session::default();

        info!(
            previous_session_id = %previous_session_id,
            session_id = %state.session.session_id,
            previous_stage = %previous_stage,
            "Session reset"
        );
        self.event_bus.emit_lossy(WorkflowEvent::SessionReset {
            previous_session_id,
            session_id: state.session.session_id,
            timestamp: Utc::now(),
        });
    }

    fn transition(&self, session: &mut Session, new_stage: Stage) {
        let transition = session.transition_to(new_stage);
        debug!(
            session_id = %session.session_id,
            from = %transition.old_stage,
            to = %transition.new_stage,
            "Stage transition"
        );
        self.event_bus.emit_lossy(WorkflowEvent::StageChanged {
            session_id: session.session_id,
            old_stage: transition.old_stage,
            new_stage: transition.new_stage,
            timestamp: transition.transitioned_at,
        });
    }

    fn set_status(&self, session: &mut Session, message: &str) {
        session.status_message = message.to_string();
        self.event_bus.emit_lossy(WorkflowEvent::StatusChanged {
            session_id: session.session_id,
            message: session.status_message.clone(),
            timestamp: Utc::now(),
        });
    }

    fn discard_stale(&self, session: &Session, operation: &str) {
        warn!(
            session_id = %session.session_id,
            operation = operation,
            "Discarding response for a superseded request"
        );
        self.event_bus.emit_lossy(WorkflowEvent::StaleResponseDiscarded {
            session_id: session.session_id,
            operation: operation.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Build the preview off the async threads; never affects extraction
    fn spawn_preview(&self, image: ImageFile, token: u64) {
        let state = Arc::clone(&self.state);
        let event_bus = self.event_bus.clone();

        tokio::spawn(async move {
            let preview = match tokio::task::spawn_blocking(move || image.preview_data_url()).await {
                Ok(preview) => preview,
                Err(e) => {
                    warn!("Preview generation failed: {}", e);
                    return;
                }
            };

            let mut state = state.lock().await;
            let session_id = state.session.session_id;
            if state.request_token != token {
                debug!(session_id = %session_id, "Dropping preview for superseded image");
                event_bus.emit_lossy(WorkflowEvent::StaleResponseDiscarded {
                    session_id,
                    operation: "preview".to_string(),
                    timestamp: Utc::now(),
                });
                return;
            }

            let size = preview.len();
            state.session.preview_data = Some(preview);
            event_bus.emit_lossy(WorkflowEvent::PreviewReady {
                session_id,
                size,
                timestamp: Utc::now(),
            });
        });
    }
}
