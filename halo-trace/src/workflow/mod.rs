//! Entity-resolution workflow
//!
//! - [`controller`]: session owner and stage machine
//! - [`resolution`]: Direct / FallbackSearch strategy
//! - [`reporting`]: summaries and status lines

pub mod controller;
pub mod reporting;
pub mod resolution;

pub use controller::{ExtractOutcome, ResolveOutcome, Submission, WorkflowController};
pub use reporting::ResultSummary;
pub use resolution::{resolve_direct, Resolution, ResolutionKind, ResolutionPlan};
