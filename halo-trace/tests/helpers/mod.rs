//! Test Helper Utilities
//!
//! Shared utilities for testing halo-trace

#![allow(dead_code)]

pub mod fake_services;
pub mod mock_backend;

// Re-export commonly used items
pub use fake_services::{extraction, png_image, FakeExtraction, FakeSearch, Gate};
pub use mock_backend::{Canned, MockBackend, RecordedUpload};

use halo_common::events::EventBus;
use halo_trace::models::Category;
use halo_trace::WorkflowController;
use std::sync::Arc;

/// Controller over fakes, with the category already selected
pub async fn controller_with(
    extraction: Arc<FakeExtraction>,
    search: Arc<FakeSearch>,
    category: Category,
) -> WorkflowController {
    let controller = WorkflowController::new(extraction, search, EventBus::new(100));
    controller.select_category(category).await.unwrap();
    controller
}
