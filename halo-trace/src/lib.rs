//! halo-trace library interface
//!
//! Upload an image, extract company or person names from it through the
//! recognition backend, then resolve each name to a LinkedIn profile.
//! Exposes public APIs for the binary and for integration testing.

pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::models::{Category, ProfileMatch, Session, Stage};
pub use crate::services::{HaloApiClient, ImageFile};
pub use crate::workflow::WorkflowController;
