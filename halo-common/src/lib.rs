//! # Halo Trace Common Library
//!
//! Shared code for the Halo Trace workspace:
//! - Error types
//! - Configuration loading (CLI → ENV → TOML → compiled default)
//! - Workflow event types and the EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
