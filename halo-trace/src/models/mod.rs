//! Data models for the entity-resolution workflow

pub mod category;
pub mod profile_match;
pub mod session;

pub use category::Category;
pub use profile_match::{ProfileMatch, PROFILE_NETWORK};
pub use session::{Session, Stage, StateTransition};
