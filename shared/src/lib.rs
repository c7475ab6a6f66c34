//! Shared types for the station accounting engine
//!
//! Entity models, engine result types and the domain error enum used by
//! `station-core` and its embedders. No HTTP or wire types live here.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{DomainError, DomainResult};
pub use serde::{Deserialize, Serialize};
