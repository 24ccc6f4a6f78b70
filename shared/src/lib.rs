//! Shared utilities and types for the public intake backend

// Re-export common dependencies
pub use thiserror;
pub use tracing;

pub mod observability;
pub mod types;

pub use types::error::CommonError;
