// Record store for submission rows

pub mod repository;

pub use repository::PostgrestRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Submission;

/// Collection that receives one row per submission
pub const SUBMISSIONS_COLLECTION: &str = "submissions";

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Database request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Database rejected the insert ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Structured-row store addressed by collection name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, collection: &str, row: &Submission) -> Result<(), RecordStoreError>;
}
