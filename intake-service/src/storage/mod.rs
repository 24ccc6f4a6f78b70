// Object storage for uploaded images

pub mod supabase_storage;

pub use supabase_storage::SupabaseStorage;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Bucket that receives every uploaded image
pub const UPLOADS_BUCKET: &str = "uploads";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Storage rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Key-addressed blob store that hands out public URLs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key`, tagged with `content_type`.
    async fn store(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Publicly reachable address of `key`.
    fn resolve_public_url(&self, bucket: &str, key: &str) -> Result<String, StorageError>;
}
