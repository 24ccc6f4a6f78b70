use async_trait::async_trait;

use super::{RecordStore, RecordStoreError};
use crate::models::Submission;
use crate::supabase::{self, SupabaseClient};

/// Inserts rows through the project's PostgREST endpoint
pub struct PostgrestRepository {
    client: SupabaseClient,
}

impl PostgrestRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordStore for PostgrestRepository {
    /// Create a new submission record in the database
    async fn insert(&self, collection: &str, row: &Submission) -> Result<(), RecordStoreError> {
        let response = self
            .client
            .post(&format!("/rest/v1/{}", collection))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = supabase::error_message(response).await;
            tracing::error!("Insert into {} failed ({}): {}", collection, status, message);
            return Err(RecordStoreError::Rejected { status, message });
        }

        tracing::info!("Created {} record: image_path={}", collection, row.image_path);
        Ok(())
    }
}
