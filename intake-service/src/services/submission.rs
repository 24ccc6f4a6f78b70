//! Submission workflow: validate, upload the image, insert the row.
//!
//! Steps run strictly in order and each is awaited before the next one
//! starts. A row is only written after its image is stored; an insert
//! failure leaves the stored image in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{RecordStore, SUBMISSIONS_COLLECTION};
use crate::error::{SubmissionError, SubmissionResult};
use crate::models::{Submission, SubmissionFields, SubmissionInput, ValidatedSubmission};
use crate::storage::{ObjectStore, UPLOADS_BUCKET};

pub struct SubmissionService {
    object_store: Arc<dyn ObjectStore>,
    record_store: Arc<dyn RecordStore>,
}

/// Check the required fields. No other field is validated.
pub fn validate(input: SubmissionInput) -> SubmissionResult<ValidatedSubmission> {
    if input.full_name.trim().is_empty() {
        return Err(SubmissionError::missing_full_name());
    }

    let image = input.image.ok_or_else(SubmissionError::missing_image)?;

    Ok(ValidatedSubmission {
        fields: SubmissionFields {
            full_name: input.full_name,
            nic: input.nic,
            nationality: input.nationality,
            alias: input.alias,
            date_of_birth: input.date_of_birth,
            email: input.email,
            note: input.note,
        },
        image,
    })
}

/// Storage key `YYYY/MM/DD/<uuid-v4>.jpg`, dated in UTC.
///
/// The suffix is always `.jpg`, whatever the uploaded format.
pub fn build_storage_key(now: DateTime<Utc>) -> String {
    format!("{}/{}.jpg", now.format("%Y/%m/%d"), Uuid::new_v4())
}

impl SubmissionService {
    pub fn new(object_store: Arc<dyn ObjectStore>, record_store: Arc<dyn RecordStore>) -> Self {
        Self {
            object_store,
            record_store,
        }
    }

    pub async fn submit(&self, input: SubmissionInput) -> SubmissionResult<Submission> {
        self.submit_at(input, Utc::now()).await
    }

    async fn submit_at(
        &self,
        input: SubmissionInput,
        now: DateTime<Utc>,
    ) -> SubmissionResult<Submission> {
        let ValidatedSubmission { fields, image } = validate(input)?;

        let key = build_storage_key(now);

        tracing::info!(
            "Uploading image: key={}, filename={}, size={} bytes, content_type={}",
            key,
            image.file_name,
            image.data.len(),
            image.content_type
        );

        self.object_store
            .store(UPLOADS_BUCKET, &key, image.data, &image.content_type)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upload image {}: {}", key, e);
                SubmissionError::StorageWriteFailed(e)
            })?;

        let url = self
            .object_store
            .resolve_public_url(UPLOADS_BUCKET, &key)
            .map_err(|e| {
                tracing::error!("Failed to resolve public URL for {}: {}", key, e);
                SubmissionError::UrlResolutionFailed(e)
            })?;

        let row = Submission::new(fields, key, url);

        self.record_store
            .insert(SUBMISSIONS_COLLECTION, &row)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to insert submission row, image {} left in storage: {}",
                    row.image_path,
                    e
                );
                SubmissionError::RecordInsertFailed(e)
            })?;

        tracing::info!("Submission recorded: image_path={}", row.image_path);
        Ok(row)
    }
}
