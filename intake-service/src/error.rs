use shared::CommonError;
use thiserror::Error;

use crate::db::RecordStoreError;
use crate::storage::StorageError;

/// Outcome of a failed submission, rendered back to the submitter
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// A required field was left empty. Nothing was sent to the backend.
    #[error("{message}")]
    MissingField {
        field: &'static str,
        message: &'static str,
    },

    /// A field was rejected while the form was being read.
    #[error("{0}")]
    InvalidField(String),

    #[error(transparent)]
    StorageWriteFailed(StorageError),

    #[error(transparent)]
    UrlResolutionFailed(StorageError),

    /// The image was stored but the row was not; the blob stays behind.
    #[error(transparent)]
    RecordInsertFailed(RecordStoreError),
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;

impl SubmissionError {
    pub fn missing_full_name() -> Self {
        SubmissionError::MissingField {
            field: "full_name",
            message: "Full Name is required.",
        }
    }

    pub fn missing_image() -> Self {
        SubmissionError::MissingField {
            field: "image",
            message: "Image upload is required.",
        }
    }

    /// Text shown in the form's error banner
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::MissingField { .. } | SubmissionError::InvalidField(_) => {
                self.to_string()
            }
            _ => format!("An error occurred: {}", self),
        }
    }
}

impl From<&SubmissionError> for CommonError {
    fn from(err: &SubmissionError) -> Self {
        match err {
            SubmissionError::MissingField { .. } => CommonError::ValidationFailed(err.to_string()),
            SubmissionError::InvalidField(msg) => CommonError::InvalidInput(msg.clone()),
            SubmissionError::StorageWriteFailed(_)
            | SubmissionError::UrlResolutionFailed(_)
            | SubmissionError::RecordInsertFailed(_) => {
                CommonError::ExternalService(err.to_string())
            }
        }
    }
}
