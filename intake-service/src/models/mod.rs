use bytes::Bytes;
use chrono::NaiveDate;
use serde::Serialize;

/// Image extensions the upload field accepts
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Raw text values as the submitter typed them, used to re-render the form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValues {
    pub full_name: String,
    pub nic: String,
    pub nationality: String,
    pub alias: String,
    pub date_of_birth: String,
    pub email: String,
    pub note: String,
}

/// An uploaded image as received from the form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Parsed form input handed to the orchestrator
#[derive(Debug, Clone, Default)]
pub struct SubmissionInput {
    pub full_name: String,
    pub nic: String,
    pub nationality: String,
    pub alias: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub note: String,
    pub image: Option<ImageUpload>,
}

/// One row of the `submissions` collection.
///
/// `dob` is sent as `YYYY-MM-DD` text or `null`; the row transport only
/// carries primitive values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub full_name: String,
    pub nic: String,
    pub nationality: String,
    pub alias: String,
    pub dob: Option<String>,
    pub email: String,
    pub note: String,
    pub image_path: String,
    pub image_url: String,
}

impl Submission {
    pub fn new(fields: SubmissionFields, image_path: String, image_url: String) -> Self {
        Submission {
            full_name: fields.full_name,
            nic: fields.nic,
            nationality: fields.nationality,
            alias: fields.alias,
            dob: fields.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            email: fields.email,
            note: fields.note,
            image_path,
            image_url,
        }
    }
}

/// Personal fields of a submission that passed validation
#[derive(Debug, Clone)]
pub struct SubmissionFields {
    pub full_name: String,
    pub nic: String,
    pub nationality: String,
    pub alias: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub note: String,
}

/// Input that passed validation: the required image is guaranteed present
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub fields: SubmissionFields,
    pub image: ImageUpload,
}
