use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Response,
};
use bytes::Bytes;
use chrono::NaiveDate;
use shared::CommonError;

use crate::config::FormConfig;
use crate::error::{SubmissionError, SubmissionResult};
use crate::handlers::form::{page_response, Banner};
use crate::models::{FormValues, ImageUpload, SubmissionInput, ALLOWED_IMAGE_EXTENSIONS};
use crate::AppState;

/// Everything read from one form post, before any field is interpreted
#[derive(Debug, Default)]
pub struct CollectedInput {
    pub values: FormValues,
    pub image: Option<ImagePart>,
    /// Whether the submit button was part of the post
    pub submitted: bool,
}

/// The file part exactly as the browser sent it
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A post that broke off while being read, with the text that arrived before the failure
#[derive(Debug)]
pub struct CollectError {
    pub values: FormValues,
    pub error: SubmissionError,
}

/// Read every field of the multipart form
pub async fn collect_input(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<CollectedInput, CollectError> {
    let mut collected = CollectedInput::default();

    match read_fields(&mut multipart, &mut collected, max_upload_bytes).await {
        Ok(()) => Ok(collected),
        Err(error) => Err(CollectError {
            values: collected.values,
            error,
        }),
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    collected: &mut CollectedInput,
    max_upload_bytes: usize,
) -> SubmissionResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error(e, "Invalid form data", max_upload_bytes))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();
        tracing::debug!("Processing field: {}", field_name);

        if field_name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| read_error(e, "Failed to read image", max_upload_bytes))?;

            collected.image = Some(ImagePart {
                file_name,
                content_type,
                data,
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| read_error(e, "Invalid form data", max_upload_bytes))?;

        let values = &mut collected.values;
        match field_name.as_str() {
            "full_name" => values.full_name = text,
            "nic" => values.nic = text,
            "nationality" => values.nationality = text,
            "alias" => values.alias = text,
            "date_of_birth" => values.date_of_birth = text,
            "email" => values.email = text,
            "note" => values.note = text,
            "submit" => collected.submitted = true,
            other => tracing::debug!("Ignoring unknown field: {}", other),
        }
    }

    Ok(())
}

/// The body limit surfaces as a 413 multipart error part-way through the stream
fn read_error(e: MultipartError, context: &str, max_upload_bytes: usize) -> SubmissionError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        SubmissionError::InvalidField(upload_too_large(max_upload_bytes))
    } else {
        SubmissionError::InvalidField(format!("{}: {}", context, e))
    }
}

pub fn upload_too_large(max_upload_bytes: usize) -> String {
    format!(
        "Upload is too large; the limit is {} MB.",
        max_upload_bytes / (1024 * 1024)
    )
}

impl CollectedInput {
    /// Apply the collection-time constraints: date format and lower bound,
    /// and the accepted image types.
    pub fn into_input(self, form: &FormConfig) -> SubmissionResult<SubmissionInput> {
        let date_of_birth = parse_date_of_birth(&self.values.date_of_birth, form.min_birth_date)?;
        let image = match self.image {
            Some(part) => accept_image(part)?,
            None => None,
        };

        let FormValues {
            full_name,
            nic,
            nationality,
            alias,
            email,
            note,
            ..
        } = self.values;

        Ok(SubmissionInput {
            full_name,
            nic,
            nationality,
            alias,
            date_of_birth,
            email,
            note,
            image,
        })
    }
}

/// Empty input means no date was picked.
pub fn parse_date_of_birth(raw: &str, earliest: NaiveDate) -> SubmissionResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        SubmissionError::InvalidField(format!("Date of Birth must be a date (YYYY-MM-DD), got '{}'.", raw))
    })?;

    if date < earliest {
        return Err(SubmissionError::InvalidField(format!(
            "Date of Birth cannot be earlier than {}.",
            earliest.format("%Y-%m-%d")
        )));
    }

    Ok(Some(date))
}

/// An empty file picker posts a nameless, empty part; that is "no image".
pub fn accept_image(part: ImagePart) -> SubmissionResult<Option<ImageUpload>> {
    let file_name = part.file_name.unwrap_or_default();
    if file_name.is_empty() && part.data.is_empty() {
        return Ok(None);
    }

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(SubmissionError::InvalidField(format!(
            "Image must be one of: {}.",
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )));
    }

    let content_type = part
        .content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| match extension.as_str() {
            "png" => mime::IMAGE_PNG.to_string(),
            _ => mime::IMAGE_JPEG.to_string(),
        });

    Ok(Some(ImageUpload {
        file_name,
        content_type,
        data: part.data,
    }))
}

/// Handle the form post and render the resulting page
pub async fn submit_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    tracing::info!("Received form submission");

    let collected = match collect_input(multipart, state.max_upload_bytes).await {
        Ok(collected) => collected,
        Err(CollectError { values, error }) => return error_page(&state, &values, &error),
    };

    if !collected.submitted {
        return page_response(&state, StatusCode::OK, &collected.values, None);
    }

    let values = collected.values.clone();
    let result = match collected.into_input(&state.form) {
        Ok(input) => state.submissions.submit(input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(submission) => {
            tracing::info!("Submitted successfully: image_path={}", submission.image_path);
            page_response(&state, StatusCode::OK, &values, Some(&Banner::Success))
        }
        Err(e) => error_page(&state, &values, &e),
    }
}

fn error_page(state: &AppState, values: &FormValues, err: &SubmissionError) -> Response {
    let common = CommonError::from(err);
    let status = StatusCode::from_u16(common.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let banner = if common.is_client_error() {
        if let SubmissionError::MissingField { field, .. } = err {
            tracing::warn!("Submission rejected, missing field: {}", field);
        } else {
            tracing::warn!("Submission rejected: {}", err);
        }
        Banner::ValidationError(err.user_message())
    } else {
        tracing::error!("Submission failed: {}", err);
        Banner::OperationError(err.user_message())
    };

    page_response(state, status, values, Some(&banner))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earliest() -> NaiveDate {
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
    }

    fn part(name: Option<&str>, content_type: Option<&str>, data: &'static [u8]) -> ImagePart {
        ImagePart {
            file_name: name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            data: Bytes::from_static(data),
        }
    }

    #[test]
    fn test_date_of_birth_parsing() {
        assert_eq!(parse_date_of_birth("", earliest()).unwrap(), None);
        assert_eq!(parse_date_of_birth("  ", earliest()).unwrap(), None);
        assert_eq!(
            parse_date_of_birth("1900-01-01", earliest()).unwrap(),
            NaiveDate::from_ymd_opt(1900, 1, 1)
        );
    }

    #[test]
    fn test_date_of_birth_lower_bound() {
        let err = parse_date_of_birth("1899-12-31", earliest()).unwrap_err();
        assert_eq!(err.to_string(), "Date of Birth cannot be earlier than 1900-01-01.");
    }

    #[test]
    fn test_date_of_birth_rejects_garbage() {
        let err = parse_date_of_birth("31/12/1980", earliest()).unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidField(_)));
    }

    #[test]
    fn test_empty_file_picker_means_no_image() {
        assert!(accept_image(part(Some(""), Some("application/octet-stream"), b""))
            .unwrap()
            .is_none());
        assert!(accept_image(part(None, None, b"")).unwrap().is_none());
    }

    #[test]
    fn test_image_extension_is_checked() {
        let err = accept_image(part(Some("cat.gif"), Some("image/gif"), b"GIF89a")).unwrap_err();
        assert_eq!(err.to_string(), "Image must be one of: jpg, jpeg, png.");

        assert!(accept_image(part(Some("noext"), None, b"x")).is_err());
        assert!(accept_image(part(Some("FACE.JPEG"), Some("image/jpeg"), b"x"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_content_type_falls_back_to_extension() {
        let png = accept_image(part(Some("face.png"), None, b"x")).unwrap().unwrap();
        assert_eq!(png.content_type, "image/png");

        let jpg = accept_image(part(Some("face.jpg"), Some(""), b"x")).unwrap().unwrap();
        assert_eq!(jpg.content_type, "image/jpeg");

        let declared = accept_image(part(Some("face.jpg"), Some("image/png"), b"x"))
            .unwrap()
            .unwrap();
        assert_eq!(declared.content_type, "image/png");
    }

    #[test]
    fn test_upload_too_large_message() {
        assert_eq!(
            upload_too_large(200 * 1024 * 1024),
            "Upload is too large; the limit is 200 MB."
        );
    }

    #[test]
    fn test_into_input_keeps_text_verbatim() {
        let collected = CollectedInput {
            values: FormValues {
                full_name: " Jane Doe ".to_string(),
                email: "not-an-email".to_string(),
                date_of_birth: "1985-03-07".to_string(),
                ..Default::default()
            },
            image: Some(part(Some("face.png"), Some("image/png"), b"x")),
            submitted: true,
        };

        let input = collected.into_input(&FormConfig::default()).unwrap();

        assert_eq!(input.full_name, " Jane Doe ");
        assert_eq!(input.email, "not-an-email");
        assert_eq!(input.date_of_birth, NaiveDate::from_ymd_opt(1985, 3, 7));
        assert!(input.image.is_some());
    }
}
