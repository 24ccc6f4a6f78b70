use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

use crate::config::FormConfig;
use crate::models::{FormValues, ALLOWED_IMAGE_EXTENSIONS};
use crate::AppState;

const FORM_TEMPLATE: &str = "form";

/// Status line shown above the form after a submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    ValidationError(String),
    OperationError(String),
    Success,
}

/// Template context for one rendering of the page
#[derive(Debug, Serialize)]
struct FormPage<'a> {
    values: &'a FormValues,
    min_date: String,
    accept: String,
    validation_error: Option<&'a str>,
    operation_error: Option<&'a str>,
    success: bool,
}

impl<'a> FormPage<'a> {
    fn new(values: &'a FormValues, banner: Option<&'a Banner>, form: &FormConfig) -> Self {
        let accept = ALLOWED_IMAGE_EXTENSIONS
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(",");

        let mut page = Self {
            values,
            min_date: form.min_birth_date.format("%Y-%m-%d").to_string(),
            accept,
            validation_error: None,
            operation_error: None,
            success: false,
        };
        match banner {
            Some(Banner::ValidationError(msg)) => page.validation_error = Some(msg.as_str()),
            Some(Banner::OperationError(msg)) => page.operation_error = Some(msg.as_str()),
            Some(Banner::Success) => page.success = true,
            None => {}
        }
        page
    }
}

/// Build the template engine with the form page registered
pub fn templates() -> Result<Handlebars<'static>, TemplateError> {
    let mut engine = Handlebars::new();
    register_templates(&mut engine)?;
    Ok(engine)
}

fn register_templates(engine: &mut Handlebars) -> Result<(), TemplateError> {
    engine.register_template_string(FORM_TEMPLATE, include_str!("../../templates/form.hbs"))
}

/// Render the blank form
pub async fn show_form(State(state): State<AppState>) -> Response {
    page_response(&state, StatusCode::OK, &FormValues::default(), None)
}

pub fn render_page(
    engine: &Handlebars,
    values: &FormValues,
    banner: Option<&Banner>,
    form: &FormConfig,
) -> Result<String, RenderError> {
    engine.render(FORM_TEMPLATE, &FormPage::new(values, banner, form))
}

/// Render the page with the given status; a template failure becomes a bare 500
pub fn page_response(
    state: &AppState,
    status: StatusCode,
    values: &FormValues,
    banner: Option<&Banner>,
) -> Response {
    match render_page(&state.templates, values, banner, &state.form) {
        Ok(page) => (status, Html(page)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render form page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(values: &FormValues, banner: Option<&Banner>) -> String {
        let engine = templates().unwrap();
        render_page(&engine, values, banner, &FormConfig::default()).unwrap()
    }

    #[test]
    fn test_blank_form_lists_fields() {
        let page = render(&FormValues::default(), None);

        for name in [
            "full_name",
            "nic",
            "nationality",
            "alias",
            "date_of_birth",
            "email",
            "note",
            "image",
            "submit",
        ] {
            assert!(page.contains(&format!(r#"name="{}""#, name)), "missing field {name}");
        }
        assert!(page.contains("<title>Public Form</title>"));
        assert!(page.contains(r#"min="1900-01-01""#));
        assert!(page.contains(r#"accept=".jpg,.jpeg,.png""#));
        assert!(!page.contains("banner error"));
        assert!(!page.contains("banner success"));
    }

    #[test]
    fn test_values_are_escaped() {
        let values = FormValues {
            full_name: r#"<script>"x"</script>"#.to_string(),
            note: "a & b".to_string(),
            ..Default::default()
        };
        let page = render(&values, None);

        assert!(page.contains("&lt;script&gt;&quot;x&quot;&lt;/script&gt;"));
        assert!(page.contains(">a &amp; b</textarea>"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_values_are_refilled() {
        let values = FormValues {
            nic: "901234567V".to_string(),
            date_of_birth: "1985-03-07".to_string(),
            ..Default::default()
        };
        let page = render(&values, None);

        assert!(page.contains(r#"name="nic" value="901234567V""#));
        assert!(page.contains(r#"value="1985-03-07""#));
    }

    #[test]
    fn test_banners() {
        let values = FormValues::default();

        let page = render(&values, Some(&Banner::Success));
        assert!(page.contains("Submitted Successfully!"));
        assert!(!page.contains("banner error"));

        let page = render(
            &values,
            Some(&Banner::OperationError("An error occurred: <boom>".to_string())),
        );
        assert!(page.contains("An error occurred: &lt;boom&gt;"));
        assert!(!page.contains("&#9888;"));

        let page = render(
            &values,
            Some(&Banner::ValidationError("Full Name is required.".to_string())),
        );
        assert!(page.contains("&#9888;&#65039; Full Name is required."));
        assert!(!page.contains("Submitted Successfully!"));
    }
}
