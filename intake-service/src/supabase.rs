// Shared HTTP plumbing for the Supabase storage and PostgREST endpoints

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::config::SupabaseConfig;

/// Authenticated handle on one Supabase project
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, reqwest::Error> {
        // No request timeout: a hung backend hangs the submission.
        let http_client = Client::builder()
            .user_agent(concat!("intake-service/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.anon_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST to a path under the project URL with the project's credentials
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.http_client
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Consume a non-success response and pull out the backend's error text.
///
/// Storage answers `{"statusCode", "error", "message"}`, PostgREST answers
/// `{"code", "message", "details", "hint"}`; anything else is returned raw.
pub async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody { message: Some(message), .. }) => message,
        Ok(ErrorBody { error: Some(error), .. }) => error,
        _ if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        _ => body,
    }
}
