use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, path::Path, process, sync::Arc};
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod storage;
mod supabase;

use config::{Config, FormConfig};
use handlebars::Handlebars;
use db::PostgrestRepository;
use services::SubmissionService;
use shared::observability::{init_logging, LogConfig};
use storage::SupabaseStorage;
use supabase::SupabaseClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub submissions: Arc<SubmissionService>,
    pub templates: Arc<Handlebars<'static>>,
    pub form: FormConfig,
    pub max_upload_bytes: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_logging(LogConfig::from_env("intake-service"))?;

    tracing::info!("Starting Intake Service...");

    // Missing credentials are fatal: the form is never served without them
    let config = match Config::load(Path::new(config::DEFAULT_SECRETS_PATH)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    };
    tracing::info!("Configuration loaded successfully");

    let client = SupabaseClient::new(&config.supabase)?;
    let submissions = SubmissionService::new(
        Arc::new(SupabaseStorage::new(client.clone())),
        Arc::new(PostgrestRepository::new(client)),
    );
    tracing::info!("Supabase clients initialized for {}", config.supabase.url);

    let templates = handlers::form::templates()
        .map_err(|e| anyhow::anyhow!("Failed to register templates: {}", e))?;

    let state = AppState {
        submissions: Arc::new(submissions),
        templates: Arc::new(templates),
        form: config.form.clone(),
        max_upload_bytes: config.server.max_upload_bytes,
    };

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Intake Service listening on {}", addr);

    // Run the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::form::show_form))
        .route("/submit", post(handlers::submission::submit_form))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "Intake Service is healthy"
}
