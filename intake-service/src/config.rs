use chrono::NaiveDate;
use std::env;
use std::path::Path;
use url::Url;

/// Secrets file read at startup, relative to the working directory.
pub const DEFAULT_SECRETS_PATH: &str = "secrets.toml";

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";

/// Application configuration, built once in `main`
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub supabase: SupabaseConfig,
    pub form: FormConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Earliest selectable date of birth.
    pub min_birth_date: NaiveDate,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8501,
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            min_birth_date: NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl Config {
    /// Load configuration from the secrets file and the process environment.
    ///
    /// Environment variables win over the secrets file. A missing file is
    /// not an error by itself; it only matters when the environment does
    /// not provide the backend credentials either.
    pub fn load(secrets_path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(secrets_path, |key| env::var(key).ok())
    }

    /// Same as [`Config::load`], with the environment supplied as a lookup.
    pub fn load_with<F>(secrets_path: &Path, env_lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secrets = match std::fs::read_to_string(secrets_path) {
            Ok(contents) => Some(
                contents
                    .parse::<toml::Table>()
                    .map_err(|e| ConfigError::Unreadable(e.to_string()))?,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(ConfigError::Unreadable(e.to_string())),
        };

        Self::from_sources(secrets.as_ref(), env_lookup)
    }

    /// Build configuration from an optional secrets table and a variable lookup.
    pub fn from_sources<F>(secrets: Option<&toml::Table>, env_lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| -> Option<String> {
            env_lookup(key)
                .or_else(|| secrets.and_then(|table| table.get(key)).map(toml_to_string))
                .filter(|value| !value.trim().is_empty())
        };

        let url = lookup(SUPABASE_URL);
        let anon_key = lookup(SUPABASE_ANON_KEY);

        let supabase = match (url, anon_key) {
            (Some(url), Some(anon_key)) => SupabaseConfig { url, anon_key },
            (None, None) if secrets.is_none() => return Err(ConfigError::Missing),
            (url, anon_key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(SUPABASE_URL);
                }
                if anon_key.is_none() {
                    missing.push(SUPABASE_ANON_KEY);
                }
                return Err(ConfigError::Incomplete(missing));
            }
        };

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port: parse_or("SERVER_PORT", lookup("SERVER_PORT"), defaults.port)?,
            max_upload_bytes: parse_or::<usize>("MAX_UPLOAD_MB", lookup("MAX_UPLOAD_MB"), 200)?
                .saturating_mul(1024 * 1024),
        };

        let form = FormConfig {
            min_birth_date: match lookup("MIN_BIRTH_DATE") {
                Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    ConfigError::Invalid(format!("MIN_BIRTH_DATE must be YYYY-MM-DD, got '{}'", raw))
                })?,
                None => FormConfig::default().min_birth_date,
            },
        };

        let config = Config { server, supabase, form };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.supabase.url)
            .map_err(|e| ConfigError::Invalid(format!("{} is not a valid URL: {}", SUPABASE_URL, e)))?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "{} must be an http(s) URL with a host",
                SUPABASE_URL
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::Invalid("SERVER_PORT must be > 0".to_string()));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("MAX_UPLOAD_MB must be > 0".to_string()));
        }

        Ok(())
    }
}

fn toml_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Secrets not found. Set SUPABASE_URL and SUPABASE_ANON_KEY in secrets.toml or the environment.")]
    Missing,

    #[error("Secrets found, but keys are missing: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read secrets file: {0}")]
    Unreadable(String),
}
