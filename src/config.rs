use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use crate::extraction::DEFAULT_LIBREOFFICE_BINARY;

/// Base URL of the hosted Gemini API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_LIBREOFFICE_TIMEOUT_SECS: u64 = 120;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docbrief server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the generative service: an API key or an ambient access token.
    pub gemini_api_key: Option<String>,
    /// Optional model tried before the built-in fallback chain.
    pub gemini_model: Option<String>,
    /// Base URL of the generative service.
    pub gemini_base_url: String,
    /// Upper bound for a single model attempt.
    pub gemini_timeout: Duration,
    /// Largest upload accepted by the HTTP surface.
    pub max_upload_bytes: usize,
    /// Directory where uploaded originals are staged.
    pub upload_dir: PathBuf,
    /// LibreOffice binary used for legacy Word conversion.
    pub libreoffice_path: PathBuf,
    /// Upper bound for a LibreOffice legacy Word conversion.
    pub libreoffice_timeout: Duration,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            gemini_api_key: load_env_optional("GEMINI_API_KEY"),
            gemini_model: load_env_optional("GEMINI_MODEL"),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_timeout: Duration::from_secs(
                load_parsed("GEMINI_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_upload_bytes: load_parsed("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string())
                .into(),
            libreoffice_path: load_env_optional("LIBREOFFICE_PATH")
                .unwrap_or_else(|| DEFAULT_LIBREOFFICE_BINARY.to_string())
                .into(),
            libreoffice_timeout: Duration::from_secs(
                load_parsed("LIBREOFFICE_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_LIBREOFFICE_TIMEOUT_SECS),
            ),
            server_port: load_parsed("SERVER_PORT")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: DEFAULT_UPLOAD_DIR.into(),
            libreoffice_path: DEFAULT_LIBREOFFICE_BINARY.into(),
            libreoffice_timeout: Duration::from_secs(DEFAULT_LIBREOFFICE_TIMEOUT_SECS),
            server_port: None,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn load_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        base_url = %config.gemini_base_url,
        model_override = ?config.gemini_model,
        has_credential = config.gemini_api_key.is_some(),
        timeout_secs = config.gemini_timeout.as_secs(),
        max_upload_bytes = config.max_upload_bytes,
        upload_dir = %config.upload_dir.display(),
        libreoffice_path = %config.libreoffice_path.display(),
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
