//! Application configuration.
//!
//! One process-wide [`Config`] is constructed at startup and handed to the
//! storage and AI clients by dependency injection; no component reads the
//! environment on its own.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// AI responder configuration.
    pub ai: AiConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Authentication configuration.
///
/// Token issuance lives elsewhere; this service only validates the access
/// token carried in a cookie.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to validate JWT access tokens.
    pub jwt_secret: String,
    /// Name of the cookie carrying the access token.
    #[serde(default = "default_access_cookie")]
    pub access_cookie: String,
}

/// Object storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind: "local" or "s3".
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Base path for local storage.
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    /// Base URL for serving locally stored files.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub s3_endpoint: Option<String>,
    /// S3 bucket name.
    #[serde(default)]
    pub s3_bucket: Option<String>,
    /// S3 region.
    #[serde(default)]
    pub s3_region: Option<String>,
    /// S3 access key ID.
    #[serde(default)]
    pub s3_access_key_id: Option<String>,
    /// S3 secret access key.
    #[serde(default)]
    pub s3_secret_access_key: Option<String>,
    /// Public URL prefix for S3-served files.
    #[serde(default)]
    pub s3_public_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            base_path: default_storage_path(),
            base_url: default_storage_url(),
            s3_endpoint: None,
            s3_bucket: None,
            s3_region: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            s3_public_url: None,
        }
    }
}

/// AI responder configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Whether AI responses are generated at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// API key for the OpenAI-compatible endpoint.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Chat-completions base URL.
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Request timeout in seconds. The selection transition never waits on
    /// this; it bounds the background generation call.
    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,
    /// Maximum response tokens.
    #[serde(default = "default_ai_max_tokens")]
    pub max_tokens: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_access_cookie() -> String {
    "access".to_string()
}

fn default_storage_backend() -> String {
    "local".to_string()
}

fn default_storage_path() -> String {
    "./files".to_string()
}

fn default_storage_url() -> String {
    "/files".to_string()
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_ai_timeout() -> u64 {
    30
}

const fn default_ai_max_tokens() -> u32 {
    300
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `HUNSUKING_ENV`)
    /// 3. Environment variables with `HUNSUKING_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("HUNSUKING_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HUNSUKING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("HUNSUKING")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
