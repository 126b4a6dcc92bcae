use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::ServiceError;
use crate::services::{ResizeOptions, Rotation};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const CONFIG_DIR: &str = "config";

/// Where product documents live
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local tree, lost on exit
    #[default]
    Memory,
    /// Realtime-database REST endpoint
    Rest,
}

/// Product photo preprocessing settings
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ImageConfig {
    #[serde(default = "default_max_width")]
    #[validate(range(min = 1))]
    pub max_width: u32,

    #[serde(default = "default_max_height")]
    #[validate(range(min = 1))]
    pub max_height: u32,

    /// JPEG quality (1-100)
    #[serde(default = "default_quality")]
    #[validate(range(min = 1, max = 100))]
    pub quality: u8,

    /// Clockwise degrees: 0, 90, 180 or 270
    #[serde(default)]
    #[validate(custom = "validate_rotation")]
    pub rotation: u16,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            max_height: default_max_height(),
            quality: default_quality(),
            rotation: 0,
        }
    }
}

impl ImageConfig {
    pub fn resize_options(&self) -> Result<ResizeOptions, ServiceError> {
        Ok(ResizeOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            quality: self.quality,
            rotation: Rotation::try_from(self.rotation)?,
        })
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Document store backend
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Realtime database URL, required for the rest backend
    #[serde(default)]
    #[validate(url)]
    pub database_url: Option<String>,

    /// Database secret sent as the `auth` query parameter
    #[serde(default)]
    pub api_key: Option<String>,

    /// Cloud project identifier (informational)
    #[serde(default)]
    pub project_id: Option<String>,

    /// Store request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Image preprocessing
    #[serde(default)]
    #[validate]
    pub image: ImageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            database_url: None,
            api_key: None,
            project_id: None,
            request_timeout_secs: default_request_timeout_secs(),
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            image: ImageConfig::default(),
        }
    }
}

impl AppConfig {
    /// Checks if running in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.store_backend == StoreBackend::Rest {
            match self.database_url.as_deref() {
                Some(url) if url.starts_with("https://") || url.starts_with("http://") => {}
                _ => {
                    let mut err = ValidationError::new("database_url_required");
                    err.message = Some(
                        "The rest store backend needs APP__DATABASE_URL set to an http(s) URL"
                            .into(),
                    );
                    errors.add("database_url", err);
                }
            }
        }

        if self.is_production() && self.store_backend == StoreBackend::Memory {
            let mut err = ValidationError::new("memory_store_in_production");
            err.message =
                Some("The memory store loses all data on restart; use the rest backend".into());
            errors.add("store_backend", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_width() -> u32 {
    ResizeOptions::default().max_width
}

fn default_max_height() -> u32 {
    ResizeOptions::default().max_height
}

fn default_quality() -> u8 {
    ResizeOptions::default().quality
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_rotation(degrees: u16) -> Result<(), ValidationError> {
    if Rotation::try_from(degrees).is_ok() {
        Ok(())
    } else {
        let mut err = ValidationError::new("rotation");
        err.message = Some("Must be one of: 0, 90, 180, 270".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter.
///
/// Output goes to stderr so command output on stdout stays clean.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("inventory_admin={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::new(filter_directive);

    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    load_config_from(
        Path::new(CONFIG_DIR),
        &run_env,
        Environment::with_prefix("APP").separator("__"),
    )
}

/// Same layering as [`load_config`] with an explicit directory and env source.
pub fn load_config_from(
    dir: &Path,
    run_env: &str,
    env_source: Environment,
) -> Result<AppConfig, AppConfigError> {
    let config = Config::builder()
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&dir.join(run_env).to_string_lossy()).required(false))
        .add_source(env_source)
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration constraint validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(backend = ?app_config.store_backend, "Configuration loaded successfully");
    Ok(app_config)
}
