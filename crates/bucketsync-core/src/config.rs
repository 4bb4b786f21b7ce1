//! Configuration module for BucketSync.
//!
//! Typed configuration structs that map to the YAML configuration file, with
//! loading, validation, defaults, and a builder for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::acl::PredefinedAcl;
use crate::domain::errors::SyncError;
use crate::domain::policy::UploadPolicy;

/// Default number of parallel upload workers for a tree upload.
pub const DEFAULT_UPLOAD_THREADS: usize = 10;

/// Default environment variable holding a bearer token.
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "BUCKETSYNC_ACCESS_TOKEN";

/// Default JSON API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for BucketSync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transfer: TransferConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Upload and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Number of parallel workers for tree uploads.
    pub concurrency: usize,
    /// Default upload policy: `always`, `if-new`, or `if-modified`.
    pub upload_if: String,
    /// Attempts per file before it is reported as failed.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay_ms: u64,
    /// Canned ACL applied to newly created objects, e.g. `public-read`.
    pub predefined_acl: Option<String>,
}

/// Backend endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the JSON API.
    pub endpoint: String,
    /// File with `key = value` lines holding `gs_access_token`.
    pub credentials_file: Option<PathBuf>,
    /// Environment variable consulted for a bearer token.
    pub access_token_env: String,
    /// Allow unauthenticated requests when no credentials are found.
    pub anonymous: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/bucketsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bucketsync")
            .join("config.yaml")
    }

    /// The configured default upload policy.
    pub fn upload_policy(&self) -> Result<UploadPolicy, SyncError> {
        self.transfer.upload_if.parse()
    }

    /// The configured predefined ACL, if any.
    pub fn predefined_acl(&self) -> Result<Option<PredefinedAcl>, SyncError> {
        self.transfer
            .predefined_acl
            .as_deref()
            .map(str::parse)
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_UPLOAD_THREADS,
            upload_if: UploadPolicy::Always.to_string(),
            max_attempts: 5,
            base_delay_ms: 1000,
            predefined_acl: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credentials_file: None,
            access_token_env: DEFAULT_ACCESS_TOKEN_ENV.to_string(),
            anonymous: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"transfer.concurrency"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- transfer ---
        if self.transfer.concurrency == 0 {
            errors.push(ValidationError {
                field: "transfer.concurrency".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Err(e) = self.upload_policy() {
            errors.push(ValidationError {
                field: "transfer.upload_if".into(),
                message: format!("{e}; valid options: always, if-new, if-modified"),
            });
        }
        if self.transfer.max_attempts == 0 {
            errors.push(ValidationError {
                field: "transfer.max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Err(e) = self.predefined_acl() {
            let valid: Vec<&str> = PredefinedAcl::ALL.iter().map(|a| a.as_str()).collect();
            errors.push(ValidationError {
                field: "transfer.predefined_acl".into(),
                message: format!("{e}; valid options: {}", valid.join(", ")),
            });
        }

        // --- storage ---
        if !self.storage.endpoint.starts_with("http://")
            && !self.storage.endpoint.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "storage.endpoint".into(),
                message: format!("not an http(s) URL: {}", self.storage.endpoint),
            });
        }
        if let Some(file) = &self.storage.credentials_file {
            let file_str = file.to_string_lossy();
            if !file_str.starts_with('~') && !file.exists() {
                errors.push(ValidationError {
                    field: "storage.credentials_file".into(),
                    message: format!("file does not exist: {}", file.display()),
                });
            }
        }
        if self.storage.access_token_env.is_empty() {
            errors.push(ValidationError {
                field: "storage.access_token_env".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use bucketsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .transfer_concurrency(4)
///     .transfer_upload_if("if-modified")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- transfer ---

    pub fn transfer_concurrency(mut self, n: usize) -> Self {
        self.config.transfer.concurrency = n;
        self
    }

    pub fn transfer_upload_if(mut self, policy: impl Into<String>) -> Self {
        self.config.transfer.upload_if = policy.into();
        self
    }

    pub fn transfer_max_attempts(mut self, n: u32) -> Self {
        self.config.transfer.max_attempts = n;
        self
    }

    pub fn transfer_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.transfer.base_delay_ms = ms;
        self
    }

    pub fn transfer_predefined_acl(mut self, acl: impl Into<String>) -> Self {
        self.config.transfer.predefined_acl = Some(acl.into());
        self
    }

    // --- storage ---

    pub fn storage_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.storage.endpoint = endpoint.into();
        self
    }

    pub fn storage_credentials_file(mut self, file: PathBuf) -> Self {
        self.config.storage.credentials_file = Some(file);
        self
    }

    pub fn storage_access_token_env(mut self, var: impl Into<String>) -> Self {
        self.config.storage.access_token_env = var.into();
        self
    }

    pub fn storage_anonymous(mut self, anonymous: bool) -> Self {
        self.config.storage.anonymous = anonymous;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
