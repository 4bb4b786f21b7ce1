//! Access token discovery
//!
//! Sources are tried in order:
//!
//! 1. `storage.credentials_file`: `key = value` lines, `gs_access_token` is
//!    the bearer token. `[section]` headers and `#`/`;` comments are ignored,
//!    so boto-style files work unchanged.
//! 2. The environment variable named by `storage.access_token_env`.
//! 3. Anonymous access, only when `storage.anonymous` is set.
//!
//! A configured credentials file that cannot be read is an error, never a
//! silent fall-through to the next source.

use std::path::{Path, PathBuf};

use bucketsync_core::config::StorageConfig;
use bucketsync_core::domain::SyncError;
use tracing::{debug, warn};

/// Key holding the bearer token in a credentials file
pub const TOKEN_KEY: &str = "gs_access_token";

/// How requests are authenticated
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth2 bearer token
    AccessToken(String),
    /// No Authorization header (public buckets only)
    Anonymous,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Credentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

impl Credentials {
    /// Resolves credentials from the `storage` config section
    pub fn from_config(storage: &StorageConfig) -> Result<Self, SyncError> {
        Self::resolve(storage, |name| std::env::var(name).ok())
    }

    /// Like [`Credentials::from_config`] with an injectable environment
    pub fn resolve(
        storage: &StorageConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SyncError> {
        if let Some(file) = &storage.credentials_file {
            let path = expand_home(file);
            debug!(path = %path.display(), "reading credentials file");
            let content =
                std::fs::read_to_string(&path).map_err(|e| SyncError::local_io(&path, e))?;
            return match parse_token(&content) {
                Some(token) => Ok(Credentials::AccessToken(token)),
                None => Err(SyncError::Configuration(format!(
                    "{} has no {TOKEN_KEY} entry",
                    path.display()
                ))),
            };
        }

        if let Some(token) = env(&storage.access_token_env).filter(|t| !t.trim().is_empty()) {
            debug!(var = %storage.access_token_env, "using access token from environment");
            return Ok(Credentials::AccessToken(token.trim().to_string()));
        }

        if storage.anonymous {
            warn!("No credentials found, sending unauthenticated requests");
            return Ok(Credentials::Anonymous);
        }

        Err(SyncError::Configuration(format!(
            "no credentials: set ${} or storage.credentials_file, or enable storage.anonymous",
            storage.access_token_env
        )))
    }

    /// The bearer token, if any
    pub fn token(&self) -> Option<&str> {
        match self {
            Credentials::AccessToken(token) => Some(token),
            Credentials::Anonymous => None,
        }
    }
}

fn parse_token(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(['#', ';', '[']))
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == TOKEN_KEY)
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
