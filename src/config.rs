// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Configuration loaded from environment variables.
//!
//! Nothing here is secret: the GitHub credential and the data password come
//! from the user at runtime and live in the session, never in config.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration, loaded once by the host.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub REST API base URL (no trailing slash)
    pub github_api_url: String,
    /// Repository (owned by the authenticated user) that holds the data file
    pub repo_name: String,
    /// Path of the encrypted data file inside the repository
    pub data_file_path: String,
    /// Commit message used for every write
    pub commit_message: String,
    /// User-Agent header (GitHub rejects requests without one)
    pub user_agent: String,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Where the file-backed credential store keeps its data, if used
    pub credential_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_api_url: "https://api.github.com".to_string(),
            repo_name: "Matkarajad".to_string(),
            data_file_path: "data/user-data.json.encrypted".to_string(),
            commit_message: "Update user trail data".to_string(),
            user_agent: format!("matkarajad-sync/{}", env!("CARGO_PKG_VERSION")),
            http_timeout: Duration::from_secs(30),
            credential_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let http_timeout = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS", raw.clone()))?;
                if secs == 0 {
                    return Err(ConfigError::Invalid("HTTP_TIMEOUT_SECS", raw));
                }
                Duration::from_secs(secs)
            }
            Err(_) => defaults.http_timeout,
        };

        Ok(Self {
            github_api_url: env::var("GITHUB_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.github_api_url),
            repo_name: env::var("DATA_REPO_NAME")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.repo_name),
            data_file_path: env::var("DATA_FILE_PATH")
                .map(|v| v.trim().trim_matches('/').to_string())
                .unwrap_or(defaults.data_file_path),
            commit_message: env::var("COMMIT_MESSAGE").unwrap_or(defaults.commit_message),
            user_agent: env::var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            http_timeout,
            credential_file: env::var("CREDENTIAL_FILE").ok().map(PathBuf::from),
        })
    }

    /// Config pointing at a local mock server.
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            github_api_url: api_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
