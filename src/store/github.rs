// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GitHub Contents API client.
//!
//! Handles:
//! - Credential check via `GET /user`
//! - Reading the data file (404 means "not written yet")
//! - Conditional writes keyed on the blob SHA
//! - Rate limit detection (reported, never retried here)

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{CasToken, Principal, RemoteResource};
use crate::store::ResourceStore;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Store backed by a file in a repository owned by the principal.
#[derive(Clone)]
pub struct GitHubStore {
    http: reqwest::Client,
    base_url: String,
    repo_name: String,
    data_file_path: String,
    commit_message: String,
}

impl GitHubStore {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.github_api_url.trim_end_matches('/').to_string(),
            repo_name: config.repo_name.clone(),
            data_file_path: config.data_file_path.clone(),
            commit_message: config.commit_message.clone(),
        })
    }

    /// `{base}/repos/{owner}/{repo}/contents/{path}` with every segment escaped.
    pub fn contents_url(&self, owner: &str) -> String {
        let path = self
            .data_file_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(&self.repo_name),
            path
        )
    }

    /// Build a human-readable reason from a failed response.
    async fn failure_reason(response: reqwest::Response) -> String {
        let status = response.status();
        if is_rate_limited(&response) {
            tracing::warn!(status = %status, "GitHub rate limit hit");
            return AppError::RATE_LIMITED.to_string();
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);

        format!("HTTP {}: {}", status, message)
    }
}

#[async_trait]
impl ResourceStore for GitHubStore {
    async fn authenticate(&self, credential: &str) -> Result<Principal> {
        let url = format!("{}/user", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "GitHub identity request failed");
                AppError::InvalidCredential
            })?;

        if !response.status().is_success() {
            tracing::info!(status = %response.status(), "GitHub rejected credential");
            return Err(AppError::InvalidCredential);
        }

        let user: GitHubUser = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Unexpected GitHub /user response");
            AppError::InvalidCredential
        })?;

        tracing::info!(login = %user.login, "GitHub credential verified");
        Ok(Principal::new(user.login, credential))
    }

    async fn read_resource(&self, principal: &Principal) -> Result<RemoteResource> {
        let url = self.contents_url(&principal.login);

        let response = self
            .http
            .get(&url)
            .bearer_auth(principal.credential())
            .send()
            .await
            .map_err(|e| AppError::ReadFailed(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = %status, "GitHub contents read");

        if status == StatusCode::NOT_FOUND {
            return Ok(RemoteResource::absent());
        }

        if !status.is_success() {
            return Err(AppError::ReadFailed(Self::failure_reason(response).await));
        }

        let file: ContentsResponse = response
            .json()
            .await
            .map_err(|e| AppError::ReadFailed(format!("JSON parse error: {}", e)))?;

        let encoded = match file.content {
            Some(content) if file.encoding.as_deref() != Some("none") => content,
            _ => {
                return Err(AppError::ReadFailed(
                    "Contents API returned no inline content".to_string(),
                ))
            }
        };

        // GitHub wraps base64 at 60 columns.
        let compact: String = encoded.split_whitespace().collect();
        let content = BASE64
            .decode(compact)
            .map_err(|e| AppError::ReadFailed(format!("Base64 decode failed: {}", e)))?;

        Ok(RemoteResource::present(content, CasToken::new(file.sha)))
    }

    async fn write_resource(
        &self,
        principal: &Principal,
        content: &[u8],
        token: Option<&CasToken>,
    ) -> Result<CasToken> {
        let url = self.contents_url(&principal.login);

        let body = PutContentsRequest {
            message: &self.commit_message,
            content: BASE64.encode(content),
            sha: token.map(CasToken::as_str),
        };

        let response = self
            .http
            .put(&url)
            .bearer_auth(principal.credential())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::WriteFailed(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = %status, has_token = token.is_some(), "GitHub contents write");

        match status {
            StatusCode::OK | StatusCode::CREATED => {
                let written: PutContentsResponse = response
                    .json()
                    .await
                    .map_err(|e| AppError::WriteFailed(format!("JSON parse error: {}", e)))?;
                Ok(CasToken::new(written.content.sha))
            }
            // Stale SHA. An uninitialized repository also answers 409 but is
            // not a version race.
            StatusCode::CONFLICT => {
                let reason = Self::failure_reason(response).await;
                if reason.contains("Repository is empty") {
                    return Err(AppError::WriteFailed(reason));
                }
                tracing::warn!(owner = %principal.login, "Write rejected: stale token");
                Err(AppError::WriteConflict)
            }
            // Creating without a SHA while the file already exists.
            StatusCode::UNPROCESSABLE_ENTITY if token.is_none() => {
                tracing::warn!(owner = %principal.login, "Write rejected: file already exists");
                Err(AppError::WriteConflict)
            }
            _ => Err(AppError::WriteFailed(Self::failure_reason(response).await)),
        }
    }
}

fn is_rate_limited(response: &reqwest::Response) -> bool {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0")
}

/// `GET /user` response (only what we use).
#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

/// `GET /repos/{owner}/{repo}/contents/{path}` response for a file.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: WrittenFile,
}

#[derive(Debug, Deserialize)]
struct WrittenFile {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: Option<String>,
}
