//! HTTP implementation of [`RemoteRepository`] for the GitHub REST API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::RemoteRepository;
use crate::error::{Error, Result};
use crate::types::{GithubBranch, GithubTag, RepositoryInfo};

/// Public GitHub API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("rayext/", env!("CARGO_PKG_VERSION"));

const PAGE_SIZE: usize = 100;

/// GitHub API client with bounded retries.
///
/// Every request is attempted once plus up to `retries` more times with
/// exponential backoff. `404` is never retried.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
    retries: u32,
    initial_backoff: Duration,
}

impl GithubClient {
    /// Create a client against the public API.
    pub fn new(token: Option<String>, retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            retries,
            initial_backoff: Duration::from_millis(500),
        })
    }

    /// Point the client at a different API base (GitHub Enterprise, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the first backoff interval.
    pub fn with_initial_backoff(mut self, interval: Duration) -> Self {
        self.initial_backoff = interval;
        self
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a GET request, retrying transient failures.
    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let attempts = AtomicU32::new(0);
        let retries = self.retries;
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(None)
            .build();

        backoff::future::retry(policy, || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let request = self.request(url);
            let url = url.to_string();
            async move {
                tracing::debug!(%url, attempt, "GET");
                let give_up = attempt > retries;
                match request.send().await {
                    Ok(response) if response.status().is_success() => Ok(response),
                    Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                        Err(backoff::Error::permanent(Error::NotFound { url }))
                    }
                    Ok(response) => {
                        let status = response.status();
                        let err = Error::Http {
                            url,
                            status: status.as_u16(),
                        };
                        if give_up || !is_retryable(status) {
                            Err(backoff::Error::permanent(err))
                        } else {
                            tracing::warn!(status = status.as_u16(), attempt, "retrying request");
                            Err(backoff::Error::transient(err))
                        }
                    }
                    Err(e) => {
                        let err = Error::Network {
                            url,
                            attempts: attempt,
                            message: e.to_string(),
                        };
                        if give_up {
                            Err(backoff::Error::permanent(err))
                        } else {
                            tracing::warn!(error = %e, attempt, "retrying request");
                            Err(backoff::Error::transient(err))
                        }
                    }
                }
            }
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(url).await?;
        response.json::<T>().await.map_err(|e| Error::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch every page of a list endpoint.
    async fn get_paginated<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let page_url = format!("{url}?per_page={PAGE_SIZE}&page={page}");
            let batch: Vec<T> = self.get_json(&page_url).await?;
            let len = batch.len();
            items.extend(batch);
            if len < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

/// Statuses worth another attempt: throttling and server-side failures.
fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::FORBIDDEN
}

#[async_trait]
impl RemoteRepository for GithubClient {
    async fn tags(&self, repo: &str) -> Result<Vec<GithubTag>> {
        self.get_paginated(&format!("{}/repos/{repo}/tags", self.api_base))
            .await
    }

    async fn branches(&self, repo: &str) -> Result<Vec<GithubBranch>> {
        self.get_paginated(&format!("{}/repos/{repo}/branches", self.api_base))
            .await
    }

    async fn default_branch(&self, repo: &str) -> Result<String> {
        let info: RepositoryInfo = self
            .get_json(&format!("{}/repos/{repo}", self.api_base))
            .await?;
        Ok(info.default_branch)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url).await?;
        let bytes = response.bytes().await.map_err(|e| Error::Network {
            url: url.to_string(),
            attempts: 1,
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    fn branch_archive_url(&self, repo: &str, branch: &str) -> String {
        format!("{}/repos/{repo}/zipball/{branch}", self.api_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn test_branch_archive_url() {
        let client = GithubClient::new(None, 0)
            .unwrap()
            .with_api_base("http://localhost:9/");
        assert_eq!(
            client.branch_archive_url("owner/demo", "main"),
            "http://localhost:9/repos/owner/demo/zipball/main"
        );
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let client = GithubClient::new(Some("  ".into()), 3).unwrap();
        assert!(client.token.is_none());
        assert_eq!(client.retries(), 3);
    }
}
