//! HTTP client for the progress service REST API.
//!
//! One JSON document per user, read and replaced whole. Writes retry
//! transient failures with capped exponential backoff before giving up;
//! the sync coordinator handles anything that still fails.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio::time::sleep;

use stridequest_core::challenges::ProgressRecord;
use stridequest_core::sync::{RemoteProgressStore, UserProgress};

use crate::error::{ConnectError, Result};
use crate::types::{ApiErrorResponse, ListProgressResponse, ProgressDocument};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;
const WRITE_MAX_ATTEMPTS: usize = 5;
const WRITE_BASE_BACKOFF_MS: u64 = 250;
const WRITE_MAX_BACKOFF_MS: u64 = 8_000;

fn is_retryable_write_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

fn is_retryable_transport_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

fn write_backoff_with_jitter(attempt: usize) -> Duration {
    let exp = (attempt.saturating_sub(1) as u32).min(8);
    let backoff =
        (WRITE_BASE_BACKOFF_MS.saturating_mul(1_u64 << exp)).min(WRITE_MAX_BACKOFF_MS);
    let jitter = rand::thread_rng().gen_range(0..=(backoff / 5).max(1));
    Duration::from_millis(backoff.saturating_add(jitter))
}

/// Client for the progress service API.
#[derive(Debug, Clone)]
pub struct ConnectClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    username: Option<String>,
}

impl ConnectClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the progress service (e.g., "https://api.stridequest.app")
    /// * `token` - Bearer token identifying the caller
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            username: None,
        })
    }

    /// Attach a display name, stored alongside the user's document so the
    /// leaderboard has something better than a raw user ID to show.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ConnectError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn document_url(&self, user_id: &str) -> Result<String> {
        if user_id.is_empty() || user_id.contains('/') {
            return Err(ConnectError::invalid_request(format!(
                "Invalid user ID: '{}'",
                user_id
            )));
        }
        Ok(format!("{}/v1/progress/{}", self.base_url, user_id))
    }

    fn log_response(status: StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    fn error_from_body(status: u16, body: &str) -> ConnectError {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            return ConnectError::api(status, format!("{}: {}", error.code, error.message));
        }
        ConnectError::api(status, format!("Request failed: {}", body))
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            ConnectError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Fetch a user's progress document.
    ///
    /// Returns `None` when the service has never seen this user.
    ///
    /// GET /v1/progress/{userId}
    pub async fn read_progress(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        let url = self.document_url(user_id)?;

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("No remote progress document for user '{}'", user_id);
            return Ok(None);
        }

        let document: ProgressDocument = Self::parse_response(response).await?;
        Ok(Some(document.progress))
    }

    /// Replace a user's progress document.
    ///
    /// Retries transient failures (408, 429, 5xx, transport errors) with
    /// exponential backoff and jitter before surfacing the error.
    ///
    /// PUT /v1/progress/{userId}
    pub async fn write_progress(&self, user_id: &str, record: &ProgressRecord) -> Result<()> {
        let url = self.document_url(user_id)?;
        let document = ProgressDocument {
            user_id: user_id.to_string(),
            username: self.username.clone(),
            progress: record.clone(),
        };

        let mut attempt = 0usize;
        loop {
            attempt = attempt.saturating_add(1);

            let send_result = self
                .client
                .put(&url)
                .headers(self.headers()?)
                .json(&document)
                .send()
                .await;

            match send_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!("Wrote progress document for user '{}'", user_id);
                        return Ok(());
                    }

                    let body = response.text().await?;
                    Self::log_response(status, &body);
                    let error = Self::error_from_body(status.as_u16(), &body);

                    if is_retryable_write_status(status.as_u16()) && attempt < WRITE_MAX_ATTEMPTS
                    {
                        debug!(
                            "Progress write retry attempt {}/{} after HTTP {} (user={})",
                            attempt + 1,
                            WRITE_MAX_ATTEMPTS,
                            status.as_u16(),
                            user_id
                        );
                        sleep(write_backoff_with_jitter(attempt)).await;
                        continue;
                    }
                    return Err(error);
                }
                Err(err) => {
                    if is_retryable_transport_error(&err) && attempt < WRITE_MAX_ATTEMPTS {
                        debug!(
                            "Progress write retry attempt {}/{} after transport error (user={}): {}",
                            attempt + 1,
                            WRITE_MAX_ATTEMPTS,
                            user_id,
                            err
                        );
                        sleep(write_backoff_with_jitter(attempt)).await;
                        continue;
                    }
                    return Err(ConnectError::Http(err));
                }
            }
        }
    }

    /// Fetch every stored progress document.
    ///
    /// GET /v1/progress
    pub async fn list_progress(&self) -> Result<Vec<ProgressDocument>> {
        let url = format!("{}/v1/progress", self.base_url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await?;

        let list: ListProgressResponse = Self::parse_response(response).await?;
        Ok(list.documents)
    }
}

#[async_trait]
impl RemoteProgressStore for ConnectClient {
    async fn read(&self, user_id: &str) -> stridequest_core::Result<Option<ProgressRecord>> {
        self.read_progress(user_id).await.map_err(Into::into)
    }

    async fn write(
        &self,
        user_id: &str,
        record: &ProgressRecord,
    ) -> stridequest_core::Result<()> {
        self.write_progress(user_id, record).await.map_err(Into::into)
    }

    async fn list_all(&self) -> stridequest_core::Result<Vec<UserProgress>> {
        let documents = self
            .list_progress()
            .await
            .map_err(stridequest_core::Error::from)?;
        Ok(documents.into_iter().map(UserProgress::from).collect())
    }
}
