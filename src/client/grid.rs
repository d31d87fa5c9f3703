//! Session gateway client
//!
//! Typed operations against the grid's WebDriver-style session API:
//! create, poll logs, delete, fetch report.

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GridEndpoints;
use crate::models::{LogEntry, SpecFile};

/// Session client errors
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Failed to create session for {spec}: {message}")]
    SessionCreateFailed { spec: String, message: String },

    #[error("Failed to poll session {session_id}: {message}")]
    PollFailed { session_id: String, message: String },

    #[error("Failed to delete session {session_id}: {message}")]
    DeleteFailed { session_id: String, message: String },

    #[error("Failed to fetch report for session {session_id}: {message}")]
    ReportFetchFailed { session_id: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Everything a poll loop needs from the remote grid.
///
/// The production implementation is [`HttpSessionClient`]; tests drive
/// the runner with scripted fakes.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session for one spec file, returning its id
    async fn create_session(&self, request: &SessionRequest) -> Result<String, GridError>;

    /// One poll round-trip; does not loop or retry
    async fn poll_logs(&self, session_id: &str) -> Result<Vec<LogEntry>, GridError>;

    /// Best-effort session deletion; idempotent on the remote side
    async fn delete_session(&self, session_id: &str) -> Result<(), GridError>;

    /// Fetch the session's raw report document
    async fn fetch_report(&self, session_id: &str) -> Result<Vec<u8>, GridError>;
}

/// Desired capabilities for one remote session
#[derive(Clone, Debug)]
pub struct SessionRequest {
    /// Spec file the session will run
    pub spec: SpecFile,

    /// Base execution URL of the uploaded suite
    pub suite_url: String,

    /// Organization id
    pub org: String,

    /// Extra npm dependencies installed before the run
    pub dependencies: Vec<String>,
}

impl SessionRequest {
    /// Wire body sent to the session create endpoint
    pub fn capabilities_body(&self) -> serde_json::Value {
        json!({
            "desiredCapabilities": {
                "browserName": "cypress",
                "suiteUrl": self.suite_url,
                "specFile": self.spec.as_str(),
                "orgId": self.org,
                "deps": self.dependencies,
                "grid:options": {
                    "name": format!("Suite run {}", self.spec),
                }
            }
        })
    }
}

/// Bounded exponential backoff for transient create failures.
///
/// Applies to session creation only; a poll transport error is terminal
/// for its session by design.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles per attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the given retry (0-based)
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry)
    }
}

/// Create response from the gateway
#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// HTTP client for the session gateway
pub struct HttpSessionClient {
    client: Client,
    gateway_url: String,
    retry: RetryPolicy,
}

impl HttpSessionClient {
    /// Create a client for one organization's gateway
    pub fn new(endpoints: &GridEndpoints, org: &str, timeout_secs: u64) -> Result<Self, GridError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GridError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            gateway_url: endpoints.gateway_url(org),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the create retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/session/{session_id}", self.gateway_url)
    }

    /// Single create attempt; `Ok(Err(message))` is a retryable failure
    async fn try_create(&self, request: &SessionRequest) -> Result<String, (bool, String)> {
        let url = format!("{}/session", self.gateway_url);
        debug!("Creating session for {} at {}", request.spec, url);

        let response = self
            .client
            .post(&url)
            .json(&request.capabilities_body())
            .send()
            .await
            .map_err(|e| (is_transient(&e), e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| (false, e.to_string()))?;

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| (false, format!("invalid create response: {e}")))?;

        body.session_id
            .filter(|id| !id.is_empty())
            .ok_or((false, "response carried no session id".to_string()))
    }
}

#[async_trait]
impl SessionService for HttpSessionClient {
    async fn create_session(&self, request: &SessionRequest) -> Result<String, GridError> {
        let mut retries = 0;
        loop {
            match self.try_create(request).await {
                Ok(session_id) => {
                    debug!("Created session {} for {}", session_id, request.spec);
                    return Ok(session_id);
                }
                Err((transient, message)) => {
                    if transient && retries + 1 < self.retry.max_attempts {
                        let delay = self.retry.delay(retries);
                        warn!(
                            "Transient create failure for {} ({}), retrying in {}ms",
                            request.spec,
                            message,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        retries += 1;
                    } else {
                        return Err(GridError::SessionCreateFailed {
                            spec: request.spec.to_string(),
                            message,
                        });
                    }
                }
            }
        }
    }

    async fn poll_logs(&self, session_id: &str) -> Result<Vec<LogEntry>, GridError> {
        let url = format!("{}/logs", self.session_url(session_id));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GridError::PollFailed {
                session_id: session_id.to_string(),
                message: e.to_string(),
            })?;

        response
            .json()
            .await
            .map_err(|e| GridError::PollFailed {
                session_id: session_id.to_string(),
                message: format!("invalid log batch: {e}"),
            })
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), GridError> {
        self.client
            .delete(self.session_url(session_id))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GridError::DeleteFailed {
                session_id: session_id.to_string(),
                message: e.to_string(),
            })?;

        debug!("Removed session {session_id}");
        Ok(())
    }

    async fn fetch_report(&self, session_id: &str) -> Result<Vec<u8>, GridError> {
        let url = format!("{}/getReport", self.session_url(session_id));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GridError::ReportFetchFailed {
                session_id: session_id.to_string(),
                message: e.to_string(),
            })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GridError::ReportFetchFailed {
                session_id: session_id.to_string(),
                message: e.to_string(),
            })?;

        Ok(bytes.to_vec())
    }
}

/// Whether a transport error is worth retrying
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}
