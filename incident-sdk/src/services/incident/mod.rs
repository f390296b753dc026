//! Incident analysis service client
//!
//! This module provides a strongly-typed client for the incident response
//! API. Every call rides the retrying dispatcher; structured documents are
//! sanitized and validated before they are handed to the caller, and again
//! before they are echoed back inside a refinement request.

mod models;
pub use models::*;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{IncidentApiConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::{RequestExecutor, ServiceClient};
use crate::error::{Result, ServiceError};
use crate::resilience::{CancelToken, RetryConfig, RetryExecutor};
use crate::services::common::{build_http_client, new_request_id, parse_error_response, UserAgent};

/// Incident response API client
pub struct IncidentClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: IncidentApiConfig,

    /// Retrying dispatcher
    retry: RetryExecutor,
}

impl Default for IncidentClient {
    fn default() -> Self {
        let config = IncidentApiConfig::from_provider(&**DEFAULT_PROVIDER).unwrap_or_else(|_| {
            debug!("No incident API configuration in environment, using defaults");
            IncidentApiConfig::default()
        });

        Self::new_with_config(config)
    }
}

impl IncidentClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new client with custom configuration
    pub fn new_with_config(config: IncidentApiConfig) -> Self {
        let http_client = build_http_client(Some(UserAgent::default()), None).unwrap_or_else(|e| {
            error!("Failed to build incident HTTP client: {}", e);
            panic!("Failed to build incident HTTP client: {}", e);
        });

        let retry = RetryExecutor::new(config.retry_config());

        Self {
            http_client,
            config,
            retry,
        }
    }

    /// Create a new builder for the incident client
    pub fn builder() -> IncidentClientBuilder {
        IncidentClientBuilder::default()
    }

    /// Analyze a transcript into a structured document.
    ///
    /// The request is validated locally before any network traffic; the
    /// response is sanitized and validated before it is returned, so a
    /// misbehaving upstream can never hand the caller a partial document.
    pub async fn analyze(
        &self,
        request: &TranscriptRequest,
        cancel: &CancelToken,
    ) -> Result<AnalysisResponse> {
        request.validate()?;

        debug!(
            "Submitting transcript for analysis ({} chars)",
            request.transcript.chars().count()
        );

        let mut response: AnalysisResponse = self.post("v1/analyze", request, cancel).await?;
        response.sanitize();
        response.validate()?;
        Ok(response)
    }

    /// Refine a previously generated document with feedback.
    ///
    /// The echoed original document is validated along with the feedback
    /// before sending; the refined document is validated on receipt.
    pub async fn refine(
        &self,
        request: &FeedbackRequest,
        cancel: &CancelToken,
    ) -> Result<AnalysisResponse> {
        request.validate()?;

        debug!("Submitting feedback for section {}", request.section_to_edit.as_str());

        let mut response: AnalysisResponse = self.post("v1/refine", request, cancel).await?;
        response.sanitize();
        response.validate()?;
        Ok(response)
    }

    /// Service liveness probe
    pub async fn health(&self, cancel: &CancelToken) -> Result<HealthResponse> {
        self.get("health", cancel).await
    }

    /// Fetch the policies document
    pub async fn policies(&self, cancel: &CancelToken) -> Result<PoliciesResponse> {
        self.get("v1/policies", cancel).await
    }

    /// Fetch the incident form template
    pub async fn form_template(&self, cancel: &CancelToken) -> Result<FormTemplateResponse> {
        self.get("v1/form-template", cancel).await
    }

    /// Execute one endpoint call through the retrying dispatcher.
    ///
    /// The request is rebuilt for every attempt with a fresh correlation ID;
    /// a failed attempt's body is drained by the error mapper so the pooled
    /// connection stays reusable.
    async fn send_request<R>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<String>,
        cancel: &CancelToken,
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );

        self.retry
            .execute(cancel, || {
                let request_id = new_request_id();
                debug!("{} {} (request {})", method, url, request_id);

                let mut request = self
                    .http_client
                    .request(method.clone(), &url)
                    .header("X-Request-ID", request_id);

                if let Some(ref json) = body {
                    request = request
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(json.clone());
                }

                async move {
                    let response = request.send().await?;

                    if response.status().is_success() {
                        Ok(response.json::<R>().await?)
                    } else {
                        Err(parse_error_response(response).await)
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl ServiceClient for IncidentClient {
    fn name(&self) -> &str {
        self.config.service_name()
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn version(&self) -> &str {
        "v1"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.health(&CancelToken::new()).await {
            Ok(health) => Ok(health.status == "healthy"),
            Err(e) => {
                warn!("Incident service health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl RequestExecutor for IncidentClient {
    async fn get<R>(&self, endpoint: &str, cancel: &CancelToken) -> Result<R>
    where
        R: DeserializeOwned + Send,
    {
        self.send_request(Method::GET, endpoint, None, cancel).await
    }

    async fn post<T, R>(&self, endpoint: &str, body: &T, cancel: &CancelToken) -> Result<R>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let json = serde_json::to_string(body)
            .map_err(|e| ServiceError::validation(format!("Failed to serialize request: {}", e)))?;

        self.send_request(Method::POST, endpoint, Some(json), cancel)
            .await
    }
}

/// Builder for the incident client
#[derive(Default)]
pub struct IncidentClientBuilder {
    /// Base URL for the API
    base_url: Option<String>,

    /// Per-attempt timeout in seconds
    timeout_seconds: Option<u64>,

    /// Total attempt budget
    max_attempts: Option<u32>,

    /// Full retry configuration override
    retry_config: Option<RetryConfig>,
}

impl IncidentClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the per-attempt timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Set the total attempt budget
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Override the full retry configuration
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = Some(config);
        self
    }

    /// Build the incident client
    pub fn build(self) -> Result<IncidentClient> {
        let mut config = IncidentApiConfig::from_provider(&**DEFAULT_PROVIDER).unwrap_or_default();

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        if let Some(attempts) = self.max_attempts {
            config.max_attempts = attempts;
        }

        config.validate()?;

        let mut client = IncidentClient::new_with_config(config);

        if let Some(retry_config) = self.retry_config {
            client.retry = RetryExecutor::new(retry_config);
        }

        Ok(client)
    }
}
