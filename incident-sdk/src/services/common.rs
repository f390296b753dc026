//! Common utilities for service clients
//!
//! This module provides the HTTP plumbing shared by service calls.

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client};

use crate::error::mapping::map_http_error;
use crate::error::{Result, ServiceError};

/// Default user agent string
const DEFAULT_USER_AGENT: &str = "incident-sdk/0.1.0";

/// UserAgent structure for identifying the client to the upstream service
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "incident-sdk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: None,
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client with default settings.
///
/// No client-level timeout is set: per-attempt deadlines belong to the
/// dispatcher, and a second timer here would misclassify its abandonments.
pub fn build_http_client(user_agent: Option<UserAgent>, connect_timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .unwrap_or_else(|_| header::HeaderValue::from_static(DEFAULT_USER_AGENT)),
    );

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(connect_timeout.unwrap_or_else(|| Duration::from_secs(10)))
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))?;

    Ok(client)
}

/// Parse an error response, draining its body.
///
/// Reading the body to completion keeps the pooled connection reusable for
/// the next attempt. The Retry-After header is captured before the body is
/// consumed.
pub async fn parse_error_response(response: reqwest::Response) -> ServiceError {
    let status = response.status();

    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    map_http_error(status, &body, retry_after.as_deref())
}

/// Generate a unique request correlation ID
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_format() {
        let ua = UserAgent {
            app_name: "incident-sdk".to_string(),
            version: "0.1.0".to_string(),
            extra: Some("tests".to_string()),
        };
        assert_eq!(ua.to_string(), "incident-sdk/0.1.0 (tests)");
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(new_request_id(), new_request_id());
    }
}
