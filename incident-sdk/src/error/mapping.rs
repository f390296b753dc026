//! HTTP error mapping for the incident service
//!
//! Maps a non-2xx response (status, drained body, Retry-After header) to
//! exactly one `ServiceError` kind.

use reqwest::StatusCode;
use serde::Deserialize;

use super::ServiceError;

/// Error payload the service returns for 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable summary of what was rejected
    pub detail: String,

    /// Per-field validation messages, if any
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

/// Map an HTTP error response to a ServiceError.
///
/// The body must already be fully read; draining it here keeps the pooled
/// connection reusable for the next attempt.
pub fn map_http_error(status: StatusCode, body: &str, retry_after: Option<&str>) -> ServiceError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let message = parsed
            .map(|b| b.detail)
            .unwrap_or_else(|| "Too many requests".to_string());
        return ServiceError::rate_limited(message, retry_after.map(|v| v.to_string()));
    }

    if status.is_server_error() {
        let message = parsed
            .map(|b| b.detail)
            .unwrap_or_else(|| summarize_body(status, body));
        return ServiceError::server(status.as_u16(), message);
    }

    match parsed {
        Some(b) => ServiceError::client(status.as_u16(), b.detail, b.errors),
        None => ServiceError::client(status.as_u16(), summarize_body(status, body), None),
    }
}

/// Determine if an HTTP status code indicates a retryable failure.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Fallback message when the body is not the expected error payload.
fn summarize_body(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else if body.len() > 200 {
        format!("{}: {:.200}...", status, body)
    } else {
        format!("{}: {}", status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;

    #[test]
    fn test_rate_limit_keeps_raw_hint() {
        let err = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"detail": "Rate limit exceeded: 10 per minute"}"#,
            Some("5"),
        );
        match err {
            ServiceError::RateLimited {
                message,
                retry_after,
            } => {
                assert!(message.contains("Rate limit exceeded"));
                assert_eq!(retry_after.as_deref(), Some("5"));
            }
            other => panic!("Expected RateLimited, got: {:?}", other),
        }
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = map_http_error(StatusCode::SERVICE_UNAVAILABLE, "", None);
        assert_eq!(err.class(), FailureClass::Retryable);
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn test_validation_body_decoded() {
        let body = r#"{"detail": "Validation error", "errors": ["transcript: too short", "feedback: required"]}"#;
        let err = map_http_error(StatusCode::UNPROCESSABLE_ENTITY, body, None);
        match err {
            ServiceError::Client {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation error");
                assert_eq!(details.unwrap().len(), 2);
            }
            other => panic!("Expected Client, got: {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_body_is_summarized() {
        let err = map_http_error(StatusCode::NOT_FOUND, "<html>not here</html>", None);
        match err {
            ServiceError::Client { status, message, .. } => {
                assert_eq!(status, 404);
                assert!(message.contains("not here"));
            }
            other => panic!("Expected Client, got: {:?}", other),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
    }
}
