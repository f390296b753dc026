//! Mock tests for the incident service client
//!
//! These tests use WireMock to simulate the incident response API and
//! verify that the client retries, classifies, and validates correctly.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use crate::error::ServiceError;
    use crate::resilience::{BackoffPolicy, CancelToken, RetryConfig};
    use crate::services::incident::{IncidentClient, TranscriptRequest};
    use crate::ServiceClient;

    /// Creates a test client configured to use the mock server, with fast
    /// backoff so retry tests finish quickly.
    fn create_test_client(mock_server: &MockServer) -> IncidentClient {
        IncidentClient::builder()
            .base_url(mock_server.uri())
            .retry(RetryConfig {
                max_attempts: 3,
                attempt_timeout: Duration::from_secs(5),
                total_budget: Duration::from_secs(30),
                backoff: BackoffPolicy {
                    initial_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(40),
                },
            })
            .build()
            .expect("Failed to build incident client")
    }

    fn sample_transcript() -> TranscriptRequest {
        TranscriptRequest::new(
            "Carer: I found John on the floor of the living room this afternoon. \
             He says he slipped on the wet floor. No visible injuries.",
        )
    }

    fn sample_response_json(subject: &str) -> serde_json::Value {
        json!({
            "incident_form": {
                "date_and_time_of_incident": "2025-01-31T14:30:00",
                "service_user_name": "John Doe",
                "location_of_incident": "Living room",
                "type_of_incident": "Fall",
                "description_of_incident": "Service user slipped on the wet floor and fell.",
                "immediate_actions_taken": "Helped the service user up and checked for injuries.",
                "was_first_aid_administered": false,
                "were_emergency_services_contacted": false,
                "who_was_notified": "Supervisor",
                "witnesses": "None",
                "agreed_next_steps": "Arrange a falls risk assessment.",
                "risk_assessment_needed": true,
                "if_yes_which_risk_assessment": "Falls risk assessment"
            },
            "policy_analysis": {
                "relevant_policies": ["Falls Policy s.4", "  ", ""],
                "policy_compliance": ["Staff checked for injuries before moving"],
                "recommended_actions": ["Email the supervisor"],
                "concerns": []
            },
            "draft_email": {
                "to": "Supervisor",
                "cc": null,
                "subject": subject,
                "body": "A fall occurred this afternoon; the incident form is attached."
            },
            "source_quotes": {
                "incident": "I found John on the floor of the living room"
            }
        })
    }

    /// Responds with an error template a fixed number of times, then hands
    /// out the success template.
    struct FlakyResponder {
        failures: ResponseTemplate,
        success: ResponseTemplate,
        remaining_failures: AtomicUsize,
    }

    impl FlakyResponder {
        fn new(failures: ResponseTemplate, success: ResponseTemplate, count: usize) -> Self {
            Self {
                failures,
                success,
                remaining_failures: AtomicUsize::new(count),
            }
        }
    }

    impl Respond for FlakyResponder {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            let remaining = self.remaining_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
                self.failures.clone()
            } else {
                self.success.clone()
            }
        }
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(sample_response_json("Incident report: fall")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let response = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(response.incident_form.service_user_name, "John Doe");
        assert_eq!(response.draft_email.to, vec!["Supervisor"]);
        // Empty policy entries are filtered on ingestion.
        assert_eq!(
            response.policy_analysis.relevant_policies,
            vec!["Falls Policy s.4"]
        );
    }

    #[tokio::test]
    async fn test_short_transcript_rejected_without_network() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let error = client
            .analyze(&TranscriptRequest::new("Too short"), &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unprocessable_entity_surfaced_after_one_attempt() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": "Validation error",
                "errors": ["transcript: ensure this value has at least 50 characters"]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let error = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap_err();

        match error {
            ServiceError::Client {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation error");
                assert_eq!(details.unwrap().len(), 1);
            }
            other => panic!("Expected Client error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_persistent_server_errors_exhaust_retry_budget() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({"detail": "AI service unavailable"})),
            )
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let error = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Server { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(FlakyResponder::new(
                ResponseTemplate::new(503),
                ResponseTemplate::new(200).set_body_json(sample_response_json("Incident report: fall")),
                1,
            ))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let response = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(response.incident_form.type_of_incident, "Fall");
    }

    #[tokio::test]
    async fn test_retry_after_hint_overrides_backoff() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(FlakyResponder::new(
                ResponseTemplate::new(429)
                    .set_body_json(json!({"detail": "Rate limit exceeded: 10 per minute"}))
                    .insert_header("retry-after", "1"),
                ResponseTemplate::new(200).set_body_json(sample_response_json("Incident report: fall")),
                1,
            ))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let started = Instant::now();
        let response = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(response.incident_form.service_user_name, "John Doe");
        // The hinted 1s wait must win over the 10ms exponential default.
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_undecodable_document_is_terminal() {
        let mock_server = MockServer::start().await;

        // 2xx, but the document is missing its draft_email part entirely.
        let mut body = sample_response_json("Incident report: fall");
        body.as_object_mut().unwrap().remove("draft_email");

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let error = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Parsing(_)));
    }

    #[tokio::test]
    async fn test_invalid_document_fails_validation_on_receipt() {
        let mock_server = MockServer::start().await;

        let mut body = sample_response_json("Incident report: fall");
        body["incident_form"]["description_of_incident"] = json!("Fell");

        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let error = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "healthy",
                "timestamp": "2025-01-31T14:30:00+00:00",
                "version": "1.0.0"
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);

        let health = client.health(&CancelToken::new()).await.unwrap();
        assert_eq!(health.status, "healthy");
        assert!(client.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_connection_failure_is_retryable() {
        // Nothing listens here; the connection is refused outright.
        let client = IncidentClient::builder()
            .base_url("http://127.0.0.1:9")
            .retry(RetryConfig {
                max_attempts: 2,
                attempt_timeout: Duration::from_secs(2),
                total_budget: Duration::from_secs(10),
                backoff: BackoffPolicy {
                    initial_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(20),
                },
            })
            .build()
            .unwrap();

        let error = client
            .analyze(&sample_transcript(), &CancelToken::new())
            .await
            .unwrap_err();

        assert!(error.is_retryable());
    }
}
