//! # Incident SDK
//!
//! Client SDK for the AI-enhanced incident response service.
//!
//! This crate provides:
//!
//! - A strongly-typed client for the analyze/refine endpoints
//! - A resilient dispatch layer: bounded retries with exponential backoff,
//!   per-attempt deadlines, and cooperative cancellation
//! - A single-flight operation lifecycle manager for interactive sessions
//! - The structured document model with validation at both boundary
//!   crossings
//! - Configuration management utilities
//!
//! ## Architecture
//!
//! The SDK is designed around the following key abstractions:
//!
//! - `ServiceClient` / `RequestExecutor`: the transport trait seams
//! - `ServiceError`: one classified kind per failure, partitioned into
//!   retryable / terminal / cancelled
//! - `RetryExecutor`: the bounded-attempt dispatcher with a wall-clock
//!   budget
//! - `CancelToken`: cooperative cancellation that remembers whether the
//!   caller or a superseding operation fired it
//! - `AnalysisSession`: single-flight orchestration of analyze/refine with
//!   last-writer-wins publication

// Re-export core modules
pub mod core;
pub use core::{RequestExecutor, ServiceClient};

// Re-export service-specific modules
pub mod services;
pub use services::incident;

// Re-export error handling
pub mod error;
pub use error::{CancelKind, FailureClass, Result, ServiceError};

// Re-export resilience patterns
pub mod resilience;
pub use resilience::{BackoffPolicy, CancelToken, RetryConfig, RetryExecutor};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, ServiceConfig};

// Re-export session management
pub mod session;
pub use session::{AnalysisSession, OperationKind, OperationOutcome, SessionSnapshot};

#[cfg(test)]
mod tests;

/// Create a pre-configured incident service client
pub fn incident_client() -> incident::IncidentClient {
    incident::IncidentClient::new()
}

/// Create an analysis session over a pre-configured client
pub fn analysis_session() -> AnalysisSession {
    AnalysisSession::new(incident_client())
}
