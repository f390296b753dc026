//! Core abstractions for the incident SDK
//!
//! This module provides the trait seams implemented by the service client:
//!
//! - `ServiceClient`: identity and health of the upstream service
//! - `RequestExecutor`: typed HTTP execution with explicit cancellation

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::resilience::CancelToken;

/// Base trait for service clients
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// The base URL for the service
    fn base_url(&self) -> &str;

    /// Service API version
    fn version(&self) -> &str;

    /// Health check for the service
    async fn health_check(&self) -> Result<bool>;
}

/// Trait responsible for executing HTTP requests with strong typing
///
/// Every method takes the caller's cancellation token so the in-flight call
/// and any backoff waits can be abandoned cooperatively.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute a GET request
    async fn get<R>(&self, endpoint: &str, cancel: &CancelToken) -> Result<R>
    where
        R: DeserializeOwned + Send;

    /// Execute a POST request with a JSON body
    async fn post<T, R>(&self, endpoint: &str, body: &T, cancel: &CancelToken) -> Result<R>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned + Send;
}
