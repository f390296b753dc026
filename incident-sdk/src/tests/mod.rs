//! Unit and integration tests for the incident SDK
//!
//! This module contains tests for various components of the SDK.

// Re-export test modules
pub mod incident_mock_tests;
