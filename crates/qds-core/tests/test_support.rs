//! Shared test support utilities for integration tests

#![allow(dead_code)]

use std::time::Duration;

use qds_core::{Session, SessionConfig};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

/// Base URL of the API root on a mock server
pub fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// Session against `server` with instant retries and the shortest poll interval
pub fn session_for(server: &MockServer, max_retries: u32) -> Session {
    let config = SessionConfig::builder(TEST_TOKEN)
        .api_url(api_url(server))
        .max_retries(max_retries)
        .base_retry_delay(Duration::ZERO)
        .poll_interval(Duration::from_secs(1))
        .build();
    Session::configure(config)
}

/// Versioned path as the service sees it
pub fn v12(path: &str) -> String {
    format!("/api/v1.2/{}", path)
}
