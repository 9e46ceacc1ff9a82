//! HTTP request test utilities

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use stabler::config::{Config, InstallConfig};
use stabler::release::gateway::Gateway;
use stabler::server::{AppState, build_router};

/// Create app state persisting into a fresh temp dir, with instant delays
pub fn create_test_state(gateway: Arc<dyn Gateway>) -> (TempDir, AppState) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: temp_dir.path().to_path_buf(),
        install: InstallConfig {
            settle_delay_ms: 0,
            verify_backoff_ms: 0,
            verify_max_attempts: 5,
            ..InstallConfig::default()
        },
        ..Config::default()
    };
    (temp_dir, AppState::new(&config, gateway))
}

/// Send a GET request through the router and decode the JSON body
pub async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}
