//! Route handlers.
//!
//! Handlers are thin: they call into the catalog, the compatibility filter or
//! the installer and map the result to JSON.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::future::join;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::release::compat::enabled_versions;
use crate::release::error::InstallError;
use crate::release::types::InstallOutcome;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct StablesResponse {
    pub stables: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TimestampResponse {
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub version: Option<String>,
}

fn error_response(msg: String) -> Response {
    error!("Request failed: {}", msg);
    (StatusCode::BAD_GATEWAY, Json(ErrorResponse { error: msg })).into_response()
}

/// GET /stable-versions
pub async fn stable_versions(State(state): State<AppState>) -> Response {
    let (stables, current) = join(
        state.catalog.stable_versions(),
        state.gateway.current_version(),
    )
    .await;

    match (stables, current) {
        (Ok(stables), Ok(current)) => Json(StablesResponse {
            stables: enabled_versions(&current, &stables),
        })
        .into_response(),
        (Err(e), _) => error_response(e.to_string()),
        (_, Err(e)) => error_response(e.to_string()),
    }
}

/// GET /sync
pub async fn sync(State(state): State<AppState>) -> Response {
    match state.catalog.refresh().await {
        Ok(timestamp) => Json(TimestampResponse { timestamp }).into_response(),
        Err(e) => error_response(e.to_string()),
    }
}

/// GET /last-updated
pub async fn last_updated(State(state): State<AppState>) -> Response {
    match state.catalog.last_updated().await {
        Ok(timestamp) => Json(TimestampResponse { timestamp }).into_response(),
        Err(e) => error_response(e.to_string()),
    }
}

/// GET /download?version=X
pub async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let outcome = match params.version {
        Some(version) => {
            info!("Download requested for version {}", version);
            state.installer.pull_and_apply(&version).await
        }
        None => InstallOutcome::from(InstallError::InvalidVersion),
    };

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(outcome)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, InstallConfig};
    use crate::release::error::GatewayError;
    use crate::release::gateway::MockGateway;
    use crate::release::store::CatalogStore;
    use crate::release::store::FileStore;
    use crate::release::types::Release;
    use crate::server::build_router;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state(gateway: MockGateway, stables: &[&str]) -> (TempDir, AppState) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            install: InstallConfig {
                settle_delay_ms: 0,
                verify_backoff_ms: 0,
                ..InstallConfig::default()
            },
            ..Config::default()
        };
        let stables: Vec<String> = stables.iter().map(|s| s.to_string()).collect();
        if !stables.is_empty() {
            FileStore::new(&config.stables_path(), &config.last_updated_path())
                .write_stables(&stables)
                .unwrap();
        }

        (temp_dir, AppState::new(&config, Arc::new(gateway)))
    }

    async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
        let response = build_router(state)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn stable_versions_filters_by_running_version() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_current_version()
            .returning(|| Ok("1.2.0".to_string()));

        let (_temp_dir, state) = test_state(gateway, &["2.0.0", "1.3.0", "1.2.0", "1.1.0"]);
        let (status, body) = get(state, "/stable-versions").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"stables": ["1.3.0", "1.2.0"]}));
    }

    #[tokio::test]
    async fn stable_versions_reports_unreachable_service() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_current_version()
            .returning(|| Err(GatewayError::Unreachable("connection refused".to_string())));

        let (_temp_dir, state) = test_state(gateway, &["1.2.0"]);
        let (status, body) = get(state, "/stable-versions").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn sync_returns_timestamp() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_release_feed()
            .times(1)
            .returning(|| Ok(vec!["1.2.0".to_string()]));

        let (_temp_dir, state) = test_state(gateway, &["1.0.0"]);
        let (status, body) = get(state.clone(), "/sync").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["timestamp"].is_string());
        assert_eq!(
            state.catalog.stable_versions().await.unwrap(),
            vec!["1.2.0"]
        );
    }

    #[tokio::test]
    async fn last_updated_refreshes_cold_cache() {
        let mut gateway = MockGateway::new();
        gateway
            .expect_release_feed()
            .times(1)
            .returning(|| Ok(vec!["1.2.0".to_string()]));

        let (_temp_dir, state) = test_state(gateway, &[]);
        let (status, body) = get(state, "/last-updated").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn download_without_version_is_invalid() {
        let (_temp_dir, state) = test_state(MockGateway::new(), &["1.2.0"]);
        let (status, body) = get(state, "/download").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"success": false, "message": "Invalid version"})
        );
    }

    #[tokio::test]
    async fn download_applies_version() {
        let mut gateway = MockGateway::new();
        let mut replies = vec!["1.1.0", "1.2.0"].into_iter();
        gateway
            .expect_current_version()
            .times(2)
            .returning(move || Ok(replies.next().unwrap_or_default().to_string()));
        gateway
            .expect_local_inventory()
            .returning(|| Ok(vec![Release::new("bluerobotics/blueos-core", "1.2.0")]));
        gateway.expect_switch().times(1).returning(|_| Ok(()));

        let (_temp_dir, state) = test_state(gateway, &["1.2.0", "1.1.0"]);
        let (status, body) = get(state, "/download?version=1.2.0").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "message": "Downloaded and applied version 1.2.0"})
        );
    }
}
