//! Status and health check handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::ApiState;

/// Health response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status.
    pub status: String,

    /// Number of addressable publications.
    pub publications: usize,

    /// Finish time of the last scan (Unix epoch seconds).
    pub last_scan: Option<u64>,

    /// Library root being served.
    pub library_dir: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let (publications, last_scan) = {
        let snapshot = state.snapshot.read().await;
        (snapshot.len(), snapshot.last_scan())
    };

    let library_dir = state
        .library
        .read()
        .await
        .config()
        .library_dir
        .display()
        .to_string();

    Json(HealthResponse {
        status: "ok".to_string(),
        publications,
        last_scan,
        library_dir,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::handlers::tests::{send_json, state_for};
    use crate::library::tests::Fixture;

    #[tokio::test]
    async fn test_health() {
        let fixture = Fixture::new();
        fixture.publication_dir("Akira");
        let (_root, state) = state_for(fixture).await;

        let (status, body) = send_json(&state, "GET", "/api/v1/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["publications"], 1);
        assert!(body["lastScan"].is_u64());
    }
}
