//! Library maintenance handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;

use crate::api::ApiState;

use super::error_response;

/// Result of an explicit rescan.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    /// Publications found in the library root.
    pub scanned: usize,

    /// Publications created by this scan.
    pub created_publications: usize,

    /// Installments created by this scan.
    pub created_installments: usize,

    /// Total addressable publications after the scan.
    pub publications: usize,

    pub finished_at: u64,
}

/// Rescan the library root and refresh the ordinal mapping.
///
/// POST /api/v1/library/scan
pub async fn scan(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ScanSummary>, (StatusCode, String)> {
    let report = state.refresh().await.map_err(error_response)?;
    let publications = state.snapshot.read().await.len();

    info!(
        scanned = report.entries.len(),
        created = report.created_publications,
        "Library rescanned on request"
    );

    Ok(Json(ScanSummary {
        scanned: report.entries.len(),
        created_publications: report.created_publications,
        created_installments: report.created_installments,
        publications,
        finished_at: report.finished_at,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::handlers::tests::{send_json, state_for};
    use crate::library::tests::Fixture;

    #[tokio::test]
    async fn test_scan_picks_up_new_directories() {
        let fixture = Fixture::new();
        fixture.publication_dir("Blame");
        let library_dir = fixture.library_dir().to_path_buf();
        let (_root, state) = state_for(fixture).await;

        std::fs::create_dir(library_dir.join("Biomega")).unwrap();

        let (status, body) = send_json(&state, "POST", "/api/v1/library/scan").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scanned"], 2);
        assert_eq!(body["createdPublications"], 1);
        assert_eq!(body["publications"], 2);

        let (_, body) = send_json(&state, "POST", "/api/v1/library/scan").await;
        assert_eq!(body["createdPublications"], 0);
        assert_eq!(body["publications"], 2);
    }

    #[tokio::test]
    async fn test_scan_of_missing_root_is_server_error() {
        let fixture = Fixture::new();
        let library_dir = fixture.library_dir().to_path_buf();
        let (_root, state) = state_for(fixture).await;

        std::fs::remove_dir_all(&library_dir).unwrap();

        let (status, _) = send_json(&state, "POST", "/api/v1/library/scan").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
