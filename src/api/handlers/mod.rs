//! API request handlers.

pub mod categories;
pub mod installments;
pub mod library;
pub mod publications;
pub mod status;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::archive::Page;
use crate::library::LibraryError;

/// Map a library error to an HTTP status and message.
pub(crate) fn error_response(error: LibraryError) -> (StatusCode, String) {
    let status = match &error {
        LibraryError::PublicationNotFound(_)
        | LibraryError::ThumbnailMissing(_)
        | LibraryError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        e => {
            tracing::error!(error = %e, "Library operation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, error.to_string())
}

/// Parse an ordinal path segment. Negative values parse; range checks are
/// left to the resolver.
pub(crate) fn parse_ordinal(raw: &str, what: &str) -> Result<i64, (StatusCode, String)> {
    raw.parse::<i64>()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("Invalid {} ordinal: {}", what, raw)))
}

/// Image bytes with their content type.
pub(crate) fn page_response(page: Page) -> Response {
    (
        [
            (header::CONTENT_TYPE, page.content_type.as_str()),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        page.bytes,
    )
        .into_response()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::{router, ApiState};
    use crate::library::tests::Fixture;

    /// Send a request to a fresh router over `state`.
    pub(crate) async fn send(
        state: &Arc<ApiState>,
        method: &str,
        uri: &str,
    ) -> (StatusCode, Vec<u8>, Option<String>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        dispatch(state, request).await
    }

    async fn dispatch(
        state: &Arc<ApiState>,
        request: Request<Body>,
    ) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, body.to_vec(), content_type)
    }

    pub(crate) async fn send_json(
        state: &Arc<ApiState>,
        method: &str,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let (status, body, _) = send(state, method, uri).await;
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// Send a JSON body and decode the JSON reply.
    pub(crate) async fn send_json_body(
        state: &Arc<ApiState>,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let (status, body, _) = dispatch(state, request).await;
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// API state over a fixture, with the snapshot already refreshed.
    pub(crate) async fn state_for(fixture: Fixture) -> (tempfile::TempDir, Arc<ApiState>) {
        let Fixture { root, library } = fixture;
        let state = Arc::new(ApiState::new(library));
        state.refresh().await.unwrap();
        (root, state)
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_response(LibraryError::PublicationOutOfRange(9));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(LibraryError::PageOutOfRange { page: 3, count: 2 });
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(LibraryError::InstallmentUnavailable("ch1".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(LibraryError::CategoryOutOfRange(3));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(LibraryError::Io {
            path: "/x".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_ordinal() {
        assert_eq!(parse_ordinal("3", "page").unwrap(), 3);
        assert_eq!(parse_ordinal("-1", "page").unwrap(), -1);

        let (status, message) = parse_ordinal("three", "page").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("page"));
    }
}
