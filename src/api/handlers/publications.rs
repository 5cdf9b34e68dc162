//! Publication handlers.
//!
//! Publications are addressed by ordinal in the current snapshot. Responses
//! carry both the ordinal and the stable identifier, so clients can re-find
//! a publication after a restart changes the ordinals.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::api::ApiState;
use crate::catalog::{Publication, PublicationId, PublicationMetadata};
use crate::library::LibraryError;

use super::{error_response, page_response, parse_ordinal};

/// Client view of a publication.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationResponse {
    /// Ordinal in the current snapshot.
    pub id: usize,

    pub stable_id: PublicationId,

    /// Directory name under the library root.
    pub name: String,

    pub url: String,
    pub thumbnail_url: String,

    #[serde(flatten)]
    pub metadata: PublicationMetadata,

    pub installment_count: usize,
}

impl PublicationResponse {
    pub fn new(ordinal: usize, publication: Publication) -> Self {
        Self {
            id: ordinal,
            stable_id: publication.id,
            url: format!("/api/v1/publications/{}", ordinal),
            thumbnail_url: format!("/api/v1/publications/{}/thumbnail", ordinal),
            name: publication.name,
            metadata: publication.metadata,
            installment_count: publication.installments.len(),
        }
    }
}

/// List all addressable publications in ordinal order.
///
/// GET /api/v1/publications
pub async fn list_publications(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<PublicationResponse>>, (StatusCode, String)> {
    let snapshot = state.snapshot.read().await.clone();
    let library = state.library.read().await;

    let publications = library.publications(&snapshot).map_err(error_response)?;

    Ok(Json(
        publications
            .into_iter()
            .enumerate()
            .map(|(ordinal, publication)| PublicationResponse::new(ordinal, publication))
            .collect(),
    ))
}

/// Get a publication by ordinal.
///
/// GET /api/v1/publications/:ordinal
pub async fn get_publication(
    State(state): State<Arc<ApiState>>,
    Path(ordinal): Path<String>,
) -> Result<Json<PublicationResponse>, (StatusCode, String)> {
    let ordinal = parse_ordinal(&ordinal, "publication")?;
    let id = state.resolve(ordinal).await.map_err(error_response)?;

    let publication = state
        .library
        .read()
        .await
        .publication(&id)
        .map_err(error_response)?;

    Ok(Json(PublicationResponse::new(ordinal as usize, publication)))
}

/// Get a publication by stable identifier.
///
/// GET /api/v1/publications/by-id/:id
pub async fn get_publication_by_id(
    State(state): State<Arc<ApiState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<PublicationResponse>, (StatusCode, String)> {
    let id: PublicationId = raw_id
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, format!("Invalid publication id: {}", raw_id)))?;

    let ordinal = state
        .snapshot
        .read()
        .await
        .ordinal_of(&id)
        .ok_or_else(|| error_response(LibraryError::PublicationNotFound(id.clone())))?;

    let publication = state
        .library
        .read()
        .await
        .publication(&id)
        .map_err(error_response)?;

    Ok(Json(PublicationResponse::new(ordinal, publication)))
}

/// Serve a publication's cover image.
///
/// GET /api/v1/publications/:ordinal/thumbnail
pub async fn get_thumbnail(
    State(state): State<Arc<ApiState>>,
    Path(ordinal): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let ordinal = parse_ordinal(&ordinal, "publication")?;
    let id = state.resolve(ordinal).await.map_err(error_response)?;

    let cover = state
        .library
        .read()
        .await
        .thumbnail(&id)
        .map_err(error_response)?;

    Ok(page_response(cover))
}

/// Result of an installment sync.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// Installments created by this sync.
    pub created: usize,

    /// Installments known for the publication after the sync.
    pub installments: usize,
}

/// Pick up new installments of one publication without a full rescan.
///
/// POST /api/v1/publications/:ordinal/sync
pub async fn sync_publication(
    State(state): State<Arc<ApiState>>,
    Path(ordinal): Path<String>,
) -> Result<Json<SyncResponse>, (StatusCode, String)> {
    let ordinal = parse_ordinal(&ordinal, "publication")?;
    let id = state.resolve(ordinal).await.map_err(error_response)?;

    let mut library = state.library.write().await;
    let created = library.sync_installments(&id).map_err(error_response)?;
    let installments = library
        .publication(&id)
        .map_err(error_response)?
        .installments
        .len();

    info!(publication = %id, created = created, "Installments synced on request");

    Ok(Json(SyncResponse {
        created,
        installments,
    }))
}
