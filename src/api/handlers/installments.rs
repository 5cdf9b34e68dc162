//! Installment and page handlers.
//!
//! Installments are addressed by their creation-order ordinal within the
//! publication. Every read refreshes availability from disk.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Serialize;

use crate::api::ApiState;
use crate::catalog::{Installment, InstallmentId};

use super::{error_response, page_response, parse_ordinal};

/// Client view of an installment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentResponse {
    /// Creation-order ordinal within the publication.
    pub id: usize,

    pub stable_id: InstallmentId,

    /// Ordinal of the owning publication.
    pub publication_id: usize,

    pub name: String,
    pub url: String,
    pub pages_url: String,
    pub number: f32,
    pub scanlator: String,

    /// Milliseconds since the Unix epoch.
    pub upload_date: i64,

    pub page_count: usize,
    pub available: bool,
}

impl InstallmentResponse {
    pub fn new(publication_ordinal: usize, ordinal: usize, installment: Installment) -> Self {
        let url = format!(
            "/api/v1/publications/{}/installments/{}",
            publication_ordinal, ordinal
        );

        Self {
            id: ordinal,
            stable_id: installment.id,
            publication_id: publication_ordinal,
            pages_url: format!("{}/pages", url),
            url,
            name: installment.name,
            number: installment.number,
            scanlator: installment.scanlator,
            upload_date: installment.upload_date,
            page_count: installment.page_count,
            available: installment.available,
        }
    }
}

/// A page reference.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub index: usize,
    pub url: String,
}

/// List available installments of a publication, name descending.
///
/// GET /api/v1/publications/:ordinal/installments
pub async fn list_installments(
    State(state): State<Arc<ApiState>>,
    Path(ordinal): Path<String>,
) -> Result<Json<Vec<InstallmentResponse>>, (StatusCode, String)> {
    let ordinal = parse_ordinal(&ordinal, "publication")?;
    let id = state.resolve(ordinal).await.map_err(error_response)?;

    let mut library = state.library.write().await;
    let installments = library.list_installments(&id).map_err(error_response)?;

    let publication_ordinal = ordinal as usize;
    let mut responses = Vec::with_capacity(installments.len());
    for installment in installments {
        if let Some(position) = library
            .installment_ordinal(&installment)
            .map_err(error_response)?
        {
            responses.push(InstallmentResponse::new(publication_ordinal, position, installment));
        }
    }

    Ok(Json(responses))
}

/// Get one installment.
///
/// GET /api/v1/publications/:ordinal/installments/:installment
pub async fn get_installment(
    State(state): State<Arc<ApiState>>,
    Path((ordinal, installment)): Path<(String, String)>,
) -> Result<Json<InstallmentResponse>, (StatusCode, String)> {
    let ordinal = parse_ordinal(&ordinal, "publication")?;
    let installment_ordinal = parse_ordinal(&installment, "installment")?;
    let id = state.resolve(ordinal).await.map_err(error_response)?;

    let installment = state
        .library
        .write()
        .await
        .installment_by_ordinal(&id, installment_ordinal)
        .map_err(error_response)?;

    Ok(Json(InstallmentResponse::new(
        ordinal as usize,
        installment_ordinal as usize,
        installment,
    )))
}

/// List page references of an installment.
///
/// GET /api/v1/publications/:ordinal/installments/:installment/pages
pub async fn list_pages(
    State(state): State<Arc<ApiState>>,
    Path((ordinal, installment)): Path<(String, String)>,
) -> Result<Json<Vec<PageResponse>>, (StatusCode, String)> {
    let ordinal = parse_ordinal(&ordinal, "publication")?;
    let installment_ordinal = parse_ordinal(&installment, "installment")?;
    let id = state.resolve(ordinal).await.map_err(error_response)?;

    let installment = state
        .library
        .write()
        .await
        .installment_by_ordinal(&id, installment_ordinal)
        .map_err(error_response)?;

    let pages = (0..installment.page_count)
        .map(|index| PageResponse {
            index,
            url: format!(
                "/api/v1/publications/{}/installments/{}/pages/{}",
                ordinal, installment_ordinal, index
            ),
        })
        .collect();

    Ok(Json(pages))
}

/// Serve the bytes of one page.
///
/// GET /api/v1/publications/:ordinal/installments/:installment/pages/:page
pub async fn get_page(
    State(state): State<Arc<ApiState>>,
    Path((ordinal, installment, page)): Path<(String, String, String)>,
) -> Result<Response, (StatusCode, String)> {
    let ordinal = parse_ordinal(&ordinal, "publication")?;
    let installment_ordinal = parse_ordinal(&installment, "installment")?;
    let page = parse_ordinal(&page, "page")?;
    let id = state.resolve(ordinal).await.map_err(error_response)?;

    let page = state
        .library
        .write()
        .await
        .page(&id, installment_ordinal, page)
        .map_err(error_response)?;

    Ok(page_response(page))
}
