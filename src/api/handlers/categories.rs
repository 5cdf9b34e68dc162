//! Category handlers.
//!
//! Categories are addressed by creation-order ordinal; the default category
//! is ordinal 0. Members are reported with their ordinals in the current
//! snapshot, and members the snapshot does not know yet are left out.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::catalog::{Category, CategoryId};
use crate::library::{CatalogSnapshot, Library};

use super::publications::PublicationResponse;
use super::{error_response, parse_ordinal};

/// Client view of a category.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Creation-order ordinal.
    pub id: usize,

    pub stable_id: CategoryId,
    pub name: String,
    pub default: bool,
    pub url: String,
    pub publication_count: usize,
}

impl CategoryResponse {
    pub fn new(ordinal: usize, category: &Category) -> Self {
        Self {
            id: ordinal,
            stable_id: category.id.clone(),
            name: category.name.clone(),
            default: category.default,
            url: format!("/api/v1/categories/{}", ordinal),
            publication_count: category.publications.len(),
        }
    }
}

/// A category with its members.
#[derive(Debug, Serialize)]
pub struct CategoryDetailResponse {
    #[serde(flatten)]
    pub category: CategoryResponse,

    pub publications: Vec<PublicationResponse>,
}

/// Body of a category creation request.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Body of a membership request.
#[derive(Debug, Deserialize)]
pub struct AddToCategoryRequest {
    /// Publication ordinal in the current snapshot.
    pub publication: i64,
}

/// List categories in creation order.
///
/// GET /api/v1/categories
pub async fn list_categories(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<CategoryResponse>>, (StatusCode, String)> {
    let library = state.library.read().await;
    let categories = library.categories().map_err(error_response)?;

    Ok(Json(
        categories
            .iter()
            .enumerate()
            .map(|(ordinal, category)| CategoryResponse::new(ordinal, category))
            .collect(),
    ))
}

/// Create a category. Creating an existing name returns that category.
///
/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryResponse>, (StatusCode, String)> {
    let mut library = state.library.write().await;
    let category = library.add_category(&request.name).map_err(error_response)?;

    let ordinal = library
        .categories()
        .map_err(error_response)?
        .iter()
        .position(|c| c.id == category.id)
        .unwrap_or(category.order);

    Ok(Json(CategoryResponse::new(ordinal, &category)))
}

/// Get a category and its members.
///
/// GET /api/v1/categories/:category
pub async fn get_category(
    State(state): State<Arc<ApiState>>,
    Path(category): Path<String>,
) -> Result<Json<CategoryDetailResponse>, (StatusCode, String)> {
    let ordinal = parse_ordinal(&category, "category")?;
    let snapshot = state.snapshot.read().await.clone();
    let library = state.library.read().await;

    let category = library.category_by_ordinal(ordinal).map_err(error_response)?;
    detail(&library, &snapshot, ordinal as usize, category)
}

/// Add a publication to a category.
///
/// POST /api/v1/categories/:category
pub async fn add_to_category(
    State(state): State<Arc<ApiState>>,
    Path(category): Path<String>,
    Json(request): Json<AddToCategoryRequest>,
) -> Result<Json<CategoryDetailResponse>, (StatusCode, String)> {
    let ordinal = parse_ordinal(&category, "category")?;
    let publication_id = state
        .resolve(request.publication)
        .await
        .map_err(error_response)?;
    let snapshot = state.snapshot.read().await.clone();

    let mut library = state.library.write().await;
    let category = library.category_by_ordinal(ordinal).map_err(error_response)?;
    let category = library
        .add_to_category(&category.id, &publication_id)
        .map_err(error_response)?;

    detail(&library, &snapshot, ordinal as usize, category)
}

fn detail(
    library: &Library,
    snapshot: &CatalogSnapshot,
    ordinal: usize,
    category: Category,
) -> Result<Json<CategoryDetailResponse>, (StatusCode, String)> {
    let members = library
        .publications_in_category(&category)
        .map_err(error_response)?;

    let publications = members
        .into_iter()
        .filter_map(|publication| {
            let position = snapshot.ordinal_of(&publication.id)?;
            Some(PublicationResponse::new(position, publication))
        })
        .collect();

    Ok(Json(CategoryDetailResponse {
        category: CategoryResponse::new(ordinal, &category),
        publications,
    }))
}
