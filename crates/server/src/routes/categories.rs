//! Category route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use fastlanche_core::CategoryId;

use crate::error::{ApiJson, Result};
use crate::models::{Category, CategoryUpdate, NewCategory};
use crate::state::AppState;

/// GET /api/categories
pub async fn index(State(state): State<AppState>) -> Result<ApiJson<Vec<Category>>> {
    Ok(ApiJson(state.catalog().list_categories().await?))
}

/// GET /api/categories/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<ApiJson<Category>> {
    Ok(ApiJson(state.catalog().get_category(id).await?))
}

/// POST /api/categories
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewCategory>,
) -> Result<impl IntoResponse> {
    let category = state.catalog().create_category(&body).await?;
    Ok((StatusCode::CREATED, ApiJson(category)))
}

/// PUT /api/categories/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    ApiJson(body): ApiJson<CategoryUpdate>,
) -> Result<ApiJson<Category>> {
    Ok(ApiJson(state.catalog().update_category(id, &body).await?))
}

/// DELETE /api/categories/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    state.catalog().delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
