//! Product route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use fastlanche_core::{CategoryId, ProductId};

use crate::db::products::ProductListing;
use crate::error::{ApiJson, Result};
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
}

/// GET /api/products[?categoryId=]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<ApiJson<Vec<Product>>> {
    let products = state
        .catalog()
        .list_products(ProductListing::All(query.category_id))
        .await?;
    Ok(ApiJson(products))
}

/// GET /api/products/featured
pub async fn featured(State(state): State<AppState>) -> Result<ApiJson<Vec<Product>>> {
    Ok(ApiJson(
        state.catalog().list_products(ProductListing::Featured).await?,
    ))
}

/// GET /api/products/promotions
pub async fn promotions(State(state): State<AppState>) -> Result<ApiJson<Vec<Product>>> {
    Ok(ApiJson(
        state.catalog().list_products(ProductListing::Promotions).await?,
    ))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<ApiJson<Product>> {
    Ok(ApiJson(state.catalog().get_product(id).await?))
}

/// POST /api/products
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewProduct>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().create_product(&body).await?;
    Ok((StatusCode::CREATED, ApiJson(product)))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    ApiJson(body): ApiJson<ProductUpdate>,
) -> Result<ApiJson<Product>> {
    Ok(ApiJson(state.catalog().update_product(id, &body).await?))
}

/// DELETE /api/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.catalog().delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
