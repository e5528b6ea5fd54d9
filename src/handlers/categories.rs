// src/handlers/categories.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::catalog::Category};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,
}

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categories",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let category = app_state
        .catalog_service
        .create_category(&app_state.db_pool, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    responses((status = 200, description = "All categories", body = Vec<Category>))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.catalog_service.list_categories(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(categories)))
}

// PATCH /api/categories/{id}
#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn rename_category(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let category = app_state
        .catalog_service
        .rename_category(&app_state.db_pool, id, &payload.name)
        .await?;
    Ok((StatusCode::OK, Json(category)))
}

// DELETE /api/categories/{id}
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted, products keep existing uncategorized"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete_category(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
