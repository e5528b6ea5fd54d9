// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        serde_utils::{decimal_lenient, double_option, opt_decimal_lenient},
    },
    config::AppState,
    models::catalog::{Currency, Page, Product},
    services::catalog_service::ProductChanges,
};

use super::customers::PageQuery;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[serde(deserialize_with = "decimal_lenient")]
    #[schema(value_type = String, example = "600")]
    pub current_price_per_package: Decimal,
    pub currency_type: Currency,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>)]
    pub current_price_per_package: Option<Decimal>,
    pub currency_type: Option<Currency>,
    /// Omit to keep the category, send null to clear it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state
        .catalog_service
        .create_product(
            &app_state.db_pool,
            &payload.name,
            payload.current_price_per_package,
            payload.currency_type,
            payload.category_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses((status = 200, description = "All products", body = Vec<Product>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.catalog_service.list_products(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(products)))
}

// GET /api/products/paged
#[utoipa::path(
    get,
    path = "/api/products/paged",
    tag = "Products",
    params(PageQuery),
    responses((status = 200, description = "One page of products", body = Page<Product>))
)]
pub async fn page_products(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .catalog_service
        .page_products(&app_state.db_pool, query.search, query.page, query.page_size)
        .await?;
    Ok((StatusCode::OK, Json(page)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state
        .catalog_service
        .update_product(
            &app_state.db_pool,
            id,
            ProductChanges {
                name: payload.name,
                current_price_per_package: payload.current_price_per_package,
                currency_type: payload.currency_type,
                category_id: payload.category_id,
            },
        )
        .await?;
    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 400, description = "Product appears on bills"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete_product(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
