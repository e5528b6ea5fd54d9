// src/handlers/stocks.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::stock::{StockHistory, StockLevel},
    services::stock_service::{CreateStockInput, StockEntryInput},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockEntryPayload {
    pub product_id: Uuid,
    /// Signed package count; positive for arrivals, negative for removals.
    pub quantity_change: f64,
    pub leak_packages: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockPayload {
    pub product_id: Option<Uuid>,
    pub quantity_change: Option<f64>,
    pub note: Option<String>,
    #[serde(default)]
    pub is_container: bool,
    pub container_number: Option<String>,
    pub driver_name: Option<String>,
    pub bill_of_lading_number: Option<String>,
    pub arrival_date: Option<DateTime<Utc>>,
    pub leak_packages: Option<f64>,
    /// Per-product entries for a container arrival.
    #[serde(default)]
    pub items: Vec<StockEntryPayload>,
}

// POST /api/stocks
#[utoipa::path(
    post,
    path = "/api/stocks",
    tag = "Stock",
    request_body = CreateStockPayload,
    responses(
        (status = 201, description = "Movement rows recorded"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn create_stock(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    let items = payload
        .items
        .into_iter()
        .map(|item| StockEntryInput {
            product_id: item.product_id,
            quantity_change: item.quantity_change,
            leak_packages: item.leak_packages,
        })
        .collect();

    let created = app_state
        .stock_service
        .create_movements(
            &app_state.db_pool,
            CreateStockInput {
                product_id: payload.product_id,
                quantity_change: payload.quantity_change,
                note: payload.note,
                is_container: payload.is_container,
                container_number: payload.container_number,
                driver_name: payload.driver_name,
                bill_of_lading_number: payload.bill_of_lading_number,
                arrival_date: payload.arrival_date,
                leak_packages: payload.leak_packages,
                items,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "createdCount": created })),
    ))
}

// GET /api/stocks
#[utoipa::path(
    get,
    path = "/api/stocks",
    tag = "Stock",
    responses(
        (status = 200, description = "Recomputed balance per product", body = Vec<StockLevel>)
    )
)]
pub async fn list_stock_levels(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let levels = app_state.stock_service.levels(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(levels)))
}

// GET /api/stocks/{productId}
#[utoipa::path(
    get,
    path = "/api/stocks/{productId}",
    tag = "Stock",
    params(("productId" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Full movement history for one product", body = StockHistory),
        (status = 404, description = "Product not found")
    )
)]
pub async fn stock_history(
    State(app_state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let history = app_state.stock_service.history(&app_state.db_pool, product_id).await?;
    Ok((StatusCode::OK, Json(history)))
}
