// src/handlers/bills.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, serde_utils::opt_decimal_lenient},
    config::AppState,
    ledger::RawItem,
    models::billing::{BillDetail, BillStatus},
    services::billing_service::{CreateBillInput, UpdateBillInput},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillItemPayload {
    pub product_id: Uuid,
    /// Fractional counts are floored; non-positive entries are dropped.
    pub number_of_packages: f64,
    /// Price override for this line; defaults to the product's current
    /// price.
    #[serde(default, deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
}

impl From<&BillItemPayload> for RawItem {
    fn from(item: &BillItemPayload) -> Self {
        RawItem {
            product_id: item.product_id,
            number_of_packages: item.number_of_packages,
            unit_price: item.unit_price,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillPayload {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "Bill number is required"))]
    pub bill_number: String,
    #[serde(default)]
    pub status: Option<BillStatus>,
    #[serde(default)]
    pub sherkat_stock: bool,
    #[serde(default)]
    pub mandawi_check: bool,
    pub mandawi_check_number: Option<String>,
    #[serde(default, rename = "paidAFN", deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>)]
    pub paid_afn: Option<Decimal>,
    #[serde(default, rename = "paidUSD", deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>)]
    pub paid_usd: Option<Decimal>,
    pub bill_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub items: Vec<BillItemPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillPayload {
    pub bill_number: Option<String>,
    pub sherkat_stock: Option<bool>,
    pub mandawi_check: Option<bool>,
    pub mandawi_check_number: Option<String>,
    pub bill_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<BillItemPayload>,
}

// POST /api/bills
#[utoipa::path(
    post,
    path = "/api/bills",
    tag = "Bills",
    request_body = CreateBillPayload,
    responses(
        (status = 201, description = "Bill created with items, stock deductions and up-front payments", body = BillDetail),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Bill number already exists")
    )
)]
pub async fn create_bill(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateBillPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let items: Vec<RawItem> = payload.items.iter().map(RawItem::from).collect();
    let detail = app_state
        .billing_service
        .create_bill(
            &app_state.db_pool,
            CreateBillInput {
                customer_id: payload.customer_id,
                bill_number: payload.bill_number,
                status: payload.status.unwrap_or(BillStatus::Unpaid),
                sherkat_stock: payload.sherkat_stock,
                mandawi_check: payload.mandawi_check,
                mandawi_check_number: payload.mandawi_check_number,
                paid_afn: payload.paid_afn,
                paid_usd: payload.paid_usd,
                bill_date: payload.bill_date,
                note: payload.note,
                items,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// GET /api/bills
#[utoipa::path(
    get,
    path = "/api/bills",
    tag = "Bills",
    responses(
        (status = 200, description = "Invoices newest first, with items and totals", body = Vec<BillDetail>)
    )
)]
pub async fn list_bills(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let bills = app_state.billing_service.list_bills(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(bills)))
}

// PUT /api/bills/{id}
#[utoipa::path(
    put,
    path = "/api/bills/{id}",
    tag = "Bills",
    params(("id" = Uuid, Path, description = "Bill id")),
    request_body = UpdateBillPayload,
    responses(
        (status = 200, description = "Bill updated, items and stock deductions rewritten", body = BillDetail),
        (status = 400, description = "Invalid payload or synthetic bill"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill number already exists")
    )
)]
pub async fn update_bill(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBillPayload>,
) -> Result<impl IntoResponse, AppError> {
    let items: Vec<RawItem> = payload.items.iter().map(RawItem::from).collect();
    let detail = app_state
        .billing_service
        .update_bill(
            &app_state.db_pool,
            id,
            UpdateBillInput {
                bill_number: payload.bill_number,
                sherkat_stock: payload.sherkat_stock,
                mandawi_check: payload.mandawi_check,
                mandawi_check_number: payload.mandawi_check_number,
                bill_date: payload.bill_date,
                note: payload.note,
                items,
            },
        )
        .await?;
    Ok((StatusCode::OK, Json(detail)))
}

// DELETE /api/bills/{id}
#[utoipa::path(
    delete,
    path = "/api/bills/{id}",
    tag = "Bills",
    params(("id" = Uuid, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Bill deleted with its items, payments and stock deductions"),
        (status = 400, description = "Synthetic bills cannot be deleted"),
        (status = 404, description = "Bill not found")
    )
)]
pub async fn delete_bill(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.billing_service.delete_bill(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
