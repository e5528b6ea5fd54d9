// src/handlers/payments.rs

use axum::{
    extract::{Path, State},
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
    common::{error::AppError, serde_utils::decimal_lenient},
    config::AppState,
    models::{billing::PaymentDetail, catalog::Currency},
    services::payment_service::CreatePaymentInput,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentPayload {
    /// Pay one specific bill.
    pub bill_id: Option<Uuid>,
    /// Without a bill id, pay down the customer's oldest debts first.
    pub customer_id: Option<Uuid>,
    #[serde(deserialize_with = "decimal_lenient")]
    #[schema(value_type = String, example = "900")]
    pub amount_paid: Decimal,
    pub currency: Currency,
    #[validate(length(min = 1, message = "Payment number is required"))]
    pub payment_number: String,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

// POST /api/payments
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Payments",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Payment rows created (one per touched bill)"),
        (status = 400, description = "Invalid payload or payment exceeds outstanding balance"),
        (status = 404, description = "Bill or customer not found"),
        (status = 409, description = "Payment number already exists")
    )
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let payments = app_state
        .payment_service
        .create_payment(
            &app_state.db_pool,
            CreatePaymentInput {
                bill_id: payload.bill_id,
                customer_id: payload.customer_id,
                amount_paid: payload.amount_paid,
                currency: payload.currency,
                payment_number: payload.payment_number,
                payment_method: payload.payment_method,
                note: payload.note,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "payments": payments }))))
}

// GET /api/payments
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Payments",
    responses(
        (status = 200, description = "All payments newest first", body = Vec<PaymentDetail>)
    )
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let payments = app_state.payment_service.list_payments(&app_state.db_pool).await?;
    Ok((StatusCode::OK, Json(json!({ "payments": payments }))))
}

// DELETE /api/payments/{id}
#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    tag = "Payments",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment deleted, bill status re-derived"),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn delete_payment(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.payment_service.delete_payment(&app_state.db_pool, id).await?;
    Ok((StatusCode::OK, Json(json!({ "success": true }))))
}
