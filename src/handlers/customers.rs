// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, serde_utils::opt_decimal_lenient},
    config::AppState,
    models::{
        billing::CustomerDetail,
        catalog::{Customer, CustomerWithBalance, Page},
    },
    services::customer_service::CustomerChanges,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    pub address: Option<String>,
    pub note: Option<String>,
    #[serde(default, rename = "initialDebtAFN", deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>, example = "2500.50")]
    pub initial_debt_afn: Option<Decimal>,
    #[serde(default, rename = "initialDebtUSD", deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>, example = "0")]
    pub initial_debt_usd: Option<Decimal>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub note: Option<String>,
    #[serde(default, rename = "initialDebtAFN", deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>)]
    pub initial_debt_afn: Option<Decimal>,
    #[serde(default, rename = "initialDebtUSD", deserialize_with = "opt_decimal_lenient")]
    #[schema(value_type = Option<String>)]
    pub initial_debt_usd: Option<Decimal>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Customer name already taken")
    )
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_service
        .create_customer(
            &app_state.db_pool,
            &payload.name,
            &payload.phone_number,
            payload.address,
            payload.note,
            payload.initial_debt_afn,
            payload.initial_debt_usd,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses(
        (status = 200, description = "All customers with derived balances", body = Vec<CustomerWithBalance>)
    )
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state
        .customer_service
        .list_customers(&app_state.db_pool)
        .await?;
    Ok((StatusCode::OK, Json(customers)))
}

// GET /api/customers/paged
#[utoipa::path(
    get,
    path = "/api/customers/paged",
    tag = "Customers",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of customers with derived balances", body = Page<CustomerWithBalance>)
    )
)]
pub async fn page_customers(
    State(app_state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state
        .customer_service
        .page_customers(&app_state.db_pool, query.search, query.page, query.page_size)
        .await?;
    Ok((StatusCode::OK, Json(page)))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer with balances, bills and payments", body = CustomerDetail),
        (status = 404, description = "Customer not found")
    )
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .customer_service
        .get_customer_detail(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(detail)))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = UpdateCustomerPayload,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer name already taken")
    )
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state
        .customer_service
        .update_customer(
            &app_state.db_pool,
            id,
            CustomerChanges {
                name: payload.name,
                phone_number: payload.phone_number,
                address: payload.address,
                note: payload.note,
                initial_debt_afn: payload.initial_debt_afn,
                initial_debt_usd: payload.initial_debt_usd,
            },
        )
        .await?;
    Ok((StatusCode::OK, Json(customer)))
}
