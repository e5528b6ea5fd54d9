// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The two tracked currencies. Amounts in each are summed independently and
/// never converted or commingled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Afn,
    Usd,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    pub address: Option<String>,
    pub note: Option<String>,
    // Baseline owed before ledger tracking began.
    #[serde(rename = "initialDebtAFN")]
    pub initial_debt_afn: Decimal,
    #[serde(rename = "initialDebtUSD")]
    pub initial_debt_usd: Decimal,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// Customer plus the derived per-currency balances every list endpoint
/// returns. The debt/paid fields are computed, never stored.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithBalance {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(rename = "debtAFN")]
    pub debt_afn: Decimal,
    #[serde(rename = "debtUSD")]
    pub debt_usd: Decimal,
    #[serde(rename = "paidAFN")]
    pub paid_afn: Decimal,
    #[serde(rename = "paidUSD")]
    pub paid_usd: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Current price only; bill items snapshot the price at creation time.
    pub current_price_per_package: Decimal,
    pub currency_type: Currency,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Standard paginated list envelope.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
