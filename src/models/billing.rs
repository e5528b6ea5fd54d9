// src/models/billing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::catalog::Currency;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "bill_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BillStatus {
    Unpaid,
    Partial,
    Paid,
}

/// What a bill row actually is. Regular invoices carry items; the two
/// synthetic kinds exist only to anchor payments that have no invoice:
/// `InitialDebt` bills settle the customer's pre-ledger baseline and
/// `PaymentAdjustment` bills carry legacy unallocated customer payments.
/// Synthetic bills are excluded from invoiced totals and cannot be edited
/// or deleted through the bill endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "bill_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillKind {
    #[default]
    Invoice,
    InitialDebt,
    PaymentAdjustment,
}

/// Display notes historically used to tag synthetic bills. Imports of old
/// datasets derive the kind from these.
pub const INITIAL_DEBT_NOTE: &str = "Initial debt adjustment";
pub const PAYMENT_ADJUSTMENT_NOTE: &str = "Customer payment adjustment";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    /// Set instead of customer_id for one-off walk-in sales.
    pub temp_customer_name: Option<String>,
    pub bill_number: Option<String>,
    pub kind: BillKind,
    pub status: BillStatus,
    /// Inventory for this sale is tracked by an external party; no local
    /// stock deduction happens.
    pub sherkat_stock: bool,
    pub mandawi_check: bool,
    pub mandawi_check_number: Option<String>,
    pub bill_date: DateTime<Utc>,
    pub note: Option<String>,
    /// Pre-ledger paid baseline, never mutated after import.
    #[serde(rename = "paidAFN")]
    pub paid_afn: Decimal,
    #[serde(rename = "paidUSD")]
    pub paid_usd: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub product_id: Uuid,
    pub number_of_packages: i32,
    /// Snapshot of the product price at bill creation.
    pub unit_price: Decimal,
    pub currency: Currency,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub payment_number: Option<String>,
    pub amount_paid: Decimal,
    pub currency: Currency,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub note: Option<String>,
}

// --- Read-side composites ---

/// Bill item joined with its product's display fields.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillItemDetail {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub current_price_per_package: Decimal,
    pub product_currency: Currency,
    pub number_of_packages: i32,
    pub unit_price: Decimal,
    pub currency: Currency,
    pub total_amount: Decimal,
}

/// Payment joined with its bill's reference number and customer name, for
/// the flat payment list.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub payment: Payment,
    pub bill_number: Option<String>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillDetail {
    #[serde(flatten)]
    pub bill: Bill,
    pub items: Vec<BillItemDetail>,
    #[serde(rename = "totalAFN")]
    pub total_afn: Decimal,
    #[serde(rename = "totalUSD")]
    pub total_usd: Decimal,
}

/// Full single-customer view: record, derived balances, bill history and
/// payment history.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub customer: super::catalog::Customer,
    #[serde(rename = "debtAFN")]
    pub debt_afn: Decimal,
    #[serde(rename = "debtUSD")]
    pub debt_usd: Decimal,
    #[serde(rename = "paidAFN")]
    pub paid_afn: Decimal,
    #[serde(rename = "paidUSD")]
    pub paid_usd: Decimal,
    pub bills: Vec<BillDetail>,
    pub payments: Vec<Payment>,
}
