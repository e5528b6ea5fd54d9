// src/models/stock.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "stock_movement_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StockMovementType {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "stock_source_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StockSourceType {
    Manual,
    Container,
    Bill,
}

/// One append-only movement in a product's stock history. Current stock is
/// always the sum of quantity_change over the history, never a stored
/// running balance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Set when source_type is BILL.
    pub bill_id: Option<Uuid>,
    pub quantity_change: i32,
    pub movement_type: StockMovementType,
    pub source_type: StockSourceType,
    pub is_container: bool,
    pub container_number: Option<String>,
    pub driver_name: Option<String>,
    pub bill_of_lading_number: Option<String>,
    pub arrival_date: Option<DateTime<Utc>>,
    pub leak_packages: Option<i32>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Recomputed stock level for one product.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: Uuid,
    pub product_name: String,
    pub packages_available: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockHistory {
    pub product_id: Uuid,
    pub product_name: String,
    pub packages_available: i64,
    pub history: Vec<StockMovement>,
}
