// src/db/stock_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::stock::{StockLevel, StockMovement, StockMovementType, StockSourceType},
};

const STOCK_COLUMNS: &str = "id, product_id, bill_id, quantity_change, movement_type, source_type, \
     is_container, container_number, driver_name, bill_of_lading_number, arrival_date, \
     leak_packages, note, created_at";

/// A new stock ledger entry. `quantity_change` is signed: positive for IN
/// movements, negative for OUT, so balances are a plain SUM.
pub struct NewStockMovement<'a> {
    pub product_id: Uuid,
    pub bill_id: Option<Uuid>,
    pub quantity_change: i32,
    pub movement_type: StockMovementType,
    pub source_type: StockSourceType,
    pub is_container: bool,
    pub container_number: Option<&'a str>,
    pub driver_name: Option<&'a str>,
    pub bill_of_lading_number: Option<&'a str>,
    pub arrival_date: Option<DateTime<Utc>>,
    pub leak_packages: Option<i32>,
    pub note: Option<&'a str>,
}

#[derive(Clone)]
pub struct StockRepository;

impl StockRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        movement: &NewStockMovement<'_>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, StockMovement>(&format!(
            r#"
            INSERT INTO stocks (product_id, bill_id, quantity_change, movement_type, source_type,
                                is_container, container_number, driver_name, bill_of_lading_number,
                                arrival_date, leak_packages, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {STOCK_COLUMNS}
            "#
        ))
        .bind(movement.product_id)
        .bind(movement.bill_id)
        .bind(movement.quantity_change)
        .bind(movement.movement_type)
        .bind(movement.source_type)
        .bind(movement.is_container)
        .bind(movement.container_number)
        .bind(movement.driver_name)
        .bind(movement.bill_of_lading_number)
        .bind(movement.arrival_date)
        .bind(movement.leak_packages)
        .bind(movement.note)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    /// Current balance per product, recomputed from the movement history.
    /// Products with no movements report zero.
    pub async fn levels<'e, E>(&self, executor: E) -> Result<Vec<StockLevel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let levels = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name,
                   COALESCE(SUM(s.quantity_change), 0)::BIGINT AS packages_available
            FROM products p
            LEFT JOIN stocks s ON s.product_id = p.id
            GROUP BY p.id, p.name
            ORDER BY p.name ASC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(levels)
    }

    pub async fn balance_for_product<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity_change), 0)::BIGINT FROM stocks WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(balance)
    }

    pub async fn history_for_product<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let history = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {STOCK_COLUMNS} FROM stocks WHERE product_id = $1 ORDER BY created_at DESC"
        ))
        .bind(product_id)
        .fetch_all(executor)
        .await?;
        Ok(history)
    }

    /// Removes the deductions a bill made, used when the bill is deleted or
    /// its items are rewritten.
    pub async fn delete_bill_movements<'e, E>(&self, executor: E, bill_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM stocks WHERE bill_id = $1 AND source_type = 'BILL'")
            .bind(bill_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
