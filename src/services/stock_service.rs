// src/services/stock_service.rs

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::normalize_opt},
    db::{stock_repo::NewStockMovement, CatalogRepository, StockRepository},
    models::stock::{StockHistory, StockLevel, StockMovementType, StockSourceType},
};

pub struct StockEntryInput {
    pub product_id: Uuid,
    pub quantity_change: f64,
    pub leak_packages: Option<f64>,
}

pub struct CreateStockInput {
    pub product_id: Option<Uuid>,
    pub quantity_change: Option<f64>,
    pub note: Option<String>,
    pub is_container: bool,
    pub container_number: Option<String>,
    pub driver_name: Option<String>,
    pub bill_of_lading_number: Option<String>,
    pub arrival_date: Option<DateTime<Utc>>,
    pub leak_packages: Option<f64>,
    /// Per-product entries for a container arrival.
    pub items: Vec<StockEntryInput>,
}

#[derive(Clone)]
pub struct StockService {
    stock_repo: StockRepository,
    catalog_repo: CatalogRepository,
}

impl StockService {
    pub fn new(stock_repo: StockRepository, catalog_repo: CatalogRepository) -> Self {
        Self { stock_repo, catalog_repo }
    }

    /// Records either one manual movement or a container batch (one row per
    /// product, sharing the container metadata). Returns how many rows were
    /// written.
    pub async fn create_movements<'e, A>(
        &self,
        acquirer: A,
        input: CreateStockInput,
    ) -> Result<usize, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let note = normalize_opt(input.note);
        let container_number = normalize_opt(input.container_number);
        let driver_name = normalize_opt(input.driver_name);
        let bill_of_lading_number = normalize_opt(input.bill_of_lading_number);

        if input.is_container && !input.items.is_empty() {
            let entries: Vec<(Uuid, i32, Option<i32>)> = input
                .items
                .iter()
                .filter_map(|item| {
                    let quantity = truncate_quantity(item.quantity_change)?;
                    let leak = item.leak_packages.and_then(truncate_count);
                    Some((item.product_id, quantity, leak))
                })
                .collect();
            if entries.is_empty() {
                return Err(AppError::validation("Container items are required"));
            }

            let mut tx = acquirer.begin().await?;

            let mut ids: Vec<Uuid> = entries.iter().map(|(id, _, _)| *id).collect();
            ids.sort_unstable();
            ids.dedup();
            let found = self.catalog_repo.products_by_ids(&mut *tx, &ids).await?;
            if found.len() != ids.len() {
                return Err(AppError::validation("Product not found for one or more items"));
            }

            for (product_id, quantity, leak) in &entries {
                self.stock_repo
                    .insert_movement(
                        &mut *tx,
                        &NewStockMovement {
                            product_id: *product_id,
                            bill_id: None,
                            quantity_change: *quantity,
                            movement_type: movement_type_for(*quantity),
                            source_type: StockSourceType::Container,
                            is_container: true,
                            container_number: container_number.as_deref(),
                            driver_name: driver_name.as_deref(),
                            bill_of_lading_number: bill_of_lading_number.as_deref(),
                            arrival_date: input.arrival_date,
                            leak_packages: *leak,
                            note: note.as_deref(),
                        },
                    )
                    .await?;
            }

            tx.commit().await?;
            tracing::info!(rows = entries.len(), "container movements recorded");
            return Ok(entries.len());
        }

        let product_id = input
            .product_id
            .ok_or_else(|| AppError::validation("Product id is required"))?;
        let quantity = input
            .quantity_change
            .and_then(truncate_quantity)
            .ok_or_else(|| AppError::validation("Quantity change must be a non-zero number"))?;

        let mut tx = acquirer.begin().await?;
        if self.catalog_repo.get_product(&mut *tx, product_id).await?.is_none() {
            return Err(AppError::not_found("Product not found"));
        }

        self.stock_repo
            .insert_movement(
                &mut *tx,
                &NewStockMovement {
                    product_id,
                    bill_id: None,
                    quantity_change: quantity,
                    movement_type: movement_type_for(quantity),
                    source_type: if input.is_container {
                        StockSourceType::Container
                    } else {
                        StockSourceType::Manual
                    },
                    is_container: input.is_container,
                    container_number: container_number.as_deref(),
                    driver_name: driver_name.as_deref(),
                    bill_of_lading_number: bill_of_lading_number.as_deref(),
                    arrival_date: input.arrival_date,
                    leak_packages: input.leak_packages.and_then(truncate_count),
                    note: note.as_deref(),
                },
            )
            .await?;
        tx.commit().await?;
        Ok(1)
    }

    pub async fn levels<'e, A>(&self, acquirer: A) -> Result<Vec<StockLevel>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        self.stock_repo.levels(&mut *conn).await
    }

    pub async fn history<'e, A>(
        &self,
        acquirer: A,
        product_id: Uuid,
    ) -> Result<StockHistory, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        let product = self
            .catalog_repo
            .get_product(&mut *conn, product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;
        let packages_available = self
            .stock_repo
            .balance_for_product(&mut *conn, product_id)
            .await?;
        let history = self.stock_repo.history_for_product(&mut *conn, product_id).await?;
        Ok(StockHistory {
            product_id: product.id,
            product_name: product.name,
            packages_available,
            history,
        })
    }
}

fn movement_type_for(quantity: i32) -> StockMovementType {
    if quantity > 0 {
        StockMovementType::In
    } else {
        StockMovementType::Out
    }
}

/// Truncates a raw quantity toward zero, rejecting zero, non-finite and
/// out-of-range values.
fn truncate_quantity(raw: f64) -> Option<i32> {
    if !raw.is_finite() {
        return None;
    }
    let truncated = raw.trunc();
    if truncated == 0.0 || truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
        return None;
    }
    Some(truncated as i32)
}

fn truncate_count(raw: f64) -> Option<i32> {
    if !raw.is_finite() {
        return None;
    }
    let truncated = raw.trunc();
    if truncated < i32::MIN as f64 || truncated > i32::MAX as f64 {
        return None;
    }
    Some(truncated as i32)
}
