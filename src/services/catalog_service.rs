// src/services/catalog_service.rs

use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::normalize_opt},
    db::CatalogRepository,
    models::catalog::{Category, Currency, Page, Product},
};

const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Partial update for a product.
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub current_price_per_package: Option<Decimal>,
    pub currency_type: Option<Currency>,
    /// `Some(None)` clears the category.
    pub category_id: Option<Option<Uuid>>,
}

impl ProductChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.current_price_per_package.is_none()
            && self.currency_type.is_none()
            && self.category_id.is_none()
    }
}

#[derive(Clone)]
pub struct CatalogService {
    catalog_repo: CatalogRepository,
}

impl CatalogService {
    pub fn new(catalog_repo: CatalogRepository) -> Self {
        Self { catalog_repo }
    }

    // --- Categories ---

    pub async fn create_category<'e, A>(&self, acquirer: A, name: &str) -> Result<Category, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Category name is required"));
        }
        let mut conn = acquirer.acquire().await?;
        self.catalog_repo.create_category(&mut *conn, name).await
    }

    pub async fn list_categories<'e, A>(&self, acquirer: A) -> Result<Vec<Category>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        self.catalog_repo.list_categories(&mut *conn).await
    }

    pub async fn rename_category<'e, A>(
        &self,
        acquirer: A,
        id: Uuid,
        name: &str,
    ) -> Result<Category, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Category name is required"));
        }
        let mut conn = acquirer.acquire().await?;
        self.catalog_repo
            .update_category(&mut *conn, id, name)
            .await?
            .ok_or_else(|| AppError::not_found("Category not found"))
    }

    pub async fn delete_category<'e, A>(&self, acquirer: A, id: Uuid) -> Result<(), AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        let deleted = self.catalog_repo.delete_category(&mut *conn, id).await?;
        if deleted == 0 {
            return Err(AppError::not_found("Category not found"));
        }
        Ok(())
    }

    // --- Products ---

    pub async fn create_product<'e, A>(
        &self,
        acquirer: A,
        name: &str,
        current_price_per_package: Decimal,
        currency_type: Currency,
        category_id: Option<Uuid>,
    ) -> Result<Product, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Product name is required"));
        }
        if current_price_per_package <= Decimal::ZERO {
            return Err(AppError::validation("Price must be positive"));
        }

        let mut conn = acquirer.acquire().await?;
        if let Some(category_id) = category_id {
            if !self.catalog_repo.category_exists(&mut *conn, category_id).await? {
                return Err(AppError::validation("Category not found"));
            }
        }

        let product = self
            .catalog_repo
            .create_product(&mut *conn, name, current_price_per_package, currency_type, category_id)
            .await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn list_products<'e, A>(&self, acquirer: A) -> Result<Vec<Product>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        self.catalog_repo.list_products(&mut *conn).await
    }

    pub async fn page_products<'e, A>(
        &self,
        acquirer: A,
        search: Option<String>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<Product>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let search = normalize_opt(search);

        let mut conn = acquirer.acquire().await?;
        let total = self
            .catalog_repo
            .count_products(&mut *conn, search.as_deref())
            .await?;
        let items = self
            .catalog_repo
            .page_products(&mut *conn, search.as_deref(), page_size, (page - 1) * page_size)
            .await?;

        Ok(Page { items, total, page, page_size })
    }

    pub async fn update_product<'e, A>(
        &self,
        acquirer: A,
        id: Uuid,
        changes: ProductChanges,
    ) -> Result<Product, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        if changes.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let mut tx = acquirer.begin().await?;

        let mut product = self
            .catalog_repo
            .get_product(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Product not found"))?;

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("Product name is required"));
            }
            product.name = name;
        }
        if let Some(price) = changes.current_price_per_package {
            if price <= Decimal::ZERO {
                return Err(AppError::validation("Price must be positive"));
            }
            product.current_price_per_package = price;
        }
        if let Some(currency) = changes.currency_type {
            product.currency_type = currency;
        }
        if let Some(category_id) = changes.category_id {
            if let Some(category_id) = category_id {
                if !self.catalog_repo.category_exists(&mut *tx, category_id).await? {
                    return Err(AppError::validation("Category not found"));
                }
            }
            product.category_id = category_id;
        }

        let updated = self.catalog_repo.update_product(&mut *tx, &product).await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_product<'e, A>(&self, acquirer: A, id: Uuid) -> Result<(), AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = acquirer.begin().await?;

        if self.catalog_repo.get_product(&mut *tx, id).await?.is_none() {
            return Err(AppError::not_found("Product not found"));
        }
        // Bill items snapshot prices but still reference the product row.
        if self.catalog_repo.product_has_bill_items(&mut *tx, id).await? {
            return Err(AppError::validation(
                "Cannot delete a product that appears on bills",
            ));
        }

        self.catalog_repo.delete_product(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
