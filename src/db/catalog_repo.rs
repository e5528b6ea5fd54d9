// src/db/catalog_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Category, Currency, Product},
};

const PRODUCT_COLUMNS: &str =
    "id, name, current_price_per_package, currency_type, category_id, created_at, updated_at";

/// Products and categories.
#[derive(Clone)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub fn new() -> Self {
        Self
    }

    // --- Categories ---

    pub async fn create_category<'e, E>(&self, executor: E, name: &str) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(category)
    }

    pub async fn list_categories<'e, E>(&self, executor: E) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(categories)
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(category)
    }

    pub async fn category_exists<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    /// Deletes a category. Products keep existing with their category
    /// cleared (FK is ON DELETE SET NULL).
    pub async fn delete_category<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // --- Products ---

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        name: &str,
        current_price_per_package: Decimal,
        currency_type: Currency,
        category_id: Option<Uuid>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, current_price_per_package, currency_type, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(current_price_per_package)
        .bind(currency_type)
        .bind(category_id)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn get_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn products_by_ids<'e, E>(
        &self,
        executor: E,
        ids: &[Uuid],
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn list_products<'e, E>(&self, executor: E) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"
        ))
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn page_products<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{s}%"));
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn count_products<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{s}%"));
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE ($1::TEXT IS NULL OR name ILIKE $1)",
        )
        .bind(pattern)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        product: &Product,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $2, current_price_per_package = $3, currency_type = $4,
                category_id = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id)
        .bind(&product.name)
        .bind(product.current_price_per_package)
        .bind(product.currency_type)
        .bind(product.category_id)
        .fetch_one(executor)
        .await?;
        Ok(updated)
    }

    pub async fn delete_product<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Whether any bill item still references the product. Products with
    /// billing history must not be deleted.
    pub async fn product_has_bill_items<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bill_items WHERE product_id = $1)")
                .bind(id)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }
}
