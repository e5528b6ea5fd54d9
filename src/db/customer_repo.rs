// src/db/customer_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::catalog::Customer};

const CUSTOMER_COLUMNS: &str =
    "id, name, phone_number, address, note, initial_debt_afn, initial_debt_usd, order_index, created_at";

#[derive(Clone)]
pub struct CustomerRepository;

impl CustomerRepository {
    pub fn new() -> Self {
        Self
    }

    /// Inserts a customer at the end of the display order.
    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        name: &str,
        phone_number: &str,
        address: Option<&str>,
        note: Option<&str>,
        initial_debt_afn: Decimal,
        initial_debt_usd: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone_number, address, note, initial_debt_afn, initial_debt_usd, order_index)
            VALUES ($1, $2, $3, $4, $5, $6,
                    (SELECT COALESCE(MAX(order_index) + 1, 0) FROM customers))
            RETURNING id, name, phone_number, address, note, initial_debt_afn, initial_debt_usd, order_index, created_at
            "#,
        )
        .bind(name)
        .bind(phone_number)
        .bind(address)
        .bind(note)
        .bind(initial_debt_afn)
        .bind(initial_debt_usd)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict("Customer name must be unique");
                }
            }
            e.into()
        })
    }

    pub async fn get_customer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }

    pub async fn list_customers<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY order_index ASC, created_at ASC"
        ))
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }

    /// Newest-first page, optionally filtered by a case-insensitive name
    /// search.
    pub async fn page_customers<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{s}%"));
        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS} FROM customers
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
        Ok(customers)
    }

    pub async fn count_customers<'e, E>(
        &self,
        executor: E,
        search: Option<&str>,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pattern = search.map(|s| format!("%{s}%"));
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customers WHERE ($1::TEXT IS NULL OR name ILIKE $1)",
        )
        .bind(pattern)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    /// Full-row update; the service loads the current row and applies the
    /// caller's partial changes before calling this.
    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        customer: &Customer,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, phone_number = $3, address = $4, note = $5,
                initial_debt_afn = $6, initial_debt_usd = $7
            WHERE id = $1
            RETURNING id, name, phone_number, address, note, initial_debt_afn, initial_debt_usd, order_index, created_at
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone_number)
        .bind(&customer.address)
        .bind(&customer.note)
        .bind(customer.initial_debt_afn)
        .bind(customer.initial_debt_usd)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict("Customer name must be unique");
                }
            }
            e.into()
        })
    }
}
