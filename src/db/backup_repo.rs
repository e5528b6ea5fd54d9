// src/db/backup_repo.rs
//
// Whole-database export/import. Import rows keep their original ids and
// timestamps so references inside the file stay intact.

use sqlx::{Executor, Postgres};

use crate::{
    common::error::AppError,
    models::{
        backup::BackupBill,
        billing::{Bill, BillItem, Payment},
        catalog::{Category, Customer, Product},
        stock::StockMovement,
    },
};

#[derive(Clone)]
pub struct BackupRepository;

impl BackupRepository {
    pub fn new() -> Self {
        Self
    }

    // --- Export ---

    pub async fn all_customers<'e, E>(&self, executor: E) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone_number, address, note, initial_debt_afn, initial_debt_usd, order_index, created_at FROM customers ORDER BY created_at ASC",
        )
        .fetch_all(executor)
        .await?)
    }

    pub async fn all_categories<'e, E>(&self, executor: E) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY created_at ASC",
        )
        .fetch_all(executor)
        .await?)
    }

    pub async fn all_products<'e, E>(&self, executor: E) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, Product>(
            "SELECT id, name, current_price_per_package, currency_type, category_id, created_at, updated_at FROM products ORDER BY created_at ASC",
        )
        .fetch_all(executor)
        .await?)
    }

    pub async fn all_bills<'e, E>(&self, executor: E) -> Result<Vec<Bill>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, Bill>(
            "SELECT id, customer_id, temp_customer_name, bill_number, kind, status, sherkat_stock, mandawi_check, mandawi_check_number, bill_date, note, paid_afn, paid_usd, created_at FROM bills ORDER BY created_at ASC",
        )
        .fetch_all(executor)
        .await?)
    }

    pub async fn all_bill_items<'e, E>(&self, executor: E) -> Result<Vec<BillItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, BillItem>(
            "SELECT id, bill_id, product_id, number_of_packages, unit_price, currency, total_amount FROM bill_items",
        )
        .fetch_all(executor)
        .await?)
    }

    pub async fn all_payments<'e, E>(&self, executor: E) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, Payment>(
            "SELECT id, bill_id, payment_number, amount_paid, currency, payment_date, payment_method, note FROM payments ORDER BY payment_date ASC",
        )
        .fetch_all(executor)
        .await?)
    }

    pub async fn all_stocks<'e, E>(&self, executor: E) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        Ok(sqlx::query_as::<_, StockMovement>(
            "SELECT id, product_id, bill_id, quantity_change, movement_type, source_type, is_container, container_number, driver_name, bill_of_lading_number, arrival_date, leak_packages, note, created_at FROM stocks ORDER BY created_at ASC",
        )
        .fetch_all(executor)
        .await?)
    }

    // --- Import ---

    /// Wipes every application table in one shot. Import is destructive by
    /// contract: the file becomes the entire database.
    pub async fn truncate_all<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("TRUNCATE stocks, payments, bill_items, bills, products, categories, customers")
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_customer_row<'e, E>(
        &self,
        executor: E,
        customer: &Customer,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone_number, address, note, initial_debt_afn, initial_debt_usd, order_index, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone_number)
        .bind(&customer.address)
        .bind(&customer.note)
        .bind(customer.initial_debt_afn)
        .bind(customer.initial_debt_usd)
        .bind(customer.order_index)
        .bind(customer.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_category_row<'e, E>(
        &self,
        executor: E,
        category: &Category,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn insert_product_row<'e, E>(
        &self,
        executor: E,
        product: &Product,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, current_price_per_package, currency_type, category_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.current_price_per_package)
        .bind(product.currency_type)
        .bind(product.category_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_bill_row<'e, E>(&self, executor: E, bill: &BackupBill) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO bills (id, customer_id, temp_customer_name, bill_number, kind, status,
                               sherkat_stock, mandawi_check, mandawi_check_number, bill_date, note,
                               paid_afn, paid_usd, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(bill.id)
        .bind(bill.customer_id)
        .bind(&bill.temp_customer_name)
        .bind(&bill.bill_number)
        .bind(bill.resolved_kind())
        .bind(bill.status)
        .bind(bill.sherkat_stock)
        .bind(bill.mandawi_check)
        .bind(&bill.mandawi_check_number)
        .bind(bill.bill_date)
        .bind(&bill.note)
        .bind(bill.paid_afn)
        .bind(bill.paid_usd)
        .bind(bill.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_bill_item_row<'e, E>(
        &self,
        executor: E,
        item: &BillItem,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO bill_items (id, bill_id, product_id, number_of_packages, unit_price, currency, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(item.bill_id)
        .bind(item.product_id)
        .bind(item.number_of_packages)
        .bind(item.unit_price)
        .bind(item.currency)
        .bind(item.total_amount)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_payment_row<'e, E>(
        &self,
        executor: E,
        payment: &Payment,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO payments (id, bill_id, payment_number, amount_paid, currency, payment_date, payment_method, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id)
        .bind(payment.bill_id)
        .bind(&payment.payment_number)
        .bind(payment.amount_paid)
        .bind(payment.currency)
        .bind(payment.payment_date)
        .bind(&payment.payment_method)
        .bind(&payment.note)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_stock_row<'e, E>(
        &self,
        executor: E,
        movement: &StockMovement,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO stocks (id, product_id, bill_id, quantity_change, movement_type, source_type,
                                is_container, container_number, driver_name, bill_of_lading_number,
                                arrival_date, leak_packages, note, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(movement.id)
        .bind(movement.product_id)
        .bind(movement.bill_id)
        .bind(movement.quantity_change)
        .bind(movement.movement_type)
        .bind(movement.source_type)
        .bind(movement.is_container)
        .bind(&movement.container_number)
        .bind(&movement.driver_name)
        .bind(&movement.bill_of_lading_number)
        .bind(movement.arrival_date)
        .bind(movement.leak_packages)
        .bind(&movement.note)
        .bind(movement.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }
}
