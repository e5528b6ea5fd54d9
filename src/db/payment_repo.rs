// src/db/payment_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        billing::{Payment, PaymentDetail},
        catalog::Currency,
    },
};

const PAYMENT_COLUMNS: &str =
    "id, bill_id, payment_number, amount_paid, currency, payment_date, payment_method, note";

pub struct NewPayment<'a> {
    pub bill_id: Uuid,
    pub payment_number: Option<&'a str>,
    pub amount_paid: Decimal,
    pub currency: Currency,
    pub payment_date: DateTime<Utc>,
    pub payment_method: &'a str,
    pub note: Option<&'a str>,
}

#[derive(Clone)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_payment<'e, E>(
        &self,
        executor: E,
        payment: &NewPayment<'_>,
    ) -> Result<Payment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (bill_id, payment_number, amount_paid, currency, payment_date, payment_method, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment.bill_id)
        .bind(payment.payment_number)
        .bind(payment.amount_paid)
        .bind(payment.currency)
        .bind(payment.payment_date)
        .bind(payment.payment_method)
        .bind(payment.note)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn get_payment<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(payment)
    }

    /// Uniqueness pre-check for fresh payment numbers. Not a constraint:
    /// a customer-level payment fans out into several rows that share one
    /// number on purpose.
    pub async fn payment_number_exists<'e, E>(
        &self,
        executor: E,
        payment_number: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM payments WHERE payment_number = $1)")
                .bind(payment_number)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn payments_for_customer<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.id, p.bill_id, p.payment_number, p.amount_paid, p.currency,
                   p.payment_date, p.payment_method, p.note
            FROM payments p
            JOIN bills b ON b.id = p.bill_id
            WHERE b.customer_id = $1
            ORDER BY p.payment_date DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }

    pub async fn list_payments<'e, E>(&self, executor: E) -> Result<Vec<PaymentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, PaymentDetail>(
            r#"
            SELECT p.id, p.bill_id, p.payment_number, p.amount_paid, p.currency,
                   p.payment_date, p.payment_method, p.note,
                   b.bill_number,
                   COALESCE(c.name, b.temp_customer_name) AS customer_name
            FROM payments p
            JOIN bills b ON b.id = p.bill_id
            LEFT JOIN customers c ON c.id = b.customer_id
            ORDER BY p.payment_date DESC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }

    pub async fn delete_payment<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_payments_for_bill<'e, E>(
        &self,
        executor: E,
        bill_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE bill_id = $1")
            .bind(bill_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
