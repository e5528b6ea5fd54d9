// src/db/bill_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        billing::{Bill, BillItem, BillItemDetail, BillKind, BillStatus},
        catalog::Currency,
    },
};

const BILL_COLUMNS: &str = "id, customer_id, temp_customer_name, bill_number, kind, status, \
     sherkat_stock, mandawi_check, mandawi_check_number, bill_date, note, paid_afn, paid_usd, created_at";

const ITEM_DETAIL_QUERY: &str = r#"
    SELECT bi.id, bi.bill_id, bi.product_id,
           p.name AS product_name,
           p.current_price_per_package,
           p.currency_type AS product_currency,
           bi.number_of_packages, bi.unit_price, bi.currency, bi.total_amount
    FROM bill_items bi
    JOIN products p ON p.id = bi.product_id
"#;

/// Column values for a new bill row. Paid baselines start at zero for
/// anything created through the API; only backup import writes them.
pub struct NewBill<'a> {
    pub customer_id: Option<Uuid>,
    pub temp_customer_name: Option<&'a str>,
    pub bill_number: Option<&'a str>,
    pub kind: BillKind,
    pub status: BillStatus,
    pub sherkat_stock: bool,
    pub mandawi_check: bool,
    pub mandawi_check_number: Option<&'a str>,
    pub bill_date: DateTime<Utc>,
    pub note: Option<&'a str>,
}

/// The bill fields the ledger arithmetic needs, without items or payments.
#[derive(Debug, Clone, FromRow)]
pub struct BillLedgerHeader {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub kind: BillKind,
    pub bill_date: DateTime<Utc>,
    pub paid_afn: Decimal,
    pub paid_usd: Decimal,
}

/// One (bill, currency) aggregate out of bill_items or payments.
#[derive(Debug, Clone, FromRow)]
pub struct CurrencySum {
    pub bill_id: Uuid,
    pub currency: Currency,
    pub total: Decimal,
}

/// Per-currency aggregate for a single bill.
#[derive(Debug, Clone, FromRow)]
pub struct PairSum {
    pub afn: Decimal,
    pub usd: Decimal,
}

#[derive(Clone)]
pub struct BillRepository;

impl BillRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_bill<'e, E>(&self, executor: E, bill: &NewBill<'_>) -> Result<Bill, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Bill>(&format!(
            r#"
            INSERT INTO bills (customer_id, temp_customer_name, bill_number, kind, status,
                               sherkat_stock, mandawi_check, mandawi_check_number, bill_date, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(bill.customer_id)
        .bind(bill.temp_customer_name)
        .bind(bill.bill_number)
        .bind(bill.kind)
        .bind(bill.status)
        .bind(bill.sherkat_stock)
        .bind(bill.mandawi_check)
        .bind(bill.mandawi_check_number)
        .bind(bill.bill_date)
        .bind(bill.note)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict("Bill number already exists");
                }
            }
            e.into()
        })
    }

    pub async fn get_bill<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Bill>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bill =
            sqlx::query_as::<_, Bill>(&format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1"))
                .bind(id)
                .fetch_optional(executor)
                .await?;
        Ok(bill)
    }

    /// All invoice bills, newest first. Synthetic bills never show up in
    /// the bill list.
    pub async fn list_invoices<'e, E>(&self, executor: E) -> Result<Vec<Bill>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE kind = 'INVOICE' ORDER BY bill_date DESC, created_at DESC"
        ))
        .fetch_all(executor)
        .await?;
        Ok(bills)
    }

    pub async fn bills_for_customer<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
    ) -> Result<Vec<Bill>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE customer_id = $1 ORDER BY bill_date DESC, created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(bills)
    }

    /// Finds the customer's synthetic bill of the given kind, if any.
    pub async fn find_bill_of_kind<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        kind: BillKind,
    ) -> Result<Option<Bill>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE customer_id = $1 AND kind = $2 LIMIT 1"
        ))
        .bind(customer_id)
        .bind(kind)
        .fetch_optional(executor)
        .await?;
        Ok(bill)
    }

    pub async fn update_bill_header<'e, E>(
        &self,
        executor: E,
        bill: &Bill,
    ) -> Result<Bill, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Bill>(&format!(
            r#"
            UPDATE bills
            SET customer_id = $2, temp_customer_name = $3, bill_number = $4, status = $5,
                sherkat_stock = $6, mandawi_check = $7, mandawi_check_number = $8,
                bill_date = $9, note = $10
            WHERE id = $1
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(bill.id)
        .bind(bill.customer_id)
        .bind(&bill.temp_customer_name)
        .bind(&bill.bill_number)
        .bind(bill.status)
        .bind(bill.sherkat_stock)
        .bind(bill.mandawi_check)
        .bind(&bill.mandawi_check_number)
        .bind(bill.bill_date)
        .bind(&bill.note)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict("Bill number already exists");
                }
            }
            e.into()
        })
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        bill_id: Uuid,
        status: BillStatus,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE bills SET status = $2 WHERE id = $1")
            .bind(bill_id)
            .bind(status)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_bill<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM bills WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // --- Items ---

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        bill_id: Uuid,
        product_id: Uuid,
        number_of_packages: i32,
        unit_price: Decimal,
        currency: Currency,
    ) -> Result<BillItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, BillItem>(
            r#"
            INSERT INTO bill_items (bill_id, product_id, number_of_packages, unit_price, currency, total_amount)
            VALUES ($1, $2, $3, $4, $5, $4 * $3)
            RETURNING id, bill_id, product_id, number_of_packages, unit_price, currency, total_amount
            "#,
        )
        .bind(bill_id)
        .bind(product_id)
        .bind(number_of_packages)
        .bind(unit_price)
        .bind(currency)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn delete_items_for_bill<'e, E>(&self, executor: E, bill_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM bill_items WHERE bill_id = $1")
            .bind(bill_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_items_for_bill<'e, E>(
        &self,
        executor: E,
        bill_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bill_items WHERE bill_id = $1")
            .bind(bill_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn items_detail_for_bill<'e, E>(
        &self,
        executor: E,
        bill_id: Uuid,
    ) -> Result<Vec<BillItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, BillItemDetail>(&format!(
            "{ITEM_DETAIL_QUERY} WHERE bi.bill_id = $1 ORDER BY p.name ASC"
        ))
        .bind(bill_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn items_detail_for_bills<'e, E>(
        &self,
        executor: E,
        bill_ids: &[Uuid],
    ) -> Result<Vec<BillItemDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, BillItemDetail>(&format!(
            "{ITEM_DETAIL_QUERY} WHERE bi.bill_id = ANY($1) ORDER BY p.name ASC"
        ))
        .bind(bill_ids)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    // --- Ledger aggregates ---

    pub async fn ledger_headers_for_customers<'e, E>(
        &self,
        executor: E,
        customer_ids: &[Uuid],
    ) -> Result<Vec<BillLedgerHeader>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let headers = sqlx::query_as::<_, BillLedgerHeader>(
            r#"
            SELECT id, customer_id, kind, bill_date, paid_afn, paid_usd
            FROM bills
            WHERE customer_id = ANY($1)
            ORDER BY bill_date ASC, created_at ASC
            "#,
        )
        .bind(customer_ids)
        .fetch_all(executor)
        .await?;
        Ok(headers)
    }

    pub async fn item_sums_for_customers<'e, E>(
        &self,
        executor: E,
        customer_ids: &[Uuid],
    ) -> Result<Vec<CurrencySum>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sums = sqlx::query_as::<_, CurrencySum>(
            r#"
            SELECT bi.bill_id, bi.currency, SUM(bi.total_amount) AS total
            FROM bill_items bi
            JOIN bills b ON b.id = bi.bill_id
            WHERE b.customer_id = ANY($1)
            GROUP BY bi.bill_id, bi.currency
            "#,
        )
        .bind(customer_ids)
        .fetch_all(executor)
        .await?;
        Ok(sums)
    }

    pub async fn payment_sums_for_customers<'e, E>(
        &self,
        executor: E,
        customer_ids: &[Uuid],
    ) -> Result<Vec<CurrencySum>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sums = sqlx::query_as::<_, CurrencySum>(
            r#"
            SELECT p.bill_id, p.currency, SUM(p.amount_paid) AS total
            FROM payments p
            JOIN bills b ON b.id = p.bill_id
            WHERE b.customer_id = ANY($1)
            GROUP BY p.bill_id, p.currency
            "#,
        )
        .bind(customer_ids)
        .fetch_all(executor)
        .await?;
        Ok(sums)
    }

    pub async fn item_totals_for_bill<'e, E>(
        &self,
        executor: E,
        bill_id: Uuid,
    ) -> Result<PairSum, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sums = sqlx::query_as::<_, PairSum>(
            r#"
            SELECT COALESCE(SUM(total_amount) FILTER (WHERE currency = 'AFN'), 0) AS afn,
                   COALESCE(SUM(total_amount) FILTER (WHERE currency = 'USD'), 0) AS usd
            FROM bill_items
            WHERE bill_id = $1
            "#,
        )
        .bind(bill_id)
        .fetch_one(executor)
        .await?;
        Ok(sums)
    }

    pub async fn payment_totals_for_bill<'e, E>(
        &self,
        executor: E,
        bill_id: Uuid,
    ) -> Result<PairSum, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sums = sqlx::query_as::<_, PairSum>(
            r#"
            SELECT COALESCE(SUM(amount_paid) FILTER (WHERE currency = 'AFN'), 0) AS afn,
                   COALESCE(SUM(amount_paid) FILTER (WHERE currency = 'USD'), 0) AS usd
            FROM payments
            WHERE bill_id = $1
            "#,
        )
        .bind(bill_id)
        .fetch_one(executor)
        .await?;
        Ok(sums)
    }
}
