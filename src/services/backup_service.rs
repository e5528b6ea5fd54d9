// src/services/backup_service.rs

use chrono::Utc;
use sqlx::{Acquire, Postgres};

use crate::{
    common::error::AppError,
    db::BackupRepository,
    models::backup::{
        BackupBill, BackupData, BackupMeta, BackupPayload, ImportCounts, BACKUP_VERSION,
    },
};

#[derive(Clone)]
pub struct BackupService {
    backup_repo: BackupRepository,
}

impl BackupService {
    pub fn new(backup_repo: BackupRepository) -> Self {
        Self { backup_repo }
    }

    pub async fn export<'e, A>(&self, acquirer: A) -> Result<BackupPayload, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;

        let customers = self.backup_repo.all_customers(&mut *conn).await?;
        let categories = self.backup_repo.all_categories(&mut *conn).await?;
        let products = self.backup_repo.all_products(&mut *conn).await?;
        let bills: Vec<BackupBill> = self
            .backup_repo
            .all_bills(&mut *conn)
            .await?
            .into_iter()
            .map(BackupBill::from)
            .collect();
        let bill_items = self.backup_repo.all_bill_items(&mut *conn).await?;
        let payments = self.backup_repo.all_payments(&mut *conn).await?;
        let stocks = self.backup_repo.all_stocks(&mut *conn).await?;

        Ok(BackupPayload {
            meta: BackupMeta { exported_at: Utc::now(), version: BACKUP_VERSION },
            data: BackupData {
                customers,
                categories,
                products,
                bills,
                bill_items,
                payments,
                stocks,
            },
        })
    }

    /// Destructive replace-all import. The file becomes the entire
    /// database; everything happens in one transaction so a bad file leaves
    /// the current data untouched.
    pub async fn import<'e, A>(&self, acquirer: A, payload: BackupPayload) -> Result<ImportCounts, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        if payload.meta.version > BACKUP_VERSION {
            return Err(AppError::validation("Unsupported backup version"));
        }

        let data = payload.data;
        let mut tx = acquirer.begin().await?;

        self.backup_repo.truncate_all(&mut *tx).await?;

        // Parents before children so every FK target exists when needed.
        for customer in &data.customers {
            self.backup_repo.insert_customer_row(&mut *tx, customer).await?;
        }
        for category in &data.categories {
            self.backup_repo.insert_category_row(&mut *tx, category).await?;
        }
        for product in &data.products {
            self.backup_repo.insert_product_row(&mut *tx, product).await?;
        }
        for bill in &data.bills {
            self.backup_repo.insert_bill_row(&mut *tx, bill).await?;
        }
        for item in &data.bill_items {
            self.backup_repo.insert_bill_item_row(&mut *tx, item).await?;
        }
        for payment in &data.payments {
            self.backup_repo.insert_payment_row(&mut *tx, payment).await?;
        }
        for movement in &data.stocks {
            self.backup_repo.insert_stock_row(&mut *tx, movement).await?;
        }

        tx.commit().await?;

        let counts = ImportCounts {
            customers: data.customers.len(),
            categories: data.categories.len(),
            products: data.products.len(),
            bills: data.bills.len(),
            bill_items: data.bill_items.len(),
            payments: data.payments.len(),
            stocks: data.stocks.len(),
        };
        tracing::info!(
            customers = counts.customers,
            bills = counts.bills,
            payments = counts.payments,
            "backup imported"
        );
        Ok(counts)
    }
}
