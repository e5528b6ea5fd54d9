// src/config.rs

use std::{env, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        BackupRepository, BillRepository, CatalogRepository, CustomerRepository,
        PaymentRepository, StockRepository,
    },
    services::{
        BackupService, BillingService, CatalogService, CustomerService, PaymentService,
        StockService,
    },
};

/// Shared application state: the connection pool plus the service graph
/// built over it.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub customer_service: CustomerService,
    pub catalog_service: CatalogService,
    pub billing_service: BillingService,
    pub payment_service: PaymentService,
    pub stock_service: StockService,
    pub backup_service: BackupService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        // .env is optional; a real deployment sets the variables directly.
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await
            .context("failed to connect to the database")?;
        tracing::info!("database connection established");

        let customer_repo = CustomerRepository::new();
        let catalog_repo = CatalogRepository::new();
        let bill_repo = BillRepository::new();
        let payment_repo = PaymentRepository::new();
        let stock_repo = StockRepository::new();
        let backup_repo = BackupRepository::new();

        Ok(Self {
            db_pool,
            customer_service: CustomerService::new(
                customer_repo.clone(),
                bill_repo.clone(),
                payment_repo.clone(),
            ),
            catalog_service: CatalogService::new(catalog_repo.clone()),
            billing_service: BillingService::new(
                bill_repo.clone(),
                catalog_repo.clone(),
                customer_repo.clone(),
                payment_repo.clone(),
                stock_repo.clone(),
            ),
            payment_service: PaymentService::new(payment_repo, bill_repo, customer_repo),
            stock_service: StockService::new(stock_repo, catalog_repo),
            backup_service: BackupService::new(backup_repo),
        })
    }
}
