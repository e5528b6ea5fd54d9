pub mod backup_service;
pub mod billing_service;
pub mod catalog_service;
pub mod customer_service;
pub mod payment_service;
pub mod stock_service;

pub use backup_service::BackupService;
pub use billing_service::BillingService;
pub use catalog_service::CatalogService;
pub use customer_service::CustomerService;
pub use payment_service::PaymentService;
pub use stock_service::StockService;
