pub mod backup_repo;
pub mod bill_repo;
pub mod catalog_repo;
pub mod customer_repo;
pub mod payment_repo;
pub mod stock_repo;

pub use backup_repo::BackupRepository;
pub use bill_repo::BillRepository;
pub use catalog_repo::CatalogRepository;
pub use customer_repo::CustomerRepository;
pub use payment_repo::PaymentRepository;
pub use stock_repo::StockRepository;
