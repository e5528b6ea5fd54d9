// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::page_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,

        // --- Catalog ---
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::page_products,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::categories::create_category,
        handlers::categories::list_categories,
        handlers::categories::rename_category,
        handlers::categories::delete_category,

        // --- Bills ---
        handlers::bills::create_bill,
        handlers::bills::list_bills,
        handlers::bills::update_bill,
        handlers::bills::delete_bill,

        // --- Payments ---
        handlers::payments::create_payment,
        handlers::payments::list_payments,
        handlers::payments::delete_payment,

        // --- Stock ---
        handlers::stocks::create_stock,
        handlers::stocks::list_stock_levels,
        handlers::stocks::stock_history,

        // --- Backup ---
        handlers::backup::export_backup,
        handlers::backup::import_backup,
    ),
    components(
        schemas(
            // --- Enums ---
            models::catalog::Currency,
            models::billing::BillStatus,
            models::billing::BillKind,
            models::stock::StockMovementType,
            models::stock::StockSourceType,

            // --- Models ---
            models::catalog::Customer,
            models::catalog::CustomerWithBalance,
            models::catalog::Category,
            models::catalog::Product,
            models::billing::Bill,
            models::billing::BillItem,
            models::billing::BillItemDetail,
            models::billing::BillDetail,
            models::billing::CustomerDetail,
            models::billing::Payment,
            models::billing::PaymentDetail,
            models::stock::StockMovement,
            models::stock::StockLevel,
            models::stock::StockHistory,
            models::backup::BackupMeta,
            models::backup::BackupBill,
            models::backup::BackupData,
            models::backup::BackupPayload,
            models::backup::ImportCounts,

            // --- Payloads ---
            handlers::customers::CreateCustomerPayload,
            handlers::customers::UpdateCustomerPayload,
            handlers::products::CreateProductPayload,
            handlers::products::UpdateProductPayload,
            handlers::categories::CategoryPayload,
            handlers::bills::BillItemPayload,
            handlers::bills::CreateBillPayload,
            handlers::bills::UpdateBillPayload,
            handlers::payments::CreatePaymentPayload,
            handlers::stocks::StockEntryPayload,
            handlers::stocks::CreateStockPayload,
        )
    ),
    tags(
        (name = "Customers", description = "Customer records and derived balances"),
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Bills", description = "Invoices, items and stock deductions"),
        (name = "Payments", description = "Bill and customer payments"),
        (name = "Stock", description = "Append-only stock ledger"),
        (name = "Backup", description = "Full dataset export and import"),
    ),
    info(
        title = "hisab-api",
        description = "Two-currency (AFN/USD) bookkeeping backend: customers, catalog, bills, payments, stock ledger and backups."
    )
)]
pub struct ApiDoc;
