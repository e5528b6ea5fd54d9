// src/services/billing_service.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::is_digits_only, serde_utils::normalize_opt},
    db::{
        bill_repo::NewBill, payment_repo::NewPayment, stock_repo::NewStockMovement,
        BillRepository, CatalogRepository, CustomerRepository, PaymentRepository, StockRepository,
    },
    ledger::{self, CurrencyTotals, NormalizedItem, RawItem},
    models::{
        billing::{Bill, BillDetail, BillKind, BillStatus},
        catalog::{Currency, Product},
        stock::{StockMovementType, StockSourceType},
    },
};

const BILL_DEDUCTION_NOTE: &str = "Bill deduction";

pub struct CreateBillInput {
    pub customer_id: Uuid,
    pub bill_number: String,
    pub status: BillStatus,
    pub sherkat_stock: bool,
    pub mandawi_check: bool,
    pub mandawi_check_number: Option<String>,
    pub paid_afn: Option<Decimal>,
    pub paid_usd: Option<Decimal>,
    pub bill_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub items: Vec<RawItem>,
}

/// Partial bill update. Items are always fully replaced; `Some("")` on the
/// optional text fields clears them.
pub struct UpdateBillInput {
    pub bill_number: Option<String>,
    pub sherkat_stock: Option<bool>,
    pub mandawi_check: Option<bool>,
    pub mandawi_check_number: Option<String>,
    pub bill_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub items: Vec<RawItem>,
}

#[derive(Clone)]
pub struct BillingService {
    bill_repo: BillRepository,
    catalog_repo: CatalogRepository,
    customer_repo: CustomerRepository,
    payment_repo: PaymentRepository,
    stock_repo: StockRepository,
}

impl BillingService {
    pub fn new(
        bill_repo: BillRepository,
        catalog_repo: CatalogRepository,
        customer_repo: CustomerRepository,
        payment_repo: PaymentRepository,
        stock_repo: StockRepository,
    ) -> Self {
        Self { bill_repo, catalog_repo, customer_repo, payment_repo, stock_repo }
    }

    pub async fn create_bill<'e, A>(
        &self,
        acquirer: A,
        input: CreateBillInput,
    ) -> Result<BillDetail, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let bill_number = input.bill_number.trim().to_string();
        if bill_number.is_empty() {
            return Err(AppError::validation("Bill number is required"));
        }
        if !is_digits_only(&bill_number) {
            return Err(AppError::validation("Bill number must be digits only"));
        }

        let mandawi_check_number = normalize_opt(input.mandawi_check_number);
        if let Some(number) = &mandawi_check_number {
            if !is_digits_only(number) {
                return Err(AppError::validation("Mandawi check number must be digits only"));
            }
        }
        // A check number implies the flag.
        let mandawi_check = input.mandawi_check || mandawi_check_number.is_some();

        if input.items.is_empty() {
            return Err(AppError::validation("At least one bill item is required"));
        }
        let items = ledger::normalize_items(&input.items);
        if items.is_empty() {
            return Err(AppError::validation("Invalid bill items"));
        }

        let mut tx = acquirer.begin().await?;

        if self
            .customer_repo
            .get_customer(&mut *tx, input.customer_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Customer not found"));
        }

        let products = self.load_products(&mut tx, &items).await?;
        let totals = item_totals(&items, &products);

        // How much is settled up front, dictated by the requested status.
        let paid = match input.status {
            BillStatus::Paid => totals,
            BillStatus::Partial => {
                let (afn, usd) = match (input.paid_afn, input.paid_usd) {
                    (Some(afn), Some(usd)) => (afn, usd),
                    _ => {
                        return Err(AppError::validation(
                            "Paid AFN and USD are required for partial bills",
                        ))
                    }
                };
                if afn < Decimal::ZERO || usd < Decimal::ZERO {
                    return Err(AppError::validation("Paid amounts cannot be negative"));
                }
                if afn > totals.afn || usd > totals.usd {
                    return Err(AppError::validation("Paid amounts cannot exceed totals"));
                }
                if afn.is_zero() && usd.is_zero() {
                    return Err(AppError::validation("Provide a paid amount for partial bills"));
                }
                CurrencyTotals::new(afn, usd)
            }
            BillStatus::Unpaid => CurrencyTotals::default(),
        };

        let bill = self
            .bill_repo
            .insert_bill(
                &mut *tx,
                &NewBill {
                    customer_id: Some(input.customer_id),
                    temp_customer_name: None,
                    bill_number: Some(&bill_number),
                    kind: BillKind::Invoice,
                    status: input.status,
                    sherkat_stock: input.sherkat_stock,
                    mandawi_check,
                    mandawi_check_number: mandawi_check_number.as_deref(),
                    bill_date: input.bill_date.unwrap_or_else(Utc::now),
                    note: normalize_opt(input.note).as_deref(),
                },
            )
            .await?;

        self.write_items_and_stock(&mut tx, &bill, &items, &products, input.sherkat_stock)
            .await?;

        let payment_method = if input.status == BillStatus::Paid { "Auto" } else { "Manual" };
        for (currency, amount) in [(Currency::Afn, paid.afn), (Currency::Usd, paid.usd)] {
            if amount > Decimal::ZERO {
                self.payment_repo
                    .insert_payment(
                        &mut *tx,
                        &NewPayment {
                            bill_id: bill.id,
                            payment_number: None,
                            amount_paid: amount,
                            currency,
                            payment_date: Utc::now(),
                            payment_method,
                            note: None,
                        },
                    )
                    .await?;
            }
        }

        let detail = self.load_detail(&mut tx, bill).await?;
        tx.commit().await?;

        tracing::info!(bill_id = %detail.bill.id, "bill created");
        Ok(detail)
    }

    pub async fn list_bills<'e, A>(&self, acquirer: A) -> Result<Vec<BillDetail>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        let bills = self.bill_repo.list_invoices(&mut *conn).await?;
        let bill_ids: Vec<Uuid> = bills.iter().map(|b| b.id).collect();

        let mut items_by_bill: HashMap<Uuid, Vec<_>> = HashMap::new();
        for item in self
            .bill_repo
            .items_detail_for_bills(&mut *conn, &bill_ids)
            .await?
        {
            items_by_bill.entry(item.bill_id).or_default().push(item);
        }

        Ok(bills
            .into_iter()
            .map(|bill| {
                let items = items_by_bill.remove(&bill.id).unwrap_or_default();
                let mut totals = CurrencyTotals::default();
                for item in &items {
                    totals.add(item.currency, item.total_amount);
                }
                BillDetail { bill, items, total_afn: totals.afn, total_usd: totals.usd }
            })
            .collect())
    }

    pub async fn update_bill<'e, A>(
        &self,
        acquirer: A,
        id: Uuid,
        input: UpdateBillInput,
    ) -> Result<BillDetail, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        if input.items.is_empty() {
            return Err(AppError::validation("At least one bill item is required"));
        }
        let items = ledger::normalize_items(&input.items);
        if items.is_empty() {
            return Err(AppError::validation("Invalid bill items"));
        }

        let mut tx = acquirer.begin().await?;

        let mut bill = self
            .bill_repo
            .get_bill(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Bill not found"))?;
        match bill.kind {
            BillKind::Invoice => {}
            BillKind::InitialDebt => {
                return Err(AppError::validation("Initial debt bills cannot be edited"))
            }
            BillKind::PaymentAdjustment => {
                return Err(AppError::validation("Adjustment bills cannot be edited"))
            }
        }

        if let Some(number) = input.bill_number {
            let number = number.trim().to_string();
            if number.is_empty() {
                return Err(AppError::validation("Bill number is required"));
            }
            if !is_digits_only(&number) {
                return Err(AppError::validation("Bill number must be digits only"));
            }
            bill.bill_number = Some(number);
        }
        if let Some(number) = input.mandawi_check_number {
            bill.mandawi_check_number = normalize_opt(Some(number));
            if let Some(number) = &bill.mandawi_check_number {
                if !is_digits_only(number) {
                    return Err(AppError::validation(
                        "Mandawi check number must be digits only",
                    ));
                }
            }
        }
        if let Some(flag) = input.sherkat_stock {
            bill.sherkat_stock = flag;
        }
        if let Some(flag) = input.mandawi_check {
            bill.mandawi_check = flag;
        }
        bill.mandawi_check = bill.mandawi_check || bill.mandawi_check_number.is_some();
        if let Some(date) = input.bill_date {
            bill.bill_date = date;
        }
        if let Some(note) = input.note {
            bill.note = normalize_opt(Some(note));
        }

        let products = self.load_products(&mut tx, &items).await?;
        let totals = item_totals(&items, &products);

        // Already-settled money must still fit under the new totals.
        let payment_sums = self.bill_repo.payment_totals_for_bill(&mut *tx, id).await?;
        let paid = CurrencyTotals::new(bill.paid_afn, bill.paid_usd)
            .plus(&CurrencyTotals::new(payment_sums.afn, payment_sums.usd));
        if paid.afn > totals.afn || paid.usd > totals.usd {
            return Err(AppError::validation("Paid amounts cannot exceed totals"));
        }
        bill.status = ledger::derive_status(&totals, &paid);

        self.bill_repo.delete_items_for_bill(&mut *tx, id).await?;
        self.stock_repo.delete_bill_movements(&mut *tx, id).await?;

        let bill = self.bill_repo.update_bill_header(&mut *tx, &bill).await?;
        let sherkat_stock = bill.sherkat_stock;
        self.write_items_and_stock(&mut tx, &bill, &items, &products, sherkat_stock)
            .await?;

        let detail = self.load_detail(&mut tx, bill).await?;
        tx.commit().await?;

        tracing::info!(bill_id = %detail.bill.id, "bill updated");
        Ok(detail)
    }

    pub async fn delete_bill<'e, A>(&self, acquirer: A, id: Uuid) -> Result<(), AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = acquirer.begin().await?;

        let bill = self
            .bill_repo
            .get_bill(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Bill not found"))?;
        match bill.kind {
            BillKind::Invoice => {}
            BillKind::InitialDebt => {
                return Err(AppError::validation("Initial debt bills cannot be deleted"))
            }
            BillKind::PaymentAdjustment => {
                return Err(AppError::validation("Adjustment bills cannot be deleted"))
            }
        }

        // Items and payments cascade; the deductions the bill made are
        // removed rather than reversed.
        self.stock_repo.delete_bill_movements(&mut *tx, id).await?;
        self.bill_repo.delete_bill(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(bill_id = %id, "bill deleted");
        Ok(())
    }

    async fn load_products(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        items: &[NormalizedItem],
    ) -> Result<HashMap<Uuid, Product>, AppError> {
        let mut ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products = self.catalog_repo.products_by_ids(&mut **tx, &ids).await?;
        let map: HashMap<Uuid, Product> = products.into_iter().map(|p| (p.id, p)).collect();
        if ids.iter().any(|id| !map.contains_key(id)) {
            return Err(AppError::validation("Product not found for one or more items"));
        }
        Ok(map)
    }

    async fn write_items_and_stock(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        bill: &Bill,
        items: &[NormalizedItem],
        products: &HashMap<Uuid, Product>,
        sherkat_stock: bool,
    ) -> Result<(), AppError> {
        for item in items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| AppError::validation("Product not found for one or more items"))?;
            let unit_price = item.unit_price.unwrap_or(product.current_price_per_package);

            self.bill_repo
                .insert_item(
                    &mut **tx,
                    bill.id,
                    item.product_id,
                    item.packages,
                    unit_price,
                    product.currency_type,
                )
                .await?;

            if !sherkat_stock {
                self.stock_repo
                    .insert_movement(
                        &mut **tx,
                        &NewStockMovement {
                            product_id: item.product_id,
                            bill_id: Some(bill.id),
                            quantity_change: -item.packages,
                            movement_type: StockMovementType::Out,
                            source_type: StockSourceType::Bill,
                            is_container: false,
                            container_number: None,
                            driver_name: None,
                            bill_of_lading_number: None,
                            arrival_date: None,
                            leak_packages: None,
                            note: Some(BILL_DEDUCTION_NOTE),
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn load_detail(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        bill: Bill,
    ) -> Result<BillDetail, AppError> {
        let items = self.bill_repo.items_detail_for_bill(&mut **tx, bill.id).await?;
        let mut totals = CurrencyTotals::default();
        for item in &items {
            totals.add(item.currency, item.total_amount);
        }
        Ok(BillDetail { bill, items, total_afn: totals.afn, total_usd: totals.usd })
    }
}

fn item_totals(items: &[NormalizedItem], products: &HashMap<Uuid, Product>) -> CurrencyTotals {
    let mut totals = CurrencyTotals::default();
    for item in items {
        if let Some(product) = products.get(&item.product_id) {
            let unit_price = item.unit_price.unwrap_or(product.current_price_per_package);
            totals.add(product.currency_type, unit_price * Decimal::from(item.packages));
        }
    }
    totals
}
