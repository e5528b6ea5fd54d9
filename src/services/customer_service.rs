// src/services/customer_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::normalize_opt},
    db::{BillRepository, CustomerRepository, PaymentRepository},
    ledger::{self, BillLedgerView, CurrencyTotals, CustomerTotals},
    models::{
        billing::{BillDetail, CustomerDetail},
        catalog::{Customer, CustomerWithBalance, Page},
    },
};

const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Partial update for a customer. `None` leaves the field alone; for the
/// optional text fields a provided empty string clears the value.
#[derive(Debug, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub note: Option<String>,
    pub initial_debt_afn: Option<Decimal>,
    pub initial_debt_usd: Option<Decimal>,
}

impl CustomerChanges {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone_number.is_none()
            && self.address.is_none()
            && self.note.is_none()
            && self.initial_debt_afn.is_none()
            && self.initial_debt_usd.is_none()
    }
}

#[derive(Clone)]
pub struct CustomerService {
    customer_repo: CustomerRepository,
    bill_repo: BillRepository,
    payment_repo: PaymentRepository,
}

impl CustomerService {
    pub fn new(
        customer_repo: CustomerRepository,
        bill_repo: BillRepository,
        payment_repo: PaymentRepository,
    ) -> Self {
        Self { customer_repo, bill_repo, payment_repo }
    }

    pub async fn create_customer<'e, A>(
        &self,
        acquirer: A,
        name: &str,
        phone_number: &str,
        address: Option<String>,
        note: Option<String>,
        initial_debt_afn: Option<Decimal>,
        initial_debt_usd: Option<Decimal>,
    ) -> Result<Customer, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let name = name.trim();
        let phone_number = phone_number.trim();
        if name.is_empty() {
            return Err(AppError::validation("Customer name is required"));
        }
        if phone_number.is_empty() {
            return Err(AppError::validation("Phone number is required"));
        }

        let initial_debt_afn = initial_debt_afn.unwrap_or(Decimal::ZERO);
        let initial_debt_usd = initial_debt_usd.unwrap_or(Decimal::ZERO);
        if initial_debt_afn < Decimal::ZERO || initial_debt_usd < Decimal::ZERO {
            return Err(AppError::validation("Initial debt cannot be negative"));
        }

        let mut conn = acquirer.acquire().await?;
        let customer = self
            .customer_repo
            .create_customer(
                &mut *conn,
                name,
                phone_number,
                normalize_opt(address).as_deref(),
                normalize_opt(note).as_deref(),
                initial_debt_afn,
                initial_debt_usd,
            )
            .await?;

        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    pub async fn list_customers<'e, A>(
        &self,
        acquirer: A,
    ) -> Result<Vec<CustomerWithBalance>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        let customers = self.customer_repo.list_customers(&mut *conn).await?;
        let totals = self.totals_for(&mut conn, &customers).await?;
        Ok(with_balances(customers, totals))
    }

    pub async fn page_customers<'e, A>(
        &self,
        acquirer: A,
        search: Option<String>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page<CustomerWithBalance>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let search = normalize_opt(search);

        let mut conn = acquirer.acquire().await?;
        let total = self
            .customer_repo
            .count_customers(&mut *conn, search.as_deref())
            .await?;
        let customers = self
            .customer_repo
            .page_customers(&mut *conn, search.as_deref(), page_size, (page - 1) * page_size)
            .await?;
        let totals = self.totals_for(&mut conn, &customers).await?;

        Ok(Page {
            items: with_balances(customers, totals),
            total,
            page,
            page_size,
        })
    }

    pub async fn get_customer_detail<'e, A>(
        &self,
        acquirer: A,
        id: Uuid,
    ) -> Result<CustomerDetail, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        let customer = self
            .customer_repo
            .get_customer(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))?;

        let bills = self.bill_repo.bills_for_customer(&mut *conn, id).await?;
        let bill_ids: Vec<Uuid> = bills.iter().map(|b| b.id).collect();
        let mut items_by_bill: HashMap<Uuid, Vec<_>> = HashMap::new();
        for item in self
            .bill_repo
            .items_detail_for_bills(&mut *conn, &bill_ids)
            .await?
        {
            items_by_bill.entry(item.bill_id).or_default().push(item);
        }

        let bill_details: Vec<BillDetail> = bills
            .into_iter()
            .map(|bill| {
                let items = items_by_bill.remove(&bill.id).unwrap_or_default();
                let mut totals = CurrencyTotals::default();
                for item in &items {
                    totals.add(item.currency, item.total_amount);
                }
                BillDetail { bill, items, total_afn: totals.afn, total_usd: totals.usd }
            })
            .collect();

        let payments = self.payment_repo.payments_for_customer(&mut *conn, id).await?;

        let mut totals = self
            .totals_for(&mut conn, std::slice::from_ref(&customer))
            .await?;
        let balance = totals.remove(&customer.id).unwrap_or_default();

        Ok(CustomerDetail {
            customer,
            debt_afn: balance.debt.afn,
            debt_usd: balance.debt.usd,
            paid_afn: balance.paid.afn,
            paid_usd: balance.paid.usd,
            bills: bill_details,
            payments,
        })
    }

    pub async fn update_customer<'e, A>(
        &self,
        acquirer: A,
        id: Uuid,
        changes: CustomerChanges,
    ) -> Result<Customer, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        if changes.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }

        let mut tx = acquirer.begin().await?;

        let mut customer = self
            .customer_repo
            .get_customer(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))?;

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("Customer name is required"));
            }
            customer.name = name;
        }
        if let Some(phone) = changes.phone_number {
            let phone = phone.trim().to_string();
            if phone.is_empty() {
                return Err(AppError::validation("Phone number is required"));
            }
            customer.phone_number = phone;
        }
        if let Some(address) = changes.address {
            customer.address = normalize_opt(Some(address));
        }
        if let Some(note) = changes.note {
            customer.note = normalize_opt(Some(note));
        }
        if let Some(afn) = changes.initial_debt_afn {
            if afn < Decimal::ZERO {
                return Err(AppError::validation("Initial debt cannot be negative"));
            }
            customer.initial_debt_afn = afn;
        }
        if let Some(usd) = changes.initial_debt_usd {
            if usd < Decimal::ZERO {
                return Err(AppError::validation("Initial debt cannot be negative"));
            }
            customer.initial_debt_usd = usd;
        }

        let updated = self.customer_repo.update_customer(&mut *tx, &customer).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %updated.id, "customer updated");
        Ok(updated)
    }

    /// Derived balances for a set of customers, from the shared ledger
    /// aggregation over their bills, items and payments.
    async fn totals_for(
        &self,
        conn: &mut sqlx::PgConnection,
        customers: &[Customer],
    ) -> Result<HashMap<Uuid, CustomerTotals>, AppError> {
        if customers.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();

        let headers = self
            .bill_repo
            .ledger_headers_for_customers(&mut *conn, &ids)
            .await?;
        let item_sums = self.bill_repo.item_sums_for_customers(&mut *conn, &ids).await?;
        let payment_sums = self
            .bill_repo
            .payment_sums_for_customers(&mut *conn, &ids)
            .await?;

        let mut views: HashMap<Uuid, (Option<Uuid>, BillLedgerView)> = headers
            .into_iter()
            .map(|h| {
                let view = BillLedgerView {
                    kind: h.kind,
                    item_totals: CurrencyTotals::default(),
                    baseline_paid: CurrencyTotals::new(h.paid_afn, h.paid_usd),
                    payment_totals: CurrencyTotals::default(),
                };
                (h.id, (h.customer_id, view))
            })
            .collect();

        for sum in item_sums {
            if let Some((_, view)) = views.get_mut(&sum.bill_id) {
                view.item_totals.add(sum.currency, sum.total);
            }
        }
        for sum in payment_sums {
            if let Some((_, view)) = views.get_mut(&sum.bill_id) {
                view.payment_totals.add(sum.currency, sum.total);
            }
        }

        let mut by_customer: HashMap<Uuid, Vec<BillLedgerView>> = HashMap::new();
        for (_, (customer_id, view)) in views {
            if let Some(customer_id) = customer_id {
                by_customer.entry(customer_id).or_default().push(view);
            }
        }

        let totals = customers
            .iter()
            .map(|customer| {
                let initial = CurrencyTotals::new(
                    customer.initial_debt_afn,
                    customer.initial_debt_usd,
                );
                let bills = by_customer.remove(&customer.id).unwrap_or_default();
                (customer.id, ledger::customer_totals(bills.iter(), &initial))
            })
            .collect();
        Ok(totals)
    }
}

fn with_balances(
    customers: Vec<Customer>,
    mut totals: HashMap<Uuid, CustomerTotals>,
) -> Vec<CustomerWithBalance> {
    customers
        .into_iter()
        .map(|customer| {
            let balance = totals.remove(&customer.id).unwrap_or_default();
            CustomerWithBalance {
                customer,
                debt_afn: balance.debt.afn,
                debt_usd: balance.debt.usd,
                paid_afn: balance.paid.afn,
                paid_usd: balance.paid.usd,
            }
        })
        .collect()
}
