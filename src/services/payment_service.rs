// src/services/payment_service.rs

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Acquire, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, serde_utils::is_digits_only, serde_utils::normalize_opt},
    db::{
        bill_repo::NewBill, payment_repo::NewPayment, BillRepository, CustomerRepository,
        PaymentRepository,
    },
    ledger::{self, BillLedgerView, CurrencyTotals},
    models::{
        billing::{BillKind, BillStatus, Payment, PaymentDetail, INITIAL_DEBT_NOTE},
        catalog::Currency,
    },
};

pub struct CreatePaymentInput {
    /// Targeted payment against one bill.
    pub bill_id: Option<Uuid>,
    /// Customer-level payment, allocated oldest bill first.
    pub customer_id: Option<Uuid>,
    pub amount_paid: Decimal,
    pub currency: Currency,
    pub payment_number: String,
    pub payment_method: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone)]
pub struct PaymentService {
    payment_repo: PaymentRepository,
    bill_repo: BillRepository,
    customer_repo: CustomerRepository,
}

impl PaymentService {
    pub fn new(
        payment_repo: PaymentRepository,
        bill_repo: BillRepository,
        customer_repo: CustomerRepository,
    ) -> Self {
        Self { payment_repo, bill_repo, customer_repo }
    }

    pub async fn create_payment<'e, A>(
        &self,
        acquirer: A,
        input: CreatePaymentInput,
    ) -> Result<Vec<Payment>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        if input.amount_paid <= Decimal::ZERO {
            return Err(AppError::validation("Amount must be a positive number"));
        }
        let payment_number = input.payment_number.trim().to_string();
        if payment_number.is_empty() {
            return Err(AppError::validation("Payment number is required"));
        }
        if !is_digits_only(&payment_number) {
            return Err(AppError::validation("Payment number must be digits only"));
        }
        if input.bill_id.is_none() && input.customer_id.is_none() {
            return Err(AppError::validation(
                "Customer id is required when bill id is not provided",
            ));
        }

        let payment_method = normalize_opt(input.payment_method)
            .unwrap_or_else(|| "Manual".to_string());
        let note = normalize_opt(input.note);

        let mut tx = acquirer.begin().await?;

        if self
            .payment_repo
            .payment_number_exists(&mut *tx, &payment_number)
            .await?
        {
            return Err(AppError::conflict("Payment number already exists"));
        }

        let payments = if let Some(bill_id) = input.bill_id {
            self.pay_bill(
                &mut tx,
                bill_id,
                input.customer_id,
                input.amount_paid,
                input.currency,
                &payment_number,
                &payment_method,
                note.as_deref(),
            )
            .await?
        } else {
            // Checked above: customer_id is present when bill_id is not.
            let customer_id = input
                .customer_id
                .ok_or_else(|| AppError::validation("Customer id is required"))?;
            self.pay_customer(
                &mut tx,
                customer_id,
                input.amount_paid,
                input.currency,
                &payment_number,
                &payment_method,
                note.as_deref(),
            )
            .await?
        };

        tx.commit().await?;
        tracing::info!(
            payment_number = %payment_number,
            rows = payments.len(),
            "payment recorded"
        );
        Ok(payments)
    }

    #[allow(clippy::too_many_arguments)]
    async fn pay_bill(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        bill_id: Uuid,
        customer_id: Option<Uuid>,
        amount: Decimal,
        currency: Currency,
        payment_number: &str,
        payment_method: &str,
        note: Option<&str>,
    ) -> Result<Vec<Payment>, AppError> {
        let bill = self
            .bill_repo
            .get_bill(&mut **tx, bill_id)
            .await?
            .ok_or_else(|| AppError::not_found("Bill not found"))?;

        if let Some(customer_id) = customer_id {
            if bill.customer_id != Some(customer_id) {
                return Err(AppError::validation("Bill does not belong to customer"));
            }
        }

        let item_sums = self.bill_repo.item_totals_for_bill(&mut **tx, bill_id).await?;
        let payment_sums = self.bill_repo.payment_totals_for_bill(&mut **tx, bill_id).await?;

        let view = BillLedgerView {
            kind: bill.kind,
            item_totals: CurrencyTotals::new(item_sums.afn, item_sums.usd),
            baseline_paid: CurrencyTotals::new(bill.paid_afn, bill.paid_usd),
            payment_totals: CurrencyTotals::new(payment_sums.afn, payment_sums.usd),
        };

        // An exactly-equal payment settles the bill; any excess is rejected.
        let remaining = view.remaining(currency);
        if amount > remaining {
            return Err(AppError::validation("Payment exceeds outstanding balance"));
        }

        let payment = self
            .payment_repo
            .insert_payment(
                &mut **tx,
                &NewPayment {
                    bill_id,
                    payment_number: Some(payment_number),
                    amount_paid: amount,
                    currency,
                    payment_date: Utc::now(),
                    payment_method,
                    note,
                },
            )
            .await?;

        let mut paid = view.paid();
        paid.add(currency, amount);
        let status = ledger::derive_status(&view.item_totals, &paid);
        if status != bill.status {
            self.bill_repo.set_status(&mut **tx, bill_id, status).await?;
        }

        Ok(vec![payment])
    }

    /// Customer-level payment: applied to outstanding bills oldest first,
    /// one payment row per touched bill, all sharing the caller's number.
    /// Whatever survives the bills chips away at the initial-debt baseline
    /// through a synthetic INITIAL_DEBT bill.
    #[allow(clippy::too_many_arguments)]
    async fn pay_customer(
        &self,
        tx: &mut sqlx::Transaction<'_, Postgres>,
        customer_id: Uuid,
        amount: Decimal,
        currency: Currency,
        payment_number: &str,
        payment_method: &str,
        note: Option<&str>,
    ) -> Result<Vec<Payment>, AppError> {
        let customer = self
            .customer_repo
            .get_customer(&mut **tx, customer_id)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))?;

        let ids = [customer_id];
        let headers = self
            .bill_repo
            .ledger_headers_for_customers(&mut **tx, &ids)
            .await?;
        let item_sums = self.bill_repo.item_sums_for_customers(&mut **tx, &ids).await?;
        let payment_sums = self
            .bill_repo
            .payment_sums_for_customers(&mut **tx, &ids)
            .await?;

        // Headers arrive bill_date ascending; keep that order for allocation.
        let mut views: Vec<(Uuid, BillLedgerView)> = headers
            .into_iter()
            .map(|h| {
                (
                    h.id,
                    BillLedgerView {
                        kind: h.kind,
                        item_totals: CurrencyTotals::default(),
                        baseline_paid: CurrencyTotals::new(h.paid_afn, h.paid_usd),
                        payment_totals: CurrencyTotals::default(),
                    },
                )
            })
            .collect();
        let index: HashMap<Uuid, usize> =
            views.iter().enumerate().map(|(i, (id, _))| (*id, i)).collect();
        for sum in item_sums {
            if let Some(&i) = index.get(&sum.bill_id) {
                views[i].1.item_totals.add(sum.currency, sum.total);
            }
        }
        for sum in payment_sums {
            if let Some(&i) = index.get(&sum.bill_id) {
                views[i].1.payment_totals.add(sum.currency, sum.total);
            }
        }

        let mut initial_paid = Decimal::ZERO;
        let mut outstanding: Vec<(Uuid, Decimal)> = Vec::new();
        for (bill_id, view) in &views {
            if view.kind == BillKind::InitialDebt {
                initial_paid += view.paid().get(currency);
                continue;
            }
            let remaining = view.remaining(currency);
            if remaining > Decimal::ZERO {
                outstanding.push((*bill_id, remaining));
            }
        }

        let initial_debt = match currency {
            Currency::Afn => customer.initial_debt_afn,
            Currency::Usd => customer.initial_debt_usd,
        };
        let initial_remaining = (initial_debt - initial_paid).max(Decimal::ZERO);
        let total_remaining: Decimal =
            outstanding.iter().map(|(_, r)| *r).sum::<Decimal>() + initial_remaining;

        if total_remaining <= Decimal::ZERO {
            return Err(AppError::validation("No outstanding balance for this currency"));
        }
        if amount > total_remaining {
            return Err(AppError::validation("Payment exceeds outstanding balance"));
        }

        let (allocations, leftover) = ledger::allocate_payment(amount, &outstanding);

        let mut created = Vec::with_capacity(allocations.len() + 1);
        for allocation in &allocations {
            let payment = self
                .payment_repo
                .insert_payment(
                    &mut **tx,
                    &NewPayment {
                        bill_id: allocation.bill_id,
                        payment_number: Some(payment_number),
                        amount_paid: allocation.amount,
                        currency,
                        payment_date: Utc::now(),
                        payment_method,
                        note,
                    },
                )
                .await?;
            created.push(payment);

            if let Some(&i) = index.get(&allocation.bill_id) {
                let view = &mut views[i].1;
                view.payment_totals.add(currency, allocation.amount);
                let status = ledger::derive_status(&view.item_totals, &view.paid());
                self.bill_repo
                    .set_status(&mut **tx, allocation.bill_id, status)
                    .await?;
            }
        }

        if leftover > Decimal::ZERO {
            let anchor = match self
                .bill_repo
                .find_bill_of_kind(&mut **tx, customer_id, BillKind::InitialDebt)
                .await?
            {
                Some(bill) => bill,
                None => {
                    self.bill_repo
                        .insert_bill(
                            &mut **tx,
                            &NewBill {
                                customer_id: Some(customer_id),
                                temp_customer_name: None,
                                bill_number: None,
                                kind: BillKind::InitialDebt,
                                status: BillStatus::Partial,
                                sherkat_stock: true,
                                mandawi_check: false,
                                mandawi_check_number: None,
                                bill_date: Utc::now(),
                                note: Some(INITIAL_DEBT_NOTE),
                            },
                        )
                        .await?
                }
            };

            let payment = self
                .payment_repo
                .insert_payment(
                    &mut **tx,
                    &NewPayment {
                        bill_id: anchor.id,
                        payment_number: Some(payment_number),
                        amount_paid: leftover,
                        currency,
                        payment_date: Utc::now(),
                        payment_method,
                        note,
                    },
                )
                .await?;
            created.push(payment);
        }

        Ok(created)
    }

    pub async fn list_payments<'e, A>(&self, acquirer: A) -> Result<Vec<PaymentDetail>, AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut conn = acquirer.acquire().await?;
        self.payment_repo.list_payments(&mut *conn).await
    }

    pub async fn delete_payment<'e, A>(&self, acquirer: A, id: Uuid) -> Result<(), AppError>
    where
        A: Acquire<'e, Database = Postgres>,
    {
        let mut tx = acquirer.begin().await?;

        let payment = self
            .payment_repo
            .get_payment(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))?;
        let bill = self
            .bill_repo
            .get_bill(&mut *tx, payment.bill_id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))?;

        self.payment_repo.delete_payment(&mut *tx, id).await?;

        let remaining = self
            .payment_repo
            .count_payments_for_bill(&mut *tx, bill.id)
            .await?;
        let item_count = self.bill_repo.count_items_for_bill(&mut *tx, bill.id).await?;

        // An adjustment bill that anchored only this payment has no reason
        // to exist anymore.
        if bill.kind == BillKind::PaymentAdjustment && item_count == 0 && remaining == 0 {
            self.bill_repo.delete_bill(&mut *tx, bill.id).await?;
            tx.commit().await?;
            tracing::info!(payment_id = %id, bill_id = %bill.id, "payment and adjustment bill deleted");
            return Ok(());
        }

        let item_sums = self.bill_repo.item_totals_for_bill(&mut *tx, bill.id).await?;
        let payment_sums = self.bill_repo.payment_totals_for_bill(&mut *tx, bill.id).await?;
        let totals = CurrencyTotals::new(item_sums.afn, item_sums.usd);
        let paid = CurrencyTotals::new(bill.paid_afn, bill.paid_usd)
            .plus(&CurrencyTotals::new(payment_sums.afn, payment_sums.usd));

        let status = ledger::derive_status(&totals, &paid);
        if status != bill.status {
            self.bill_repo.set_status(&mut *tx, bill.id, status).await?;
        }

        tx.commit().await?;
        tracing::info!(payment_id = %id, "payment deleted");
        Ok(())
    }
}
