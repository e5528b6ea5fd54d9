// src/ledger.rs
//
// Pure reconciliation logic shared by the bill, payment and customer
// endpoints. Everything here is plain arithmetic over decimals: no I/O, no
// executor, no clock. The handlers feed it rows, it hands back decisions.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::billing::{BillKind, BillStatus};
use crate::models::catalog::Currency;

/// A pair of per-currency amounts. AFN and USD are accumulated
/// independently and never converted into each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurrencyTotals {
    pub afn: Decimal,
    pub usd: Decimal,
}

impl CurrencyTotals {
    pub fn new(afn: Decimal, usd: Decimal) -> Self {
        Self { afn, usd }
    }

    pub fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Afn => self.afn,
            Currency::Usd => self.usd,
        }
    }

    pub fn add(&mut self, currency: Currency, amount: Decimal) {
        match currency {
            Currency::Afn => self.afn += amount,
            Currency::Usd => self.usd += amount,
        }
    }

    pub fn plus(&self, other: &CurrencyTotals) -> CurrencyTotals {
        CurrencyTotals {
            afn: self.afn + other.afn,
            usd: self.usd + other.usd,
        }
    }
}

/// The ledger-relevant slice of one bill: what kind it is, what its items
/// add up to, and what has been paid against it (pre-ledger baseline plus
/// live payment rows).
#[derive(Debug, Clone, Default)]
pub struct BillLedgerView {
    pub kind: BillKind,
    pub item_totals: CurrencyTotals,
    pub baseline_paid: CurrencyTotals,
    pub payment_totals: CurrencyTotals,
}

impl BillLedgerView {
    /// Total settled against this bill, baseline included.
    pub fn paid(&self) -> CurrencyTotals {
        self.baseline_paid.plus(&self.payment_totals)
    }

    /// Outstanding amount for one currency, floored at zero (over-payment
    /// never produces negative debt).
    pub fn remaining(&self, currency: Currency) -> Decimal {
        let remaining = self.item_totals.get(currency) - self.paid().get(currency);
        remaining.max(Decimal::ZERO)
    }
}

/// Status as a pure function of totals and paid amounts. Used identically
/// by bill creation, bill update and payment deletion.
pub fn derive_status(totals: &CurrencyTotals, paid: &CurrencyTotals) -> BillStatus {
    if paid.afn >= totals.afn && paid.usd >= totals.usd {
        BillStatus::Paid
    } else if paid.afn > Decimal::ZERO || paid.usd > Decimal::ZERO {
        BillStatus::Partial
    } else {
        BillStatus::Unpaid
    }
}

/// Derived per-customer balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerTotals {
    pub invoiced: CurrencyTotals,
    pub paid: CurrencyTotals,
    pub initial_paid: CurrencyTotals,
    pub debt: CurrencyTotals,
}

/// Aggregates a customer's bills into invoiced / paid / debt totals.
///
/// InitialDebt bills never count as invoiced amounts: whatever was settled
/// against them (baseline and payment rows alike) chips away at the
/// customer's initial-debt baseline instead. Everything else contributes
/// items to `invoiced` and settlements to `paid`, and
/// `debt = (invoiced - paid) + max(initial_debt - initial_paid, 0)`.
pub fn customer_totals<'a, I>(bills: I, initial_debt: &CurrencyTotals) -> CustomerTotals
where
    I: IntoIterator<Item = &'a BillLedgerView>,
{
    let mut totals = CustomerTotals::default();

    for bill in bills {
        let paid = bill.paid();
        if bill.kind == BillKind::InitialDebt {
            totals.initial_paid = totals.initial_paid.plus(&paid);
            continue;
        }
        totals.invoiced = totals.invoiced.plus(&bill.item_totals);
        totals.paid = totals.paid.plus(&paid);
    }

    let remaining_initial_afn = (initial_debt.afn - totals.initial_paid.afn).max(Decimal::ZERO);
    let remaining_initial_usd = (initial_debt.usd - totals.initial_paid.usd).max(Decimal::ZERO);
    totals.debt = CurrencyTotals {
        afn: totals.invoiced.afn - totals.paid.afn + remaining_initial_afn,
        usd: totals.invoiced.usd - totals.paid.usd + remaining_initial_usd,
    };

    totals
}

/// One slice of a customer-level payment applied to a concrete bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub bill_id: Uuid,
    pub amount: Decimal,
}

/// Greedy oldest-first allocation of a customer-level payment.
///
/// `outstanding` must be (bill id, remaining > 0) pairs ordered by bill
/// date ascending. Returns the per-bill slices plus whatever is left after
/// every bill is satisfied; the caller applies the leftover to the
/// customer's initial-debt baseline.
pub fn allocate_payment(
    amount: Decimal,
    outstanding: &[(Uuid, Decimal)],
) -> (Vec<Allocation>, Decimal) {
    let mut left = amount;
    let mut allocations = Vec::new();

    for &(bill_id, remaining) in outstanding {
        if left <= Decimal::ZERO {
            break;
        }
        let applied = remaining.min(left);
        if applied > Decimal::ZERO {
            allocations.push(Allocation { bill_id, amount: applied });
            left -= applied;
        }
    }

    (allocations, left)
}

/// A raw bill item as submitted by the caller, before normalization.
/// `unit_price` is an optional caller override; without it the current
/// product price gets snapshotted.
#[derive(Debug, Clone, Copy)]
pub struct RawItem {
    pub product_id: Uuid,
    pub number_of_packages: f64,
    pub unit_price: Option<Decimal>,
}

/// A bill item that survived normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedItem {
    pub product_id: Uuid,
    pub packages: i32,
    pub unit_price: Option<Decimal>,
}

/// Drops items with non-finite or non-positive counts and floors
/// fractional counts, discarding any that floor to zero.
pub fn normalize_items(items: &[RawItem]) -> Vec<NormalizedItem> {
    items
        .iter()
        .filter(|item| item.number_of_packages.is_finite() && item.number_of_packages > 0.0)
        .filter_map(|item| {
            let packages = item.number_of_packages.floor();
            if packages < 1.0 || packages > i32::MAX as f64 {
                return None;
            }
            Some(NormalizedItem {
                product_id: item.product_id,
                packages: packages as i32,
                unit_price: item.unit_price,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn afn(value: i64) -> CurrencyTotals {
        CurrencyTotals::new(Decimal::from(value), Decimal::ZERO)
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn status_is_paid_only_when_both_currencies_are_settled() {
        let totals = CurrencyTotals::new(dec(1200), dec(50));

        let fully = CurrencyTotals::new(dec(1200), dec(50));
        assert_eq!(derive_status(&totals, &fully), BillStatus::Paid);

        let one_currency_short = CurrencyTotals::new(dec(1200), dec(49));
        assert_eq!(derive_status(&totals, &one_currency_short), BillStatus::Partial);

        let nothing = CurrencyTotals::default();
        assert_eq!(derive_status(&totals, &nothing), BillStatus::Unpaid);

        // Over-payment still reads as paid.
        let over = CurrencyTotals::new(dec(1300), dec(50));
        assert_eq!(derive_status(&totals, &over), BillStatus::Paid);
    }

    #[test]
    fn status_holds_for_zero_total_bills() {
        // Synthetic bills have no items; any settlement marks them paid.
        let totals = CurrencyTotals::default();
        assert_eq!(derive_status(&totals, &totals), BillStatus::Paid);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let bill = BillLedgerView {
            kind: BillKind::Invoice,
            item_totals: afn(100),
            baseline_paid: afn(80),
            payment_totals: afn(40),
        };
        assert_eq!(bill.remaining(Currency::Afn), Decimal::ZERO);
        assert_eq!(bill.remaining(Currency::Usd), Decimal::ZERO);
    }

    #[test]
    fn customer_debt_combines_bills_and_initial_baseline() {
        let invoice = BillLedgerView {
            kind: BillKind::Invoice,
            item_totals: CurrencyTotals::new(dec(1200), dec(300)),
            baseline_paid: CurrencyTotals::default(),
            payment_totals: CurrencyTotals::new(dec(500), dec(300)),
        };
        let initial_debt_bill = BillLedgerView {
            kind: BillKind::InitialDebt,
            item_totals: CurrencyTotals::default(),
            baseline_paid: CurrencyTotals::default(),
            payment_totals: CurrencyTotals::new(dec(400), Decimal::ZERO),
        };

        let initial_debt = CurrencyTotals::new(dec(1000), Decimal::ZERO);
        let totals = customer_totals([&invoice, &initial_debt_bill], &initial_debt);

        assert_eq!(totals.invoiced.afn, dec(1200));
        assert_eq!(totals.paid.afn, dec(500));
        assert_eq!(totals.initial_paid.afn, dec(400));
        // (1200 - 500) + max(1000 - 400, 0)
        assert_eq!(totals.debt.afn, dec(1300));
        // USD side fully settled, no initial debt.
        assert_eq!(totals.debt.usd, Decimal::ZERO);
    }

    #[test]
    fn overpaid_initial_debt_never_produces_credit() {
        let initial_debt_bill = BillLedgerView {
            kind: BillKind::InitialDebt,
            payment_totals: afn(900),
            ..Default::default()
        };
        let totals = customer_totals([&initial_debt_bill], &afn(500));
        assert_eq!(totals.debt.afn, Decimal::ZERO);
    }

    #[test]
    fn allocation_exhausts_oldest_bills_first() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let outstanding = vec![(first, dec(100)), (second, dec(50))];

        let (allocations, leftover) = allocate_payment(dec(120), &outstanding);

        assert_eq!(
            allocations,
            vec![
                Allocation { bill_id: first, amount: dec(100) },
                Allocation { bill_id: second, amount: dec(20) },
            ]
        );
        assert_eq!(leftover, Decimal::ZERO);
    }

    #[test]
    fn allocation_leftover_spills_past_all_bills() {
        let only = Uuid::new_v4();
        let (allocations, leftover) = allocate_payment(dec(700), &[(only, dec(450))]);

        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].amount, dec(450));
        assert_eq!(leftover, dec(250));
    }

    #[test]
    fn allocation_of_zero_touches_nothing() {
        let (allocations, leftover) = allocate_payment(Decimal::ZERO, &[(Uuid::new_v4(), dec(10))]);
        assert!(allocations.is_empty());
        assert_eq!(leftover, Decimal::ZERO);
    }

    // The Cement scenario: 2 packages at AFN 600, PARTIAL with 300 paid.
    // A follow-up payment of exactly 900 settles the bill; anything more
    // must be rejected by the caller because remaining hits zero.
    #[test]
    fn cement_boundary_scenario() {
        let unit_price = dec(600);
        let packages = dec(2);
        let bill = BillLedgerView {
            kind: BillKind::Invoice,
            item_totals: CurrencyTotals::new(unit_price * packages, Decimal::ZERO),
            baseline_paid: CurrencyTotals::default(),
            payment_totals: afn(300),
        };
        assert_eq!(bill.item_totals.afn, dec(1200));
        assert_eq!(
            derive_status(&bill.item_totals, &bill.paid()),
            BillStatus::Partial
        );

        let remaining = bill.remaining(Currency::Afn);
        assert_eq!(remaining, dec(900));
        // Exactly-equal payment is accepted, one unit over is not.
        assert!(dec(900) <= remaining);
        assert!(dec(901) > remaining);
    }

    #[test]
    fn normalization_floors_and_drops_invalid_counts() {
        let keep = Uuid::new_v4();
        let fractional = Uuid::new_v4();
        let raw = |product_id, number_of_packages| RawItem {
            product_id,
            number_of_packages,
            unit_price: None,
        };
        let items = vec![
            raw(keep, 3.0),
            RawItem { product_id: fractional, number_of_packages: 2.9, unit_price: Some(dec(7)) },
            raw(Uuid::new_v4(), 0.4),
            raw(Uuid::new_v4(), -1.0),
            raw(Uuid::new_v4(), f64::NAN),
            raw(Uuid::new_v4(), f64::INFINITY),
        ];

        let normalized = normalize_items(&items);
        assert_eq!(
            normalized,
            vec![
                NormalizedItem { product_id: keep, packages: 3, unit_price: None },
                NormalizedItem { product_id: fractional, packages: 2, unit_price: Some(dec(7)) },
            ]
        );
    }

    #[test]
    fn currency_totals_accumulate_per_currency() {
        let mut totals = CurrencyTotals::default();
        totals.add(Currency::Afn, Decimal::from_f64(10.5).unwrap());
        totals.add(Currency::Afn, Decimal::from_f64(4.5).unwrap());
        totals.add(Currency::Usd, dec(3));
        assert_eq!(totals.afn, dec(15));
        assert_eq!(totals.usd, dec(3));
    }
}
