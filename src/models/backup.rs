// src/models/backup.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::billing::{
    BillItem, BillKind, BillStatus, Payment, INITIAL_DEBT_NOTE, PAYMENT_ADJUSTMENT_NOTE,
};
use super::catalog::{Category, Customer, Product};
use super::stock::StockMovement;

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupMeta {
    pub exported_at: DateTime<Utc>,
    pub version: u32,
}

/// Bill row as it travels through a backup file. `kind` is optional on the
/// way in because datasets exported before the kind column existed tagged
/// synthetic bills through their note text instead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupBill {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub temp_customer_name: Option<String>,
    pub bill_number: Option<String>,
    #[serde(default)]
    pub kind: Option<BillKind>,
    pub status: BillStatus,
    pub sherkat_stock: bool,
    pub mandawi_check: bool,
    pub mandawi_check_number: Option<String>,
    pub bill_date: DateTime<Utc>,
    pub note: Option<String>,
    #[serde(default, rename = "paidAFN")]
    pub paid_afn: Decimal,
    #[serde(default, rename = "paidUSD")]
    pub paid_usd: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::billing::Bill> for BackupBill {
    fn from(bill: crate::models::billing::Bill) -> Self {
        Self {
            id: bill.id,
            customer_id: bill.customer_id,
            temp_customer_name: bill.temp_customer_name,
            bill_number: bill.bill_number,
            kind: Some(bill.kind),
            status: bill.status,
            sherkat_stock: bill.sherkat_stock,
            mandawi_check: bill.mandawi_check,
            mandawi_check_number: bill.mandawi_check_number,
            bill_date: bill.bill_date,
            note: bill.note,
            paid_afn: bill.paid_afn,
            paid_usd: bill.paid_usd,
            created_at: bill.created_at,
        }
    }
}

impl BackupBill {
    pub fn resolved_kind(&self) -> BillKind {
        if let Some(kind) = self.kind {
            return kind;
        }
        match self.note.as_deref() {
            Some(INITIAL_DEBT_NOTE) => BillKind::InitialDebt,
            Some(PAYMENT_ADJUSTMENT_NOTE) => BillKind::PaymentAdjustment,
            _ => BillKind::Invoice,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub customers: Vec<Customer>,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub bills: Vec<BackupBill>,
    pub bill_items: Vec<BillItem>,
    pub payments: Vec<Payment>,
    pub stocks: Vec<StockMovement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    pub meta: BackupMeta,
    pub data: BackupData,
}

/// Per-table row counts reported after an import.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportCounts {
    pub customers: usize,
    pub categories: usize,
    pub products: usize,
    pub bills: usize,
    pub bill_items: usize,
    pub payments: usize,
    pub stocks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_payload() -> BackupPayload {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: "Ahmad Khan".into(),
            phone_number: "0700123456".into(),
            address: None,
            note: Some("Wholesale customer".into()),
            initial_debt_afn: Decimal::from_str("2500.50").unwrap(),
            initial_debt_usd: Decimal::ZERO,
            order_index: 0,
            created_at: "2026-02-01T08:30:00Z".parse().unwrap(),
        };
        let bill = BackupBill {
            id: Uuid::new_v4(),
            customer_id: Some(customer.id),
            temp_customer_name: None,
            bill_number: Some("1001".into()),
            kind: Some(BillKind::Invoice),
            status: BillStatus::Partial,
            sherkat_stock: false,
            mandawi_check: false,
            mandawi_check_number: None,
            bill_date: "2026-02-01T09:00:00Z".parse().unwrap(),
            note: None,
            paid_afn: Decimal::ZERO,
            paid_usd: Decimal::ZERO,
            created_at: "2026-02-01T09:00:00Z".parse().unwrap(),
        };
        BackupPayload {
            meta: BackupMeta {
                exported_at: "2026-02-10T12:00:00Z".parse().unwrap(),
                version: BACKUP_VERSION,
            },
            data: BackupData {
                customers: vec![customer],
                categories: vec![],
                products: vec![],
                bills: vec![bill],
                bill_items: vec![],
                payments: vec![],
                stocks: vec![],
            },
        }
    }

    #[test]
    fn backup_round_trips_decimals_and_dates_as_strings() {
        let payload = sample_payload();
        let json = serde_json::to_value(&payload).unwrap();

        // Decimals travel as strings, dates as ISO-8601.
        let customer = &json["data"]["customers"][0];
        assert_eq!(customer["initialDebtAFN"], serde_json::json!("2500.50"));
        assert_eq!(
            customer["createdAt"],
            serde_json::json!("2026-02-01T08:30:00Z")
        );

        let back: BackupPayload = serde_json::from_value(json).unwrap();
        assert_eq!(
            back.data.customers[0].initial_debt_afn,
            payload.data.customers[0].initial_debt_afn
        );
        assert_eq!(back.data.bills[0].bill_date, payload.data.bills[0].bill_date);
        assert_eq!(back.data.customers.len(), 1);
        assert_eq!(back.data.bills.len(), 1);
    }

    #[test]
    fn legacy_bills_resolve_kind_from_note() {
        let mut bill = sample_payload().data.bills.remove(0);
        bill.kind = None;
        bill.note = Some(INITIAL_DEBT_NOTE.into());
        assert_eq!(bill.resolved_kind(), BillKind::InitialDebt);

        bill.note = Some(PAYMENT_ADJUSTMENT_NOTE.into());
        assert_eq!(bill.resolved_kind(), BillKind::PaymentAdjustment);

        bill.note = Some("ordinary note".into());
        assert_eq!(bill.resolved_kind(), BillKind::Invoice);
    }
}
