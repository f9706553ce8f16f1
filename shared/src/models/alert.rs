//! Expiration and low-stock alert rules
//!
//! The generator classifies each product and then reconciles the result with
//! the alert that is currently active for the same (product, category) pair.
//! Only alerts that are created or actually change are counted, which keeps
//! repeated sweeps idempotent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::product::{days_to_expire, effective_min_stock};

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Green,
    Yellow,
    Red,
}

impl AlertType {
    pub const ALL: [AlertType; 3] = [AlertType::Green, AlertType::Yellow, AlertType::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Green => "green",
            AlertType::Yellow => "yellow",
            AlertType::Red => "red",
        }
    }
}

text_enum!(AlertType, "alert type");

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    Expiry,
    LowStock,
}

impl AlertCategory {
    pub const ALL: [AlertCategory; 2] = [AlertCategory::Expiry, AlertCategory::LowStock];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Expiry => "expiry",
            AlertCategory::LowStock => "low_stock",
        }
    }
}

text_enum!(AlertCategory, "alert category");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Active,
    Resolved,
    Ignored,
}

impl AlertState {
    pub const ALL: [AlertState; 3] = [AlertState::Active, AlertState::Resolved, AlertState::Ignored];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Active => "active",
            AlertState::Resolved => "resolved",
            AlertState::Ignored => "ignored",
        }
    }
}

text_enum!(AlertState, "alert state");

/// Last day (inclusive) that still counts as urgent
pub const RED_MAX_DAYS: i64 = 13;
/// Last day (inclusive) that still counts as caution
pub const YELLOW_MAX_DAYS: i64 = 29;

/// Severity for a product expiring in `days` days
pub fn expiry_alert_type(days: i64) -> AlertType {
    if days <= RED_MAX_DAYS {
        AlertType::Red
    } else if days <= YELLOW_MAX_DAYS {
        AlertType::Yellow
    } else {
        AlertType::Green
    }
}

pub fn expiry_message(name: &str, days: i64) -> String {
    match expiry_alert_type(days) {
        AlertType::Red if days < 0 => format!("{} YA VENCIÓ hace {} días", name, days.abs()),
        AlertType::Red => format!("{} vence en {} días - URGENTE", name, days),
        AlertType::Yellow => format!("{} vence en {} días - PRECAUCIÓN", name, days),
        AlertType::Green => format!("{} vence en {} días - OK", name, days),
    }
}

pub fn low_stock_message(name: &str, quantity: i32, minimum: i32) -> String {
    format!(
        "{} - STOCK BAJO: {} unidades (mínimo: {})",
        name, quantity, minimum
    )
}

/// Alert the generator wants to be active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDraft {
    pub category: AlertCategory,
    pub alert_type: AlertType,
    pub message: String,
}

/// Product fields the generator reads
#[derive(Debug, Clone)]
pub struct AlertSubject<'a> {
    pub name: &'a str,
    pub quantity: i32,
    pub min_stock: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
}

/// Result of evaluating one product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductEvaluation {
    /// Expiry alert to keep active, if the product has stock and a known date
    pub expiry: Option<AlertDraft>,
    /// Low-stock alert to keep active; `None` means active ones get resolved
    pub low_stock: Option<AlertDraft>,
}

pub fn evaluate_product(subject: &AlertSubject<'_>, today: NaiveDate) -> ProductEvaluation {
    let expiry = match subject.expiration_date {
        Some(date) if subject.quantity > 0 => {
            let days = days_to_expire(date, today);
            Some(AlertDraft {
                category: AlertCategory::Expiry,
                alert_type: expiry_alert_type(days),
                message: expiry_message(subject.name, days),
            })
        }
        _ => None,
    };

    let minimum = effective_min_stock(subject.min_stock);
    let low_stock = (subject.quantity <= minimum).then(|| AlertDraft {
        category: AlertCategory::LowStock,
        alert_type: AlertType::Red,
        message: low_stock_message(subject.name, subject.quantity, minimum),
    });

    ProductEvaluation { expiry, low_stock }
}

/// What to do with an existing active alert given a fresh draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Create,
    Update,
    Unchanged,
}

/// Compares the current active alert (type and message) with the draft
pub fn reconcile(existing: Option<(AlertType, &str)>, draft: &AlertDraft) -> Reconciliation {
    match existing {
        None => Reconciliation::Create,
        Some((alert_type, message)) if alert_type == draft.alert_type && message == draft.message => {
            Reconciliation::Unchanged
        }
        Some(_) => Reconciliation::Update,
    }
}

/// Counts of alerts created or changed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSweepSummary {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
    pub low_stock: u32,
    pub total: u32,
}

impl AlertSweepSummary {
    /// Records a created or changed alert
    pub fn record(&mut self, draft: &AlertDraft) {
        match draft.category {
            AlertCategory::LowStock => self.low_stock += 1,
            AlertCategory::Expiry => match draft.alert_type {
                AlertType::Red => self.red += 1,
                AlertType::Yellow => self.yellow += 1,
                AlertType::Green => self.green += 1,
            },
        }
        self.total += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_expired_message() {
        assert_eq!(expiry_message("Pan", -3), "Pan YA VENCIÓ hace 3 días");
        assert_eq!(expiry_message("Pan", 0), "Pan vence en 0 días - URGENTE");
        assert_eq!(expiry_message("Pan", 20), "Pan vence en 20 días - PRECAUCIÓN");
        assert_eq!(expiry_message("Pan", 45), "Pan vence en 45 días - OK");
    }

    #[test]
    fn test_no_expiry_alert_without_stock() {
        let subject = AlertSubject {
            name: "Queque",
            quantity: 0,
            min_stock: None,
            expiration_date: Some(today()),
        };
        let evaluation = evaluate_product(&subject, today());
        assert!(evaluation.expiry.is_none());
        assert_eq!(
            evaluation.low_stock.map(|d| d.message),
            Some("Queque - STOCK BAJO: 0 unidades (mínimo: 5)".to_string())
        );
    }

    #[test]
    fn test_no_expiry_alert_without_date() {
        let subject = AlertSubject {
            name: "Harina",
            quantity: 40,
            min_stock: Some(10),
            expiration_date: None,
        };
        assert_eq!(evaluate_product(&subject, today()), ProductEvaluation::default());
    }

    #[test]
    fn test_reconcile() {
        let draft = AlertDraft {
            category: AlertCategory::Expiry,
            alert_type: AlertType::Yellow,
            message: "x".to_string(),
        };
        assert_eq!(reconcile(None, &draft), Reconciliation::Create);
        assert_eq!(reconcile(Some((AlertType::Yellow, "x")), &draft), Reconciliation::Unchanged);
        assert_eq!(reconcile(Some((AlertType::Red, "x")), &draft), Reconciliation::Update);
        assert_eq!(reconcile(Some((AlertType::Yellow, "y")), &draft), Reconciliation::Update);
    }

    #[test]
    fn test_summary_counts_low_stock_separately() {
        let mut summary = AlertSweepSummary::default();
        summary.record(&AlertDraft {
            category: AlertCategory::LowStock,
            alert_type: AlertType::Red,
            message: String::new(),
        });
        assert_eq!(summary.low_stock, 1);
        assert_eq!(summary.red, 0);
        assert_eq!(summary.total, 1);
    }
}
