//! Alert generation tests
//!
//! Covers expiry severity boundaries, message wording, and the
//! reconciliation cycle a repeated sweep goes through.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use shared::{
    evaluate_product, expiry_alert_type, reconcile, AlertCategory, AlertDraft, AlertSubject,
    AlertSweepSummary, AlertType, Reconciliation,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 23).unwrap()
}

fn subject(name: &str, quantity: i32, min_stock: Option<i32>, days: Option<i64>) -> AlertSubject<'_> {
    AlertSubject {
        name,
        quantity,
        min_stock,
        expiration_date: days.map(|d| today() + Duration::days(d)),
    }
}

/// In-memory stand-in for the active alerts table: one entry per
/// (product, category) with type and message
#[derive(Default)]
struct ActiveAlerts {
    rows: HashMap<(String, AlertCategory), (AlertType, String)>,
}

impl ActiveAlerts {
    fn apply(&mut self, product: &str, draft: &AlertDraft) -> bool {
        let key = (product.to_string(), draft.category);
        let current = self
            .rows
            .get(&key)
            .map(|(t, m)| (*t, m.as_str()));
        match reconcile(current, draft) {
            Reconciliation::Unchanged => false,
            Reconciliation::Create | Reconciliation::Update => {
                self.rows
                    .insert(key, (draft.alert_type, draft.message.clone()));
                true
            }
        }
    }

    fn sweep(&mut self, products: &[AlertSubject<'_>], today: NaiveDate) -> AlertSweepSummary {
        let mut summary = AlertSweepSummary::default();
        for product in products {
            let evaluation = evaluate_product(product, today);
            if let Some(draft) = evaluation.expiry {
                if self.apply(product.name, &draft) {
                    summary.record(&draft);
                }
            }
            match evaluation.low_stock {
                Some(draft) => {
                    if self.apply(product.name, &draft) {
                        summary.record(&draft);
                    }
                }
                None => {
                    self.rows
                        .remove(&(product.name.to_string(), AlertCategory::LowStock));
                }
            }
        }
        summary
    }

    fn count(&self, category: AlertCategory) -> usize {
        self.rows.keys().filter(|(_, c)| *c == category).count()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(expiry_alert_type(0), AlertType::Red);
        assert_eq!(expiry_alert_type(13), AlertType::Red);
        assert_eq!(expiry_alert_type(14), AlertType::Yellow);
        assert_eq!(expiry_alert_type(29), AlertType::Yellow);
        assert_eq!(expiry_alert_type(30), AlertType::Green);
        assert_eq!(expiry_alert_type(-4), AlertType::Red);
    }

    #[test]
    fn test_expired_product_message() {
        let evaluation = evaluate_product(&subject("Pan amasado", 20, Some(5), Some(-3)), today());
        let draft = evaluation.expiry.unwrap();
        assert_eq!(draft.alert_type, AlertType::Red);
        assert_eq!(draft.message, "Pan amasado YA VENCIÓ hace 3 días");
    }

    #[test]
    fn test_expired_product_alert_not_duplicated() {
        let products = [subject("Pan amasado", 20, Some(5), Some(-3))];
        let mut alerts = ActiveAlerts::default();

        let first = alerts.sweep(&products, today());
        assert_eq!(first.red, 1);
        assert_eq!(first.total, 1);

        let second = alerts.sweep(&products, today());
        assert_eq!(second.total, 0);
        assert_eq!(alerts.count(AlertCategory::Expiry), 1);
    }

    #[test]
    fn test_changed_days_update_existing_alert() {
        let mut alerts = ActiveAlerts::default();
        let products = [subject("Queque", 20, Some(5), Some(20))];

        alerts.sweep(&products, today());
        let next_week = alerts.sweep(&products, today() + Duration::days(7));

        assert_eq!(next_week.red, 1);
        assert_eq!(alerts.count(AlertCategory::Expiry), 1);
        let (alert_type, message) = &alerts.rows[&("Queque".to_string(), AlertCategory::Expiry)];
        assert_eq!(*alert_type, AlertType::Red);
        assert_eq!(message, "Queque vence en 13 días - URGENTE");
    }

    #[test]
    fn test_low_stock_alert_resolves_after_restock() {
        let mut alerts = ActiveAlerts::default();

        let low = alerts.sweep(&[subject("Harina", 3, Some(10), None)], today());
        assert_eq!(low.low_stock, 1);
        assert_eq!(low.red, 0);
        assert_eq!(alerts.count(AlertCategory::LowStock), 1);

        let again = alerts.sweep(&[subject("Harina", 3, Some(10), None)], today());
        assert_eq!(again.total, 0);

        alerts.sweep(&[subject("Harina", 11, Some(10), None)], today());
        assert_eq!(alerts.count(AlertCategory::LowStock), 0);
    }

    #[test]
    fn test_default_minimum_applies() {
        let evaluation = evaluate_product(&subject("Empanada", 5, None, None), today());
        let draft = evaluation.low_stock.unwrap();
        assert_eq!(draft.message, "Empanada - STOCK BAJO: 5 unidades (mínimo: 5)");

        assert!(evaluate_product(&subject("Empanada", 6, None, None), today())
            .low_stock
            .is_none());
    }

    #[test]
    fn test_no_expiry_alert_without_stock_or_date() {
        assert!(evaluate_product(&subject("Torta", 0, Some(0), Some(2)), today())
            .expiry
            .is_none());
        assert!(evaluate_product(&subject("Torta", 8, Some(0), None), today())
            .expiry
            .is_none());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Severity never improves as the expiry date gets closer
        #[test]
        fn prop_severity_monotonic(days in -60i64..400) {
            let rank = |t: AlertType| match t {
                AlertType::Green => 0,
                AlertType::Yellow => 1,
                AlertType::Red => 2,
            };
            prop_assert!(rank(expiry_alert_type(days)) >= rank(expiry_alert_type(days + 1)));
        }

        /// A second sweep over unchanged products writes nothing
        #[test]
        fn prop_sweep_is_idempotent(
            quantities in prop::collection::vec(0i32..40, 1..12),
            days in prop::collection::vec(prop::option::of(-10i64..90), 12),
        ) {
            let names: Vec<String> = (0..quantities.len()).map(|i| format!("Producto {}", i)).collect();
            let products: Vec<AlertSubject<'_>> = quantities
                .iter()
                .zip(&days)
                .zip(&names)
                .map(|((q, d), n)| subject(n, *q, Some(8), *d))
                .collect();

            let mut alerts = ActiveAlerts::default();
            alerts.sweep(&products, today());
            let second = alerts.sweep(&products, today());
            prop_assert_eq!(second.total, 0);
            prop_assert!(alerts.count(AlertCategory::Expiry) <= products.len());
            prop_assert!(alerts.count(AlertCategory::LowStock) <= products.len());
        }
    }
}
