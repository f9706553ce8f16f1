//! Point of sale and sales reporting tests

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    compute_change, format_folio, rank_top_products, DateRange, ProductSales, SalesSummary,
    TOP_PRODUCTS_LIMIT,
};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sold(name: &str, quantity: i64, net: &str) -> ProductSales {
    ProductSales {
        product_id: Uuid::new_v4(),
        name: name.to_string(),
        quantity,
        net: dec(net),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_change_and_underpayment() {
        assert_eq!(compute_change(dec("2380"), dec("3000")).unwrap(), dec("620"));
        let err = compute_change(dec("2380"), dec("2000")).unwrap_err();
        assert_eq!(err.paid, dec("2000"));
        assert_eq!(err.total, dec("2380"));
    }

    #[test]
    fn test_folio_sequence() {
        assert_eq!(format_folio(1), "B-000001");
        assert_eq!(format_folio(999_999), "B-999999");
    }

    #[test]
    fn test_report_defaults_to_current_month() {
        let today = date(2024, 12, 23);
        let range = DateRange::from_bounds(None, None, today);
        assert_eq!(range.start, date(2024, 12, 1));
        assert_eq!(range.end, today);
        assert!(range.contains(date(2024, 12, 1)));
        assert!(!range.contains(date(2024, 11, 30)));
    }

    #[test]
    fn test_report_explicit_range() {
        let range = DateRange::from_bounds(Some(date(2024, 1, 1)), Some(date(2024, 3, 31)), date(2024, 12, 23));
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 3, 31));
    }

    #[test]
    fn test_summary_average_ticket() {
        let summary = SalesSummary::new(dec("10000"), dec("1900"), dec("11900"), 4);
        assert_eq!(summary.average, dec("2975"));
    }

    #[test]
    fn test_rankings_differ_by_measure() {
        let ranking = rank_top_products(vec![
            sold("Hallulla", 120, "18000"),
            sold("Torta mil hojas", 4, "72000"),
            sold("Marraqueta", 80, "16000"),
        ]);
        assert_eq!(ranking.by_quantity[0].name, "Hallulla");
        assert_eq!(ranking.by_net[0].name, "Torta mil hojas");
        assert_eq!(ranking.by_net[0].average_price(), dec("18000"));
    }

    #[test]
    fn test_rankings_capped() {
        let rows = (0..30)
            .map(|i| sold(&format!("Producto {:02}", i), i, "100"))
            .collect();
        let ranking = rank_top_products(rows);
        assert_eq!(ranking.by_quantity.len(), TOP_PRODUCTS_LIMIT);
        assert_eq!(ranking.by_quantity[0].quantity, 29);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// Change plus total always equals what was paid
        #[test]
        fn prop_change_balances(total in 0i64..10_000_000, extra in 0i64..1_000_000) {
            let total = Decimal::new(total, 2);
            let paid = total + Decimal::new(extra, 2);
            let change = compute_change(total, paid).unwrap();
            prop_assert_eq!(change + total, paid);
        }

        /// Rankings are sorted descending and never exceed the limit
        #[test]
        fn prop_rankings_sorted(quantities in prop::collection::vec(0i64..1000, 0..40)) {
            let rows = quantities
                .iter()
                .enumerate()
                .map(|(i, q)| sold(&format!("P{:03}", i), *q, &(q * 150).to_string()))
                .collect();
            let ranking = rank_top_products(rows);
            prop_assert!(ranking.by_quantity.len() <= TOP_PRODUCTS_LIMIT);
            prop_assert!(ranking.by_quantity.windows(2).all(|w| w[0].quantity >= w[1].quantity));
            prop_assert!(ranking.by_net.windows(2).all(|w| w[0].net >= w[1].net));
        }
    }
}
