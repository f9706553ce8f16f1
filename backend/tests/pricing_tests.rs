//! Invoice and sale totals tests (19 % IVA)

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{document_totals, iva_on, validate_discount, validate_unit_price, PricedLine};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn line(quantity: i32, unit_price: &str, discount_pct: &str) -> PricedLine {
    PricedLine {
        quantity,
        unit_price: dec(unit_price),
        discount_pct: dec(discount_pct),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_invoice_totals() {
        let totals = document_totals(&[line(10, "1200", "0"), line(4, "2500", "10")]);
        assert_eq!(totals.net, dec("21000"));
        assert_eq!(totals.iva, dec("3990"));
        assert_eq!(totals.total, dec("24990"));
        assert_eq!(totals.discount, dec("1000"));
    }

    #[test]
    fn test_iva_rounds_to_whole_pesos() {
        assert_eq!(iva_on(dec("1050")), dec("200"));
        assert_eq!(iva_on(dec("1047.37")), dec("199"));
        assert_eq!(iva_on(dec("50")), dec("10"));
    }

    #[test]
    fn test_empty_document_is_zero() {
        let totals = document_totals(&[]);
        assert_eq!(totals.net, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_line_subtotal_rounds_to_cents() {
        assert_eq!(line(3, "333.33", "12.5").subtotal(), dec("874.99"));
    }

    #[test]
    fn test_line_input_validation() {
        assert!(validate_unit_price(dec("0")).is_err());
        assert!(validate_unit_price(dec("0.01")).is_ok());
        assert!(validate_discount(dec("100")).is_ok());
        assert!(validate_discount(dec("100.01")).is_err());
        assert!(validate_discount(dec("-1")).is_err());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn line_strategy() -> impl Strategy<Value = PricedLine> {
        (1i32..500, 1i64..1_000_000, 0i64..=100).prop_map(|(quantity, cents, discount)| PricedLine {
            quantity,
            unit_price: Decimal::new(cents, 2),
            discount_pct: Decimal::from(discount),
        })
    }

    proptest! {
        /// Total is always net plus IVA and the IVA is a whole amount
        #[test]
        fn prop_total_is_net_plus_iva(lines in prop::collection::vec(line_strategy(), 0..10)) {
            let totals = document_totals(&lines);
            prop_assert_eq!(totals.total, totals.net + totals.iva);
            prop_assert_eq!(totals.iva, totals.iva.trunc());
            prop_assert!(totals.iva >= Decimal::ZERO);
        }

        /// A discount never makes a line cost more than its gross amount
        #[test]
        fn prop_discount_bounded(l in line_strategy()) {
            prop_assert!(l.subtotal() <= l.gross());
            prop_assert!(l.subtotal() >= Decimal::ZERO);
            prop_assert_eq!(l.subtotal() + l.discount(), l.gross());
        }
    }
}
