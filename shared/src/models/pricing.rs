//! Line and document totals (Chilean IVA)

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// IVA rate as a fraction (19 %)
pub fn iva_rate() -> Decimal {
    Decimal::new(19, 2)
}

/// Priced line as entered on an invoice or a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_pct: Decimal,
}

impl PricedLine {
    /// Amount before discount
    pub fn gross(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }

    /// `quantity × unit_price × (1 − discount/100)`, rounded to cents
    pub fn subtotal(&self) -> Decimal {
        let factor = Decimal::ONE - self.discount_pct / Decimal::ONE_HUNDRED;
        (self.gross() * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn discount(&self) -> Decimal {
        self.gross() - self.subtotal()
    }
}

/// Net, IVA and grand total of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub net: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
    pub discount: Decimal,
}

/// IVA on `net`, rounded to whole pesos
pub fn iva_on(net: Decimal) -> Decimal {
    (net * iva_rate()).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

pub fn document_totals(lines: &[PricedLine]) -> DocumentTotals {
    let net: Decimal = lines.iter().map(PricedLine::subtotal).sum();
    let discount: Decimal = lines.iter().map(PricedLine::discount).sum();
    let iva = iva_on(net);
    DocumentTotals {
        net,
        iva,
        total: net + iva,
        discount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtotal_with_discount() {
        let line = PricedLine {
            quantity: 3,
            unit_price: Decimal::from(1500),
            discount_pct: Decimal::from(10),
        };
        assert_eq!(line.subtotal(), Decimal::from(4050));
        assert_eq!(line.discount(), Decimal::from(450));
    }

    #[test]
    fn test_iva_rounds_to_whole_pesos() {
        // 19 % of 1_234 = 234.46
        assert_eq!(iva_on(Decimal::from(1234)), Decimal::from(234));
        // 19 % of 1_250 = 237.5
        assert_eq!(iva_on(Decimal::from(1250)), Decimal::from(238));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(document_totals(&[]), DocumentTotals::default());
    }
}
