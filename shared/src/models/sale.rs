//! Point-of-sale and sales reporting rules

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Number of entries in each top-products ranking
pub const TOP_PRODUCTS_LIMIT: usize = 20;
/// Number of sales listed with a sales report
pub const REPORT_RECENT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    InStore,
    Delivery,
}

impl SalesChannel {
    pub const ALL: [SalesChannel; 2] = [SalesChannel::InStore, SalesChannel::Delivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            SalesChannel::InStore => "in_store",
            SalesChannel::Delivery => "delivery",
        }
    }
}

text_enum!(SalesChannel, "sales channel");

/// Amount paid does not cover the sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount paid {paid} is below the total {total}")]
pub struct Underpayment {
    pub paid: Decimal,
    pub total: Decimal,
}

/// Change handed back to the customer
pub fn compute_change(total: Decimal, paid: Decimal) -> Result<Decimal, Underpayment> {
    if paid < total {
        return Err(Underpayment { paid, total });
    }
    Ok(paid - total)
}

/// Receipt folio in the form `B-000123`
pub fn format_folio(sequence: i64) -> String {
    format!("B-{:06}", sequence)
}

/// Aggregated totals of a sales report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub net: Decimal,
    pub iva: Decimal,
    pub total: Decimal,
    pub count: i64,
    pub average: Decimal,
}

impl SalesSummary {
    pub fn new(net: Decimal, iva: Decimal, total: Decimal, count: i64) -> Self {
        let average = if count > 0 {
            (total / Decimal::from(count)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        Self {
            net,
            iva,
            total,
            count,
            average,
        }
    }
}

/// Sold quantity and net amount for one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub net: Decimal,
}

impl ProductSales {
    pub fn average_price(&self) -> Decimal {
        if self.quantity > 0 {
            (self.net / Decimal::from(self.quantity)).round_dp(2)
        } else {
            Decimal::ZERO
        }
    }
}

/// Both rankings, each capped at [`TOP_PRODUCTS_LIMIT`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProducts {
    pub by_quantity: Vec<ProductSales>,
    pub by_net: Vec<ProductSales>,
}

/// Ranks per-product totals by quantity and by net amount. Ties keep the
/// product name order.
pub fn rank_top_products(mut rows: Vec<ProductSales>) -> TopProducts {
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    let mut by_quantity = rows.clone();
    by_quantity.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    by_quantity.truncate(TOP_PRODUCTS_LIMIT);

    let mut by_net = rows;
    by_net.sort_by(|a, b| b.net.cmp(&a.net));
    by_net.truncate(TOP_PRODUCTS_LIMIT);

    TopProducts { by_quantity, by_net }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change() {
        assert_eq!(
            compute_change(Decimal::from(4820), Decimal::from(5000)).unwrap(),
            Decimal::from(180)
        );
        assert_eq!(
            compute_change(Decimal::from(4820), Decimal::from(4820)).unwrap(),
            Decimal::ZERO
        );
        assert!(compute_change(Decimal::from(4820), Decimal::from(4000)).is_err());
    }

    #[test]
    fn test_folio() {
        assert_eq!(format_folio(123), "B-000123");
        assert_eq!(format_folio(1_234_567), "B-1234567");
    }

    #[test]
    fn test_summary_average() {
        let summary = SalesSummary::new(Decimal::from(300), Decimal::from(57), Decimal::from(357), 3);
        assert_eq!(summary.average, Decimal::from(119));
        assert_eq!(SalesSummary::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, 0).average, Decimal::ZERO);
    }
}
