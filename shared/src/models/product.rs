//! Product stock and merma (spoilage) rules

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum stock used when a product has no configured threshold
pub const DEFAULT_MIN_STOCK: i32 = 5;

/// Merma state of a product. Anything other than `Active` is out of
/// sellable inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MermaState {
    Active,
    Expired,
    Deteriorated,
    Damaged,
}

impl MermaState {
    pub const ALL: [MermaState; 4] = [
        MermaState::Active,
        MermaState::Expired,
        MermaState::Deteriorated,
        MermaState::Damaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MermaState::Active => "active",
            MermaState::Expired => "expired",
            MermaState::Deteriorated => "deteriorated",
            MermaState::Damaged => "damaged",
        }
    }

    pub fn label_es(&self) -> &'static str {
        match self {
            MermaState::Active => "Activo",
            MermaState::Expired => "Vencido",
            MermaState::Deteriorated => "Deteriorado",
            MermaState::Damaged => "Dañado",
        }
    }

    pub fn is_merma(&self) -> bool {
        *self != MermaState::Active
    }
}

text_enum!(MermaState, "merma state");

/// Lifecycle of a catalogue row. Deleted products keep their history but
/// disappear from every listing and sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductLifecycle {
    Live,
    Deleted,
}

impl ProductLifecycle {
    pub const ALL: [ProductLifecycle; 2] = [ProductLifecycle::Live, ProductLifecycle::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductLifecycle::Live => "live",
            ProductLifecycle::Deleted => "deleted",
        }
    }
}

text_enum!(ProductLifecycle, "product lifecycle");

/// Configured minimum, or the default floor
pub fn effective_min_stock(configured: Option<i32>) -> i32 {
    configured.unwrap_or(DEFAULT_MIN_STOCK)
}

pub fn is_low_stock(quantity: i32, configured_min: Option<i32>) -> bool {
    quantity <= effective_min_stock(configured_min)
}

/// Signed number of days until `expiration`; negative once expired
pub fn days_to_expire(expiration: NaiveDate, today: NaiveDate) -> i64 {
    (expiration - today).num_days()
}

/// Units counted when valuing stock: the on-hand quantity, or the
/// stock-actual mirror when quantity is empty.
pub fn valued_units(quantity: i32, stock_actual: Option<i32>) -> i32 {
    if quantity > 0 {
        quantity
    } else {
        stock_actual.unwrap_or(0).max(0)
    }
}

/// A product row as seen by the loss projection
#[derive(Debug, Clone)]
pub struct ExpiringStock {
    pub price: Decimal,
    pub quantity: i32,
    pub stock_actual: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
}

/// Value of stock expiring between `today` and `today + window_days`,
/// both ends inclusive.
pub fn projected_loss(items: &[ExpiringStock], today: NaiveDate, window_days: i64) -> Decimal {
    items
        .iter()
        .filter(|item| match item.expiration_date {
            Some(exp) => {
                let days = days_to_expire(exp, today);
                (0..=window_days).contains(&days)
            }
            None => false,
        })
        .map(|item| item.price * Decimal::from(valued_units(item.quantity, item.stock_actual)))
        .sum()
}

/// Key used to collapse duplicated catalogue entries in listings
pub fn catalogue_key(name: &str, brand: Option<&str>) -> (String, String) {
    (
        name.trim().to_lowercase(),
        brand.unwrap_or_default().trim().to_lowercase(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_effective_min_stock() {
        assert_eq!(effective_min_stock(None), 5);
        assert_eq!(effective_min_stock(Some(12)), 12);
        assert_eq!(effective_min_stock(Some(0)), 0);
    }

    #[test]
    fn test_merma_state_round_trip_text() {
        assert_eq!(MermaState::from_str("damaged").unwrap(), MermaState::Damaged);
        assert!(MermaState::from_str("dañado").is_err());
        assert!(!MermaState::Active.is_merma());
        assert!(MermaState::Expired.is_merma());
    }

    #[test]
    fn test_valued_units_falls_back_to_stock_actual() {
        assert_eq!(valued_units(4, Some(10)), 4);
        assert_eq!(valued_units(0, Some(10)), 10);
        assert_eq!(valued_units(0, None), 0);
    }

    #[test]
    fn test_projected_loss_window() {
        let today = date(2024, 3, 1);
        let items = vec![
            ExpiringStock {
                price: Decimal::from(1000),
                quantity: 2,
                stock_actual: None,
                expiration_date: Some(date(2024, 3, 8)),
            },
            ExpiringStock {
                price: Decimal::from(500),
                quantity: 3,
                stock_actual: None,
                expiration_date: Some(date(2024, 3, 9)),
            },
            ExpiringStock {
                price: Decimal::from(700),
                quantity: 1,
                stock_actual: None,
                expiration_date: Some(date(2024, 2, 28)),
            },
        ];

        assert_eq!(projected_loss(&items, today, 7), Decimal::from(2000));
        assert_eq!(projected_loss(&items, today, 14), Decimal::from(3500));
    }

    #[test]
    fn test_catalogue_key_ignores_case_and_padding() {
        assert_eq!(
            catalogue_key(" Pan Amasado ", Some("Fornería")),
            catalogue_key("pan amasado", Some("FORNERÍA "))
        );
        assert_eq!(catalogue_key("Marraqueta", None).1, "");
    }
}
