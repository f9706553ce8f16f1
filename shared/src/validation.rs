//! Validation utilities for the Fornería platform
//!
//! Includes Chile-specific validations (RUT check digit).

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::MermaState;

/// A rejected input value, with messages in English and Spanish
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: &'static str,
    pub message_es: &'static str,
}

impl ValidationError {
    pub const fn new(field: &'static str, message: &'static str, message_es: &'static str) -> Self {
        Self {
            field,
            message,
            message_es,
        }
    }
}

/// Accepted range for the expiring-products and loss-projection window
pub const WINDOW_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=365;
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

// ============================================================================
// Inventory Validations
// ============================================================================

pub fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::new(
            "quantity",
            "Quantity must be greater than zero",
            "La cantidad debe ser mayor a cero",
        ));
    }
    Ok(())
}

pub fn validate_unit_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::new(
            "unit_price",
            "Unit price must be greater than zero",
            "El precio unitario debe ser mayor a cero",
        ));
    }
    Ok(())
}

/// Product list price; zero is allowed for unpriced items
pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price < Decimal::ZERO {
        return Err(ValidationError::new(
            "price",
            "Price cannot be negative",
            "El precio no puede ser negativo",
        ));
    }
    Ok(())
}

/// Discount percentage, 0 to 100 inclusive
pub fn validate_discount(discount_pct: Decimal) -> Result<(), ValidationError> {
    if discount_pct < Decimal::ZERO || discount_pct > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new(
            "discount_pct",
            "Discount must be between 0 and 100",
            "El descuento debe estar entre 0 y 100",
        ));
    }
    Ok(())
}

pub fn validate_stock_thresholds(min: Option<i32>, max: Option<i32>) -> Result<(), ValidationError> {
    if min.is_some_and(|m| m < 0) || max.is_some_and(|m| m < 0) {
        return Err(ValidationError::new(
            "min_stock",
            "Stock thresholds cannot be negative",
            "Los umbrales de stock no pueden ser negativos",
        ));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ValidationError::new(
                "max_stock",
                "Maximum stock must not be below minimum stock",
                "El stock máximo no puede ser menor al stock mínimo",
            ));
        }
    }
    Ok(())
}

/// Parses a merma reason; `active` is not a reason
pub fn parse_merma_reason(reason: &str) -> Result<MermaState, ValidationError> {
    match reason.parse::<MermaState>() {
        Ok(state) if state.is_merma() => Ok(state),
        _ => Err(ValidationError::new(
            "reason",
            "Reason must be expired, deteriorated or damaged",
            "El motivo debe ser vencido, deteriorado o dañado",
        )),
    }
}

/// Window in days, defaulting when absent
pub fn validate_window_days(days: Option<i64>) -> Result<i64, ValidationError> {
    let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
    if !WINDOW_DAYS_RANGE.contains(&days) {
        return Err(ValidationError::new(
            "days",
            "Days must be between 1 and 365",
            "Los días deben estar entre 1 y 365",
        ));
    }
    Ok(days)
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters",
            "La contraseña debe tener al menos 8 caracteres",
        ));
    }
    Ok(())
}

// ============================================================================
// Chile-Specific Validations
// ============================================================================

/// Strips dots, hyphen and spaces and upper-cases the check digit:
/// `76.123.456-k` becomes `76123456K`
pub fn normalize_rut(rut: &str) -> String {
    rut.chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Validate a Chilean RUT using the modulo 11 check digit
pub fn validate_rut(rut: &str) -> Result<(), ValidationError> {
    let invalid = ValidationError::new("rut", "Invalid RUT", "RUT inválido");

    let normalized = normalize_rut(rut);
    let mut chars = normalized.chars();
    let Some(check) = chars.next_back() else {
        return Err(invalid);
    };
    let body = chars.as_str();
    if body.is_empty() || body.len() > 8 || !body.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid);
    }

    let sum: u32 = body
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .zip([2u32, 3, 4, 5, 6, 7].iter().cycle())
        .map(|(digit, factor)| digit * factor)
        .sum();

    let expected = match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        n => char::from_digit(n, 10).unwrap_or('?'),
    };

    if check == expected {
        Ok(())
    } else {
        Err(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ruts() {
        assert!(validate_rut("76.123.456-0").is_ok());
        assert!(validate_rut("11.111.111-1").is_ok());
        assert!(validate_rut("12345678-5").is_ok());
        assert!(validate_rut("10.000.013-k").is_ok());
    }

    #[test]
    fn test_invalid_ruts() {
        assert!(validate_rut("12345678-9").is_err());
        assert!(validate_rut("K").is_err());
        assert!(validate_rut("12a45678-5").is_err());
        assert!(validate_rut("").is_err());
    }

    #[test]
    fn test_non_ascii_rut_is_rejected() {
        let err = validate_rut("12.345.678-ñ").unwrap_err();
        assert_eq!(err.field, "rut");
        assert!(validate_rut("ñ").is_err());
        assert!(validate_rut("1234567ñ-5").is_err());
        assert!(validate_rut("12.345.678-€").is_err());
    }

    #[test]
    fn test_merma_reason() {
        assert_eq!(parse_merma_reason("expired").unwrap(), MermaState::Expired);
        assert!(parse_merma_reason("active").is_err());
        assert!(parse_merma_reason("robado").is_err());
    }

    #[test]
    fn test_window_days() {
        assert_eq!(validate_window_days(None).unwrap(), 7);
        assert_eq!(validate_window_days(Some(365)).unwrap(), 365);
        assert!(validate_window_days(Some(0)).is_err());
        assert!(validate_window_days(Some(366)).is_err());
    }

    #[test]
    fn test_discount_bounds() {
        assert!(validate_discount(Decimal::ZERO).is_ok());
        assert!(validate_discount(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_discount(Decimal::from(101)).is_err());
        assert!(validate_discount(Decimal::from(-1)).is_err());
    }
}
