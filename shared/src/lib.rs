//! Shared types and business rules for the Fornería platform
//!
//! This crate holds everything that does not need a database connection:
//! domain enums stored as text columns, the alert classification rules, the
//! FIFO lot planner, the role/section access table and pricing arithmetic.

/// Implements `FromStr`, `TryFrom<String>` and `Display` for an enum that
/// exposes `ALL` and `as_str()`. Database rows decode text columns through
/// `TryFrom<String>`.
macro_rules! text_enum {
    ($ty:ident, $kind:literal) => {
        impl ::std::str::FromStr for $ty {
            type Err = $crate::types::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| $crate::types::ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl ::std::convert::TryFrom<String> for $ty {
            type Error = $crate::types::ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
