//! Common types used across the platform

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a stored text value does not match any enum variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Pagination parameters; missing fields take the defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 500;

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page.clamp(1, Self::MAX_PER_PAGE))
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * self.limit()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

/// Inclusive date range for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// First day of the month up to and including `today`
    pub fn month_to_date(today: NaiveDate) -> Self {
        Self {
            start: today.with_day(1).unwrap_or(today),
            end: today,
        }
    }

    /// Builds a range from optional bounds, falling back to month-to-date
    /// when either bound is missing or the bounds are reversed.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        match (start, end) {
            (Some(start), Some(end)) if start <= end => Self { start, end },
            (Some(start), None) if start <= today => Self { start, end: today },
            (None, Some(end)) => Self {
                start: end.with_day(1).unwrap_or(end),
                end,
            },
            _ => Self::month_to_date(today),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_to_date() {
        let range = DateRange::month_to_date(date(2024, 12, 23));
        assert_eq!(range.start, date(2024, 12, 1));
        assert_eq!(range.end, date(2024, 12, 23));
    }

    #[test]
    fn test_reversed_bounds_fall_back() {
        let today = date(2024, 6, 15);
        let range = DateRange::from_bounds(Some(date(2024, 6, 10)), Some(date(2024, 6, 1)), today);
        assert_eq!(range, DateRange::month_to_date(today));
    }

    #[test]
    fn test_pagination_offset() {
        let page = Pagination { page: 3, per_page: 20 };
        assert_eq!(page.limit(), 20);
        assert_eq!(page.offset(), 40);

        let zero = Pagination { page: 0, per_page: 0 };
        assert_eq!(zero.limit(), 1);
        assert_eq!(zero.offset(), 0);
    }
}
