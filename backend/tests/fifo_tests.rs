//! FIFO lot consumption tests

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use shared::{
    earliest_expiration, generate_lot_number, plan_fifo_consumption, InsufficientStock, LotBalance,
    LotState,
};
use uuid::Uuid;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn received(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

fn lot(remaining: i32, expiration_date: Option<NaiveDate>, hour: u32) -> LotBalance {
    LotBalance {
        lot_id: Uuid::new_v4(),
        remaining,
        expiration_date,
        received_at: received(hour),
    }
}

/// Applies planned draws to the balances, as the stock service does
fn apply(lots: &mut [LotBalance], requested: i32) -> Result<(), InsufficientStock> {
    let draws = plan_fifo_consumption(lots, requested)?;
    for draw in draws {
        if let Some(lot) = lots.iter_mut().find(|l| l.lot_id == draw.lot_id) {
            lot.remaining = draw.remaining;
        }
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_consumes_earliest_expiry_first() {
        let mut lots = vec![lot(10, Some(day(5)), 1), lot(5, Some(day(1)), 2)];
        let draws = plan_fifo_consumption(&lots, 7).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].lot_id, lots[1].lot_id);
        assert_eq!(draws[0].taken, 5);
        assert_eq!(draws[0].remaining, 0);
        assert_eq!(draws[0].state, LotState::Depleted);
        assert_eq!(draws[1].lot_id, lots[0].lot_id);
        assert_eq!(draws[1].taken, 2);
        assert_eq!(draws[1].remaining, 8);
        assert_eq!(draws[1].state, LotState::Active);

        apply(&mut lots, 7).unwrap();
        let total: i32 = lots.iter().map(|l| l.remaining).sum();
        assert_eq!(total, 8);
        assert_eq!(earliest_expiration(&lots), Some(day(5)));
    }

    #[test]
    fn test_over_request_changes_nothing() {
        let lots = vec![lot(5, Some(day(1)), 1), lot(10, Some(day(5)), 2)];
        let err = plan_fifo_consumption(&lots, 16).unwrap_err();
        assert_eq!(
            err,
            InsufficientStock {
                available: 15,
                requested: 16
            }
        );

        let mut after = lots.clone();
        assert!(apply(&mut after, 16).is_err());
        assert_eq!(after, lots);
    }

    #[test]
    fn test_no_lots_is_insufficient() {
        let err = plan_fifo_consumption(&[], 1).unwrap_err();
        assert_eq!(err.available, 0);
    }

    #[test]
    fn test_undated_lots_go_last() {
        let lots = vec![lot(4, None, 1), lot(4, Some(day(20)), 2)];
        let draws = plan_fifo_consumption(&lots, 3).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].lot_id, lots[1].lot_id);
    }

    #[test]
    fn test_same_expiry_uses_receipt_order() {
        let lots = vec![lot(4, Some(day(9)), 8), lot(4, Some(day(9)), 3)];
        let draws = plan_fifo_consumption(&lots, 2).unwrap();
        assert_eq!(draws[0].lot_id, lots[1].lot_id);
    }

    #[test]
    fn test_exact_amount_depletes_everything() {
        let mut lots = vec![lot(3, Some(day(2)), 1), lot(2, None, 2)];
        apply(&mut lots, 5).unwrap();
        assert!(lots.iter().all(|l| l.remaining == 0));
        assert_eq!(earliest_expiration(&lots), None);
    }

    #[test]
    fn test_stock_in_moves_displayed_expiry_earlier() {
        let mut lots = vec![lot(6, Some(day(20)), 1), lot(3, None, 2)];
        assert_eq!(earliest_expiration(&lots), Some(day(20)));

        lots.push(lot(4, Some(day(12)), 3));
        assert_eq!(earliest_expiration(&lots), Some(day(12)));

        // A later lot leaves the displayed date alone
        lots.push(lot(4, Some(day(28)), 4));
        assert_eq!(earliest_expiration(&lots), Some(day(12)));
    }

    #[test]
    fn test_displayed_expiry_skips_depleted_lots() {
        let mut lots = vec![lot(2, Some(day(5)), 1), lot(8, Some(day(15)), 2)];
        apply(&mut lots, 2).unwrap();
        assert_eq!(earliest_expiration(&lots), Some(day(15)));

        lots.push(lot(5, Some(day(10)), 3));
        assert_eq!(earliest_expiration(&lots), Some(day(10)));
    }

    #[test]
    fn test_lot_number_format() {
        assert_eq!(generate_lot_number(day(3), 12), "LOTE-20240603-0012");
        assert_eq!(generate_lot_number(day(3), 123456), "LOTE-20240603-123456");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn lots_strategy() -> impl Strategy<Value = Vec<LotBalance>> {
        prop::collection::vec((0i32..50, prop::option::of(0i64..60), 0u32..24), 0..8).prop_map(
            |specs| {
                specs
                    .into_iter()
                    .map(|(remaining, offset, hour)| {
                        lot(remaining, offset.map(|o| day(1) + Duration::days(o)), hour)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        /// Stock is conserved: what the draws take equals the request and the
        /// remaining total drops by exactly that amount
        #[test]
        fn prop_consumption_conserves_stock(lots in lots_strategy(), requested in 1i32..120) {
            let before: i64 = lots.iter().map(|l| i64::from(l.remaining)).sum();
            match plan_fifo_consumption(&lots, requested) {
                Ok(draws) => {
                    let taken: i32 = draws.iter().map(|d| d.taken).sum();
                    prop_assert_eq!(taken, requested);
                    let mut after = lots.clone();
                    apply(&mut after, requested).unwrap();
                    let remaining: i64 = after.iter().map(|l| i64::from(l.remaining)).sum();
                    prop_assert_eq!(remaining, before - i64::from(requested));
                    prop_assert!(after.iter().all(|l| l.remaining >= 0));
                }
                Err(err) => {
                    prop_assert_eq!(err.available, before);
                    prop_assert!(before < i64::from(requested));
                }
            }
        }

        /// Only the last lot touched can be left partially consumed
        #[test]
        fn prop_only_last_draw_partial(lots in lots_strategy(), requested in 1i32..120) {
            if let Ok(draws) = plan_fifo_consumption(&lots, requested) {
                for draw in draws.iter().rev().skip(1) {
                    prop_assert_eq!(draw.state, LotState::Depleted);
                }
            }
        }
    }
}
