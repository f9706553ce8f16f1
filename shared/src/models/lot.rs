//! Inventory lots and FIFO consumption planning

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotState {
    Active,
    Depleted,
}

impl LotState {
    pub const ALL: [LotState; 2] = [LotState::Active, LotState::Depleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            LotState::Active => "active",
            LotState::Depleted => "depleted",
        }
    }
}

text_enum!(LotState, "lot state");

/// How a lot entered inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotOrigin {
    Opening,
    Adjustment,
    Purchase,
}

impl LotOrigin {
    pub const ALL: [LotOrigin; 3] = [LotOrigin::Opening, LotOrigin::Adjustment, LotOrigin::Purchase];

    pub fn as_str(&self) -> &'static str {
        match self {
            LotOrigin::Opening => "opening",
            LotOrigin::Adjustment => "adjustment",
            LotOrigin::Purchase => "purchase",
        }
    }
}

text_enum!(LotOrigin, "lot origin");

/// Remaining balance of one active lot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotBalance {
    pub lot_id: Uuid,
    pub remaining: i32,
    pub expiration_date: Option<NaiveDate>,
    pub received_at: DateTime<Utc>,
}

/// Planned deduction from a single lot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotDraw {
    pub lot_id: Uuid,
    pub taken: i32,
    pub remaining: i32,
    pub state: LotState,
}

/// Requested quantity exceeds what the active lots hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient stock: {available} available, {requested} requested")]
pub struct InsufficientStock {
    pub available: i64,
    pub requested: i32,
}

/// Orders lots for consumption: earliest expiration first, lots without an
/// expiration date last, ties broken by receipt time.
pub fn fifo_order(lots: &mut [LotBalance]) {
    lots.sort_by(|a, b| {
        let by_expiry = match (a.expiration_date, b.expiration_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        by_expiry.then(a.received_at.cmp(&b.received_at))
    });
}

/// Plans how `requested` units are drawn from `lots`.
///
/// Lots are consumed in FIFO order. Only lots that are touched appear in the
/// result. When the lots hold fewer units than requested nothing is planned
/// and the available total is reported.
pub fn plan_fifo_consumption(
    lots: &[LotBalance],
    requested: i32,
) -> Result<Vec<LotDraw>, InsufficientStock> {
    let available: i64 = lots.iter().map(|lot| i64::from(lot.remaining.max(0))).sum();
    if requested <= 0 || available < i64::from(requested) {
        return Err(InsufficientStock {
            available,
            requested,
        });
    }

    let mut ordered = lots.to_vec();
    fifo_order(&mut ordered);

    let mut outstanding = requested;
    let mut draws = Vec::new();
    for lot in ordered {
        if outstanding == 0 {
            break;
        }
        if lot.remaining <= 0 {
            continue;
        }

        let taken = lot.remaining.min(outstanding);
        let remaining = (lot.remaining - taken).max(0);
        outstanding -= taken;
        draws.push(LotDraw {
            lot_id: lot.lot_id,
            taken,
            remaining,
            state: if remaining == 0 {
                LotState::Depleted
            } else {
                LotState::Active
            },
        });
    }

    Ok(draws)
}

/// Earliest expiration among lots that still hold stock
pub fn earliest_expiration<'a, I>(lots: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a LotBalance>,
{
    lots.into_iter()
        .filter(|lot| lot.remaining > 0)
        .filter_map(|lot| lot.expiration_date)
        .min()
}

/// Lot number in the form `LOTE-YYYYMMDD-0001`
pub fn generate_lot_number(date: NaiveDate, sequence: u32) -> String {
    format!("LOTE-{}-{:04}", date.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn lot(remaining: i32, expiry_day: Option<u32>, received_hour: u32) -> LotBalance {
        LotBalance {
            lot_id: Uuid::new_v4(),
            remaining,
            expiration_date: expiry_day.map(|d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap()),
            received_at: Utc.with_ymd_and_hms(2024, 4, 1, received_hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_lots_without_expiry_are_last() {
        let mut lots = vec![lot(3, None, 1), lot(3, Some(20), 2), lot(3, Some(10), 3)];
        let ids: Vec<Uuid> = vec![lots[2].lot_id, lots[1].lot_id, lots[0].lot_id];
        fifo_order(&mut lots);
        assert_eq!(lots.iter().map(|l| l.lot_id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_same_expiry_uses_receipt_order() {
        let later = lot(4, Some(10), 9);
        let earlier = lot(4, Some(10), 8);
        let draws = plan_fifo_consumption(&[later.clone(), earlier.clone()], 5).unwrap();
        assert_eq!(draws[0].lot_id, earlier.lot_id);
        assert_eq!(draws[0].state, LotState::Depleted);
        assert_eq!(draws[1].lot_id, later.lot_id);
        assert_eq!(draws[1].remaining, 3);
    }

    #[test]
    fn test_zero_request_is_rejected() {
        let err = plan_fifo_consumption(&[lot(5, Some(1), 0)], 0).unwrap_err();
        assert_eq!(err.available, 5);
        assert_eq!(err.requested, 0);
    }

    proptest::proptest! {
        #[test]
        fn prop_draws_cover_request(
            remaining in proptest::collection::vec(0i32..50, 1..6),
            requested in 1i32..120,
        ) {
            let lots: Vec<LotBalance> = remaining
                .iter()
                .enumerate()
                .map(|(i, r)| lot(*r, Some(1 + i as u32), 0))
                .collect();
            let available: i32 = remaining.iter().sum();
            match plan_fifo_consumption(&lots, requested) {
                Ok(draws) => {
                    proptest::prop_assert!(requested <= available);
                    proptest::prop_assert_eq!(draws.iter().map(|d| d.taken).sum::<i32>(), requested);
                    proptest::prop_assert!(draws.iter().all(|d| d.remaining >= 0 && d.taken > 0));
                }
                Err(err) => {
                    proptest::prop_assert!(requested > available);
                    proptest::prop_assert_eq!(err.available, i64::from(available));
                }
            }
        }
    }

    #[test]
    fn test_lot_number_format() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 3).unwrap();
        assert_eq!(generate_lot_number(date, 7), "LOTE-20241203-0007");
    }
}
