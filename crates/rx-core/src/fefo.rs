//! # FEFO Allocation
//!
//! First-Expiry-First-Out allocation planning: split a requested quantity
//! across eligible batches, draining the soonest-expiring stock first.
//!
//! ## Why FEFO?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Batches for Amoxicillin, requirement = 8                               │
//! │                                                                         │
//! │  expiry 2026-01-01  qty  5  ──► take 5   (drained first)               │
//! │  expiry 2026-02-01  qty 10  ──► take 3                                  │
//! │  expiry 2026-06-01  qty 20  ──► untouched                               │
//! │                                                                         │
//! │  Selling the soonest-to-expire stock first minimizes the value that    │
//! │  dies on the shelf.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The functions here are pure: the caller fetches the eligible batches
//! (inside its transaction) and passes them in. Ordering is decided here,
//! not in the query, so the policy is unit-testable and deterministic:
//! expiry ascending, batch id as the tiebreaker.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Batch;

// =============================================================================
// Allocation
// =============================================================================

/// One slice of an allocation plan: take `quantity` units from `batch_id`
/// at the batch's current selling price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub batch_id: i64,
    pub quantity: i64,
    /// Selling price captured at allocation time.
    pub unit_price_cents: i64,
}

impl Allocation {
    /// Line subtotal: `quantity * unit_price`.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.unit_price_cents) * self.quantity
    }
}

// =============================================================================
// Allocation Planning
// =============================================================================

/// Plans a FEFO allocation of `required` units across `batches`.
///
/// ## Contract
/// - Batches are consumed in ascending expiry order; ties break on
///   `batch_id` so the plan is deterministic.
/// - Each batch contributes at most its `quantity_on_hand`; batches with
///   nothing on hand are skipped.
/// - Returns the ordered plan, or [`CoreError::AllocationExhausted`] with
///   the shortfall if the batches cannot cover the requirement. Hitting
///   that after validation passed means a concurrent dispense won a race.
///
/// The caller is responsible for passing only eligible batches (in stock,
/// not expired) - the same predicate the validator uses.
pub fn allocate(medicine_id: i64, batches: &[Batch], required: i64) -> CoreResult<Vec<Allocation>> {
    let mut ordered: Vec<&Batch> = batches.iter().collect();
    ordered.sort_by_key(|b| (b.expiry_date, b.batch_id));

    let mut plan = Vec::new();
    let mut remaining = required;

    for batch in ordered {
        if remaining <= 0 {
            break;
        }
        if batch.quantity_on_hand <= 0 {
            continue;
        }

        let take = remaining.min(batch.quantity_on_hand);
        plan.push(Allocation {
            batch_id: batch.batch_id,
            quantity: take,
            unit_price_cents: batch.selling_price_cents,
        });
        remaining -= take;
    }

    if remaining > 0 {
        return Err(CoreError::AllocationExhausted {
            medicine_id,
            shortfall: remaining,
        });
    }

    Ok(plan)
}

/// Total units available across the given batches.
///
/// The store computes this with a SQL aggregate; this is the in-memory
/// counterpart used by planning code and tests.
pub fn available(batches: &[Batch]) -> i64 {
    batches
        .iter()
        .map(|b| b.quantity_on_hand.max(0))
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_drains_earliest_expiry_first() {
        // Batch X (expiry 2024-01-01, qty 5), Batch Y (expiry 2024-02-01,
        // qty 10); requirement 8 -> [X:5, Y:3].
        let batches = vec![
            Batch::lot(2, 1, "Y", date(2024, 2, 1), 10, 500),
            Batch::lot(1, 1, "X", date(2024, 1, 1), 5, 450),
        ];

        let plan = allocate(1, &batches, 8).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!((plan[0].batch_id, plan[0].quantity), (1, 5));
        assert_eq!((plan[1].batch_id, plan[1].quantity), (2, 3));
        assert_eq!(plan[0].unit_price_cents, 450);
        assert_eq!(plan[1].unit_price_cents, 500);
    }

    #[test]
    fn test_allocated_quantities_sum_to_requirement() {
        let batches = vec![
            Batch::lot(1, 1, "A", date(2024, 1, 1), 3, 100),
            Batch::lot(2, 1, "B", date(2024, 2, 1), 3, 100),
            Batch::lot(3, 1, "C", date(2024, 3, 1), 3, 100),
        ];

        for required in 1..=9 {
            let plan = allocate(1, &batches, required).unwrap();
            let total: i64 = plan.iter().map(|a| a.quantity).sum();
            assert_eq!(total, required);

            // Non-decreasing expiry order == ascending batch ids here
            let ids: Vec<i64> = plan.iter().map(|a| a.batch_id).collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            assert_eq!(ids, sorted);
        }
    }

    #[test]
    fn test_tie_break_on_batch_id() {
        let same_day = date(2024, 5, 1);
        let batches = vec![
            Batch::lot(9, 1, "LATE-ID", same_day, 4, 100),
            Batch::lot(2, 1, "EARLY-ID", same_day, 4, 100),
        ];

        let plan = allocate(1, &batches, 6).unwrap();
        assert_eq!((plan[0].batch_id, plan[0].quantity), (2, 4));
        assert_eq!((plan[1].batch_id, plan[1].quantity), (9, 2));
    }

    #[test]
    fn test_exact_fit_consumes_single_batch() {
        let batches = vec![Batch::lot(1, 1, "A", date(2024, 1, 1), 5, 200)];
        let plan = allocate(1, &batches, 5).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity, 5);
    }

    #[test]
    fn test_exhaustion_reports_shortfall() {
        let batches = vec![
            Batch::lot(1, 7, "A", date(2024, 1, 1), 2, 100),
            Batch::lot(2, 7, "B", date(2024, 2, 1), 3, 100),
        ];

        let err = allocate(7, &batches, 6).unwrap_err();
        match err {
            CoreError::AllocationExhausted {
                medicine_id,
                shortfall,
            } => {
                assert_eq!(medicine_id, 7);
                assert_eq!(shortfall, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_batches_are_skipped() {
        let batches = vec![
            Batch::lot(1, 1, "EMPTY", date(2024, 1, 1), 0, 100),
            Batch::lot(2, 1, "FULL", date(2024, 2, 1), 10, 100),
        ];

        let plan = allocate(1, &batches, 4).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].batch_id, 2);
    }

    #[test]
    fn test_available_sums_on_hand() {
        let batches = vec![
            Batch::lot(1, 1, "A", date(2024, 1, 1), 5, 100),
            Batch::lot(2, 1, "B", date(2024, 2, 1), 10, 100),
        ];
        assert_eq!(available(&batches), 15);
        assert_eq!(available(&[]), 0);
    }

    #[test]
    fn test_subtotal() {
        let alloc = Allocation {
            batch_id: 1,
            quantity: 3,
            unit_price_cents: 450,
        };
        assert_eq!(alloc.subtotal().cents(), 1350);
    }
}
