//! # Order Validation
//!
//! Normalization rules applied to an order before it enters the dispense
//! transaction. Lines with a non-positive quantity are dropped (callers
//! routinely submit forms with empty rows); what remains must be a
//! non-empty order within the engine's size limits.

use crate::error::{CoreError, CoreResult};
use crate::types::Order;
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// Normalizes an order for dispensing.
///
/// - Drops lines with `quantity <= 0`, preserving the order of the rest.
/// - Rejects the order if nothing remains ([`CoreError::EmptyOrder`]).
/// - Rejects orders over [`MAX_ORDER_LINES`] lines or with a line over
///   [`MAX_LINE_QUANTITY`] units.
pub fn normalize_order(order: &Order) -> CoreResult<Order> {
    let items: Vec<_> = order
        .items
        .iter()
        .copied()
        .filter(|line| line.quantity > 0)
        .collect();

    if items.is_empty() {
        return Err(CoreError::EmptyOrder);
    }

    if items.len() > MAX_ORDER_LINES {
        return Err(CoreError::OrderTooLarge {
            max: MAX_ORDER_LINES,
        });
    }

    if let Some(line) = items.iter().find(|l| l.quantity > MAX_LINE_QUANTITY) {
        return Err(CoreError::QuantityTooLarge {
            requested: line.quantity,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(Order {
        customer_id: order.customer_id,
        payment_method: order.payment_method,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderLine, PaymentMethod};

    fn order(lines: &[(i64, i64)]) -> Order {
        Order {
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            items: lines
                .iter()
                .map(|&(medicine_id, quantity)| OrderLine {
                    medicine_id,
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_drops_non_positive_lines() {
        let normalized = normalize_order(&order(&[(1, 3), (2, 0), (3, -5), (4, 1)])).unwrap();
        let kept: Vec<i64> = normalized.items.iter().map(|l| l.medicine_id).collect();
        assert_eq!(kept, vec![1, 4]);
    }

    #[test]
    fn test_rejects_empty_order() {
        assert!(matches!(
            normalize_order(&order(&[])),
            Err(CoreError::EmptyOrder)
        ));
        assert!(matches!(
            normalize_order(&order(&[(1, 0), (2, -1)])),
            Err(CoreError::EmptyOrder)
        ));
    }

    #[test]
    fn test_rejects_oversized_quantity() {
        let err = normalize_order(&order(&[(1, MAX_LINE_QUANTITY + 1)])).unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }

    #[test]
    fn test_preserves_input_order() {
        let normalized = normalize_order(&order(&[(9, 1), (3, 2), (7, 3)])).unwrap();
        let ids: Vec<i64> = normalized.items.iter().map(|l| l.medicine_id).collect();
        assert_eq!(ids, vec![9, 3, 7]);
    }
}
