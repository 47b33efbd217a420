//! Quantity adjustment policy: the clamp arithmetic and the delta recorded
//! in the change log.

use stockledger_backend::models::change_log::InventoryChangeLog;
use stockledger_backend::models::item::adjusted_quantity;

#[test]
fn non_negative_delta_adds_exactly() {
    for q in [0i64, 1, 5, 100] {
        for d in [0i64, 1, 10, 1000] {
            assert_eq!(adjusted_quantity(q, d), q + d);
        }
    }
}

#[test]
fn decrement_within_stock_subtracts_exactly() {
    assert_eq!(adjusted_quantity(10, -3), 7);
    assert_eq!(adjusted_quantity(10, -10), 0);
}

#[test]
fn decrement_past_zero_clamps_and_logs_negative_of_before() {
    for (q, d) in [(3i64, -10i64), (0, -1), (7, -100)] {
        let after = adjusted_quantity(q, d);
        assert_eq!(after, 0, "quantity never wraps negative");

        let log = InventoryChangeLog::record("item".into(), Some("u".into()), q, after, "".into());
        assert_eq!(log.delta, -q, "logged delta is 0 - before when clamped");
    }
}

#[test]
fn zero_delta_adjustment_logs_zero() {
    let after = adjusted_quantity(5, 0);
    assert_eq!(after, 5);
    let log = InventoryChangeLog::record("item".into(), Some("u".into()), 5, after, "".into());
    assert_eq!(log.delta, 0);
}

#[test]
fn recorded_delta_always_matches_transition() {
    for (before, delta) in [(0i64, 4i64), (4, -2), (2, 0), (1, -9)] {
        let after = adjusted_quantity(before, delta);
        let log = InventoryChangeLog::record("item".into(), None, before, after, "".into());
        assert_eq!(log.delta, after - before);
        assert!(log.quantity_after >= 0);
    }
}
