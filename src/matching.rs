//! The five order-type flows, each built atop [`MatchingEngine::try_match_instantly`].
//!
//! GTC, IOC and FOK are all price-capped variants of the same limited walk;
//! IOC_BUDGET and FOK_BUDGET convert or evaluate a total-notional cap before
//! falling back to the same primitives. This mirrors how `orderbook-rs`
//! layers its budget-checking `peek_match` on top of the same matching walk
//! `match_order_with_user` drives.

use crate::book::MatchingEngine;
use crate::constants::Action;
use crate::error::EngineError;
use crate::model::{RestingOrder, TradeFill};

/// Outcome of a PLACE command, before it has been encoded onto the wire.
pub enum PlaceOutcome {
    /// The taker was fully satisfied; nothing rests, no reduce event.
    FullyFilled { fills: Vec<TradeFill> },
    /// Some remainder could not be matched and this order type rests it.
    Resting {
        fills: Vec<TradeFill>,
        order: RestingOrder,
    },
    /// Some remainder could not (or, for FOK variants, must not) be kept on
    /// the book; it is reported as a single reduce event.
    Reduced {
        fills: Vec<TradeFill>,
        remainder: u64,
        price: i64,
        reserve_bid_price: i64,
    },
    /// A GTC placement whose `order_id` already exists in the index: matches
    /// already made are kept, the unmatched remainder is reduced, and the
    /// pre-existing resting order is left untouched.
    DuplicateId {
        fills: Vec<TradeFill>,
        remainder: u64,
        price: i64,
        reserve_bid_price: i64,
    },
}

/// Good-Till-Cancel: match against the price-bounded subtree, then rest any
/// remainder (or reduce it, if `order_id` turns out to be a duplicate).
#[allow(clippy::too_many_arguments)]
pub fn place_gtc(
    engine: &MatchingEngine,
    order_id: u64,
    uid: u64,
    action: Action,
    price: i64,
    reserve_bid_price: i64,
    size: u64,
    timestamp: i64,
) -> PlaceOutcome {
    let (filled, fills) = engine.try_match_instantly(action, Some(price), size, reserve_bid_price);
    if filled == size {
        return PlaceOutcome::FullyFilled { fills };
    }
    let remainder = size - filled;
    if engine.get_order(order_id).is_some() {
        tracing::warn!(order_id, "duplicate order id on GTC placement, matches kept, remainder reduced");
        return PlaceOutcome::DuplicateId {
            fills,
            remainder,
            price,
            reserve_bid_price,
        };
    }
    let order = RestingOrder::new(order_id, uid, action, price, reserve_bid_price, size, filled, timestamp);
    engine.insert_resting(order.clone());
    tracing::trace!(order_id, remainder, "order rests after partial or no match");
    PlaceOutcome::Resting { fills, order }
}

/// Immediate-Or-Cancel, price cap: as GTC but never rests.
pub fn place_ioc(
    engine: &MatchingEngine,
    action: Action,
    price: i64,
    reserve_bid_price: i64,
    size: u64,
) -> PlaceOutcome {
    let (filled, fills) = engine.try_match_instantly(action, Some(price), size, reserve_bid_price);
    let remainder = size - filled;
    if remainder == 0 {
        PlaceOutcome::FullyFilled { fills }
    } else {
        PlaceOutcome::Reduced {
            fills,
            remainder,
            price,
            reserve_bid_price,
        }
    }
}

/// Immediate-Or-Cancel, total-notional cap: the submitted `budget` is
/// converted to an equivalent per-unit limit (floored, minimum one tick)
/// and matched exactly like [`place_ioc`].
pub fn place_ioc_budget(
    engine: &MatchingEngine,
    action: Action,
    budget: i64,
    reserve_bid_price: i64,
    size: u64,
) -> PlaceOutcome {
    let per_unit_limit = if size == 0 { budget } else { (budget / size as i64).max(1) };
    place_ioc(engine, action, per_unit_limit, reserve_bid_price, size)
}

/// Fill-Or-Kill, price cap: a feasibility peek over the price-bounded
/// subtree decides whether to run a real (guaranteed full) match or to
/// reject the whole order with a single reduce event and no book mutation.
pub fn place_fok(
    engine: &MatchingEngine,
    action: Action,
    price: i64,
    reserve_bid_price: i64,
    size: u64,
) -> PlaceOutcome {
    if engine.can_fill_price_capped(action, price, size) {
        let (filled, fills) = engine.try_match_instantly(action, Some(price), size, reserve_bid_price);
        debug_assert_eq!(filled, size, "feasibility peek promised a full fill");
        PlaceOutcome::FullyFilled { fills }
    } else {
        PlaceOutcome::Reduced {
            fills: Vec::new(),
            remainder: size,
            price,
            reserve_bid_price,
        }
    }
}

/// Fill-Or-Kill, total-notional cap: walks the entire opposite side summing
/// `price * available` until `size` lots are covered. For an ASK taker the
/// order fills only if the accumulated budget is at least the submitted
/// limit; for a BID taker, only if it is at most the limit. A feasibility
/// pass that then fails to fully fill is a fatal invariant violation.
pub fn place_fok_budget(
    engine: &MatchingEngine,
    order_id: u64,
    action: Action,
    limit: i64,
    reserve_bid_price: i64,
    size: u64,
) -> Result<PlaceOutcome, EngineError> {
    let budget = engine.budget_to_fill(action, size);
    let can_fill = match budget {
        None => false,
        Some(total) => match action {
            Action::Ask => total >= limit,
            Action::Bid => total <= limit,
        },
    };

    if !can_fill {
        return Ok(PlaceOutcome::Reduced {
            fills: Vec::new(),
            remainder: size,
            price: limit,
            reserve_bid_price,
        });
    }

    let (filled, fills) = engine.try_match_instantly(action, None, size, reserve_bid_price);
    if filled != size {
        tracing::error!(order_id, wanted = size, filled, "FOK_BUDGET invariant violated");
        return Err(EngineError::BudgetFillInvariantViolated {
            order_id,
            wanted: size,
            filled,
        });
    }
    Ok(PlaceOutcome::FullyFilled { fills })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolSpec;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(SymbolSpec::new("TEST", true))
    }

    #[test]
    fn gtc_rests_unmatched_remainder() {
        let engine = engine();
        let outcome = place_gtc(&engine, 100, 1, Action::Ask, 1000, 0, 10, 0);
        assert!(matches!(outcome, PlaceOutcome::Resting { .. }));
        assert_eq!(engine.best_ask(), Some(1000));
    }

    #[test]
    fn gtc_matches_then_rests_nothing_when_full() {
        let engine = engine();
        place_gtc(&engine, 100, 1, Action::Ask, 1000, 0, 10, 0);
        let outcome = place_gtc(&engine, 101, 2, Action::Bid, 1000, 0, 4, 1);
        match outcome {
            PlaceOutcome::FullyFilled { fills } => {
                assert_eq!(fills.len(), 1);
                assert_eq!(fills[0].traded_volume, 4);
            }
            _ => panic!("expected full fill"),
        }
        assert_eq!(engine.get_order(100).unwrap().remaining(), 6);
    }

    #[test]
    fn ioc_never_rests() {
        let engine = engine();
        let outcome = place_ioc(&engine, Action::Bid, 999, 0, 5);
        match outcome {
            PlaceOutcome::Reduced { remainder, .. } => assert_eq!(remainder, 5),
            _ => panic!("expected reduce"),
        }
        assert_eq!(engine.best_bid(), None);
    }

    #[test]
    fn ioc_budget_converts_to_per_unit_limit_and_never_rests() {
        let engine = engine();
        place_gtc(&engine, 1, 1, Action::Ask, 100, 0, 5, 0);
        place_gtc(&engine, 2, 1, Action::Ask, 200, 0, 5, 1);

        // budget 1200 over size 10 -> per-unit limit 120: only the 100-priced level clears it.
        let outcome = place_ioc_budget(&engine, Action::Bid, 1200, 0, 10);
        match outcome {
            PlaceOutcome::Reduced { fills, remainder, .. } => {
                assert_eq!(fills.len(), 1);
                assert_eq!(fills[0].traded_volume, 5);
                assert_eq!(remainder, 5);
            }
            _ => panic!("expected a partial fill with the rest reduced"),
        }
        assert_eq!(engine.best_ask(), Some(200));
        assert_eq!(engine.get_order(2).unwrap().remaining(), 5);
    }

    #[test]
    fn ioc_budget_fully_fills_when_budget_covers_best_price() {
        let engine = engine();
        place_gtc(&engine, 1, 1, Action::Ask, 100, 0, 10, 0);

        let outcome = place_ioc_budget(&engine, Action::Bid, 1050, 0, 10);
        match outcome {
            PlaceOutcome::FullyFilled { fills } => {
                assert_eq!(fills.len(), 1);
                assert_eq!(fills[0].traded_volume, 10);
            }
            _ => panic!("expected a full fill: per-unit limit 105 clears the 100-priced level"),
        }
        assert_eq!(engine.best_ask(), None);
    }

    #[test]
    fn fok_rejects_whole_order_when_infeasible() {
        let engine = engine();
        place_gtc(&engine, 100, 1, Action::Ask, 1000, 0, 3, 0);
        let outcome = place_fok(&engine, Action::Bid, 1000, 0, 10);
        match outcome {
            PlaceOutcome::Reduced { remainder, fills, .. } => {
                assert_eq!(remainder, 10);
                assert!(fills.is_empty());
            }
            _ => panic!("expected reduce"),
        }
        assert_eq!(engine.get_order(100).unwrap().remaining(), 3);
    }

    #[test]
    fn fok_budget_rejects_when_too_expensive() {
        let engine = engine();
        place_gtc(&engine, 1, 1, Action::Ask, 800, 0, 3, 0);
        place_gtc(&engine, 2, 1, Action::Ask, 900, 0, 4, 1);
        place_gtc(&engine, 3, 1, Action::Ask, 1000, 0, 5, 2);

        let outcome = place_fok_budget(&engine, 300, Action::Bid, 7500, 0, 10).unwrap();
        match outcome {
            PlaceOutcome::Reduced { remainder, .. } => assert_eq!(remainder, 10),
            _ => panic!("expected reduce: 9000 budget exceeds 7500 cap"),
        }
    }

    #[test]
    fn fok_budget_fills_when_within_cap() {
        let engine = engine();
        place_gtc(&engine, 1, 1, Action::Ask, 800, 0, 3, 0);
        place_gtc(&engine, 2, 1, Action::Ask, 900, 0, 4, 1);
        place_gtc(&engine, 3, 1, Action::Ask, 1000, 0, 5, 2);

        let outcome = place_fok_budget(&engine, 300, Action::Bid, 9000, 0, 10).unwrap();
        match outcome {
            PlaceOutcome::FullyFilled { fills } => assert_eq!(fills.len(), 3),
            _ => panic!("expected full fill: 9000 budget meets 9000 cap"),
        }
    }
}
