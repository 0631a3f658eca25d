//! Core value types shared across the book, matching and snapshot modules.

use crate::constants::Action;
use serde::Serialize;

/// A resting order held inside exactly one price level bucket.
///
/// Invariant: `remaining() > 0` for as long as the order is reachable from
/// either the order index or a bucket FIFO — the owning bucket/index removes
/// an order the instant this would no longer hold.
#[derive(Debug, Clone, Serialize)]
pub struct RestingOrder {
    pub order_id: u64,
    pub uid: u64,
    pub action: Action,
    pub price: i64,
    pub reserve_bid_price: i64,
    pub size: u64,
    pub filled: u64,
    pub timestamp: i64,
}

impl RestingOrder {
    pub fn new(
        order_id: u64,
        uid: u64,
        action: Action,
        price: i64,
        reserve_bid_price: i64,
        size: u64,
        filled: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id,
            uid,
            action,
            price,
            reserve_bid_price,
            size,
            filled,
            timestamp,
        }
    }

    /// Lots not yet matched.
    pub fn remaining(&self) -> u64 {
        self.size - self.filled
    }

    /// Combines this order's fields into the running stream hash, using the
    /// `h = h*31 + x` recurrence over its `i64`/`u64` fields in declaration
    /// order (matching the canonical multi-field hash combine used by
    /// [`crate::book::MatchingEngine::state_hash`]).
    pub fn stream_hash(&self) -> i64 {
        let mut h: i64 = 1;
        h = h.wrapping_mul(31).wrapping_add(self.order_id as i64);
        h = h.wrapping_mul(31).wrapping_add(self.uid as i64);
        h = h.wrapping_mul(31).wrapping_add(self.action as i64);
        h = h.wrapping_mul(31).wrapping_add(self.price);
        h = h.wrapping_mul(31).wrapping_add(self.reserve_bid_price);
        h = h.wrapping_mul(31).wrapping_add(self.size as i64);
        h = h.wrapping_mul(31).wrapping_add(self.filled as i64);
        h
    }
}

/// One fill produced by matching a taker against a resting maker.
///
/// Intermediate representation handed from [`crate::price_level::PriceLevel::match_against`]
/// up to command dispatch, which encodes it as a trade event on the wire.
#[derive(Debug, Clone, Copy)]
pub struct TradeFill {
    pub maker_order_id: u64,
    pub maker_uid: u64,
    pub price: i64,
    /// The taker's `reserve_bid_price` at the time of the match, not the
    /// maker's own — carried through so the event encoder doesn't need to
    /// re-look up the taker's order.
    pub reserve_bid_price: i64,
    pub traded_volume: u64,
    pub maker_completed: bool,
}

/// Names which bucket a resting order currently lives in, the order index's
/// value type.
#[derive(Debug, Clone, Copy)]
pub struct OrderLocation {
    pub action: Action,
    pub price: i64,
}
