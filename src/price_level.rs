//! A single price bucket: an insertion-ordered FIFO of resting orders plus
//! aggregate counters.
//!
//! The FIFO and counters live behind a [`Mutex`] so the bucket has interior
//! mutability and can be stored as `Arc<PriceLevel>` inside a
//! `crossbeam_skiplist::SkipMap`, which only ever hands out shared
//! references to its values. The engine itself is invoked with exclusive
//! access per command, so the lock is never contended — it exists to match
//! the map's API, not to coordinate real concurrency.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::model::{RestingOrder, TradeFill};

struct PriceLevelState {
    orders: VecDeque<RestingOrder>,
    total_volume: u64,
    num_orders: u32,
}

/// All resting orders at one price on one side.
///
/// Invariants (checked by [`PriceLevel::validate`]): `total_volume` equals
/// the sum of every order's remaining size, `num_orders` equals the FIFO
/// length, and every contained order's `price` equals this bucket's price.
pub struct PriceLevel {
    price: i64,
    state: Mutex<PriceLevelState>,
}

impl PriceLevel {
    pub fn new(price: i64) -> Self {
        Self {
            price,
            state: Mutex::new(PriceLevelState {
                orders: VecDeque::new(),
                total_volume: 0,
                num_orders: 0,
            }),
        }
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn total_volume(&self) -> u64 {
        self.state.lock().unwrap().total_volume
    }

    pub fn num_orders(&self) -> u32 {
        self.state.lock().unwrap().num_orders
    }

    pub fn is_empty(&self) -> bool {
        self.num_orders() == 0
    }

    /// Appends `order` to the FIFO tail. Precondition: `order.remaining() > 0`
    /// and `order.price == self.price()`.
    pub fn put(&self, order: RestingOrder) {
        debug_assert!(order.remaining() > 0);
        debug_assert_eq!(order.price, self.price);
        let mut state = self.state.lock().unwrap();
        state.total_volume += order.remaining();
        state.num_orders += 1;
        state.orders.push_back(order);
    }

    /// Removes the specifically identified order if its `uid` matches.
    /// Returns `None` (no mutation) on a missing id or a `uid` mismatch.
    pub fn remove(&self, order_id: u64, uid: u64) -> Option<RestingOrder> {
        let mut state = self.state.lock().unwrap();
        let idx = state
            .orders
            .iter()
            .position(|o| o.order_id == order_id && o.uid == uid)?;
        let order = state.orders.remove(idx).expect("position just checked");
        state.total_volume -= order.remaining();
        state.num_orders -= 1;
        Some(order)
    }

    /// Looks up a resting order by id without removing it.
    pub fn find(&self, order_id: u64) -> Option<RestingOrder> {
        let state = self.state.lock().unwrap();
        state.orders.iter().find(|o| o.order_id == order_id).cloned()
    }

    /// Shrinks the identified order's `size` by `delta` lots in place, also
    /// decrementing the bucket's `total_volume`. Returns the order's new
    /// remaining size, or `None` if not found / `uid` mismatch.
    pub fn reduce_order(&self, order_id: u64, uid: u64, delta: u64) -> Option<u64> {
        let mut state = self.state.lock().unwrap();
        let remaining = {
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.order_id == order_id && o.uid == uid)?;
            order.size -= delta;
            order.remaining()
        };
        state.total_volume -= delta;
        Some(remaining)
    }

    /// Consumes makers from the FIFO head until either the bucket empties or
    /// `taker_remaining` lots have been matched.
    ///
    /// Returns the volume matched in this call, the ordered trade fills
    /// (one per maker touched), and the ids of makers that were fully
    /// consumed and popped — the caller must remove those ids from the
    /// order index.
    pub fn match_against(
        &self,
        taker_remaining: u64,
        taker_reserve_bid_price: i64,
    ) -> (u64, Vec<TradeFill>, Vec<u64>) {
        let mut state = self.state.lock().unwrap();
        let mut filled = 0u64;
        let mut fills = Vec::new();
        let mut removed = Vec::new();

        while filled < taker_remaining {
            let Some(maker) = state.orders.front_mut() else {
                break;
            };
            let available = maker.remaining();
            let take = available.min(taker_remaining - filled);
            maker.filled += take;
            filled += take;

            let maker_completed = maker.remaining() == 0;
            let maker_order_id = maker.order_id;
            let maker_uid = maker.uid;

            state.total_volume -= take;

            fills.push(TradeFill {
                maker_order_id,
                maker_uid,
                price: self.price,
                reserve_bid_price: taker_reserve_bid_price,
                traded_volume: take,
                maker_completed,
            });

            if maker_completed {
                let done = state.orders.pop_front().expect("front_mut found it");
                state.num_orders -= 1;
                removed.push(done.order_id);
            }
        }

        (filled, fills, removed)
    }

    /// Asserts the bucket's two structural invariants.
    pub fn validate(&self) -> bool {
        let state = self.state.lock().unwrap();
        let sum: u64 = state.orders.iter().map(RestingOrder::remaining).sum();
        sum == state.total_volume && state.orders.len() as u32 == state.num_orders
    }

    /// A point-in-time copy of every resting order, in FIFO order.
    pub fn snapshot_orders(&self) -> Vec<RestingOrder> {
        self.state.lock().unwrap().orders.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Action;

    fn order(id: u64, price: i64, size: u64) -> RestingOrder {
        RestingOrder::new(id, 1, Action::Ask, price, 0, size, 0, 0)
    }

    #[test]
    fn put_increments_counters() {
        let level = PriceLevel::new(1000);
        level.put(order(1, 1000, 10));
        assert_eq!(level.total_volume(), 10);
        assert_eq!(level.num_orders(), 1);
        assert!(level.validate());
    }

    #[test]
    fn remove_with_wrong_uid_is_noop() {
        let level = PriceLevel::new(1000);
        level.put(order(1, 1000, 10));
        assert!(level.remove(1, 999).is_none());
        assert_eq!(level.total_volume(), 10);
    }

    #[test]
    fn match_against_consumes_fifo_head_first() {
        let level = PriceLevel::new(500);
        level.put(order(200, 500, 10));
        level.put(order(201, 500, 10));

        let (filled, fills, removed) = level.match_against(15, 0);
        assert_eq!(filled, 15);
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].maker_order_id, 200);
        assert_eq!(fills[0].traded_volume, 10);
        assert!(fills[0].maker_completed);
        assert_eq!(fills[1].maker_order_id, 201);
        assert_eq!(fills[1].traded_volume, 5);
        assert!(!fills[1].maker_completed);
        assert_eq!(removed, vec![200]);
        assert_eq!(level.total_volume(), 5);
        assert_eq!(level.num_orders(), 1);
    }

    #[test]
    fn reduce_order_shrinks_size_and_volume() {
        let level = PriceLevel::new(1000);
        level.put(order(1, 1000, 10));
        let remaining = level.reduce_order(1, 1, 4).unwrap();
        assert_eq!(remaining, 6);
        assert_eq!(level.total_volume(), 6);
    }
}
