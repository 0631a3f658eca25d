//! Book sides and the order index: the dual-indexed structure the matching
//! core mutates on every command.
//!
//! Asks and bids are each a `crossbeam_skiplist::SkipMap<i64, Arc<PriceLevel>>`.
//! Ascending key order is the map's native iteration order, which is
//! best-first for asks; the bid side is read with `.rev()` for best-first,
//! the same way `orderbook-rs`'s matching walk reads `Side::Sell` levels
//! with `match_side.iter().rev()`. The order index is a flat
//! `dashmap::DashMap<u64, OrderLocation>` recording which bucket currently
//! owns each resting order.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::constants::Action;
use crate::model::{OrderLocation, RestingOrder, TradeFill};
use crate::price_level::PriceLevel;
use crate::symbol::SymbolSpec;

/// The resting book plus order index for one trading symbol.
pub struct MatchingEngine {
    asks: SkipMap<i64, Arc<PriceLevel>>,
    bids: SkipMap<i64, Arc<PriceLevel>>,
    order_index: DashMap<u64, OrderLocation>,
    symbol: SymbolSpec,
}

impl MatchingEngine {
    pub fn new(symbol: SymbolSpec) -> Self {
        Self {
            asks: SkipMap::new(),
            bids: SkipMap::new(),
            order_index: DashMap::new(),
            symbol,
        }
    }

    pub fn symbol(&self) -> &SymbolSpec {
        &self.symbol
    }

    fn side(&self, action: Action) -> &SkipMap<i64, Arc<PriceLevel>> {
        match action {
            Action::Ask => &self.asks,
            Action::Bid => &self.bids,
        }
    }

    /// Best ask (smallest price) if the ask side is non-empty.
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.front().map(|e| *e.key())
    }

    /// Best bid (largest price) if the bid side is non-empty.
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.back().map(|e| *e.key())
    }

    /// Looks up a resting order by id, regardless of side.
    pub fn get_order(&self, order_id: u64) -> Option<RestingOrder> {
        let loc = *self.order_index.get(&order_id)?;
        self.side(loc.action).get(&loc.price)?.value().find(order_id)
    }

    /// Every resting order whose `uid` matches, scanning both sides.
    /// Deliberately O(N): no secondary per-user index is maintained, mirroring
    /// the source system's acknowledged scan cost for this query.
    pub fn find_user_orders(&self, uid: u64) -> Vec<RestingOrder> {
        let mut out = Vec::new();
        for entry in self.asks.iter() {
            out.extend(entry.value().snapshot_orders().into_iter().filter(|o| o.uid == uid));
        }
        for entry in self.bids.iter() {
            out.extend(entry.value().snapshot_orders().into_iter().filter(|o| o.uid == uid));
        }
        out
    }

    fn get_or_create_bucket(&self, action: Action, price: i64) -> Arc<PriceLevel> {
        let side = self.side(action);
        if let Some(entry) = side.get(&price) {
            return entry.value().clone();
        }
        let bucket = Arc::new(PriceLevel::new(price));
        side.insert(price, bucket.clone());
        bucket
    }

    fn drop_bucket_if_empty(&self, action: Action, price: i64) {
        let side = self.side(action);
        if let Some(entry) = side.get(&price) {
            if entry.value().is_empty() {
                entry.remove();
            }
        }
    }

    /// Inserts a resting order at its own `action`/`price`, creating the
    /// bucket if absent, and records it in the order index.
    pub fn insert_resting(&self, order: RestingOrder) {
        let (action, price, order_id) = (order.action, order.price, order.order_id);
        let bucket = self.get_or_create_bucket(action, price);
        bucket.put(order);
        self.order_index.insert(order_id, OrderLocation { action, price });
    }

    /// Removes the identified resting order from its bucket and the index.
    /// Drops the bucket if it becomes empty. `None` on unknown id or `uid`
    /// mismatch (no mutation in that case).
    pub fn remove_resting(&self, order_id: u64, uid: u64) -> Option<RestingOrder> {
        let loc = *self.order_index.get(&order_id)?;
        let bucket = self.side(loc.action).get(&loc.price)?.value().clone();
        let removed = bucket.remove(order_id, uid)?;
        self.order_index.remove(&order_id);
        self.drop_bucket_if_empty(loc.action, loc.price);
        Some(removed)
    }

    /// Shrinks a resting order's size by `delta` in place, keeping bucket
    /// counters consistent. Does not remove the order even if its remaining
    /// would become small — callers that want full removal use
    /// [`MatchingEngine::remove_resting`] instead.
    pub fn reduce_resting(&self, order_id: u64, uid: u64, delta: u64) -> Option<u64> {
        let loc = *self.order_index.get(&order_id)?;
        let bucket = self.side(loc.action).get(&loc.price)?.value().clone();
        bucket.reduce_order(order_id, uid, delta)
    }

    /// Walks the opposite side of `taker_action`, best price first, bounded
    /// by `limit_price` when given (inclusive head-map semantics matching
    /// the taker's limit). Consumes makers until either `taker_size` lots
    /// are filled or the bounded subtree is exhausted, removing emptied
    /// buckets and index entries as it goes. Returns the total volume
    /// matched and the ordered trade fills.
    pub fn try_match_instantly(
        &self,
        taker_action: Action,
        limit_price: Option<i64>,
        taker_size: u64,
        taker_reserve_bid_price: i64,
    ) -> (u64, Vec<TradeFill>) {
        let opposite = self.side(taker_action.opposite());
        let mut filled = 0u64;
        let mut fills = Vec::new();
        let mut emptied = Vec::new();

        fn visit(
            order_index: &DashMap<u64, OrderLocation>,
            filled: &mut u64,
            fills: &mut Vec<TradeFill>,
            emptied: &mut Vec<i64>,
            price: i64,
            bucket: &Arc<PriceLevel>,
            taker_size: u64,
            taker_reserve_bid_price: i64,
        ) {
            let (matched, bucket_fills, removed) =
                bucket.match_against(taker_size - *filled, taker_reserve_bid_price);
            *filled += matched;
            fills.extend(bucket_fills);
            for id in removed {
                order_index.remove(&id);
            }
            if bucket.is_empty() {
                emptied.push(price);
            }
        }

        match taker_action {
            Action::Bid => {
                for entry in opposite.iter() {
                    if filled == taker_size {
                        break;
                    }
                    let price = *entry.key();
                    if let Some(limit) = limit_price {
                        if price > limit {
                            break;
                        }
                    }
                    visit(
                        &self.order_index,
                        &mut filled,
                        &mut fills,
                        &mut emptied,
                        price,
                        entry.value(),
                        taker_size,
                        taker_reserve_bid_price,
                    );
                }
            }
            Action::Ask => {
                for entry in opposite.iter().rev() {
                    if filled == taker_size {
                        break;
                    }
                    let price = *entry.key();
                    if let Some(limit) = limit_price {
                        if price < limit {
                            break;
                        }
                    }
                    visit(
                        &self.order_index,
                        &mut filled,
                        &mut fills,
                        &mut emptied,
                        price,
                        entry.value(),
                        taker_size,
                        taker_reserve_bid_price,
                    );
                }
            }
        }

        for price in emptied {
            opposite.remove(&price);
        }

        (filled, fills)
    }

    /// `true` iff a price-limited walk of `action`'s opposite side could
    /// cover `size` lots without the taker's limit being breached. Read-only:
    /// performs no mutation, used by FOK's feasibility peek.
    pub fn can_fill_price_capped(&self, action: Action, limit_price: i64, size: u64) -> bool {
        let opposite = self.side(action.opposite());
        let mut covered = 0u64;
        match action {
            Action::Bid => {
                for entry in opposite.iter() {
                    if *entry.key() > limit_price {
                        break;
                    }
                    covered += entry.value().total_volume();
                    if covered >= size {
                        return true;
                    }
                }
            }
            Action::Ask => {
                for entry in opposite.iter().rev() {
                    if *entry.key() < limit_price {
                        break;
                    }
                    covered += entry.value().total_volume();
                    if covered >= size {
                        return true;
                    }
                }
            }
        }
        covered >= size
    }

    /// Walks the full opposite side of `action`, best price first,
    /// accumulating notional cost until `size` lots are covered. `None` if
    /// the side cannot cover `size` lots at any price; otherwise the total
    /// cost of filling exactly `size` lots. Read-only, used by FOK_BUDGET's
    /// feasibility peek.
    pub fn budget_to_fill(&self, action: Action, size: u64) -> Option<i64> {
        let opposite = self.side(action.opposite());
        let mut covered = 0u64;
        let mut budget = 0i64;

        let levels: Vec<(i64, u64)> = match action {
            Action::Bid => opposite.iter().map(|e| (*e.key(), e.value().total_volume())).collect(),
            Action::Ask => opposite
                .iter()
                .rev()
                .map(|e| (*e.key(), e.value().total_volume()))
                .collect(),
        };

        for (price, volume) in levels {
            if covered >= size {
                break;
            }
            let take = volume.min(size - covered);
            budget = budget.wrapping_add(price.wrapping_mul(take as i64));
            covered += take;
        }

        if covered >= size { Some(budget) } else { None }
    }

    /// Copies up to `limit` ask levels (or all of them when `limit` is
    /// `None`), best-first, as `(price, total_volume, num_orders)`.
    pub fn fill_asks(&self, limit: Option<usize>) -> Vec<(i64, u64, u32)> {
        Self::fill_side(self.asks.iter(), limit)
    }

    /// Copies up to `limit` bid levels (or all of them when `limit` is
    /// `None`), best-first (largest price first).
    pub fn fill_bids(&self, limit: Option<usize>) -> Vec<(i64, u64, u32)> {
        Self::fill_side(self.bids.iter().rev(), limit)
    }

    fn fill_side<'a>(
        iter: impl Iterator<Item = crossbeam_skiplist::map::Entry<'a, i64, Arc<PriceLevel>>>,
        limit: Option<usize>,
    ) -> Vec<(i64, u64, u32)> {
        let mut out = Vec::new();
        for entry in iter {
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
            let bucket = entry.value();
            out.push((bucket.price(), bucket.total_volume(), bucket.num_orders()));
        }
        out
    }

    /// Validates every bucket's internal counters on both sides.
    pub fn verify_internal_state(&self) -> bool {
        self.asks.iter().all(|e| e.value().validate()) && self.bids.iter().all(|e| e.value().validate())
    }

    /// `true` iff the book is not locked/crossed: either side is empty, or
    /// the best ask strictly exceeds the best bid.
    pub fn is_uncrossed(&self) -> bool {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => ask > bid,
            _ => true,
        }
    }

    /// Deterministic hash of both sides plus the symbol, using the
    /// `h = h*31 + elem` stream combine over each side in natural order and
    /// a three-argument combine over the two stream hashes and the symbol's
    /// own hash.
    pub fn state_hash(&self) -> i64 {
        let ask_hash = Self::stream_hash(self.asks.iter());
        let bid_hash = Self::stream_hash(self.bids.iter());
        let symbol_hash = self.symbol.state_hash();

        let mut h: i64 = 1;
        h = h.wrapping_mul(31).wrapping_add(ask_hash);
        h = h.wrapping_mul(31).wrapping_add(bid_hash);
        h = h.wrapping_mul(31).wrapping_add(symbol_hash);
        h
    }

    fn stream_hash<'a>(
        iter: impl Iterator<Item = crossbeam_skiplist::map::Entry<'a, i64, Arc<PriceLevel>>>,
    ) -> i64 {
        let mut h: i64 = 1;
        for entry in iter {
            for order in entry.value().snapshot_orders() {
                h = h.wrapping_mul(31).wrapping_add(order.stream_hash());
            }
        }
        h
    }
}
