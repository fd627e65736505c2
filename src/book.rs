//! The order book: two price-ordered maps of price -> [`Limit`], plus a
//! handle table for O(1) cancellation.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::OrderBookError;
use crate::level::Limit;
use crate::order::{Order, Side};

/// Two price-ordered sides plus the handle table that owns every `Order`.
///
/// Both `bids` and `asks` are ascending `BTreeMap`s. Bids read their best
/// price from the high end (`next_back`), asks from the low end (`next`) —
/// one map shape, a side-aware accessor, rather than negated keys.
#[derive(Debug, Default)]
pub struct OrderBook {
    pub bids: BTreeMap<Decimal, Limit>,
    pub asks: BTreeMap<Decimal, Limit>,
    orders: HashMap<u64, Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
        }
    }

    /// Disjoint-field borrow of `side`'s own map and the handle table
    /// together. Needed because `insert`/`cancel` mutate a `Limit` and its
    /// member `Order`s in the same step, and a `&mut self` method call
    /// returning just one field would otherwise hold `self` borrowed for
    /// as long as that field reference lives.
    fn side_and_orders(&mut self, side: Side) -> (&mut BTreeMap<Decimal, Limit>, &mut HashMap<u64, Order>) {
        match side {
            Side::Buy => (&mut self.bids, &mut self.orders),
            Side::Sell => (&mut self.asks, &mut self.orders),
        }
    }

    /// Rests a limit order on the book. `order.price` must be `Some`.
    pub fn insert(&mut self, order: Order) -> Result<(), OrderBookError> {
        if self.orders.contains_key(&order.id) {
            return Err(OrderBookError::DuplicateId { order_id: order.id });
        }
        let price = order
            .price
            .expect("insert: resting order must carry a price");
        let id = order.id;
        let side = order.side;

        let (book_side, orders) = self.side_and_orders(side);
        orders.insert(id, order);
        let level = book_side.entry(price).or_insert_with(|| Limit::new(price));
        level.append(id, orders);

        debug!(order_id = id, %price, ?side, "order rested on book");
        Ok(())
    }

    /// Cancels a resting order in O(log L) (amortized O(1) handle lookup,
    /// O(log L) map removal if the level empties). Returns the removed
    /// order, or `None` if `order_id` was never resting.
    pub fn cancel(&mut self, order_id: u64) -> Option<Order> {
        let (side, price) = {
            let order = self.orders.get(&order_id)?;
            (order.side, order.parent_level?)
        };

        let (book_side, orders) = self.side_and_orders(side);
        let level = book_side.get_mut(&price)?;
        level.unlink(order_id, orders);
        let now_empty = level.is_empty();
        if now_empty {
            book_side.remove(&price);
        }

        self.orders.remove(&order_id)
    }

    pub fn get_order(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// The best opposite-side level for a taker of `side`, or `None` if
    /// that side is empty. BUY takers consume asks; SELL takers consume
    /// bids.
    pub fn peek_best_level(&self, taker_side: Side) -> Option<&Limit> {
        match taker_side {
            Side::Buy => self.asks.iter().next().map(|(_, l)| l),
            Side::Sell => self.bids.iter().next_back().map(|(_, l)| l),
        }
    }

    /// Removes a now-empty level from the opposite side's map. Called by
    /// the matching engine after a walk fully drains a level.
    pub(crate) fn remove_if_empty(&mut self, taker_side: Side, price: Decimal) {
        let book_side = match taker_side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };
        if let Some(level) = book_side.get(&price) {
            if level.is_empty() {
                book_side.remove(&price);
            }
        }
    }

    /// Disjoint-field borrow of the opposite side's map and the handle
    /// table together, for the matching engine's fill loop (it needs to
    /// mutate a `Limit` and its member `Order`s in the same step).
    pub(crate) fn opposite_side_and_orders(
        &mut self,
        taker_side: Side,
    ) -> (&mut BTreeMap<Decimal, Limit>, &mut HashMap<u64, Order>) {
        match taker_side {
            Side::Buy => (&mut self.asks, &mut self.orders),
            Side::Sell => (&mut self.bids, &mut self.orders),
        }
    }

    /// Checks the five universal invariants of spec §8. Panics with a
    /// diagnostic on the first violation found; never called on the hot
    /// path, only from tests/debug tooling.
    pub fn assert_invariants(&self) {
        for (side_name, side) in [("bids", &self.bids), ("asks", &self.asks)] {
            for (price, level) in side.iter() {
                assert_eq!(
                    *price, level.price,
                    "{side_name}: map key {price} does not match level.price {}",
                    level.price
                );
                assert!(
                    !level.is_empty(),
                    "{side_name}: empty level {price} left in side-map"
                );

                let mut seen = 0u64;
                let mut volume = 0u64;
                let mut cursor = level.head;
                while let Some(id) = cursor {
                    let order = self
                        .orders
                        .get(&id)
                        .unwrap_or_else(|| panic!("{side_name}: order {id} linked but missing from handle table"));
                    assert_eq!(order.parent_level, Some(*price), "order {id} parent_level mismatch");
                    assert!(order.quantity > 0, "order {id} resting with zero quantity");
                    seen += 1;
                    volume += order.quantity;
                    cursor = order.next;
                }
                assert_eq!(seen, level.order_count, "{side_name} {price}: order_count mismatch");
                assert_eq!(volume, level.total_volume, "{side_name} {price}: total_volume mismatch");
            }
        }

        for (&id, order) in self.orders.iter() {
            assert!(
                order.is_resting(),
                "order {id} present in handle table but not linked into any level"
            );
        }

        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            assert!(bid < ask, "book crossed at rest: best_bid {bid} >= best_ask {ask}");
        }
    }
}

impl fmt::Display for OrderBook {
    /// Textual rendering per spec §6: asks top-down (worst to best, so the
    /// best ask sits just above the separator), then bids best-to-worst.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in self.asks.values().rev() {
            writeln!(f, "ASK: {} | {}", level.price, level.total_volume)?;
        }
        writeln!(f, "{}", "-".repeat(30))?;
        for level in self.bids.values().rev() {
            writeln!(f, "BID: {} | {}", level.price, level.total_volume)?;
        }
        Ok(())
    }
}
