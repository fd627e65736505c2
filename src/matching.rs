//! Price-time-priority matching: sweeps the opposite side of the book
//! against an incoming order, emits [`Trade`]s, and rests any eligible
//! residual. Also owns the out-of-book side-band of dormant STOP_LOSS
//! orders (spec's resolved Open Question (b)).

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::book::OrderBook;
use crate::order::{Order, OrderType, Side};
use crate::trade::Trade;

/// Stateful matching engine: holds the side-band of dormant stop orders.
/// The order book itself is threaded in per call, not owned here, so the
/// facade can own all book/compliance state as spec §5 requires.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    pending_stops: Vec<Order>,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self {
            pending_stops: Vec::new(),
        }
    }

    pub fn pending_stop_count(&self) -> usize {
        self.pending_stops.len()
    }

    /// Matches `order` against `book`. Returns the trades produced, whether
    /// the order (or its residual) now rests on the book, and any orders
    /// that reached a terminal state during this call (filled makers, and
    /// the taker itself if it didn't rest) — the caller is responsible for
    /// returning these to its [`crate::pool::OrderPool`], since the engine
    /// doesn't own one (see spec §5: all mutable state, including the
    /// pool, is exclusively owned by the facade).
    ///
    /// STOP_LOSS orders never walk the book here: they're parked in the
    /// side-band until [`MatchingEngine::poll_stop_orders`] activates them.
    pub fn match_order(&mut self, book: &mut OrderBook, mut order: Order) -> (Vec<Trade>, bool, Vec<Order>) {
        if order.order_type == OrderType::StopLoss {
            debug!(order_id = order.id, trigger = ?order.trigger_price, "stop order parked in side-band");
            self.pending_stops.push(order);
            return (Vec::new(), false, Vec::new());
        }

        if order.order_type == OrderType::Fok && !Self::fok_satisfiable(book, &order) {
            warn!(order_id = order.id, quantity = order.quantity, "FOK rejected: insufficient opposite-side volume");
            return (Vec::new(), false, vec![order]);
        }

        let (trades, mut terminal) = Self::sweep(book, &mut order);
        if !trades.is_empty() {
            info!(order_id = order.id, trade_count = trades.len(), "trades emitted");
        }

        let rests = order.quantity > 0 && order.order_type == OrderType::Limit;
        if rests {
            book.insert(order)
                .expect("resting order id assigned by the facade must be unique");
        } else {
            if order.quantity > 0 {
                debug!(order_id = order.id, remaining = order.quantity, order_type = %order.order_type, "residual discarded");
            }
            terminal.push(order);
        }
        (trades, rests, terminal)
    }

    /// Scans the stop side-band in arrival order for orders whose
    /// `trigger_price` has been crossed by `last_trade_price`, activates
    /// them (MARKET if no `price`, else LIMIT), and re-submits through
    /// `match_order`. Re-submission can itself move the last traded price,
    /// which is fed back into the scan so a cascade resolves within one
    /// poll call. Each stop fires at most once: it's removed from the
    /// side-band before being re-submitted.
    ///
    /// Returns the trades produced alongside every order that reached a
    /// terminal state across the whole cascade (see [`Self::match_order`]);
    /// the caller must route these back to its [`crate::pool::OrderPool`].
    pub fn poll_stop_orders(&mut self, book: &mut OrderBook, mut last_trade_price: Decimal) -> (Vec<Trade>, Vec<Order>) {
        let mut all_trades = Vec::new();
        let mut all_terminal = Vec::new();

        loop {
            let triggered = self.pending_stops.iter().position(|stop| {
                let trigger = stop
                    .trigger_price
                    .expect("stop order in side-band must carry a trigger_price");
                match stop.side {
                    Side::Buy => last_trade_price >= trigger,
                    Side::Sell => last_trade_price <= trigger,
                }
            });
            let Some(index) = triggered else { break };

            let mut activated = self.pending_stops.remove(index);
            activated.order_type = if activated.price.is_some() {
                OrderType::Limit
            } else {
                OrderType::Market
            };
            info!(order_id = activated.id, order_type = %activated.order_type, "stop order triggered");

            let (trades, _, terminal) = self.match_order(book, activated);
            if let Some(last) = trades.last() {
                last_trade_price = last.price;
            }
            all_trades.extend(trades);
            all_terminal.extend(terminal);
        }

        (all_trades, all_terminal)
    }

    fn matchable(taker: &Order, opposite_best: Decimal) -> bool {
        match taker.order_type {
            OrderType::Market => true,
            _ => {
                let price = taker
                    .price
                    .expect("non-market order must carry a price by matching time");
                match taker.side {
                    Side::Buy => price >= opposite_best,
                    Side::Sell => price <= opposite_best,
                }
            }
        }
    }

    /// FOK pre-check: accumulate opposite-side volume from best price
    /// outward, up to `order.price`, until it reaches `order.quantity`.
    fn fok_satisfiable(book: &OrderBook, order: &Order) -> bool {
        let price = order.price.expect("FOK order must carry a price");
        let mut available = 0u64;
        match order.side {
            Side::Buy => {
                for (ask_price, level) in book.asks.iter() {
                    if *ask_price > price {
                        break;
                    }
                    available += level.total_volume;
                    if available >= order.quantity {
                        return true;
                    }
                }
            }
            Side::Sell => {
                for (bid_price, level) in book.bids.iter().rev() {
                    if *bid_price < price {
                        break;
                    }
                    available += level.total_volume;
                    if available >= order.quantity {
                        return true;
                    }
                }
            }
        }
        available >= order.quantity
    }

    /// Walks the opposite side level by level, best price first, FIFO
    /// within a level, until `taker` is filled or no more eligible levels
    /// remain. Returns the trades produced and every maker that was fully
    /// consumed (removed from the handle table) along the way, so the
    /// caller can return them to the pool instead of letting them drop.
    fn sweep(book: &mut OrderBook, taker: &mut Order) -> (Vec<Trade>, Vec<Order>) {
        let mut trades = Vec::new();
        let mut filled_makers = Vec::new();

        loop {
            if taker.quantity == 0 {
                break;
            }
            let best_price = match taker.side {
                Side::Buy => book.asks.keys().next().copied(),
                Side::Sell => book.bids.keys().next_back().copied(),
            };
            let Some(price) = best_price else { break };
            if !Self::matchable(taker, price) {
                break;
            }

            let mut level_emptied = false;
            loop {
                if taker.quantity == 0 {
                    break;
                }
                let (side_map, orders) = book.opposite_side_and_orders(taker.side);
                let level = side_map.get_mut(&price).expect("matchable price must have a resting level");

                let Some(maker_id) = level.head else { break };
                let maker_quantity = orders
                    .get(&maker_id)
                    .expect("level head not present in handle table")
                    .quantity;
                let fill_qty = taker.quantity.min(maker_quantity);

                taker.quantity -= fill_qty;
                orders.get_mut(&maker_id).unwrap().quantity -= fill_qty;
                // Decrement at fill time, not only at unlink time: unlink
                // subtracts the maker's *remaining* quantity, which would
                // double-count the traded amount if we didn't do this here.
                level.total_volume = level.total_volume.saturating_sub(fill_qty);

                trades.push(Trade {
                    maker_order_id: maker_id,
                    taker_order_id: taker.id,
                    price,
                    quantity: fill_qty,
                    timestamp: taker.timestamp,
                });

                if orders.get(&maker_id).unwrap().quantity == 0 {
                    level.unlink(maker_id, orders);
                    if let Some(maker) = orders.remove(&maker_id) {
                        filled_makers.push(maker);
                    }
                }
                if level.is_empty() {
                    level_emptied = true;
                    break;
                }
            }

            if level_emptied {
                book.remove_if_empty(taker.side, price);
            }
        }

        (trades, filled_makers)
    }
}
