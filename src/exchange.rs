//! The exchange facade: allocates order ids and timestamps, sequences
//! compliance validation -> matching -> compliance observation, and
//! exposes the `submit`/`cancel` surface agents call.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::book::OrderBook;
use crate::circuit_breaker::StockCategory;
use crate::compliance::ComplianceGate;
use crate::matching::MatchingEngine;
use crate::order::{OrderType, Side};
use crate::pool::OrderPool;
use crate::trade::Trade;

/// The central exchange: owns all mutable state (book, compliance,
/// pool) exclusively, per the single-threaded, event-serial contract of
/// spec §5. Each `submit`/`cancel` call is one atomic transition.
pub struct Exchange {
    book: OrderBook,
    engine: MatchingEngine,
    gate: ComplianceGate,
    pool: OrderPool,
    next_order_id: u64,
    next_timestamp: u64,
}

impl Exchange {
    pub fn new(reference_price: Decimal, stock_category: StockCategory) -> Self {
        Self {
            book: OrderBook::new(),
            engine: MatchingEngine::new(),
            gate: ComplianceGate::new(reference_price, stock_category),
            pool: OrderPool::new(),
            next_order_id: 0,
            next_timestamp: 0,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_order_id += 1;
        self.next_order_id
    }

    fn allocate_timestamp(&mut self) -> u64 {
        self.next_timestamp += 1;
        self.next_timestamp
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.book.best_bid()
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.book.best_ask()
    }

    pub fn is_halted(&self) -> bool {
        self.gate.is_halted()
    }

    /// Primary entry point for agents to submit an order.
    ///
    /// `current_time` is the wall/logical time-of-day, supplied by the
    /// caller (the core has no simulation clock of its own, per spec §1).
    #[instrument(skip(self), fields(agent_id, %side, %order_type, quantity))]
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        agent_id: u64,
        side: Side,
        quantity: u64,
        order_type: OrderType,
        price: Option<Decimal>,
        trigger_price: Option<Decimal>,
        current_time: NaiveTime,
    ) -> (bool, String, Vec<Trade>) {
        let id = self.allocate_id();
        let timestamp = self.allocate_timestamp();
        let order = self
            .pool
            .acquire(id, agent_id, side, order_type, quantity, price, trigger_price, timestamp);

        if let Err(err) = self.gate.validate(&order, current_time) {
            info!(order_id = id, error = %err, "order rejected");
            self.pool.release(order);
            return (false, err.to_string(), Vec::new());
        }

        let (trades, rests, mut terminal) = self.engine.match_order(&mut self.book, order);

        if let Some(last_trade) = trades.last() {
            self.gate.observe(last_trade.price, current_time);
            let (_, stop_terminal) = self.engine.poll_stop_orders(&mut self.book, last_trade.price);
            terminal.extend(stop_terminal);
        }

        // Every order that reached a terminal state this call (filled
        // makers, a fully-filled or residual-discarded taker, any stops
        // the poll above activated and terminated) goes back to the pool
        // for recycling. A resting order is reachable from the book and
        // must not be released.
        for order in terminal {
            self.pool.release(order);
        }

        let _ = rests;
        info!(order_id = id, trade_count = trades.len(), "order accepted");
        (true, "accepted".to_string(), trades)
    }

    /// Cancels a resting order. Returns `false` if `order_id` was never
    /// resting, or was already cancelled/fully filled.
    pub fn cancel(&mut self, order_id: u64) -> bool {
        match self.book.cancel(order_id) {
            Some(order) => {
                info!(order_id, "order cancelled");
                self.pool.release(order);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn regular() -> NaiveTime {
        t(10, 0)
    }

    #[test]
    fn s1_build_book() {
        let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
        let (ok1, _, t1) = ex.submit(1, Side::Buy, 10, OrderType::Limit, Some(dec!(99)), None, regular());
        let (ok2, _, t2) = ex.submit(2, Side::Buy, 5, OrderType::Limit, Some(dec!(98)), None, regular());
        let (ok3, _, t3) = ex.submit(3, Side::Sell, 8, OrderType::Limit, Some(dec!(101)), None, regular());
        let (ok4, _, t4) = ex.submit(4, Side::Sell, 12, OrderType::Limit, Some(dec!(102)), None, regular());

        assert!(ok1 && ok2 && ok3 && ok4);
        assert!(t1.is_empty() && t2.is_empty() && t3.is_empty() && t4.is_empty());
        assert_eq!(ex.best_bid(), Some(dec!(99)));
        assert_eq!(ex.best_ask(), Some(dec!(101)));
    }

    #[test]
    fn s2_market_sweep() {
        let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
        ex.submit(1, Side::Buy, 10, OrderType::Limit, Some(dec!(99)), None, regular());
        ex.submit(2, Side::Buy, 5, OrderType::Limit, Some(dec!(98)), None, regular());
        ex.submit(3, Side::Sell, 8, OrderType::Limit, Some(dec!(101)), None, regular());
        ex.submit(4, Side::Sell, 12, OrderType::Limit, Some(dec!(102)), None, regular());

        let (ok, _, trades) = ex.submit(5, Side::Buy, 10, OrderType::Market, None, None, regular());
        assert!(ok);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].maker_order_id, 3);
        assert_eq!(trades[0].taker_order_id, 5);
        assert_eq!(trades[0].price, dec!(101));
        assert_eq!(trades[0].quantity, 8);
        assert_eq!(trades[1].maker_order_id, 4);
        assert_eq!(trades[1].quantity, 2);
        assert_eq!(ex.best_ask(), Some(dec!(102)));
        assert_eq!(ex.book().asks.get(&dec!(102)).unwrap().total_volume, 10);
    }

    #[test]
    fn s3_cancel() {
        let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
        ex.submit(1, Side::Buy, 10, OrderType::Limit, Some(dec!(99)), None, regular());
        ex.submit(2, Side::Buy, 5, OrderType::Limit, Some(dec!(98)), None, regular());

        assert!(ex.cancel(2));
        assert_eq!(ex.best_bid(), Some(dec!(99)));
        assert!(!ex.cancel(2));
    }

    #[test]
    fn s4_price_band_rejection() {
        let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
        let (ok, reason, trades) = ex.submit(1, Side::Buy, 10, OrderType::Limit, Some(dec!(111)), None, regular());
        assert!(!ok);
        assert!(reason.contains("price"));
        assert!(trades.is_empty());
        assert_eq!(ex.best_bid(), None);
    }

    #[test]
    fn s5_partial_fill_and_rest() {
        let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
        ex.submit(3, Side::Sell, 8, OrderType::Limit, Some(dec!(101)), None, regular());
        ex.submit(4, Side::Sell, 12, OrderType::Limit, Some(dec!(102)), None, regular());
        ex.submit(5, Side::Buy, 10, OrderType::Market, None, None, regular());

        let (ok, _, trades) = ex.submit(6, Side::Buy, 15, OrderType::Limit, Some(dec!(102)), None, regular());
        assert!(ok);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].maker_order_id, 4);
        assert_eq!(trades[0].quantity, 10);
        assert_eq!(ex.best_bid(), Some(dec!(102)));
        assert_eq!(ex.best_ask(), None);
        assert_eq!(ex.book().bids.get(&dec!(102)).unwrap().total_volume, 5);
    }

    #[test]
    fn s6_fok_reject() {
        let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
        ex.submit(3, Side::Sell, 8, OrderType::Limit, Some(dec!(101)), None, regular());
        ex.submit(4, Side::Sell, 12, OrderType::Limit, Some(dec!(102)), None, regular());

        let (ok, _, trades) = ex.submit(7, Side::Buy, 25, OrderType::Fok, Some(dec!(102)), None, regular());
        assert!(ok);
        assert!(trades.is_empty());
        assert_eq!(ex.book().asks.get(&dec!(101)).unwrap().total_volume, 8);
        assert_eq!(ex.book().asks.get(&dec!(102)).unwrap().total_volume, 12);
    }

    #[test]
    fn stop_loss_triggers_after_post_trade_update() {
        let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
        ex.submit(1, Side::Sell, 20, OrderType::Limit, Some(dec!(100)), None, regular());
        // BUY stop-loss, triggers once the last trade price reaches >= 99.
        ex.submit(2, Side::Buy, 5, OrderType::StopLoss, None, Some(dec!(99)), regular());

        let (ok, _, trades) = ex.submit(3, Side::Buy, 3, OrderType::Limit, Some(dec!(100)), None, regular());
        assert!(ok);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 3);
        // the resting ask at 100 (order 1, 20 - 3 = 17) is further eaten by the
        // activated stop (market buy for 5) polled after this trade's price update.
        assert_eq!(ex.book().asks.get(&dec!(100)).unwrap().total_volume, 12);
    }
}
