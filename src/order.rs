//! The order record: stable identity, mutable remaining quantity, and the
//! intrusive links a [`crate::level::Limit`] threads it onto while resting.

use std::fmt;

use rust_decimal::Decimal;

/// Which side of the book an order sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        })
    }
}

/// The five order types the engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopLoss,
    Ioc,
    Fok,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::StopLoss => "STOP_LOSS",
            OrderType::Ioc => "IOC",
            OrderType::Fok => "FOK",
        };
        f.write_str(label)
    }
}

/// A single order moving through the engine.
///
/// `prev`/`next`/`parent_level` are the intrusive doubly-linked-list links
/// that thread a resting order into its price level's FIFO queue. They're
/// id-based rather than raw pointers so the handle table (a plain
/// `HashMap<u64, Order>`) can own every `Order` value without any
/// `Rc`/`RefCell` cycles.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: u64,
    pub agent_id: u64,
    pub side: Side,
    pub order_type: OrderType,
    /// Remaining (unfilled) quantity. Reaches zero at full fill.
    pub quantity: u64,
    /// Present for LIMIT/IOC/FOK/STOP_LOSS; absent for MARKET.
    pub price: Option<Decimal>,
    /// Present for STOP_LOSS.
    pub trigger_price: Option<Decimal>,
    /// Monotonic sequence assigned by the facade, used as the time-priority
    /// tiebreak. Not a wall-clock timestamp.
    pub timestamp: u64,
    pub(crate) prev: Option<u64>,
    pub(crate) next: Option<u64>,
    pub(crate) parent_level: Option<Decimal>,
}

impl Order {
    /// Builds a fresh, non-resting order. This is the public constructor
    /// for callers outside the crate (tests, benches, driver code); the
    /// facade itself goes through [`crate::pool::OrderPool`] instead so
    /// records can be recycled.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        agent_id: u64,
        side: Side,
        order_type: OrderType,
        quantity: u64,
        price: Option<Decimal>,
        trigger_price: Option<Decimal>,
        timestamp: u64,
    ) -> Self {
        let mut order = Self::blank();
        order.reset(id, agent_id, side, order_type, quantity, price, trigger_price, timestamp);
        order
    }

    /// A zeroed placeholder, only ever handed out by [`crate::pool::OrderPool`]
    /// before `reset` fills in real values.
    pub(crate) fn blank() -> Self {
        Self {
            id: 0,
            agent_id: 0,
            side: Side::Buy,
            order_type: OrderType::Market,
            quantity: 0,
            price: None,
            trigger_price: None,
            timestamp: 0,
            prev: None,
            next: None,
            parent_level: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn reset(
        &mut self,
        id: u64,
        agent_id: u64,
        side: Side,
        order_type: OrderType,
        quantity: u64,
        price: Option<Decimal>,
        trigger_price: Option<Decimal>,
        timestamp: u64,
    ) {
        self.id = id;
        self.agent_id = agent_id;
        self.side = side;
        self.order_type = order_type;
        self.quantity = quantity;
        self.price = price;
        self.trigger_price = trigger_price;
        self.timestamp = timestamp;
        self.prev = None;
        self.next = None;
        self.parent_level = None;
    }

    /// `true` iff this order is linked into a price level's queue.
    pub fn is_resting(&self) -> bool {
        self.parent_level.is_some()
    }
}
