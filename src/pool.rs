//! Optional object pool recycling [`Order`] records to amortize allocation
//! on the hot submit path. Behavior-neutral: nothing the exchange does
//! changes depending on whether a pooled or freshly-allocated `Order` backs
//! a given submission.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::order::{Order, OrderType, Side};

#[derive(Debug, Default)]
pub struct OrderPool {
    free: Vec<Order>,
    issued: HashSet<u64>,
}

impl OrderPool {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            issued: HashSet::new(),
        }
    }

    /// Pops a free slot (or allocates a fresh one) and re-initializes it.
    #[allow(clippy::too_many_arguments)]
    pub fn acquire(
        &mut self,
        id: u64,
        agent_id: u64,
        side: Side,
        order_type: OrderType,
        quantity: u64,
        price: Option<Decimal>,
        trigger_price: Option<Decimal>,
        timestamp: u64,
    ) -> Order {
        let mut order = self.free.pop().unwrap_or_else(Order::blank);
        order.reset(id, agent_id, side, order_type, quantity, price, trigger_price, timestamp);
        self.issued.insert(id);
        order
    }

    /// Resets every mutable field and returns the slot to the free list.
    /// Only call this once an order is confirmed terminal (fully filled or
    /// successfully cancelled) and no longer reachable from the book —
    /// releasing a still-resting order would corrupt its level's links.
    ///
    /// Panics on a would-be double release: once `id` is released, calling
    /// this again with the same id (without an intervening `acquire`) is a
    /// caller bug.
    pub fn release(&mut self, mut order: Order) {
        let id = order.id;
        assert!(
            self.issued.remove(&id),
            "double release of order {id} from pool"
        );

        order.quantity = 0;
        order.price = None;
        order.trigger_price = None;
        order.prev = None;
        order.next = None;
        order.parent_level = None;
        self.free.push(order);
    }
}
