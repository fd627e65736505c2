//! [`Limit`]: a single price level's FIFO queue of resting orders.
//!
//! The queue is intrusive: orders live in the book's handle table and this
//! struct only tracks the head/tail order ids plus the level's aggregates.
//! `append`/`unlink` take the handle table as a parameter rather than owning
//! the orders themselves.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::order::Order;

/// One price level: a FIFO queue of orders plus aggregate volume/count.
#[derive(Debug, Clone)]
pub struct Limit {
    pub price: Decimal,
    pub total_volume: u64,
    pub order_count: u64,
    pub head: Option<u64>,
    pub tail: Option<u64>,
}

impl Limit {
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            total_volume: 0,
            order_count: 0,
            head: None,
            tail: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Links `order_id` at the tail of this level's queue and updates
    /// aggregates. `orders` must already contain the order (the book
    /// inserts it into the handle table before calling this).
    pub fn append(&mut self, order_id: u64, orders: &mut HashMap<u64, Order>) {
        let quantity = {
            let order = orders.get_mut(&order_id).expect("append: order missing from handle table");
            order.parent_level = Some(self.price);
            order.prev = self.tail;
            order.next = None;
            order.quantity
        };

        match self.tail {
            Some(tail_id) => {
                orders.get_mut(&tail_id).expect("append: dangling tail").next = Some(order_id);
            }
            None => self.head = Some(order_id),
        }
        self.tail = Some(order_id);

        self.total_volume += quantity;
        self.order_count += 1;
    }

    /// Splices `order_id` out of the queue and clears its links. The caller
    /// must have already subtracted any traded quantity from
    /// `total_volume` before a partial fill calls this (see `matching.rs`);
    /// this only subtracts the order's *current* remaining `quantity`.
    pub fn unlink(&mut self, order_id: u64, orders: &mut HashMap<u64, Order>) {
        let (prev, next, quantity) = {
            let order = orders.get_mut(&order_id).expect("unlink: order missing from handle table");
            let prev = order.prev;
            let next = order.next;
            let quantity = order.quantity;
            order.prev = None;
            order.next = None;
            order.parent_level = None;
            (prev, next, quantity)
        };

        match prev {
            Some(prev_id) => orders.get_mut(&prev_id).expect("unlink: dangling prev").next = next,
            None => self.head = next,
        }
        match next {
            Some(next_id) => orders.get_mut(&next_id).expect("unlink: dangling next").prev = prev,
            None => self.tail = prev,
        }

        self.total_volume = self.total_volume.saturating_sub(quantity);
        self.order_count -= 1;
    }
}
