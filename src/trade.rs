//! The trade record emitted by the matching engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single matched execution between a resting maker and an incoming taker.
///
/// - `price` comes from the maker's (resting) level, never the taker's.
/// - `quantity` is the amount filled in this one execution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub maker_order_id: u64,
    pub taker_order_id: u64,
    pub price: Decimal,
    pub quantity: u64,
    pub timestamp: u64,
}
