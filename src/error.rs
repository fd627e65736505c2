//! Error kinds the core distinguishes (spec §7), surfaced both as a typed
//! `Result` for internal/test callers and as the stable `reason: String` on
//! [`crate::exchange::Exchange::submit`].

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderBookError {
    #[error("market halted")]
    Halted,

    #[error("{order_type} orders not allowed in {session} session")]
    SessionForbidden { session: String, order_type: String },

    #[error("price {price} is outside the price band ({lower} - {upper})")]
    PriceBand {
        price: Decimal,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("duplicate order id {order_id}")]
    DuplicateId { order_id: u64 },

    #[error("order {order_id} not found")]
    NotFound { order_id: u64 },
}
