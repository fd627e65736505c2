//! Composes the session manager and circuit-breaker monitor into the
//! pre-/post-trade compliance gate that sits inline on the submission path.

use chrono::{Duration, NaiveTime};
use rust_decimal::Decimal;
use tracing::warn;

use crate::circuit_breaker::{BreakerAction, CircuitBreakerMonitor, StockCategory};
use crate::error::OrderBookError;
use crate::order::{Order, OrderType};
use crate::session::TradingSessionManager;

/// Owns the one piece of state in the whole core that mutates outside the
/// matching path: `market_halted` / `halt_end_time`, toggled by `observe`
/// and cleared by `validate` once time advances past the halt.
pub struct ComplianceGate {
    session_manager: TradingSessionManager,
    circuit_breaker: CircuitBreakerMonitor,
    market_halted: bool,
    halt_end_time: Option<NaiveTime>,
}

impl ComplianceGate {
    pub fn new(reference_price: Decimal, stock_category: StockCategory) -> Self {
        Self {
            session_manager: TradingSessionManager::new(),
            circuit_breaker: CircuitBreakerMonitor::new(reference_price, stock_category),
            market_halted: false,
            halt_end_time: None,
        }
    }

    pub fn is_halted(&self) -> bool {
        self.market_halted
    }

    pub fn halt_end_time(&self) -> Option<NaiveTime> {
        self.halt_end_time
    }

    pub fn price_band(&self) -> (Decimal, Decimal) {
        (self.circuit_breaker.lower_band, self.circuit_breaker.upper_band)
    }

    fn validate_shape(order: &Order) -> Result<(), OrderBookError> {
        if order.quantity == 0 {
            return Err(OrderBookError::InvalidOrder {
                reason: "quantity must be positive".to_string(),
            });
        }
        let needs_price = matches!(order.order_type, OrderType::Limit | OrderType::Ioc | OrderType::Fok);
        if needs_price && order.price.is_none() {
            return Err(OrderBookError::InvalidOrder {
                reason: format!("{} orders require a price", order.order_type),
            });
        }
        if order.order_type == OrderType::StopLoss && order.trigger_price.is_none() {
            return Err(OrderBookError::InvalidOrder {
                reason: "STOP_LOSS orders require a trigger_price".to_string(),
            });
        }
        if let Some(price) = order.price {
            if price <= Decimal::ZERO {
                return Err(OrderBookError::InvalidOrder {
                    reason: format!("price {price} must be positive"),
                });
            }
        }
        Ok(())
    }

    /// Pre-trade validation (spec §4.G): shape, halt, session, price band,
    /// in that order. Clears an expired halt before continuing so the gate
    /// naturally unhalts once `current_time` advances past `halt_end_time`.
    pub fn validate(&mut self, order: &Order, current_time: NaiveTime) -> Result<(), OrderBookError> {
        Self::validate_shape(order)?;

        if self.market_halted {
            let expired = self.halt_end_time.is_some_and(|end| current_time >= end);
            if expired {
                self.market_halted = false;
                self.halt_end_time = None;
            } else {
                return Err(OrderBookError::Halted);
            }
        }

        let session = self.session_manager.current_session(current_time);
        if !self
            .session_manager
            .allowed_order_types(session)
            .contains(&order.order_type)
        {
            return Err(OrderBookError::SessionForbidden {
                session: session.to_string(),
                order_type: order.order_type.to_string(),
            });
        }

        if let Some(price) = order.price {
            if !self.circuit_breaker.check_price_band(price) {
                let (lower, upper) = self.price_band();
                return Err(OrderBookError::PriceBand { price, lower, upper });
            }
        }

        Ok(())
    }

    /// Post-trade update (spec §4.G): the single state mutation the gate
    /// performs outside of `validate`'s halt-expiry check. Evaluates the
    /// index-level breaker against the last traded price and, if
    /// triggered, sets the halt and its end time.
    pub fn observe(&mut self, last_trade_price: Decimal, current_time: NaiveTime) {
        let outcome = self.circuit_breaker.evaluate(last_trade_price, current_time);
        if !outcome.triggered {
            return;
        }

        self.market_halted = true;
        self.halt_end_time = match outcome.action {
            Some(BreakerAction::Minutes(minutes)) => {
                Some(current_time.overflowing_add_signed(Duration::minutes(minutes as i64)).0)
            }
            Some(BreakerAction::CloseMarket) | Some(BreakerAction::HaltForDay) | None => None,
        };
        warn!(
            tier = ?outcome.tier,
            action = ?outcome.action,
            "circuit breaker triggered: market halted"
        );
    }
}
