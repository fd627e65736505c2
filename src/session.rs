//! Maps time-of-day to a trading-session label and the set of order types
//! that session permits. `current_time` is always an explicit parameter —
//! never read from the wall clock internally — so tests and simulations
//! can drive any session deterministically (spec's "Session override"
//! design note).

use std::collections::HashSet;
use std::fmt;

use chrono::NaiveTime;

use crate::order::OrderType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Session {
    PreMarket,
    Regular,
    PostMarket,
    Closed,
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Session::PreMarket => "pre_market",
            Session::Regular => "regular",
            Session::PostMarket => "post_market",
            Session::Closed => "closed",
        };
        f.write_str(label)
    }
}

pub struct TradingSessionManager;

impl TradingSessionManager {
    const PRE_MARKET_START: NaiveTime = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    const PRE_MARKET_END: NaiveTime = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
    const REGULAR_START: NaiveTime = NaiveTime::from_hms_opt(9, 15, 0).unwrap();
    const REGULAR_END: NaiveTime = NaiveTime::from_hms_opt(15, 30, 0).unwrap();
    const POST_MARKET_START: NaiveTime = NaiveTime::from_hms_opt(15, 40, 0).unwrap();
    const POST_MARKET_END: NaiveTime = NaiveTime::from_hms_opt(16, 0, 0).unwrap();

    pub fn new() -> Self {
        Self
    }

    pub fn current_session(&self, current_time: NaiveTime) -> Session {
        if current_time >= Self::PRE_MARKET_START && current_time < Self::PRE_MARKET_END {
            Session::PreMarket
        } else if current_time >= Self::REGULAR_START && current_time < Self::REGULAR_END {
            Session::Regular
        } else if current_time >= Self::POST_MARKET_START && current_time < Self::POST_MARKET_END {
            Session::PostMarket
        } else {
            Session::Closed
        }
    }

    pub fn allowed_order_types(&self, session: Session) -> HashSet<OrderType> {
        match session {
            Session::PreMarket => HashSet::from([OrderType::Limit, OrderType::Market]),
            Session::Regular => HashSet::from([
                OrderType::Limit,
                OrderType::Market,
                OrderType::StopLoss,
                OrderType::Ioc,
                OrderType::Fok,
            ]),
            Session::PostMarket => HashSet::from([OrderType::Limit]),
            Session::Closed => HashSet::new(),
        }
    }

    pub fn is_order_allowed(&self, order_type: OrderType, current_time: NaiveTime) -> bool {
        self.allowed_order_types(self.current_session(current_time))
            .contains(&order_type)
    }
}

impl Default for TradingSessionManager {
    fn default() -> Self {
        Self::new()
    }
}
