//! Per-stock price bands and the index-level circuit breaker tier/duration
//! table, ported from SEBI-style thresholds.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Determines which daily price-band percentage applies to a stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCategory {
    Category1,
    Category2,
    Category3,
    Fno,
    Default,
}

impl StockCategory {
    fn band_fraction(self) -> Decimal {
        match self {
            StockCategory::Category1 => dec!(0.02),
            StockCategory::Category2 => dec!(0.05),
            StockCategory::Category3 => dec!(0.10),
            StockCategory::Fno => dec!(0.10),
            StockCategory::Default => dec!(0.20),
        }
    }
}

/// The action an index-level breaker trigger prescribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerAction {
    /// Halt for this many minutes from the triggering time.
    Minutes(u32),
    /// Close the market for the rest of the session.
    CloseMarket,
    /// Halt trading for the remainder of the trading day.
    HaltForDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BreakerOutcome {
    pub triggered: bool,
    pub tier: Option<Decimal>,
    pub action: Option<BreakerAction>,
}

/// Per-stock price band plus the index-level breaker evaluator.
#[derive(Debug, Clone)]
pub struct CircuitBreakerMonitor {
    pub reference_price: Decimal,
    pub stock_category: StockCategory,
    pub upper_band: Decimal,
    pub lower_band: Decimal,
}

impl CircuitBreakerMonitor {
    pub fn new(reference_price: Decimal, stock_category: StockCategory) -> Self {
        let fraction = stock_category.band_fraction();
        Self {
            reference_price,
            stock_category,
            upper_band: reference_price * (Decimal::ONE + fraction),
            lower_band: reference_price * (Decimal::ONE - fraction),
        }
    }

    pub fn check_price_band(&self, price: Decimal) -> bool {
        price >= self.lower_band && price <= self.upper_band
    }

    /// Index-level breaker: picks the highest tier whose threshold is
    /// crossed by `|current - reference| / reference`, then maps tier +
    /// time-of-day bucket to a halt action.
    pub fn evaluate(&self, current_price: Decimal, current_time: NaiveTime) -> BreakerOutcome {
        let move_fraction = (current_price - self.reference_price).abs() / self.reference_price;

        let tier = if move_fraction >= dec!(0.20) {
            Some(dec!(0.20))
        } else if move_fraction >= dec!(0.15) {
            Some(dec!(0.15))
        } else if move_fraction >= dec!(0.10) {
            Some(dec!(0.10))
        } else {
            None
        };

        let Some(tier) = tier else {
            return BreakerOutcome::default();
        };

        if tier == dec!(0.20) {
            return BreakerOutcome {
                triggered: true,
                tier: Some(tier),
                action: Some(BreakerAction::HaltForDay),
            };
        }

        let before_1pm = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
        let before_230pm = NaiveTime::from_hms_opt(14, 30, 0).unwrap();

        let action = if current_time < before_1pm {
            if tier == dec!(0.10) {
                BreakerAction::Minutes(45)
            } else {
                BreakerAction::Minutes(105)
            }
        } else if current_time < before_230pm {
            if tier == dec!(0.10) {
                BreakerAction::Minutes(15)
            } else {
                BreakerAction::Minutes(45)
            }
        } else if tier == dec!(0.10) {
            BreakerAction::Minutes(0)
        } else {
            BreakerAction::CloseMarket
        };

        BreakerOutcome {
            triggered: true,
            tier: Some(tier),
            action: Some(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn price_band_fno_is_ten_percent() {
        let mon = CircuitBreakerMonitor::new(dec!(100), StockCategory::Fno);
        assert_eq!(mon.upper_band, dec!(110.00));
        assert_eq!(mon.lower_band, dec!(90.00));
        assert!(mon.check_price_band(dec!(110)));
        assert!(!mon.check_price_band(dec!(110.01)));
    }

    #[test]
    fn no_trigger_below_ten_percent() {
        let mon = CircuitBreakerMonitor::new(dec!(100), StockCategory::Default);
        let outcome = mon.evaluate(dec!(105), t(10, 0));
        assert!(!outcome.triggered);
    }

    #[test]
    fn ten_percent_before_1pm_halts_45_minutes() {
        let mon = CircuitBreakerMonitor::new(dec!(100), StockCategory::Default);
        let outcome = mon.evaluate(dec!(110), t(10, 0));
        assert_eq!(outcome.tier, Some(dec!(0.10)));
        assert_eq!(outcome.action, Some(BreakerAction::Minutes(45)));
    }

    #[test]
    fn fifteen_percent_afternoon_closes_market() {
        let mon = CircuitBreakerMonitor::new(dec!(100), StockCategory::Default);
        let outcome = mon.evaluate(dec!(115), t(15, 0));
        assert_eq!(outcome.action, Some(BreakerAction::CloseMarket));
    }

    #[test]
    fn ten_percent_after_230_is_a_no_op() {
        let mon = CircuitBreakerMonitor::new(dec!(100), StockCategory::Default);
        let outcome = mon.evaluate(dec!(110), t(15, 0));
        assert_eq!(outcome.action, Some(BreakerAction::Minutes(0)));
    }

    #[test]
    fn twenty_percent_halts_for_day_regardless_of_time() {
        let mon = CircuitBreakerMonitor::new(dec!(100), StockCategory::Default);
        assert_eq!(mon.evaluate(dec!(120), t(9, 30)).action, Some(BreakerAction::HaltForDay));
        assert_eq!(mon.evaluate(dec!(80), t(15, 59)).action, Some(BreakerAction::HaltForDay));
    }
}
