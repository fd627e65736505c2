use chrono::NaiveTime;
use order_book_engine::{Exchange, Order, OrderBook, OrderType, Side, StockCategory};
use rust_decimal_macros::dec;

fn regular() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap()
}

#[test]
fn invariants_hold_after_a_mixed_sequence_of_inserts_and_cancels() {
    let mut book = OrderBook::new();
    book.insert(Order::new(1, 1, Side::Buy, OrderType::Limit, 10, Some(dec!(99)), None, 1))
        .unwrap();
    book.insert(Order::new(2, 1, Side::Buy, OrderType::Limit, 5, Some(dec!(99)), None, 2))
        .unwrap();
    book.insert(Order::new(3, 1, Side::Sell, OrderType::Limit, 8, Some(dec!(101)), None, 3))
        .unwrap();
    book.assert_invariants();

    book.cancel(1);
    book.assert_invariants();

    book.insert(Order::new(4, 1, Side::Sell, OrderType::Limit, 12, Some(dec!(102)), None, 4))
        .unwrap();
    book.cancel(3);
    book.assert_invariants();

    assert_eq!(book.best_bid(), Some(dec!(99)));
    assert_eq!(book.best_ask(), Some(dec!(102)));
}

#[test]
fn cancel_of_absent_id_is_a_no_op_and_returns_false() {
    let mut book = OrderBook::new();
    book.insert(Order::new(1, 1, Side::Sell, OrderType::Limit, 5, Some(dec!(100)), None, 1))
        .unwrap();

    assert!(book.cancel(999).is_none());
    book.assert_invariants();
}

#[test]
fn cancel_of_resting_id_is_exactly_once() {
    let mut book = OrderBook::new();
    book.insert(Order::new(1, 1, Side::Sell, OrderType::Limit, 5, Some(dec!(100)), None, 1))
        .unwrap();

    assert!(book.cancel(1).is_some());
    assert!(book.cancel(1).is_none());
}

#[test]
fn insert_then_cancel_round_trips_depth_and_best_prices() {
    let mut book = OrderBook::new();
    book.insert(Order::new(1, 1, Side::Buy, OrderType::Limit, 10, Some(dec!(99)), None, 1))
        .unwrap();
    let best_before = book.best_bid();

    book.insert(Order::new(2, 1, Side::Buy, OrderType::Limit, 7, Some(dec!(98)), None, 2))
        .unwrap();
    book.cancel(2);

    assert_eq!(book.best_bid(), best_before);
    assert_eq!(book.bids.len(), 1);
    assert_eq!(book.bids.get(&dec!(99)).unwrap().total_volume, 10);
}

#[test]
fn invariants_hold_through_a_full_exchange_session_with_fills_and_rests() {
    let mut ex = Exchange::new(dec!(100), StockCategory::Fno);
    ex.submit(1, Side::Sell, 8, OrderType::Limit, Some(dec!(101)), None, regular());
    ex.submit(2, Side::Sell, 12, OrderType::Limit, Some(dec!(102)), None, regular());
    ex.submit(3, Side::Buy, 10, OrderType::Market, None, None, regular());
    ex.submit(4, Side::Buy, 15, OrderType::Limit, Some(dec!(102)), None, regular());
    ex.cancel(4);

    ex.book().assert_invariants();
}

#[test]
fn conservation_of_quantity_across_a_multi_maker_fill() {
    let mut book = OrderBook::new();
    book.insert(Order::new(1, 1, Side::Sell, OrderType::Limit, 4, Some(dec!(100)), None, 1))
        .unwrap();
    book.insert(Order::new(2, 1, Side::Sell, OrderType::Limit, 6, Some(dec!(100)), None, 2))
        .unwrap();

    let mut engine = order_book_engine::MatchingEngine::new();
    let taker = Order::new(3, 1, Side::Buy, OrderType::Market, 9, None, None, 3);
    let (trades, _, _) = engine.match_order(&mut book, taker);

    let filled: u64 = trades.iter().map(|t| t.quantity).sum();
    assert_eq!(filled, 9);
    assert!(filled <= 9);
    book.assert_invariants();
    // maker 1 fully filled (4), maker 2 partially filled for 5, 1 remains.
    assert_eq!(book.asks.get(&dec!(100)).unwrap().total_volume, 1);
}
