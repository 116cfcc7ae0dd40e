use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::errors::{Error, LedgerError};
use crate::transactions::{Transaction, TransactionStatus, TransactionType};

const USER: &str = "user-1";

fn ts(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
}

#[allow(clippy::too_many_arguments)]
fn tx(
    id: &str,
    transaction_type: TransactionType,
    from: Option<&str>,
    to: Option<&str>,
    from_amount: Decimal,
    to_amount: Decimal,
    unit_price: Decimal,
    day: i64,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        user_id: USER.to_string(),
        transaction_type,
        from_token: from.map(str::to_string),
        to_token: to.map(str::to_string),
        from_amount,
        to_amount,
        unit_price,
        timestamp: ts(day),
        external_reference: None,
        gas_used: None,
        gas_cost: None,
        status: TransactionStatus::Confirmed,
        venue: None,
        notes: None,
        created_at: ts(day),
    }
}

fn buy(id: &str, symbol: &str, quantity: Decimal, price: Decimal, day: i64) -> Transaction {
    tx(
        id,
        TransactionType::Buy,
        Some("USD"),
        Some(symbol),
        quantity * price,
        quantity,
        price,
        day,
    )
}

fn sell(id: &str, symbol: &str, quantity: Decimal, price: Decimal, day: i64) -> Transaction {
    tx(
        id,
        TransactionType::Sell,
        Some(symbol),
        Some("USD"),
        quantity,
        quantity * price,
        price,
        day,
    )
}

fn ledger_after(transactions: &[Transaction], policy: OversellPolicy) -> Ledger {
    let mut ledger = Ledger::new(USER, policy);
    for t in transactions {
        ledger.apply(t).unwrap();
    }
    ledger
}

#[test]
fn test_two_buys_produce_weighted_average_price() {
    let ledger = ledger_after(
        &[
            buy("t1", "ETH", dec!(10), dec!(100), 0),
            buy("t2", "ETH", dec!(5), dec!(120), 1),
        ],
        OversellPolicy::Reject,
    );

    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, dec!(15));
    assert_eq!(eth.weighted_average_price.round_dp(3), dec!(106.667));
    assert_eq!(eth.total_invested, dec!(1600));
    assert_eq!(eth.total_realized_pnl, Decimal::ZERO);
    assert_eq!(eth.first_acquisition_timestamp, ts(0));
    assert_eq!(eth.last_activity_timestamp, ts(1));
}

#[test]
fn test_sell_realizes_against_average_cost() {
    let ledger = ledger_after(
        &[
            buy("t1", "ETH", dec!(10), dec!(100), 0),
            buy("t2", "ETH", dec!(5), dec!(120), 1),
            sell("t3", "ETH", dec!(5), dec!(150), 2),
        ],
        OversellPolicy::Reject,
    );

    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, dec!(10));
    assert_eq!(eth.total_realized_pnl.round_dp(2), dec!(216.67));
    assert_eq!(eth.weighted_average_price.round_dp(3), dec!(106.667));
    // total invested is cumulative and not reduced by sells
    assert_eq!(eth.total_invested, dec!(1600));
}

#[test]
fn test_oversell_is_rejected_without_mutation() {
    let mut ledger = ledger_after(
        &[buy("t1", "BTC", dec!(1), dec!(50000), 0)],
        OversellPolicy::Reject,
    );
    let before = ledger.position("BTC").cloned();

    let err = ledger
        .apply(&sell("t2", "BTC", dec!(2), dec!(60000), 1))
        .unwrap_err();
    match err {
        Error::Ledger(LedgerError::InsufficientQuantity {
            symbol,
            held,
            requested,
        }) => {
            assert_eq!(symbol, "BTC");
            assert_eq!(held, dec!(1));
            assert_eq!(requested, dec!(2));
        }
        other => panic!("Expected InsufficientQuantity, got {:?}", other),
    }
    assert_eq!(ledger.position("BTC").cloned(), before);
}

#[test]
fn test_selling_unknown_asset_is_rejected() {
    let mut ledger = Ledger::new(USER, OversellPolicy::Reject);
    let err = ledger
        .apply(&sell("t1", "SOL", dec!(1), dec!(10), 0))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Ledger(LedgerError::InsufficientQuantity { .. })
    ));
    assert!(ledger.positions().is_empty());
}

#[test]
fn test_clamp_policy_sells_held_quantity_with_scaled_proceeds() {
    let ledger = ledger_after(
        &[
            buy("t1", "BTC", dec!(1), dec!(100), 0),
            sell("t2", "BTC", dec!(2), dec!(150), 1),
        ],
        OversellPolicy::Clamp,
    );

    let btc = ledger.position("BTC").unwrap();
    assert_eq!(btc.quantity, Decimal::ZERO);
    // proceeds 300 scaled by 1/2, minus cost 100
    assert_eq!(btc.total_realized_pnl, dec!(50));
}

#[test]
fn test_clamp_policy_ignores_sell_of_unknown_asset() {
    let mut ledger = Ledger::new(USER, OversellPolicy::Clamp);
    let touched = ledger
        .apply(&sell("t1", "SOL", dec!(1), dec!(10), 0))
        .unwrap();
    assert!(touched.is_empty());
    assert!(ledger.positions().is_empty());
}

#[test]
fn test_allow_short_lets_quantity_go_negative() {
    let ledger = ledger_after(
        &[
            buy("t1", "BTC", dec!(1), dec!(100), 0),
            sell("t2", "BTC", dec!(3), dec!(120), 1),
        ],
        OversellPolicy::AllowShort,
    );

    let btc = ledger.position("BTC").unwrap();
    assert_eq!(btc.quantity, dec!(-2));
    assert_eq!(btc.weighted_average_price, dec!(100));
    assert_eq!(btc.total_realized_pnl, dec!(360) - dec!(300));
}

#[test]
fn test_covering_buy_past_zero_resets_average_price() {
    let mut ledger = ledger_after(
        &[sell("t1", "BTC", dec!(2), dec!(120), 0)],
        OversellPolicy::AllowShort,
    );
    assert_eq!(ledger.position("BTC").unwrap().quantity, dec!(-2));

    ledger.apply(&buy("t2", "BTC", dec!(1), dec!(90), 1)).unwrap();
    let still_short = ledger.position("BTC").unwrap();
    assert_eq!(still_short.quantity, dec!(-1));
    assert_eq!(still_short.weighted_average_price, Decimal::ZERO);

    ledger.apply(&buy("t3", "BTC", dec!(4), dec!(100), 2)).unwrap();
    let btc = ledger.position("BTC").unwrap();
    assert_eq!(btc.quantity, dec!(3));
    assert_eq!(btc.weighted_average_price, dec!(100));
    assert_eq!(btc.cost_basis(), Some(dec!(300)));
}

#[test]
fn test_out_of_range_amounts_are_rejected_without_mutation() {
    let huge_buy = tx(
        "t1",
        TransactionType::Buy,
        Some("USD"),
        Some("BTC"),
        dec!(1),
        dec!(1000000000000000),
        dec!(100000000000000),
        0,
    );
    let mut ledger = Ledger::new(USER, OversellPolicy::Reject);

    let result = ledger.apply(&huge_buy);
    assert!(matches!(
        result,
        Err(Error::Ledger(LedgerError::InvalidTransaction(_)))
    ));
    assert!(ledger.positions().is_empty());

    let max_cost = |id: &str, day: i64| {
        tx(
            id,
            TransactionType::Buy,
            Some("USD"),
            Some("ETH"),
            Decimal::MAX,
            dec!(1),
            dec!(1),
            day,
        )
    };
    ledger.apply(&max_cost("t2", 1)).unwrap();
    let result = ledger.apply(&max_cost("t3", 2));
    assert!(matches!(
        result,
        Err(Error::Ledger(LedgerError::InvalidTransaction(_)))
    ));
    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, dec!(1));
    assert_eq!(eth.total_invested, Decimal::MAX);
}

#[test]
fn test_full_sell_keeps_position_as_realized_record() {
    let ledger = ledger_after(
        &[
            buy("t1", "ETH", dec!(2), dec!(1000), 0),
            sell("t2", "ETH", dec!(2), dec!(1500), 1),
        ],
        OversellPolicy::Reject,
    );

    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, Decimal::ZERO);
    assert!(!eth.is_open());
    assert_eq!(eth.total_realized_pnl, dec!(1000));
}

#[test]
fn test_swap_sells_from_and_buys_to() {
    let ledger = ledger_after(
        &[
            buy("t1", "ETH", dec!(10), dec!(100), 0),
            // 4 ETH for 2 SOL priced at 250 each: proceeds 500
            tx(
                "t2",
                TransactionType::Swap,
                Some("ETH"),
                Some("SOL"),
                dec!(4),
                dec!(2),
                dec!(250),
                1,
            ),
        ],
        OversellPolicy::Reject,
    );

    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, dec!(6));
    assert_eq!(eth.total_realized_pnl, dec!(100));

    let sol = ledger.position("SOL").unwrap();
    assert_eq!(sol.quantity, dec!(2));
    assert_eq!(sol.weighted_average_price, dec!(250));
    assert_eq!(sol.total_invested, dec!(500));
}

#[test]
fn test_swap_oversell_touches_neither_leg() {
    let mut ledger = ledger_after(
        &[buy("t1", "ETH", dec!(1), dec!(100), 0)],
        OversellPolicy::Reject,
    );
    let result = ledger.apply(&tx(
        "t2",
        TransactionType::Swap,
        Some("ETH"),
        Some("SOL"),
        dec!(5),
        dec!(2),
        dec!(250),
        1,
    ));
    assert!(result.is_err());
    assert!(ledger.position("SOL").is_none());
    assert_eq!(ledger.position("ETH").unwrap().quantity, dec!(1));
}

#[test]
fn test_yield_is_realized_income_without_cost_basis() {
    let ledger = ledger_after(
        &[
            buy("t1", "ETH", dec!(10), dec!(100), 0),
            tx(
                "t2",
                TransactionType::Yield,
                None,
                Some("ETH"),
                Decimal::ZERO,
                dec!(1),
                dec!(110),
                1,
            ),
        ],
        OversellPolicy::Reject,
    );

    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, dec!(11));
    assert_eq!(eth.total_invested, dec!(1000));
    assert_eq!(eth.total_realized_pnl, dec!(110));
    assert_eq!(eth.weighted_average_price, dec!(100));
}

#[test]
fn test_yield_opening_a_position_uses_unit_price_as_basis() {
    let ledger = ledger_after(
        &[tx(
            "t1",
            TransactionType::Yield,
            None,
            Some("DOT"),
            Decimal::ZERO,
            dec!(5),
            dec!(7),
            0,
        )],
        OversellPolicy::Reject,
    );

    let dot = ledger.position("DOT").unwrap();
    assert_eq!(dot.quantity, dec!(5));
    assert_eq!(dot.weighted_average_price, dec!(7));
    assert_eq!(dot.total_invested, Decimal::ZERO);
    assert_eq!(dot.total_realized_pnl, dec!(35));
}

#[test]
fn test_fee_consumes_units_and_books_cost_as_loss() {
    let ledger = ledger_after(
        &[
            buy("t1", "ETH", dec!(10), dec!(100), 0),
            tx(
                "t2",
                TransactionType::Fee,
                Some("ETH"),
                None,
                dec!(0.5),
                Decimal::ZERO,
                Decimal::ZERO,
                1,
            ),
        ],
        OversellPolicy::Reject,
    );

    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, dec!(9.5));
    assert_eq!(eth.total_realized_pnl, dec!(-50));
}

#[test]
fn test_fee_in_unheld_token_is_ignored() {
    let mut ledger = Ledger::new(USER, OversellPolicy::Reject);
    let touched = ledger
        .apply(&tx(
            "t1",
            TransactionType::Fee,
            Some("BNB"),
            None,
            dec!(0.01),
            Decimal::ZERO,
            Decimal::ZERO,
            0,
        ))
        .unwrap();
    assert!(touched.is_empty());
    assert!(ledger.positions().is_empty());
}

#[test]
fn test_stake_only_refreshes_activity_timestamp() {
    let mut ledger = ledger_after(
        &[buy("t1", "ETH", dec!(10), dec!(100), 0)],
        OversellPolicy::Reject,
    );
    let before = ledger.position("ETH").cloned().unwrap();

    let touched = ledger
        .apply(&tx(
            "t2",
            TransactionType::Stake,
            Some("ETH"),
            None,
            dec!(5),
            Decimal::ZERO,
            Decimal::ZERO,
            3,
        ))
        .unwrap();

    assert_eq!(touched.len(), 1);
    let after = ledger.position("ETH").unwrap();
    assert_eq!(after.quantity, before.quantity);
    assert_eq!(after.weighted_average_price, before.weighted_average_price);
    assert_eq!(after.last_activity_timestamp, ts(3));
}

#[test]
fn test_non_confirmed_transactions_are_skipped() {
    let mut ledger = Ledger::new(USER, OversellPolicy::Reject);
    for status in [TransactionStatus::Pending, TransactionStatus::Failed] {
        let mut pending = buy("t1", "ETH", dec!(1), dec!(100), 0);
        pending.status = status;
        assert!(ledger.apply(&pending).unwrap().is_empty());
    }
    assert!(ledger.positions().is_empty());
}

#[test]
fn test_transaction_for_other_user_is_rejected() {
    let mut ledger = Ledger::new(USER, OversellPolicy::Reject);
    let mut foreign = buy("t1", "ETH", dec!(1), dec!(100), 0);
    foreign.user_id = "someone-else".to_string();
    assert!(matches!(
        ledger.apply(&foreign).unwrap_err(),
        Error::Ledger(LedgerError::InvalidTransaction(_))
    ));
}

#[test]
fn test_stage_does_not_mutate_until_commit() {
    let ledger = Ledger::new(USER, OversellPolicy::Reject);
    let update = ledger
        .stage(&buy("t1", "ETH", dec!(1), dec!(100), 0))
        .unwrap();
    assert_eq!(update.symbols(), vec!["ETH".to_string()]);
    assert!(ledger.positions().is_empty());

    let mut ledger = ledger;
    ledger.commit(update);
    assert_eq!(ledger.position("ETH").unwrap().quantity, dec!(1));
}

#[test]
fn test_replay_skips_failing_transactions() {
    let log = vec![
        buy("t1", "ETH", dec!(1), dec!(100), 0),
        sell("t2", "ETH", dec!(5), dec!(100), 1),
        buy("t3", "ETH", dec!(1), dec!(200), 2),
    ];

    let ledger = Ledger::replay(USER, OversellPolicy::Reject, &log);
    let eth = ledger.position("ETH").unwrap();
    assert_eq!(eth.quantity, dec!(2));
    assert_eq!(eth.weighted_average_price, dec!(150));
}

#[test]
fn test_dust_quantities_snap_to_zero() {
    let ledger = ledger_after(
        &[
            buy("t1", "BTC", dec!(1), dec!(100), 0),
            sell("t2", "BTC", dec!(0.999999999), dec!(100), 1),
        ],
        OversellPolicy::Reject,
    );
    assert_eq!(ledger.position("BTC").unwrap().quantity, Decimal::ZERO);
}

#[test]
fn test_oversell_policy_parsing() {
    assert_eq!("reject".parse::<OversellPolicy>().unwrap(), OversellPolicy::Reject);
    assert_eq!("Clamp".parse::<OversellPolicy>().unwrap(), OversellPolicy::Clamp);
    assert_eq!(
        "allow-short".parse::<OversellPolicy>().unwrap(),
        OversellPolicy::AllowShort
    );
    assert!("ignore".parse::<OversellPolicy>().is_err());
    assert_eq!(OversellPolicy::AllowShort.to_string(), "allow_short");
}
