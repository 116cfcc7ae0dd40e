/// Transaction types
///
/// Each constant is the wire and storage name of one supported movement.

/// Acquisition of `to_token` paid with `from_amount`. Increases quantity and cost basis.
pub const TRANSACTION_TYPE_BUY: &str = "buy";

/// Disposal of `from_amount` units of `from_token` for `to_amount` proceeds. Realizes P&L.
pub const TRANSACTION_TYPE_SELL: &str = "sell";

/// Exchange of `from_token` for `to_token`. A sell leg composed with a buy leg.
pub const TRANSACTION_TYPE_SWAP: &str = "swap";

/// Lock units for staking. No cost-basis effect.
pub const TRANSACTION_TYPE_STAKE: &str = "stake";

/// Release staked units. No cost-basis effect.
pub const TRANSACTION_TYPE_UNSTAKE: &str = "unstake";

/// Units received as income (staking rewards, interest). Realized immediately.
pub const TRANSACTION_TYPE_YIELD: &str = "yield";

/// Units of `from_token` consumed as a fee. Realizes the consumed cost basis as a loss.
pub const TRANSACTION_TYPE_FEE: &str = "fee";

/// All supported transaction types
pub const TRANSACTION_TYPES: [&str; 7] = [
    TRANSACTION_TYPE_BUY,
    TRANSACTION_TYPE_SELL,
    TRANSACTION_TYPE_SWAP,
    TRANSACTION_TYPE_STAKE,
    TRANSACTION_TYPE_UNSTAKE,
    TRANSACTION_TYPE_YIELD,
    TRANSACTION_TYPE_FEE,
];

/// Transaction statuses

/// Submitted but not yet confirmed. Recorded, ignored by the ledger.
pub const TRANSACTION_STATUS_PENDING: &str = "pending";

/// Confirmed. The only status that participates in accounting.
pub const TRANSACTION_STATUS_CONFIRMED: &str = "confirmed";

/// Failed. Recorded for audit, ignored by the ledger.
pub const TRANSACTION_STATUS_FAILED: &str = "failed";
