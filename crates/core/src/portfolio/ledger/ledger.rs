use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{is_quantity_significant, AssetPosition};
use crate::errors::{Error, LedgerError, Result, ValidationError};
use crate::transactions::{Transaction, TransactionType};

/// What to do when a sell or fee disposes of more units than are held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OversellPolicy {
    /// Fail with `InsufficientQuantity`; nothing is mutated.
    #[default]
    Reject,
    /// Dispose of the held quantity only; proceeds are scaled by held / requested.
    Clamp,
    /// Let the quantity go negative. The weighted-average price is unchanged
    /// while short; a buy that crosses back to long resets it to the buy price.
    AllowShort,
}

impl OversellPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OversellPolicy::Reject => "reject",
            OversellPolicy::Clamp => "clamp",
            OversellPolicy::AllowShort => "allow_short",
        }
    }
}

impl fmt::Display for OversellPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OversellPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reject" => Ok(OversellPolicy::Reject),
            "clamp" => Ok(OversellPolicy::Clamp),
            "allow_short" | "short" => Ok(OversellPolicy::AllowShort),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown oversell policy: {}",
                other
            ))),
        }
    }
}

/// Fully computed position changes for one transaction, not yet applied.
///
/// Produced by [`Ledger::stage`] and applied by [`Ledger::commit`], so callers
/// can persist the transaction between the two steps.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerUpdate {
    pub transaction_id: String,
    pub positions: Vec<AssetPosition>,
}

impl LedgerUpdate {
    fn empty(transaction_id: &str) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            positions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.positions.iter().map(|p| p.symbol.clone()).collect()
    }
}

/// Units actually disposed of and the proceeds attributed to them.
struct Disposal {
    quantity: Decimal,
    proceeds: Decimal,
}

/// Weighted-average cost ledger for a single user.
///
/// Only confirmed transactions change state. Every transaction is computed
/// against copies of the touched positions and swapped in whole, so a
/// rejected transaction never leaves a position half updated.
#[derive(Debug, Clone)]
pub struct Ledger {
    user_id: String,
    policy: OversellPolicy,
    positions: HashMap<String, AssetPosition>,
}

impl Ledger {
    pub fn new(user_id: &str, policy: OversellPolicy) -> Self {
        Self {
            user_id: user_id.to_string(),
            policy,
            positions: HashMap::new(),
        }
    }

    /// Rebuilds a ledger from a transaction log in recording order.
    ///
    /// Transactions that fail to apply are logged and skipped.
    pub fn replay(user_id: &str, policy: OversellPolicy, transactions: &[Transaction]) -> Self {
        let mut ledger = Self::new(user_id, policy);
        let mut skipped = 0usize;
        for transaction in transactions {
            if let Err(e) = ledger.apply(transaction) {
                skipped += 1;
                warn!(
                    "Skipping transaction {} while replaying ledger for user {}: {}",
                    transaction.id, user_id, e
                );
            }
        }
        debug!(
            "Replayed {} transactions for user {} ({} skipped, {} positions)",
            transactions.len(),
            user_id,
            skipped,
            ledger.positions.len()
        );
        ledger
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn policy(&self) -> OversellPolicy {
        self.policy
    }

    pub fn positions(&self) -> &HashMap<String, AssetPosition> {
        &self.positions
    }

    pub fn position(&self, symbol: &str) -> Option<&AssetPosition> {
        self.positions.get(symbol)
    }

    /// Applies a transaction and returns the positions it touched.
    pub fn apply(&mut self, transaction: &Transaction) -> Result<Vec<AssetPosition>> {
        let update = self.stage(transaction)?;
        let touched = update.positions.clone();
        self.commit(update);
        Ok(touched)
    }

    /// Computes the effect of a transaction without mutating the ledger.
    pub fn stage(&self, transaction: &Transaction) -> Result<LedgerUpdate> {
        if transaction.user_id != self.user_id {
            return Err(LedgerError::InvalidTransaction(format!(
                "transaction {} belongs to user {}, not {}",
                transaction.id, transaction.user_id, self.user_id
            ))
            .into());
        }

        if !transaction.is_confirmed() {
            debug!(
                "Skipping {} transaction {} ({})",
                transaction.status, transaction.id, transaction.transaction_type
            );
            return Ok(LedgerUpdate::empty(&transaction.id));
        }

        let mut working: HashMap<String, AssetPosition> = HashMap::new();

        match transaction.transaction_type {
            TransactionType::Buy => {
                let symbol = required_token(transaction.to_token.as_ref(), transaction)?;
                let position = self.working_position(&mut working, symbol, transaction);
                apply_buy(
                    position,
                    transaction.to_amount,
                    transaction.unit_price,
                    transaction.from_amount,
                )
                .ok_or_else(|| overflow(transaction))?;
            }
            TransactionType::Sell => {
                let symbol = required_token(transaction.from_token.as_ref(), transaction)?;
                self.ensure_disposable(symbol, transaction.from_amount)?;
                if self.nothing_to_clamp(symbol) {
                    return Ok(LedgerUpdate::empty(&transaction.id));
                }
                let position = self.working_position(&mut working, symbol, transaction);
                self.apply_sell(position, transaction.from_amount, transaction.to_amount)
                    .ok_or_else(|| overflow(transaction))?;
            }
            TransactionType::Swap => {
                let from = required_token(transaction.from_token.as_ref(), transaction)?;
                let to = required_token(transaction.to_token.as_ref(), transaction)?;
                if from == to {
                    return Err(LedgerError::InvalidTransaction(format!(
                        "swap {} uses {} on both legs",
                        transaction.id, from
                    ))
                    .into());
                }
                self.ensure_disposable(from, transaction.from_amount)?;

                let proceeds = transaction
                    .to_amount
                    .checked_mul(transaction.unit_price)
                    .ok_or_else(|| overflow(transaction))?;
                if !self.nothing_to_clamp(from) {
                    let sell_leg = self.working_position(&mut working, from, transaction);
                    self.apply_sell(sell_leg, transaction.from_amount, proceeds)
                        .ok_or_else(|| overflow(transaction))?;
                }

                let buy_leg = self.working_position(&mut working, to, transaction);
                apply_buy(buy_leg, transaction.to_amount, transaction.unit_price, proceeds)
                    .ok_or_else(|| overflow(transaction))?;
            }
            TransactionType::Yield => {
                let symbol = required_token(transaction.to_token.as_ref(), transaction)?;
                let position = self.working_position(&mut working, symbol, transaction);
                apply_yield(position, transaction.to_amount, transaction.unit_price)
                    .ok_or_else(|| overflow(transaction))?;
            }
            TransactionType::Fee => {
                let symbol = required_token(transaction.from_token.as_ref(), transaction)?;
                if !self.positions.contains_key(symbol) {
                    debug!(
                        "Fee {} paid in {} without a position; ledger unchanged",
                        transaction.id, symbol
                    );
                    return Ok(LedgerUpdate::empty(&transaction.id));
                }
                self.ensure_disposable(symbol, transaction.from_amount)?;
                let position = self.working_position(&mut working, symbol, transaction);
                self.apply_fee(position, transaction.from_amount)
                    .ok_or_else(|| overflow(transaction))?;
            }
            TransactionType::Stake | TransactionType::Unstake => {
                for symbol in transaction.symbols() {
                    if self.positions.contains_key(&symbol) {
                        self.working_position(&mut working, &symbol, transaction);
                    }
                }
            }
        }

        if working.values().any(|p| p.cost_basis().is_none()) {
            return Err(overflow(transaction));
        }

        let mut positions: Vec<AssetPosition> = working.into_values().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(LedgerUpdate {
            transaction_id: transaction.id.clone(),
            positions,
        })
    }

    /// Swaps staged positions into the ledger.
    pub fn commit(&mut self, update: LedgerUpdate) {
        for position in update.positions {
            self.positions.insert(position.symbol.clone(), position);
        }
    }

    /// Copy of the current position (or a fresh one) in the working set, touched.
    fn working_position<'a>(
        &self,
        working: &'a mut HashMap<String, AssetPosition>,
        symbol: &str,
        transaction: &Transaction,
    ) -> &'a mut AssetPosition {
        let position = working.entry(symbol.to_string()).or_insert_with(|| {
            self.positions
                .get(symbol)
                .cloned()
                .unwrap_or_else(|| AssetPosition::new(&self.user_id, symbol, transaction.timestamp))
        });
        position.touch(transaction.timestamp);
        position
    }

    /// Under `Clamp`, disposing of a token never held is a no-op.
    fn nothing_to_clamp(&self, symbol: &str) -> bool {
        if self.policy == OversellPolicy::Clamp && !self.positions.contains_key(symbol) {
            warn!(
                "Clamping disposal of {} for user {} to zero: no position",
                symbol, self.user_id
            );
            return true;
        }
        false
    }

    fn held(&self, symbol: &str) -> Decimal {
        self.positions
            .get(symbol)
            .map(|p| p.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    /// Fails under the `Reject` policy when `requested` exceeds the held quantity.
    fn ensure_disposable(&self, symbol: &str, requested: Decimal) -> Result<()> {
        let held = self.held(symbol);
        if self.policy == OversellPolicy::Reject && is_oversell(held, requested) {
            return Err(Error::Ledger(LedgerError::InsufficientQuantity {
                symbol: symbol.to_string(),
                held,
                requested,
            }));
        }
        Ok(())
    }

    /// Resolves how much of `requested` is disposed of under the current policy.
    /// `None` on arithmetic overflow.
    fn dispose(
        &self,
        position: &AssetPosition,
        requested: Decimal,
        proceeds: Decimal,
    ) -> Option<Disposal> {
        let held = position.quantity;
        if !is_oversell(held, requested) {
            return Some(Disposal {
                quantity: requested,
                proceeds,
            });
        }
        match self.policy {
            OversellPolicy::Clamp => {
                let quantity = held.max(Decimal::ZERO);
                let proceeds = if requested.is_zero() {
                    Decimal::ZERO
                } else {
                    proceeds.checked_mul(quantity)?.checked_div(requested)?
                };
                warn!(
                    "Clamping disposal of {} {} to held quantity {}",
                    requested, position.symbol, quantity
                );
                Some(Disposal { quantity, proceeds })
            }
            OversellPolicy::AllowShort | OversellPolicy::Reject => Some(Disposal {
                quantity: requested,
                proceeds,
            }),
        }
    }

    fn apply_sell(
        &self,
        position: &mut AssetPosition,
        requested: Decimal,
        proceeds: Decimal,
    ) -> Option<()> {
        let disposal = self.dispose(position, requested, proceeds)?;
        let consumed = position.weighted_average_price.checked_mul(disposal.quantity)?;
        let realized = disposal.proceeds.checked_sub(consumed)?;
        position.total_realized_pnl = position.total_realized_pnl.checked_add(realized)?;
        position.quantity = position.quantity.checked_sub(disposal.quantity)?;
        position.normalize_quantity();
        Some(())
    }

    /// Consumes units at cost: the consumed cost basis is a realized loss.
    fn apply_fee(&self, position: &mut AssetPosition, requested: Decimal) -> Option<()> {
        let disposal = self.dispose(position, requested, Decimal::ZERO)?;
        let consumed = position.weighted_average_price.checked_mul(disposal.quantity)?;
        position.quantity = position.quantity.checked_sub(disposal.quantity)?;
        position.total_realized_pnl = position.total_realized_pnl.checked_sub(consumed)?;
        position.normalize_quantity();
        Some(())
    }
}

fn overflow(transaction: &Transaction) -> Error {
    LedgerError::InvalidTransaction(format!(
        "amounts in {} transaction {} are out of range",
        transaction.transaction_type, transaction.id
    ))
    .into()
}

fn is_oversell(held: Decimal, requested: Decimal) -> bool {
    match requested.checked_sub(held) {
        Some(shortfall) => shortfall > Decimal::ZERO && is_quantity_significant(&shortfall),
        None => requested > held,
    }
}

fn required_token<'a>(token: Option<&'a String>, transaction: &Transaction) -> Result<&'a str> {
    token.map(String::as_str).ok_or_else(|| {
        LedgerError::InvalidTransaction(format!(
            "{} transaction {} is missing a token",
            transaction.transaction_type, transaction.id
        ))
        .into()
    })
}

/// Adds `quantity` units bought at `unit_price` for a total cost of `cost`.
/// `None` on arithmetic overflow, leaving the position untouched.
fn apply_buy(
    position: &mut AssetPosition,
    quantity: Decimal,
    unit_price: Decimal,
    cost: Decimal,
) -> Option<()> {
    let held = position.quantity;
    let new_quantity = held.checked_add(quantity)?;
    let total_invested = position.total_invested.checked_add(cost)?;
    let long_after = new_quantity > Decimal::ZERO && is_quantity_significant(&new_quantity);

    let weighted_average_price = if held > Decimal::ZERO && long_after {
        let held_cost = position.weighted_average_price.checked_mul(held)?;
        let bought_cost = unit_price.checked_mul(quantity)?;
        held_cost.checked_add(bought_cost)?.checked_div(new_quantity)?
    } else if held.is_zero() || (held < Decimal::ZERO && long_after) {
        // Opening, or covering a short past zero
        unit_price
    } else {
        position.weighted_average_price
    };

    position.weighted_average_price = weighted_average_price;
    position.quantity = new_quantity;
    position.total_invested = total_invested;
    position.normalize_quantity();
    Some(())
}

/// Yield is realized income at receipt; a position opened by yield carries
/// the receipt price so the units show no unrealized gain.
fn apply_yield(position: &mut AssetPosition, quantity: Decimal, unit_price: Decimal) -> Option<()> {
    if position.quantity.is_zero() {
        position.weighted_average_price = unit_price;
    }
    let income = quantity.checked_mul(unit_price)?;
    position.quantity = position.quantity.checked_add(quantity)?;
    position.total_realized_pnl = position.total_realized_pnl.checked_add(income)?;
    position.normalize_quantity();
    Some(())
}
