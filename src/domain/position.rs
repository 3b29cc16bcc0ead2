//! Single-position simulation state.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::domain::error::MacrossError;

/// Which transition the engine is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SeekingEntry,
    Holding,
}

/// Cash and share holdings for one backtest run. Whole shares only, so
/// `cash` never goes negative and `shares_held` is a plain count.
///
/// A `u128` count holds any quotient a `Decimal` can produce, which matters
/// for large amounts against sub-cent prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    pub cash: Decimal,
    pub shares_held: u128,
    pub mode: Mode,
}

impl PositionState {
    pub fn new(starting_cash: u64) -> Self {
        PositionState {
            cash: Decimal::from(starting_cash),
            shares_held: 0,
            mode: Mode::SeekingEntry,
        }
    }

    /// Spend as much cash as possible on whole shares at `price` and switch to
    /// `Holding`. The fractional remainder stays as cash. Returns the count bought,
    /// which is zero when cash does not cover a single share.
    ///
    /// The state is untouched when the purchase cannot be computed exactly.
    pub fn buy_max(&mut self, price: Decimal) -> Result<u128, MacrossError> {
        let shares = affordable_shares(self.cash, price)?;
        let cost = trade_value(shares, price)?;
        self.cash -= cost;
        self.shares_held = shares;
        self.mode = Mode::Holding;
        Ok(shares)
    }

    /// Sell every held share at `price` and switch to `SeekingEntry`.
    /// Returns the count sold.
    pub fn liquidate(&mut self, price: Decimal) -> Result<u128, MacrossError> {
        let shares = self.shares_held;
        let proceeds = trade_value(shares, price)?;
        self.cash = self
            .cash
            .checked_add(proceeds)
            .ok_or_else(|| arithmetic(format!("{} + {proceeds}", self.cash)))?;
        self.shares_held = 0;
        self.mode = Mode::SeekingEntry;
        Ok(shares)
    }
}

/// floor(cash / price), never more than the cash covers.
pub fn affordable_shares(cash: Decimal, price: Decimal) -> Result<u128, MacrossError> {
    if price <= Decimal::ZERO || cash <= Decimal::ZERO {
        return Ok(0);
    }

    let mut shares = cash
        .checked_div(price)
        .ok_or_else(|| arithmetic(format!("{cash} / {price}")))?
        .floor();
    // the quotient is rounded at 28 significant digits and may land one share high
    while shares > Decimal::ZERO {
        match shares.checked_mul(price) {
            Some(cost) if cost <= cash => break,
            _ => shares -= Decimal::ONE,
        }
    }
    shares
        .to_u128()
        .ok_or_else(|| arithmetic(format!("share count {shares}")))
}

fn trade_value(shares: u128, price: Decimal) -> Result<Decimal, MacrossError> {
    Decimal::from_u128(shares)
        .and_then(|count| count.checked_mul(price))
        .ok_or_else(|| arithmetic(format!("{shares} * {price}")))
}

fn arithmetic(reason: String) -> MacrossError {
    MacrossError::Arithmetic { reason }
}
