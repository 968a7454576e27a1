//! Change making over a limited coin supply.
//!
//! Greedy largest-first is optimal for the canonical US set {1, 5, 10, 25}.
//! It is not for arbitrary sets (e.g. {1, 10, 20, 25}), where it can report
//! `InsufficientChange` although a combination exists. Changing the coin
//! catalog means proving it canonical or replacing this with a bounded search.

use thiserror::Error;

use crate::model::Coin;
use crate::{Amount, Inventory};

/// The coin supply cannot form the requested amount.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("insufficient change in inventory for {amount}")]
pub struct ChangeError {
    pub amount: Amount,
}

/// Pick coins from `coins` summing to exactly `amount`.
///
/// Coins already picked in this call are no longer available to later picks.
/// The caller's inventory is never modified; deducting the returned coins is
/// the caller's job.
pub fn make_change(amount: Amount, coins: &Inventory<Coin>) -> Result<Vec<Coin>, ChangeError> {
    let denominations = Coin::descending();
    let mut available = coins.clone();
    let mut remaining = amount;
    let mut change = Vec::new();

    while !remaining.is_zero() {
        let coin = denominations
            .iter()
            .copied()
            .find(|coin| coin.denomination() <= remaining && available.has(*coin))
            .ok_or(ChangeError { amount })?;

        available.deduct(coin);
        remaining -= coin.denomination();
        change.push(coin);
    }

    Ok(change)
}
