//! Holdings projection: position state plus an optional spot price.
//!
//! Valuation fields are `Option` because a current price may simply not be
//! known; projection without a price still reports balance, basis, and
//! realized P&L.

use crate::domain::{Address, Decimal, Mint};
use crate::engine::ledger::TokenPosition;
use serde::{Deserialize, Serialize};

/// Snapshot view of one position, optionally valued at a current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPnL {
    pub wallet: Address,
    pub mint: Mint,
    pub current_balance: Decimal,
    pub average_cost_native: Decimal,
    /// Remaining cost basis across held lots.
    pub cost_basis_native: Decimal,
    pub realized_pnl_native: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price_native: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_value_native: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl_native: Option<Decimal>,
    /// Unrealized P&L relative to cost basis; absent when the basis is zero
    /// (airdrops, transfers in) even when a price is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unrealized_pnl_percent: Option<Decimal>,
    pub basis_incomplete: bool,
}

impl TokenPnL {
    /// Total P&L including unrealized when a valuation exists.
    pub fn total_pnl_native(&self) -> Decimal {
        self.realized_pnl_native + self.unrealized_pnl_native.unwrap_or_else(Decimal::zero)
    }
}

/// Wallet-level rollup of projected positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub wallet: Address,
    /// Positions sorted by current value, then realized P&L, descending.
    pub tokens: Vec<TokenPnL>,
    /// Sum over positions with a known value.
    pub total_value_native: Decimal,
    pub total_realized_pnl_native: Decimal,
    /// Sum over positions with a known valuation.
    pub total_unrealized_pnl_native: Decimal,
    /// Positions still held or with realized history.
    pub token_count: usize,
}

/// Project one position at an optional current price.
pub fn project(position: &TokenPosition, current_price_native: Option<Decimal>) -> TokenPnL {
    let cost_basis = position.cost_basis_native();
    let valuation = current_price_native.map(|price| {
        let value = position.current_balance * price;
        (price, value, value - cost_basis)
    });

    let (current_price_native, current_value_native, unrealized_pnl_native) = match valuation {
        Some((price, value, unrealized)) => (Some(price), Some(value), Some(unrealized)),
        None => (None, None, None),
    };

    let unrealized_pnl_percent = unrealized_pnl_native.and_then(|unrealized| {
        if cost_basis.is_zero() {
            None
        } else {
            Some(unrealized.div_or_zero(cost_basis) * Decimal::hundred())
        }
    });

    TokenPnL {
        wallet: position.wallet.clone(),
        mint: position.mint.clone(),
        current_balance: position.current_balance,
        average_cost_native: position.average_cost_native,
        cost_basis_native: cost_basis,
        realized_pnl_native: position.realized_pnl_native,
        current_price_native,
        current_value_native,
        unrealized_pnl_native,
        unrealized_pnl_percent,
        basis_incomplete: position.basis_incomplete,
    }
}

/// Roll up a wallet's positions into a portfolio view.
///
/// `prices` supplies the optional spot price per position, matched by index.
/// Positions that are flat with no realized history are projected but not
/// counted in `token_count`.
pub fn project_portfolio(
    wallet: Address,
    positions: &[TokenPosition],
    prices: &[Option<Decimal>],
) -> PortfolioSummary {
    let mut tokens: Vec<TokenPnL> = positions
        .iter()
        .enumerate()
        .map(|(i, position)| project(position, prices.get(i).copied().flatten()))
        .collect();

    tokens.sort_by(|a, b| {
        let value_a = a.current_value_native.unwrap_or_else(Decimal::zero);
        let value_b = b.current_value_native.unwrap_or_else(Decimal::zero);
        value_b
            .cmp(&value_a)
            .then(b.realized_pnl_native.cmp(&a.realized_pnl_native))
    });

    let mut total_value = Decimal::zero();
    let mut total_realized = Decimal::zero();
    let mut total_unrealized = Decimal::zero();
    let mut token_count = 0usize;

    for token in &tokens {
        if let Some(value) = token.current_value_native {
            total_value += value;
        }
        if let Some(unrealized) = token.unrealized_pnl_native {
            total_unrealized += unrealized;
        }
        total_realized += token.realized_pnl_native;
        if token.current_balance.is_positive() || !token.realized_pnl_native.is_zero() {
            token_count += 1;
        }
    }

    PortfolioSummary {
        wallet,
        tokens,
        total_value_native: total_value,
        total_realized_pnl_native: total_realized,
        total_unrealized_pnl_native: total_unrealized,
        token_count,
    }
}
