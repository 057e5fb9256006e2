//! Pure computation pipeline: raw events -> canonical activities -> FIFO
//! positions -> portfolio projection.
//!
//! Nothing in this module performs I/O. Every stage is a deterministic
//! function of its inputs so the whole pipeline can be replayed and tested
//! without fixtures beyond plain values.

pub mod classifier;
pub mod ledger;
pub mod projector;
pub mod rules;

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

pub use classifier::{classify, classify_batch};
pub use ledger::{partition_by_key, replay, replay_all, CostBasisLot, TokenPosition};
pub use projector::{project, project_portfolio, PortfolioSummary, TokenPnL};

/// Direction of a ledger application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Acquire,
    Dispose,
}

/// What a single activity did to a position.
///
/// Returned by [`TokenPosition::apply`](ledger::TokenPosition::apply) so
/// callers can journal per-activity outcomes without diffing position
/// snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyEffect {
    pub kind: EffectKind,
    /// Token amount moved. Zero for a no-op application.
    pub amount: Decimal,
    /// Cost added (acquire) or consumed from lots (dispose).
    pub cost_native: Decimal,
    /// Native proceeds realized; nonzero only for sells.
    pub proceeds_native: Decimal,
    /// Realized P&L contributed by this activity alone.
    pub realized_pnl_native: Decimal,
    /// True when a disposal exceeded the tracked lots.
    pub basis_incomplete: bool,
    /// Portion of a disposal not covered by lots; zero otherwise.
    pub uncovered_amount: Decimal,
}

impl ApplyEffect {
    /// Effect of an activity that moved nothing.
    pub fn noop(kind: EffectKind) -> Self {
        ApplyEffect {
            kind,
            amount: Decimal::zero(),
            cost_native: Decimal::zero(),
            proceeds_native: Decimal::zero(),
            realized_pnl_native: Decimal::zero(),
            basis_incomplete: false,
            uncovered_amount: Decimal::zero(),
        }
    }
}
