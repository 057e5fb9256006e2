use crate::domain::{Address, Mint, Timestamp};
use thiserror::Error;

/// Errors surfaced by the cost-basis ledger.
///
/// The ledger never errors for expected "no activity" or "insufficient data"
/// situations; those are expressed through effects and flags. These variants
/// cover caller contract violations that would otherwise corrupt the fold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(
        "activity at {got:?} arrived after position watermark {last_seen:?}; \
         streams must be replayed in non-decreasing timestamp order"
    )]
    OrderingViolation { last_seen: Timestamp, got: Timestamp },

    #[error("activity for ({wallet}, {mint}) applied to position ({position_wallet}, {position_mint})")]
    KeyMismatch {
        position_wallet: Address,
        position_mint: Mint,
        wallet: Address,
        mint: Mint,
    },
}
