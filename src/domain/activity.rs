//! Canonical activity: the normalized, typed output of the classifier and
//! the only form the ledger ever consumes.
//!
//! The schema is stable and versionable; changes must be additive.

use crate::domain::{Address, Decimal, Mint, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// Broad transaction category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Swap,
    Transfer,
    Airdrop,
    Staking,
    Liquidity,
    Burn,
    Other,
}

/// Directional subtype within a category.
///
/// Downstream consumers match exhaustively on this; never a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySubtype {
    Buy,
    Sell,
    TransferIn,
    TransferOut,
    Airdrop,
    Stake,
    StakingReward,
    LiquidityAdd,
    LiquidityRemove,
    Burn,
    OtherIn,
    OtherOut,
}

impl ActivitySubtype {
    /// True for subtypes that increase a token position's balance.
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            ActivitySubtype::Buy
                | ActivitySubtype::TransferIn
                | ActivitySubtype::Airdrop
                | ActivitySubtype::StakingReward
                | ActivitySubtype::LiquidityRemove
                | ActivitySubtype::OtherIn
        )
    }

    /// True for subtypes that decrease a token position's balance.
    pub fn is_disposal(&self) -> bool {
        !self.is_acquisition()
    }

    /// Acquisitions whose tokens arrive with no knowable cost to the owner.
    ///
    /// An inbound transfer, airdrop, staking reward, or uncategorized receipt
    /// gives the ledger no native amount the owner actually paid, so the lot
    /// enters at zero cost and later disposals realize the entire proceeds.
    pub fn is_zero_cost_acquisition(&self) -> bool {
        matches!(
            self,
            ActivitySubtype::TransferIn
                | ActivitySubtype::Airdrop
                | ActivitySubtype::StakingReward
                | ActivitySubtype::OtherIn
        )
    }

    /// Disposals that realize proceeds. Only a sell is priced; giving tokens
    /// away, staking, or burning writes off basis without proceeds.
    pub fn realizes_proceeds(&self) -> bool {
        matches!(self, ActivitySubtype::Sell)
    }
}

/// Identity key for deduplicating activities in an external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityKey {
    pub signature: Signature,
    pub wallet: Address,
    pub mint: Mint,
}

/// One wallet's normalized token movement extracted from a raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalActivity {
    pub wallet: Address,
    pub mint: Mint,
    pub category: ActivityCategory,
    pub subtype: ActivitySubtype,
    /// Absolute token amount moved; always > 0.
    pub amount_token: Decimal,
    /// Native asset exchanged by the owner in the same transaction; >= 0.
    pub amount_native: Decimal,
    /// amount_native / amount_token, zero when undefined.
    pub unit_price_native: Decimal,
    /// The far side of a token-for-token swap, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_token_mint: Option<Mint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_token_amount: Option<Decimal>,
    /// Receiving address for outbound transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Address>,
    pub timestamp: Timestamp,
    pub signature: Signature,
}

impl CanonicalActivity {
    /// Identity key: unique per (signature, wallet, mint).
    pub fn key(&self) -> ActivityKey {
        ActivityKey {
            signature: self.signature.clone(),
            wallet: self.wallet.clone(),
            mint: self.mint.clone(),
        }
    }
}
