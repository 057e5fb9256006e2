//! Raw transaction event as received from an enhanced-transaction feed.
//!
//! This is the external input contract of the classifier. The wire shape is
//! camelCase; amounts are already scaled to display units by the caller.
//! Everything here is advisory and adversarial: missing fields, dust moves,
//! and bogus hints are expected, never fatal.

use crate::domain::{Address, Decimal, Mint, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// A single token movement inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub mint: Mint,
    #[serde(default)]
    pub from_user_account: Option<Address>,
    #[serde(default)]
    pub to_user_account: Option<Address>,
    #[serde(default)]
    pub token_amount: Decimal,
}

/// A single native-asset movement inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default)]
    pub from_user_account: Option<Address>,
    #[serde(default)]
    pub to_user_account: Option<Address>,
    #[serde(default)]
    pub amount: Decimal,
}

/// A raw multi-transfer transaction event for one on-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransactionEvent {
    pub signature: Signature,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,
    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,
    /// Advisory transaction type from the feed (e.g. "SWAP", "TRANSFER").
    #[serde(default, rename = "type")]
    pub type_hint: Option<String>,
    /// Advisory source/venue from the feed (e.g. "JUPITER").
    #[serde(default, rename = "source")]
    pub source_hint: Option<String>,
}

impl TokenTransfer {
    pub fn is_from(&self, owner: &Address) -> bool {
        self.from_user_account.as_ref() == Some(owner)
    }

    pub fn is_to(&self, owner: &Address) -> bool {
        self.to_user_account.as_ref() == Some(owner)
    }

    pub fn involves(&self, owner: &Address) -> bool {
        self.is_from(owner) || self.is_to(owner)
    }
}

impl NativeTransfer {
    pub fn is_from(&self, owner: &Address) -> bool {
        self.from_user_account.as_ref() == Some(owner)
    }

    pub fn is_to(&self, owner: &Address) -> bool {
        self.to_user_account.as_ref() == Some(owner)
    }

    pub fn involves(&self, owner: &Address) -> bool {
        self.is_from(owner) || self.is_to(owner)
    }
}
