//! Domain types and determinism layer for the wallet activity ledger.
//!
//! This module provides:
//! - Lossless numeric handling via a Decimal wrapper
//! - Domain primitives: Timestamp, Address, Mint, Signature
//! - The raw transaction input contract and the canonical activity schema
//! - A stable activity ordering key for deterministic replay

pub mod activity;
pub mod decimal;
pub mod ordering;
pub mod primitives;
pub mod raw;

pub use activity::{ActivityCategory, ActivityKey, ActivitySubtype, CanonicalActivity};
pub use decimal::Decimal;
pub use ordering::{sort_activities_deterministic, ActivityOrderingKey};
pub use primitives::{Address, Mint, Signature, Timestamp};
pub use raw::{NativeTransfer, RawTransactionEvent, TokenTransfer};
