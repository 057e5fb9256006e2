//! Wallet activity classification and FIFO cost-basis accounting.
//!
//! The crate turns enriched on-chain transaction events into canonical
//! activity records, folds them into per-(wallet, mint) positions with FIFO
//! lot accounting, and projects positions into P&L views:
//!
//! ```text
//! RawTransactionEvent --classify--> CanonicalActivity
//!                     --replay---> TokenPosition
//!                     --project--> TokenPnL / PortfolioSummary
//! ```
//!
//! All stages are pure and deterministic; persistence, RPC, and price feeds
//! live with the caller.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;

pub use config::ClassifierConfig;
pub use domain::{
    ActivityCategory, ActivityKey, ActivitySubtype, Address, CanonicalActivity, Decimal, Mint,
    NativeTransfer, RawTransactionEvent, Signature, Timestamp, TokenTransfer,
};
pub use engine::{
    classify, classify_batch, partition_by_key, project, project_portfolio, replay, replay_all,
    ApplyEffect, CostBasisLot, EffectKind, PortfolioSummary, TokenPnL, TokenPosition,
};
pub use error::LedgerError;
