//! Classifier configuration.
//!
//! An explicit dependency object passed into classification, replacing the
//! module-level constants and singletons this logic tends to accumulate.

use crate::domain::{Decimal, Mint};

/// Thresholds and chain constants used by the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// The wrapped-native mint. Its transfers count as native movement,
    /// never as a token position.
    pub wrapped_native_mint: Mint,
    /// Native transfers below this are discarded before aggregation.
    pub native_dust: Decimal,
    /// Token net changes below this are treated as no movement.
    pub token_dust: Decimal,
    /// A multi-mint transaction only counts as a token-for-token swap when
    /// the owner's total native movement stays under this (fees only).
    pub token_swap_native_ceiling: Decimal,
    /// Advisory type hints that mark a swap.
    pub swap_type_hints: Vec<&'static str>,
    /// Advisory source hints (venues) that mark a swap.
    pub swap_source_hints: Vec<&'static str>,
    pub transfer_type_hints: Vec<&'static str>,
    pub airdrop_type_hints: Vec<&'static str>,
    pub staking_type_hints: Vec<&'static str>,
    pub liquidity_type_hints: Vec<&'static str>,
    pub burn_type_hints: Vec<&'static str>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            wrapped_native_mint: Mint::new("So11111111111111111111111111111111111111112"),
            native_dust: Decimal::from_scaled(1, 4),          // 0.0001
            token_dust: Decimal::from_scaled(1, 4),           // 0.0001
            token_swap_native_ceiling: Decimal::from_scaled(1, 2), // 0.01
            swap_type_hints: vec!["SWAP", "INIT_SWAP", "BUY", "SELL"],
            swap_source_hints: vec![
                "JUPITER", "RAYDIUM", "ORCA", "METEORA", "PUMP_FUN", "PUMPFUN", "MOONSHOT",
            ],
            transfer_type_hints: vec!["TRANSFER"],
            airdrop_type_hints: vec!["TOKEN_MINT", "COMPRESSED_NFT_MINT", "NFT_MINT"],
            staking_type_hints: vec![
                "STAKE_TOKEN",
                "UNSTAKE_TOKEN",
                "STAKE_SOL",
                "UNSTAKE_SOL",
                "CLAIM_REWARDS",
            ],
            liquidity_type_hints: vec!["ADD_LIQUIDITY", "REMOVE_FROM_POOL", "CREATE_POOL"],
            burn_type_hints: vec!["BURN", "BURN_NFT"],
        }
    }
}
