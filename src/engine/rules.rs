//! Ordered category-detection rules.
//!
//! Each rule is a pure function from a raw transaction to an optional
//! category; the first match wins. Explicit hints from the feed are checked
//! before structural fallbacks, so an advisory "SWAP" always beats shape
//! guessing, and shape guessing still catches transactions the feed left
//! untyped.

use crate::config::ClassifierConfig;
use crate::domain::{ActivityCategory, Address, Decimal, RawTransactionEvent};
use std::collections::HashSet;
use tracing::debug;

/// Inputs shared by every rule.
pub struct RuleContext<'a> {
    pub tx: &'a RawTransactionEvent,
    pub owner: &'a Address,
    pub config: &'a ClassifierConfig,
}

type Rule = fn(&RuleContext<'_>) -> Option<ActivityCategory>;

/// The rule table, evaluated top to bottom.
const RULES: &[(&str, Rule)] = &[
    ("swap_hint", swap_hint),
    ("transfer_hint", transfer_hint),
    ("airdrop_hint", airdrop_hint),
    ("staking_hint", staking_hint),
    ("liquidity_hint", liquidity_hint),
    ("burn_hint", burn_hint),
    ("structural_token_native_swap", structural_token_native_swap),
    ("structural_token_for_token_swap", structural_token_for_token_swap),
    ("structural_bare_transfer", structural_bare_transfer),
];

/// Run the rule table. Returns `None` when no rule matches, which means the
/// transaction is irrelevant to the owner's ledger.
pub fn detect_category(
    tx: &RawTransactionEvent,
    owner: &Address,
    config: &ClassifierConfig,
) -> Option<ActivityCategory> {
    let ctx = RuleContext { tx, owner, config };
    for (name, rule) in RULES {
        if let Some(category) = rule(&ctx) {
            if name.starts_with("structural") {
                debug!(
                    rule = name,
                    signature = tx.signature.as_str(),
                    "category detected by transfer shape"
                );
            }
            return Some(category);
        }
    }
    None
}

fn type_hint_upper(ctx: &RuleContext<'_>) -> Option<String> {
    ctx.tx.type_hint.as_deref().map(str::to_uppercase)
}

pub fn swap_hint(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    if let Some(type_hint) = type_hint_upper(ctx) {
        if ctx.config.swap_type_hints.contains(&type_hint.as_str())
            || type_hint.contains("SWAP")
        {
            return Some(ActivityCategory::Swap);
        }
    }
    if let Some(source) = ctx.tx.source_hint.as_deref() {
        if ctx
            .config
            .swap_source_hints
            .contains(&source.to_uppercase().as_str())
        {
            return Some(ActivityCategory::Swap);
        }
    }
    None
}

pub fn transfer_hint(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    hint_rule(ctx, &ctx.config.transfer_type_hints, ActivityCategory::Transfer)
}

pub fn airdrop_hint(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    hint_rule(ctx, &ctx.config.airdrop_type_hints, ActivityCategory::Airdrop)
}

pub fn staking_hint(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    hint_rule(ctx, &ctx.config.staking_type_hints, ActivityCategory::Staking)
}

pub fn liquidity_hint(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    hint_rule(ctx, &ctx.config.liquidity_type_hints, ActivityCategory::Liquidity)
}

pub fn burn_hint(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    hint_rule(ctx, &ctx.config.burn_type_hints, ActivityCategory::Burn)
}

fn hint_rule(
    ctx: &RuleContext<'_>,
    hints: &[&str],
    category: ActivityCategory,
) -> Option<ActivityCategory> {
    let type_hint = type_hint_upper(ctx)?;
    if hints.contains(&type_hint.as_str()) {
        Some(category)
    } else {
        None
    }
}

/// Classic swap shape: the owner moves a token and the native asset in the
/// same transaction. Wrapped-native transfers count as native movement here,
/// so WSOL-quoted swaps match even when the feed reports no plain native
/// transfer.
pub fn structural_token_native_swap(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    let owner_in_tokens = ctx
        .tx
        .token_transfers
        .iter()
        .any(|t| {
            t.token_amount.is_positive()
                && t.involves(ctx.owner)
                && t.mint != ctx.config.wrapped_native_mint
        });

    if owner_in_tokens && owner_native_magnitude(ctx).is_positive() {
        Some(ActivityCategory::Swap)
    } else {
        None
    }
}

/// Token-for-token swap shape: the owner is party to two or more distinct
/// non-native mints while native movement stays at fee level.
pub fn structural_token_for_token_swap(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    let mints: HashSet<&str> = ctx
        .tx
        .token_transfers
        .iter()
        .filter(|t| {
            t.token_amount.is_positive()
                && t.involves(ctx.owner)
                && t.mint != ctx.config.wrapped_native_mint
        })
        .map(|t| t.mint.as_str())
        .collect();
    if mints.len() < 2 {
        return None;
    }

    if owner_native_magnitude(ctx) < ctx.config.token_swap_native_ceiling {
        Some(ActivityCategory::Swap)
    } else {
        None
    }
}

/// Bare transfer shape: a single mint moving in a single direction with no
/// native counterpart for the owner.
pub fn structural_bare_transfer(ctx: &RuleContext<'_>) -> Option<ActivityCategory> {
    let owned: Vec<_> = ctx
        .tx
        .token_transfers
        .iter()
        .filter(|t| {
            t.token_amount.is_positive()
                && t.involves(ctx.owner)
                && t.mint != ctx.config.wrapped_native_mint
        })
        .collect();
    if owned.is_empty() {
        return None;
    }

    let mints: HashSet<&str> = owned.iter().map(|t| t.mint.as_str()).collect();
    if mints.len() != 1 {
        return None;
    }

    let all_inbound = owned.iter().all(|t| t.is_to(ctx.owner));
    let all_outbound = owned.iter().all(|t| t.is_from(ctx.owner));
    if !all_inbound && !all_outbound {
        return None;
    }

    if owner_native_magnitude(ctx).is_zero() {
        Some(ActivityCategory::Transfer)
    } else {
        None
    }
}

/// Total unsigned native movement attributable to the owner, wrapped-native
/// transfers included.
fn owner_native_magnitude(ctx: &RuleContext<'_>) -> Decimal {
    let mut total = Decimal::zero();
    for t in &ctx.tx.native_transfers {
        if t.amount >= ctx.config.native_dust && t.involves(ctx.owner) {
            total += t.amount;
        }
    }
    for t in &ctx.tx.token_transfers {
        if t.mint == ctx.config.wrapped_native_mint
            && t.token_amount >= ctx.config.native_dust
            && t.involves(ctx.owner)
        {
            total += t.token_amount;
        }
    }
    total
}
