//! Transaction classifier: raw multi-transfer event → canonical activity.
//!
//! Pure and panic-free. Raw chain data is adversarial and noisy, so
//! unparseable or irrelevant transactions come back as `None`; callers may
//! count rejects but must never treat one as fatal.

use crate::config::ClassifierConfig;
use crate::domain::{
    ActivityCategory, ActivitySubtype, Address, CanonicalActivity, Decimal, Mint,
    RawTransactionEvent,
};
use crate::engine::rules::detect_category;
use std::collections::HashMap;
use tracing::debug;

/// Classify one raw transaction from the owner's perspective.
///
/// Each call is independent of every other; batches may be classified
/// concurrently with no synchronization.
pub fn classify(
    tx: &RawTransactionEvent,
    owner: &Address,
    config: &ClassifierConfig,
) -> Option<CanonicalActivity> {
    if tx.signature.is_empty() || tx.timestamp.as_i64() <= 0 {
        debug!(signature = tx.signature.as_str(), "rejecting malformed event");
        return None;
    }

    let category = detect_category(tx, owner, config)?;
    let flows = aggregate_net_changes(tx, owner, config);
    let (primary_mint, primary_change) = select_primary_token(&flows, config)?;

    let subtype = assign_subtype(category, primary_change.is_positive());
    let amount_token = primary_change.abs();
    let amount_native = attributed_native(subtype, flows.native_change);
    let unit_price_native = amount_native.div_or_zero(amount_token);

    let (counter_token_mint, counter_token_amount) =
        match select_counter_token(&flows, &primary_mint, primary_change, config) {
            Some((mint, amount)) => (Some(mint), Some(amount)),
            None => (None, None),
        };

    let destination = if subtype == ActivitySubtype::TransferOut {
        transfer_destination(tx, owner, &primary_mint)
    } else {
        None
    };

    Some(CanonicalActivity {
        wallet: owner.clone(),
        mint: primary_mint,
        category,
        subtype,
        amount_token,
        amount_native,
        unit_price_native,
        counter_token_mint,
        counter_token_amount,
        destination,
        timestamp: tx.timestamp,
        signature: tx.signature.clone(),
    })
}

/// Classify a batch of raw transactions, dropping irrelevant ones.
pub fn classify_batch(
    txs: &[RawTransactionEvent],
    owner: &Address,
    config: &ClassifierConfig,
) -> Vec<CanonicalActivity> {
    let mut activities = Vec::with_capacity(txs.len());
    let mut rejected = 0usize;
    for tx in txs {
        match classify(tx, owner, config) {
            Some(activity) => activities.push(activity),
            None => rejected += 1,
        }
    }
    debug!(
        owner = owner.as_str(),
        classified = activities.len(),
        rejected,
        "classified batch"
    );
    activities
}

/// Signed per-mint and native flows from the owner's perspective.
struct NetFlows {
    /// mint -> signed token change (positive = received).
    token_changes: HashMap<Mint, Decimal>,
    /// Signed native change, wrapped-native included.
    native_change: Decimal,
}

fn aggregate_net_changes(
    tx: &RawTransactionEvent,
    owner: &Address,
    config: &ClassifierConfig,
) -> NetFlows {
    let mut token_changes: HashMap<Mint, Decimal> = HashMap::new();
    let mut native_change = Decimal::zero();

    for transfer in &tx.token_transfers {
        let amount = transfer.token_amount;
        if !amount.is_positive() || amount < config.token_dust {
            continue;
        }
        // Wrapped native is the native asset for pricing purposes.
        if transfer.mint == config.wrapped_native_mint {
            if transfer.is_to(owner) {
                native_change += amount;
            } else if transfer.is_from(owner) {
                native_change -= amount;
            }
            continue;
        }
        if transfer.is_to(owner) {
            *token_changes.entry(transfer.mint.clone()).or_default() += amount;
        } else if transfer.is_from(owner) {
            *token_changes.entry(transfer.mint.clone()).or_default() -= amount;
        }
    }

    for transfer in &tx.native_transfers {
        let amount = transfer.amount;
        if amount < config.native_dust {
            continue;
        }
        if transfer.is_to(owner) {
            native_change += amount;
        } else if transfer.is_from(owner) {
            native_change -= amount;
        }
    }

    NetFlows {
        token_changes,
        native_change,
    }
}

/// The primary token is the mint with the largest absolute net change.
/// Ties break on the mint address for determinism.
fn select_primary_token(
    flows: &NetFlows,
    config: &ClassifierConfig,
) -> Option<(Mint, Decimal)> {
    let (mint, change) = flows
        .token_changes
        .iter()
        .max_by(|(mint_a, a), (mint_b, b)| {
            a.abs().cmp(&b.abs()).then_with(|| mint_a.cmp(mint_b))
        })?;
    if change.abs() < config.token_dust {
        return None;
    }
    Some((mint.clone(), *change))
}

/// The far side of a token-for-token swap: the largest opposite-signed
/// net change among the remaining mints, if it clears dust.
fn select_counter_token(
    flows: &NetFlows,
    primary_mint: &Mint,
    primary_change: Decimal,
    config: &ClassifierConfig,
) -> Option<(Mint, Decimal)> {
    flows
        .token_changes
        .iter()
        .filter(|(mint, change)| {
            *mint != primary_mint
                && change.abs() >= config.token_dust
                && change.is_positive() != primary_change.is_positive()
        })
        .max_by(|(mint_a, a), (mint_b, b)| {
            a.abs().cmp(&b.abs()).then_with(|| mint_a.cmp(mint_b))
        })
        .map(|(mint, change)| (mint.clone(), change.abs()))
}

/// Category × direction → subtype.
///
/// The two cells the category table leaves undefined (an outbound "airdrop",
/// an inbound "burn") degrade to the other_* subtypes so the movement still
/// reaches the ledger instead of vanishing.
fn assign_subtype(category: ActivityCategory, received: bool) -> ActivitySubtype {
    match (category, received) {
        (ActivityCategory::Swap, true) => ActivitySubtype::Buy,
        (ActivityCategory::Swap, false) => ActivitySubtype::Sell,
        (ActivityCategory::Transfer, true) => ActivitySubtype::TransferIn,
        (ActivityCategory::Transfer, false) => ActivitySubtype::TransferOut,
        (ActivityCategory::Airdrop, true) => ActivitySubtype::Airdrop,
        (ActivityCategory::Airdrop, false) => ActivitySubtype::OtherOut,
        (ActivityCategory::Staking, true) => ActivitySubtype::StakingReward,
        (ActivityCategory::Staking, false) => ActivitySubtype::Stake,
        (ActivityCategory::Liquidity, true) => ActivitySubtype::LiquidityRemove,
        (ActivityCategory::Liquidity, false) => ActivitySubtype::LiquidityAdd,
        (ActivityCategory::Burn, false) => ActivitySubtype::Burn,
        (ActivityCategory::Burn, true) => ActivitySubtype::OtherIn,
        (ActivityCategory::Other, true) => ActivitySubtype::OtherIn,
        (ActivityCategory::Other, false) => ActivitySubtype::OtherOut,
    }
}

/// Native amount attributed to the activity. Acquiring sides pull from the
/// owner's outgoing native, disposing sides from incoming native; with no
/// direct native counterpart the amount is zero.
fn attributed_native(subtype: ActivitySubtype, native_change: Decimal) -> Decimal {
    match subtype {
        ActivitySubtype::Buy | ActivitySubtype::LiquidityRemove => {
            if native_change.is_negative() {
                native_change.abs()
            } else {
                Decimal::zero()
            }
        }
        ActivitySubtype::Sell | ActivitySubtype::LiquidityAdd => {
            if native_change.is_positive() {
                native_change
            } else {
                Decimal::zero()
            }
        }
        _ => Decimal::zero(),
    }
}

/// Where an outbound transfer of the primary mint went.
fn transfer_destination(
    tx: &RawTransactionEvent,
    owner: &Address,
    primary_mint: &Mint,
) -> Option<Address> {
    tx.token_transfers
        .iter()
        .find(|t| t.mint == *primary_mint && t.is_from(owner))
        .and_then(|t| t.to_user_account.clone())
}
