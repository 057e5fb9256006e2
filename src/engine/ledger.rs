//! FIFO cost-basis ledger.
//!
//! A `TokenPosition` is a pure fold over the ordered activity stream for one
//! (wallet, mint) key. Replaying the same ordered list from a fresh position
//! always reproduces identical output; idempotent ingestion is achieved by
//! deduplicating activities on (signature, wallet, mint) upstream, not here.

use crate::domain::{
    Address, CanonicalActivity, Decimal, Mint, Timestamp,
};
use crate::engine::{ApplyEffect, EffectKind};
use crate::error::LedgerError;
use std::collections::{HashMap, VecDeque};
use tracing::warn;

/// A parcel of tokens acquired at one price and time, consumed oldest-first.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CostBasisLot {
    /// Remaining amount in this lot; always > 0 while the lot exists.
    pub amount: Decimal,
    /// Native unit price fixed at acquisition.
    pub unit_price_native: Decimal,
    pub acquired_at: Timestamp,
}

impl CostBasisLot {
    pub fn cost_native(&self) -> Decimal {
        self.amount * self.unit_price_native
    }
}

/// Per-(wallet, mint) position state with FIFO lots and realized P&L.
///
/// Created on the first activity for a key and mutated by every subsequent
/// activity in chronological order; never deleted, only driven to zero.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenPosition {
    pub wallet: Address,
    pub mint: Mint,
    /// Lots in strict acquisition order, oldest at the front.
    pub lots: VecDeque<CostBasisLot>,
    /// Always equals the sum of lot amounts.
    pub current_balance: Decimal,
    pub total_acquired: Decimal,
    pub total_disposed: Decimal,
    pub total_acquisition_native: Decimal,
    pub total_disposal_native: Decimal,
    pub realized_pnl_native: Decimal,
    /// Remaining cost basis divided by balance; zero when flat.
    pub average_cost_native: Decimal,
    /// Sticky data-quality flag: set once a disposal exceeded tracked lots.
    pub basis_incomplete: bool,
    pub first_activity_at: Option<Timestamp>,
    pub last_activity_at: Option<Timestamp>,
}

impl TokenPosition {
    pub fn new(wallet: Address, mint: Mint) -> Self {
        TokenPosition {
            wallet,
            mint,
            lots: VecDeque::new(),
            current_balance: Decimal::zero(),
            total_acquired: Decimal::zero(),
            total_disposed: Decimal::zero(),
            total_acquisition_native: Decimal::zero(),
            total_disposal_native: Decimal::zero(),
            realized_pnl_native: Decimal::zero(),
            average_cost_native: Decimal::zero(),
            basis_incomplete: false,
            first_activity_at: None,
            last_activity_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_balance.is_zero()
    }

    /// Sum of remaining lot costs: the position's cost basis.
    pub fn cost_basis_native(&self) -> Decimal {
        self.lots
            .iter()
            .fold(Decimal::zero(), |acc, lot| acc + lot.cost_native())
    }

    /// Sum of remaining lot amounts. Equals `current_balance` by invariant.
    pub fn lots_total(&self) -> Decimal {
        self.lots
            .iter()
            .fold(Decimal::zero(), |acc, lot| acc + lot.amount)
    }

    /// Apply one activity to this position.
    ///
    /// Precondition: activities for this key arrive in non-decreasing
    /// timestamp order. A violation is surfaced as
    /// [`LedgerError::OrderingViolation`] rather than silently producing an
    /// incorrect ledger; applying an activity for a different key is
    /// [`LedgerError::KeyMismatch`].
    pub fn apply(&mut self, activity: &CanonicalActivity) -> Result<ApplyEffect, LedgerError> {
        if activity.wallet != self.wallet || activity.mint != self.mint {
            return Err(LedgerError::KeyMismatch {
                position_wallet: self.wallet.clone(),
                position_mint: self.mint.clone(),
                wallet: activity.wallet.clone(),
                mint: activity.mint.clone(),
            });
        }
        if let Some(last_seen) = self.last_activity_at {
            if activity.timestamp < last_seen {
                return Err(LedgerError::OrderingViolation {
                    last_seen,
                    got: activity.timestamp,
                });
            }
        }

        let kind = if activity.subtype.is_acquisition() {
            EffectKind::Acquire
        } else {
            EffectKind::Dispose
        };

        // Zero-amount activities leave the position untouched, watermark
        // included.
        if activity.amount_token.is_zero() {
            return Ok(ApplyEffect::noop(kind));
        }

        self.first_activity_at.get_or_insert(activity.timestamp);
        self.last_activity_at = Some(activity.timestamp);

        let effect = match kind {
            EffectKind::Acquire => self.acquire(activity),
            EffectKind::Dispose => self.dispose(activity),
        };
        self.recompute_average_cost();
        Ok(effect)
    }

    fn acquire(&mut self, activity: &CanonicalActivity) -> ApplyEffect {
        // Inbound transfers, airdrops, staking rewards, and uncategorized
        // receipts carry a zero cost basis: the ledger cannot know what the
        // tokens cost the owner in another context.
        let unit_price = if activity.subtype.is_zero_cost_acquisition() {
            Decimal::zero()
        } else {
            activity.unit_price_native
        };

        let amount = activity.amount_token;
        let cost = amount * unit_price;

        self.lots.push_back(CostBasisLot {
            amount,
            unit_price_native: unit_price,
            acquired_at: activity.timestamp,
        });
        self.current_balance += amount;
        self.total_acquired += amount;
        self.total_acquisition_native += cost;

        ApplyEffect {
            kind: EffectKind::Acquire,
            amount,
            cost_native: cost,
            proceeds_native: Decimal::zero(),
            realized_pnl_native: Decimal::zero(),
            basis_incomplete: false,
            uncovered_amount: Decimal::zero(),
        }
    }

    fn dispose(&mut self, activity: &CanonicalActivity) -> ApplyEffect {
        let amount = activity.amount_token;
        let covered = amount.min(self.current_balance);
        let uncovered = amount - covered;
        let consumed_cost = self.consume_lots(covered);

        // Only a sell realizes proceeds; other disposals write off basis.
        let proceeds_px = if activity.subtype.realizes_proceeds() {
            activity.unit_price_native
        } else {
            Decimal::zero()
        };
        let proceeds = amount * proceeds_px;
        let realized = proceeds - consumed_cost;

        self.current_balance -= covered;
        self.total_disposed += amount;
        self.total_disposal_native += proceeds;
        self.realized_pnl_native += realized;

        if uncovered.is_positive() {
            // The excess disposes at zero cost; an acquisition was likely
            // never ingested. Flag it so callers can surface a data-quality
            // warning.
            self.basis_incomplete = true;
            warn!(
                wallet = self.wallet.as_str(),
                mint = self.mint.as_str(),
                signature = activity.signature.as_str(),
                uncovered = %uncovered,
                "disposal exceeds tracked lots; excess treated as zero-cost basis"
            );
        }

        ApplyEffect {
            kind: EffectKind::Dispose,
            amount,
            cost_native: consumed_cost,
            proceeds_native: proceeds,
            realized_pnl_native: realized,
            basis_incomplete: uncovered.is_positive(),
            uncovered_amount: uncovered,
        }
    }

    /// Consume `amount` from the front of the lot queue, splitting the last
    /// touched lot if needed. Returns the cost of what was consumed.
    fn consume_lots(&mut self, amount: Decimal) -> Decimal {
        let mut remaining = amount;
        let mut consumed_cost = Decimal::zero();

        while remaining.is_positive() {
            let Some(front) = self.lots.front_mut() else {
                break;
            };
            if front.amount <= remaining {
                consumed_cost += front.cost_native();
                remaining -= front.amount;
                self.lots.pop_front();
            } else {
                consumed_cost += remaining * front.unit_price_native;
                front.amount -= remaining;
                remaining = Decimal::zero();
            }
        }

        consumed_cost
    }

    fn recompute_average_cost(&mut self) {
        self.average_cost_native = self
            .cost_basis_native()
            .div_or_zero(self.current_balance);
    }
}

/// Fold an ordered activity slice for one key into a fresh position.
pub fn replay(
    wallet: Address,
    mint: Mint,
    activities: &[CanonicalActivity],
) -> Result<TokenPosition, LedgerError> {
    let mut position = TokenPosition::new(wallet, mint);
    for activity in activities {
        position.apply(activity)?;
    }
    Ok(position)
}

/// Split a mixed activity stream into independent per-(wallet, mint) streams.
///
/// Different keys never share state, so the resulting folds may run
/// concurrently; partition by key, not by wallet alone.
pub fn partition_by_key(
    activities: &[CanonicalActivity],
) -> HashMap<(Address, Mint), Vec<CanonicalActivity>> {
    let mut partitions: HashMap<(Address, Mint), Vec<CanonicalActivity>> = HashMap::new();
    for activity in activities {
        partitions
            .entry((activity.wallet.clone(), activity.mint.clone()))
            .or_default()
            .push(activity.clone());
    }
    partitions
}

/// Replay every key of a mixed, per-key-ordered activity stream.
pub fn replay_all(
    activities: &[CanonicalActivity],
) -> Result<HashMap<(Address, Mint), TokenPosition>, LedgerError> {
    let mut positions = HashMap::new();
    for ((wallet, mint), stream) in partition_by_key(activities) {
        let position = replay(wallet.clone(), mint.clone(), &stream)?;
        positions.insert((wallet, mint), position);
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivityCategory, ActivitySubtype, Signature};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn activity(
        subtype: ActivitySubtype,
        amount: &str,
        unit_price: &str,
        ts: i64,
        sig: &str,
    ) -> CanonicalActivity {
        let amount_token = dec(amount);
        let unit_price_native = dec(unit_price);
        CanonicalActivity {
            wallet: Address::new("w"),
            mint: Mint::new("m"),
            category: ActivityCategory::Swap,
            subtype,
            amount_token,
            amount_native: amount_token * unit_price_native,
            unit_price_native,
            counter_token_mint: None,
            counter_token_amount: None,
            destination: None,
            timestamp: Timestamp::new(ts),
            signature: Signature::new(sig),
        }
    }

    fn fresh() -> TokenPosition {
        TokenPosition::new(Address::new("w"), Mint::new("m"))
    }

    #[test]
    fn test_buy_pushes_lot() {
        let mut position = fresh();
        let effect = position
            .apply(&activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"))
            .unwrap();
        assert_eq!(effect.kind, EffectKind::Acquire);
        assert_eq!(effect.cost_native, dec("1"));
        assert_eq!(position.current_balance, dec("100"));
        assert_eq!(position.lots.len(), 1);
        assert_eq!(position.average_cost_native, dec("0.01"));
        assert_eq!(position.total_acquisition_native, dec("1"));
        assert_eq!(position.first_activity_at, Some(Timestamp::new(1000)));
    }

    #[test]
    fn test_partial_lot_consumption() {
        // Scenario A: acquire 100 @ 0.01, dispose 40 @ 0.02.
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"))
            .unwrap();
        let effect = position
            .apply(&activity(ActivitySubtype::Sell, "40", "0.02", 2000, "s2"))
            .unwrap();

        assert_eq!(effect.realized_pnl_native, dec("0.4"));
        assert_eq!(position.realized_pnl_native, dec("0.4"));
        assert_eq!(position.current_balance, dec("60"));
        assert_eq!(position.lots.len(), 1);
        assert_eq!(position.lots[0].amount, dec("60"));
        assert_eq!(position.lots[0].unit_price_native, dec("0.01"));
    }

    #[test]
    fn test_fifo_across_two_lots() {
        // Scenario B: 50 @ 0.01 + 50 @ 0.03, dispose 70 @ 0.05.
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "50", "0.01", 1000, "s1"))
            .unwrap();
        position
            .apply(&activity(ActivitySubtype::Buy, "50", "0.03", 2000, "s2"))
            .unwrap();
        let effect = position
            .apply(&activity(ActivitySubtype::Sell, "70", "0.05", 3000, "s3"))
            .unwrap();

        assert_eq!(effect.cost_native, dec("1.1"));
        assert_eq!(effect.proceeds_native, dec("3.5"));
        assert_eq!(effect.realized_pnl_native, dec("2.4"));
        assert_eq!(position.realized_pnl_native, dec("2.4"));
        assert_eq!(position.current_balance, dec("30"));
        assert_eq!(position.lots.len(), 1);
        assert_eq!(position.lots[0].amount, dec("30"));
        assert_eq!(position.lots[0].unit_price_native, dec("0.03"));
    }

    #[test]
    fn test_zero_cost_basis_transfer_in() {
        // Scenario C: transfer_in 1000, sell 1000 @ 0.001 -> all profit.
        let mut position = fresh();
        // The classifier may have priced the inbound transfer; the ledger
        // forces zero anyway.
        let mut inbound = activity(ActivitySubtype::TransferIn, "1000", "0.005", 1000, "s1");
        inbound.category = ActivityCategory::Transfer;
        position.apply(&inbound).unwrap();

        assert_eq!(position.lots[0].unit_price_native, Decimal::zero());
        assert_eq!(position.total_acquisition_native, Decimal::zero());

        position
            .apply(&activity(ActivitySubtype::Sell, "1000", "0.001", 2000, "s2"))
            .unwrap();
        assert_eq!(position.realized_pnl_native, dec("1"));
        assert!(position.is_empty());
    }

    #[test]
    fn test_non_sale_disposal_realizes_no_proceeds() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"))
            .unwrap();
        let mut outbound = activity(ActivitySubtype::TransferOut, "100", "0.02", 2000, "s2");
        outbound.category = ActivityCategory::Transfer;
        let effect = position.apply(&outbound).unwrap();

        // Cost written off, no proceeds: realized P&L is -1.
        assert_eq!(effect.proceeds_native, Decimal::zero());
        assert_eq!(effect.realized_pnl_native, dec("-1"));
        assert_eq!(position.total_disposal_native, Decimal::zero());
        assert!(position.is_empty());
    }

    #[test]
    fn test_full_drain_resets_average_cost() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"))
            .unwrap();
        position
            .apply(&activity(ActivitySubtype::Sell, "100", "0.02", 2000, "s2"))
            .unwrap();
        assert!(position.lots.is_empty());
        assert_eq!(position.average_cost_native, Decimal::zero());
        assert_eq!(position.current_balance, Decimal::zero());
    }

    #[test]
    fn test_zero_amount_is_noop() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"))
            .unwrap();
        let before = position.clone();
        position
            .apply(&activity(ActivitySubtype::Sell, "0", "0.02", 2000, "s2"))
            .unwrap();
        assert_eq!(position, before);
    }

    #[test]
    fn test_overdraw_flags_basis_incomplete() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"))
            .unwrap();
        let effect = position
            .apply(&activity(ActivitySubtype::Sell, "150", "0.02", 2000, "s2"))
            .unwrap();

        assert!(effect.basis_incomplete);
        assert_eq!(effect.uncovered_amount, dec("50"));
        // Covered 100 at cost 1; proceeds 150 * 0.02 = 3; realized 2.
        assert_eq!(effect.cost_native, dec("1"));
        assert_eq!(effect.realized_pnl_native, dec("2"));
        assert!(position.basis_incomplete);
        // Balance clamps at zero so conservation holds.
        assert_eq!(position.current_balance, Decimal::zero());
        assert_eq!(position.lots_total(), Decimal::zero());
        assert_eq!(position.total_disposed, dec("150"));
    }

    #[test]
    fn test_disposal_on_empty_position_never_panics() {
        let mut position = fresh();
        let effect = position
            .apply(&activity(ActivitySubtype::Sell, "10", "0.5", 1000, "s1"))
            .unwrap();
        assert!(effect.basis_incomplete);
        assert_eq!(effect.realized_pnl_native, dec("5"));
        assert_eq!(position.current_balance, Decimal::zero());
    }

    #[test]
    fn test_conservation_after_every_step() {
        let activities = [
            activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"),
            activity(ActivitySubtype::Buy, "50", "0.03", 2000, "s2"),
            activity(ActivitySubtype::Sell, "120", "0.05", 3000, "s3"),
            activity(ActivitySubtype::Buy, "10", "0.02", 4000, "s4"),
            activity(ActivitySubtype::Sell, "40", "0.01", 5000, "s5"),
        ];
        let mut position = fresh();
        for a in &activities {
            position.apply(a).unwrap();
            assert_eq!(
                position.current_balance,
                position.lots_total(),
                "balance must equal lot sum after {}",
                a.signature
            );
        }
    }

    #[test]
    fn test_position_can_cycle_empty_and_back() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "10", "1", 1000, "s1"))
            .unwrap();
        position
            .apply(&activity(ActivitySubtype::Sell, "10", "2", 2000, "s2"))
            .unwrap();
        assert!(position.is_empty());
        position
            .apply(&activity(ActivitySubtype::Buy, "5", "3", 3000, "s3"))
            .unwrap();
        assert_eq!(position.current_balance, dec("5"));
        assert_eq!(position.average_cost_native, dec("3"));
    }

    #[test]
    fn test_ordering_violation_surfaced() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "10", "1", 2000, "s1"))
            .unwrap();
        let err = position
            .apply(&activity(ActivitySubtype::Buy, "10", "1", 1000, "s2"))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::OrderingViolation {
                last_seen: Timestamp::new(2000),
                got: Timestamp::new(1000),
            }
        );
    }

    #[test]
    fn test_equal_timestamps_allowed() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "10", "1", 1000, "s1"))
            .unwrap();
        assert!(position
            .apply(&activity(ActivitySubtype::Buy, "10", "1", 1000, "s2"))
            .is_ok());
    }

    #[test]
    fn test_key_mismatch_surfaced() {
        let mut position = fresh();
        let mut other = activity(ActivitySubtype::Buy, "10", "1", 1000, "s1");
        other.mint = Mint::new("other");
        assert!(matches!(
            position.apply(&other),
            Err(LedgerError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_stake_is_disposal_without_proceeds() {
        let mut position = fresh();
        position
            .apply(&activity(ActivitySubtype::Buy, "100", "0.01", 1000, "s1"))
            .unwrap();
        let mut stake = activity(ActivitySubtype::Stake, "30", "0", 2000, "s2");
        stake.category = ActivityCategory::Staking;
        position.apply(&stake).unwrap();
        assert_eq!(position.current_balance, dec("70"));
        assert_eq!(position.realized_pnl_native, dec("-0.3"));
    }

    #[test]
    fn test_staking_reward_is_zero_cost_acquisition() {
        let mut position = fresh();
        let mut reward = activity(ActivitySubtype::StakingReward, "5", "0.4", 1000, "s1");
        reward.category = ActivityCategory::Staking;
        position.apply(&reward).unwrap();
        assert_eq!(position.lots[0].unit_price_native, Decimal::zero());
        assert_eq!(position.cost_basis_native(), Decimal::zero());
    }

    #[test]
    fn test_liquidity_remove_keeps_classifier_price() {
        let mut position = fresh();
        let mut remove = activity(ActivitySubtype::LiquidityRemove, "400", "0.002", 1000, "s1");
        remove.category = ActivityCategory::Liquidity;
        position.apply(&remove).unwrap();
        assert_eq!(position.lots[0].unit_price_native, dec("0.002"));
        assert_eq!(position.total_acquisition_native, dec("0.8"));
    }

    #[test]
    fn test_partition_by_key_splits_streams() {
        let mut a = activity(ActivitySubtype::Buy, "10", "1", 1000, "s1");
        let mut b = activity(ActivitySubtype::Buy, "20", "1", 1000, "s2");
        b.mint = Mint::new("m2");
        let mut c = activity(ActivitySubtype::Buy, "30", "1", 2000, "s3");
        c.wallet = Address::new("w2");
        a.signature = Signature::new("s1");

        let partitions = partition_by_key(&[a, b, c]);
        assert_eq!(partitions.len(), 3);
        assert_eq!(
            partitions[&(Address::new("w"), Mint::new("m"))].len(),
            1
        );
    }

    #[test]
    fn test_replay_all_folds_each_key() {
        let a1 = activity(ActivitySubtype::Buy, "10", "1", 1000, "s1");
        let a2 = activity(ActivitySubtype::Sell, "4", "2", 2000, "s2");
        let mut b1 = activity(ActivitySubtype::Buy, "7", "1", 1500, "s3");
        b1.mint = Mint::new("m2");

        let positions = replay_all(&[a1, a2, b1]).unwrap();
        let pos_m = &positions[&(Address::new("w"), Mint::new("m"))];
        assert_eq!(pos_m.current_balance, dec("6"));
        assert_eq!(pos_m.realized_pnl_native, dec("4"));
        let pos_m2 = &positions[&(Address::new("w"), Mint::new("m2"))];
        assert_eq!(pos_m2.current_balance, dec("7"));
    }
}
