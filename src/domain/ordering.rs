//! Stable activity ordering for deterministic ledger replay.

use crate::domain::{CanonicalActivity, Signature};

/// Stable ordering key for activities within one (wallet, mint) stream.
///
/// Primary sort is the block timestamp; ties break on the transaction
/// signature so replays of the same set are always identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ActivityOrderingKey {
    pub timestamp: i64,
    pub signature: Signature,
}

impl ActivityOrderingKey {
    pub fn from_activity(activity: &CanonicalActivity) -> Self {
        ActivityOrderingKey {
            timestamp: activity.timestamp.as_i64(),
            signature: activity.signature.clone(),
        }
    }
}

/// Sort activities deterministically by (timestamp, signature).
pub fn sort_activities_deterministic(activities: &mut [CanonicalActivity]) {
    activities.sort_by(|a, b| {
        ActivityOrderingKey::from_activity(a).cmp(&ActivityOrderingKey::from_activity(b))
    });
}
