use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use common::types::{parse_amount, DefiInteraction, NftHolding, Transaction};
use serde::{Deserialize, Serialize};

/// Window for the "recently active" check used by the risk score.
pub const RECENT_ACTIVITY_DAYS: i64 = 30;
/// At most this many of the newest transactions feed the consistency metric.
pub const CONSISTENCY_WINDOW: usize = 20;
/// Below this many dated transactions consistency is not measured.
pub const MIN_CONSISTENCY_SAMPLE: usize = 10;
/// Consistency reported when there is too little history to measure it.
pub const NEUTRAL_CONSISTENCY: f64 = 0.5;

/// Aggregate summary of a wallet's on-chain activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub total_transactions: u32,
    pub total_volume: f64,
    pub first_transaction: DateTime<Utc>,
    pub last_transaction: DateTime<Utc>,
    pub unique_protocols: u32,
    pub nft_collections: u32,
    pub defi_interactions: u32,
    pub average_gas_spent: f64,
}

impl WalletStats {
    /// Zero-activity stats anchored at `now`.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_transactions: 0,
            total_volume: 0.0,
            first_transaction: now,
            last_transaction: now,
            unique_protocols: 0,
            nft_collections: 0,
            defi_interactions: 0,
            average_gas_spent: 0.0,
        }
    }

    /// True when there is gas data and the per-transaction average is below `limit`.
    pub fn spends_less_gas_than(&self, limit: f64) -> bool {
        self.total_transactions > 0 && self.average_gas_spent < limit
    }

    /// Days between the first transaction and `now`. Never negative.
    pub fn wallet_age_days(&self, now: DateTime<Utc>) -> f64 {
        let secs = now
            .signed_duration_since(self.first_transaction)
            .num_seconds()
            .max(0);
        #[allow(clippy::cast_precision_loss)]
        let days = secs as f64 / 86_400.0;
        days
    }
}

pub(crate) fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Sum that stays finite, pinned at `f64::MAX` / `f64::MIN` on overflow.
fn saturating_sum(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, v| (acc + v).clamp(f64::MIN, f64::MAX))
}

/// Reduce raw ledger lists into [`WalletStats`]. Total: malformed numbers count
/// as zero and an empty ledger yields zero-activity stats at `now`.
pub fn aggregate(
    transactions: &[Transaction],
    nfts: &[NftHolding],
    defi: &[DefiInteraction],
    now: DateTime<Utc>,
) -> WalletStats {
    let total_transactions = count_u32(transactions.len());

    let total_volume = saturating_sum(
        transactions
            .iter()
            .map(|tx| parse_amount(tx.value.as_deref())),
    );

    let timestamps = transactions.iter().filter_map(|tx| tx.timestamp);
    let (first, last) = timestamps.fold((None, None), |(lo, hi), ts| {
        (
            Some(lo.map_or(ts, |l: DateTime<Utc>| l.min(ts))),
            Some(hi.map_or(ts, |h: DateTime<Utc>| h.max(ts))),
        )
    });

    let unique_protocols = transactions
        .iter()
        .filter_map(|tx| tx.contract_address.as_deref())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<HashSet<_>>()
        .len();

    let nft_collections = nfts
        .iter()
        .map(|nft| {
            if nft.contract_address.trim().is_empty() {
                nft.collection.trim().to_string()
            } else {
                nft.contract_address.trim().to_ascii_lowercase()
            }
        })
        .filter(|key| !key.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let total_gas = saturating_sum(
        transactions
            .iter()
            .map(|tx| parse_amount(tx.gas_used.as_deref())),
    );

    WalletStats {
        total_transactions,
        total_volume,
        first_transaction: first.unwrap_or(now),
        last_transaction: last.unwrap_or(now),
        unique_protocols: count_u32(unique_protocols),
        nft_collections: count_u32(nft_collections),
        defi_interactions: count_u32(defi.len()),
        average_gas_spent: total_gas / f64::from(total_transactions.max(1)),
    }
}

/// Activity-derived inputs to the scores that are not part of [`WalletStats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivitySignals {
    /// Transactions within the last [`RECENT_ACTIVITY_DAYS`].
    pub recent_transactions: u32,
    /// Regularity of the transaction cadence in [0, 1].
    pub consistency: f64,
    /// False when `consistency` is the neutral placeholder.
    pub consistency_measured: bool,
}

impl ActivitySignals {
    pub fn from_transactions(transactions: &[Transaction], now: DateTime<Utc>) -> Self {
        let timestamps: Vec<DateTime<Utc>> =
            transactions.iter().filter_map(|tx| tx.timestamp).collect();
        Self::from_timestamps(&timestamps, now)
    }

    pub fn from_timestamps(timestamps: &[DateTime<Utc>], now: DateTime<Utc>) -> Self {
        Self {
            recent_transactions: recent_activity(timestamps, now),
            consistency: activity_consistency(timestamps),
            consistency_measured: timestamps.len() >= MIN_CONSISTENCY_SAMPLE,
        }
    }
}

/// Number of timestamps strictly after `now - 30 days`.
pub fn recent_activity(timestamps: &[DateTime<Utc>], now: DateTime<Utc>) -> u32 {
    let cutoff = now - Duration::days(RECENT_ACTIVITY_DAYS);
    count_u32(timestamps.iter().filter(|ts| **ts > cutoff).count())
}

/// Regularity of the gaps between the newest [`CONSISTENCY_WINDOW`]
/// transactions: `1 - stddev/mean`, floored at 0. Fewer than
/// [`MIN_CONSISTENCY_SAMPLE`] timestamps give exactly [`NEUTRAL_CONSISTENCY`].
pub fn activity_consistency(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.len() < MIN_CONSISTENCY_SAMPLE {
        return NEUTRAL_CONSISTENCY;
    }

    let mut newest: Vec<DateTime<Utc>> = timestamps.to_vec();
    newest.sort_unstable_by(|a, b| b.cmp(a));
    newest.truncate(CONSISTENCY_WINDOW);

    #[allow(clippy::cast_precision_loss)]
    let gaps: Vec<f64> = newest
        .windows(2)
        .map(|w| (w[0] - w[1]).num_milliseconds() as f64 / 1000.0)
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let n = gaps.len() as f64;
    let mean = gaps.iter().sum::<f64>() / n;
    // Every transaction in the same instant: all burst, no cadence.
    if mean <= f64::EPSILON {
        return 0.0;
    }
    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0)
}
