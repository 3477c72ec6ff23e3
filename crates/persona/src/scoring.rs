use chrono::{DateTime, Utc};

use crate::stats::{ActivitySignals, WalletStats};

const RISK_BASE: i32 = 50;
const HEALTH_BASE: i32 = 60;
/// Maximum health bonus granted for a perfectly regular cadence.
const CONSISTENCY_MAX_BONUS: f64 = 10.0;

fn clamp_score(x: i32) -> u8 {
    // In range after the clamp, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = x.clamp(0, 100) as u8;
    score
}

/// Rule-based risk score in [0, 100]. Higher means a more established,
/// lower-risk wallet.
pub fn risk_score(stats: &WalletStats, activity: &ActivitySignals) -> u8 {
    let mut score = RISK_BASE;

    if stats.total_transactions > 100 {
        score += 20;
    }
    if stats.unique_protocols > 10 {
        score += 15;
    }
    if stats.spends_less_gas_than(50.0) {
        score += 10;
    }

    if activity.recent_transactions < 5 {
        score -= 15;
    }
    // Almost everything the wallet does is DeFi: concentrated protocol exposure.
    if f64::from(stats.defi_interactions) > 0.8 * f64::from(stats.total_transactions) {
        score -= 10;
    }
    // Large value moved in very few transactions.
    if stats.total_volume > 100_000.0 && stats.total_transactions < 50 {
        score -= 15;
    }

    clamp_score(score)
}

/// Bonus points for cadence regularity; nothing when consistency was not measured.
pub fn consistency_bonus(activity: &ActivitySignals) -> i32 {
    if !activity.consistency_measured {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let bonus = (activity.consistency.clamp(0.0, 1.0) * CONSISTENCY_MAX_BONUS).round() as i32;
    bonus
}

/// Rule-based health score in [0, 100].
pub fn health_score(stats: &WalletStats, activity: &ActivitySignals, now: DateTime<Utc>) -> u8 {
    let mut score = HEALTH_BASE;

    if stats.total_transactions > 50 {
        score += 20;
    }
    if stats.unique_protocols > 5 {
        score += 15;
    }
    if stats.wallet_age_days(now) > 365.0 {
        score += 15;
    }
    if stats.defi_interactions > 0 && stats.nft_collections > 0 {
        score += 10;
    }
    score += consistency_bonus(activity);

    clamp_score(score)
}

/// Clamp an externally supplied score (e.g. from the analysis script), using
/// `default` when it is missing or not a number.
pub fn external_score(value: Option<f64>, default: u8) -> u8 {
    match value {
        #[allow(clippy::cast_possible_truncation)]
        Some(v) if v.is_finite() => clamp_score(v.round().clamp(-1.0, 101.0) as i32),
        _ => default,
    }
}
