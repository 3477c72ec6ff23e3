use chrono::{DateTime, Utc};
use common::types::{ScriptReport, WalletLedger};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classification::{classify_stats, classify_tags, PersonaCategory};
use crate::journey::{self, JourneyEvent};
use crate::narrative;
use crate::recommendations::{recommend, recommend_from_report, Recommendation};
use crate::scoring::{external_score, health_score, risk_score};
use crate::stats::{aggregate, ActivitySignals, WalletStats};

/// Scores used when a report omits them.
const DEFAULT_REPORT_SCORE: u8 = 50;
/// Average gas assumed for report-derived stats, which carry no gas data.
const REPORT_AVERAGE_GAS: f64 = 30.0;

/// Full behavioural profile of one wallet. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub address: String,
    pub category: PersonaCategory,
    pub risk_score: u8,
    pub health_score: u8,
    pub ai_generated_bio: String,
    pub suggested_handle: String,
    pub traits: Vec<String>,
    pub stats: WalletStats,
    pub journey: Vec<JourneyEvent>,
    pub recommendations: Vec<Recommendation>,
}

/// Build a persona from already aggregated statistics. Everything except the
/// handle is a pure function of the inputs.
pub fn from_stats<R: Rng + ?Sized>(
    address: &str,
    stats: WalletStats,
    activity: &ActivitySignals,
    timeline: Vec<JourneyEvent>,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Persona {
    let category = classify_stats(&stats);
    let primary = category.primary;
    Persona {
        address: address.to_string(),
        risk_score: risk_score(&stats, activity),
        health_score: health_score(&stats, activity, now),
        ai_generated_bio: narrative::bio(primary, &stats),
        suggested_handle: narrative::suggested_handle(primary, rng),
        traits: narrative::traits(&stats, now),
        recommendations: recommend(primary, &stats),
        journey: journey::finalize(timeline),
        category,
        stats,
    }
}

/// Persona from raw ledger data.
pub fn analyze_ledger<R: Rng + ?Sized>(
    address: &str,
    ledger: &WalletLedger,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Persona {
    let stats = aggregate(
        &ledger.transactions,
        &ledger.nfts,
        &ledger.defi_interactions,
        now,
    );
    let activity = ActivitySignals::from_transactions(&ledger.transactions, now);
    let timeline = journey::from_ledger(
        &ledger.transactions,
        &ledger.nfts,
        &ledger.defi_interactions,
        now,
    );
    let persona = from_stats(address, stats, &activity, timeline, now, rng);
    debug!(
        address,
        primary = %persona.category.primary,
        risk = persona.risk_score,
        health = persona.health_score,
        recent = activity.recent_transactions,
        "persona built from ledger"
    );
    persona
}

fn report_count(v: Option<f64>) -> u32 {
    match v {
        // Clamped into range first, so the cast is exact for integral values.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(x) if x.is_finite() => x.round().clamp(0.0, f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// Stats view of an analysis-script report. Timestamps are unknown and
/// anchored at `now`.
pub fn report_stats(report: &ScriptReport, now: DateTime<Utc>) -> WalletStats {
    let protocols = report_count(report.defi_protocols);
    WalletStats {
        total_transactions: report_count(report.activity_score),
        total_volume: report
            .total_networth
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        first_transaction: now,
        last_transaction: now,
        unique_protocols: protocols,
        nft_collections: report_count(report.unique_nft_collections),
        defi_interactions: protocols,
        average_gas_spent: REPORT_AVERAGE_GAS,
    }
}

/// Persona from a pre-computed analysis-script report.
pub fn analyze_report<R: Rng + ?Sized>(
    address: &str,
    report: &ScriptReport,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Persona {
    let persona = Persona {
        address: address.to_string(),
        category: classify_tags(report),
        risk_score: external_score(report.risk_score, DEFAULT_REPORT_SCORE),
        health_score: external_score(report.wallet_health_score, DEFAULT_REPORT_SCORE),
        ai_generated_bio: narrative::report_bio(report),
        suggested_handle: narrative::report_handle(report, rng),
        traits: narrative::report_traits(report),
        stats: report_stats(report, now),
        journey: journey::from_report(report, now),
        recommendations: recommend_from_report(report),
    };
    debug!(
        address,
        primary = %persona.category.primary,
        tags = report.classifications.len(),
        "persona built from script report"
    );
    persona
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Archetype;
    use crate::journey::MAX_JOURNEY_EVENTS;
    use chrono::{Duration, TimeZone};
    use common::types::{DefiInteraction, NftHolding, Transaction};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn example_stats() -> WalletStats {
        WalletStats {
            total_transactions: 150,
            total_volume: 50_000.0,
            first_transaction: now() - Duration::days(400),
            last_transaction: now(),
            unique_protocols: 12,
            nft_collections: 2,
            defi_interactions: 5,
            average_gas_spent: 40.0,
        }
    }

    fn busy() -> ActivitySignals {
        ActivitySignals {
            recent_transactions: 20,
            consistency: 0.5,
            consistency_measured: false,
        }
    }

    #[test]
    fn test_worked_example() {
        let p = from_stats("0xabc", example_stats(), &busy(), vec![], now(), &mut rng());
        assert_eq!(p.category.primary, Archetype::RetailTrader);
        assert_eq!(p.category.confidence, 70);
        assert_eq!(p.risk_score, 95);
        assert_eq!(p.health_score, 100);
        assert_eq!(p.traits, vec!["High Activity", "Protocol Explorer", "Veteran"]);
    }

    #[test]
    fn test_empty_ledger() {
        let p = analyze_ledger("0xabc", &WalletLedger::default(), now(), &mut rng());
        assert_eq!(p.stats, WalletStats::empty(now()));
        assert_eq!(p.category.primary, Archetype::RetailTrader);
        assert_eq!(p.category.confidence, 70);
        assert_eq!(p.risk_score, 35);
        assert_eq!(p.health_score, 60);
        assert!(p.journey.is_empty());
        assert!(p.traits.is_empty());
    }

    fn busy_ledger() -> WalletLedger {
        let transactions = (0..40)
            .map(|i| Transaction {
                hash: format!("0x{i:02x}"),
                value: Some(format!("{}", i % 7)),
                gas_used: Some("21".to_string()),
                timestamp: Some(now() - Duration::days(i * 2)),
                contract_address: (i % 3 == 0).then(|| format!("0xc{}", i % 9)),
                ..Transaction::default()
            })
            .collect();
        let nfts = (0..8)
            .map(|i| NftHolding {
                contract_address: format!("0xnft{i}"),
                name: format!("Item {i}"),
                collection: format!("Set {i}"),
                ..NftHolding::default()
            })
            .collect();
        let defi_interactions = vec![DefiInteraction {
            protocol: "Uniswap".to_string(),
            amount: Some("2500".to_string()),
            timestamp: Some(now() - Duration::days(3)),
            ..DefiInteraction::default()
        }];
        WalletLedger {
            transactions,
            nfts,
            defi_interactions,
            ..WalletLedger::default()
        }
    }

    #[test]
    fn test_ledger_persona_invariants() {
        let p = analyze_ledger("0xabc", &busy_ledger(), now(), &mut rng());
        assert!(p.risk_score <= 100 && p.health_score <= 100);
        assert!(p.journey.len() <= MAX_JOURNEY_EVENTS);
        assert!(p.journey.windows(2).all(|w| w[0].date >= w[1].date));
        let unique: HashSet<_> = p.traits.iter().collect();
        assert_eq!(unique.len(), p.traits.len());
        assert_eq!(p.stats.total_transactions, 40);
        assert_eq!(p.stats.nft_collections, 8);
        assert!(p.traits.contains(&"Art Collector".to_string()));
    }

    #[test]
    fn test_classification_and_scores_are_idempotent() {
        let a = analyze_ledger("0xabc", &busy_ledger(), now(), &mut StdRng::seed_from_u64(1));
        let b = analyze_ledger("0xabc", &busy_ledger(), now(), &mut StdRng::seed_from_u64(2));
        assert_eq!(a.category, b.category);
        assert_eq!(a.risk_score, b.risk_score);
        assert_eq!(a.health_score, b.health_score);
        assert_eq!(a.ai_generated_bio, b.ai_generated_bio);
        assert_eq!(a.traits, b.traits);
        assert_eq!(a.journey, b.journey);
    }

    #[test]
    fn test_same_seed_same_persona() {
        let a = analyze_ledger("0xabc", &busy_ledger(), now(), &mut rng());
        let b = analyze_ledger("0xabc", &busy_ledger(), now(), &mut rng());
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_persona() {
        let report: ScriptReport =
            serde_json::from_str(common::fixture::BUNDLED_REPORT).unwrap();
        let p = analyze_report("0xabc", &report, now(), &mut rng());
        assert_eq!(p.category.primary, Archetype::DefiWhale);
        assert_eq!(p.category.confidence, 85);
        assert_eq!(p.risk_score, 58);
        assert_eq!(p.health_score, 83);
        assert_eq!(p.stats.total_transactions, 1284);
        assert_eq!(p.stats.unique_protocols, 7);
        assert_eq!(p.stats.defi_interactions, 7);
        assert_eq!(p.stats.first_transaction, now());
        assert!(p.ai_generated_bio.contains("$1,845,230"));
        assert!(p.traits.contains(&"Ethereum Native".to_string()));
        assert!(!p.recommendations.is_empty());
    }

    #[test]
    fn test_report_scores_default_to_fifty() {
        let p = analyze_report("0xabc", &ScriptReport::default(), now(), &mut rng());
        assert_eq!(p.risk_score, 50);
        assert_eq!(p.health_score, 50);
        assert_eq!(p.stats.average_gas_spent, 30.0);
    }

    #[test]
    fn test_persona_json_is_camel_case() {
        let p = from_stats("0xabc", example_stats(), &busy(), vec![], now(), &mut rng());
        let json = serde_json::to_value(&p).unwrap();
        for key in [
            "address",
            "category",
            "riskScore",
            "healthScore",
            "aiGeneratedBio",
            "suggestedHandle",
            "traits",
            "stats",
            "journey",
            "recommendations",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["stats"]["totalTransactions"], 150);
        assert_eq!(json["category"]["primary"], "Retail Trader");
    }
}
