//! Human-readable persona text: bios, display handles and trait labels.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::types::ScriptReport;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::classification::Archetype;
use crate::stats::WalletStats;

const HANDLE_SUFFIXES: [&str; 5] = ["Master", "Pro", "Sage", "Elite", "Prime"];
const REPORT_HANDLE_SUFFIXES: [&str; 5] = ["Whale", "Master", "Pro", "Sage", "Trader"];
const HANDLE_NUMBER_MAX: u32 = 999;

/// Group the integer part of `value` with commas, e.g. `1234567.8` -> `1,234,568`.
pub fn fmt_usd(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.abs().round();
    // Anything beyond u64 is not a realistic wallet figure.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let digits = (rounded.min(u64::MAX as f64) as u64).to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 && rounded > 0.0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn fmt_count(value: u32) -> String {
    fmt_usd(f64::from(value))
}

fn handle_prefixes(archetype: Archetype) -> &'static [&'static str] {
    match archetype {
        Archetype::DefiWhale => &["Whale", "Deep", "Alpha"],
        Archetype::NftCollector => &["Curator", "Gallery", "Collector"],
        Archetype::DefiFarmer => &["Farmer", "Yield", "Harvest"],
        Archetype::DaoParticipant => &["Gov", "Council", "Vote"],
        // Archetypes reachable only through report tags share the retail set.
        Archetype::RetailTrader
        | Archetype::Hodler
        | Archetype::InstitutionalInvestor
        | Archetype::GamingEnthusiast => &["Trader", "Crypto", "Web3"],
    }
}

fn assemble_handle<R: Rng + ?Sized>(prefix: &str, suffixes: &[&str], rng: &mut R) -> String {
    let suffix = suffixes.choose(rng).copied().unwrap_or_default();
    let number = rng.gen_range(0..=HANDLE_NUMBER_MAX);
    format!("{prefix}{suffix}{number}")
}

/// Display handle for a classified wallet: prefix keyed by archetype, a
/// suffix word and a number in 0..=999.
pub fn suggested_handle<R: Rng + ?Sized>(archetype: Archetype, rng: &mut R) -> String {
    let prefix = handle_prefixes(archetype)
        .choose(rng)
        .copied()
        .unwrap_or("Web3");
    assemble_handle(prefix, &HANDLE_SUFFIXES, rng)
}

/// The script's own social handle when it supplied one; otherwise a handle
/// keyed by the report's dominant figure.
pub fn report_handle<R: Rng + ?Sized>(report: &ScriptReport, rng: &mut R) -> String {
    if let Some(handle) = report.social_handle.as_deref().map(str::trim) {
        if !handle.is_empty() {
            return handle.to_string();
        }
    }
    let figure = |v: Option<f64>| v.unwrap_or(0.0);
    let prefix = if figure(report.total_networth) > 1_000_000.0 {
        "Whale"
    } else if figure(report.defi_protocols) > 3.0 {
        "DeFi"
    } else if figure(report.unique_nft_collections) > 5.0 {
        "NFT"
    } else {
        "Crypto"
    };
    assemble_handle(prefix, &REPORT_HANDLE_SUFFIXES, rng)
}

/// Narrative bio for a classified wallet.
pub fn bio(archetype: Archetype, stats: &WalletStats) -> String {
    let txs = fmt_count(stats.total_transactions);
    let protocols = stats.unique_protocols;
    match archetype {
        Archetype::DefiWhale => format!(
            "A sophisticated DeFi investor with {} ETH in transaction volume. This wallet \
             demonstrates deep protocol knowledge and strategic position management across \
             {protocols} different platforms.",
            fmt_usd(stats.total_volume)
        ),
        Archetype::NftCollector => format!(
            "An active NFT enthusiast with {} unique collections. Shows discerning taste in \
             digital art and collectibles, with a transaction history spanning {txs} moves.",
            stats.nft_collections
        ),
        Archetype::DefiFarmer => format!(
            "A yield farming specialist actively managing positions across {protocols} protocols. \
             Demonstrates consistent engagement with {} DeFi interactions and careful gas usage.",
            fmt_count(stats.defi_interactions)
        ),
        Archetype::DaoParticipant => format!(
            "A committed governance participant engaged with {protocols} different protocols. \
             Shows long-term commitment to decentralized governance and community building."
        ),
        Archetype::RetailTrader
        | Archetype::Hodler
        | Archetype::InstitutionalInvestor
        | Archetype::GamingEnthusiast => format!(
            "An active retail participant in the Ethereum ecosystem with {txs} transactions. \
             Demonstrates growing engagement with Web3 technologies and a steady learning curve."
        ),
    }
}

/// Narrative bio built from an analysis-script report.
pub fn report_bio(report: &ScriptReport) -> String {
    let chain = report
        .chain
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("blockchain");
    let networth = report.total_networth.unwrap_or(0.0);
    let protocols = report.defi_protocols.unwrap_or(0.0);
    let collections = report.unique_nft_collections.unwrap_or(0.0);
    let tokens = report.token_count.unwrap_or(0.0);
    let health = report.wallet_health_score.unwrap_or(0.0);

    let defi = if protocols > 0.0 {
        format!("active DeFi engagement across {protocols:.0} protocols")
    } else {
        "conservative trading patterns".to_string()
    };
    let nft = if collections > 0.0 {
        format!("collects NFTs across {collections:.0} collections")
    } else {
        "focuses on token trading".to_string()
    };
    format!(
        "A {chain} native with ${} in total portfolio value. This wallet demonstrates {defi} \
         and {nft}. With {tokens:.0} different tokens, this user shows a {} investment strategy \
         and maintains a {} portfolio health score.",
        fmt_usd(networth),
        if tokens > 20.0 { "diverse" } else { "focused" },
        if health > 70.0 { "healthy" } else { "moderate" },
    )
}

/// Drop repeated labels, keeping the first occurrence.
pub fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter(|l| seen.insert(l.clone()))
        .collect()
}

/// Behavioural trait labels derived from wallet statistics.
pub fn traits(stats: &WalletStats, now: DateTime<Utc>) -> Vec<String> {
    let age = stats.wallet_age_days(now);
    let rules: [(bool, &str); 7] = [
        (stats.total_transactions > 100, "High Activity"),
        (stats.unique_protocols > 10, "Protocol Explorer"),
        (stats.nft_collections > 5, "Art Collector"),
        (stats.defi_interactions > 20, "DeFi Native"),
        (stats.spends_less_gas_than(30.0), "Gas Optimizer"),
        (age > 365.0, "Veteran"),
        (age > 1095.0, "OG"),
    ];
    dedup_labels(
        rules
            .into_iter()
            .filter(|(hit, _)| *hit)
            .map(|(_, label)| label.to_string())
            .collect(),
    )
}

/// `nft_collector` -> `Nft Collector`.
fn title_case_tag(tag: &str) -> String {
    tag.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trait labels from report thresholds followed by the report's own tags.
pub fn report_traits(report: &ScriptReport) -> Vec<String> {
    let figure = |v: Option<f64>| v.unwrap_or(0.0);
    let networth = figure(report.total_networth);
    let risk = report.risk_score;
    let rules: [(bool, &str); 10] = [
        (networth > 1_000_000.0, "High Net Worth"),
        (networth > 100_000.0, "Whale"),
        (risk.is_some_and(|r| r < 30.0), "Conservative"),
        (risk.is_some_and(|r| r > 70.0), "High Risk"),
        (figure(report.wallet_health_score) > 80.0, "Healthy Portfolio"),
        (figure(report.defi_protocols) > 5.0, "DeFi Native"),
        (figure(report.unique_nft_collections) > 10.0, "NFT Collector"),
        (figure(report.token_count) > 50.0, "Token Hoarder"),
        (figure(report.activity_score) > 1000.0, "High Activity"),
        (
            report
                .chain
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case("ethereum")),
            "Ethereum Native",
        ),
    ];
    let labels = rules
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, label)| label.to_string())
        .chain(
            report
                .classifications
                .iter()
                .map(|t| title_case_tag(t))
                .filter(|t| !t.is_empty()),
        )
        .collect();
    dedup_labels(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn stats() -> WalletStats {
        WalletStats {
            total_transactions: 1500,
            total_volume: 2_400_000.0,
            first_transaction: now() - Duration::days(1200),
            last_transaction: now(),
            unique_protocols: 12,
            nft_collections: 7,
            defi_interactions: 25,
            average_gas_spent: 20.0,
        }
    }

    #[test]
    fn test_fmt_usd_groups_thousands() {
        assert_eq!(fmt_usd(0.0), "0");
        assert_eq!(fmt_usd(999.4), "999");
        assert_eq!(fmt_usd(1000.0), "1,000");
        assert_eq!(fmt_usd(1_845_230.42), "1,845,230");
        assert_eq!(fmt_usd(-12_345.0), "-12,345");
        assert_eq!(fmt_usd(f64::NAN), "0");
    }

    #[test]
    fn test_bio_interpolates_stats() {
        let bio = bio(Archetype::DefiWhale, &stats());
        assert!(bio.contains("2,400,000 ETH"));
        assert!(bio.contains("12 different platforms"));

        let retail = super::bio(Archetype::RetailTrader, &stats());
        assert!(retail.contains("1,500 transactions"));
    }

    #[test]
    fn test_tag_only_archetypes_use_retail_text() {
        let retail = bio(Archetype::RetailTrader, &stats());
        for a in [
            Archetype::Hodler,
            Archetype::InstitutionalInvestor,
            Archetype::GamingEnthusiast,
        ] {
            assert_eq!(bio(a, &stats()), retail);
            let handle = suggested_handle(a, &mut StdRng::seed_from_u64(3));
            assert!(["Trader", "Crypto", "Web3"].iter().any(|p| handle.starts_with(p)));
        }
    }

    #[test]
    fn test_bio_is_deterministic() {
        for a in Archetype::ALL {
            assert_eq!(bio(a, &stats()), bio(a, &stats()));
        }
    }

    #[test]
    fn test_handle_shape_and_seed_determinism() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let h1 = suggested_handle(Archetype::DefiWhale, &mut a);
        let h2 = suggested_handle(Archetype::DefiWhale, &mut b);
        assert_eq!(h1, h2);
        assert!(["Whale", "Deep", "Alpha"].iter().any(|p| h1.starts_with(p)));
        let number: String = h1.chars().filter(char::is_ascii_digit).collect();
        assert!(number.parse::<u32>().unwrap() <= 999);
        assert!(HANDLE_SUFFIXES.iter().any(|s| h1.contains(s)));
    }

    #[test]
    fn test_report_handle_prefers_social_handle() {
        let mut rng = StdRng::seed_from_u64(1);
        let report = ScriptReport {
            social_handle: Some("vitalik.eth".to_string()),
            ..ScriptReport::default()
        };
        assert_eq!(report_handle(&report, &mut rng), "vitalik.eth");

        let blank = ScriptReport {
            social_handle: Some("  ".to_string()),
            total_networth: Some(2_000_000.0),
            ..ScriptReport::default()
        };
        assert!(report_handle(&blank, &mut rng).starts_with("Whale"));

        let defi = ScriptReport {
            defi_protocols: Some(4.0),
            ..ScriptReport::default()
        };
        assert!(report_handle(&defi, &mut rng).starts_with("DeFi"));
        assert!(report_handle(&ScriptReport::default(), &mut rng).starts_with("Crypto"));
    }

    #[test]
    fn test_traits_thresholds() {
        let t = traits(&stats(), now());
        assert_eq!(
            t,
            vec![
                "High Activity",
                "Protocol Explorer",
                "Art Collector",
                "DeFi Native",
                "Gas Optimizer",
                "Veteran",
                "OG"
            ]
        );
    }

    #[test]
    fn test_empty_wallet_has_no_traits() {
        assert!(traits(&WalletStats::empty(now()), now()).is_empty());
    }

    #[test]
    fn test_report_bio() {
        let report = ScriptReport {
            chain: Some("ethereum".to_string()),
            total_networth: Some(1_845_230.42),
            defi_protocols: Some(7.0),
            unique_nft_collections: Some(0.0),
            token_count: Some(34.0),
            wallet_health_score: Some(83.0),
            ..ScriptReport::default()
        };
        let bio = report_bio(&report);
        assert!(bio.starts_with("A ethereum native with $1,845,230"));
        assert!(bio.contains("active DeFi engagement across 7 protocols"));
        assert!(bio.contains("focuses on token trading"));
        assert!(bio.contains("diverse investment strategy"));
        assert!(bio.contains("healthy portfolio"));

        let empty = report_bio(&ScriptReport::default());
        assert!(empty.starts_with("A blockchain native with $0"));
        assert!(empty.contains("conservative trading patterns"));
    }

    #[test]
    fn test_report_traits_dedup_and_title_case() {
        let report = ScriptReport {
            total_networth: Some(2_000_000.0),
            chain: Some("ethereum".to_string()),
            classifications: vec![
                "whale".to_string(),
                "defi_user".to_string(),
                "whale".to_string(),
            ],
            ..ScriptReport::default()
        };
        assert_eq!(
            report_traits(&report),
            vec!["High Net Worth", "Whale", "Ethereum Native", "Defi User"]
        );
    }

    #[test]
    fn test_missing_risk_is_neither_conservative_nor_high() {
        let t = report_traits(&ScriptReport::default());
        assert!(t.is_empty());
    }
}
