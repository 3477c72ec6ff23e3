use common::types::ScriptReport;
use serde::{Deserialize, Serialize};

use crate::classification::Archetype;
use crate::narrative::{fmt_count, fmt_usd};
use crate::stats::WalletStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecKind {
    Dapp,
    Nft,
    Defi,
    Dao,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecKind,
    pub title: String,
    pub description: String,
    pub confidence: u8,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
}

impl Recommendation {
    fn new(
        kind: RecKind,
        title: &str,
        description: &str,
        confidence: u8,
        reasoning: String,
    ) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description: description.to_string(),
            confidence,
            reasoning,
            url: None,
        }
    }

    fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }
}

const HIGH_GAS: f64 = 50.0;
const FEW_PROTOCOLS: u32 = 5;

fn archetype_templates(archetype: Archetype, stats: &WalletStats) -> Vec<Recommendation> {
    match archetype {
        Archetype::DefiWhale => vec![
            Recommendation::new(
                RecKind::Defi,
                "Advanced Yield Strategies",
                "Explore institutional-grade yield strategies with risk-adjusted returns",
                85,
                format!(
                    "{} ETH of volume suggests readiness for advanced DeFi strategies",
                    fmt_usd(stats.total_volume)
                ),
            )
            .with_url("https://yearn.finance"),
            Recommendation::new(
                RecKind::Dao,
                "DeFi Protocol Governance",
                "Take part in governance of the protocols you already use",
                80,
                format!(
                    "Positions across {} protocols carry meaningful voting power",
                    stats.unique_protocols
                ),
            ),
        ],
        Archetype::NftCollector => vec![
            Recommendation::new(
                RecKind::Nft,
                "Emerging Art Collections",
                "Discover upcoming NFT artists and collections",
                80,
                format!(
                    "{} collections show consistent curation",
                    stats.nft_collections
                ),
            )
            .with_url("https://opensea.io"),
            Recommendation::new(
                RecKind::Dapp,
                "NFT Analytics Tools",
                "Track floor prices and market trends across your collections",
                75,
                format!(
                    "A collection spread over {} projects benefits from portfolio analytics",
                    stats.nft_collections
                ),
            ),
        ],
        Archetype::DefiFarmer => vec![Recommendation::new(
            RecKind::Defi,
            "Yield Aggregators",
            "Automate position rotation across farms",
            80,
            format!(
                "{} DeFi interactions indicate active position management",
                fmt_count(stats.defi_interactions)
            ),
        )],
        Archetype::DaoParticipant => vec![Recommendation::new(
            RecKind::Dao,
            "Delegate Platforms",
            "Build a delegate profile and track proposals in one place",
            78,
            format!(
                "Engagement with {} protocols fits an active delegate",
                stats.unique_protocols
            ),
        )],
        Archetype::RetailTrader
        | Archetype::Hodler
        | Archetype::InstitutionalInvestor
        | Archetype::GamingEnthusiast => vec![Recommendation::new(
            RecKind::Dapp,
            "Portfolio Tracker",
            "Monitor your crypto investments in real time",
            75,
            format!(
                "{} transactions are easier to follow with a dedicated tracker",
                fmt_count(stats.total_transactions)
            ),
        )],
    }
}

/// Archetype templates followed by gas and protocol-discovery suggestions,
/// in that order.
pub fn recommend(archetype: Archetype, stats: &WalletStats) -> Vec<Recommendation> {
    let mut recs = archetype_templates(archetype, stats);

    if stats.average_gas_spent > HIGH_GAS {
        recs.push(Recommendation::new(
            RecKind::Dapp,
            "Gas Optimization",
            "Batch transactions and use layer-2 networks to cut fees",
            70,
            format!(
                "Average gas of {:.0} gwei is above typical levels",
                stats.average_gas_spent
            ),
        ));
    }
    if stats.unique_protocols < FEW_PROTOCOLS {
        recs.push(Recommendation::new(
            RecKind::Defi,
            "Protocol Discovery",
            "Try established protocols beyond the ones you use today",
            65,
            format!(
                "Only {} protocols used so far",
                stats.unique_protocols
            ),
        ));
    }
    recs
}

/// Suggestions driven by analysis-script report figures.
pub fn recommend_from_report(report: &ScriptReport) -> Vec<Recommendation> {
    let figure = |v: Option<f64>| v.unwrap_or(0.0);
    let mut recs = Vec::new();

    if figure(report.risk_score) > 70.0 {
        recs.push(Recommendation::new(
            RecKind::Defi,
            "Risk Management Tools",
            "Consider hedging strategies to reduce risk exposure",
            80,
            "Your risk score indicates exposure that could benefit from risk management"
                .to_string(),
        ));
    }
    let defi_usd = figure(report.total_defi_usd);
    if figure(report.defi_protocols) > 0.0 && defi_usd > 10_000.0 {
        recs.push(Recommendation::new(
            RecKind::Defi,
            "Yield Optimization",
            "Explore advanced yield strategies for your DeFi portfolio",
            85,
            format!("Your ${} in DeFi shows active engagement", fmt_usd(defi_usd)),
        ));
    }
    let collections = figure(report.unique_nft_collections);
    if collections > 3.0 {
        recs.push(Recommendation::new(
            RecKind::Nft,
            "NFT Portfolio Management",
            "Use NFT analytics tools to track floor prices and market trends",
            75,
            format!("Your {collections:.0} NFT collections could benefit from better tracking"),
        ));
    }
    let tokens = figure(report.token_count);
    if tokens > 15.0 {
        recs.push(Recommendation::new(
            RecKind::Dapp,
            "Portfolio Rebalancing",
            "Consider consolidating token holdings for easier management",
            70,
            format!("With {tokens:.0} tokens, simplification might improve returns"),
        ));
    }
    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn stats() -> WalletStats {
        WalletStats {
            unique_protocols: 12,
            average_gas_spent: 40.0,
            total_transactions: 150,
            total_volume: 50_000.0,
            ..WalletStats::empty(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        }
    }

    fn titles(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_whale_gets_two_templates() {
        let recs = recommend(Archetype::DefiWhale, &stats());
        assert_eq!(
            titles(&recs),
            vec!["Advanced Yield Strategies", "DeFi Protocol Governance"]
        );
        assert!(recs[0].reasoning.contains("50,000 ETH"));
        assert_eq!(recs[0].url.as_deref(), Some("https://yearn.finance"));
    }

    #[test]
    fn test_gas_and_discovery_appended_in_order() {
        let s = WalletStats {
            average_gas_spent: 80.0,
            unique_protocols: 2,
            ..stats()
        };
        let recs = recommend(Archetype::RetailTrader, &s);
        assert_eq!(
            titles(&recs),
            vec!["Portfolio Tracker", "Gas Optimization", "Protocol Discovery"]
        );
        assert!(recs[1].reasoning.contains("80 gwei"));
        assert!(recs[2].reasoning.contains("Only 2 protocols"));
    }

    #[test]
    fn test_gas_threshold_is_strict() {
        let s = WalletStats {
            average_gas_spent: 50.0,
            ..stats()
        };
        assert_eq!(recommend(Archetype::DaoParticipant, &s).len(), 1);
    }

    #[test]
    fn test_every_archetype_has_a_template() {
        for a in Archetype::ALL {
            assert!(!recommend(a, &stats()).is_empty());
        }
    }

    #[test]
    fn test_report_recommendations() {
        let report = ScriptReport {
            risk_score: Some(75.0),
            defi_protocols: Some(2.0),
            total_defi_usd: Some(12_500.0),
            unique_nft_collections: Some(4.0),
            token_count: Some(16.0),
            ..ScriptReport::default()
        };
        let recs = recommend_from_report(&report);
        assert_eq!(
            titles(&recs),
            vec![
                "Risk Management Tools",
                "Yield Optimization",
                "NFT Portfolio Management",
                "Portfolio Rebalancing"
            ]
        );
        assert_eq!(recs[1].reasoning, "Your $12,500 in DeFi shows active engagement");
    }

    #[test]
    fn test_defi_usd_without_protocols_is_ignored() {
        let report = ScriptReport {
            total_defi_usd: Some(50_000.0),
            ..ScriptReport::default()
        };
        assert!(recommend_from_report(&report).is_empty());
    }

    #[test]
    fn test_recommendation_serializes_type() {
        let rec = &recommend(Archetype::NftCollector, &stats())[0];
        let json = serde_json::to_value(rec).unwrap();
        assert_eq!(json["type"], "nft");
        assert_eq!(json["confidence"], 80);
    }
}
