use common::types::ScriptReport;
use serde::{Deserialize, Serialize};

use crate::stats::WalletStats;

/// Behavioural archetype used as the primary persona label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    #[serde(rename = "DeFi Whale")]
    DefiWhale,
    #[serde(rename = "NFT Collector")]
    NftCollector,
    #[serde(rename = "DeFi Farmer")]
    DefiFarmer,
    #[serde(rename = "DAO Participant")]
    DaoParticipant,
    #[serde(rename = "Retail Trader")]
    RetailTrader,
    #[serde(rename = "HODLer")]
    Hodler,
    #[serde(rename = "Institutional Investor")]
    InstitutionalInvestor,
    #[serde(rename = "Gaming Enthusiast")]
    GamingEnthusiast,
}

impl Archetype {
    pub const ALL: [Self; 8] = [
        Self::DefiWhale,
        Self::NftCollector,
        Self::DaoParticipant,
        Self::GamingEnthusiast,
        Self::DefiFarmer,
        Self::InstitutionalInvestor,
        Self::RetailTrader,
        Self::Hodler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefiWhale => "DeFi Whale",
            Self::NftCollector => "NFT Collector",
            Self::DefiFarmer => "DeFi Farmer",
            Self::DaoParticipant => "DAO Participant",
            Self::RetailTrader => "Retail Trader",
            Self::Hodler => "HODLer",
            Self::InstitutionalInvestor => "Institutional Investor",
            Self::GamingEnthusiast => "Gaming Enthusiast",
        }
    }

    /// Map an external classification tag (e.g. `nft_collector`). Case-insensitive.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "whale" => Some(Self::DefiWhale),
            "defi_user" => Some(Self::DefiFarmer),
            "nft_collector" => Some(Self::NftCollector),
            "dao_participant" => Some(Self::DaoParticipant),
            "trader" => Some(Self::RetailTrader),
            "hodler" => Some(Self::Hodler),
            "institutional" => Some(Self::InstitutionalInvestor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaCategory {
    pub primary: Archetype,
    pub secondary: Vec<String>,
    /// Heuristic certainty in [0, 100].
    pub confidence: u8,
}

const WHALE_MIN_VOLUME: f64 = 1_000_000.0;
const COLLECTOR_MIN_COLLECTIONS: u32 = 10;
const FARMER_MIN_DEFI: u32 = 50;
const DAO_MIN_PROTOCOLS: u32 = 20;

const DEFAULT_CONFIDENCE: u8 = 70;
const TAGGED_CONFIDENCE: u8 = 85;

/// Primary rules in priority order; the first match wins.
fn primary_from_stats(stats: &WalletStats) -> (Archetype, u8) {
    if stats.total_volume > WHALE_MIN_VOLUME {
        (Archetype::DefiWhale, 85)
    } else if stats.nft_collections > COLLECTOR_MIN_COLLECTIONS {
        (Archetype::NftCollector, 80)
    } else if stats.defi_interactions > FARMER_MIN_DEFI {
        (Archetype::DefiFarmer, 75)
    } else if stats.unique_protocols > DAO_MIN_PROTOCOLS {
        (Archetype::DaoParticipant, 70)
    } else {
        (Archetype::RetailTrader, DEFAULT_CONFIDENCE)
    }
}

/// Secondary labels are independent of each other and of the primary label.
fn secondary_from_stats(stats: &WalletStats) -> Vec<String> {
    let rules: [(bool, &str); 5] = [
        (stats.nft_collections > 5, "NFT Enthusiast"),
        (stats.defi_interactions > 10, "DeFi User"),
        (stats.unique_protocols > 15, "Protocol Explorer"),
        (stats.total_transactions > 500, "Power User"),
        (stats.spends_less_gas_than(30.0), "Gas Optimizer"),
    ];
    rules
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, label)| label.to_string())
        .collect()
}

/// Classify a wallet from its aggregated statistics.
pub fn classify_stats(stats: &WalletStats) -> PersonaCategory {
    let (primary, confidence) = primary_from_stats(stats);
    PersonaCategory {
        primary,
        secondary: secondary_from_stats(stats),
        confidence,
    }
}

/// Primary archetype from pre-computed tags: the first tag with a known
/// mapping wins. `None` when no tag is recognised.
pub fn archetype_from_tags<S: AsRef<str>>(tags: &[S]) -> Option<Archetype> {
    tags.iter().find_map(|t| Archetype::from_tag(t.as_ref()))
}

/// Classify a wallet from the tags and figures of an analysis-script report.
pub fn classify_tags(report: &ScriptReport) -> PersonaCategory {
    let (primary, confidence) = archetype_from_tags(&report.classifications)
        .map_or((Archetype::RetailTrader, DEFAULT_CONFIDENCE), |a| {
            (a, TAGGED_CONFIDENCE)
        });

    let figure = |v: Option<f64>| v.unwrap_or(0.0);
    let rules: [(bool, &str); 4] = [
        (figure(report.total_networth) > 1_000_000.0, "High Net Worth"),
        (figure(report.unique_nft_collections) > 5.0, "NFT Enthusiast"),
        (figure(report.defi_protocols) > 3.0, "DeFi User"),
        (figure(report.token_count) > 20.0, "Token Diversifier"),
    ];
    let secondary = rules
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, label)| label.to_string())
        .collect();

    PersonaCategory {
        primary,
        secondary,
        confidence,
    }
}
