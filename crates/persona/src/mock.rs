//! Random demo personas, served when real wallet data is unavailable.

use chrono::{DateTime, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::classification::{Archetype, PersonaCategory};
use crate::journey::{self, EventKind, JourneyEvent, Significance};
use crate::narrative;
use crate::profile::Persona;
use crate::recommendations::recommend;
use crate::stats::WalletStats;

const MOCK_JOURNEY_EVENTS: usize = 8;
const MOCK_SECONDARY: [&str; 3] = ["Early Adopter", "Multi-chain User", "Protocol Explorer"];
const MOCK_PROTOCOLS: [&str; 7] = [
    "Uniswap", "OpenSea", "Compound", "Aave", "MakerDAO", "Polygon", "Arbitrum",
];

fn random_date<R: Rng + ?Sized>(rng: &mut R, from_year: i32, to_year: i32, now: DateTime<Utc>) -> DateTime<Utc> {
    let year = rng.gen_range(from_year..=to_year);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now, |dt| dt.and_utc())
}

fn mock_stats<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> WalletStats {
    WalletStats {
        total_transactions: rng.gen_range(500..10_500),
        total_volume: f64::from(rng.gen_range(100_000..50_100_000_u32)),
        first_transaction: random_date(rng, 2020, 2023, now),
        last_transaction: random_date(rng, 2024, 2024, now),
        unique_protocols: rng.gen_range(5..30),
        nft_collections: rng.gen_range(1..16),
        defi_interactions: rng.gen_range(10..110),
        average_gas_spent: f64::from(rng.gen_range(20..120_u32)),
    }
}

fn event_descriptions(kind: EventKind) -> &'static [&'static str] {
    match kind {
        EventKind::Defi => &[
            "Provided liquidity to ETH/USDC pool",
            "Staked tokens in yield farming protocol",
            "Executed large swap transaction",
            "Participated in governance vote",
        ],
        EventKind::Nft => &[
            "Acquired rare NFT collection piece",
            "Minted new NFT project",
            "Traded high-value digital art",
            "Joined exclusive NFT community",
        ],
        EventKind::Dao => &[
            "Joined new DAO governance",
            "Voted on protocol proposal",
            "Contributed to DAO treasury",
            "Participated in community decision",
        ],
        EventKind::Gaming => &[
            "Purchased in-game assets",
            "Staked gaming tokens",
            "Joined gaming guild",
            "Earned play-to-earn rewards",
        ],
        EventKind::Social => &[
            "Connected social identity",
            "Joined Web3 social platform",
            "Shared on-chain reputation",
            "Built social graph connections",
        ],
    }
}

fn mock_journey<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Vec<JourneyEvent> {
    let events = (0..MOCK_JOURNEY_EVENTS)
        .map(|_| {
            let kind = *EventKind::ALL.choose(rng).unwrap_or(&EventKind::Defi);
            JourneyEvent {
                date: random_date(rng, 2022, 2023, now),
                kind,
                description: event_descriptions(kind)
                    .choose(rng)
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                significance: *[Significance::Low, Significance::Medium, Significance::High]
                    .choose(rng)
                    .unwrap_or(&Significance::Medium),
                protocol: MOCK_PROTOCOLS.choose(rng).map(|p| (*p).to_string()),
                amount: (kind == EventKind::Defi)
                    .then(|| f64::from(rng.gen_range(1_000..101_000_u32))),
            }
        })
        .collect();
    journey::finalize(events)
}

fn mock_traits(archetype: Archetype) -> &'static [&'static str] {
    match archetype {
        Archetype::DefiWhale => &[
            "Strategic Thinker",
            "Risk Manager",
            "Yield Optimizer",
            "Protocol Expert",
            "Market Timer",
        ],
        Archetype::NftCollector => &[
            "Art Connoisseur",
            "Trend Spotter",
            "Community Builder",
            "Digital Native",
            "Cultural Curator",
        ],
        Archetype::DaoParticipant => &[
            "Governance Expert",
            "Community Leader",
            "Long-term Thinker",
            "Consensus Builder",
            "Protocol Advocate",
        ],
        _ => &["Web3 Explorer", "Early Adopter", "Multi-chain User", "Community Member"],
    }
}

fn mock_handle<R: Rng + ?Sized>(archetype: Archetype, address: &str, rng: &mut R) -> String {
    let bases: &[&str] = match archetype {
        Archetype::DefiWhale => &["DefiMaestro", "YieldKing", "LiquidityLord", "ProtocolPro"],
        Archetype::NftCollector => &["DigitalCurator", "ArtVault", "NFTConnoisseur", "CryptoCollector"],
        Archetype::DaoParticipant => &["GovernanceGuru", "CommunityChief", "DAODelegate", "ProtocolPioneer"],
        _ => &["Web3User", "CryptoExplorer"],
    };
    let base = bases.choose(rng).copied().unwrap_or("Web3User");
    let tail: String = {
        let chars: Vec<char> = address.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect()
    };
    format!("{base}_{tail}")
}

/// A fully random persona for `address`. Scores and stats are not derived
/// from any real data.
pub fn mock_persona<R: Rng + ?Sized>(address: &str, now: DateTime<Utc>, rng: &mut R) -> Persona {
    let archetype = *Archetype::ALL.choose(rng).unwrap_or(&Archetype::RetailTrader);
    let stats = mock_stats(rng, now);
    let secondary_count = rng.gen_range(1..=MOCK_SECONDARY.len());
    let category = PersonaCategory {
        primary: archetype,
        secondary: MOCK_SECONDARY[..secondary_count]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        confidence: rng.gen_range(70..100),
    };

    Persona {
        address: address.to_string(),
        category,
        risk_score: rng.gen_range(60..100),
        health_score: rng.gen_range(70..100),
        ai_generated_bio: narrative::bio(archetype, &stats),
        suggested_handle: mock_handle(archetype, address, rng),
        traits: mock_traits(archetype).iter().map(|t| (*t).to_string()).collect(),
        journey: mock_journey(rng, now),
        recommendations: recommend(archetype, &stats),
        stats,
    }
}
