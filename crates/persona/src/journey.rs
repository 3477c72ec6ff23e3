use chrono::{DateTime, Utc};
use common::types::{parse_amount, DefiInteraction, DefiKind, NftHolding, ScriptReport, Transaction};
use serde::{Deserialize, Serialize};

/// Journey timelines never hold more than this many events.
pub const MAX_JOURNEY_EVENTS: usize = 10;

const TX_SCAN_LIMIT: usize = 10;
const NFT_SCAN_LIMIT: usize = 5;
const DEFI_SCAN_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Defi,
    Nft,
    Dao,
    Gaming,
    Social,
}

impl EventKind {
    pub const ALL: [Self; 5] = [Self::Defi, Self::Nft, Self::Dao, Self::Gaming, Self::Social];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneyEvent {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub description: String,
    pub significance: Significance,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amount: Option<f64>,
}

/// Newest first, capped at [`MAX_JOURNEY_EVENTS`]. The sort is stable so
/// same-day events keep their insertion order.
pub fn finalize(mut events: Vec<JourneyEvent>) -> Vec<JourneyEvent> {
    events.sort_by(|a, b| b.date.cmp(&a.date));
    events.truncate(MAX_JOURNEY_EVENTS);
    events
}

fn transaction_event(tx: &Transaction, now: DateTime<Utc>) -> Option<JourneyEvent> {
    let value = parse_amount(tx.value.as_deref());
    if value <= 1.0 {
        return None;
    }
    let large = value > 10.0;
    let has_contract = tx
        .contract_address
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    Some(JourneyEvent {
        date: tx.timestamp.unwrap_or(now),
        kind: if has_contract {
            EventKind::Defi
        } else {
            EventKind::Social
        },
        description: format!(
            "{} transaction of {value:.2} ETH",
            if large { "Large" } else { "Significant" }
        ),
        significance: if large {
            Significance::High
        } else {
            Significance::Medium
        },
        protocol: None,
        amount: Some(value),
    })
}

fn nft_event(nft: &NftHolding, now: DateTime<Utc>) -> JourneyEvent {
    // Holdings carry no acquisition date.
    JourneyEvent {
        date: now,
        kind: EventKind::Nft,
        description: format!("Acquired {} from {}", nft.name, nft.collection),
        significance: Significance::Medium,
        protocol: Some(nft.collection.clone()),
        amount: None,
    }
}

fn defi_verb(kind: DefiKind) -> &'static str {
    match kind {
        DefiKind::Swap => "Swapped tokens",
        DefiKind::Liquidity => "Provided liquidity",
        DefiKind::Lending => "Lent assets",
        DefiKind::Staking => "Staked tokens",
    }
}

fn defi_event(interaction: &DefiInteraction, now: DateTime<Utc>) -> JourneyEvent {
    let amount = parse_amount(interaction.amount.as_deref());
    let significance = if amount > 10_000.0 {
        Significance::High
    } else if amount > 100.0 {
        Significance::Medium
    } else {
        Significance::Low
    };
    let protocol = if interaction.protocol.trim().is_empty() {
        "an unknown protocol"
    } else {
        interaction.protocol.as_str()
    };
    JourneyEvent {
        date: interaction.timestamp.unwrap_or(now),
        kind: EventKind::Defi,
        description: format!("{} on {protocol}", defi_verb(interaction.kind)),
        significance,
        protocol: Some(protocol.to_string()),
        amount: (amount > 0.0).then_some(amount),
    }
}

/// Timeline from raw ledger data: notable transfers, recent NFT holdings and
/// DeFi interactions.
pub fn from_ledger(
    transactions: &[Transaction],
    nfts: &[NftHolding],
    defi: &[DefiInteraction],
    now: DateTime<Utc>,
) -> Vec<JourneyEvent> {
    let events = transactions
        .iter()
        .take(TX_SCAN_LIMIT)
        .filter_map(|tx| transaction_event(tx, now))
        .chain(nfts.iter().take(NFT_SCAN_LIMIT).map(|n| nft_event(n, now)))
        .chain(defi.iter().take(DEFI_SCAN_LIMIT).map(|d| defi_event(d, now)))
        .collect();
    finalize(events)
}

/// Timeline milestones derived from an analysis-script report. All are dated
/// at the analysis time.
pub fn from_report(report: &ScriptReport, now: DateTime<Utc>) -> Vec<JourneyEvent> {
    let mut events = Vec::new();

    let networth = report.total_networth.unwrap_or(0.0);
    if networth > 0.0 {
        events.push(JourneyEvent {
            date: now,
            kind: EventKind::Social,
            description: format!("Portfolio worth ${}", crate::narrative::fmt_usd(networth)),
            significance: if networth > 100_000.0 {
                Significance::High
            } else {
                Significance::Medium
            },
            protocol: None,
            amount: Some(networth),
        });
    }

    let protocols = report.defi_protocols.unwrap_or(0.0);
    if protocols > 0.0 {
        let defi_usd = report.total_defi_usd.unwrap_or(0.0);
        events.push(JourneyEvent {
            date: now,
            kind: EventKind::Defi,
            description: format!(
                "Active in {protocols:.0} DeFi protocols with ${}",
                crate::narrative::fmt_usd(defi_usd)
            ),
            significance: Significance::High,
            protocol: None,
            amount: report.total_defi_usd,
        });
    }

    let collections = report.unique_nft_collections.unwrap_or(0.0);
    if collections > 0.0 {
        events.push(JourneyEvent {
            date: now,
            kind: EventKind::Nft,
            description: format!("Owns {collections:.0} unique NFT collections"),
            significance: Significance::Medium,
            protocol: None,
            amount: None,
        });
    }

    if !report.top_tokens.is_empty() {
        let top: Vec<&str> = report.top_tokens.iter().take(3).map(String::as_str).collect();
        events.push(JourneyEvent {
            date: now,
            kind: EventKind::Social,
            description: format!("Top holdings: {}", top.join(", ")),
            significance: Significance::Medium,
            protocol: None,
            amount: None,
        });
    }

    finalize(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn tx(value: &str, days_ago: i64, contract: Option<&str>) -> Transaction {
        Transaction {
            value: Some(value.to_string()),
            timestamp: Some(now() - Duration::days(days_ago)),
            contract_address: contract.map(str::to_string),
            ..Transaction::default()
        }
    }

    fn assert_sorted_desc(events: &[JourneyEvent]) {
        assert!(events.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_small_transactions_are_skipped() {
        let events = from_ledger(&[tx("0.5", 1, None), tx("1", 2, None)], &[], &[], now());
        assert!(events.is_empty());
    }

    #[test]
    fn test_transaction_events_classified_by_size_and_contract() {
        let events = from_ledger(
            &[tx("25", 3, Some("0xpool")), tx("2.5", 1, None)],
            &[],
            &[],
            now(),
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].description, "Significant transaction of 2.50 ETH");
        assert_eq!(events[0].kind, EventKind::Social);
        assert_eq!(events[0].significance, Significance::Medium);
        assert_eq!(events[1].description, "Large transaction of 25.00 ETH");
        assert_eq!(events[1].kind, EventKind::Defi);
        assert_eq!(events[1].significance, Significance::High);
        assert_eq!(events[1].amount, Some(25.0));
    }

    #[test]
    fn test_only_first_ten_transactions_scanned() {
        let mut txs: Vec<_> = (0..10).map(|d| tx("0.1", d, None)).collect();
        txs.push(tx("500", 0, None));
        assert!(from_ledger(&txs, &[], &[], now()).is_empty());
    }

    #[test]
    fn test_nft_and_defi_events() {
        let nfts = vec![NftHolding {
            name: "Punk #1".to_string(),
            collection: "CryptoPunks".to_string(),
            ..NftHolding::default()
        }];
        let defi = vec![DefiInteraction {
            protocol: "Aave".to_string(),
            kind: DefiKind::Lending,
            amount: Some("25000".to_string()),
            timestamp: Some(now() - Duration::days(5)),
            ..DefiInteraction::default()
        }];
        let events = from_ledger(&[], &nfts, &defi, now());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].description, "Acquired Punk #1 from CryptoPunks");
        assert_eq!(events[0].protocol.as_deref(), Some("CryptoPunks"));
        assert_eq!(events[1].description, "Lent assets on Aave");
        assert_eq!(events[1].significance, Significance::High);
    }

    #[test]
    fn test_journey_is_capped_and_sorted() {
        let txs: Vec<_> = (0..10).map(|d| tx("5", d * 3, Some("0xc"))).collect();
        let nfts = vec![NftHolding::default(); 5];
        let defi = vec![DefiInteraction::default(); 5];
        let events = from_ledger(&txs, &nfts, &defi, now());
        assert_eq!(events.len(), MAX_JOURNEY_EVENTS);
        assert_sorted_desc(&events);
    }

    #[test]
    fn test_finalize_keeps_newest() {
        let events: Vec<_> = (0..15)
            .map(|d| JourneyEvent {
                date: now() - Duration::days(d),
                kind: EventKind::Dao,
                description: format!("event {d}"),
                significance: Significance::Low,
                protocol: None,
                amount: None,
            })
            .rev()
            .collect();
        let out = finalize(events);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0].description, "event 0");
        assert_eq!(out[9].description, "event 9");
    }

    #[test]
    fn test_report_journey() {
        let report = ScriptReport {
            total_networth: Some(250_000.0),
            defi_protocols: Some(3.0),
            total_defi_usd: Some(12_000.0),
            unique_nft_collections: Some(2.0),
            top_tokens: vec!["ETH".into(), "USDC".into(), "UNI".into(), "LDO".into()],
            ..ScriptReport::default()
        };
        let events = from_report(&report, now());
        assert_eq!(events.len(), 4);
        assert_eq!(events[0].description, "Portfolio worth $250,000");
        assert_eq!(events[0].significance, Significance::High);
        assert_eq!(
            events[1].description,
            "Active in 3 DeFi protocols with $12,000"
        );
        assert_eq!(events[3].description, "Top holdings: ETH, USDC, UNI");
    }

    #[test]
    fn test_empty_report_has_no_journey() {
        assert!(from_report(&ScriptReport::default(), now()).is_empty());
    }

    #[test]
    fn test_event_serializes_type_tag() {
        let e = JourneyEvent {
            date: now(),
            kind: EventKind::Gaming,
            description: "x".into(),
            significance: Significance::High,
            protocol: None,
            amount: None,
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "gaming");
        assert_eq!(json["significance"], "high");
        assert!(json.get("protocol").is_none());
    }
}
