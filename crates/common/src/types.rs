use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Transaction as seen by the persona engine. Providers disagree on casing and
/// on whether numbers arrive as strings, so both are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(deserialize_with = "de_opt_string_any", default)]
    pub value: Option<String>,
    #[serde(
        rename = "gasUsed",
        alias = "gas_used",
        deserialize_with = "de_opt_string_any",
        default
    )]
    pub gas_used: Option<String>,
    #[serde(
        rename = "gasPrice",
        alias = "gas_price",
        deserialize_with = "de_opt_string_any",
        default
    )]
    pub gas_price: Option<String>,
    #[serde(deserialize_with = "de_opt_timestamp", default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "blockNumber", alias = "block_number", default)]
    pub block_number: Option<u64>,
    #[serde(rename = "methodId", alias = "method_id", default)]
    pub method_id: Option<String>,
    #[serde(rename = "contractAddress", alias = "contract_address", default)]
    pub contract_address: Option<String>,
}

/// A single NFT held by the wallet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NftHolding {
    #[serde(rename = "contractAddress", alias = "contract_address", default)]
    pub contract_address: String,
    #[serde(rename = "tokenId", alias = "token_id", default)]
    pub token_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub traits: Vec<NftTrait>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NftTrait {
    #[serde(alias = "traitType", default)]
    pub trait_type: String,
    #[serde(deserialize_with = "de_opt_string_any", default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefiKind {
    #[default]
    Swap,
    Liquidity,
    Lending,
    Staking,
}

impl DefiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Liquidity => "liquidity",
            Self::Lending => "lending",
            Self::Staking => "staking",
        }
    }
}

/// One interaction with a DeFi protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefiInteraction {
    #[serde(default)]
    pub protocol: String,
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: DefiKind,
    #[serde(deserialize_with = "de_opt_string_any", default)]
    pub amount: Option<String>,
    #[serde(deserialize_with = "de_opt_timestamp", default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(rename = "transactionHash", alias = "transaction_hash", default)]
    pub transaction_hash: String,
    #[serde(rename = "tokenIn", alias = "token_in", default)]
    pub token_in: Option<String>,
    #[serde(rename = "tokenOut", alias = "token_out", default)]
    pub token_out: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenBalance {
    #[serde(rename = "contractAddress", alias = "contract_address", default)]
    pub contract_address: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(deserialize_with = "de_opt_string_any", default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletBalance {
    #[serde(default)]
    pub address: String,
    #[serde(deserialize_with = "de_opt_string_any", default)]
    pub balance: Option<String>,
    #[serde(default)]
    pub tokens: Vec<TokenBalance>,
}

/// Everything a live provider returns for one address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletLedger {
    pub transactions: Vec<Transaction>,
    pub nfts: Vec<NftHolding>,
    #[serde(rename = "defiInteractions", alias = "defi_interactions")]
    pub defi_interactions: Vec<DefiInteraction>,
    pub balance: WalletBalance,
}

/// Output of the external wallet-analysis script. The script writes
/// snake_case keys; the camelCase aliases cover the frontend-shaped fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptReport {
    #[serde(alias = "activityScore", default)]
    pub activity_score: Option<f64>,
    #[serde(alias = "totalNetworth", default)]
    pub total_networth: Option<f64>,
    #[serde(alias = "defiProtocols", default)]
    pub defi_protocols: Option<f64>,
    #[serde(alias = "totalDefiUsd", default)]
    pub total_defi_usd: Option<f64>,
    #[serde(alias = "uniqueNftCollections", default)]
    pub unique_nft_collections: Option<f64>,
    #[serde(alias = "tokenCount", default)]
    pub token_count: Option<f64>,
    #[serde(alias = "riskScore", default)]
    pub risk_score: Option<f64>,
    #[serde(alias = "walletHealthScore", default)]
    pub wallet_health_score: Option<f64>,
    #[serde(default)]
    pub chain: Option<String>,
    #[serde(default)]
    pub classifications: Vec<String>,
    #[serde(alias = "topTokens", default)]
    pub top_tokens: Vec<String>,
    #[serde(alias = "socialHandle", default)]
    pub social_handle: Option<String>,
}

/// Parse a ledger amount. Hex (`0x..`), decimal and blank strings are all
/// accepted; anything unparseable is zero.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0.0;
    };
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        #[allow(clippy::cast_precision_loss)]
        return u128::from_str_radix(hex, 16).map_or(0.0, |v| v as f64);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn de_opt_string_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct StringOrNumber;

    impl<'de> de::Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

/// Epoch values below this are seconds, above it milliseconds.
const EPOCH_MILLIS_CUTOFF: u64 = 100_000_000_000;

fn timestamp_from_epoch(v: i64) -> Option<DateTime<Utc>> {
    if v.unsigned_abs() >= EPOCH_MILLIS_CUTOFF {
        Utc.timestamp_millis_opt(v).single()
    } else {
        Utc.timestamp_opt(v, 0).single()
    }
}

/// Lenient timestamp parser: RFC 3339, `YYYY-MM-DD HH:MM:SS`, or epoch
/// seconds/millis. Anything else becomes `None` instead of failing the payload.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    s.parse::<i64>().ok().and_then(timestamp_from_epoch)
}

/// `0x` followed by 40 hex digits, or an ENS name ending in `.eth`.
pub fn is_valid_address(address: &str) -> bool {
    if let Some(hex) = address.strip_prefix("0x") {
        return hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    address
        .strip_suffix(".eth")
        .is_some_and(|name| !name.is_empty() && !name.contains(char::is_whitespace))
}

fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct LenientTimestamp;

    impl<'de> de::Visitor<'de> for LenientTimestamp {
        type Value = Option<DateTime<Utc>>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a timestamp string or epoch number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(parse_timestamp(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(timestamp_from_epoch(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(i64::try_from(v).ok().and_then(timestamp_from_epoch))
        }

        #[allow(clippy::cast_possible_truncation)]
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if v.is_finite() {
                Ok(timestamp_from_epoch(v as i64))
            } else {
                Ok(None)
            }
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LenientTimestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_address() {
        assert!(is_valid_address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"));
        assert!(is_valid_address("vitalik.eth"));
        assert!(!is_valid_address("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA9604"));
        assert!(!is_valid_address("0xZZdA6BF26964aF9D7eEd9e03E53415D37aA96045"));
        assert!(!is_valid_address(".eth"));
        assert!(!is_valid_address("hello world.eth"));
        assert!(!is_valid_address("not-an-address"));
    }

    #[test]
    fn test_parse_amount_handles_hex_decimal_and_garbage() {
        assert_eq!(parse_amount(Some("1.5")), 1.5);
        assert_eq!(parse_amount(Some("0x10")), 16.0);
        assert_eq!(parse_amount(Some("")), 0.0);
        assert_eq!(parse_amount(Some("not-a-number")), 0.0);
        assert_eq!(parse_amount(Some("NaN")), 0.0);
        assert_eq!(parse_amount(None), 0.0);
    }

    #[test]
    fn test_transaction_accepts_camel_and_snake_case() {
        let camel: Transaction = serde_json::from_str(
            r#"{"hash":"0x1","from":"0xa","value":2.5,"gasUsed":"21000","timestamp":"2024-01-02T03:04:05Z","contractAddress":"0xc"}"#,
        )
        .unwrap();
        let snake: Transaction = serde_json::from_str(
            r#"{"hash":"0x1","from":"0xa","value":"2.5","gas_used":21000,"timestamp":1704164645,"contract_address":"0xc"}"#,
        )
        .unwrap();

        assert_eq!(camel.value.as_deref(), Some("2.5"));
        assert_eq!(snake.value.as_deref(), Some("2.5"));
        assert_eq!(camel.gas_used.as_deref(), Some("21000"));
        assert_eq!(snake.gas_used.as_deref(), Some("21000"));
        assert_eq!(camel.timestamp, snake.timestamp);
        assert_eq!(snake.contract_address.as_deref(), Some("0xc"));
    }

    #[test]
    fn test_invalid_timestamp_becomes_none() {
        let tx: Transaction =
            serde_json::from_str(r#"{"hash":"0x1","timestamp":"yesterday-ish"}"#).unwrap();
        assert!(tx.timestamp.is_none());
    }

    #[test]
    fn test_epoch_millis_detected() {
        let secs = parse_timestamp("1704164645").unwrap();
        let millis = parse_timestamp("1704164645000").unwrap();
        assert_eq!(secs, millis);
    }

    #[test]
    fn test_extreme_epoch_values_become_none() {
        assert!(parse_timestamp("-9223372036854775808").is_none());
        assert!(parse_timestamp("9223372036854775807").is_none());

        let tx: Transaction = serde_json::from_str(r#"{"timestamp": -1e30}"#).unwrap();
        assert!(tx.timestamp.is_none());
        let tx: Transaction = serde_json::from_str(r#"{"timestamp": 1e30}"#).unwrap();
        assert!(tx.timestamp.is_none());
    }

    #[test]
    fn test_script_report_parses_python_output() {
        let report: ScriptReport = serde_json::from_str(
            r#"{
                "activity_score": 420,
                "total_networth": 250000.5,
                "defi_protocols": 4,
                "unique_nft_collections": 7,
                "token_count": 22,
                "risk_score": 64,
                "wallet_health_score": 81,
                "chain": "ethereum",
                "classifications": ["whale", "nft_collector"],
                "top_tokens": ["ETH", "USDC"]
            }"#,
        )
        .unwrap();
        assert_eq!(report.activity_score, Some(420.0));
        assert_eq!(report.classifications.len(), 2);
        assert!(report.social_handle.is_none());
        assert!(report.total_defi_usd.is_none());
    }
}
