use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::provider::{observe, BlockchainProvider};
use crate::types::{
    parse_amount, parse_timestamp, DefiInteraction, NftHolding, NftTrait, Transaction,
    WalletBalance,
};

const TRANSFER_CATEGORIES: [&str; 5] = ["external", "internal", "erc20", "erc721", "erc1155"];
const WEI_PER_ETH: f64 = 1e18;

/// Alchemy JSON-RPC + NFT API client.
pub struct AlchemyClient {
    base_url: String,
    client: reqwest::Client,
    max_transfers: u32,
}

impl AlchemyClient {
    pub fn new(network: &str, api_key: &str, max_transfers: u32, timeout: Duration) -> Result<Self> {
        Self::with_base_url(
            &format!("https://{network}.g.alchemy.com/v2/{api_key}"),
            max_transfers,
            timeout,
        )
    }

    pub fn with_base_url(base_url: &str, max_transfers: u32, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            max_transfers,
        })
    }

    pub fn nfts_url(&self, owner: &str) -> String {
        format!(
            "{}/getNFTs?owner={}",
            self.base_url,
            urlencoding::encode(owner)
        )
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });

        debug!(method, "alchemy rpc call");

        let resp = self
            .client
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to call {method}"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("{method} returned {status}: {text}");
        }

        let mut payload: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to deserialize {method} response"))?;

        if let Some(err) = payload.get("error") {
            anyhow::bail!("{method} rpc error: {err}");
        }
        Ok(payload.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }
}

impl BlockchainProvider for AlchemyClient {
    async fn transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        observe("asset_transfers", async {
            let params = json!([{
                "fromAddress": address,
                "category": TRANSFER_CATEGORIES,
                "maxCount": format!("{:#x}", self.max_transfers),
                "order": "desc",
                "withMetadata": true,
            }]);
            let result = self.rpc("alchemy_getAssetTransfers", params).await?;
            let txs = transfers_from_result(&result);
            debug!(address, count = txs.len(), "fetched transfers");
            Ok(txs)
        })
        .await
    }

    async fn nfts(&self, address: &str) -> Result<Vec<NftHolding>> {
        observe("nfts", async {
            let url = self.nfts_url(address);
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("failed to fetch NFTs for {address}"))?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                anyhow::bail!("getNFTs returned {status}: {text}");
            }
            let body: Value = resp
                .json()
                .await
                .context("failed to deserialize getNFTs response")?;
            Ok(nfts_from_body(&body))
        })
        .await
    }

    async fn defi_interactions(&self, address: &str) -> Result<Vec<DefiInteraction>> {
        // No DeFi position endpoint upstream; transfers already carry contract usage.
        debug!(address, "defi interactions not available from alchemy");
        Ok(vec![])
    }

    async fn balance(&self, address: &str) -> Result<WalletBalance> {
        observe("balance", async {
            let result = self
                .rpc("eth_getBalance", json!([address, "latest"]))
                .await?;
            let wei = parse_amount(result.as_str());
            Ok(WalletBalance {
                address: address.to_string(),
                balance: Some((wei / WEI_PER_ETH).to_string()),
                tokens: vec![],
            })
        })
        .await
    }
}

fn str_at<'a>(v: &'a Value, pointer: &str) -> Option<&'a str> {
    v.pointer(pointer).and_then(Value::as_str)
}

fn value_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Map an `alchemy_getAssetTransfers` result into ledger transactions.
pub fn transfers_from_result(result: &Value) -> Vec<Transaction> {
    let Some(transfers) = result.get("transfers").and_then(Value::as_array) else {
        return vec![];
    };
    transfers
        .iter()
        .map(|tx| Transaction {
            hash: str_at(tx, "/hash").unwrap_or_default().to_string(),
            from: str_at(tx, "/from").unwrap_or_default().to_string(),
            to: str_at(tx, "/to").map(str::to_string),
            value: tx
                .get("value")
                .and_then(value_to_string)
                .or_else(|| Some("0".to_string())),
            // Transfers carry no receipt data.
            gas_used: Some("0".to_string()),
            gas_price: Some("0".to_string()),
            timestamp: str_at(tx, "/metadata/blockTimestamp").and_then(parse_timestamp),
            block_number: str_at(tx, "/blockNum")
                .and_then(|b| u64::from_str_radix(b.trim_start_matches("0x"), 16).ok()),
            method_id: None,
            contract_address: str_at(tx, "/rawContract/address").map(str::to_string),
        })
        .collect()
}

/// Map a `getNFTs` body into holdings.
pub fn nfts_from_body(body: &Value) -> Vec<NftHolding> {
    let Some(owned) = body.get("ownedNfts").and_then(Value::as_array) else {
        return vec![];
    };
    owned
        .iter()
        .map(|nft| NftHolding {
            contract_address: str_at(nft, "/contract/address")
                .unwrap_or_default()
                .to_string(),
            token_id: str_at(nft, "/id/tokenId").unwrap_or_default().to_string(),
            name: str_at(nft, "/title")
                .filter(|t| !t.is_empty())
                .unwrap_or("Unnamed NFT")
                .to_string(),
            description: str_at(nft, "/description").map(str::to_string),
            image: str_at(nft, "/media/0/gateway").map(str::to_string),
            collection: str_at(nft, "/contractMetadata/name")
                .unwrap_or("Unknown Collection")
                .to_string(),
            traits: nft
                .pointer("/metadata/attributes")
                .and_then(Value::as_array)
                .map(|attrs| {
                    attrs
                        .iter()
                        .map(|a| NftTrait {
                            trait_type: str_at(a, "/trait_type").unwrap_or_default().to_string(),
                            value: a.get("value").and_then(value_to_string),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        })
        .collect()
}
