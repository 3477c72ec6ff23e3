use anyhow::Result;
use std::future::Future;
use std::time::Instant;

use crate::types::{DefiInteraction, NftHolding, Transaction, WalletBalance, WalletLedger};

/// Raw on-chain data for a wallet. Implemented by the live RPC client and by
/// test doubles.
pub trait BlockchainProvider {
    fn transactions(&self, address: &str) -> impl Future<Output = Result<Vec<Transaction>>> + Send;

    fn nfts(&self, address: &str) -> impl Future<Output = Result<Vec<NftHolding>>> + Send;

    fn defi_interactions(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<Vec<DefiInteraction>>> + Send;

    fn balance(&self, address: &str) -> impl Future<Output = Result<WalletBalance>> + Send;
}

/// Issue the four provider calls together and wait for all of them. The first
/// failure aborts the whole fetch.
pub async fn fetch_ledger<P>(provider: &P, address: &str) -> Result<WalletLedger>
where
    P: BlockchainProvider + Sync,
{
    let start = Instant::now();
    let (transactions, nfts, defi_interactions, balance) = tokio::try_join!(
        provider.transactions(address),
        provider.nfts(address),
        provider.defi_interactions(address),
        provider.balance(address),
    )?;
    tracing::debug!(
        address,
        transactions = transactions.len(),
        nfts = nfts.len(),
        defi = defi_interactions.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "fetched wallet ledger"
    );
    Ok(WalletLedger {
        transactions,
        nfts,
        defi_interactions,
        balance,
    })
}

/// Wrap one provider request with latency and outcome metrics.
pub(crate) async fn observe<T, F>(endpoint: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let res = fut.await;
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("persona_provider_latency_ms", "endpoint" => endpoint).record(ms);
    let status = if res.is_ok() { "ok" } else { "error" };
    metrics::counter!("persona_provider_requests_total", "endpoint" => endpoint, "status" => status)
        .increment(1);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        calls: AtomicUsize,
        fail_nfts: bool,
    }

    impl BlockchainProvider for StaticProvider {
        async fn transactions(&self, _address: &str) -> Result<Vec<Transaction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Transaction {
                hash: "0x1".to_string(),
                value: Some("3".to_string()),
                ..Transaction::default()
            }])
        }

        async fn nfts(&self, _address: &str) -> Result<Vec<NftHolding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_nfts {
                anyhow::bail!("nft endpoint down");
            }
            Ok(vec![NftHolding::default()])
        }

        async fn defi_interactions(&self, _address: &str) -> Result<Vec<DefiInteraction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }

        async fn balance(&self, address: &str) -> Result<WalletBalance> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WalletBalance {
                address: address.to_string(),
                balance: Some("1.25".to_string()),
                tokens: vec![],
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_ledger_collects_all_four_sources() {
        let provider = StaticProvider {
            calls: AtomicUsize::new(0),
            fail_nfts: false,
        };
        let ledger = fetch_ledger(&provider, "0xabc").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(ledger.nfts.len(), 1);
        assert!(ledger.defi_interactions.is_empty());
        assert_eq!(ledger.balance.address, "0xabc");
    }

    #[tokio::test]
    async fn test_fetch_ledger_propagates_single_failure() {
        let provider = StaticProvider {
            calls: AtomicUsize::new(0),
            fail_nfts: true,
        };
        let err = fetch_ledger(&provider, "0xabc").await.unwrap_err();
        assert!(err.to_string().contains("nft endpoint down"));
    }
}
