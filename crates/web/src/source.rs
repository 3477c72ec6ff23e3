use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::alchemy::AlchemyClient;
use common::config::{Config, SourceMode};
use common::provider::fetch_ledger;
use common::script::ScriptRunner;
use common::types::{ScriptReport, WalletLedger};
use persona::Persona;
use rand::Rng;

/// Where raw wallet data comes from, chosen by `provider.mode`.
pub enum DataSource {
    Live(AlchemyClient),
    Scripted(ScriptRunner),
    /// A fixed report served for every address.
    Fixture(ScriptReport),
}

/// Raw data for one wallet, in whichever shape the source produces.
#[derive(Debug)]
pub enum WalletData {
    Ledger(WalletLedger),
    Report(ScriptReport),
}

impl DataSource {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(match config.provider.mode {
            SourceMode::Live => {
                let key = config
                    .alchemy
                    .api_key
                    .as_deref()
                    .context("alchemy.api_key is required in live mode")?;
                Self::Live(AlchemyClient::new(
                    &config.alchemy.network,
                    key,
                    config.alchemy.max_transfers,
                    Duration::from_secs(config.alchemy.timeout_secs),
                )?)
            }
            SourceMode::Scripted => {
                let script = config
                    .script
                    .as_ref()
                    .context("[script] section is required in scripted mode")?;
                Self::Scripted(ScriptRunner::from_config(script))
            }
            SourceMode::Fixture => {
                Self::Fixture(common::fixture::load_report(config.fixture.path.as_deref())?)
            }
        })
    }

    pub fn mode(&self) -> SourceMode {
        match self {
            Self::Live(_) => SourceMode::Live,
            Self::Scripted(_) => SourceMode::Scripted,
            Self::Fixture(_) => SourceMode::Fixture,
        }
    }

    pub async fn fetch(&self, address: &str) -> Result<WalletData> {
        match self {
            Self::Live(client) => Ok(WalletData::Ledger(fetch_ledger(client, address).await?)),
            Self::Scripted(runner) => Ok(WalletData::Report(runner.run(address).await?)),
            Self::Fixture(report) => Ok(WalletData::Report(report.clone())),
        }
    }
}

impl WalletData {
    pub fn into_persona<R: Rng + ?Sized>(
        self,
        address: &str,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Persona {
        match self {
            Self::Ledger(ledger) => persona::analyze_ledger(address, &ledger, now, rng),
            Self::Report(report) => persona::analyze_report(address, &report, now, rng),
        }
    }
}
