use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub server: Server,
    pub provider: Provider,
    pub alchemy: Alchemy,
    pub script: Option<Script>,
    #[serde(default)]
    pub fixture: Fixture,
    #[serde(default)]
    pub engine: Engine,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Demo wallets offered by `/api/available-wallets`.
    #[serde(default)]
    pub available_wallets: Vec<String>,
}

/// Where raw wallet data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Live,
    Scripted,
    Fixture,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Scripted => "scripted",
            Self::Fixture => "fixture",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    pub mode: SourceMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alchemy {
    pub network: String,
    /// Overridden by `ALCHEMY_API_KEY` when that is set.
    pub api_key: Option<String>,
    pub max_transfers: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    /// JSON file holding a script report. The bundled fixture is used when unset.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Engine {
    /// Fixed seed for handle/bio cosmetics. Fresh entropy per request when unset.
    pub rng_seed: Option<u64>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let mut config = Self::from_toml_str(&content)?;
        if let Ok(key) = std::env::var("ALCHEMY_API_KEY") {
            if !key.trim().is_empty() {
                config.alchemy.api_key = Some(key);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse config")
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.server.port > 0, "server.port must be > 0");
        if let Some(bad) = self
            .server
            .available_wallets
            .iter()
            .find(|w| !crate::types::is_valid_address(w))
        {
            anyhow::bail!("server.available_wallets has an invalid address: {bad}");
        }
        anyhow::ensure!(
            self.alchemy.timeout_secs > 0,
            "alchemy.timeout_secs must be > 0"
        );
        match self.provider.mode {
            SourceMode::Live => anyhow::ensure!(
                self.alchemy
                    .api_key
                    .as_deref()
                    .is_some_and(|k| !k.trim().is_empty()),
                "provider.mode = live requires alchemy.api_key or ALCHEMY_API_KEY"
            ),
            SourceMode::Scripted => {
                let script = self
                    .script
                    .as_ref()
                    .context("provider.mode = scripted requires a [script] section")?;
                anyhow::ensure!(
                    !script.program.trim().is_empty(),
                    "script.program must not be empty"
                );
                anyhow::ensure!(script.timeout_secs > 0, "script.timeout_secs must be > 0");
            }
            SourceMode::Fixture => {}
        }
        Ok(())
    }

    pub fn default_config_path() -> String {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));

        if let Some(dir) = &exe_dir {
            let candidate = dir.join("default.toml");
            if candidate.exists() {
                return candidate.to_string_lossy().to_string();
            }
        }

        "config/default.toml".to_string()
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
