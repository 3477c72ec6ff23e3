use anyhow::{Context, Result};

use crate::types::ScriptReport;

/// Report served when `provider.mode = fixture` and no file is configured.
pub const BUNDLED_REPORT: &str = include_str!("../fixtures/wallet_report.json");

/// Load the fixture report once at startup.
pub fn load_report(path: Option<&str>) -> Result<ScriptReport> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read fixture file: {path}"))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse fixture file: {path}"))
        }
        None => serde_json::from_str(BUNDLED_REPORT).context("bundled fixture is invalid"),
    }
}
