use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::types::ScriptReport;

const STDERR_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to spawn analysis script `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("analysis script timed out after {0:?}")]
    Timeout(Duration),
    #[error("analysis script exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("analysis script produced invalid JSON")]
    Parse(#[from] serde_json::Error),
}

impl ScriptError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Timeout(_) => "timeout",
            Self::Failed { .. } => "exit_status",
            Self::Parse(_) => "parse",
        }
    }
}

/// Runs the external wallet-analysis script. The wallet address is passed as
/// the last argument and the script must print one JSON report on stdout.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ScriptRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(cfg: &crate::config::Script) -> Self {
        Self::new(
            cfg.program.clone(),
            cfg.args.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub async fn run(&self, address: &str) -> Result<ScriptReport, ScriptError> {
        let start = Instant::now();
        let res = self.run_inner(address).await;
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("persona_provider_latency_ms", "endpoint" => "script").record(ms);
        match &res {
            Ok(_) => {
                metrics::counter!("persona_provider_requests_total", "endpoint" => "script", "status" => "ok").increment(1);
            }
            Err(e) => {
                metrics::counter!("persona_provider_requests_total", "endpoint" => "script", "status" => "error").increment(1);
                metrics::counter!("persona_provider_errors_total", "endpoint" => "script", "kind" => e.kind())
                    .increment(1);
            }
        }
        res
    }

    async fn run_inner(&self, address: &str) -> Result<ScriptReport, ScriptError> {
        debug!(program = %self.program, address, "running analysis script");

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(address)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScriptError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_elapsed| ScriptError::Timeout(self.timeout))?
            .map_err(|source| ScriptError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(STDERR_EXCERPT_CHARS)
                .collect();
            return Err(ScriptError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let report: ScriptReport = serde_json::from_slice(&output.stdout)?;
        debug!(
            address,
            classifications = report.classifications.len(),
            "analysis script finished"
        );
        Ok(report)
    }
}
