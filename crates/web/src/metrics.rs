use anyhow::Result;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn describe() {
    describe_gauge!(
        "persona_web_build_info",
        "Build info for the persona server (value is always 1)."
    );
    describe_counter!(
        "persona_requests_total",
        "Persona requests by data source and outcome (ok, fallback, invalid)."
    );
    describe_histogram!(
        "persona_request_latency_ms",
        "End-to-end persona request latency in milliseconds."
    );
    describe_counter!(
        "persona_fallbacks_total",
        "Requests answered with a mock persona after a data source failure."
    );
    describe_counter!(
        "persona_provider_requests_total",
        "Upstream data source calls by endpoint and status."
    );
    describe_histogram!(
        "persona_provider_latency_ms",
        "Upstream data source latency in milliseconds."
    );
    describe_counter!(
        "persona_provider_errors_total",
        "Analysis script failures by kind."
    );
    describe_counter!("tracing_error_events", "Number of ERROR log events.");
    describe_counter!("tracing_warn_events", "Number of WARN log events.");
}

/// Install a global Prometheus recorder once and return the handle that
/// renders `/metrics`. Upkeep runs on each scrape.
pub fn init_global() -> Result<PrometheusHandle> {
    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    describe();
    let handle = PrometheusBuilder::new().install_recorder()?;
    let handle = PROM_HANDLE.get_or_init(|| handle).clone();

    ::metrics::gauge!(
        "persona_web_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);

    Ok(handle)
}
