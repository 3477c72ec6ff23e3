mod metrics;
mod source;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use common::config::Config;
use common::types::is_valid_address;
use metrics_exporter_prometheus::PrometheusHandle;
use persona::Persona;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::json;
use source::DataSource;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub source: DataSource,
    pub started_at: Instant,
    /// Seeded from `engine.rng_seed` when set.
    pub rng: Mutex<StdRng>,
    pub prometheus: Option<PrometheusHandle>,
    pub available_wallets: Vec<String>,
}

impl AppState {
    pub fn new(source: DataSource, rng_seed: Option<u64>, prometheus: Option<PrometheusHandle>) -> Self {
        let rng = rng_seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            source,
            started_at: Instant::now(),
            rng: Mutex::new(rng),
            prometheus,
            available_wallets: Vec::new(),
        }
    }

    pub fn with_available_wallets(mut self, wallets: Vec<String>) -> Self {
        self.available_wallets = wallets;
        self
    }

    /// Run `f` with the shared generator. A poisoned lock still holds a
    /// usable generator.
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

#[derive(Serialize)]
struct PersonaResponse {
    #[serde(flatten)]
    persona: Persona,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

// --- Handlers ---

async fn index() -> &'static str {
    "Wallet persona API. Try GET /api/persona/{address}\n"
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "source": state.source.mode().as_str(),
    }))
}

async fn available_wallets(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.available_wallets.clone())
}

async fn persona_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    let source_label = state.source.mode().as_str();
    let address = address.trim().to_string();
    if !is_valid_address(&address) {
        ::metrics::counter!("persona_requests_total", "source" => source_label, "outcome" => "invalid")
            .increment(1);
        return error_json(StatusCode::BAD_REQUEST, format!("invalid wallet address: {address}"));
    }

    let start = Instant::now();
    let fetched = state.source.fetch(&address).await;
    let now = Utc::now();
    let (persona, warning) = match fetched {
        Ok(data) => (state.with_rng(|rng| data.into_persona(&address, now, rng)), None),
        Err(e) => {
            tracing::warn!(address = %address, source = source_label, error = %format!("{e:#}"), "wallet data unavailable, serving mock persona");
            ::metrics::counter!("persona_fallbacks_total", "source" => source_label).increment(1);
            let mock = state.with_rng(|rng| persona::mock::mock_persona(&address, now, rng));
            (
                mock,
                Some(format!("Live wallet data unavailable ({e}); showing a demo persona")),
            )
        }
    };

    let outcome = if warning.is_some() { "fallback" } else { "ok" };
    ::metrics::histogram!("persona_request_latency_ms", "source" => source_label)
        .record(start.elapsed().as_secs_f64() * 1000.0);
    ::metrics::counter!("persona_requests_total", "source" => source_label, "outcome" => outcome)
        .increment(1);
    tracing::info!(
        address = %address,
        source = source_label,
        outcome,
        primary = %persona.category.primary,
        "persona served"
    );

    Json(PersonaResponse { persona, warning }).into_response()
}

async fn raw_wallet(Path(address): Path<String>) -> Response {
    error_json(
        StatusCode::NOT_IMPLEMENTED,
        format!("raw wallet data for {address} is not available yet"),
    )
}

async fn summary(Path(address): Path<String>) -> Response {
    error_json(
        StatusCode::NOT_IMPLEMENTED,
        format!("wallet summary for {address} is not available yet"),
    )
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => {
            handle.run_upkeep();
            handle.render().into_response()
        }
        None => error_json(StatusCode::NOT_FOUND, "metrics recorder not installed"),
    }
}

// --- Router ---

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/available-wallets", get(available_wallets))
        .route("/api/persona/{address}", get(persona_handler))
        .route("/api/wallet/{address}/raw", get(raw_wallet))
        .route("/api/summary/{address}", get(summary))
        .route("/metrics", get(metrics_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(Config::default_config_path);
    let config = Config::load(&config_path)?;

    let _otel_guard = common::observability::init("persona-web", &config.general.log_level);
    tracing::info!(
        config = %config_path,
        source = config.provider.mode.as_str(),
        "wallet persona server starting"
    );

    let prometheus = metrics::init_global()?;
    let source = DataSource::from_config(&config)?;
    let state = Arc::new(
        AppState::new(source, config.engine.rng_seed, Some(prometheus))
            .with_available_wallets(config.server.available_wallets.clone()),
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("persona server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
