//! HTTP API consumed by the dashboard front-end.

pub mod analysis;
pub mod dashboard;
pub mod error;
pub mod exchange_rates;
pub mod operations;

use crate::analysis::AnalysisService;
use crate::core::cache::RateCache;
use crate::core::clock::{Clock, SystemClock};
use crate::core::completion::CompletionProvider;
use crate::core::config::{AppConfig, ServerConfig};
use crate::core::search::SearchProvider;
use crate::providers::{ChatCompletionProvider, DisabledProvider, WebSearchProvider};
use crate::rates::RateFetcher;
use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

pub struct AppState {
    pub rates: RateCache,
    pub analysis: AnalysisService,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wires providers, the rate cache and the analysis service from config.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let search: Arc<dyn SearchProvider> = match &config.providers.search {
            Some(p) => Arc::new(WebSearchProvider::new(&p.base_url, p.api_key.clone())),
            None => {
                warn!("No search provider configured, exchange rates will use fallback values");
                Arc::new(DisabledProvider::new("Search"))
            }
        };
        let completion: Arc<dyn CompletionProvider> = match &config.providers.completion {
            Some(p) => Arc::new(ChatCompletionProvider::new(
                &p.base_url,
                p.api_key.clone(),
                &p.model,
            )),
            None => {
                warn!("No completion provider configured, analysis will use default values");
                Arc::new(DisabledProvider::new("Completion"))
            }
        };

        if config.analysis.timeout() >= config.server.request_timeout() {
            warn!(
                analysis_timeout_ms = config.analysis.timeout_ms,
                request_timeout_ms = config.server.request_timeout_ms,
                "Analysis timeout is not below the request timeout, slow models will surface as 408"
            );
        }

        let fetcher = RateFetcher::new(search, Arc::clone(&clock), config.rates.lookup_timeout());
        AppState {
            rates: RateCache::new(Arc::new(fetcher), Arc::clone(&clock), config.rates.ttl()),
            analysis: AnalysisService::new(completion, config.analysis.timeout()),
            clock,
        }
    }
}

pub fn build_state(config: &AppConfig) -> Arc<AppState> {
    Arc::new(AppState::from_config(config, Arc::new(SystemClock)))
}

async fn health() -> &'static str {
    "ok"
}

pub fn app_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(exchange_rates::router())
        .merge(dashboard::router())
        .merge(operations::router())
        .merge(analysis::router());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    let state = build_state(config);
    let router = app_router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!("Listening on {}", config.server.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")
}
