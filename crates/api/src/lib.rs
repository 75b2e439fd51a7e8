//! HTTP gateway for the order lifecycle engine.
//!
//! Exposes one route per lifecycle action plus reads and rich queries, with
//! structured logging (tracing) and Prometheus metrics. Caller identity comes
//! from headers set by an authenticating proxy in front of the gateway.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{Caller, Clock, OrderService, SettlementProfile, SystemClock, TxContext};
use ledger::Ledger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<L: Ledger> {
    pub service: Arc<OrderService<L>>,
    pub clock: Arc<dyn Clock>,
    pub ledger_backend: &'static str,
    pub profile: SettlementProfile,
}

impl<L: Ledger> AppState<L> {
    /// Builds the state for `ledger` from the loaded configuration, using wall-clock time.
    pub fn new(ledger: L, ledger_backend: &'static str, config: &Config) -> Self {
        Self::with_clock(ledger, ledger_backend, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        ledger: L,
        ledger_backend: &'static str,
        config: &Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let service =
            OrderService::with_config(ledger, config.organizations.clone(), config.policy);
        Self {
            service: Arc::new(service),
            clock,
            ledger_backend,
            profile: config.profile,
        }
    }

    /// Issues the transaction context for one request.
    pub fn context(&self, caller: Caller) -> TxContext {
        TxContext::issue(self.clock.as_ref(), caller)
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L: Ledger + 'static>(
    state: Arc<AppState<L>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<L>))
        .route("/orders", post(routes::orders::create::<L>))
        .route("/orders/query", post(routes::orders::query::<L>))
        .route("/orders/{id}", get(routes::orders::get::<L>))
        .route("/orders/{id}/scoped", get(routes::orders::get_scoped::<L>))
        .route("/orders/{id}/{action}", post(routes::orders::perform::<L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
