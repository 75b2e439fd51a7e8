//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use ledger::Ledger;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ledger: &'static str,
    pub settlement_profile: &'static str,
}

/// GET /health: reports liveness and the configured backends.
pub async fn check<L: Ledger + 'static>(
    State(state): State<Arc<AppState<L>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        ledger: state.ledger_backend,
        settlement_profile: state.profile.as_str(),
    })
}
