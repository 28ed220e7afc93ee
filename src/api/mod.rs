//! Read-only REST view of a completed simulation run.
//!
//! Provides three GET endpoints:
//! - `/summary`: configuration, before/after metrics and financials
//! - `/records`: simulated intervals with optional time-range filtering
//! - `/aggregate`: daily or monthly roll-ups in record shape

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::sim::engine::SimulationOutcome;
use crate::sim::tariff::PricingTier;
use crate::sim::types::{BatteryConfig, SimConfig};

pub use types::{AggregateQuery, ErrorResponse, RecordsQuery, SummaryResponse};

/// Immutable application state shared across all request handlers.
///
/// Built once after the run completes and wrapped in `Arc`; nothing is
/// mutated afterwards, so no locks are needed.
pub struct AppState {
    pub config: SimConfig,
    pub battery: BatteryConfig,
    pub tariff: PricingTier,
    pub outcome: SimulationOutcome,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/records", get(handlers::get_records))
        .route("/aggregate", get(handlers::get_aggregate))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the process is stopped.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, router(state)).await
}
