//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{AggregateQuery, ErrorResponse, RecordsQuery, SummaryResponse};
use crate::sim::aggregate::{Bucketing, aggregate_simulated};
use crate::sim::types::SimulatedIntervalRecord;

/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    let outcome = &state.outcome;
    Json(SummaryResponse {
        config: state.config,
        battery: state.battery.clone(),
        tariff: state.tariff,
        intervals: outcome.records.len(),
        before: outcome.before,
        after: outcome.after,
        improvements: outcome.improvements,
        financials: outcome.financials.clone(),
    })
}

/// Returns simulated records, optionally filtered by an inclusive time range.
///
/// `GET /records` → 200 + `Vec<SimulatedIntervalRecord>` JSON
/// `GET /records?from=A&to=B` → records with `A <= timestamp <= B`
/// `GET /records?from=B&to=A` with `A < B` → 400 + `ErrorResponse`
pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecordsQuery>,
) -> impl IntoResponse {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("`from` ({from}) must be <= `to` ({to})"),
                }),
            ));
        }
    }

    let records: Vec<SimulatedIntervalRecord> = state
        .outcome
        .records
        .iter()
        .filter(|r| query.from.is_none_or(|from| r.interval.timestamp >= from))
        .filter(|r| query.to.is_none_or(|to| r.interval.timestamp <= to))
        .cloned()
        .collect();

    Ok(Json(records))
}

/// `GET /aggregate?bucket=daily|monthly` → 200 + bucketed records JSON
pub async fn get_aggregate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregateQuery>,
) -> Json<Vec<SimulatedIntervalRecord>> {
    let bucketing = query.bucket.unwrap_or(Bucketing::Daily);
    Json(aggregate_simulated(&state.outcome.records, bucketing))
}
