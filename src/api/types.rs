//! API response and query types.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::sim::aggregate::Bucketing;
use crate::sim::metrics::{Improvements, MetricsSnapshot};
use crate::sim::tariff::{FinancialResult, PricingTier};
use crate::sim::types::{BatteryConfig, SimConfig};

/// Everything except the per-interval records.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub config: SimConfig,
    pub battery: BatteryConfig,
    pub tariff: PricingTier,
    /// Number of simulated intervals.
    pub intervals: usize,
    pub before: MetricsSnapshot,
    pub after: MetricsSnapshot,
    pub improvements: Improvements,
    pub financials: FinancialResult,
}

/// Optional inclusive time range for `/records`.
///
/// Instants are RFC 3339; use `Z` or a percent-encoded `+` for the offset.
#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub from: Option<DateTime<FixedOffset>>,
    pub to: Option<DateTime<FixedOffset>>,
}

/// Bucket width for `/aggregate`; daily when omitted.
#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    pub bucket: Option<Bucketing>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_query_parses_rfc3339() {
        let q: RecordsQuery =
            serde_json::from_str(r#"{"from":"2025-06-01T00:00:00Z","to":null}"#).unwrap();
        assert_eq!(q.from.map(|t| t.timestamp()), Some(1_748_736_000));
        assert!(q.to.is_none());
    }

    #[test]
    fn aggregate_query_accepts_lowercase_bucket() {
        let q: AggregateQuery = serde_json::from_str(r#"{"bucket":"monthly"}"#).unwrap();
        assert_eq!(q.bucket, Some(Bucketing::Monthly));
    }
}
