/// Daily and monthly roll-ups of interval records.
pub mod aggregate;
/// Per-interval battery dispatch.
pub mod dispatch;
pub mod engine;
pub mod metrics;
/// Tiered import pricing and savings.
pub mod tariff;
pub mod types;
