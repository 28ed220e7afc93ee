//! Household PV + battery dispatch simulator.
//!
//! Replays metered 15-minute intervals through a simulated battery and
//! reports how grid import, export and the tiered electricity bill would
//! have changed.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
/// Synthetic profile generators and the battery model.
pub mod devices;
pub mod error;
pub mod io;
pub mod reporting;
pub mod scenario;
/// Dispatch, metrics, tariff, aggregation and the run orchestrator.
pub mod sim;

pub use error::{ConfigError, SimError};
pub use sim::engine::{Engine, SimulationOutcome};
