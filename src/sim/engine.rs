//! Simulation orchestrator: baseline metrics, dispatch, after-metrics, and costs.

use serde::Serialize;
use tracing::debug;

use crate::error::SimError;

use super::dispatch::simulate;
use super::metrics::{Improvements, MetricsSnapshot};
use super::tariff::{FinancialResult, PricingTier, cost};
use super::types::{
    BatteryConfig, IntervalRecord, SimConfig, SimulatedIntervalRecord, check_sequence,
};

/// Everything one simulation run produces.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutcome {
    pub records: Vec<SimulatedIntervalRecord>,
    pub before: MetricsSnapshot,
    pub after: MetricsSnapshot,
    pub improvements: Improvements,
    pub financials: FinancialResult,
}

/// Immutable simulation setup.
///
/// Holds no per-run state: the SoC lives inside each [`Engine::run`] call,
/// so one engine can serve many independent runs, also across threads.
#[derive(Debug, Clone)]
pub struct Engine {
    sim: SimConfig,
    battery: BatteryConfig,
    tariff: PricingTier,
}

impl Engine {
    /// Creates an engine with an explicit tariff.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] if the battery or tariff is out of range.
    /// Out-of-range efficiencies are substituted, not rejected.
    pub fn new(
        sim: SimConfig,
        battery: BatteryConfig,
        tariff: PricingTier,
    ) -> Result<Self, SimError> {
        let battery = battery.validated()?;
        let problems = tariff.problems("tariff");
        if !problems.is_empty() {
            return Err(SimError::InvalidConfig(problems));
        }
        Ok(Self {
            sim,
            battery,
            tariff,
        })
    }

    /// Creates an engine priced with the battery currency's default tariff.
    ///
    /// # Errors
    ///
    /// See [`Engine::new`].
    pub fn with_default_tariff(sim: SimConfig, battery: BatteryConfig) -> Result<Self, SimError> {
        let tariff = battery.currency.default_tier();
        Self::new(sim, battery, tariff)
    }

    pub fn battery(&self) -> &BatteryConfig {
        &self.battery
    }

    pub fn config(&self) -> &SimConfig {
        &self.sim
    }

    pub fn tariff(&self) -> &PricingTier {
        &self.tariff
    }

    /// Runs one full simulation over `records`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnorderedRecords`] if timestamps are not strictly ascending.
    pub fn run(&self, records: &[IntervalRecord]) -> Result<SimulationOutcome, SimError> {
        check_sequence(records, &self.sim)?;
        debug!(
            intervals = records.len(),
            capacity_kwh = self.battery.capacity_kwh,
            mode = %self.battery.inverter_mode,
            "simulating"
        );

        let before = MetricsSnapshot::baseline(records, &self.sim);
        let simulated = simulate(records, &self.battery, &self.sim);
        let after = MetricsSnapshot::after(&simulated, &before, &self.sim);
        let improvements = Improvements::between(&before, &after);

        let (imports, exports): (Vec<f64>, Vec<f64>) =
            records.iter().map(|r| (r.import_kwh, r.export_kwh)).unzip();
        let baseline_cost = cost(&imports, &exports, &self.tariff)?;

        let (imports, exports): (Vec<f64>, Vec<f64>) = simulated
            .iter()
            .map(|r| (r.grid_import_with_battery, r.grid_export_with_battery))
            .unzip();
        let battery_cost = cost(&imports, &exports, &self.tariff)?;

        let financials = FinancialResult::new(baseline_cost, battery_cost, self.battery.currency);
        debug!(
            baseline_cost = financials.baseline_cost,
            battery_cost = financials.battery_cost,
            savings = financials.total_savings,
            "simulation finished"
        );

        Ok(SimulationOutcome {
            records: simulated,
            before,
            after,
            improvements,
            financials,
        })
    }
}

/// Validates `battery` and runs one simulation with the currency's default tariff.
///
/// # Errors
///
/// See [`Engine::new`] and [`Engine::run`].
pub fn run(
    records: &[IntervalRecord],
    battery: &BatteryConfig,
    sim: &SimConfig,
) -> Result<SimulationOutcome, SimError> {
    Engine::with_default_tariff(*sim, battery.clone())?.run(records)
}
