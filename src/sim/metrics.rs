//! Energy totals and self-consumption before and after adding a battery.

use std::fmt;

use serde::Serialize;

use super::types::{IntervalRecord, SimConfig, SimulatedIntervalRecord};

/// `numerator / denominator * 100`, or 0 when the denominator is 0.
pub fn percent_of(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Aggregate energy totals over one record sequence.
///
/// All energies are in kWh. An empty sequence yields all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub solar_production: f64,
    pub grid_import: f64,
    pub grid_export: f64,
    /// `solar_production - grid_export`.
    pub solar_self_consumption: f64,
    /// Self-consumption as a percentage of production.
    pub self_consumption_rate: f64,
    /// Extra self-consumption attributable to the battery (0 for a baseline).
    pub battery_self_consumption: f64,
    /// Energy destroyed by conversion losses (0 for a baseline).
    pub battery_losses: f64,
}

impl MetricsSnapshot {
    /// Computes the no-battery metrics from metered records.
    pub fn baseline(records: &[IntervalRecord], config: &SimConfig) -> Self {
        let mut solar_production = 0.0;
        let mut grid_import = 0.0;
        let mut grid_export = 0.0;

        for r in records {
            solar_production += r.production_kw * config.dt_hours;
            grid_import += r.import_kwh;
            grid_export += r.export_kwh;
        }

        let solar_self_consumption = solar_production - grid_export;
        Self {
            solar_production,
            grid_import,
            grid_export,
            solar_self_consumption,
            self_consumption_rate: percent_of(solar_self_consumption, solar_production),
            battery_self_consumption: 0.0,
            battery_losses: 0.0,
        }
    }

    /// Computes the metrics of a simulated run, relative to `baseline`.
    pub fn after(
        records: &[SimulatedIntervalRecord],
        baseline: &Self,
        config: &SimConfig,
    ) -> Self {
        let mut solar_production = 0.0;
        let mut grid_import = 0.0;
        let mut grid_export = 0.0;
        let mut battery_losses = 0.0;

        for r in records {
            solar_production += r.interval.production_kw * config.dt_hours;
            grid_import += r.grid_import_with_battery;
            grid_export += r.grid_export_with_battery;
            battery_losses += r.battery_loss_kw * config.dt_hours;
        }

        let solar_self_consumption = solar_production - grid_export;
        Self {
            solar_production,
            grid_import,
            grid_export,
            solar_self_consumption,
            self_consumption_rate: percent_of(solar_self_consumption, solar_production),
            battery_self_consumption: solar_self_consumption - baseline.solar_self_consumption,
            battery_losses,
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solar production:      {:.2} kWh", self.solar_production)?;
        writeln!(f, "Grid import:           {:.2} kWh", self.grid_import)?;
        writeln!(f, "Grid export:           {:.2} kWh", self.grid_export)?;
        writeln!(
            f,
            "Self-consumption:      {:.2} kWh ({:.1}%)",
            self.solar_self_consumption, self.self_consumption_rate
        )?;
        writeln!(f, "Battery contribution:  {:.2} kWh", self.battery_self_consumption)?;
        write!(f, "Battery losses:        {:.2} kWh", self.battery_losses)
    }
}

/// Difference between a baseline and a simulated snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Improvements {
    pub grid_import_reduction: f64,
    pub grid_import_reduction_percent: f64,
    pub grid_export_reduction: f64,
    pub grid_export_reduction_percent: f64,
    pub self_consumption_improvement: f64,
    /// Change of the self-consumption rate, in percentage points.
    pub self_consumption_rate_delta: f64,
}

impl Improvements {
    pub fn between(before: &MetricsSnapshot, after: &MetricsSnapshot) -> Self {
        let grid_import_reduction = before.grid_import - after.grid_import;
        let grid_export_reduction = before.grid_export - after.grid_export;
        Self {
            grid_import_reduction,
            grid_import_reduction_percent: percent_of(grid_import_reduction, before.grid_import),
            grid_export_reduction,
            grid_export_reduction_percent: percent_of(grid_export_reduction, before.grid_export),
            self_consumption_improvement: after.solar_self_consumption
                - before.solar_self_consumption,
            self_consumption_rate_delta: after.self_consumption_rate
                - before.self_consumption_rate,
        }
    }
}

impl fmt::Display for Improvements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Import reduction:      {:.2} kWh ({:.1}%)",
            self.grid_import_reduction, self.grid_import_reduction_percent
        )?;
        writeln!(
            f,
            "Export reduction:      {:.2} kWh ({:.1}%)",
            self.grid_export_reduction, self.grid_export_reduction_percent
        )?;
        write!(
            f,
            "Self-consumption gain: {:.2} kWh ({:+.1} pp)",
            self.self_consumption_improvement, self.self_consumption_rate_delta
        )
    }
}
