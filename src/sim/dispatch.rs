//! Battery dispatch: one left-to-right pass over the metered intervals.
//!
//! Each decision depends only on the running SoC and the interval's own
//! import/export values. There is no lookahead.

use tracing::trace;

use crate::devices::Battery;
use crate::devices::battery::Transfer;

use super::types::{BatteryConfig, IntervalRecord, InverterMode, SimConfig, SimulatedIntervalRecord};

/// What the battery may do during one interval, before limits are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    /// Absorb up to this much surplus energy (kWh).
    Charge(f64),
    /// Cover up to this much deficit energy (kWh).
    Discharge(f64),
    Idle,
}

fn decide(mode: InverterMode, record: &IntervalRecord) -> Action {
    match mode {
        InverterMode::Asymmetric => {
            let net_balance = record.export_kwh - record.import_kwh;
            if net_balance > 0.0 {
                Action::Charge(net_balance)
            } else if net_balance < 0.0 {
                Action::Discharge(-net_balance)
            } else {
                Action::Idle
            }
        }
        // No simultaneous import and export through the same inverter path.
        InverterMode::Symmetric => {
            if record.export_kwh > 0.0 && record.import_kwh == 0.0 {
                Action::Charge(record.export_kwh)
            } else if record.import_kwh > 0.0 && record.export_kwh == 0.0 {
                Action::Discharge(record.import_kwh)
            } else {
                Action::Idle
            }
        }
    }
}

/// Simulates the battery over `records` and returns one augmented record per input.
///
/// The battery starts at `min_soc_percent` of capacity. `config` is expected
/// to have gone through [`BatteryConfig::validated`].
pub fn simulate(
    records: &[IntervalRecord],
    config: &BatteryConfig,
    sim: &SimConfig,
) -> Vec<SimulatedIntervalRecord> {
    let mut battery = Battery::new(config, sim);
    records
        .iter()
        .map(|record| step(&mut battery, record, config.inverter_mode, sim))
        .collect()
}

/// Dispatches a single interval against the running battery state.
pub fn step(
    battery: &mut Battery,
    record: &IntervalRecord,
    mode: InverterMode,
    sim: &SimConfig,
) -> SimulatedIntervalRecord {
    let mut grid_import = record.import_kwh;
    let mut grid_export = record.export_kwh;
    let mut charged = Transfer::default();
    let mut discharged = Transfer::default();

    match decide(mode, record) {
        Action::Charge(surplus_kwh) => {
            charged = battery.charge(surplus_kwh);
            if charged.terminal_kwh > 0.0 {
                grid_export -= charged.terminal_kwh;
            }
        }
        Action::Discharge(deficit_kwh) => {
            discharged = battery.discharge(deficit_kwh);
            if discharged.terminal_kwh > 0.0 {
                grid_import -= discharged.effective_kwh;
            }
        }
        Action::Idle => {}
    }

    let simulated = SimulatedIntervalRecord {
        interval: record.clone(),
        battery_soc_kwh: battery.soc_kwh,
        battery_soc_percent: battery.soc_percent(),
        battery_charge_kw: charged.terminal_kwh / sim.dt_hours,
        battery_discharge_kw: discharged.terminal_kwh / sim.dt_hours,
        battery_loss_kw: (charged.loss_kwh + discharged.loss_kwh) / sim.dt_hours,
        grid_import_with_battery: grid_import,
        grid_export_with_battery: grid_export,
    };
    trace!("{simulated}");
    simulated
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};

    use super::*;

    fn at(step: i64) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(3600).unwrap();
        offset.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(15 * step)
    }

    fn record(step: i64, import_kwh: f64, export_kwh: f64) -> IntervalRecord {
        IntervalRecord::new(at(step), 0.0, import_kwh, export_kwh)
    }

    fn config(mode: InverterMode) -> BatteryConfig {
        BatteryConfig {
            inverter_mode: mode,
            ..BatteryConfig::default()
        }
    }

    #[test]
    fn surplus_interval_charges_through_the_rate_limit() {
        let records = vec![IntervalRecord::new(at(0), 8.0, 0.0, 2.0)];
        let out = simulate(&records, &config(InverterMode::Asymmetric), &SimConfig::default());
        let r = &out[0];
        assert_abs_diff_eq!(r.battery_charge_kw, 5.0);
        assert_abs_diff_eq!(r.battery_soc_kwh, 2.2, epsilon = 1e-12);
        assert_abs_diff_eq!(r.battery_loss_kw, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(r.grid_export_with_battery, 0.75);
        assert_eq!(r.grid_import_with_battery, 0.0);
        assert_eq!(r.battery_discharge_kw, 0.0);
    }

    #[test]
    fn deficit_interval_discharges_net_of_losses() {
        let records = vec![record(0, 0.0, 2.0), record(1, 0.5, 0.0)];
        let out = simulate(&records, &config(InverterMode::Asymmetric), &SimConfig::default());
        let r = &out[1];
        // 0.5 kWh withdrawn, 0.46 kWh delivered.
        assert_abs_diff_eq!(r.battery_discharge_kw, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.grid_import_with_battery, 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(r.battery_loss_kw, 0.16, epsilon = 1e-12);
        assert_abs_diff_eq!(r.battery_soc_kwh, 1.7, epsilon = 1e-12);
        assert_eq!(r.battery_charge_kw, 0.0);
    }

    #[test]
    fn asymmetric_dispatches_on_net_balance() {
        let records = vec![record(0, 0.25, 1.0)];
        let out = simulate(&records, &config(InverterMode::Asymmetric), &SimConfig::default());
        assert_abs_diff_eq!(out[0].battery_charge_kw, 3.0);
        assert_abs_diff_eq!(out[0].grid_export_with_battery, 0.25);
        assert_eq!(out[0].grid_import_with_battery, 0.25);
    }

    #[test]
    fn symmetric_skips_mixed_intervals() {
        let records = vec![record(0, 0.25, 1.0), record(1, 0.0, 0.0)];
        let out = simulate(&records, &config(InverterMode::Symmetric), &SimConfig::default());
        for r in &out {
            assert_eq!(r.battery_charge_kw, 0.0);
            assert_eq!(r.battery_discharge_kw, 0.0);
            assert_eq!(r.grid_import_with_battery, r.interval.import_kwh);
            assert_eq!(r.grid_export_with_battery, r.interval.export_kwh);
        }
    }

    #[test]
    fn symmetric_acts_on_pure_intervals() {
        let records = vec![record(0, 0.0, 1.0), record(1, 0.4, 0.0)];
        let out = simulate(&records, &config(InverterMode::Symmetric), &SimConfig::default());
        assert_abs_diff_eq!(out[0].battery_charge_kw, 4.0);
        assert_eq!(out[0].grid_export_with_battery, 0.0);
        assert!(out[1].battery_discharge_kw > 0.0);
        assert!(out[1].grid_import_with_battery < 0.4);
    }

    #[test]
    fn balanced_interval_is_idle() {
        let records = vec![record(0, 0.3, 0.3)];
        let out = simulate(&records, &config(InverterMode::Asymmetric), &SimConfig::default());
        assert_eq!(out[0].battery_charge_kw, 0.0);
        assert_eq!(out[0].battery_discharge_kw, 0.0);
        assert_abs_diff_eq!(out[0].battery_soc_kwh, 1.0);
    }

    #[test]
    fn empty_battery_cannot_discharge() {
        let records = vec![record(0, 1.0, 0.0)];
        let out = simulate(&records, &config(InverterMode::Asymmetric), &SimConfig::default());
        assert_eq!(out[0].battery_discharge_kw, 0.0);
        assert_eq!(out[0].grid_import_with_battery, 1.0);
    }

    #[test]
    fn hourly_cadence_scales_rate_limits() {
        let records = vec![record(0, 0.0, 10.0)];
        let sim = SimConfig::new(60);
        let out = simulate(&records, &config(InverterMode::Asymmetric), &sim);
        // 5 kW for a full hour.
        assert_abs_diff_eq!(out[0].battery_charge_kw, 5.0);
        assert_abs_diff_eq!(out[0].grid_export_with_battery, 5.0);
    }

    #[test]
    fn soc_stays_within_window_over_a_long_surplus() {
        let cfg = config(InverterMode::Asymmetric);
        let records: Vec<_> = (0..200).map(|i| record(i, 0.0, 3.0)).collect();
        let out = simulate(&records, &cfg, &SimConfig::default());
        for r in &out {
            assert!(r.battery_soc_kwh <= cfg.max_soc_kwh() + 1e-9);
            assert!(r.battery_soc_kwh >= cfg.min_soc_kwh() - 1e-9);
        }
        assert_abs_diff_eq!(out[199].battery_soc_kwh, cfg.max_soc_kwh(), epsilon = 1e-6);
    }
}
