//! Core simulation types: interval cadence, input and output records, battery parameters.

use std::fmt;

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SimError};
use crate::sim::tariff::Currency;

/// Interval cadence of the metered input.
///
/// Every energy/power conversion in the core goes through `dt_hours`,
/// so non-15-minute data only needs a different `interval_minutes`.
///
/// # Examples
///
/// ```
/// use pv_battery_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(15);
/// assert_eq!(cfg.dt_hours, 0.25);
/// assert_eq!(cfg.steps_per_day(), 96);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimConfig {
    /// Width of one interval in minutes.
    pub interval_minutes: u32,
    /// Width of one interval in hours, derived as `interval_minutes / 60`.
    pub dt_hours: f64,
}

impl SimConfig {
    /// Creates a new cadence configuration.
    ///
    /// # Panics
    ///
    /// Panics if `interval_minutes` is zero.
    pub fn new(interval_minutes: u32) -> Self {
        assert!(interval_minutes > 0, "interval_minutes must be > 0");
        Self {
            interval_minutes,
            dt_hours: f64::from(interval_minutes) / 60.0,
        }
    }

    /// Expected distance between two consecutive records.
    pub fn interval(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.interval_minutes))
    }

    /// Number of intervals in a 24-hour day (rounded down).
    pub fn steps_per_day(&self) -> usize {
        (24 * 60 / self.interval_minutes) as usize
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new(15)
    }
}

/// One metered interval as measured without a battery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalRecord {
    /// Start of the interval.
    pub timestamp: DateTime<FixedOffset>,
    /// `timestamp` as epoch milliseconds, used for ordering checks.
    pub timestamp_ms: i64,
    /// Average solar power during the interval (kW).
    pub production_kw: f64,
    /// Energy imported from the grid over the interval (kWh).
    pub import_kwh: f64,
    /// Energy exported to the grid over the interval (kWh).
    pub export_kwh: f64,
}

impl IntervalRecord {
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        production_kw: f64,
        import_kwh: f64,
        export_kwh: f64,
    ) -> Self {
        Self {
            timestamp,
            timestamp_ms: timestamp.timestamp_millis(),
            production_kw,
            import_kwh,
            export_kwh,
        }
    }
}

/// An input interval augmented with the battery's behaviour during it.
///
/// Rate fields (`*_kw`) are the interval's energy divided by `dt_hours`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedIntervalRecord {
    #[serde(flatten)]
    pub interval: IntervalRecord,
    /// Stored energy at the end of the interval (kWh).
    pub battery_soc_kwh: f64,
    /// Stored energy as a percentage of capacity.
    pub battery_soc_percent: f64,
    /// Grid-side charging power (kW).
    pub battery_charge_kw: f64,
    /// Battery-side discharging power (kW).
    pub battery_discharge_kw: f64,
    /// Power dissipated by conversion losses (kW).
    pub battery_loss_kw: f64,
    /// Energy still imported with the battery in place (kWh).
    pub grid_import_with_battery: f64,
    /// Energy still exported with the battery in place (kWh).
    pub grid_export_with_battery: f64,
}

impl fmt::Display for SimulatedIntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | pv={:>6.2} kW | import {:.3}->{:.3} kWh  export {:.3}->{:.3} kWh | \
             charge={:.2} kW  discharge={:.2} kW  loss={:.2} kW | SoC={:.2} kWh ({:.1}%)",
            self.interval.timestamp.format("%Y-%m-%d %H:%M%:z"),
            self.interval.production_kw,
            self.interval.import_kwh,
            self.grid_import_with_battery,
            self.interval.export_kwh,
            self.grid_export_with_battery,
            self.battery_charge_kw,
            self.battery_discharge_kw,
            self.battery_loss_kw,
            self.battery_soc_kwh,
            self.battery_soc_percent,
        )
    }
}

/// How the inverter is allowed to move energy within one interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InverterMode {
    /// Net-metering: dispatch on the interval's net export/import balance.
    #[default]
    Asymmetric,
    /// Charge only on pure-surplus intervals, discharge only on pure-deficit ones.
    Symmetric,
}

impl fmt::Display for InverterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asymmetric => f.write_str("asymmetric"),
            Self::Symmetric => f.write_str("symmetric"),
        }
    }
}

/// Substituted when a configured charge efficiency falls outside (0, 1].
pub const DEFAULT_CHARGE_EFFICIENCY: f64 = 0.96;
/// Substituted when a configured discharge efficiency falls outside (0, 1].
pub const DEFAULT_DISCHARGE_EFFICIENCY: f64 = 0.92;

/// Battery storage parameters.
///
/// A capacity of zero is accepted and models "no battery": the dispatch
/// simulator then leaves every interval untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Usable energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Fraction of grid-side charging energy that ends up stored, in (0, 1].
    pub charge_efficiency: f64,
    /// Fraction of withdrawn energy that reaches the load, in (0, 1].
    pub discharge_efficiency: f64,
    /// Maximum charging power (kW).
    pub max_charge_rate_kw: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_rate_kw: f64,
    /// Lower SoC bound, percent of capacity. Also the starting SoC.
    pub min_soc_percent: f64,
    /// Upper SoC bound, percent of capacity.
    pub max_soc_percent: f64,
    pub inverter_mode: InverterMode,
    /// Selects the default pricing tier.
    pub currency: Currency,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 10.0,
            charge_efficiency: DEFAULT_CHARGE_EFFICIENCY,
            discharge_efficiency: DEFAULT_DISCHARGE_EFFICIENCY,
            max_charge_rate_kw: 5.0,
            max_discharge_rate_kw: 5.0,
            min_soc_percent: 10.0,
            max_soc_percent: 90.0,
            inverter_mode: InverterMode::Asymmetric,
            currency: Currency::Huf,
        }
    }
}

fn is_valid_efficiency(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

impl BatteryConfig {
    /// Assigns the charge efficiency, substituting [`DEFAULT_CHARGE_EFFICIENCY`]
    /// when `value` is outside (0, 1].
    ///
    /// Returns `false` if the value was rejected.
    pub fn set_charge_efficiency(&mut self, value: f64) -> bool {
        if is_valid_efficiency(value) {
            self.charge_efficiency = value;
            true
        } else {
            warn!(
                rejected = value,
                substituted = DEFAULT_CHARGE_EFFICIENCY,
                "charge efficiency outside (0, 1]"
            );
            self.charge_efficiency = DEFAULT_CHARGE_EFFICIENCY;
            false
        }
    }

    /// Assigns the discharge efficiency, substituting [`DEFAULT_DISCHARGE_EFFICIENCY`]
    /// when `value` is outside (0, 1].
    ///
    /// Returns `false` if the value was rejected.
    pub fn set_discharge_efficiency(&mut self, value: f64) -> bool {
        if is_valid_efficiency(value) {
            self.discharge_efficiency = value;
            true
        } else {
            warn!(
                rejected = value,
                substituted = DEFAULT_DISCHARGE_EFFICIENCY,
                "discharge efficiency outside (0, 1]"
            );
            self.discharge_efficiency = DEFAULT_DISCHARGE_EFFICIENCY;
            false
        }
    }

    /// Lower SoC bound in kWh.
    pub fn min_soc_kwh(&self) -> f64 {
        self.min_soc_percent / 100.0 * self.capacity_kwh
    }

    /// Upper SoC bound in kWh.
    pub fn max_soc_kwh(&self) -> f64 {
        self.max_soc_percent / 100.0 * self.capacity_kwh
    }

    /// Range checks for every field except the efficiencies, which self-heal.
    ///
    /// `section` prefixes the field paths of the returned errors.
    pub fn problems(&self, section: &str) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let field = |name: &str| format!("{section}.{name}");

        if !(self.capacity_kwh.is_finite() && self.capacity_kwh >= 0.0) {
            errors.push(ConfigError::new(field("capacity_kwh"), "must be a finite value >= 0"));
        }
        if !(self.max_charge_rate_kw.is_finite() && self.max_charge_rate_kw >= 0.0) {
            errors.push(ConfigError::new(
                field("max_charge_rate_kw"),
                "must be a finite value >= 0",
            ));
        }
        if !(self.max_discharge_rate_kw.is_finite() && self.max_discharge_rate_kw >= 0.0) {
            errors.push(ConfigError::new(
                field("max_discharge_rate_kw"),
                "must be a finite value >= 0",
            ));
        }
        if !(0.0..=100.0).contains(&self.min_soc_percent) {
            errors.push(ConfigError::new(field("min_soc_percent"), "must be in [0, 100]"));
        }
        if !(0.0..=100.0).contains(&self.max_soc_percent) {
            errors.push(ConfigError::new(field("max_soc_percent"), "must be in [0, 100]"));
        }
        if self.min_soc_percent >= self.max_soc_percent {
            errors.push(ConfigError::new(
                field("min_soc_percent"),
                format!("must be < {section}.max_soc_percent"),
            ));
        }

        errors
    }

    /// Applies the efficiency substitution policy and rejects any other
    /// out-of-range field.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] listing every violated constraint.
    pub fn validated(mut self) -> Result<Self, SimError> {
        let (charge, discharge) = (self.charge_efficiency, self.discharge_efficiency);
        self.set_charge_efficiency(charge);
        self.set_discharge_efficiency(discharge);

        let errors = self.problems("battery");
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(SimError::InvalidConfig(errors))
        }
    }
}

/// Checks that `records` are strictly ascending.
///
/// Steps that differ from the configured cadence are only reported through
/// the log: the upstream merger is expected to gap-fill.
///
/// # Errors
///
/// Returns [`SimError::UnorderedRecords`] at the first timestamp that does not
/// strictly follow its predecessor.
pub fn check_sequence(records: &[IntervalRecord], config: &SimConfig) -> Result<(), SimError> {
    let expected_ms = config.interval().num_milliseconds();
    let mut irregular = 0_usize;

    for (index, pair) in records.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        if current.timestamp_ms <= previous.timestamp_ms {
            return Err(SimError::UnorderedRecords {
                index: index + 1,
                previous: previous.timestamp,
                current: current.timestamp,
            });
        }
        if current.timestamp_ms - previous.timestamp_ms != expected_ms {
            irregular += 1;
        }
    }

    if irregular > 0 {
        warn!(
            irregular,
            interval_minutes = config.interval_minutes,
            "input cadence differs from the configured interval"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(minute: i64) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(3600).unwrap();
        offset.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(minute)
    }

    #[test]
    fn sim_config_quarter_hour() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.interval_minutes, 15);
        assert_eq!(cfg.dt_hours, 0.25);
        assert_eq!(cfg.interval(), TimeDelta::minutes(15));
    }

    #[test]
    fn sim_config_hourly() {
        let cfg = SimConfig::new(60);
        assert_eq!(cfg.dt_hours, 1.0);
        assert_eq!(cfg.steps_per_day(), 24);
    }

    #[test]
    #[should_panic]
    fn sim_config_zero_interval_panics() {
        SimConfig::new(0);
    }

    #[test]
    fn record_keeps_epoch_millis() {
        let r = IntervalRecord::new(at(15), 1.0, 0.0, 0.0);
        assert_eq!(r.timestamp_ms, at(0).timestamp_millis() + 15 * 60 * 1000);
    }

    #[test]
    fn invalid_efficiency_is_substituted() {
        let mut cfg = BatteryConfig::default();
        assert!(!cfg.set_charge_efficiency(1.2));
        assert_eq!(cfg.charge_efficiency, DEFAULT_CHARGE_EFFICIENCY);
        assert!(!cfg.set_discharge_efficiency(0.0));
        assert_eq!(cfg.discharge_efficiency, DEFAULT_DISCHARGE_EFFICIENCY);
        assert!(cfg.set_charge_efficiency(1.0));
        assert_eq!(cfg.charge_efficiency, 1.0);
    }

    #[test]
    fn validated_heals_efficiency_but_rejects_soc_window() {
        let cfg = BatteryConfig {
            charge_efficiency: -0.5,
            discharge_efficiency: f64::NAN,
            ..BatteryConfig::default()
        };
        let healed = cfg.validated().unwrap();
        assert_eq!(healed.charge_efficiency, DEFAULT_CHARGE_EFFICIENCY);
        assert_eq!(healed.discharge_efficiency, DEFAULT_DISCHARGE_EFFICIENCY);

        let broken = BatteryConfig {
            min_soc_percent: 80.0,
            max_soc_percent: 20.0,
            ..BatteryConfig::default()
        };
        match broken.validated() {
            Err(SimError::InvalidConfig(errors)) => {
                assert!(errors.iter().any(|e| e.field == "battery.min_soc_percent"));
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn zero_capacity_is_allowed() {
        let cfg = BatteryConfig {
            capacity_kwh: 0.0,
            ..BatteryConfig::default()
        };
        assert!(cfg.problems("battery").is_empty());
        assert_eq!(cfg.max_soc_kwh(), 0.0);
    }

    #[test]
    fn negative_rates_are_rejected() {
        let cfg = BatteryConfig {
            max_charge_rate_kw: -1.0,
            ..BatteryConfig::default()
        };
        let errors = cfg.problems("battery");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "battery.max_charge_rate_kw");
    }

    #[test]
    fn check_sequence_accepts_ascending() {
        let records: Vec<_> = (0..4)
            .map(|i| IntervalRecord::new(at(i * 15), 0.0, 0.0, 0.0))
            .collect();
        assert!(check_sequence(&records, &SimConfig::default()).is_ok());
    }

    #[test]
    fn check_sequence_rejects_duplicates() {
        let records = vec![
            IntervalRecord::new(at(0), 0.0, 0.0, 0.0),
            IntervalRecord::new(at(15), 0.0, 0.0, 0.0),
            IntervalRecord::new(at(15), 0.0, 0.0, 0.0),
        ];
        let err = check_sequence(&records, &SimConfig::default());
        assert!(matches!(err, Err(SimError::UnorderedRecords { index: 2, .. })));
    }

    #[test]
    fn check_sequence_tolerates_gaps() {
        let records = vec![
            IntervalRecord::new(at(0), 0.0, 0.0, 0.0),
            IntervalRecord::new(at(45), 0.0, 0.0, 0.0),
        ];
        assert!(check_sequence(&records, &SimConfig::default()).is_ok());
    }

    #[test]
    fn simulated_record_display_does_not_panic() {
        let r = SimulatedIntervalRecord {
            interval: IntervalRecord::new(at(0), 3.0, 0.0, 0.5),
            battery_soc_kwh: 1.2,
            battery_soc_percent: 12.0,
            battery_charge_kw: 2.0,
            battery_discharge_kw: 0.0,
            battery_loss_kw: 0.08,
            grid_import_with_battery: 0.0,
            grid_export_with_battery: 0.0,
        };
        assert!(!format!("{r}").is_empty());
    }
}
