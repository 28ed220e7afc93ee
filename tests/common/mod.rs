//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};

use pv_battery_sim::config::ProfileConfig;
use pv_battery_sim::scenario::synthetic_records;
use pv_battery_sim::sim::types::{BatteryConfig, IntervalRecord, SimConfig};

/// Quarter-hour cadence.
pub fn default_config() -> SimConfig {
    SimConfig::default()
}

/// Interval start `step` quarter-hours after 2025-06-01 00:00 (+02:00).
pub fn at(step: i64) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    offset.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(15 * step)
}

/// Two noiseless synthetic days starting at [`at`]`(0)`.
pub fn two_days() -> Vec<IntervalRecord> {
    let profile = ProfileConfig {
        start: at(0),
        days: 2,
        solar_noise_std: 0.0,
        load_noise_std: 0.0,
        ..ProfileConfig::default()
    };
    synthetic_records(&profile, &default_config())
}

/// Default battery (10 kWh, 10–90 % window, 5 kW both ways, 0.96 / 0.92).
pub fn default_battery() -> BatteryConfig {
    BatteryConfig::default()
}

/// A battery that can never move energy.
pub fn no_battery() -> BatteryConfig {
    BatteryConfig {
        capacity_kwh: 0.0,
        ..BatteryConfig::default()
    }
}

pub const HEADER: &str = "timestamp,production_kw,import_kwh,export_kwh";

/// Renders records in the import CSV layout.
pub fn to_csv(records: &[IntervalRecord]) -> String {
    let mut out = format!("{HEADER}\n");
    for r in records {
        out.push_str(&format!(
            "{},{},{},{}\n",
            r.timestamp.to_rfc3339(),
            r.production_kw,
            r.import_kwh,
            r.export_kwh
        ));
    }
    out
}
