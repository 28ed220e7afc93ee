use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{ArgGroup, Parser};

use pv_battery_sim::config::ScenarioConfig;
use pv_battery_sim::sim::aggregate::Bucketing;
use pv_battery_sim::sim::types::InverterMode;

#[derive(Debug, Parser)]
#[command(name = "pv-battery-sim", author, version)]
#[command(about = "Replays metered PV intervals through a simulated home battery")]
#[command(group(ArgGroup::new("source").args(["scenario", "preset"])))]
pub struct Args {
    /// Scenario TOML file.
    #[arg(long, value_name = "TOML")]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario (baseline, euro, symmetric).
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(ScenarioConfig::PRESETS.iter().copied())
    )]
    pub preset: Option<String>,

    /// Metered intervals CSV; the scenario profile is synthesised when omitted.
    #[arg(long, value_name = "CSV", env = "PV_BATTERY_SIM_INPUT")]
    pub input: Option<PathBuf>,

    /// Overrides `profile.seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Overrides `battery.capacity_kwh`.
    #[arg(long)]
    pub capacity_kwh: Option<f64>,

    /// Overrides `battery.inverter_mode`.
    #[arg(long, value_enum)]
    pub inverter_mode: Option<InverterMode>,

    /// Writes every simulated interval to this CSV.
    #[arg(long, value_name = "CSV")]
    pub telemetry_out: Option<PathBuf>,

    /// Bucket width for `--buckets-out`.
    #[arg(long, value_enum, default_value_t = Bucketing::Daily)]
    pub bucket: Bucketing,

    /// Writes aggregated buckets to this CSV.
    #[arg(long, value_name = "CSV")]
    pub buckets_out: Option<PathBuf>,

    /// Serves the finished run over HTTP.
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// Port for `--serve`.
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

impl Args {
    /// Applies the command-line overrides on top of `scenario`.
    pub fn apply_overrides(&self, scenario: &mut ScenarioConfig) {
        if let Some(seed) = self.seed {
            scenario.profile.seed = seed;
        }
        if let Some(capacity_kwh) = self.capacity_kwh {
            scenario.battery.capacity_kwh = capacity_kwh;
        }
        if let Some(mode) = self.inverter_mode {
            scenario.battery.inverter_mode = mode;
        }
    }
}
