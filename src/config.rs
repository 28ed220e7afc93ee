//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::error::{ConfigError, SimError};
use crate::sim::engine::Engine;
use crate::sim::tariff::{Currency, PricingTier};
use crate::sim::types::{BatteryConfig, InverterMode, SimConfig};

const MINUTES_PER_DAY: u32 = 24 * 60;
/// Longest synthetic profile, about ten years.
const MAX_PROFILE_DAYS: u32 = 3660;

/// Top-level scenario configuration parsed from TOML.
///
/// All sections have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
///
/// ```toml
/// [simulation]
/// interval_minutes = 15
///
/// [battery]
/// capacity_kwh = 13.5
/// inverter_mode = "symmetric"
/// currency = "EUR"
///
/// [profile]
/// start = "2025-06-01T00:00:00+02:00"
/// days = 7
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Interval cadence.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Battery parameters, inverter mode and billing currency.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Full tariff override; the currency default applies when absent.
    #[serde(default)]
    pub tariff: Option<PricingTier>,
    /// Synthetic input used when no metered CSV is given.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Interval cadence of the input data.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Minutes per interval; must divide a day evenly.
    pub interval_minutes: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
        }
    }
}

/// Shape of the synthetic household used in place of metered data.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// First interval start, as an RFC 3339 string.
    pub start: DateTime<FixedOffset>,
    /// Number of days to generate.
    pub days: u32,
    /// Master random seed.
    pub seed: u64,
    /// PV peak output (kW).
    pub solar_kw_peak: f64,
    /// Hour of day production starts.
    pub sunrise_hour: f64,
    /// Hour of day production stops.
    pub sunset_hour: f64,
    /// Relative PV noise.
    pub solar_noise_std: f64,
    /// Mean household load (kW).
    pub base_kw: f64,
    /// Daily load swing (kW).
    pub amp_kw: f64,
    /// Phase of the daily load sinusoid (radians).
    pub phase_rad: f64,
    /// Absolute load noise (kW).
    pub load_noise_std: f64,
    /// Share of each interval's self-consumed PV energy that the meter sees
    /// as simultaneous import and export, from swings inside the interval.
    /// At 0 every interval is pure import or pure export.
    pub mixed_share: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            start: DateTime::parse_from_rfc3339("2025-06-01T00:00:00+02:00").unwrap_or_default(),
            days: 7,
            seed: 42,
            solar_kw_peak: 6.0,
            sunrise_hour: 5.5,
            sunset_hour: 20.5,
            solar_noise_std: 0.1,
            base_kw: 0.6,
            amp_kw: 0.4,
            phase_rad: 3.5,
            load_noise_std: 0.1,
            mixed_share: 0.0,
        }
    }
}

impl ProfileConfig {
    /// Step of the day at which `hour` falls, rounded to the nearest interval.
    pub fn hour_to_step(hour: f64, sim: &SimConfig) -> usize {
        (hour * 60.0 / f64::from(sim.interval_minutes)).round().max(0.0) as usize
    }

    fn problems(&self, sim: &SimulationConfig) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.days == 0 || self.days > MAX_PROFILE_DAYS {
            errors.push(ConfigError::new(
                "profile.days",
                format!("must be in [1, {MAX_PROFILE_DAYS}]"),
            ));
        }
        if !(0.0..=1.0).contains(&self.mixed_share) {
            errors.push(ConfigError::new("profile.mixed_share", "must be in [0, 1]"));
        }

        let non_negative = [
            ("solar_kw_peak", self.solar_kw_peak),
            ("solar_noise_std", self.solar_noise_std),
            ("base_kw", self.base_kw),
            ("amp_kw", self.amp_kw),
            ("load_noise_std", self.load_noise_std),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(ConfigError::new(
                    format!("profile.{name}"),
                    "must be a finite value >= 0",
                ));
            }
        }
        if !self.phase_rad.is_finite() {
            errors.push(ConfigError::new("profile.phase_rad", "must be finite"));
        }

        if !(0.0..=24.0).contains(&self.sunrise_hour) {
            errors.push(ConfigError::new("profile.sunrise_hour", "must be in [0, 24]"));
        }
        if !(0.0..=24.0).contains(&self.sunset_hour) {
            errors.push(ConfigError::new("profile.sunset_hour", "must be in [0, 24]"));
        }
        if sim.is_valid() && errors.iter().all(|e| !e.field.ends_with("_hour")) {
            let sim = SimConfig::new(sim.interval_minutes);
            let sunrise = Self::hour_to_step(self.sunrise_hour, &sim);
            let sunset = Self::hour_to_step(self.sunset_hour, &sim);
            if sunrise >= sunset {
                errors.push(ConfigError::new(
                    "profile.sunrise_hour",
                    "must be at least one interval before profile.sunset_hour",
                ));
            }
        }

        errors
    }
}

impl SimulationConfig {
    fn is_valid(&self) -> bool {
        self.interval_minutes > 0 && MINUTES_PER_DAY % self.interval_minutes == 0
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 10 kWh battery, asymmetric inverter, HUF tariff.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the euro preset: 13.5 kWh battery billed with the EUR tariff.
    pub fn euro() -> Self {
        Self {
            battery: BatteryConfig {
                capacity_kwh: 13.5,
                currency: Currency::Eur,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the symmetric preset: baseline battery behind a symmetric inverter.
    ///
    /// The synthetic profile meters a share of self-consumption as mixed
    /// import and export, otherwise both inverter modes dispatch alike.
    pub fn symmetric() -> Self {
        Self {
            battery: BatteryConfig {
                inverter_mode: InverterMode::Symmetric,
                ..BatteryConfig::default()
            },
            profile: ProfileConfig {
                mixed_share: 0.15,
                ..ProfileConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "euro", "symmetric"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "euro" => Ok(Self::euro()),
            "symmetric" => Ok(Self::symmetric()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Io`] if the file cannot be read and
    /// [`SimError::Toml`] if the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, SimError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Toml`] if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(s)?)
    }

    /// Validates all sections and returns every problem found.
    ///
    /// Returns an empty vector if the configuration is valid. Out-of-range
    /// efficiencies are not reported: they are substituted when the engine
    /// is built.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !self.simulation.is_valid() {
            errors.push(ConfigError::new(
                "simulation.interval_minutes",
                "must be > 0 and divide 1440 evenly",
            ));
        }
        errors.extend(self.battery.problems("battery"));
        if let Some(tariff) = &self.tariff {
            errors.extend(tariff.problems("tariff"));
        }
        errors.extend(self.profile.problems(&self.simulation));

        errors
    }

    /// Interval cadence.
    ///
    /// Call only after [`ScenarioConfig::validate`] came back empty.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new(self.simulation.interval_minutes.max(1))
    }

    /// The `[tariff]` override, or the currency's default tier.
    pub fn pricing_tier(&self) -> PricingTier {
        self.tariff.unwrap_or_else(|| self.battery.currency.default_tier())
    }

    /// Validates the scenario and builds a ready-to-run engine.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] with every validation problem.
    pub fn engine(&self) -> Result<Engine, SimError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(SimError::InvalidConfig(errors));
        }
        Engine::new(self.sim_config(), self.battery.clone(), self.pricing_tier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        let e = err.unwrap_err();
        assert_eq!(e.field, "preset");
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn presets_differ_where_named() {
        assert_eq!(ScenarioConfig::baseline().battery.currency, Currency::Huf);
        assert_eq!(ScenarioConfig::euro().battery.currency, Currency::Eur);
        assert_eq!(ScenarioConfig::euro().battery.capacity_kwh, 13.5);
        assert_eq!(
            ScenarioConfig::symmetric().battery.inverter_mode,
            InverterMode::Symmetric
        );
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
interval_minutes = 60

[battery]
capacity_kwh = 13.5
charge_efficiency = 0.95
discharge_efficiency = 0.95
max_charge_rate_kw = 4.0
max_discharge_rate_kw = 4.0
min_soc_percent = 5.0
max_soc_percent = 95.0
inverter_mode = "symmetric"
currency = "EUR"

[tariff]
tier1_import_price = 0.12
tier2_import_price = 0.25
export_price = 0.05
tier1_limit_kwh = 1000.0

[profile]
start = "2025-01-01T00:00:00+01:00"
days = 2
seed = 99
solar_kw_peak = 8.0
sunrise_hour = 8.0
sunset_hour = 16.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert!(cfg.validate().is_empty());
        assert_eq!(cfg.sim_config().dt_hours, 1.0);
        assert_eq!(cfg.battery.inverter_mode, InverterMode::Symmetric);
        assert_eq!(cfg.battery.currency, Currency::Eur);
        assert_eq!(cfg.pricing_tier().tier1_limit_kwh, 1000.0);
        assert_eq!(cfg.profile.days, 2);
        assert_eq!(cfg.profile.start.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
interval_minutes = 15
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(matches!(result, Err(SimError::Toml(_))));
    }

    #[test]
    fn partial_tariff_is_rejected() {
        let toml = r#"
[tariff]
tier1_import_price = 0.12
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[profile]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.profile.seed, 99);
        assert_eq!(cfg.simulation.interval_minutes, 15);
        assert_eq!(cfg.battery.capacity_kwh, 10.0);
        assert_eq!(cfg.pricing_tier(), Currency::Huf.default_tier());
    }

    #[test]
    fn validation_catches_bad_interval() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.interval_minutes = 7;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.interval_minutes"));
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.capacity_kwh = -1.0;
        cfg.battery.min_soc_percent = 120.0;
        cfg.profile.days = 0;
        cfg.profile.sunrise_hour = 30.0;
        let errors = cfg.validate();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"battery.capacity_kwh"));
        assert!(fields.contains(&"battery.min_soc_percent"));
        assert!(fields.contains(&"profile.days"));
        assert!(fields.contains(&"profile.sunrise_hour"));
    }

    #[test]
    fn profile_days_are_capped() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.profile.days = u32::MAX;
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "profile.days");

        cfg.profile.days = MAX_PROFILE_DAYS;
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn mixed_share_must_be_a_fraction() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.profile.mixed_share = 1.5;
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, ["profile.mixed_share"]);
    }

    #[test]
    fn sunrise_must_precede_sunset() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.profile.sunrise_hour = 18.0;
        cfg.profile.sunset_hour = 6.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "profile.sunrise_hour"));
    }

    #[test]
    fn engine_refuses_invalid_scenario() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.profile.days = 0;
        assert!(matches!(cfg.engine(), Err(SimError::InvalidConfig(_))));
        assert!(ScenarioConfig::euro().engine().is_ok());
    }

    #[test]
    fn from_toml_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        fs::write(&path, "[battery]\ncapacity_kwh = 5.0\n").unwrap();
        let cfg = ScenarioConfig::from_toml_file(&path).unwrap();
        assert_eq!(cfg.battery.capacity_kwh, 5.0);

        let missing = ScenarioConfig::from_toml_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(SimError::Io(_))));
    }
}
