use rand::{SeedableRng, rngs::StdRng};

use crate::devices::types::{Device, daylight_frac, gaussian_noise};
use crate::sim::types::SimConfig;

/// A rooftop PV array with a half-cosine daylight profile.
///
/// Output is the peak power scaled by the daylight fraction and a
/// multiplicative noise term, clamped at zero. Production is reported
/// as a positive value, the way the inverter meter logs it.
#[derive(Debug, Clone)]
pub struct SolarPv {
    /// Peak output under clear-sky conditions (kW).
    pub kw_peak: f64,

    steps_per_day: usize,

    /// Step of the day when production starts (inclusive).
    pub sunrise_idx: usize,

    /// Step of the day when production stops (exclusive).
    pub sunset_idx: usize,

    /// Relative standard deviation of the output noise.
    pub noise_std: f64,

    rng: StdRng,
}

impl SolarPv {
    /// Creates a PV array.
    ///
    /// Negative `kw_peak` and `noise_std` are clamped to zero.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_idx >= sunset_idx` or `sunset_idx` exceeds the
    /// steps of one day. Scenario validation rejects both first.
    pub fn new(
        kw_peak: f64,
        sunrise_idx: usize,
        sunset_idx: usize,
        noise_std: f64,
        config: &SimConfig,
        seed: u64,
    ) -> Self {
        let steps_per_day = config.steps_per_day();
        assert!(sunrise_idx < sunset_idx && sunset_idx <= steps_per_day);
        Self {
            kw_peak: kw_peak.max(0.0),
            steps_per_day,
            sunrise_idx,
            sunset_idx,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn daylight_frac(&self, step: usize) -> f64 {
        daylight_frac(step, self.steps_per_day, self.sunrise_idx, self.sunset_idx)
    }
}

impl Device for SolarPv {
    fn power_kw(&mut self, step: usize) -> f64 {
        let frac = self.daylight_frac(step);
        if frac <= 0.0 {
            return 0.0;
        }

        let noise_mult = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (self.kw_peak * frac * noise_mult).max(0.0)
    }

    fn device_type(&self) -> &'static str {
        "SolarPV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimConfig {
        SimConfig::new(60)
    }

    #[test]
    fn test_new_solar_pv() {
        let pv = SolarPv::new(5.0, 6, 18, 0.05, &cfg(), 42);
        assert_eq!(pv.kw_peak, 5.0);
        assert_eq!(pv.steps_per_day, 24);
        assert_eq!(pv.sunrise_idx, 6);
        assert_eq!(pv.sunset_idx, 18);
        assert_eq!(pv.device_type(), "SolarPV");
    }

    #[test]
    fn test_negative_parameters_clamped_to_zero() {
        let pv = SolarPv::new(-1.0, 6, 18, -0.05, &cfg(), 42);
        assert_eq!(pv.kw_peak, 0.0);
        assert_eq!(pv.noise_std, 0.0);
    }

    #[test]
    #[should_panic]
    fn test_sunset_before_sunrise_panics() {
        SolarPv::new(5.0, 18, 6, 0.05, &cfg(), 42);
    }

    #[test]
    #[should_panic]
    fn test_sunset_exceeds_steps_panics() {
        SolarPv::new(5.0, 6, 25, 0.05, &cfg(), 42);
    }

    #[test]
    fn test_no_generation_at_night() {
        let mut pv = SolarPv::new(5.0, 6, 18, 0.0, &cfg(), 42);
        for t in [0, 5, 18, 23] {
            assert_eq!(pv.power_kw(t), 0.0);
        }
    }

    #[test]
    fn test_peak_generation_at_noon() {
        let mut pv = SolarPv::new(5.0, 6, 18, 0.0, &cfg(), 42);
        let noon = pv.power_kw(12);
        assert!(noon > 4.9 && noon <= 5.0);
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let mut pv1 = SolarPv::new(5.0, 6, 18, 0.1, &cfg(), 42);
        let mut pv2 = SolarPv::new(5.0, 6, 18, 0.1, &cfg(), 42);
        for t in 0..48 {
            assert_eq!(pv1.power_kw(t), pv2.power_kw(t));
        }
    }

    #[test]
    fn test_never_negative() {
        let mut pv = SolarPv::new(5.0, 6, 18, 0.8, &cfg(), 3);
        for t in 0..96 {
            assert!(pv.power_kw(t) >= 0.0);
        }
    }
}
