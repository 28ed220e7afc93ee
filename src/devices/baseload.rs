use rand::{SeedableRng, rngs::StdRng};

use crate::devices::types::{Device, gaussian_noise};

/// Household consumption with a sinusoidal daily pattern and Gaussian noise.
///
/// # Examples
///
/// ```
/// use pv_battery_sim::devices::{BaseLoad, Device};
///
/// let mut load = BaseLoad::new(0.6, 0.3, 0.0, 0.0, 96, 42);
/// assert!(load.power_kw(0) >= 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BaseLoad {
    /// Mean consumption (kW).
    pub base_kw: f64,

    /// Amplitude of the daily variation (kW).
    pub amp_kw: f64,

    /// Phase offset of the daily sinusoid (radians).
    pub phase_rad: f64,

    /// Standard deviation of the additive noise (kW).
    pub noise_std: f64,

    pub steps_per_day: usize,

    rng: StdRng,
}

impl BaseLoad {
    pub fn new(
        base_kw: f64,
        amp_kw: f64,
        phase_rad: f64,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Device for BaseLoad {
    /// Demand at `step`; never negative.
    fn power_kw(&mut self, step: usize) -> f64 {
        let day_pos = (step % self.steps_per_day) as f64 / self.steps_per_day as f64;
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);

        (self.base_kw + self.amp_kw * angle.sin() + noise).max(0.0)
    }

    fn device_type(&self) -> &'static str {
        "BaseLoad"
    }
}
