//! Common trait and helpers for the synthetic profile generators.

use rand::{Rng, rngs::StdRng};

/// A household device whose power can be sampled step by step.
///
/// Both producers and consumers report non-negative power: the sign is
/// implied by the role the device plays when the scenario nets them.
pub trait Device {
    /// Returns the average power (kW) over the given time step.
    ///
    /// Steps must be requested in order; noise is drawn from the device's
    /// own seeded RNG on every call.
    fn power_kw(&mut self, step: usize) -> f64;

    /// Returns a human-readable type name for the device.
    fn device_type(&self) -> &'static str;
}

/// Zero-mean Gaussian noise via the Box-Muller transform.
///
/// Returns 0 when `std_dev` is not positive, without consuming randomness.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Half-cosine daylight shape in `[0, 1]` for `step`, repeating every `steps_per_day`.
///
/// Zero outside `[sunrise_idx, sunset_idx)`, peaking midway between the two.
pub fn daylight_frac(
    step: usize,
    steps_per_day: usize,
    sunrise_idx: usize,
    sunset_idx: usize,
) -> f64 {
    let t = step % steps_per_day.max(1);
    if t < sunrise_idx || t >= sunset_idx {
        return 0.0;
    }
    let span = (sunset_idx - sunrise_idx) as f64;
    let x = (t - sunrise_idx) as f64 / span;
    (std::f64::consts::PI * x).sin().max(0.0)
}
