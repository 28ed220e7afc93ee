//! Battery model and the synthetic household profile generators.

/// Household base-load profile generator.
pub mod baseload;
/// Stationary battery storage model.
pub mod battery;
/// Rooftop PV profile generator.
pub mod solar;
pub mod types;

pub use baseload::BaseLoad;
pub use battery::{Battery, Transfer};
pub use solar::SolarPv;
pub use types::Device;
