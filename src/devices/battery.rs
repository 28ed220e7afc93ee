use crate::sim::types::{BatteryConfig, SimConfig};

/// A battery energy storage system tracked over one simulation pass.
///
/// `Battery` holds the running state of charge (SoC) in kWh and enforces the
/// SoC window and per-interval energy limits derived from a [`BatteryConfig`].
/// It starts at the lower SoC bound.
///
/// Conversion losses are destroyed energy: they are never stored, never
/// delivered, and never re-added to the grid flows.
#[derive(Debug, Clone)]
pub struct Battery {
    /// Battery capacity in kilowatt-hours.
    pub capacity_kwh: f64,

    /// Stored energy in kilowatt-hours.
    pub soc_kwh: f64,

    /// Lower SoC bound in kilowatt-hours.
    pub min_soc_kwh: f64,

    /// Upper SoC bound in kilowatt-hours.
    pub max_soc_kwh: f64,

    /// Grid-side energy that may be drawn for charging in one interval.
    max_charge_kwh: f64,

    /// Energy that may be withdrawn from storage in one interval.
    max_discharge_kwh: f64,

    /// Charging efficiency (0..1.0).
    eta_c: f64,

    /// Discharging efficiency (0..1.0).
    eta_d: f64,
}

/// Energy moved by one `charge` or `discharge` call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transfer {
    /// Energy crossing the battery terminals: drawn from the surplus when
    /// charging, withdrawn from storage when discharging.
    pub terminal_kwh: f64,
    /// Energy that ends up useful: stored when charging, delivered to the
    /// load when discharging.
    pub effective_kwh: f64,
    /// `terminal_kwh - effective_kwh`.
    pub loss_kwh: f64,
}

impl Battery {
    /// Creates a battery at its lower SoC bound.
    ///
    /// The configuration is expected to have gone through
    /// [`BatteryConfig::validated`].
    pub fn new(config: &BatteryConfig, sim: &SimConfig) -> Self {
        let min_soc_kwh = config.min_soc_kwh();
        Self {
            capacity_kwh: config.capacity_kwh,
            soc_kwh: min_soc_kwh,
            min_soc_kwh,
            max_soc_kwh: config.max_soc_kwh(),
            max_charge_kwh: config.max_charge_rate_kw * sim.dt_hours,
            max_discharge_kwh: config.max_discharge_rate_kw * sim.dt_hours,
            eta_c: config.charge_efficiency,
            eta_d: config.discharge_efficiency,
        }
    }

    /// Room left below the upper bound, never negative.
    pub fn headroom_kwh(&self) -> f64 {
        (self.max_soc_kwh - self.soc_kwh).max(0.0)
    }

    /// Energy left above the lower bound, never negative.
    pub fn available_kwh(&self) -> f64 {
        (self.soc_kwh - self.min_soc_kwh).max(0.0)
    }

    /// SoC as a percentage of capacity (0 for a zero-capacity battery).
    pub fn soc_percent(&self) -> f64 {
        if self.capacity_kwh > 0.0 {
            self.soc_kwh / self.capacity_kwh * 100.0
        } else {
            0.0
        }
    }

    /// Charges from `surplus_kwh` of excess energy.
    ///
    /// The drawn energy is limited by the per-interval charge limit and by
    /// the headroom; only `eta_c` of it is stored.
    pub fn charge(&mut self, surplus_kwh: f64) -> Transfer {
        let drawn = surplus_kwh.min(self.max_charge_kwh).min(self.headroom_kwh()).max(0.0);
        if drawn <= 0.0 {
            return Transfer::default();
        }

        let stored = drawn * self.eta_c;
        self.soc_kwh += stored;

        Transfer {
            terminal_kwh: drawn,
            effective_kwh: stored,
            loss_kwh: drawn - stored,
        }
    }

    /// Discharges to cover `deficit_kwh` of missing energy.
    ///
    /// The withdrawn energy is limited by the per-interval discharge limit
    /// and by the energy above the lower bound; only `eta_d` of it is delivered.
    pub fn discharge(&mut self, deficit_kwh: f64) -> Transfer {
        let withdrawn = deficit_kwh
            .min(self.max_discharge_kwh)
            .min(self.available_kwh())
            .max(0.0);
        if withdrawn <= 0.0 {
            return Transfer::default();
        }

        let delivered = withdrawn * self.eta_d;
        self.soc_kwh -= withdrawn;

        Transfer {
            terminal_kwh: withdrawn,
            effective_kwh: delivered,
            loss_kwh: withdrawn - delivered,
        }
    }
}
