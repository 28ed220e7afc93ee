//! Tiered import tariff, flat export credit, and savings calculation.
//!
//! The tier boundary is a cumulative import threshold over the whole
//! simulated window. Cumulative import never resets within one run, so the
//! boundary is crossed at most once and interval order matters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SimError};
use crate::sim::metrics::percent_of;

/// Billing currency; each one carries a default [`PricingTier`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Currency {
    #[default]
    #[serde(rename = "HUF")]
    #[value(name = "HUF")]
    Huf,
    #[serde(rename = "EUR")]
    #[value(name = "EUR")]
    Eur,
}

impl Currency {
    /// Default tariff for this currency.
    pub fn default_tier(self) -> PricingTier {
        match self {
            Self::Huf => PricingTier {
                tier1_import_price: 36.0,
                tier2_import_price: 70.104,
                export_price: 5.0,
                tier1_limit_kwh: 2523.0,
            },
            Self::Eur => PricingTier {
                tier1_import_price: 0.10,
                tier2_import_price: 0.20,
                export_price: 0.03,
                tier1_limit_kwh: 2523.0,
            },
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Huf => "Ft",
            Self::Eur => "€",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Huf => f.write_str("HUF"),
            Self::Eur => f.write_str("EUR"),
        }
    }
}

/// Unit prices of a two-tier import tariff with a flat export credit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingTier {
    /// Price per kWh while cumulative import is below `tier1_limit_kwh`.
    pub tier1_import_price: f64,
    /// Price per kWh above the limit.
    pub tier2_import_price: f64,
    /// Credit per exported kWh.
    pub export_price: f64,
    /// Cumulative import (kWh) at which the unit price steps up.
    pub tier1_limit_kwh: f64,
}

impl PricingTier {
    /// Range checks; `section` prefixes the field paths.
    pub fn problems(&self, section: &str) -> Vec<ConfigError> {
        let checks = [
            ("tier1_import_price", self.tier1_import_price),
            ("tier2_import_price", self.tier2_import_price),
            ("export_price", self.export_price),
            ("tier1_limit_kwh", self.tier1_limit_kwh),
        ];
        checks
            .into_iter()
            .filter(|(_, value)| !(value.is_finite() && *value >= 0.0))
            .map(|(name, _)| {
                ConfigError::new(format!("{section}.{name}"), "must be a finite value >= 0")
            })
            .collect()
    }
}

/// Itemised cost of one series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub tier1_kwh: f64,
    pub tier1_cost: f64,
    pub tier2_kwh: f64,
    pub tier2_cost: f64,
    pub export_kwh: f64,
    pub export_credit: f64,
    /// `tier1_cost + tier2_cost - export_credit`.
    pub total: f64,
}

/// Running tariff state for one series.
///
/// Feed intervals in order with [`TariffMeter::bill`]; an interval that
/// crosses the tier boundary is split at the exact boundary.
#[derive(Debug, Clone)]
pub struct TariffMeter {
    tier: PricingTier,
    cumulative_import_kwh: f64,
    breakdown: CostBreakdown,
}

impl TariffMeter {
    pub fn new(tier: PricingTier) -> Self {
        Self {
            tier,
            cumulative_import_kwh: 0.0,
            breakdown: CostBreakdown::default(),
        }
    }

    /// Bills one interval and returns its cost (negative when the export
    /// credit outweighs the import).
    pub fn bill(&mut self, import_kwh: f64, export_kwh: f64) -> f64 {
        let before = self.cumulative_import_kwh;
        let after = before + import_kwh;
        let limit = self.tier.tier1_limit_kwh;

        let (tier1_kwh, tier2_kwh) = if after <= limit {
            (import_kwh, 0.0)
        } else if before >= limit {
            (0.0, import_kwh)
        } else {
            let tier1_kwh = limit - before;
            (tier1_kwh, import_kwh - tier1_kwh)
        };

        let tier1_cost = tier1_kwh * self.tier.tier1_import_price;
        let tier2_cost = tier2_kwh * self.tier.tier2_import_price;
        let export_credit = export_kwh * self.tier.export_price;
        let cost = tier1_cost + tier2_cost - export_credit;

        self.cumulative_import_kwh = after;
        let b = &mut self.breakdown;
        b.tier1_kwh += tier1_kwh;
        b.tier1_cost += tier1_cost;
        b.tier2_kwh += tier2_kwh;
        b.tier2_cost += tier2_cost;
        b.export_kwh += export_kwh;
        b.export_credit += export_credit;
        b.total += cost;

        cost
    }

    pub fn cumulative_import_kwh(&self) -> f64 {
        self.cumulative_import_kwh
    }

    pub fn finish(self) -> CostBreakdown {
        self.breakdown
    }
}

/// Computes the tiered cost of parallel per-interval import/export series.
///
/// # Errors
///
/// Returns [`SimError::SeriesLengthMismatch`] if the series differ in length.
pub fn cost(
    imports_kwh: &[f64],
    exports_kwh: &[f64],
    tier: &PricingTier,
) -> Result<CostBreakdown, SimError> {
    if imports_kwh.len() != exports_kwh.len() {
        return Err(SimError::SeriesLengthMismatch {
            imports: imports_kwh.len(),
            exports: exports_kwh.len(),
        });
    }

    let mut meter = TariffMeter::new(*tier);
    for (&import_kwh, &export_kwh) in imports_kwh.iter().zip(exports_kwh) {
        meter.bill(import_kwh, export_kwh);
    }
    Ok(meter.finish())
}

/// Baseline vs battery cost comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialResult {
    pub baseline_cost: f64,
    pub battery_cost: f64,
    /// `baseline_cost - battery_cost`.
    pub total_savings: f64,
    /// Savings relative to the baseline cost (0 when the baseline cost is 0).
    pub savings_percent: f64,
    pub currency: Currency,
    pub baseline_breakdown: CostBreakdown,
    pub battery_breakdown: CostBreakdown,
}

impl FinancialResult {
    pub fn new(baseline: CostBreakdown, battery: CostBreakdown, currency: Currency) -> Self {
        let total_savings = baseline.total - battery.total;
        Self {
            baseline_cost: baseline.total,
            battery_cost: battery.total,
            total_savings,
            savings_percent: percent_of(total_savings, baseline.total),
            currency,
            baseline_breakdown: baseline,
            battery_breakdown: battery,
        }
    }
}

impl fmt::Display for FinancialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.currency.symbol();
        writeln!(f, "--- Financials ({}) ---", self.currency)?;
        writeln!(f, "Cost without battery:  {:.2} {symbol}", self.baseline_cost)?;
        writeln!(f, "Cost with battery:     {:.2} {symbol}", self.battery_cost)?;
        write!(
            f,
            "Total savings:         {:.2} {symbol} ({:.1}%)",
            self.total_savings, self.savings_percent
        )
    }
}
