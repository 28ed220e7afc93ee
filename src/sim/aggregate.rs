//! Calendar bucketing of interval records (daily or monthly).
//!
//! Energy flows are additive across time and are summed; rates and
//! state-of-charge values are not, so they are averaged.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::types::{IntervalRecord, SimulatedIntervalRecord};
use crate::error::{ConfigError, SimError};

/// Bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Bucketing {
    Daily,
    Monthly,
}

impl Bucketing {
    /// Calendar date of the bucket `timestamp` falls into, in its own offset.
    pub fn key(self, timestamp: &DateTime<FixedOffset>) -> NaiveDate {
        let date = timestamp.date_naive();
        match self {
            Self::Daily => date,
            Self::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for Bucketing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::Monthly => f.write_str("monthly"),
        }
    }
}

/// Numeric record fields that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ProductionKw,
    ImportKwh,
    ExportKwh,
    BatterySocKwh,
    BatterySocPercent,
    BatteryChargeKw,
    BatteryDischargeKw,
    BatteryLossKw,
    GridImportWithBattery,
    GridExportWithBattery,
}

impl Field {
    /// Column name used in CSV exports.
    pub fn name(self) -> &'static str {
        match self {
            Self::ProductionKw => "production_kw",
            Self::ImportKwh => "import_kwh",
            Self::ExportKwh => "export_kwh",
            Self::BatterySocKwh => "battery_soc_kwh",
            Self::BatterySocPercent => "battery_soc_percent",
            Self::BatteryChargeKw => "battery_charge_kw",
            Self::BatteryDischargeKw => "battery_discharge_kw",
            Self::BatteryLossKw => "battery_loss_kw",
            Self::GridImportWithBattery => "grid_import_with_battery",
            Self::GridExportWithBattery => "grid_export_with_battery",
        }
    }
}

/// A record that can be placed into a calendar bucket.
pub trait Bucketed {
    fn timestamp(&self) -> DateTime<FixedOffset>;

    /// Value of `field`, or `None` if this record type does not carry it.
    fn field(&self, field: Field) -> Option<f64>;
}

impl Bucketed for IntervalRecord {
    fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    fn field(&self, field: Field) -> Option<f64> {
        match field {
            Field::ProductionKw => Some(self.production_kw),
            Field::ImportKwh => Some(self.import_kwh),
            Field::ExportKwh => Some(self.export_kwh),
            _ => None,
        }
    }
}

impl Bucketed for SimulatedIntervalRecord {
    fn timestamp(&self) -> DateTime<FixedOffset> {
        self.interval.timestamp
    }

    fn field(&self, field: Field) -> Option<f64> {
        match field {
            Field::ProductionKw | Field::ImportKwh | Field::ExportKwh => {
                self.interval.field(field)
            }
            Field::BatterySocKwh => Some(self.battery_soc_kwh),
            Field::BatterySocPercent => Some(self.battery_soc_percent),
            Field::BatteryChargeKw => Some(self.battery_charge_kw),
            Field::BatteryDischargeKw => Some(self.battery_discharge_kw),
            Field::BatteryLossKw => Some(self.battery_loss_kw),
            Field::GridImportWithBattery => Some(self.grid_import_with_battery),
            Field::GridExportWithBattery => Some(self.grid_export_with_battery),
        }
    }
}

/// Which fields are summed and which are averaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub sum: Vec<Field>,
    pub average: Vec<Field>,
}

impl FieldSpec {
    /// Sums every kWh flow and averages every kW rate and SoC value.
    pub fn energy_flows() -> Self {
        Self {
            sum: vec![
                Field::ImportKwh,
                Field::ExportKwh,
                Field::GridImportWithBattery,
                Field::GridExportWithBattery,
            ],
            average: vec![
                Field::ProductionKw,
                Field::BatterySocKwh,
                Field::BatterySocPercent,
                Field::BatteryChargeKw,
                Field::BatteryDischargeKw,
                Field::BatteryLossKw,
            ],
        }
    }
}

impl FieldSpec {
    /// Fields listed under both `sum` and `average`.
    pub fn problems(&self) -> Vec<ConfigError> {
        let average: BTreeSet<Field> = self.average.iter().copied().collect();
        self.sum
            .iter()
            .copied()
            .filter(|field| average.contains(field))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|field| {
                ConfigError::new(
                    format!("fields.{}", field.name()),
                    "cannot be both summed and averaged",
                )
            })
            .collect()
    }

    /// Every requested field once, summed fields first, in declaration order.
    pub fn columns(&self) -> Vec<Field> {
        let mut seen = BTreeSet::new();
        self.sum
            .iter()
            .chain(&self.average)
            .copied()
            .filter(|&field| seen.insert(field))
            .collect()
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::energy_flows()
    }
}

/// One calendar bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    /// Midnight at the start of the bucket, in the offset of its first record.
    pub start: DateTime<FixedOffset>,
    /// Number of input records in the bucket.
    pub samples: usize,
    /// Aggregated value per requested field.
    pub values: BTreeMap<Field, f64>,
}

impl Bucket {
    /// Aggregated value of `field`, 0 if it was not requested.
    pub fn get(&self, field: Field) -> f64 {
        self.values.get(&field).copied().unwrap_or(0.0)
    }

    /// Rolls the bucket back into the simulated record shape.
    pub fn to_simulated_record(&self) -> SimulatedIntervalRecord {
        SimulatedIntervalRecord {
            interval: IntervalRecord::new(
                self.start,
                self.get(Field::ProductionKw),
                self.get(Field::ImportKwh),
                self.get(Field::ExportKwh),
            ),
            battery_soc_kwh: self.get(Field::BatterySocKwh),
            battery_soc_percent: self.get(Field::BatterySocPercent),
            battery_charge_kw: self.get(Field::BatteryChargeKw),
            battery_discharge_kw: self.get(Field::BatteryDischargeKw),
            battery_loss_kw: self.get(Field::BatteryLossKw),
            grid_import_with_battery: self.get(Field::GridImportWithBattery),
            grid_export_with_battery: self.get(Field::GridExportWithBattery),
        }
    }
}

struct Accumulator {
    start: DateTime<FixedOffset>,
    samples: usize,
    sums: BTreeMap<Field, f64>,
}

/// Collapses `records` into one bucket per distinct calendar day or month,
/// ordered by bucket start.
///
/// A field listed twice in the same list is aggregated once. A field a record
/// does not carry contributes 0 to both sums and averages; averages always
/// divide by the bucket's record count.
///
/// # Errors
///
/// Returns [`SimError::InvalidConfig`] if a field is listed under both `sum`
/// and `average`.
pub fn aggregate<R: Bucketed>(
    records: &[R],
    bucketing: Bucketing,
    fields: &FieldSpec,
) -> Result<Vec<Bucket>, SimError> {
    let errors = fields.problems();
    if !errors.is_empty() {
        return Err(SimError::InvalidConfig(errors));
    }
    Ok(collapse(records, bucketing, fields))
}

fn collapse<R: Bucketed>(records: &[R], bucketing: Bucketing, fields: &FieldSpec) -> Vec<Bucket> {
    let averaged: BTreeSet<Field> = fields.average.iter().copied().collect();
    let columns = fields.columns();
    let mut buckets: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();

    for record in records {
        let timestamp = record.timestamp();
        let key = bucketing.key(&timestamp);
        let acc = buckets.entry(key).or_insert_with(|| Accumulator {
            start: key
                .and_hms_opt(0, 0, 0)
                .and_then(|midnight| midnight.and_local_timezone(*timestamp.offset()).single())
                .unwrap_or(timestamp),
            samples: 0,
            sums: BTreeMap::new(),
        });

        acc.samples += 1;
        for &field in &columns {
            *acc.sums.entry(field).or_insert(0.0) += record.field(field).unwrap_or(0.0);
        }
    }

    buckets
        .into_values()
        .map(|acc| {
            let samples = acc.samples as f64;
            let values = acc
                .sums
                .into_iter()
                .map(|(field, total)| {
                    let value = if averaged.contains(&field) { total / samples } else { total };
                    (field, value)
                })
                .collect();
            Bucket {
                start: acc.start,
                samples: acc.samples,
                values,
            }
        })
        .collect()
}

/// Aggregates simulated records with [`FieldSpec::energy_flows`] and returns
/// them in record shape.
pub fn aggregate_simulated(
    records: &[SimulatedIntervalRecord],
    bucketing: Bucketing,
) -> Vec<SimulatedIntervalRecord> {
    collapse(records, bucketing, &FieldSpec::energy_flows())
        .iter()
        .map(Bucket::to_simulated_record)
        .collect()
}
