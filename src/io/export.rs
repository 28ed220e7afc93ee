//! CSV export for simulated intervals and aggregated buckets.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::SimError;
use crate::sim::aggregate::{Bucket, FieldSpec};
use crate::sim::types::SimulatedIntervalRecord;

/// Column header for per-interval telemetry export.
pub const HEADER: &str = "timestamp,production_kw,import_kwh,export_kwh,\
                          battery_soc_kwh,battery_soc_percent,battery_charge_kw,\
                          battery_discharge_kw,battery_loss_kw,\
                          grid_import_with_battery,grid_export_with_battery";

/// Exports simulated records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per interval. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns [`SimError::Io`] if the file cannot be created and
/// [`SimError::Csv`] if writing fails.
pub fn export_csv(records: &[SimulatedIntervalRecord], path: &Path) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_csv(records, io::BufWriter::new(file))
}

/// Writes simulated records as CSV to any writer.
///
/// # Errors
///
/// Returns [`SimError::Csv`] if writing fails.
pub fn write_csv(records: &[SimulatedIntervalRecord], writer: impl Write) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.interval.timestamp.to_rfc3339(),
            format!("{:.4}", r.interval.production_kw),
            format!("{:.4}", r.interval.import_kwh),
            format!("{:.4}", r.interval.export_kwh),
            format!("{:.4}", r.battery_soc_kwh),
            format!("{:.2}", r.battery_soc_percent),
            format!("{:.4}", r.battery_charge_kw),
            format!("{:.4}", r.battery_discharge_kw),
            format!("{:.4}", r.battery_loss_kw),
            format!("{:.4}", r.grid_import_with_battery),
            format!("{:.4}", r.grid_export_with_battery),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports aggregated buckets to a CSV file at the given path.
///
/// # Errors
///
/// See [`export_csv`].
pub fn export_buckets_csv(
    buckets: &[Bucket],
    spec: &FieldSpec,
    path: &Path,
) -> Result<(), SimError> {
    let file = File::create(path)?;
    write_buckets_csv(buckets, spec, io::BufWriter::new(file))
}

/// Writes one row per bucket: start, sample count, then every field in `spec`
/// (summed fields first, in declaration order, each once).
///
/// # Errors
///
/// Returns [`SimError::Csv`] if writing fails.
pub fn write_buckets_csv(
    buckets: &[Bucket],
    spec: &FieldSpec,
    writer: impl Write,
) -> Result<(), SimError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    let fields = spec.columns();

    let mut header = vec!["start".to_string(), "samples".to_string()];
    header.extend(fields.iter().map(|f| f.name().to_string()));
    wtr.write_record(&header)?;

    for bucket in buckets {
        let mut row = vec![bucket.start.to_rfc3339(), bucket.samples.to_string()];
        row.extend(fields.iter().map(|&f| format!("{:.4}", bucket.get(f))));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
