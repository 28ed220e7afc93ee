mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pv_battery_sim::config::ScenarioConfig;
use pv_battery_sim::error::SimError;
use pv_battery_sim::io::export::{export_buckets_csv, export_csv};
use pv_battery_sim::io::import::import_csv;
use pv_battery_sim::reporting::print_report;
use pv_battery_sim::scenario::synthetic_records;
use pv_battery_sim::sim::aggregate::{FieldSpec, aggregate};

use crate::cli::Args;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(SimError::InvalidConfig(errors)) => {
            for e in &errors {
                error!("{e}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    // --scenario takes priority, then --preset, then the baseline default
    let mut scenario = if let Some(path) = &args.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &args.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };
    args.apply_overrides(&mut scenario);

    let engine = scenario.engine()?;
    let records = match &args.input {
        Some(path) => import_csv(path)?,
        None => synthetic_records(&scenario.profile, engine.config()),
    };
    info!(
        intervals = records.len(),
        capacity_kwh = engine.battery().capacity_kwh,
        mode = %engine.battery().inverter_mode,
        currency = %engine.battery().currency,
        "running simulation"
    );

    let outcome = engine.run(&records)?;
    print_report(&outcome);

    if let Some(path) = &args.telemetry_out {
        export_csv(&outcome.records, path)?;
        info!(path = %path.display(), "telemetry written");
    }

    if let Some(path) = &args.buckets_out {
        let spec = FieldSpec::energy_flows();
        let buckets = aggregate(&outcome.records, args.bucket, &spec)?;
        export_buckets_csv(&buckets, &spec, path)?;
        info!(
            path = %path.display(),
            bucket = %args.bucket,
            buckets = buckets.len(),
            "buckets written"
        );
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(pv_battery_sim::api::AppState {
            config: *engine.config(),
            battery: engine.battery().clone(),
            tariff: *engine.tariff(),
            outcome,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(pv_battery_sim::api::serve(state, addr))?;
    }

    Ok(())
}
