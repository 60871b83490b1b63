//! Demonstration harness: builds a [`Config`] from its documented
//! defaults, applies any `KEY=VALUE` overrides given on the command line, runs
//! one simulation, and prints the summary record as JSON.

use std::env;
use std::process::ExitCode;

use dtn_ltp_sim::config::RouterKind;
use dtn_ltp_sim::{Config, Sim};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut config = Config::default();
    for arg in env::args().skip(1) {
        let Some((key, value)) = arg.split_once('=') else {
            eprintln!("ignoring malformed argument {arg:?}, expected KEY=VALUE");
            continue;
        };
        if let Err(e) = apply_override(&mut config, key, value) {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let mut sim = match Sim::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let output = sim.run();
    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }
    match serde_json::to_string_pretty(&output.summary) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to serialize summary: {e}"),
    }
    ExitCode::SUCCESS
}

/// Applies one `KEY=VALUE` override to `config`. Returns a human-readable error for an unknown key or a value
/// that doesn't parse, rather than panicking on malformed CLI input.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<(), String> {
    fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
        value.parse().map_err(|_| format!("invalid value {value:?} for {key}"))
    }

    match key {
        "num_nodes" => config.num_nodes = parse(key, value)?,
        "simulation_time" => config.simulation_time = parse(key, value)?,
        "max_buffer_size" => config.max_buffer_size = parse(key, value)?,
        "ltp_segment_size" => config.ltp_segment_size = parse(key, value)?,
        "bundle_generation_rate" => config.bundle_generation_rate = parse(key, value)?,
        "bundle_ttl" => config.bundle_ttl = parse(key, value)?,
        "contact_probability" => config.contact_probability = parse(key, value)?,
        "min_contact_duration" => config.min_contact_duration = parse(key, value)?,
        "max_contact_duration" => config.max_contact_duration = parse(key, value)?,
        "base_error_rate" => config.base_error_rate = parse(key, value)?,
        "spray_token_budget" => config.spray_token_budget = parse(key, value)?,
        "max_ltp_retries" => config.max_ltp_retries = parse(key, value)?,
        "metrics_snapshot_interval" => config.metrics_snapshot_interval = parse(key, value)?,
        "random_seed" => config.random_seed = parse(key, value)?,
        "router_kind" => {
            config.router_kind = match value {
                "epidemic" => RouterKind::Epidemic,
                "spray_and_wait" => RouterKind::SprayAndWait,
                "predictive" => RouterKind::Predictive,
                other => return Err(format!("unknown router_kind {other:?}")),
            }
        }
        other => return Err(format!("unrecognized option {other:?}")),
    }
    Ok(())
}
