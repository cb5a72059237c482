//! Thin binary shell over the `omega-sim`/`omega-config` library crates
//! (spec.md §1's "CLI argument parsing" Non-goal — this takes no flags and
//! simply runs a small set of illustrative preset configs end to end,
//! printing each run's results record as JSON).

mod scenarios;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use omega_sim::Simulator;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    for config in scenarios::presets() {
        config
            .validate()
            .with_context(|| format!("invalid config for scenario {}", config.experiment_name))?;

        tracing::info!(experiment = %config.experiment_name, "running scenario");
        let results = Simulator::new(&config)
            .run()
            .with_context(|| format!("scenario {} aborted", config.experiment_name))?;

        println!("=== {} ===", results.experiment_name);
        serde_json::to_writer_pretty(std::io::stdout(), &results).context("failed to serialize results")?;
        println!();
    }

    Ok(())
}
