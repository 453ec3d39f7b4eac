use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use empire_sim::{
    engine::{EngineBuilder, EngineSettings, TurnSummary},
    scenario::ScenarioLoader,
    world::GalaxySnapshot,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Galaxy turn engine runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/twin_suns.yaml")]
    scenario: PathBuf,

    /// Override turn count (uses scenario default when omitted)
    #[arg(long)]
    turns: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter used when RUST_LOG is unset (defaults to the scenario's level)
    #[arg(long)]
    log_level: Option<String>,

    /// Print turn summaries and the final galaxy snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Skip the pre-game warm-up passes
    #[arg(long)]
    skip_bootstrap: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    turns: &'a [TurnSummary],
    galaxy: GalaxySnapshot,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| scenario.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    let mut world = scenario
        .build_world()
        .with_context(|| format!("Failed to build scenario '{}'", scenario.name))?;
    let turns = scenario.turns(cli.turns);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: cli.seed.unwrap_or(scenario.seed),
        rules: scenario.rules.clone(),
    };
    let mut engine = EngineBuilder::new(settings).with_standard_phases().build();

    if !cli.skip_bootstrap {
        engine.bootstrap(&mut world)?;
    }

    let mut summaries = Vec::new();
    engine.run_with_hook(&mut world, turns, |summary| summaries.push(summary.clone()))?;

    if cli.json {
        let report = RunReport {
            turns: &summaries,
            galaxy: world.snapshot(engine.scenario_name()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let agreements: u32 = summaries.iter().map(|s| s.stats.agreements_committed).sum();
    let migrations: u32 = summaries.iter().map(|s| s.stats.migrations_succeeded).sum();
    println!(
        "Scenario '{}' completed {} turns (now {}). Pops: {}, agreements committed: {}, migrations: {}",
        engine.scenario_name(),
        turns,
        world.calendar(),
        world.total_pops(),
        agreements,
        migrations
    );
    Ok(())
}
