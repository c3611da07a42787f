//! grantgov command line: inspect default settings and replay governance scenarios.

mod config;
mod simulator;

use anyhow::Context;
use clap::Parser;
use config::SimulatorConfig;
use grantgov_utils::{format_duration, LogFormat};
use simulator::{Report, Simulator};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grantgov", about = "Beneficiary governance engine tools")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Overrides the scenario file's `log_level`.
    #[arg(long, global = true, env = "GRANTGOV_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json". Overrides the scenario file's `log_format`.
    #[arg(long, global = true, env = "GRANTGOV_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the default settings as TOML.
    Defaults,
    /// Replay a scenario file against an in-memory engine.
    Simulate {
        /// Path to the scenario TOML.
        scenario: PathBuf,
        /// Print the report as JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Stop at the first failing step.
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Defaults => {
            let defaults = SimulatorConfig::default();
            init_logging(cli.log_format, cli.log_level.as_deref(), &defaults);
            let g = &defaults.governance;
            println!("# voting window: {}", format_duration(g.voting_period_secs));
            println!("# veto window:   {}", format_duration(g.veto_period_secs));
            print!("{}", defaults.to_toml_string()?);
        }
        Command::Simulate {
            scenario,
            json,
            strict,
        } => {
            let config = SimulatorConfig::from_toml_file(&scenario)?;
            init_logging(cli.log_format, cli.log_level.as_deref(), &config);
            tracing::info!("loaded scenario from {}", scenario.display());

            let simulator = Simulator::new(&config)?;
            let report = simulator
                .run(&config.steps, strict)
                .with_context(|| format!("scenario {} aborted", scenario.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            tracing::info!(
                proposals = simulator.engine().number_of_proposals(),
                config_version = simulator.engine().config_version(),
                failed = report.failed_steps(),
                "scenario finished"
            );
        }
    }
    Ok(())
}

fn init_logging(format: Option<LogFormat>, level: Option<&str>, file: &SimulatorConfig) {
    let format = format.unwrap_or(file.log_format);
    let level = level.unwrap_or(&file.log_level);
    grantgov_utils::init_tracing(format, level);
}

fn print_report(report: &Report) {
    println!("steps:");
    for step in &report.steps {
        let mark = if step.ok { "ok  " } else { "FAIL" };
        println!(
            "  [{mark}] #{:<3} {:<9} t={} {}",
            step.index, step.action, step.at, step.detail
        );
    }

    println!("\nproposals at t={}:", report.finished_at);
    println!(
        "  {:>3}  {:<10} {:<16} {:<21} {:>8} {:>8} {:>6}  bond",
        "id", "kind", "beneficiary", "status", "yes", "no", "voters"
    );
    for p in &report.proposals {
        println!(
            "  {:>3}  {:<10} {:<16} {:<21} {:>8} {:>8} {:>6}  {}",
            p.id,
            p.kind,
            p.beneficiary,
            p.status.to_string(),
            p.yes,
            p.no,
            p.voters,
            p.bond
        );
    }

    println!("\nregistry: {}", report.registry.join(", "));
    println!("retained bonds: {}", report.retained_bonds);
}
