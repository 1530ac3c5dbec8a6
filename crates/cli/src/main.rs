use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stackctl_core::metrics::encode_metrics;
use stackctl_core::{
    load_config, validate_config, InventoryProvider, LifecycleAction, LogNotifier, RunReport,
    StackOrchestrator, StackTarget, TierPlan,
};

#[derive(Parser)]
#[command(name = "stackctl")]
#[command(about = "Tiered startup and shutdown of tagged instance stacks", long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "STACKCTL_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tiers an orchestration would run, without changing anything
    Plan {
        #[command(flatten)]
        stack: StackArgs,

        /// Which order tag to plan with
        #[arg(short, long, value_enum, default_value = "shutdown")]
        action: ActionArg,
    },

    /// Start a stack tier by tier
    Startup {
        #[command(flatten)]
        stack: StackArgs,
    },

    /// Stop a stack tier by tier
    Shutdown {
        #[command(flatten)]
        stack: StackArgs,
    },
}

#[derive(Args)]
struct StackArgs {
    /// Value of the Stack tag
    #[arg(short, long)]
    stack: String,

    /// Value of the Environment tag
    #[arg(short, long)]
    environment: String,

    /// Account profile the instances belong to
    #[arg(short, long)]
    profile: String,
}

impl StackArgs {
    fn target(&self) -> StackTarget {
        StackTarget::new(&self.stack, &self.environment, &self.profile)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Startup,
    Shutdown,
}

impl From<ActionArg> for LifecycleAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Startup => LifecycleAction::Startup,
            ActionArg::Shutdown => LifecycleAction::Shutdown,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        "Poll interval {}s, max attempts {}",
        config.orchestrator.poll_interval_secs, config.orchestrator.max_poll_attempts
    );
    info!("{} region endpoint(s) configured", config.regions.len());

    let provider = Arc::new(
        InventoryProvider::load(&config.inventory.path)
            .await
            .with_context(|| format!("Failed to load inventory from {:?}", config.inventory.path))?,
    );

    let orchestrator = StackOrchestrator::new(
        config.orchestrator.clone(),
        provider.clone(),
        provider,
        Arc::new(LogNotifier),
        config.regions.clone(),
    );

    match cli.command {
        Commands::Plan { stack, action } => {
            let target = stack.target();
            let plan = orchestrator
                .plan(&target, action.into())
                .await
                .context("Failed to build tier plan")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&target, &plan);
            }
        }
        Commands::Startup { stack } => {
            let report = orchestrator
                .startup(&stack.target())
                .await
                .context("Startup aborted")?;
            print_report(&report, cli.json)?;
        }
        Commands::Shutdown { stack } => {
            let report = orchestrator
                .shutdown(&stack.target())
                .await
                .context("Shutdown aborted")?;
            print_report(&report, cli.json)?;
        }
    }

    if cli.metrics {
        print!("{}", encode_metrics());
    }

    Ok(())
}

fn print_plan(target: &StackTarget, plan: &TierPlan) {
    println!("{} ({} instance(s))", target, plan.instance_count());
    for (index, instances) in plan.visited_tiers() {
        let ids: Vec<&str> = instances.iter().map(|i| i.id.as_str()).collect();
        println!("  tier {}: {}", index, ids.join(", "));
    }
    let untagged: Vec<&str> = plan.untagged().iter().map(|i| i.id.as_str()).collect();
    if !untagged.is_empty() {
        println!("  untagged: {}", untagged.join(", "));
    }
    let unvisited: Vec<&str> = plan.unvisited().iter().map(|i| i.id.as_str()).collect();
    if !unvisited.is_empty() {
        println!("  never reached: {}", unvisited.join(", "));
    }
    if let Err(e) = plan.validate() {
        println!("  not runnable: {}", e);
    }
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} of {} ({})",
        report.action.as_str(),
        report.target,
        report.run_id
    );
    for tier in &report.tiers {
        let status = if tier.converged() { "ok" } else { "timed out" };
        println!(
            "  tier {}: {} instance(s) in {} region(s), {} ({} ms)",
            tier.index,
            tier.instance_count,
            tier.regions.len() + tier.missing_results,
            status,
            tier.elapsed_ms
        );
    }
    if !report.unvisited.is_empty() {
        println!("  never reached: {}", report.unvisited.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shutdown_with_metrics() {
        let cli = Cli::try_parse_from([
            "stackctl",
            "shutdown",
            "--stack",
            "web",
            "--environment",
            "prod",
            "--profile",
            "main",
            "--metrics",
        ])
        .unwrap();

        assert!(cli.metrics);
        assert!(!cli.json);
        match cli.command {
            Commands::Shutdown { stack } => {
                assert_eq!(stack.target(), StackTarget::new("web", "prod", "main"));
            }
            _ => panic!("expected shutdown"),
        }
    }

    #[test]
    fn test_parse_plan_defaults_to_shutdown() {
        let cli = Cli::try_parse_from([
            "stackctl", "plan", "-s", "web", "-e", "prod", "-p", "main",
        ])
        .unwrap();

        assert!(!cli.metrics);
        match cli.command {
            Commands::Plan { action, .. } => {
                assert_eq!(LifecycleAction::from(action), LifecycleAction::Shutdown);
            }
            _ => panic!("expected plan"),
        }
    }

    #[test]
    fn test_parse_requires_stack() {
        assert!(Cli::try_parse_from(["stackctl", "startup", "-e", "prod", "-p", "main"]).is_err());
    }
}
