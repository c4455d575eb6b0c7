mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agijobs_common::config::load_demo_config;
use agijobs_driver::context::RunContext;
use agijobs_reporter::manifest::ReportWriter;
use agijobs_reporter::render::{render, OutputFormat};
use agijobs_reporter::snapshot;

/// Operator CLI for the AGI Jobs marketplace contracts.
#[derive(Parser)]
#[command(name = "agijobs", version, about)]
struct Cli {
    /// Path to the demo configuration file
    #[arg(long, global = true, default_value = "config/demo.local.json")]
    config: PathBuf,

    /// Expected network name; must match the config
    #[arg(long, global = true)]
    network: Option<String>,

    /// Send transactions. Without it state-changing commands plan only.
    #[arg(long, global = true)]
    execute: bool,

    /// Output format: human, markdown, or json
    #[arg(long, global = true, default_value = "human")]
    format: String,

    /// Write reports (plus manifest) under this directory instead of stdout
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Attach to the deployed modules and wire their cross-references
    Bootstrap,
    /// End-to-end happy path: job, commit-reveal round, finalize
    Demo {
        /// Number of committee members that withhold their reveal
        #[arg(long, default_value_t = 0)]
        skip_reveals: usize,
    },
    /// Raise a dispute and resolve it with moderator signatures
    Dispute {
        /// Settle in the employer's favor
        #[arg(long)]
        employer_wins: bool,
    },
    /// Collect an on-chain snapshot and render it
    Report {
        /// Job ids to include
        #[arg(long = "job", value_name = "ID")]
        jobs: Vec<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let format: OutputFormat = cli.format.parse()?;
    let config = load_demo_config(&cli.config)?;

    let env = scenario::connect(config).await?;
    env.ensure_network(cli.network.as_deref())?;

    let mut ctx = RunContext::new();

    let report_jobs = match cli.command {
        Command::Bootstrap => {
            scenario::bootstrap(&env, cli.execute, &mut ctx).await?;
            for action in &ctx.owner_actions {
                match &action.tx_hash {
                    Some(tx) => println!("[executed {}] {}.{}", tx, action.module, action.action),
                    None => println!("[planned] {}.{}", action.module, action.action),
                }
            }
            if !cli.execute {
                info!("dry run; re-run with --execute to send the wiring transactions");
            }
            vec![]
        }
        Command::Demo { skip_reveals } => {
            if !cli.execute {
                bail!("the demo sends transactions; re-run with --execute");
            }
            let job_id = scenario::run_happy_path(&env, skip_reveals, &mut ctx).await?;
            info!(job_id = %job_id, "happy path complete");
            vec![job_id]
        }
        Command::Dispute { employer_wins } => {
            if !cli.execute {
                bail!("the dispute demo sends transactions; re-run with --execute");
            }
            let job_id = scenario::run_dispute(&env, employer_wins, &mut ctx).await?;
            info!(job_id = %job_id, "dispute scenario complete");
            vec![job_id]
        }
        Command::Report { ref jobs } => scenario::job_ids(jobs),
    };

    let mut snap = snapshot::collect(
        &env.suite,
        &env.config.network.name,
        env.actors.chain_id,
        &env.config.params,
        &env.actors.profiles(),
        &report_jobs,
    )
    .await?;
    snap.run = Some(serde_json::to_value(&ctx)?);

    let rendered = render(&snap, format)?;
    match &cli.out {
        Some(dir) => {
            let mut writer = ReportWriter::new(dir)?;
            let name = match format {
                OutputFormat::Human => "mission-control.txt",
                OutputFormat::Markdown => "owner-surface.md",
                OutputFormat::Json => "snapshot.json",
            };
            writer.write(name, &rendered)?;
            writer.write("run-context.json", &serde_json::to_string_pretty(&ctx)?)?;
            let manifest = writer.finish()?;
            info!(manifest = %manifest.display(), "reports written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
