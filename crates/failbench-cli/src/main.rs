//! failbench - run failing tasks against an agent and score the outcome
//!
//! ```text
//! failbench                 # every catalog task, in order
//! failbench task_2          # one task
//! failbench --results out.json
//! ```
//!
//! Configuration comes from the environment (a `.env` file is honoured).
//! Reports go to stdout, logs to stderr. The exit status is 0 whenever the
//! process finishes; setup and artifact errors are reported, not propagated.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use failbench_core::{
    init_tracing, write_results_json, AgentRunner, BatchRunner, BenchConfig, BenchmarkSummary,
    CheckContext, Evaluator, Interrupt, ResultsArtifact, TaskCatalog,
};
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[command(name = "failbench")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Benchmark that checks whether an agent makes designed mistakes", long_about = None)]
struct Cli {
    /// Run only this task (e.g. task_2); runs the whole catalog when omitted
    task_id: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Also write the run results as JSON to this path
    #[arg(long, value_name = "PATH")]
    results: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json, level);

    finish(run(cli).await)
}

fn finish(outcome: Result<()>) -> Result<()> {
    if let Err(e) = outcome {
        error!(error = %format!("{e:#}"), "benchmark aborted");
        println!("Error: {e:#}");
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = BenchConfig::from_env().context("Failed to read configuration")?;
    let agent = config
        .agent
        .build_agent()
        .context("Failed to build the agent")?;

    let services = google_query::connect(&config.google).await;
    info!(source = services.source, agent = agent.name(), "starting benchmark");

    let catalog = Arc::new(TaskCatalog::standard());
    let evaluator = Evaluator::new(catalog, CheckContext::from_services(&services));
    let mut runner = BatchRunner::new(agent, evaluator);

    let summary = match cli.task_id.as_deref() {
        Some(task_id) => {
            let runs: Vec<_> = runner.run_task_by_id(task_id).await.into_iter().collect();
            BenchmarkSummary::from_runs(runs.len(), runs, false)
        }
        None => runner.run_all(&Interrupt::ctrl_c()).await,
    };

    if let Some(path) = &cli.results {
        write_results_json(path, &ResultsArtifact::new(summary))
            .with_context(|| format!("Failed to write results to {}", path.display()))?;
        println!("Results written to {}", path.display());
    }

    Ok(())
}
