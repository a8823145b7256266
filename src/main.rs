//! Sandpiper - CLI entry point.
//!
//! Runs a single agent task from the command line and prints the final
//! answer to stdout.

use std::path::PathBuf;

use clap::Parser;
use sandpiper::agent::{Agent, TaskOutcome};
use sandpiper::Config;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "sandpiper",
    about = "AI code assistant confined to a sandboxed working directory",
    version
)]
struct Args {
    /// Task for the agent; multiple words are joined with spaces.
    #[arg(required = true)]
    prompt: Vec<String>,

    /// Enable verbose output (iteration and token diagnostics).
    #[arg(short, long)]
    verbose: bool,

    /// Override the model named in the environment.
    #[arg(long)]
    model: Option<String>,

    /// Override the sandbox directory named in the environment.
    #[arg(long)]
    sandbox: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "sandpiper=debug"
    } else {
        "sandpiper=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(sandbox) = args.sandbox {
        config.sandbox_root = sandbox;
    }
    info!(
        "Loaded configuration: model={}, sandbox={}",
        config.model,
        config.sandbox_root.display()
    );

    let prompt = args.prompt.join(" ");
    debug!("User prompt: {}", prompt);

    let agent = Agent::new(config)?;
    let (outcome, usage) = agent.run_task(&prompt).await?;

    match outcome {
        TaskOutcome::Completed { answer, iterations } => {
            debug!("Final answer after {} iterations", iterations);
            println!("{answer}");
        }
        TaskOutcome::BudgetExhausted { iterations } => {
            println!("Reached the maximum of {iterations} iterations without a final answer.");
        }
    }
    debug!("Total prompt tokens: {}", usage.prompt_tokens);
    debug!("Total response tokens: {}", usage.response_tokens);

    Ok(())
}
