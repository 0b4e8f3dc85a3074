//! CLI for running a single discovery
//!
//! Prints the `DiscoveryResult` as JSON on stdout; logs go to stderr.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use discovery::{Config, DiscoveryEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "discover")]
#[command(about = "Discover competitors of an organization and score their visibility")]
struct Cli {
    /// Target organization name
    entity: String,

    /// Industry used to sharpen search queries
    #[arg(long)]
    industry: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Skip LM validation and accept the top-ranked candidates
    #[arg(long)]
    no_validate: bool,

    /// Overall run deadline in seconds (0 disables it)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,discovery=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if cli.no_validate {
        config.discovery.validate_candidates = false;
    }
    if let Some(secs) = cli.timeout_secs {
        config.discovery.run_timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let engine = DiscoveryEngine::from_config(&config);
    let result = engine
        .discover(&cli.entity, cli.industry.as_deref())
        .await;

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Failed to serialize result")?;
    println!("{}", json);

    Ok(())
}
