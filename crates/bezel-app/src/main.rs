//! The `bezel` command: run one harvest and print its progress.
//!
//! The browser runs headful by default. When an anti-bot challenge comes
//! up, solve it in the browser window, then press Enter here to let the
//! run continue.

use anyhow::Context;
use bezel_core::{AppConfig, ChallengeSignal};
use bezel_pipeline::{start_harvest, HarvestEvent, HarvestPipeline, HarvestRequest, HarvestStep};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bezel", version, about = "Harvest watch listings into a JSON artifact")]
struct Args {
    /// Search query submitted to the marketplace
    search_query: String,

    /// Maximum listing age in days, inclusive
    #[arg(long, default_value_t = 30)]
    lookback_days: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    let results_path = config.harvest.results_path.clone();

    let signal = ChallengeSignal::new();
    spawn_challenge_bridge(signal.clone());

    let pipeline = Arc::new(HarvestPipeline::new(config, signal));
    let request = HarvestRequest {
        search_query: args.search_query,
        lookback_days: args.lookback_days,
    };
    let mut events = start_harvest(pipeline, request).context("failed to start harvest")?;

    let total = HarvestStep::ALL.len();
    while let Some(event) = events.recv().await {
        match event {
            HarvestEvent::Step(step) => {
                println!("[{}/{}] {}", step.index() + 1, total, step);
                if step == HarvestStep::NavigateHome {
                    println!("      solve any challenge in the browser window, then press Enter");
                }
            }
            HarvestEvent::Completed(records) => {
                println!(
                    "done: {} listings written to {}",
                    records.len(),
                    results_path.display()
                );
                return Ok(());
            }
            HarvestEvent::Failed(reason) => {
                anyhow::bail!("harvest failed: {reason}");
            }
        }
    }

    anyhow::bail!("progress stream ended without a terminal event")
}

/// Any line on stdin marks the on-screen challenge as resolved.
fn spawn_challenge_bridge(signal: ChallengeSignal) {
    tokio::spawn(async move {
        use tokio::io::{AsyncBufReadExt, BufReader};
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(_)) = lines.next_line().await {
            tracing::info!("challenge marked resolved from stdin");
            signal.resolve();
        }
    });
}
