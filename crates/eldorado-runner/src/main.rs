//! Eldorado episode runner: plays many independent episodes in parallel with
//! a random legal-action policy and prints a JSON summary.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod episode;
mod pool;
mod report;
mod sampler;

use pool::{EpisodePool, PoolConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PoolConfig::from_env()?;
    info!(
        episodes = config.episodes,
        workers = config.workers,
        seed = config.base.seed,
        "Starting Eldorado runner..."
    );

    let pool = Arc::new(EpisodePool::new());
    let summary = pool::run_pool(config, Arc::clone(&pool)).await?;

    info!(
        episodes = summary.episodes,
        failures = summary.failures,
        mean_steps = summary.mean_steps,
        "Run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
