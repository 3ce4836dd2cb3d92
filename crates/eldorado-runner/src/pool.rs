//! Parallel episode pool.
//!
//! Every episode is an independent `Game` on a blocking worker thread; the
//! semaphore caps how many run at once. Results land in shared maps keyed by
//! episode id.

use anyhow::{anyhow, Context};
use dashmap::DashMap;
use eldorado_core::{Difficulty, GameConfig};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::episode::EpisodeWorker;
use crate::report::{EpisodeReport, RunSummary};

const DEFAULT_EPISODES: usize = 64;
const DEFAULT_MAX_STEPS: u32 = 100_000;
/// Safety net for episodes run without a step cap
const UNCAPPED_STEP_LIMIT: u32 = 10_000_000;

/// How many episodes to run, how wide, and with which game settings
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub episodes: usize,
    pub workers: usize,
    /// Episode `i` uses this config with `seed + i`
    pub base: GameConfig,
}

impl PoolConfig {
    /// Read `ELDORADO_*` environment variables, falling back to defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameConfig::default();
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        let max_steps: u32 = parse_var(&lookup, "ELDORADO_MAX_STEPS", DEFAULT_MAX_STEPS)?;
        let base = GameConfig {
            seed: parse_var(&lookup, "ELDORADO_SEED", defaults.seed)?,
            player_count: parse_var(&lookup, "ELDORADO_PLAYERS", defaults.player_count)?,
            piece_count: parse_var(&lookup, "ELDORADO_PIECES", defaults.piece_count)?,
            difficulty: parse_var::<Difficulty, _>(&lookup, "ELDORADO_DIFFICULTY", defaults.difficulty)?,
            // 0 disables the cap
            max_steps: (max_steps > 0).then_some(max_steps),
        };
        base.validate().context("invalid game settings")?;

        Ok(Self {
            episodes: parse_var(&lookup, "ELDORADO_EPISODES", DEFAULT_EPISODES)?,
            workers: parse_var(&lookup, "ELDORADO_WORKERS", workers)?.max(1),
            base,
        })
    }

    pub fn episode_config(&self, index: usize) -> GameConfig {
        GameConfig {
            seed: self.base.seed.wrapping_add(index as u64),
            ..self.base.clone()
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{name}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}

/// Results shared by all workers of a run
pub struct EpisodePool {
    pub reports: DashMap<Uuid, EpisodeReport>,
    /// Error message per failed episode
    pub failures: DashMap<Uuid, String>,
}

impl EpisodePool {
    pub fn new() -> Self {
        Self {
            reports: DashMap::new(),
            failures: DashMap::new(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let reports: Vec<EpisodeReport> = self.reports.iter().map(|r| r.value().clone()).collect();
        RunSummary::from_reports(&reports, self.failures.len())
    }
}

impl Default for EpisodePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Run every episode of `config`, at most `config.workers` at a time.
pub async fn run_pool(config: PoolConfig, pool: Arc<EpisodePool>) -> anyhow::Result<RunSummary> {
    config.base.validate()?;
    let limit = config.base.max_steps.unwrap_or(UNCAPPED_STEP_LIMIT);
    let permits = Arc::new(Semaphore::new(config.workers.max(1)));
    let mut tasks = FuturesUnordered::new();

    info!(episodes = config.episodes, workers = config.workers, "Pool started");

    for index in 0..config.episodes {
        let permit = Arc::clone(&permits).acquire_owned().await?;
        let pool = Arc::clone(&pool);
        let game_config = config.episode_config(index);

        tasks.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let id = Uuid::new_v4();
            let seed = game_config.seed;

            match EpisodeWorker::new(id, game_config).and_then(|worker| worker.run(limit)) {
                Ok(report) => {
                    debug!(
                        episode = %id,
                        seed,
                        steps = report.steps,
                        truncated = report.truncated,
                        "Episode finished"
                    );
                    pool.reports.insert(id, report);
                }
                Err(e) => {
                    error!("Episode {} (seed {}) failed: {}", id, seed, e);
                    pool.failures.insert(id, e.to_string());
                }
            }
        }));
    }

    while let Some(joined) = tasks.next().await {
        joined.context("episode worker panicked")?;
    }

    Ok(pool.summary())
}
