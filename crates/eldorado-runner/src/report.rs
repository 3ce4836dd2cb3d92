//! Per-episode reports and the aggregate run summary.

use eldorado_core::{EpisodeInfo, PlayerId, PlayerStats};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How one seat fared in an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReport {
    pub seat: PlayerId,
    pub reward: i32,
    pub won: bool,
    pub stats: PlayerStats,
}

/// A finished episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub id: Uuid,
    pub seed: u64,
    pub steps: u32,
    pub turns: u32,
    pub truncated: bool,
    pub agents: Vec<AgentReport>,
}

impl EpisodeReport {
    pub fn new(id: Uuid, seed: u64, info: EpisodeInfo, rewards: Vec<i32>) -> Self {
        let agents = info
            .players
            .into_iter()
            .zip(rewards)
            .enumerate()
            .map(|(seat, (stats, reward))| AgentReport {
                seat,
                reward,
                won: info.winners.contains(&seat),
                stats,
            })
            .collect();

        Self {
            id,
            seed,
            steps: info.steps,
            turns: info.turns,
            truncated: info.truncated,
            agents,
        }
    }

    pub fn winners(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.agents.iter().filter(|a| a.won).map(|a| a.seat)
    }
}

/// Aggregate over every episode of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub episodes: usize,
    pub failures: usize,
    pub truncated: usize,
    pub mean_steps: f64,
    pub mean_turns: f64,
    /// Fraction of finished episodes each seat won
    pub win_rate: Vec<f64>,
}

impl RunSummary {
    pub fn from_reports<'a, I>(reports: I, failures: usize) -> Self
    where
        I: IntoIterator<Item = &'a EpisodeReport>,
    {
        let mut episodes = 0usize;
        let mut truncated = 0usize;
        let mut steps = 0u64;
        let mut turns = 0u64;
        let mut wins: Vec<usize> = Vec::new();

        for report in reports {
            episodes += 1;
            truncated += usize::from(report.truncated);
            steps += u64::from(report.steps);
            turns += u64::from(report.turns);
            if wins.len() < report.agents.len() {
                wins.resize(report.agents.len(), 0);
            }
            for seat in report.winners() {
                wins[seat] += 1;
            }
        }

        let mean = |total: u64| {
            if episodes == 0 {
                0.0
            } else {
                total as f64 / episodes as f64
            }
        };

        Self {
            episodes,
            failures,
            truncated,
            mean_steps: mean(steps),
            mean_turns: mean(turns),
            win_rate: wins.iter().map(|&w| mean(w as u64)).collect(),
        }
    }
}
