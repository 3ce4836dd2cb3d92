//! A single episode driven by the random policy.

use eldorado_core::{Game, GameConfig, GameError, PlayerId};
use thiserror::Error;
use tracing::trace;
use uuid::Uuid;

use crate::report::EpisodeReport;
use crate::sampler::MaskSampler;

#[derive(Debug, Error)]
pub enum EpisodeError {
    #[error("Episode setup failed: {0}")]
    Setup(GameError),

    #[error("Step {step} rejected for player {player}: {source}")]
    Rejected {
        step: u32,
        player: PlayerId,
        source: GameError,
    },

    #[error("Episode did not finish within {0} steps")]
    Unfinished(u32),
}

/// Owns one game and the policy playing every seat
pub struct EpisodeWorker {
    pub id: Uuid,
    game: Game,
    sampler: MaskSampler,
}

impl EpisodeWorker {
    pub fn new(id: Uuid, config: GameConfig) -> Result<Self, EpisodeError> {
        let sampler = MaskSampler::new(config.seed);
        let game = Game::new(config).map_err(EpisodeError::Setup)?;
        Ok(Self { id, game, sampler })
    }

    /// Sample and submit one action; returns whether the episode is over
    pub fn step(&mut self) -> Result<bool, EpisodeError> {
        let player = self.game.current_player();
        let step = self.game.steps();

        let mask = self
            .game
            .action_mask(player)
            .map_err(|source| EpisodeError::Rejected { step, player, source })?;
        let action = self.sampler.sample(&mask);
        let outcome = self
            .game
            .step(player, &action)
            .map_err(|source| EpisodeError::Rejected { step, player, source })?;

        trace!(episode = %self.id, player, events = outcome.events.len(), "step");
        Ok(outcome.done)
    }

    /// Play until the episode ends.
    ///
    /// Without a step cap in the config, `limit` bounds the run instead.
    pub fn run(mut self, limit: u32) -> Result<EpisodeReport, EpisodeError> {
        while !self.game.is_done() {
            if self.game.steps() >= limit {
                return Err(EpisodeError::Unfinished(limit));
            }
            self.step()?;
        }

        let seed = self.game.config().seed;
        Ok(EpisodeReport::new(
            self.id,
            seed,
            self.game.episode_info(),
            self.game.rewards(),
        ))
    }
}
