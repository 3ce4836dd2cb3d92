//! Episode configuration.

use crate::game::GameError;
use crate::pieces::Difficulty;
use serde::{Deserialize, Serialize};

/// Most players a start piece has room for
pub const MAX_PLAYERS: u8 = 4;

/// Everything needed to reproduce an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seeds the single random stream of the episode
    pub seed: u64,
    pub player_count: u8,
    /// Travel pieces between the start and the goal
    pub piece_count: u8,
    /// Hardest travel piece allowed
    pub difficulty: Difficulty,
    /// Truncate the episode after this many steps
    pub max_steps: Option<u32>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            player_count: MAX_PLAYERS,
            piece_count: 6,
            difficulty: Difficulty::Hard,
            max_steps: None,
        }
    }
}

impl GameConfig {
    pub fn new(seed: u64, player_count: u8, piece_count: u8, difficulty: Difficulty) -> Self {
        Self {
            seed,
            player_count,
            piece_count,
            difficulty,
            max_steps: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.player_count == 0 || self.player_count > MAX_PLAYERS {
            return Err(GameError::InvalidConfig(format!(
                "player_count must be between 1 and {MAX_PLAYERS}, got {}",
                self.player_count
            )));
        }
        if self.piece_count == 0 {
            return Err(GameError::InvalidConfig(
                "piece_count must be at least 1".to_string(),
            ));
        }
        if self.max_steps == Some(0) {
            return Err(GameError::InvalidConfig(
                "max_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
