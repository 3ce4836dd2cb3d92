//! Actions, action masks, observations, and the events a step produces.
//!
//! An [`Action`] carries every decision field at once; the current turn phase
//! (or a pending card follow-up) decides which fields are read.

use crate::cards::{CardCounts, CardType, CARD_TYPES};
use crate::hex::Direction;
use crate::map::{CellFeatures, PlayerId, Resource};
use crate::player::TurnPhase;
use crate::shop::{ShopMask, SHOP_TYPES};
use serde::{Deserialize, Serialize};

/// Play mask: index 0 plays nothing, index `t + 1` plays archetype `t`
pub type PlayMask = [bool; CARD_TYPES + 1];

/// Movement mask: index 0 stays put, index `d + 1` moves in `Direction::ALL[d]`
pub type MoveMask = [bool; 7];

/// One decision submitted for the selected player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Card archetype to play
    pub play: Option<CardType>,
    /// Use the played card's special ability instead of its resources
    pub use_special: bool,
    /// Hand cards to tag for removal, per archetype
    pub remove: CardCounts,
    /// Direction to move in
    pub movement: Option<Direction>,
    /// Shop index to buy (or take, after a transmitter)
    pub buy: Option<usize>,
}

impl Default for Action {
    fn default() -> Self {
        Self::pass()
    }
}

impl Action {
    /// Do nothing; ends the current phase
    pub fn pass() -> Self {
        Self {
            play: None,
            use_special: false,
            remove: [0; CARD_TYPES],
            movement: None,
            buy: None,
        }
    }

    pub fn play(kind: CardType) -> Self {
        Self {
            play: Some(kind),
            ..Self::pass()
        }
    }

    pub fn play_special(kind: CardType) -> Self {
        Self {
            play: Some(kind),
            use_special: true,
            ..Self::pass()
        }
    }

    pub fn move_to(direction: Direction) -> Self {
        Self {
            movement: Some(direction),
            ..Self::pass()
        }
    }

    pub fn buy(index: usize) -> Self {
        Self {
            buy: Some(index),
            ..Self::pass()
        }
    }

    /// Add removal tags to this action
    pub fn with_removal(mut self, kind: CardType, count: u8) -> Self {
        self.remove[kind.index()] = count;
        self
    }
}

/// Which action values are legal for a player right now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMask {
    pub play: PlayMask,
    /// `[plain play, special play]`
    pub special: [bool; 2],
    /// Most cards of each archetype that can be tagged
    pub remove: CardCounts,
    pub movement: MoveMask,
    pub shop: ShopMask,
}

impl ActionMask {
    pub fn can_play(&self, kind: CardType) -> bool {
        self.play[kind.index() + 1]
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        self.movement[direction.index() + 1]
    }

    pub fn can_buy(&self, index: usize) -> bool {
        self.shop.get(index + 1).copied().unwrap_or(false)
    }
}

/// Replacement mask components installed by a special card for one decision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskPatch {
    pub movement: Option<MoveMask>,
    pub shop: Option<ShopMask>,
}

impl MaskPatch {
    pub fn apply(&self, mask: &mut ActionMask) {
        if let Some(movement) = self.movement {
            mask.movement = movement;
        }
        if let Some(shop) = self.shop {
            mask.shop = shop;
        }
    }
}

/// Everything a player can see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// One row per map cell, in piece order
    pub map: Vec<CellFeatures>,
    pub phase: TurnPhase,
    /// `[stock, on market board]` per shop index
    pub shop: [[u8; 2]; SHOP_TYPES],
    pub hand: CardCounts,
    pub played: CardCounts,
    pub draw_pile: CardCounts,
    pub discard: CardCounts,
    pub owned: CardCounts,
    /// Indexed by [`Resource::index`]
    pub resources: [f32; Resource::COUNT],
}

/// Events produced by a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A player's turn began
    TurnStarted { player: PlayerId },

    /// A card was played for its resources
    CardPlayed { player: PlayerId, card: CardType },

    /// A card's special ability was used
    SpecialUsed { player: PlayerId, card: CardType },

    /// Cards were drawn by a special ability
    CardsDrawn { player: PlayerId, count: usize },

    /// A player moved one hex
    Moved {
        player: PlayerId,
        direction: Direction,
        resource: Option<Resource>,
        cost: u8,
    },

    /// A card was bought from the shop
    CardBought { player: PlayerId, card: CardType },

    /// A card was taken from the shop for free
    CardAcquired { player: PlayerId, card: CardType },

    /// Cards left a player's deck for good
    CardsRemoved { player: PlayerId, count: usize },

    /// A player's phase changed
    PhaseChanged { player: PlayerId, phase: TurnPhase },

    /// A player's turn ended
    TurnEnded { player: PlayerId },

    /// A player reached the goal
    ReachedGoal { player: PlayerId },

    /// The episode is over
    EpisodeFinished { truncated: bool },
}

/// What a step returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Player expected to act next
    pub next_player: PlayerId,
    pub done: bool,
    /// Ended by the step cap rather than a player reaching the goal
    pub truncated: bool,
    pub events: Vec<GameEvent>,
}
