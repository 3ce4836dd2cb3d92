//! Player state: deck, resources, turn phase and statistics.
//!
//! This module contains:
//! - `TurnPhase` and its fixed cycle
//! - `Coins`, a half-coin fixed-point amount
//! - `ResourceHand` for the per-turn resource counters
//! - `Player` with card play and card removal

use crate::cards::{CardCounts, CardType, Deck, Special, HAND_SIZE};
use crate::game::GameError;
use crate::map::{PlayerId, Resource};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Where a player is within their turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for their turn
    Inactive,
    /// Moving and playing cards for resources
    Movement,
    /// Buying and playing cards for coins
    Buying,
    /// Out of the game
    Dead,
}

impl TurnPhase {
    /// The phase that follows this one
    pub fn next(self) -> Self {
        match self {
            TurnPhase::Inactive => TurnPhase::Movement,
            TurnPhase::Movement => TurnPhase::Buying,
            TurnPhase::Buying => TurnPhase::Inactive,
            TurnPhase::Dead => TurnPhase::Dead,
        }
    }
}

/// Coin balance in half-coin units.
///
/// Cards without coins are worth half a coin when played for money, so the
/// balance is kept exact in halves instead of floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Coins(u8);

impl Coins {
    pub const ZERO: Coins = Coins(0);
    /// Nothing costs more than 5
    pub const MAX: Coins = Coins(10);

    pub const fn from_whole(coins: u8) -> Self {
        Coins(coins.saturating_mul(2))
    }

    pub const fn from_halves(halves: u8) -> Self {
        Coins(halves)
    }

    pub const fn halves(self) -> u8 {
        self.0
    }

    pub fn as_f32(self) -> f32 {
        f32::from(self.0) / 2.0
    }

    /// Whether this balance pays for `cost` whole coins
    pub fn covers(self, cost: u8) -> bool {
        u16::from(self.0) >= u16::from(cost) * 2
    }

    /// Add halves, capped at [`Coins::MAX`]
    pub fn add_capped(self, halves: u8) -> Self {
        Coins(self.0.saturating_add(halves).min(Self::MAX.0))
    }

    /// Balance after paying `cost` whole coins, if affordable
    pub fn spend(self, cost: u8) -> Option<Self> {
        self.0.checked_sub(cost.checked_mul(2)?).map(Coins)
    }
}

/// Resource counters for the current turn.
///
/// The removal counter is not stored: it is the number of tagged hand cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceHand {
    pub machete: u8,
    pub paddle: u8,
    pub coins: Coins,
    pub uses: u8,
}

impl ResourceHand {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cumulative per-episode counters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Hexes travelled
    pub movements: u32,
    pub cards_added: u32,
    pub cards_removed: u32,
    /// Resources spent, indexed by [`Resource::index`]
    pub spent: [u32; Resource::COUNT],
    pub turns: u32,
}

/// What happened to a card that was played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayedCard {
    pub kind: CardType,
    /// Set when the special ability was used
    pub special: Option<Special>,
    /// The card left the deck for good
    pub removed: bool,
}

/// A player in the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub deck: Deck,
    pub phase: TurnPhase,
    pub has_won: bool,
    pub resources: ResourceHand,
    pub stats: PlayerStats,
}

impl Player {
    /// A player with a freshly shuffled starting deck
    pub fn new<R: Rng + ?Sized>(id: PlayerId, rng: &mut R) -> Self {
        Self::with_deck(id, Deck::starting(rng))
    }

    pub fn with_deck(id: PlayerId, deck: Deck) -> Self {
        Self {
            id,
            deck,
            phase: TurnPhase::Inactive,
            has_won: false,
            resources: ResourceHand::new(),
            stats: PlayerStats::default(),
        }
    }

    /// Hand cards currently tagged for removal
    pub fn tagged(&self) -> u8 {
        self.deck.tagged_count().min(u8::MAX as usize) as u8
    }

    /// Whether the player holds `amount` of `resource`
    pub fn can_pay(&self, resource: Resource, amount: u8) -> bool {
        match resource {
            Resource::Machete => self.resources.machete >= amount,
            Resource::Paddle => self.resources.paddle >= amount,
            Resource::Coin => self.resources.coins.covers(amount),
            Resource::Use => self.resources.uses >= amount,
            Resource::Remove => self.tagged() >= amount,
        }
    }

    /// Deduct a resource and record the spend.
    ///
    /// Removal costs are paid by removing tagged cards, see [`Player::remove_tagged`].
    pub fn pay(&mut self, resource: Resource, amount: u8) -> Result<(), GameError> {
        if !self.can_pay(resource, amount) {
            return Err(GameError::CannotAfford { resource, amount });
        }
        match resource {
            Resource::Machete => self.resources.machete -= amount,
            Resource::Paddle => self.resources.paddle -= amount,
            Resource::Coin => {
                self.resources.coins = self.resources.coins.spend(amount).unwrap_or(Coins::ZERO)
            }
            Resource::Use => self.resources.uses -= amount,
            Resource::Remove => {}
        }
        self.stats.spent[resource.index()] += u32::from(amount);
        Ok(())
    }

    /// Resource counters as reported in observations
    pub fn resource_observation(&self) -> [f32; Resource::COUNT] {
        [
            f32::from(self.resources.machete),
            f32::from(self.resources.paddle),
            self.resources.coins.as_f32(),
            f32::from(self.resources.uses),
            f32::from(self.tagged()),
        ]
    }

    /// Play the first hand card of archetype `kind`.
    ///
    /// With `use_special` on a card that has one, the card's resources are not
    /// granted and the caller carries out the returned special. Otherwise the
    /// card pays out for the current phase: during movement its grants replace
    /// the machete, paddle and coin counters; during buying it adds its coins,
    /// or half a coin if it has none.
    pub fn play_card(&mut self, kind: CardType, use_special: bool) -> Result<PlayedCard, GameError> {
        if matches!(self.phase, TurnPhase::Inactive | TurnPhase::Dead) {
            return Err(GameError::CardPlayedWhileInactive);
        }
        let index = self
            .deck
            .find_in_hand(kind)
            .ok_or(GameError::CardNotInHand(kind))?;
        if let Some(card) = self.deck.hand_card_mut(index) {
            card.tagged = false;
        }

        let archetype = kind.archetype();
        let special = archetype.special.filter(|_| use_special);
        if special.is_none() {
            match self.phase {
                TurnPhase::Movement => {
                    self.resources.machete = archetype.machete;
                    self.resources.paddle = archetype.paddle;
                    self.resources.coins = Coins::from_whole(archetype.coins);
                    self.resources.uses = self.resources.uses.saturating_add(1);
                }
                TurnPhase::Buying => {
                    let halves = if archetype.coins > 0 { archetype.coins * 2 } else { 1 };
                    self.resources.coins = self.resources.coins.add_capped(halves);
                }
                TurnPhase::Inactive | TurnPhase::Dead => {}
            }
        }

        // Special cards played for their (empty) resources stay in the deck
        let removed = archetype.single_use && !(archetype.special.is_some() && !use_special);
        if removed {
            self.deck.remove(index);
        } else {
            self.deck.use_card(index);
        }

        Ok(PlayedCard {
            kind,
            special,
            removed,
        })
    }

    /// Tag hand cards for removal, replacing any previous tags
    pub fn tag_for_removal(&mut self, counts: &CardCounts) {
        self.deck.tag(counts);
    }

    /// Remove up to `count` tagged hand cards, chosen at random among the tagged ones.
    ///
    /// With `enforce`, fewer than `count` tagged cards is an error and nothing is removed.
    pub fn remove_tagged<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        enforce: bool,
        rng: &mut R,
    ) -> Result<usize, GameError> {
        let tagged = self.deck.tagged_positions();
        if enforce && tagged.len() < count {
            return Err(GameError::NotEnoughTagged {
                needed: count,
                tagged: tagged.len(),
            });
        }

        let mut chosen: Vec<usize> = tagged
            .choose_multiple(rng, count.min(tagged.len()))
            .copied()
            .collect();
        chosen.sort_unstable_by(|a, b| b.cmp(a));
        for index in &chosen {
            self.deck.remove(*index);
        }
        self.stats.cards_removed += chosen.len() as u32;
        Ok(chosen.len())
    }

    /// Close out the turn: discard played cards, refill the hand, reset resources
    pub fn end_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.deck.discard_played();
        self.deck.clear_tags();
        let missing = HAND_SIZE.saturating_sub(self.deck.hand().len());
        if missing > 0 {
            self.deck.draw(missing, rng);
        }
        self.resources = ResourceHand::new();
        if self.phase != TurnPhase::Dead {
            self.phase = TurnPhase::Inactive;
        }
        self.stats.turns += 1;
    }
}
