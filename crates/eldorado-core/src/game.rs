//! Core game state machine.
//!
//! This module contains the `Game` struct: the turn and phase cycle, the
//! one-shot override installed by special cards, observations, action masks
//! and rewards.
//!
//! Each player's turn runs `Inactive -> Movement -> Buying -> Inactive`. A step
//! with no move and no card play leaves the movement phase; a step with no
//! purchase and no card play ends the turn.

use crate::actions::{Action, ActionMask, GameEvent, MaskPatch, Observation, StepOutcome};
use crate::cards::{Card, CardType, FollowUp, CARD_TYPES};
use crate::config::GameConfig;
use crate::hex::Direction;
use crate::map::{Map, MapError, PlayerId, Resource};
use crate::pieces::Difficulty;
use crate::player::{Player, PlayerStats, TurnPhase};
use crate::shop::{Shop, ShopError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that can occur when stepping the game
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn: player {expected} is selected, got {got}")]
    NotYourTurn { expected: PlayerId, got: PlayerId },

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Episode is over")]
    EpisodeOver,

    #[error("Cards cannot be played outside of a turn")]
    CardPlayedWhileInactive,

    #[error("No {0:?} in hand")]
    CardNotInHand(CardType),

    #[error("Cannot move {0:?}")]
    InvalidMove(Direction),

    #[error("Cannot afford {amount} {resource:?}")]
    CannotAfford { resource: Resource, amount: u8 },

    #[error("Need {needed} cards tagged for removal, only {tagged} are")]
    NotEnoughTagged { needed: usize, tagged: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Shop(#[from] ShopError),
}

/// A follow-up decision claimed by a special card.
///
/// It handles the next action of `player` in place of the phase logic, and its
/// mask patch applies to that one decision only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOverride {
    pub player: PlayerId,
    pub card: CardType,
    pub follow_up: FollowUp,
    pub mask: MaskPatch,
}

/// Per-episode summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    /// Turns taken by all players together
    pub turns: u32,
    pub steps: u32,
    pub truncated: bool,
    pub winners: Vec<PlayerId>,
    pub players: Vec<PlayerStats>,
}

/// A running episode
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    map: Map,
    shop: Shop,
    players: Vec<Player>,
    /// Player whose action is expected
    current: PlayerId,
    steps: u32,
    turns: u32,
    done: bool,
    truncated: bool,
    pending: Option<PendingOverride>,
    rng: ChaCha8Rng,
}

impl Game {
    /// Start an episode. The map, decks and every later shuffle come from one
    /// stream seeded with `config.seed`.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut map = Map::generate(config.piece_count, config.difficulty, &mut rng)?;
        let players: Vec<Player> = (0..config.player_count as PlayerId)
            .map(|id| Player::new(id, &mut rng))
            .collect();
        map.add_players(players.len())?;

        debug!(
            seed = config.seed,
            players = config.player_count,
            pieces = config.piece_count,
            difficulty = %config.difficulty,
            cells = map.cell_count(),
            "episode reset"
        );

        Ok(Self {
            config,
            map,
            shop: Shop::new(),
            players,
            current: 0,
            steps: 0,
            turns: 0,
            done: false,
            truncated: false,
            pending: None,
            rng,
        })
    }

    /// Replace this episode with a fresh one, keeping the step cap
    pub fn reset(
        &mut self,
        seed: u64,
        player_count: u8,
        piece_count: u8,
        difficulty: Difficulty,
    ) -> Result<(), GameError> {
        let config = GameConfig {
            max_steps: self.config.max_steps,
            ..GameConfig::new(seed, player_count, piece_count, difficulty)
        };
        *self = Game::new(config)?;
        Ok(())
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn shop(&self) -> &Shop {
        &self.shop
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players.get(id).ok_or(GameError::UnknownPlayer(id))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn current_player(&self) -> PlayerId {
        self.current
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn pending_override(&self) -> Option<&PendingOverride> {
        self.pending.as_ref()
    }

    /// What `player` can see
    pub fn observe(&self, player: PlayerId) -> Result<Observation, GameError> {
        let p = self.player(player)?;
        Ok(Observation {
            map: self.map.observation(player),
            phase: p.phase,
            shop: self.shop.observation(),
            hand: p.deck.hand_counts(),
            played: p.deck.played_counts(),
            draw_pile: p.deck.draw_counts(),
            discard: p.deck.discard_counts(),
            owned: p.deck.owned_counts(),
            resources: p.resource_observation(),
        })
    }

    /// Legal action values for `player`, with any pending override patched in
    pub fn action_mask(&self, player: PlayerId) -> Result<ActionMask, GameError> {
        let p = self.player(player)?;
        let hand = p.deck.hand_counts();

        let mut play = [false; CARD_TYPES + 1];
        play[0] = true;
        for (slot, &count) in play[1..].iter_mut().zip(hand.iter()) {
            *slot = count > 0;
        }
        let has_special = p.deck.hand().iter().any(|card| card.kind.special().is_some());

        let mut mask = ActionMask {
            play,
            special: [true, has_special],
            remove: hand,
            movement: self.movement_mask(player, |resource, amount| p.can_pay(resource, amount)),
            shop: self.shop.available_mask(p.resources.coins),
        };
        if let Some(pending) = self.pending.as_ref().filter(|pending| pending.player == player) {
            pending.mask.apply(&mut mask);
        }
        Ok(mask)
    }

    /// Movement mask with the leading "stay" option
    fn movement_mask<F>(&self, player: PlayerId, can_pay: F) -> [bool; 7]
    where
        F: Fn(Resource, u8) -> bool,
    {
        let directions = self.map.movement_mask(player, can_pay);
        let mut mask = [true; 7];
        mask[1..].copy_from_slice(&directions);
        mask
    }

    /// Submit the selected player's action.
    ///
    /// A rejected action leaves the game untouched, except that a pending
    /// override is used up either way.
    pub fn step(&mut self, player: PlayerId, action: &Action) -> Result<StepOutcome, GameError> {
        if self.done {
            return Err(GameError::EpisodeOver);
        }
        if player != self.current {
            return Err(GameError::NotYourTurn {
                expected: self.current,
                got: player,
            });
        }

        let mut events = Vec::new();

        if let Some(pending) = self.pending.take() {
            trace!(player, card = ?pending.card, "running follow-up");
            self.run_follow_up(&pending, action, &mut events)?;
            self.maybe_end_turn(&mut events);
            return Ok(self.finish_step(events));
        }

        let phase = self.players[player].phase;
        if phase == TurnPhase::Inactive && self.map.is_at_end(player) {
            debug!(player, steps = self.steps, turns = self.turns, "episode finished");
            self.done = true;
            events.push(GameEvent::EpisodeFinished { truncated: false });
            return Ok(self.finish_step(events));
        }

        let acting = match phase {
            TurnPhase::Inactive => TurnPhase::Movement,
            other => other,
        };
        self.validate(player, acting, action)?;

        if acting != phase {
            self.players[player].phase = acting;
            events.push(GameEvent::TurnStarted { player });
        }
        trace!(player, phase = ?acting, ?action, "step");

        match acting {
            TurnPhase::Movement => match action.movement {
                Some(direction) => self.move_player(player, direction, &mut events)?,
                None => {
                    self.players[player].tag_for_removal(&action.remove);
                    self.play_card(player, action, &mut events)?;
                }
            },
            TurnPhase::Buying => match action.buy {
                Some(index) => self.buy(player, index, &mut events)?,
                None => self.play_card(player, action, &mut events)?,
            },
            TurnPhase::Inactive | TurnPhase::Dead => {}
        }

        if action.play.is_none() {
            let leaves_phase = match acting {
                TurnPhase::Movement => action.movement.is_none(),
                TurnPhase::Buying => action.buy.is_none(),
                TurnPhase::Inactive | TurnPhase::Dead => false,
            };
            if leaves_phase {
                let next = acting.next();
                self.players[player].phase = next;
                events.push(GameEvent::PhaseChanged { player, phase: next });
            }
        }

        self.maybe_end_turn(&mut events);
        Ok(self.finish_step(events))
    }

    /// Reject anything the masks would forbid before state changes
    fn validate(&self, player: PlayerId, phase: TurnPhase, action: &Action) -> Result<(), GameError> {
        let p = &self.players[player];
        let card_in_hand = |kind: CardType| match p.deck.find_in_hand(kind) {
            Some(_) => Ok(()),
            None => Err(GameError::CardNotInHand(kind)),
        };

        match phase {
            TurnPhase::Movement => match action.movement {
                Some(direction) => {
                    let mask = self.map.movement_mask(player, |resource, amount| p.can_pay(resource, amount));
                    if !mask[direction.index()] {
                        return Err(GameError::InvalidMove(direction));
                    }
                }
                None => {
                    if let Some(kind) = action.play {
                        card_in_hand(kind)?;
                    }
                }
            },
            TurnPhase::Buying => match action.buy {
                Some(index) => {
                    let kind = self.shop.check_buy(index)?;
                    if !p.resources.coins.covers(kind.cost()) {
                        return Err(GameError::CannotAfford {
                            resource: Resource::Coin,
                            amount: kind.cost(),
                        });
                    }
                }
                None => {
                    if let Some(kind) = action.play {
                        card_in_hand(kind)?;
                    }
                }
            },
            TurnPhase::Inactive | TurnPhase::Dead => {}
        }
        Ok(())
    }

    fn move_player(&mut self, player: PlayerId, direction: Direction, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let movement = self.map.move_in_direction(player, direction)?;
        let p = &mut self.players[player];

        if let Some(resource) = movement.resource {
            p.pay(resource, movement.required)?;
            if resource == Resource::Remove {
                let count = p.remove_tagged(movement.required as usize, true, &mut self.rng)?;
                events.push(GameEvent::CardsRemoved { player, count });
            }
        }
        p.has_won = movement.reached_end;
        p.stats.movements += 1;

        events.push(GameEvent::Moved {
            player,
            direction,
            resource: movement.resource,
            cost: movement.required,
        });
        if movement.reached_end {
            debug!(player, "reached the goal");
            events.push(GameEvent::ReachedGoal { player });
        }
        Ok(())
    }

    fn buy(&mut self, player: PlayerId, index: usize, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let card = self.shop.buy(index)?;
        let p = &mut self.players[player];
        p.pay(Resource::Coin, card.cost())?;
        p.deck.add(Card::new(card));
        p.stats.cards_added += 1;
        events.push(GameEvent::CardBought { player, card });
        Ok(())
    }

    /// Play the action's card, if any. A special play installs its follow-up
    /// (with the mask as it stands now) and then draws.
    fn play_card(&mut self, player: PlayerId, action: &Action, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let Some(kind) = action.play else {
            return Ok(());
        };
        let played = self.players[player].play_card(kind, action.use_special)?;
        if played.removed {
            trace!(player, card = ?kind, "single-use card left the deck");
        }

        let Some(special) = played.special else {
            events.push(GameEvent::CardPlayed { player, card: kind });
            return Ok(());
        };
        events.push(GameEvent::SpecialUsed { player, card: kind });

        if let Some(follow_up) = special.follow_up {
            let mask = self.follow_up_mask(player, follow_up);
            self.pending = Some(PendingOverride {
                player,
                card: kind,
                follow_up,
                mask,
            });
        }
        if special.draw > 0 {
            let count = self.players[player]
                .deck
                .draw(usize::from(special.draw), &mut self.rng);
            events.push(GameEvent::CardsDrawn { player, count });
        }
        Ok(())
    }

    fn follow_up_mask(&self, player: PlayerId, follow_up: FollowUp) -> MaskPatch {
        match follow_up {
            FollowUp::Transmit => MaskPatch {
                movement: None,
                shop: Some(self.shop.transmit_mask()),
            },
            FollowUp::FreeMove => MaskPatch {
                movement: Some(self.movement_mask(player, |_, _| true)),
                shop: None,
            },
            FollowUp::RemoveTagged(_) => MaskPatch::default(),
        }
    }

    fn run_follow_up(
        &mut self,
        pending: &PendingOverride,
        action: &Action,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let player = pending.player;
        match pending.follow_up {
            FollowUp::Transmit => {
                if let Some(index) = action.buy {
                    let card = self.shop.transmit(index)?;
                    let p = &mut self.players[player];
                    p.deck.add(Card::new(card));
                    p.stats.cards_added += 1;
                    events.push(GameEvent::CardAcquired { player, card });
                }
            }
            FollowUp::RemoveTagged(limit) => {
                let p = &mut self.players[player];
                p.tag_for_removal(&action.remove);
                let count = p.remove_tagged(usize::from(limit), false, &mut self.rng)?;
                if count > 0 {
                    events.push(GameEvent::CardsRemoved { player, count });
                }
            }
            FollowUp::FreeMove => {
                if let Some(direction) = action.movement {
                    let movement = self.map.move_in_direction(player, direction)?;
                    let p = &mut self.players[player];
                    p.has_won = movement.reached_end;
                    p.stats.movements += 1;
                    events.push(GameEvent::Moved {
                        player,
                        direction,
                        resource: movement.resource,
                        cost: 0,
                    });
                    if movement.reached_end {
                        events.push(GameEvent::ReachedGoal { player });
                    }
                }
            }
        }
        Ok(())
    }

    /// Hand over to the next player once the current one has won or passed the buying phase
    fn maybe_end_turn(&mut self, events: &mut Vec<GameEvent>) {
        let player = self.current;
        let p = &mut self.players[player];
        if !(p.has_won || matches!(p.phase, TurnPhase::Inactive | TurnPhase::Dead)) {
            return;
        }

        p.end_turn(&mut self.rng);
        self.turns += 1;
        self.current = (player + 1) % self.players.len();
        trace!(player, next = self.current, turns = self.turns, "turn ended");
        events.push(GameEvent::TurnEnded { player });
    }

    fn finish_step(&mut self, mut events: Vec<GameEvent>) -> StepOutcome {
        self.steps += 1;
        if !self.done {
            if let Some(cap) = self.config.max_steps {
                if self.steps >= cap {
                    debug!(steps = self.steps, "episode truncated");
                    self.done = true;
                    self.truncated = true;
                    events.push(GameEvent::EpisodeFinished { truncated: true });
                }
            }
        }
        StepOutcome {
            next_player: self.current,
            done: self.done,
            truncated: self.truncated,
            events,
        }
    }

    /// Per-player rewards: winners get `players - winners`, everyone else `-winners`.
    ///
    /// With no winner everyone gets -1.
    pub fn rewards(&self) -> Vec<i32> {
        let players = self.players.len() as i32;
        let winners = self.players.iter().filter(|p| p.has_won).count().max(1) as i32;
        self.players
            .iter()
            .map(|p| players * i32::from(p.has_won) - winners)
            .collect()
    }

    pub fn episode_info(&self) -> EpisodeInfo {
        EpisodeInfo {
            turns: self.turns,
            steps: self.steps,
            truncated: self.truncated,
            winners: self
                .players
                .iter()
                .filter(|p| p.has_won)
                .map(|p| p.id)
                .collect(),
            players: self.players.iter().map(|p| p.stats.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Deck;
    use crate::hex::{DoubledCoord, HexCoord};
    use crate::pieces::{PieceKind, PlacedPiece};
    use crate::shop::BUYABLE;
    use pretty_assertions::assert_eq;

    fn new_game(players: u8) -> Game {
        Game::new(GameConfig::new(17, players, 3, Difficulty::Easy)).unwrap()
    }

    /// Start piece with a paddle goal hanging off the first start hex
    fn with_goal_map(game: &mut Game) {
        let start = PlacedPiece::new(PieceKind::StartA, DoubledCoord::ORIGIN, 0).unwrap();
        let goal = PlacedPiece::new(PieceKind::GoalPaddle, DoubledCoord::new(0, -8), 0).unwrap();
        let mut map = Map::from_pieces(vec![start, goal]);
        map.add_players(game.player_count()).unwrap();
        game.map = map;
    }

    fn set_hand(game: &mut Game, player: PlayerId, hand: &[CardType]) {
        game.players[player].deck = Deck::from_piles(hand, &[CardType::Explorer; 4]);
    }

    fn deck_is_consistent(game: &Game) -> bool {
        game.players
            .iter()
            .all(|p| p.deck.len() == p.deck.owned_total())
    }

    #[test]
    fn test_new_game_starts_with_first_player() {
        let game = new_game(3);
        assert_eq!(game.current_player(), 0);
        assert_eq!(game.player_count(), 3);
        assert!(!game.is_done());
        for player in game.players() {
            assert_eq!(player.phase, TurnPhase::Inactive);
            assert_eq!(player.deck.hand().len(), 4);
        }
        assert!(Game::new(GameConfig::new(0, 5, 3, Difficulty::Easy)).is_err());
    }

    #[test]
    fn test_same_seed_same_episode() {
        let a = new_game(2);
        let b = new_game(2);
        assert_eq!(a.map().pieces(), b.map().pieces());
        assert_eq!(a.observe(1).unwrap(), b.observe(1).unwrap());
    }

    #[test]
    fn test_passing_walks_through_phases() {
        let mut game = new_game(2);

        let outcome = game.step(0, &Action::pass()).unwrap();
        assert_eq!(game.players[0].phase, TurnPhase::Buying);
        assert_eq!(outcome.next_player, 0);
        assert!(outcome.events.contains(&GameEvent::TurnStarted { player: 0 }));

        let outcome = game.step(0, &Action::pass()).unwrap();
        assert_eq!(outcome.next_player, 1);
        assert!(outcome.events.contains(&GameEvent::TurnEnded { player: 0 }));
        assert_eq!(game.players[0].phase, TurnPhase::Inactive);
        assert_eq!(game.turns(), 1);
        assert_eq!(game.players[0].stats.turns, 1);
    }

    #[test]
    fn test_wrong_player_is_rejected() {
        let mut game = new_game(2);
        assert_eq!(
            game.step(1, &Action::pass()),
            Err(GameError::NotYourTurn { expected: 0, got: 1 })
        );
        assert_eq!(game.steps(), 0);
    }

    #[test]
    fn test_invalid_actions_change_nothing() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Explorer; 4]);

        // No resources yet, so no move is affordable
        assert_eq!(
            game.step(0, &Action::move_to(Direction::NorthEast)),
            Err(GameError::InvalidMove(Direction::NorthEast))
        );
        assert_eq!(game.players[0].phase, TurnPhase::Inactive);

        assert_eq!(
            game.step(0, &Action::play(CardType::Native)),
            Err(GameError::CardNotInHand(CardType::Native))
        );

        game.step(0, &Action::pass()).unwrap();
        assert_eq!(
            game.step(0, &Action::buy(0)),
            Err(GameError::CannotAfford {
                resource: Resource::Coin,
                amount: 1
            })
        );
        assert_eq!(
            game.step(0, &Action::buy(2)),
            Err(GameError::Shop(ShopError::MarketFull(CardType::Pioneer)))
        );
        assert_eq!(game.shop().stock(0), 3);
        assert_eq!(game.players[0].phase, TurnPhase::Buying);
    }

    #[test]
    fn test_play_then_move_pays_resources() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Explorer, CardType::Sailor, CardType::Traveler, CardType::Traveler]);

        game.step(0, &Action::play(CardType::Explorer)).unwrap();
        assert_eq!(game.players[0].phase, TurnPhase::Movement);
        assert_eq!(game.players[0].resources.machete, 1);

        let mask = game.action_mask(0).unwrap();
        assert!(mask.can_move(Direction::NorthEast));
        assert!(!mask.can_move(Direction::East));
        assert!(!mask.can_play(CardType::Explorer));

        let outcome = game.step(0, &Action::move_to(Direction::NorthEast)).unwrap();
        assert!(matches!(
            outcome.events.as_slice(),
            [GameEvent::Moved {
                player: 0,
                direction: Direction::NorthEast,
                resource: Some(Resource::Machete),
                cost: 1
            }]
        ));
        assert_eq!(game.players[0].resources.machete, 0);
        assert_eq!(game.players[0].stats.movements, 1);
        assert_eq!(game.players[0].stats.spent[Resource::Machete.index()], 1);
        assert_eq!(game.map().player_location(0), Some(HexCoord::new(0, -2)));
        assert_eq!(game.players[0].phase, TurnPhase::Movement);
    }

    #[test]
    fn test_buying_phase() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Traveler, CardType::Traveler, CardType::Explorer, CardType::Sailor]);
        game.step(0, &Action::pass()).unwrap();

        game.step(0, &Action::play(CardType::Traveler)).unwrap();
        game.step(0, &Action::play(CardType::Explorer)).unwrap();
        assert_eq!(game.players[0].resources.coins.as_f32(), 1.5);

        let outcome = game.step(0, &Action::buy(0)).unwrap();
        assert!(outcome
            .events
            .contains(&GameEvent::CardBought { player: 0, card: BUYABLE[0] }));
        assert_eq!(game.players[0].resources.coins.as_f32(), 0.5);
        assert_eq!(game.players[0].deck.discard_counts()[CardType::Scout.index()], 1);
        assert_eq!(game.players[0].stats.cards_added, 1);
        // A purchase keeps the buying phase open
        assert_eq!(game.players[0].phase, TurnPhase::Buying);
        assert_eq!(game.shop().stock(0), 2);
        assert!(deck_is_consistent(&game));
    }

    #[test]
    fn test_transmitter_follow_up() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Transmitter, CardType::Explorer]);

        let outcome = game.step(0, &Action::play_special(CardType::Transmitter)).unwrap();
        assert!(outcome
            .events
            .contains(&GameEvent::SpecialUsed { player: 0, card: CardType::Transmitter }));
        let pending = game.pending_override().unwrap();
        assert_eq!(pending.follow_up, FollowUp::Transmit);

        // Any in-stock card is offered, market board or not, whatever the coins
        let mask = game.action_mask(0).unwrap();
        assert!(mask.shop.iter().all(|&m| m));
        assert!(!game.action_mask(1).unwrap().can_buy(2));

        let outcome = game.step(0, &Action::buy(2)).unwrap();
        assert_eq!(
            outcome.events,
            vec![GameEvent::CardAcquired { player: 0, card: CardType::Pioneer }]
        );
        assert!(game.pending_override().is_none());
        assert_eq!(game.shop().stock(2), 2);
        assert!(!game.shop().is_in_market(2));
        let p = &game.players[0];
        assert_eq!(p.deck.discard_counts()[CardType::Pioneer.index()], 1);
        assert_eq!(p.deck.owned_counts()[CardType::Transmitter.index()], 0);
        assert_eq!(p.phase, TurnPhase::Movement);
    }

    #[test]
    fn test_failed_follow_up_is_still_consumed() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Transmitter]);
        game.step(0, &Action::play_special(CardType::Transmitter)).unwrap();

        assert_eq!(
            game.step(0, &Action::buy(40)),
            Err(GameError::Shop(ShopError::UnknownCard(40)))
        );
        assert!(game.pending_override().is_none());

        // The next action goes through the regular phase logic again
        game.step(0, &Action::pass()).unwrap();
        assert_eq!(game.players[0].phase, TurnPhase::Buying);
    }

    #[test]
    fn test_native_moves_for_free() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Native]);
        game.step(0, &Action::play_special(CardType::Native)).unwrap();

        let mask = game.action_mask(0).unwrap();
        assert_eq!(mask.movement, [true, false, true, true, false, false, false]);

        game.step(0, &Action::move_to(Direction::NorthWest)).unwrap();
        let p = &game.players[0];
        assert_eq!(game.map().player_location(0), Some(HexCoord::new(-1, -2)));
        assert_eq!(p.stats.spent, [0; Resource::COUNT]);
        assert_eq!(p.stats.movements, 1);
        assert!(game.pending_override().is_none());
    }

    #[test]
    fn test_native_without_direction_does_nothing() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Native]);
        game.step(0, &Action::play_special(CardType::Native)).unwrap();

        let outcome = game.step(0, &Action::pass()).unwrap();
        assert!(outcome.events.is_empty());
        assert_eq!(game.map().player_location(0), Some(HexCoord::new(0, -3)));
        assert_eq!(game.map().get(&HexCoord::new(0, -3)).unwrap().occupant(), 1);
        assert_eq!(game.players[0].phase, TurnPhase::Movement);
    }

    #[test]
    fn test_scientist_draws_then_removes() {
        let mut game = new_game(2);
        set_hand(&mut game, 0, &[CardType::Scientist, CardType::Sailor, CardType::Traveler]);

        let outcome = game.step(0, &Action::play_special(CardType::Scientist)).unwrap();
        assert!(outcome
            .events
            .contains(&GameEvent::CardsDrawn { player: 0, count: 1 }));
        assert_eq!(game.players[0].deck.hand().len(), 3);
        assert_eq!(game.action_mask(0).unwrap().movement[0], true);

        let action = Action::pass()
            .with_removal(CardType::Sailor, 1)
            .with_removal(CardType::Traveler, 1);
        let outcome = game.step(0, &action).unwrap();
        assert_eq!(outcome.events, vec![GameEvent::CardsRemoved { player: 0, count: 1 }]);

        let p = &game.players[0];
        assert_eq!(p.deck.hand().len(), 2);
        assert_eq!(p.stats.cards_removed, 1);
        assert_eq!(p.deck.owned_total(), 6);
        assert!(deck_is_consistent(&game));
    }

    #[test]
    fn test_reaching_the_goal_ends_the_episode() {
        let mut game = new_game(2);
        with_goal_map(&mut game);
        set_hand(&mut game, 0, &[CardType::Sailor, CardType::Explorer]);

        game.step(0, &Action::play(CardType::Sailor)).unwrap();
        assert!(game.action_mask(0).unwrap().can_move(Direction::SouthWest));

        let outcome = game.step(0, &Action::move_to(Direction::SouthWest)).unwrap();
        assert!(outcome.events.contains(&GameEvent::ReachedGoal { player: 0 }));
        assert!(outcome.events.contains(&GameEvent::TurnEnded { player: 0 }));
        assert_eq!(outcome.next_player, 1);
        assert!(!outcome.done);
        assert!(game.players[0].has_won);
        assert_eq!(game.players[0].phase, TurnPhase::Inactive);
        // The goal never holds an occupant
        assert_eq!(game.map().get(&HexCoord::new(0, -4)).unwrap().occupant(), 0);
        assert!(game.map().is_at_end(0));

        // The round finishes before the episode ends
        game.step(1, &Action::pass()).unwrap();
        let outcome = game.step(1, &Action::pass()).unwrap();
        assert_eq!(outcome.next_player, 0);
        assert!(!outcome.done);

        let outcome = game.step(0, &Action::pass()).unwrap();
        assert!(outcome.done);
        assert!(!outcome.truncated);
        assert_eq!(game.rewards(), vec![1, -1]);
        assert_eq!(game.step(0, &Action::pass()), Err(GameError::EpisodeOver));

        let info = game.episode_info();
        assert_eq!(info.winners, vec![0]);
        assert_eq!(info.turns, 2);
        assert_eq!(info.players[0].spent[Resource::Paddle.index()], 1);
    }

    #[test]
    fn test_step_cap_truncates() {
        let mut game = Game::new(GameConfig::new(3, 2, 2, Difficulty::Medium).with_max_steps(3)).unwrap();
        assert!(!game.step(0, &Action::pass()).unwrap().done);
        assert!(!game.step(0, &Action::pass()).unwrap().done);
        let outcome = game.step(1, &Action::pass()).unwrap();
        assert!(outcome.done);
        assert!(outcome.truncated);
        assert!(outcome
            .events
            .contains(&GameEvent::EpisodeFinished { truncated: true }));
        assert_eq!(game.rewards(), vec![-1, -1]);
    }

    #[test]
    fn test_rewards_with_several_winners() {
        let mut game = new_game(4);
        game.players[0].has_won = true;
        game.players[2].has_won = true;
        assert_eq!(game.rewards(), vec![2, -2, 2, -2]);
    }

    #[test]
    fn test_reset_keeps_step_cap() {
        let mut game = Game::new(GameConfig::new(1, 2, 2, Difficulty::Easy).with_max_steps(50)).unwrap();
        game.step(0, &Action::pass()).unwrap();
        game.reset(2, 3, 4, Difficulty::Hard).unwrap();
        assert_eq!(game.steps(), 0);
        assert_eq!(game.player_count(), 3);
        assert_eq!(game.config().max_steps, Some(50));
        assert_eq!(game.map().pieces().len(), 6);
    }
}
