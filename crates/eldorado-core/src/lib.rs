//! Eldorado - a deterministic simulation engine for a hex racing deck-builder
//!
//! Players race across a procedurally assembled hex map to a goal region,
//! paying for each hex with resources granted by the cards they play, and
//! buying better cards along the way. This crate provides:
//! - Hex coordinates, rotation and piece geometry
//! - Map assembly from interlocking pieces, with movement and occupancy
//! - The card catalog, per-player decks and the shared shop
//! - The turn/phase state machine, observations, action masks and rewards
//!
//! # Architecture
//!
//! The engine is synchronous and single-threaded: one [`Game`] owns all of an
//! episode's state and its random stream. Hosts that want throughput run many
//! independent games in parallel.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates and directions
//! - [`pieces`]: Piece shapes, the piece catalog and connection geometry
//! - [`map`]: Hex cells, map generation and movement
//! - [`cards`]: Card archetypes and deck piles
//! - [`shop`]: The shop and its market board
//! - [`player`]: Player resources, turn phase and card play
//! - [`actions`]: Actions, masks, observations and events
//! - [`config`]: Episode configuration
//! - [`game`]: Game state machine

pub mod actions;
pub mod cards;
pub mod config;
pub mod game;
pub mod hex;
pub mod map;
pub mod pieces;
pub mod player;
pub mod shop;

// Re-export commonly used types
pub use actions::{Action, ActionMask, GameEvent, MaskPatch, Observation, StepOutcome};
pub use cards::{Card, CardCounts, CardType, Deck, FollowUp, Special, CARD_TYPES, HAND_SIZE};
pub use config::GameConfig;
pub use game::{EpisodeInfo, Game, GameError, PendingOverride};
pub use hex::{Direction, HexCoord};
pub use map::{Hex, Map, MapError, PlayerId, Resource};
pub use pieces::{Difficulty, PieceKind};
pub use player::{Coins, Player, PlayerStats, ResourceHand, TurnPhase};
pub use shop::{Shop, ShopError, BUYABLE, SHOP_TYPES};
