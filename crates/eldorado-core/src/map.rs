//! Hex cells, procedural map assembly, and player positions.
//!
//! This module contains:
//! - Resource kinds a hex can demand
//! - The hex cell type with its occupancy rules
//! - Map generation from a chain of [`PlacedPiece`]s
//! - Movement and the per-direction movement mask

use crate::hex::{Direction, DoubledCoord, HexCoord};
use crate::pieces::{Connection, Difficulty, PieceCategory, PieceKind, PlacedPiece, Shape};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::iter;
use thiserror::Error;
use tracing::{debug, warn};

/// Number of whole-map restarts before generation gives up
pub const MAX_GENERATION_ATTEMPTS: u32 = 5;

/// Number of features reported per cell in a map observation
pub const CELL_FEATURES: usize = 7;

/// 0-based player index, in turn order
pub type PlayerId = usize;

/// Per-cell observation: relative occupant, required amount per resource, end flag
pub type CellFeatures = [u8; CELL_FEATURES];

/// Resource kinds. Hexes demand them and cards grant them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    /// Cuts through jungle hexes
    Machete,
    /// Crosses water hexes
    Paddle,
    /// Buys cards, and pays for village hexes
    Coin,
    /// Cards played this turn; pays for basecamp hexes
    Use,
    /// Cards tagged for removal; pays for rubble hexes
    Remove,
}

impl Resource {
    /// All resource kinds, in observation order
    pub const ALL: [Resource; 5] = [
        Resource::Machete,
        Resource::Paddle,
        Resource::Coin,
        Resource::Use,
        Resource::Remove,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }
}

/// What kind of ground a hex is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HexKind {
    /// Ordinary terrain paid for with its resource
    Path,
    /// Impassable
    Mountain,
    /// Player start position (1-based); never entered once left
    Start(u8),
    /// Goal region; reaching it wins
    Goal,
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapError {
    #[error("Map generation failed after {attempts} attempts")]
    GenerationFailed { attempts: u32 },

    #[error("A map needs at least one travel piece")]
    NoTravelPieces,

    #[error("Piece {kind:?} does not fit the hex grid at {center:?}")]
    MisalignedPiece { kind: PieceKind, center: DoubledCoord },

    #[error("Start piece has {available} start hexes, {requested} players requested")]
    TooManyPlayers { requested: usize, available: usize },

    #[error("Unknown player {0}")]
    UnknownPlayer(usize),

    #[error("Player {0} does not occupy its recorded hex")]
    MissingOccupant(usize),

    #[error("No hex at {0:?}")]
    OffBoard(HexCoord),

    #[error("Hex cannot be occupied")]
    Impassable,

    #[error("Hex at {0:?} is already occupied")]
    Occupied(HexCoord),
}

/// A single map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    pub kind: HexKind,
    /// Resource demanded to enter, if any
    pub resource: Option<Resource>,
    /// Amount of `resource` needed
    pub required: u8,
    /// 0 when empty, otherwise the 1-based player id
    occupant: u8,
}

impl Hex {
    pub const fn path(resource: Resource, required: u8) -> Self {
        Self {
            kind: HexKind::Path,
            resource: Some(resource),
            required,
            occupant: 0,
        }
    }

    pub const fn mountain() -> Self {
        Self {
            kind: HexKind::Mountain,
            resource: None,
            required: 0,
            occupant: 0,
        }
    }

    pub const fn start(number: u8) -> Self {
        Self {
            kind: HexKind::Start(number),
            resource: None,
            required: 0,
            occupant: 0,
        }
    }

    pub const fn goal(resource: Resource, required: u8) -> Self {
        Self {
            kind: HexKind::Goal,
            resource: Some(resource),
            required,
            occupant: 0,
        }
    }

    pub fn is_end(&self) -> bool {
        self.kind == HexKind::Goal
    }

    /// Whether a player may move onto this hex (ignoring cost and occupancy)
    pub fn is_enterable(&self) -> bool {
        matches!(self.kind, HexKind::Path | HexKind::Goal)
    }

    pub fn occupant(&self) -> u8 {
        self.occupant
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant != 0
    }

    /// Place a player (1-based id) on this hex, or clear it with 0.
    ///
    /// Goal hexes accept the call but stay empty: a player who reaches the
    /// goal has left the board.
    pub fn set_occupant(&mut self, occupant: u8) -> Result<(), MapError> {
        match self.kind {
            HexKind::Mountain => Err(MapError::Impassable),
            HexKind::Goal => Ok(()),
            HexKind::Path | HexKind::Start(_) => {
                self.occupant = occupant;
                Ok(())
            }
        }
    }

    /// Observation row for this hex, given the occupant as seen by the observer
    pub fn features(&self, relative_occupant: u8) -> CellFeatures {
        let mut features = [0; CELL_FEATURES];
        features[0] = relative_occupant;
        if let Some(resource) = self.resource {
            features[1 + resource.index()] = self.required;
        }
        features[CELL_FEATURES - 1] = u8::from(self.is_end());
        features
    }
}

/// Result of moving a player one hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Resource demanded by the destination
    pub resource: Option<Resource>,
    /// Amount demanded
    pub required: u8,
    /// Destination is part of the goal
    pub reached_end: bool,
}

/// The assembled map: placed pieces, a sparse hex lookup, and player positions.
#[derive(Debug, Clone)]
pub struct Map {
    pieces: Vec<PlacedPiece>,
    cells: HashMap<HexCoord, Hex>,
    /// Cell coordinates in piece order, for stable observations
    order: Vec<HexCoord>,
    /// Indexed by 0-based player
    player_locations: Vec<HexCoord>,
}

impl Map {
    /// Build the lookup tables from an already validated chain of pieces
    pub fn from_pieces(pieces: Vec<PlacedPiece>) -> Self {
        let mut cells = HashMap::new();
        let mut order = Vec::new();
        for piece in &pieces {
            for (coord, hex) in piece.cells().iter().zip(piece.kind.tiles()) {
                cells.insert(*coord, *hex);
                order.push(*coord);
            }
        }
        Self {
            pieces,
            cells,
            order,
            player_locations: Vec::new(),
        }
    }

    /// Assemble a map of one start piece, `piece_count` travel pieces and one goal.
    ///
    /// Travel pieces are drawn from those at or below `difficulty`. Any dead end
    /// restarts the whole assembly with the same rng, up to
    /// [`MAX_GENERATION_ATTEMPTS`] times.
    pub fn generate<R: Rng + ?Sized>(
        piece_count: u8,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<Self, MapError> {
        if piece_count == 0 {
            return Err(MapError::NoTravelPieces);
        }

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            match assemble(piece_count, difficulty, rng) {
                Some(pieces) => {
                    debug!(attempt, pieces = pieces.len(), "map assembled");
                    return Ok(Self::from_pieces(pieces));
                }
                None => debug!(attempt, "map assembly hit a dead end, restarting"),
            }
        }

        warn!(%difficulty, piece_count, "giving up on map generation");
        Err(MapError::GenerationFailed {
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    /// Put players on the first `count` start hexes of the start piece
    pub fn add_players(&mut self, count: usize) -> Result<(), MapError> {
        let starts: Vec<HexCoord> = match self.pieces.first() {
            Some(piece) => piece
                .cells()
                .iter()
                .copied()
                .filter(|coord| matches!(self.cells.get(coord).map(|h| h.kind), Some(HexKind::Start(_))))
                .take(count)
                .collect(),
            None => Vec::new(),
        };
        if starts.len() < count {
            return Err(MapError::TooManyPlayers {
                requested: count,
                available: starts.len(),
            });
        }

        for coord in std::mem::take(&mut self.player_locations) {
            if let Some(hex) = self.cells.get_mut(&coord) {
                hex.set_occupant(0)?;
            }
        }
        for (player, coord) in starts.iter().enumerate() {
            if let Some(hex) = self.cells.get_mut(coord) {
                hex.set_occupant(player as u8 + 1)?;
            }
        }
        self.player_locations = starts;
        Ok(())
    }

    pub fn pieces(&self) -> &[PlacedPiece] {
        &self.pieces
    }

    pub fn get(&self, coord: &HexCoord) -> Option<&Hex> {
        self.cells.get(coord)
    }

    /// All cells in piece order
    pub fn cells(&self) -> impl Iterator<Item = (HexCoord, &Hex)> + '_ {
        self.order
            .iter()
            .filter_map(|coord| self.cells.get(coord).map(|hex| (*coord, hex)))
    }

    pub fn cell_count(&self) -> usize {
        self.order.len()
    }

    pub fn player_count(&self) -> usize {
        self.player_locations.len()
    }

    pub fn player_location(&self, player: PlayerId) -> Option<HexCoord> {
        self.player_locations.get(player).copied()
    }

    /// Whether the player stands on a goal hex
    pub fn is_at_end(&self, player: PlayerId) -> bool {
        self.player_location(player)
            .and_then(|coord| self.cells.get(&coord))
            .is_some_and(Hex::is_end)
    }

    /// Move a player one hex. The caller deducts the returned cost.
    ///
    /// Nothing changes if the move is rejected.
    pub fn move_in_direction(&mut self, player: PlayerId, direction: Direction) -> Result<Movement, MapError> {
        let from = self
            .player_location(player)
            .ok_or(MapError::UnknownPlayer(player))?;
        let id = player as u8 + 1;
        match self.cells.get(&from) {
            Some(source) if source.occupant() == id => {}
            _ => return Err(MapError::MissingOccupant(player)),
        }

        let to = from.neighbor(direction);
        let target = *self.cells.get(&to).ok_or(MapError::OffBoard(to))?;
        if !target.is_enterable() {
            return Err(MapError::Impassable);
        }
        if target.is_occupied() {
            return Err(MapError::Occupied(to));
        }

        if let Some(source) = self.cells.get_mut(&from) {
            source.set_occupant(0)?;
        }
        if let Some(dest) = self.cells.get_mut(&to) {
            dest.set_occupant(id)?;
        }
        self.player_locations[player] = to;

        Ok(Movement {
            resource: target.resource,
            required: target.required,
            reached_end: target.is_end(),
        })
    }

    /// Which of the six directions the player could move in, given a payment check.
    pub fn movement_mask<F>(&self, player: PlayerId, can_pay: F) -> [bool; 6]
    where
        F: Fn(Resource, u8) -> bool,
    {
        let Some(from) = self.player_location(player) else {
            return [false; 6];
        };
        Direction::ALL.map(|direction| {
            self.cells.get(&from.neighbor(direction)).is_some_and(|hex| {
                hex.is_enterable()
                    && !hex.is_occupied()
                    && hex.resource.map_or(true, |resource| can_pay(resource, hex.required))
            })
        })
    }

    /// One feature row per cell, with occupants renumbered so the observer is 1.
    ///
    /// Occupants come from the player positions, so players on a goal hex stay visible.
    pub fn observation(&self, player: PlayerId) -> Vec<CellFeatures> {
        let mut rows: Vec<CellFeatures> = self.cells().map(|(_, hex)| hex.features(0)).collect();
        let players = self.player_count().max(1);
        for (id, location) in self.player_locations.iter().enumerate() {
            if let Some(index) = self.order.iter().position(|coord| coord == location) {
                rows[index][0] = ((id + players - player % players) % players + 1) as u8;
            }
        }
        rows
    }
}

/// One full assembly attempt; `None` on any dead end.
fn assemble<R: Rng + ?Sized>(piece_count: u8, difficulty: Difficulty, rng: &mut R) -> Option<Vec<PlacedPiece>> {
    let start = *PieceKind::of_category(PieceCategory::Start).choose(rng)?;
    let mut placed = vec![PlacedPiece::new(start, DoubledCoord::ORIGIN, 0).ok()?];

    let travel: Vec<PieceKind> = PieceKind::of_category(PieceCategory::Travel)
        .into_iter()
        .filter(|kind| kind.difficulty() <= difficulty)
        .collect();

    for i in 0..piece_count {
        let after_small = placed.last().is_some_and(|p| p.kind.shape() == Shape::Small);
        let last = i + 1 == piece_count;
        let pool: Vec<PieceKind> = travel
            .iter()
            .copied()
            .filter(|kind| kind.shape() != Shape::Small || !(after_small || last))
            .collect();
        let kind = *pool.choose(rng)?;
        let piece = place_next(&placed, kind, rng)?;
        placed.push(piece);
    }

    let goal = *PieceKind::of_category(PieceCategory::End).choose(rng)?;
    let piece = place_next(&placed, goal, rng)?;
    placed.push(piece);
    Some(placed)
}

/// Attach `kind` to the last placed piece at a random free connection point.
///
/// Candidates may not touch any earlier piece, not even diagonally through a
/// one-hex gap, and may not overlap the piece they attach to.
fn place_next<R: Rng + ?Sized>(placed: &[PlacedPiece], kind: PieceKind, rng: &mut R) -> Option<PlacedPiece> {
    let (prev, earlier) = placed.split_last()?;

    let buffer: HashSet<HexCoord> = earlier
        .iter()
        .flat_map(|piece| piece.cells())
        .flat_map(|coord| iter::once(*coord).chain(coord.neighbors()))
        .collect();
    let prev_cells: HashSet<HexCoord> = prev.cells().iter().copied().collect();

    let shape = kind.shape();
    let candidates: Vec<Connection> = prev
        .connection_points(kind)
        .into_iter()
        .filter(|connection| {
            connection
                .rotations
                .first()
                .and_then(|&rotation| shape.footprint(connection.center, rotation))
                .is_some_and(|cells| {
                    cells
                        .iter()
                        .all(|coord| !buffer.contains(coord) && !prev_cells.contains(coord))
                })
        })
        .collect();

    let connection = candidates.choose(rng)?;
    let rotation = *connection.rotations.choose(rng)?;
    PlacedPiece::new(kind, connection.center, rotation).ok()
}
