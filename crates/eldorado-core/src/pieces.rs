//! Map pieces: rigid clusters of hexes placed as one unit during generation.
//!
//! Every piece is described by data alone:
//! - a [`Shape`] giving the relative cell offsets and connection geometry
//! - a [`PieceKind`] catalog entry giving category, difficulty and tile contents
//!
//! Geometry is expressed in [`DoubledCoord`]s because small pieces are centered
//! between hexes. A placed piece is the shape rotated about its center and
//! translated, then halved back onto the hex grid.

use crate::hex::{DoubledCoord, HexCoord};
use crate::map::{Hex, MapError, Resource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty tier of a piece; the episode's ceiling filters the travel pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

/// Role of a piece in the assembled path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceCategory {
    Start,
    Travel,
    End,
}

/// Geometric shape of a piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// Radius-3 hexagon, 37 cells
    Large,
    /// Three rows of 5/6/5 cells, centered between hexes
    Small,
    /// Three-cell goal
    Goal,
}

/// Rows as `(doubled r, first doubled q, last doubled q)`, stepping q by one hex.
const LARGE_ROWS: [(i32, i32, i32); 7] = [
    (-6, 0, 6),
    (-4, -2, 6),
    (-2, -4, 6),
    (0, -6, 6),
    (2, -6, 4),
    (4, -6, 2),
    (6, -6, 0),
];

const SMALL_ROWS: [(i32, i32, i32); 3] = [(-2, -3, 5), (0, -5, 5), (2, -5, 3)];

const GOAL_OFFSETS: [DoubledCoord; 3] = [
    DoubledCoord::new(0, 0),
    DoubledCoord::new(2, 0),
    DoubledCoord::new(-2, 2),
];

const ALL_ROTATIONS: [i32; 6] = [0, 1, 2, 3, 4, 5];

fn rows_to_offsets(rows: &[(i32, i32, i32)]) -> Vec<DoubledCoord> {
    rows.iter()
        .flat_map(|&(y, first, last)| (first..=last).step_by(2).map(move |x| DoubledCoord::new(x, y)))
        .collect()
}

impl Shape {
    /// Cell offsets relative to the piece center, in tile order
    pub fn offsets(self) -> Vec<DoubledCoord> {
        match self {
            Shape::Large => rows_to_offsets(&LARGE_ROWS),
            Shape::Small => rows_to_offsets(&SMALL_ROWS),
            Shape::Goal => GOAL_OFFSETS.to_vec(),
        }
    }

    /// Absolute cells covered by this shape at `center` and `rotation`.
    ///
    /// Returns `None` if the placement does not land on whole hexes.
    pub fn footprint(self, center: DoubledCoord, rotation: i32) -> Option<Vec<HexCoord>> {
        self.offsets()
            .into_iter()
            .map(|offset| offset.rotate(rotation).offset_by(center).to_hex())
            .collect()
    }

    /// Candidate placements, relative to this piece's center, for a `next` shape
    /// attaching flush against this piece.
    fn relative_connections(self, rotation: i32, next: Shape) -> Vec<Connection> {
        let mut connections = Vec::new();
        match (self, next) {
            (Shape::Large, Shape::Large) => {
                let bases = [DoubledCoord::new(8, 6), DoubledCoord::new(6, 8)];
                for turn in 0..6 {
                    for base in bases {
                        connections.push(Connection::new(base.rotate(turn), ALL_ROTATIONS.to_vec()));
                    }
                }
            }
            (Shape::Large, Shape::Small) => {
                let bases = [
                    DoubledCoord::new(3, 7),
                    DoubledCoord::new(5, 5),
                    DoubledCoord::new(7, 3),
                ];
                for turn in 0..6 {
                    for base in bases {
                        connections.push(Connection::new(base.rotate(turn), vec![turn - 1, turn + 2]));
                    }
                }
            }
            (Shape::Large, Shape::Goal) => {
                for turn in 0..6 {
                    connections.push(Connection::new(DoubledCoord::new(0, 8).rotate(turn), vec![turn - 3]));
                }
            }
            (Shape::Small, Shape::Large) => {
                let bases = [
                    DoubledCoord::new(-7, 10),
                    DoubledCoord::new(-5, 10),
                    DoubledCoord::new(-3, 10),
                ];
                for side in [rotation, rotation + 3] {
                    for base in bases {
                        connections.push(Connection::new(base.rotate(side), ALL_ROTATIONS.to_vec()));
                    }
                }
            }
            // Small pieces never chain into small pieces or goals, and goals close the path.
            _ => {}
        }
        connections
    }
}

/// A candidate placement: a center plus the rotations that fit flush there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub center: DoubledCoord,
    pub rotations: Vec<i32>,
}

impl Connection {
    fn new(center: DoubledCoord, rotations: Vec<i32>) -> Self {
        Self { center, rotations }
    }
}

/// Catalog entry for a piece type
#[derive(Debug)]
pub struct PieceSpec {
    pub shape: Shape,
    pub category: PieceCategory,
    pub difficulty: Difficulty,
    pub tiles: &'static [Hex],
}

/// The named piece types available to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// Start piece holding the four player start hexes
    StartA,
    /// Easy large travel piece
    TravelC,
    /// Hard large travel piece
    TravelG,
    /// Medium small travel piece
    TravelO,
    /// Goal reached with a paddle
    GoalPaddle,
    /// Goal reached with a machete
    GoalMachete,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::StartA,
        PieceKind::TravelC,
        PieceKind::TravelG,
        PieceKind::TravelO,
        PieceKind::GoalPaddle,
        PieceKind::GoalMachete,
    ];

    pub fn spec(self) -> &'static PieceSpec {
        &CATALOG[self as usize]
    }

    pub fn shape(self) -> Shape {
        self.spec().shape
    }

    pub fn category(self) -> PieceCategory {
        self.spec().category
    }

    pub fn difficulty(self) -> Difficulty {
        self.spec().difficulty
    }

    pub fn tiles(self) -> &'static [Hex] {
        self.spec().tiles
    }

    /// All piece kinds of a category
    pub fn of_category(category: PieceCategory) -> Vec<PieceKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| kind.category() == category)
            .collect()
    }
}

/// A piece fixed on the map. Cell coordinates never change after placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub kind: PieceKind,
    pub center: DoubledCoord,
    /// Rotation in 60° steps, normalized to 0..6
    pub rotation: i32,
    cells: Vec<HexCoord>,
}

impl PlacedPiece {
    pub fn new(kind: PieceKind, center: DoubledCoord, rotation: i32) -> Result<Self, MapError> {
        let rotation = rotation.rem_euclid(6);
        let cells = kind
            .shape()
            .footprint(center, rotation)
            .ok_or(MapError::MisalignedPiece { kind, center })?;
        Ok(Self {
            kind,
            center,
            rotation,
            cells,
        })
    }

    /// Covered cells, in tile order
    pub fn cells(&self) -> &[HexCoord] {
        &self.cells
    }

    /// Every placement at which a `next` piece would attach flush to this one.
    ///
    /// Start pieces only expose their first side and cannot take a goal directly.
    pub fn connection_points(&self, next: PieceKind) -> Vec<Connection> {
        if self.kind.category() == PieceCategory::Start && next.category() == PieceCategory::End {
            return Vec::new();
        }

        let mut connections = self
            .kind
            .shape()
            .relative_connections(self.rotation, next.shape());

        if self.kind.category() == PieceCategory::Start {
            let per_side = connections.len() / 6;
            connections.truncate(per_side);
        }

        for connection in &mut connections {
            connection.center = connection.center.offset_by(self.center);
        }
        connections
    }
}

const fn m(required: u8) -> Hex {
    Hex::path(Resource::Machete, required)
}

const fn p(required: u8) -> Hex {
    Hex::path(Resource::Paddle, required)
}

const fn c(required: u8) -> Hex {
    Hex::path(Resource::Coin, required)
}

const fn u(required: u8) -> Hex {
    Hex::path(Resource::Use, required)
}

const fn d(required: u8) -> Hex {
    Hex::path(Resource::Remove, required)
}

const X: Hex = Hex::mountain();

#[rustfmt::skip]
const START_A_TILES: [Hex; 37] = [
    Hex::start(1), Hex::start(2), Hex::start(3), Hex::start(4),
    m(1), m(1), m(1), m(1), m(1),
    m(1), m(1), c(1), m(1), p(1), m(1),
    m(1), c(1), m(1), p(1), m(1), c(1), m(1),
    m(1), X, c(1), m(1), m(1), m(1),
    p(1), X, m(1), m(1), c(1),
    m(1), d(1), m(1), m(1),
];

#[rustfmt::skip]
const TRAVEL_C_TILES: [Hex; 37] = [
    m(1), m(1), p(1), p(1),
    c(1), u(1), m(1), c(1), p(1),
    c(1), u(1), p(1), p(1), c(1), c(1),
    p(1), c(1), u(1), X, p(1), u(1), u(1),
    p(1), p(1), c(1), c(1), u(1), p(1),
    m(1), c(1), u(1), p(1), p(1),
    m(1), m(1), u(1), u(1),
];

#[rustfmt::skip]
const TRAVEL_G_TILES: [Hex; 37] = [
    m(1), m(1), m(1), u(1),
    u(1), p(1), X, m(2), m(1),
    u(1), m(1), u(1), m(1), p(1), c(1),
    X, X, u(3), p(1), p(1), X, c(1),
    u(1), u(1), m(3), X, m(1), c(1),
    m(1), m(2), m(1), m(2), c(1),
    m(1), u(1), m(1), d(1),
];

#[rustfmt::skip]
const TRAVEL_O_TILES: [Hex; 16] = [
    u(2), m(2), u(1), c(1), c(2),
    u(1), X, X, p(4), X, c(1),
    u(1), m(1), m(2), m(1), c(1),
];

const GOAL_PADDLE_TILES: [Hex; 3] = [Hex::goal(Resource::Paddle, 1); 3];

const GOAL_MACHETE_TILES: [Hex; 3] = [Hex::goal(Resource::Machete, 1); 3];

/// Piece table, indexed by `PieceKind as usize`.
static CATALOG: [PieceSpec; 6] = [
    PieceSpec {
        shape: Shape::Large,
        category: PieceCategory::Start,
        difficulty: Difficulty::Easy,
        tiles: &START_A_TILES,
    },
    PieceSpec {
        shape: Shape::Large,
        category: PieceCategory::Travel,
        difficulty: Difficulty::Easy,
        tiles: &TRAVEL_C_TILES,
    },
    PieceSpec {
        shape: Shape::Large,
        category: PieceCategory::Travel,
        difficulty: Difficulty::Hard,
        tiles: &TRAVEL_G_TILES,
    },
    PieceSpec {
        shape: Shape::Small,
        category: PieceCategory::Travel,
        difficulty: Difficulty::Medium,
        tiles: &TRAVEL_O_TILES,
    },
    PieceSpec {
        shape: Shape::Goal,
        category: PieceCategory::End,
        difficulty: Difficulty::Easy,
        tiles: &GOAL_PADDLE_TILES,
    },
    PieceSpec {
        shape: Shape::Goal,
        category: PieceCategory::End,
        difficulty: Difficulty::Easy,
        tiles: &GOAL_MACHETE_TILES,
    },
];
