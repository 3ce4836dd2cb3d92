//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the coordinate types used by the map:
//! - `HexCoord`: Identifies individual hex cells
//! - `Direction`: The six movement directions, in action-index order
//! - `DoubledCoord`: Piece geometry in half-hex steps, for rotation and placement
//!
//! We use axial coordinates because they make neighbor calculations elegant and
//! a 60° rotation becomes a small linear map.

use serde::{Deserialize, Serialize};

/// One of the six directions a player can move in.
///
/// The declaration order is the action encoding order: index 0 is East.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl Direction {
    /// All directions in action-index order
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// Axial offset `(dq, dr)` of a single step in this direction
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (0, 1),
            Direction::NorthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (0, -1),
            Direction::SouthEast => (1, -1),
        }
    }

    /// Position of this direction in [`Direction::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction for an action index, if in range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Axial coordinate for the hex grid.
///
/// The third cube coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring hexes in [`Direction::ALL`] order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    /// Get the neighbor in a specific direction
    pub fn neighbor(&self, direction: Direction) -> HexCoord {
        let (dq, dr) = direction.offset();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }
}

/// A point in doubled axial coordinates: `(2q, 2r)`.
///
/// Map pieces with an even number of cells per row are centered between hexes,
/// so their centers and relative offsets live on the half-hex lattice. Rotation
/// and translation happen here; only the final cell positions are halved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DoubledCoord {
    pub x: i32,
    pub y: i32,
}

impl DoubledCoord {
    pub const ORIGIN: DoubledCoord = DoubledCoord::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rotate about the origin by `times` steps of 60° (negative turns the other way)
    pub fn rotate(self, times: i32) -> Self {
        let mut point = self;
        for _ in 0..times.rem_euclid(6) {
            point = DoubledCoord::new(-point.y, point.x + point.y);
        }
        point
    }

    /// Translate by another doubled offset
    pub fn offset_by(self, other: DoubledCoord) -> Self {
        DoubledCoord::new(self.x + other.x, self.y + other.y)
    }

    /// Convert to a hex coordinate; `None` if the point lies between hexes
    pub fn to_hex(self) -> Option<HexCoord> {
        if self.x % 2 == 0 && self.y % 2 == 0 {
            Some(HexCoord::new(self.x / 2, self.y / 2))
        } else {
            None
        }
    }
}
