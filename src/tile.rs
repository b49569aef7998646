//! Map cells and their coordinates.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Grid position of a tile, `row` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Positions one step up, left, down and right, skipping those below zero.
    pub fn orthogonal(self) -> impl Iterator<Item = Coord> {
        let up = self.row.checked_sub(1).map(|row| Coord::new(row, self.col));
        let left = self.col.checked_sub(1).map(|col| Coord::new(self.row, col));
        let down = Some(Coord::new(self.row + 1, self.col));
        let right = Some(Coord::new(self.row, self.col + 1));
        [up, left, down, right].into_iter().flatten()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// A single cell of the map.
///
/// Neighbors are stored as coordinates and resolved through the owning
/// [`TileGraph`](crate::graph::TileGraph); tiles never own each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    coords: Coord,
    neighbors: BTreeSet<Coord>,
    owner: Option<PlayerId>,
    dice: u32,
}

impl Tile {
    pub fn new(coords: Coord) -> Self {
        Self {
            coords,
            neighbors: BTreeSet::new(),
            owner: None,
            dice: 1,
        }
    }

    /// Builds a free-standing tile with the given state, mostly useful for
    /// feeding the heuristic outside of a graph.
    pub fn with_state(coords: Coord, owner: Option<PlayerId>, dice: u32) -> Self {
        Self {
            coords,
            neighbors: BTreeSet::new(),
            owner,
            dice: dice.max(1),
        }
    }

    pub fn coords(&self) -> Coord {
        self.coords
    }

    pub fn neighbors(&self) -> impl Iterator<Item = Coord> + '_ {
        self.neighbors.iter().copied()
    }

    pub fn is_neighbor(&self, other: Coord) -> bool {
        self.neighbors.contains(&other)
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn dice_count(&self) -> u32 {
        self.dice
    }

    pub fn set_owner(&mut self, owner: Option<PlayerId>) {
        self.owner = owner;
    }

    /// A tile always holds at least one die.
    pub fn set_dice(&mut self, dice: u32) {
        self.dice = dice.max(1);
    }

    pub(crate) fn link(&mut self, other: Coord) {
        self.neighbors.insert(other);
    }
}
