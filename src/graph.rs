//! Tile graph built from the textual map format.
//!
//! A map is lines of `.` (tile) and ` ` (hole) terminated by `\n`. Tiles are
//! 4-connected and the whole map must form a single component; anything else
//! is rejected before a [`TileGraph`] exists.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::tile::{Coord, PlayerId, Tile};

pub const TILE_MARKER: char = '.';
pub const HOLE_MARKER: char = ' ';
pub const LINE_TERMINATOR: char = '\n';

/// Reason code attached to every [`MapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapErrorReason {
    InvalidCharacter,
    Disconnected,
    Unreadable,
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("invalid character {ch:?} at row {row}, column {col}")]
    InvalidCharacter { ch: char, row: usize, col: usize },
    #[error("map is not connected: {reachable} of {total} tiles reachable")]
    Disconnected { reachable: usize, total: usize },
    #[error("failed to read map file {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MapError {
    pub fn reason(&self) -> MapErrorReason {
        match self {
            MapError::InvalidCharacter { .. } => MapErrorReason::InvalidCharacter,
            MapError::Disconnected { .. } => MapErrorReason::Disconnected,
            MapError::Unreadable { .. } => MapErrorReason::Unreadable,
        }
    }
}

/// Arena of tiles keyed by coordinate. Topology is frozen after construction;
/// only owner and dice count change afterwards.
#[derive(Debug, Clone)]
pub struct TileGraph {
    tiles: BTreeMap<Coord, Tile>,
    height: usize,
    width: usize,
}

impl TileGraph {
    /// Reads and parses a map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MapError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let graph = Self::parse(&text)?;
        info!(
            path = %path.display(),
            tiles = graph.len(),
            height = graph.height,
            width = graph.width,
            "loaded map"
        );
        Ok(graph)
    }

    pub fn parse(text: &str) -> Result<Self, MapError> {
        let mut tiles: BTreeMap<Coord, Tile> = BTreeMap::new();
        let mut row = 0;
        let mut col = 0;

        for ch in text.chars() {
            match ch {
                TILE_MARKER => {
                    let coord = Coord::new(row, col);
                    tiles.insert(coord, Tile::new(coord));
                    link_orthogonal(&mut tiles, coord);
                    col += 1;
                }
                HOLE_MARKER => col += 1,
                LINE_TERMINATOR => {
                    row += 1;
                    col = 0;
                }
                other => {
                    warn!(?other, row, col, "rejecting map with invalid character");
                    return Err(MapError::InvalidCharacter { ch: other, row, col });
                }
            }
        }

        let height = tiles.keys().map(|c| c.row + 1).max().unwrap_or(0);
        let width = tiles.keys().map(|c| c.col + 1).max().unwrap_or(0);
        let graph = Self {
            tiles,
            height,
            width,
        };

        let reachable = graph.reachable_count();
        if reachable == 0 || reachable != graph.len() {
            warn!(reachable, total = graph.len(), "rejecting disconnected map");
            return Err(MapError::Disconnected {
                reachable,
                total: graph.len(),
            });
        }
        debug!(tiles = graph.len(), "map connectivity verified");
        Ok(graph)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.tiles.contains_key(&coord)
    }

    pub fn tile(&self, coord: Coord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn tile_mut(&mut self, coord: Coord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    /// Tiles in coordinate order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        self.tiles.keys().copied()
    }

    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = &Tile> {
        self.tiles
            .get(&coord)
            .into_iter()
            .flat_map(|tile| tile.neighbors())
            .filter_map(|c| self.tiles.get(&c))
    }

    /// Every coordinate reachable from `start` through neighbor edges,
    /// `start` included. Empty when `start` is not a tile.
    pub fn reachable_from(&self, start: Coord) -> BTreeSet<Coord> {
        let mut visited = BTreeSet::new();
        if !self.contains(start) {
            return visited;
        }
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        while let Some(coord) = queue.pop_front() {
            for tile in self.neighbors(coord) {
                if visited.insert(tile.coords()) {
                    queue.push_back(tile.coords());
                }
            }
        }
        visited
    }

    pub fn is_connected(&self) -> bool {
        self.reachable_count() == self.len()
    }

    /// Tiles `player` could attack from: owned, holding more than one die and
    /// bordering at least one tile owned by someone else.
    pub fn attack_sources(&self, player: PlayerId) -> Vec<&Tile> {
        self.tiles()
            .filter(|tile| tile.owner() == Some(player) && tile.dice_count() > 1)
            .filter(|tile| {
                self.neighbors(tile.coords())
                    .any(|n| n.owner() != Some(player))
            })
            .collect()
    }

    /// Neighbors of `attacker` held by a different owner.
    pub fn attack_targets(&self, attacker: Coord) -> Vec<&Tile> {
        let Some(tile) = self.tile(attacker) else {
            return Vec::new();
        };
        self.neighbors(attacker)
            .filter(|n| n.owner() != tile.owner())
            .collect()
    }

    /// Writes the topology back in the map text format.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for row in 0..self.height {
            let last = self
                .tiles
                .range(Coord::new(row, 0)..Coord::new(row + 1, 0))
                .map(|(c, _)| c.col)
                .next_back();
            if let Some(last) = last {
                for col in 0..=last {
                    if self.contains(Coord::new(row, col)) {
                        text.push(TILE_MARKER);
                    } else {
                        text.push(HOLE_MARKER);
                    }
                }
            }
            text.push(LINE_TERMINATOR);
        }
        text
    }

    fn reachable_count(&self) -> usize {
        match self.tiles.keys().next() {
            Some(&start) => self.reachable_from(start).len(),
            None => 0,
        }
    }
}

// Links against every present orthogonal tile, not just earlier ones, so the
// final adjacency is symmetric whatever the scan order.
fn link_orthogonal(tiles: &mut BTreeMap<Coord, Tile>, coord: Coord) {
    let present: Vec<Coord> = coord
        .orthogonal()
        .filter(|other| tiles.contains_key(other))
        .collect();
    for other in present {
        if let Some(tile) = tiles.get_mut(&coord) {
            tile.link(other);
        }
        if let Some(tile) = tiles.get_mut(&other) {
            tile.link(coord);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = ".. ..\n ...\n  .\n";
    const SPLIT: &str = "..\n.  .\n  ..\n";

    #[test]
    fn parses_connected_map() {
        let graph = TileGraph::parse(VALID).unwrap();
        assert_eq!(graph.len(), 8);
        assert_eq!(graph.height(), 3);
        assert_eq!(graph.width(), 5);
        assert!(graph.is_connected());
    }

    #[test]
    fn rejects_disconnected_map() {
        let err = TileGraph::parse(SPLIT).unwrap_err();
        assert_eq!(err.reason(), MapErrorReason::Disconnected);
        assert!(matches!(err, MapError::Disconnected { total: 6, .. }));
    }

    #[test]
    fn rejects_invalid_character_with_position() {
        let err = TileGraph::parse("..\nX.\n").unwrap_err();
        assert_eq!(err.reason(), MapErrorReason::InvalidCharacter);
        match err {
            MapError::InvalidCharacter { ch, row, col } => {
                assert_eq!(ch, 'X');
                assert_eq!((row, col), (1, 0));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn invalid_character_wins_over_disconnection() {
        let err = TileGraph::parse(". .\n\t\n").unwrap_err();
        assert_eq!(err.reason(), MapErrorReason::InvalidCharacter);
    }

    #[test]
    fn rejects_map_without_tiles() {
        for text in ["", "   \n  \n"] {
            let err = TileGraph::parse(text).unwrap_err();
            assert_eq!(err.reason(), MapErrorReason::Disconnected);
        }
    }

    #[test]
    fn carriage_returns_are_invalid() {
        let err = TileGraph::parse("..\r\n..\r\n").unwrap_err();
        assert!(matches!(err, MapError::InvalidCharacter { ch: '\r', .. }));
    }

    #[test]
    fn last_line_without_terminator_is_scanned() {
        let graph = TileGraph::parse("..\n..").unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.height(), 2);
    }

    #[test]
    fn adjacency_is_four_directional_and_symmetric() {
        let graph = TileGraph::parse("...\n...\n").unwrap();
        let center = graph.tile(Coord::new(0, 1)).unwrap();
        let around: Vec<Coord> = center.neighbors().collect();
        assert_eq!(
            around,
            vec![Coord::new(0, 0), Coord::new(0, 2), Coord::new(1, 1)]
        );
        assert!(!center.is_neighbor(Coord::new(1, 0)));

        for tile in graph.tiles() {
            for other in tile.neighbors() {
                assert!(graph.tile(other).unwrap().is_neighbor(tile.coords()));
            }
        }
    }

    #[test]
    fn tile_linked_to_later_tile_above() {
        // (1, 2) is scanned after (0, 2) and has to link back up.
        let graph = TileGraph::parse("  .\n...\n").unwrap();
        let top = graph.tile(Coord::new(0, 2)).unwrap();
        assert!(top.is_neighbor(Coord::new(1, 2)));
        assert!(graph
            .tile(Coord::new(1, 2))
            .unwrap()
            .is_neighbor(Coord::new(0, 2)));
    }

    #[test]
    fn attack_queries_follow_ownership() {
        let mut graph = TileGraph::parse("...\n").unwrap();
        let me = PlayerId(0);
        let them = PlayerId(1);
        for (col, owner, dice) in [(0, me, 3), (1, me, 1), (2, them, 2)] {
            let tile = graph.tile_mut(Coord::new(0, col)).unwrap();
            tile.set_owner(Some(owner));
            tile.set_dice(dice);
        }

        // (0, 0) only borders a friendly tile, (0, 1) has a single die.
        assert!(graph.attack_sources(me).is_empty());

        graph.tile_mut(Coord::new(0, 1)).unwrap().set_dice(4);
        let sources: Vec<Coord> = graph
            .attack_sources(me)
            .iter()
            .map(|t| t.coords())
            .collect();
        assert_eq!(sources, vec![Coord::new(0, 1)]);

        let targets: Vec<Coord> = graph
            .attack_targets(Coord::new(0, 1))
            .iter()
            .map(|t| t.coords())
            .collect();
        assert_eq!(targets, vec![Coord::new(0, 2)]);
        assert!(graph.attack_targets(Coord::new(5, 5)).is_empty());
    }

    #[test]
    fn text_round_trips() {
        let graph = TileGraph::parse(VALID).unwrap();
        assert_eq!(graph.to_text(), VALID);
        let again = TileGraph::parse(&graph.to_text()).unwrap();
        assert_eq!(
            again.coords().collect::<Vec<_>>(),
            graph.coords().collect::<Vec<_>>()
        );
    }
}
