use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::TileGraph;
use crate::influence::InfluenceMap;
use crate::tile::Coord;

/// Board state handed to the renderer: ownership, dice and label weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub scenario: String,
    pub height: usize,
    pub width: usize,
    pub players: Vec<String>,
    pub focus: Option<Coord>,
    pub tiles: Vec<TileSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub row: usize,
    pub col: usize,
    pub owner: Option<u32>,
    pub dice: u32,
    pub weight: i32,
}

impl BoardSnapshot {
    /// Tiles outside `influence`, or every tile when nothing is focused,
    /// get `floor` as their weight.
    pub fn capture(
        scenario: &str,
        players: &[String],
        graph: &TileGraph,
        influence: Option<&InfluenceMap>,
        floor: i32,
    ) -> Self {
        let tiles = graph
            .tiles()
            .map(|tile| {
                let coords = tile.coords();
                TileSnapshot {
                    row: coords.row,
                    col: coords.col,
                    owner: tile.owner().map(|p| p.raw()),
                    dice: tile.dice_count(),
                    weight: influence
                        .and_then(|map| map.get(coords))
                        .unwrap_or(floor),
                }
            })
            .collect();
        Self {
            scenario: scenario.to_string(),
            height: graph.height(),
            width: graph.width(),
            players: players.to_vec(),
            focus: influence.map(|map| map.source()),
            tiles,
        }
    }
}

pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Writes `<output_dir>/<scenario>/<label>.json`.
    pub fn write(&self, snapshot: &BoardSnapshot, label: &str) -> Result<PathBuf> {
        let dir = self.output_dir.join(&snapshot.scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("{label}.json"));
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        debug!(path = %path.display(), "snapshot written");
        Ok(path)
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<BoardSnapshot> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        Ok(snapshot)
    }
}
