//! Decaying influence weights around a focused tile.
//!
//! Weights drop by `step` per neighbor hop from the source and never fall
//! below `floor`. The renderer uses them as label emphasis.

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::TileGraph;
use crate::tile::Coord;

fn default_initial_weight() -> i32 {
    30
}

fn default_floor() -> i32 {
    15
}

fn default_step() -> u32 {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluenceSettings {
    #[serde(default = "default_initial_weight")]
    pub initial_weight: i32,
    #[serde(default = "default_floor")]
    pub floor: i32,
    #[serde(default = "default_step")]
    pub step: u32,
}

impl Default for InfluenceSettings {
    fn default() -> Self {
        Self {
            initial_weight: default_initial_weight(),
            floor: default_floor(),
            step: default_step(),
        }
    }
}

impl InfluenceSettings {
    pub fn clamp(&self, weight: i32) -> i32 {
        weight.max(self.floor)
    }

    /// Number of distinct weights a propagation can assign.
    pub fn levels(&self) -> u64 {
        let span = (i64::from(self.initial_weight) - i64::from(self.floor)).max(0) as u64;
        let step = u64::from(self.step.max(1));
        span.div_ceil(step) + 1
    }
}

/// Output of one propagation: a weight per reachable coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluenceMap {
    source: Coord,
    floor: i32,
    weights: BTreeMap<Coord, i32>,
    expansions: usize,
}

impl InfluenceMap {
    pub fn source(&self) -> Coord {
        self.source
    }

    pub fn get(&self, coord: Coord) -> Option<i32> {
        self.weights.get(&coord).copied()
    }

    /// Weight of `coord`, or the floor when the tile was not reached.
    pub fn weight_or_floor(&self, coord: Coord) -> i32 {
        self.get(coord).unwrap_or(self.floor)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, i32)> + '_ {
        self.weights.iter().map(|(c, w)| (*c, *w))
    }

    /// Number of times a tile's neighbors were examined.
    pub fn expansions(&self) -> usize {
        self.expansions
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InfluencePropagator {
    settings: InfluenceSettings,
}

impl InfluencePropagator {
    pub fn new(settings: InfluenceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &InfluenceSettings {
        &self.settings
    }

    /// Assigns a weight to every tile reachable from `source`.
    ///
    /// A neighbor takes the candidate weight and is expanded when it has no
    /// weight yet or a lower one. A neighbor already holding exactly the
    /// candidate is expanded once more at that weight without changing it.
    /// Stored weights only rise and each (tile, weight) pair is reconfirmed at
    /// most once, so the work stays within `2 * tiles * levels` expansions on
    /// a cyclic grid.
    pub fn propagate(&self, graph: &TileGraph, source: Coord) -> InfluenceMap {
        let settings = &self.settings;
        let step = settings.step.max(1) as i32;
        let mut weights: BTreeMap<Coord, i32> = BTreeMap::new();
        let mut reconfirmed: HashSet<(Coord, i32)> = HashSet::new();
        let mut worklist: VecDeque<(Coord, i32)> = VecDeque::new();
        let mut expansions = 0;

        if graph.contains(source) {
            let weight = settings.clamp(settings.initial_weight);
            weights.insert(source, weight);
            worklist.push_back((source, weight));
        }

        while let Some((coord, weight)) = worklist.pop_front() {
            // Superseded by a higher weight queued later.
            if weights.get(&coord) != Some(&weight) {
                continue;
            }
            expansions += 1;

            let candidate = settings.clamp(weight.saturating_sub(step));
            for neighbor in graph.neighbors(coord) {
                let next = neighbor.coords();
                match weights.get(&next) {
                    Some(&current) if current > candidate => {}
                    Some(&current) if current == candidate => {
                        if reconfirmed.insert((next, candidate)) {
                            worklist.push_back((next, candidate));
                        }
                    }
                    _ => {
                        weights.insert(next, candidate);
                        worklist.push_back((next, candidate));
                    }
                }
            }
        }

        debug!(
            %source,
            reached = weights.len(),
            expansions,
            levels = settings.levels(),
            "influence propagated"
        );
        InfluenceMap {
            source,
            floor: settings.floor,
            weights,
            expansions,
        }
    }
}
