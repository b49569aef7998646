use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{
    ai::{ComputerPlayer, Decision},
    graph::TileGraph,
    influence::{InfluenceMap, InfluencePropagator, InfluenceSettings},
    rng::RngManager,
    snapshot::BoardSnapshot,
    tile::{Coord, PlayerId},
};

fn default_max_initial_dice() -> u32 {
    3
}

fn default_deal_remaining() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    /// Map file, relative to the loader's base directory.
    pub map: PathBuf,
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub assignments: Vec<TileAssignment>,
    /// Deal tiles without an assignment to players in turn.
    #[serde(default = "default_deal_remaining")]
    pub deal_remaining: bool,
    #[serde(default = "default_max_initial_dice")]
    pub max_initial_dice: u32,
    #[serde(default)]
    pub influence: InfluenceSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    #[serde(default)]
    pub computer: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TileAssignment {
    pub row: usize,
    pub col: usize,
    pub player: String,
    pub dice: u32,
}

impl TileAssignment {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("scenario must define at least one player")]
    NoPlayers,
    #[error("player {0:?} defined more than once")]
    DuplicatePlayer(String),
    #[error("assignment references unknown player {0:?}")]
    UnknownPlayer(String),
    #[error("tile {0} assigned more than once")]
    DuplicateAssignment(Coord),
    #[error("tile {0} must hold at least one die")]
    ZeroDice(Coord),
    #[error("max_initial_dice must be at least 1")]
    ZeroMaxDice,
    #[error("influence step must be positive")]
    ZeroStep,
    #[error("assignment targets {0}, which is not a tile of the map")]
    UnknownTile(Coord),
    #[error("player {0:?} is not a computer player")]
    NotComputer(String),
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.players.is_empty() {
            return Err(ScenarioError::NoPlayers);
        }

        let mut names = BTreeSet::new();
        for player in &self.players {
            if !names.insert(player.name.as_str()) {
                return Err(ScenarioError::DuplicatePlayer(player.name.clone()));
            }
        }

        let mut assigned = BTreeSet::new();
        for assignment in &self.assignments {
            if !names.contains(assignment.player.as_str()) {
                return Err(ScenarioError::UnknownPlayer(assignment.player.clone()));
            }
            if !assigned.insert(assignment.coord()) {
                return Err(ScenarioError::DuplicateAssignment(assignment.coord()));
            }
            if assignment.dice == 0 {
                return Err(ScenarioError::ZeroDice(assignment.coord()));
            }
        }

        if self.max_initial_dice == 0 {
            return Err(ScenarioError::ZeroMaxDice);
        }
        if self.influence.step == 0 {
            return Err(ScenarioError::ZeroStep);
        }
        Ok(())
    }

    pub fn player_id(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .map(|index| PlayerId(index as u32))
    }

    /// Applies assignments and deals the remaining tiles onto a freshly
    /// loaded graph.
    pub fn build_session(&self, mut graph: TileGraph) -> Result<Session, ScenarioError> {
        self.validate()?;
        let mut rng = RngManager::new(self.seed);

        for assignment in &self.assignments {
            let owner = self
                .player_id(&assignment.player)
                .ok_or_else(|| ScenarioError::UnknownPlayer(assignment.player.clone()))?;
            let tile = graph
                .tile_mut(assignment.coord())
                .ok_or(ScenarioError::UnknownTile(assignment.coord()))?;
            tile.set_owner(Some(owner));
            tile.set_dice(assignment.dice);
        }

        if self.deal_remaining {
            let mut free: Vec<Coord> = graph
                .tiles()
                .filter(|tile| tile.owner().is_none())
                .map(|tile| tile.coords())
                .collect();
            let deal = rng.deal();
            free.shuffle(deal);
            for (index, coord) in free.into_iter().enumerate() {
                let owner = PlayerId((index % self.players.len()) as u32);
                let dice = deal.gen_range(1..=self.max_initial_dice);
                if let Some(tile) = graph.tile_mut(coord) {
                    tile.set_owner(Some(owner));
                    tile.set_dice(dice);
                }
            }
        }

        info!(
            scenario = %self.name,
            tiles = graph.len(),
            players = self.players.len(),
            "session ready"
        );
        Ok(Session {
            name: self.name.clone(),
            players: self.players.clone(),
            propagator: InfluencePropagator::new(self.influence),
            graph,
            rng,
        })
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }

    /// Loads the scenario, then its map, and sets up a session.
    pub fn open(&self, file: impl AsRef<Path>) -> Result<Session> {
        let scenario = self.load(file)?;
        self.open_scenario(&scenario)
    }

    /// Sets up a session for an already loaded scenario; its map path is
    /// resolved against the base directory.
    pub fn open_scenario(&self, scenario: &Scenario) -> Result<Session> {
        let map_path = self.base_dir.join(&scenario.map);
        let graph = TileGraph::load(&map_path)
            .with_context(|| format!("Failed to load map {}", map_path.display()))?;
        let session = scenario.build_session(graph)?;
        Ok(session)
    }
}

/// A loaded map plus per-session state: players and their decision streams.
pub struct Session {
    name: String,
    players: Vec<PlayerConfig>,
    propagator: InfluencePropagator,
    graph: TileGraph,
    rng: RngManager,
}

impl Session {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &TileGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut TileGraph {
        &mut self.graph
    }

    pub fn player_names(&self) -> Vec<String> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn player_id(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .map(|index| PlayerId(index as u32))
    }

    pub fn focus(&self, coord: Coord) -> InfluenceMap {
        self.propagator.propagate(&self.graph, coord)
    }

    /// Runs one decision for a computer player, drawing from its own stream.
    pub fn decide(&mut self, name: &str) -> Result<Decision, ScenarioError> {
        let config = self
            .players
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ScenarioError::UnknownPlayer(name.to_string()))?;
        if !config.computer {
            return Err(ScenarioError::NotComputer(name.to_string()));
        }
        let id = self
            .player_id(name)
            .ok_or_else(|| ScenarioError::UnknownPlayer(name.to_string()))?;
        let player = ComputerPlayer::new(id);
        Ok(player.decide(&self.graph, self.rng.player(name)))
    }

    pub fn snapshot(&self, focus: Option<Coord>) -> BoardSnapshot {
        let influence = focus.map(|coord| self.focus(coord));
        BoardSnapshot::capture(
            &self.name,
            &self.player_names(),
            &self.graph,
            influence.as_ref(),
            self.propagator.settings().floor,
        )
    }

    pub fn owners(&self) -> HashMap<PlayerId, usize> {
        let mut counts = HashMap::new();
        for tile in self.graph.tiles() {
            if let Some(owner) = tile.owner() {
                *counts.entry(owner).or_insert(0) += 1;
            }
        }
        counts
    }
}
