//! Computer-controlled player.

pub mod heuristic;

pub use heuristic::{filter_by_dice, select_extreme, AttackHeuristic, Extreme};

use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::graph::TileGraph;
use crate::tile::{Coord, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Attack { from: Coord, to: Coord },
    EndTurn,
}

/// Binds the heuristic to a player and the candidate queries of the graph.
#[derive(Debug, Clone)]
pub struct ComputerPlayer {
    id: PlayerId,
    heuristic: AttackHeuristic,
}

impl ComputerPlayer {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            heuristic: AttackHeuristic::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// One decision point. An attacker whose targets are all declined is
    /// dropped and attacker selection runs again over the rest; the turn ends
    /// once no attacker is left.
    pub fn decide<R>(&self, graph: &TileGraph, rng: &mut R) -> Decision
    where
        R: Rng + ?Sized,
    {
        let mut candidates = graph.attack_sources(self.id);
        while let Some(attacker) = self.heuristic.select_attacker(&candidates) {
            let targets = graph.attack_targets(attacker.coords());
            if let Some(defender) = self.heuristic.select_defender(&targets, attacker, rng) {
                info!(
                    player = %self.id,
                    from = %attacker.coords(),
                    to = %defender.coords(),
                    "attack chosen"
                );
                return Decision::Attack {
                    from: attacker.coords(),
                    to: defender.coords(),
                };
            }
            candidates.retain(|tile| tile.coords() != attacker.coords());
        }
        info!(player = %self.id, "ending turn");
        Decision::EndTurn
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;

    const ME: PlayerId = PlayerId(0);
    const THEM: PlayerId = PlayerId(1);

    fn board(text: &str, layout: &[(usize, usize, PlayerId, u32)]) -> TileGraph {
        let mut graph = TileGraph::parse(text).unwrap();
        for &(row, col, owner, dice) in layout {
            let tile = graph.tile_mut(Coord::new(row, col)).unwrap();
            tile.set_owner(Some(owner));
            tile.set_dice(dice);
        }
        graph
    }

    #[test]
    fn attacks_with_strongest_tile() {
        let graph = board(
            "...\n",
            &[(0, 0, THEM, 3), (0, 1, ME, 4), (0, 2, THEM, 6)],
        );
        let decision = ComputerPlayer::new(ME).decide(&graph, &mut StepRng::new(u64::MAX, 0));
        assert_eq!(
            decision,
            Decision::Attack {
                from: Coord::new(0, 1),
                to: Coord::new(0, 0),
            }
        );
    }

    #[test]
    fn declined_attacker_falls_back_to_next_one() {
        // (0, 1) is strongest but only borders an 8; (0, 2) can hit a 2.
        let graph = board(
            "....\n",
            &[(0, 0, THEM, 8), (0, 1, ME, 5), (0, 2, ME, 3), (0, 3, THEM, 2)],
        );
        let decision = ComputerPlayer::new(ME).decide(&graph, &mut StepRng::new(u64::MAX, 0));
        assert_eq!(
            decision,
            Decision::Attack {
                from: Coord::new(0, 2),
                to: Coord::new(0, 3),
            }
        );
    }

    #[test]
    fn ends_turn_when_every_attacker_declines() {
        let graph = board("..\n", &[(0, 0, ME, 3), (0, 1, THEM, 8)]);
        let decision = ComputerPlayer::new(ME).decide(&graph, &mut StepRng::new(u64::MAX, 0));
        assert_eq!(decision, Decision::EndTurn);
    }

    #[test]
    fn ends_turn_without_sources() {
        let graph = board("..\n", &[(0, 0, ME, 1), (0, 1, THEM, 1)]);
        let decision = ComputerPlayer::new(ME).decide(&graph, &mut StepRng::new(0, 0));
        assert_eq!(decision, Decision::EndTurn);
    }
}
