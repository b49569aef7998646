//! Tiered attack heuristic for the computer player.

use rand::Rng;
use tracing::debug;

use crate::tile::Tile;

/// Chance of attacking the weakest stronger neighbor when no tier matched.
pub const RISK_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Most,
    Fewest,
}

/// Tile with the most (or fewest) dice. The first tile holding the extreme
/// wins ties.
pub fn select_extreme<'a, I>(tiles: I, extreme: Extreme) -> Option<&'a Tile>
where
    I: IntoIterator<Item = &'a Tile>,
{
    let mut best: Option<&'a Tile> = None;
    for tile in tiles {
        let better = match best {
            None => true,
            Some(current) => match extreme {
                Extreme::Most => tile.dice_count() > current.dice_count(),
                Extreme::Fewest => tile.dice_count() < current.dice_count(),
            },
        };
        if better {
            best = Some(tile);
        }
    }
    best
}

pub fn filter_by_dice<'a>(tiles: &[&'a Tile], accepted: &[u32]) -> Vec<&'a Tile> {
    tiles
        .iter()
        .copied()
        .filter(|tile| accepted.contains(&tile.dice_count()))
        .collect()
}

/// Stateless decision procedure. Never touches tile state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttackHeuristic;

impl AttackHeuristic {
    pub fn new() -> Self {
        Self
    }

    /// Strongest available tile, or `None` to end the turn.
    pub fn select_attacker<'a>(&self, available: &[&'a Tile]) -> Option<&'a Tile> {
        select_extreme(available.iter().copied(), Extreme::Most)
    }

    /// Picks a target for `attacker`, or `None` to drop this attacker and go
    /// back to attacker selection.
    pub fn select_defender<'a, R>(
        &self,
        available: &[&'a Tile],
        attacker: &Tile,
        rng: &mut R,
    ) -> Option<&'a Tile>
    where
        R: Rng + ?Sized,
    {
        let dice = attacker.dice_count();

        let near_even: Vec<u32> = [1, 2].iter().filter_map(|d| dice.checked_sub(*d)).collect();
        if let Some(tile) = strongest_of(available, &near_even) {
            debug!(attacker = %attacker.coords(), defender = %tile.coords(), "near-even target");
            return Some(tile);
        }

        if let Some(tile) = strongest_of(available, &[dice]) {
            debug!(attacker = %attacker.coords(), defender = %tile.coords(), "even target");
            return Some(tile);
        }

        let outmatched: Vec<u32> = (1..=dice.saturating_sub(3)).collect();
        if let Some(tile) = strongest_of(available, &outmatched) {
            debug!(attacker = %attacker.coords(), defender = %tile.coords(), "weak target");
            return Some(tile);
        }

        // Whatever is left outnumbers the attacker.
        if rng.gen_bool(RISK_PROBABILITY) {
            let weakest = select_extreme(available.iter().copied(), Extreme::Fewest);
            if let Some(tile) = weakest {
                debug!(attacker = %attacker.coords(), defender = %tile.coords(), "risky target");
            }
            weakest
        } else {
            debug!(attacker = %attacker.coords(), "declined every target");
            None
        }
    }
}

fn strongest_of<'a>(tiles: &[&'a Tile], accepted: &[u32]) -> Option<&'a Tile> {
    select_extreme(filter_by_dice(tiles, accepted), Extreme::Most)
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::tile::Coord;

    fn tiles(dice: &[u32]) -> Vec<Tile> {
        dice.iter()
            .enumerate()
            .map(|(col, d)| Tile::with_state(Coord::new(0, col), None, *d))
            .collect()
    }

    fn refs(tiles: &[Tile]) -> Vec<&Tile> {
        tiles.iter().collect()
    }

    // gen_bool(0.5) is true below 2^63, false above it.
    fn always_risk() -> StepRng {
        StepRng::new(0, 0)
    }

    fn never_risk() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn extreme_breaks_ties_on_first_seen() {
        let pool = tiles(&[3, 5, 5, 1, 1]);
        let most = select_extreme(refs(&pool), Extreme::Most).unwrap();
        assert_eq!(most.coords(), Coord::new(0, 1));
        let fewest = select_extreme(refs(&pool), Extreme::Fewest).unwrap();
        assert_eq!(fewest.coords(), Coord::new(0, 3));
        assert!(select_extreme(Vec::<&Tile>::new(), Extreme::Most).is_none());
    }

    #[test]
    fn filter_keeps_accepted_counts_only() {
        let pool = tiles(&[1, 2, 3, 4]);
        let kept = filter_by_dice(&refs(&pool), &[2, 4, 9]);
        let counts: Vec<u32> = kept.iter().map(|t| t.dice_count()).collect();
        assert_eq!(counts, vec![2, 4]);
    }

    #[test]
    fn attacker_is_strongest_available() {
        let pool = tiles(&[3, 5, 5]);
        let attacker = AttackHeuristic.select_attacker(&refs(&pool)).unwrap();
        assert_eq!(attacker.dice_count(), 5);
        assert!(AttackHeuristic.select_attacker(&[]).is_none());
    }

    #[test]
    fn near_even_tier_beats_even_tier() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 5);
        let pool = tiles(&[4, 5, 1]);
        let defender = AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut never_risk())
            .unwrap();
        assert_eq!(defender.coords(), Coord::new(0, 0));
    }

    #[test]
    fn near_even_tier_prefers_the_stronger_one() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 6);
        let pool = tiles(&[4, 5, 4]);
        let defender = AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut never_risk())
            .unwrap();
        assert_eq!(defender.dice_count(), 5);
    }

    #[test]
    fn even_tier_before_weak_tier() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 5);
        let pool = tiles(&[1, 5, 2]);
        let defender = AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut never_risk())
            .unwrap();
        assert_eq!(defender.coords(), Coord::new(0, 1));
    }

    #[test]
    fn weak_tier_picks_strongest_weak_target() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 8);
        let pool = tiles(&[1, 5, 3, 9]);
        let defender = AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut never_risk())
            .unwrap();
        assert_eq!(defender.dice_count(), 5);
    }

    #[test]
    fn small_attacker_has_no_weak_tier() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 2);
        let pool = tiles(&[4, 3]);
        assert!(AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut never_risk())
            .is_none());
        let risky = AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut always_risk())
            .unwrap();
        assert_eq!(risky.dice_count(), 3);
    }

    #[test]
    fn stronger_targets_are_risked_or_declined() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 5);
        let pool = tiles(&[8, 8, 7]);
        let risky = AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut always_risk())
            .unwrap();
        assert_eq!(risky.dice_count(), 7);
        assert!(AttackHeuristic
            .select_defender(&refs(&pool), &attacker, &mut never_risk())
            .is_none());
    }

    #[test]
    fn random_fallback_takes_both_branches() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 5);
        let pool = tiles(&[8, 8, 8]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut picked = 0;
        let mut declined = 0;
        for _ in 0..200 {
            match AttackHeuristic.select_defender(&refs(&pool), &attacker, &mut rng) {
                Some(tile) => {
                    assert_eq!(tile.dice_count(), 8);
                    picked += 1;
                }
                None => declined += 1,
            }
        }
        assert!(picked > 0 && declined > 0);
    }

    #[test]
    fn empty_candidates_decline() {
        let attacker = Tile::with_state(Coord::new(9, 9), None, 5);
        assert!(AttackHeuristic
            .select_defender(&[], &attacker, &mut always_risk())
            .is_none());
    }
}
