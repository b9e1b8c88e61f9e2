use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::Cell;
use crate::grid::Grid;
use crate::parameters::DispersalRule;

/**
Decides how the migrants leaving one cell are distributed over the candidate
destinations.

The policy owns the random number generator of the simulation, so that a run
with a fixed seed draws the same sequence of choices every time.
 */
#[derive(Debug, Clone)]
pub struct DispersalPolicy {
    rule: DispersalRule,
    rng: ChaCha8Rng,
}

impl DispersalPolicy {
    pub fn new(rule: DispersalRule, seed: u64) -> DispersalPolicy {
        DispersalPolicy {
            rule,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn rule(&self) -> DispersalRule {
        self.rule
    }

    /// Split `migrants` persons over `candidates`. The allocations always
    /// sum to `migrants` unless there are no candidates, and cells that would
    /// receive nobody are left out.
    pub fn allocate(&mut self, candidates: &[Cell], migrants: u64, grid: &Grid) -> Vec<(Cell, u64)> {
        if candidates.is_empty() || migrants == 0 {
            return vec![];
        }
        match self.rule {
            DispersalRule::EvenSplit => even_split(candidates, migrants),
            DispersalRule::RandomPick => match candidates.choose(&mut self.rng) {
                Some(&cell) => vec![(cell, migrants)],
                None => vec![],
            },
            DispersalRule::BestSuitability => match self.best(candidates, grid) {
                Some(cell) => vec![(cell, migrants)],
                None => vec![],
            },
        }
    }

    /// The candidate with the highest habitat score. Ties are broken
    /// uniformly at random, keeping each tied cell with probability 1/k when
    /// it is the k-th one seen.
    fn best(&mut self, candidates: &[Cell], grid: &Grid) -> Option<Cell> {
        let mut best = None;
        let mut best_score = f64::NEG_INFINITY;
        let mut n_best: u32 = 0;
        for &cell in candidates {
            let score = grid.habitat_score(cell);
            if best.is_none() || score > best_score {
                best = Some(cell);
                best_score = score;
                n_best = 1;
            } else if score == best_score {
                n_best += 1;
                if self.rng.gen_range(0..n_best) == 0 {
                    best = Some(cell);
                }
            }
        }
        best
    }
}

/// Every candidate receives `migrants / n`, and the remainder goes one
/// person each to the first candidates in order.
fn even_split(candidates: &[Cell], migrants: u64) -> Vec<(Cell, u64)> {
    let n = candidates.len() as u64;
    let share = migrants / n;
    let remainder = (migrants % n) as usize;
    candidates
        .iter()
        .enumerate()
        .map(|(i, &cell)| (cell, if i < remainder { share + 1 } else { share }))
        .filter(|&(_, persons)| persons > 0)
        .collect()
}
