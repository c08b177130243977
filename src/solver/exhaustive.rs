use alloc::vec;
use alloc::vec::Vec;
use itertools::Itertools;

use crate::*;

pub const DEFAULT_COMBINATION_BUDGET: u64 = 1 << 20;

/// Result of a bounded exhaustive solve. `Inconclusive` means the
/// combination budget ran out before the enumeration finished; the game
/// state is left untouched in that case.
#[derive(Clone, Debug, PartialEq)]
pub enum ExhaustiveOutcome {
    Resolved {
        mined: Vec<Coord2>,
        safe: Vec<Coord2>,
        consistent_count: u64,
    },
    Inconclusive {
        enumerated: u64,
    },
}

/// Brute-force tier: enumerates every placement of the remaining mines over
/// the still-unseen cells and keeps the placements consistent with all
/// revealed numbers. A cell that is a mine in every consistent placement is
/// flagged; a cell that is a mine in none is marked safe. Anything the
/// propagation tier can derive locally is invariant across all consistent
/// placements, so this tier only ever adds determinations.
///
/// The enumeration is `C(candidates, remaining)` and therefore worst-case
/// exponential; the budget caps the number of subsets examined and turns an
/// overrun into an explicit `Inconclusive` answer instead of an unbounded
/// hang.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExhaustiveSolver {
    max_combinations: u64,
}

impl ExhaustiveSolver {
    pub fn new(max_combinations: u64) -> Self {
        Self { max_combinations }
    }

    pub fn solve(&self, state: &mut GameState) -> ExhaustiveOutcome {
        let candidates = candidate_cells(state);
        let flagged = state.flagged_count();
        let total_mines = state.board().mine_count();
        if flagged > total_mines {
            log::warn!("More flags ({flagged}) than mines ({total_mines}), nothing to deduce");
            return resolved_empty(0);
        }
        let remaining = (total_mines - flagged) as usize;
        if remaining > candidates.len() {
            log::warn!(
                "{remaining} mines left but only {} candidate cells",
                candidates.len()
            );
            return resolved_empty(0);
        }

        let clues = collect_clues(state, &candidates);

        let mut in_all = vec![true; candidates.len()];
        let mut in_any = vec![false; candidates.len()];
        let mut membership = vec![false; candidates.len()];
        let mut consistent_count = 0u64;
        let mut enumerated = 0u64;

        for subset in (0..candidates.len()).combinations(remaining) {
            enumerated += 1;
            if enumerated > self.max_combinations {
                log::debug!("Combination budget exhausted after {} subsets", enumerated - 1);
                return ExhaustiveOutcome::Inconclusive {
                    enumerated: enumerated - 1,
                };
            }

            membership.fill(false);
            for &id in &subset {
                membership[id] = true;
            }
            if !is_consistent(&clues, &membership) {
                continue;
            }

            consistent_count += 1;
            for (id, &is_mine) in membership.iter().enumerate() {
                if is_mine {
                    in_any[id] = true;
                } else {
                    in_all[id] = false;
                }
            }
        }

        if consistent_count == 0 {
            log::debug!("No mine placement is consistent with the revealed numbers");
            return resolved_empty(0);
        }

        let mined: Vec<_> = candidates
            .iter()
            .enumerate()
            .filter(|&(id, _)| in_all[id])
            .map(|(_, &coords)| coords)
            .collect();
        let safe: Vec<_> = candidates
            .iter()
            .enumerate()
            .filter(|&(id, _)| !in_any[id])
            .map(|(_, &coords)| coords)
            .collect();

        // Safety marks first: flagging the last mine can end the game, and
        // a finished game accepts no further moves.
        for &coords in &safe {
            if let Err(reason) = state.apply(coords, MoveAction::MarkSafe) {
                log::debug!("Skipping safety mark at {coords:?}: {reason}");
            }
        }
        for &coords in &mined {
            if let Err(reason) = state.apply(coords, MoveAction::ToggleFlag) {
                log::debug!("Skipping flag at {coords:?}: {reason}");
            }
        }

        ExhaustiveOutcome::Resolved {
            mined,
            safe,
            consistent_count,
        }
    }
}

impl Default for ExhaustiveSolver {
    fn default() -> Self {
        Self::new(DEFAULT_COMBINATION_BUDGET)
    }
}

/// Convenience wrapper with the default budget.
pub fn run_exhaustive(state: &mut GameState) -> ExhaustiveOutcome {
    ExhaustiveSolver::default().solve(state)
}

fn resolved_empty(consistent_count: u64) -> ExhaustiveOutcome {
    ExhaustiveOutcome::Resolved {
        mined: Vec::new(),
        safe: Vec::new(),
        consistent_count,
    }
}

/// Cells that could still hold a mine: unseen, not flagged, not proven safe.
fn candidate_cells(state: &GameState) -> Vec<Coord2> {
    state
        .grid()
        .indexed_iter()
        .filter(|&(_, &tile)| tile == Tile::Unseen)
        .map(|((x, y), _)| (x as Coord, y as Coord))
        .collect()
}

struct Clue {
    /// Mines the subset must still supply, after subtracting already
    /// flagged neighbors. Flags count as assumed mines here so that partial
    /// solves by the propagation tier stay consistent. A negative target
    /// (over-flagged clue) is unsatisfiable and rejects every placement.
    target: i16,
    candidate_ids: Vec<usize>,
}

fn collect_clues(state: &GameState, candidates: &[Coord2]) -> Vec<Clue> {
    let id_of = |coords: Coord2| candidates.binary_search(&coords).ok();

    let mut clues = Vec::new();
    for ((x, y), &tile) in state.grid().indexed_iter() {
        let Tile::Revealed(count) = tile else {
            continue;
        };
        let clue = (x as Coord, y as Coord);

        let mut flagged = 0i16;
        let mut candidate_ids = Vec::new();
        for pos in neighbors(clue, state.size()) {
            match state.tile_at(pos) {
                Tile::Flagged => flagged += 1,
                Tile::Unseen => {
                    candidate_ids.push(id_of(pos).expect("unseen cells are candidates"));
                }
                _ => {}
            }
        }

        clues.push(Clue {
            target: count as i16 - flagged,
            candidate_ids,
        });
    }
    clues
}

fn is_consistent(clues: &[Clue], membership: &[bool]) -> bool {
    clues.iter().all(|clue| {
        let assumed = clue
            .candidate_ids
            .iter()
            .filter(|&&id| membership[id])
            .count();
        assumed as i16 == clue.target
    })
}
