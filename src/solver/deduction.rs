use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use ndarray::Array2;

use crate::*;

/// Iterative constraint propagation over the revealed numbers.
///
/// Each pass scans every revealed cell with a positive count and compares
/// the count against its flagged and still-unseen neighbors: if every mine
/// around the cell is already flagged, the remaining unseen neighbors are
/// provably safe; if the unaccounted mines fill the unseen neighbors
/// exactly, those neighbors are provably mines. Every move this solver makes
/// is logically certain, but it can stall before the puzzle is fully
/// determined; the exhaustive tier picks up from there.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DeductionSolver {
    max_steps: usize,
}

impl DeductionSolver {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }

    pub fn solve(&self, state: &mut GameState) -> StepMatrix {
        let size = state.size();
        let mut steps = Array2::from_elem(size.to_nd_index(), UNRESOLVED);
        for (index, &tile) in state.grid().indexed_iter() {
            if tile == Tile::Unseen {
                steps[index] = 0;
            }
        }

        for pass in 0..self.max_steps {
            // Proposals for a whole pass are computed against the grid as it
            // stood when the pass began; two numbered cells in the same pass
            // never see each other's new flags. This keeps step counts
            // reproducible.
            let mut proposals = BTreeSet::new();
            for ((x, y), &tile) in state.grid().indexed_iter() {
                let Tile::Revealed(count) = tile else {
                    continue;
                };
                if count == 0 {
                    continue;
                }
                propose_for_clue(state, (x as Coord, y as Coord), count, &mut proposals);
            }

            if proposals.is_empty() {
                log::debug!("Deduction fixpoint after {pass} passes");
                break;
            }
            log::debug!("Deduction pass {pass}: {} proposals", proposals.len());

            // Safety marks go first so that a win triggered by the final
            // flag cannot reject marks still pending in the same pass.
            let mut ordered: Vec<_> = proposals.into_iter().collect();
            ordered.sort_by_key(|&(action, _)| action != MoveAction::MarkSafe);

            for (action, coords) in ordered {
                if state.apply(coords, action).is_ok() {
                    steps[coords.to_nd_index()] = pass as i32 + 1;
                }
            }
        }
        steps
    }
}

/// Deductions available from a single revealed cell. Marked-safe neighbors
/// are already resolved and participate in neither count.
fn propose_for_clue(
    state: &GameState,
    clue: Coord2,
    count: u8,
    proposals: &mut BTreeSet<(MoveAction, Coord2)>,
) {
    let mut open = Vec::new();
    let mut flagged = 0u8;
    for pos in neighbors(clue, state.size()) {
        match state.tile_at(pos) {
            Tile::Unseen => open.push(pos),
            Tile::Flagged => flagged += 1,
            _ => {}
        }
    }

    if open.is_empty() {
        return;
    }

    let unaccounted = count as i16 - flagged as i16;
    let action = if unaccounted == 0 {
        MoveAction::MarkSafe
    } else if unaccounted == open.len() as i16 {
        MoveAction::ToggleFlag
    } else {
        return;
    };

    proposals.extend(open.into_iter().map(|pos| (action, pos)));
}

/// Convenience wrapper matching the shape of the web layer's solver call.
pub fn run_deduction(state: &mut GameState, max_steps: usize) -> StepMatrix {
    DeductionSolver::new(max_steps).solve(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn board(rows: &[Vec<i8>]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    #[test]
    fn flags_a_forced_mine_and_wins() {
        // single mine in the corner; everything else floods open
        let mut state = GameState::new(board(&[
            vec![-1, 1, 0],
            vec![1, 1, 0],
            vec![0, 0, 0],
        ]));
        state.apply((2, 2), MoveAction::Query).unwrap();

        let steps = run_deduction(&mut state, 5);

        assert_eq!(state.tile_at((0, 0)), Tile::Flagged);
        assert_eq!(state.status(), GameStatus::Won);
        assert_eq!(steps[[0, 0]], 1);
        // revealed cells were never candidates
        assert_eq!(steps[[1, 1]], UNRESOLVED);
    }

    #[test]
    fn marks_neighbors_safe_once_the_count_is_accounted_for() {
        let mut state = GameState::new(board(&[
            vec![0, 1, -1],
            vec![0, 1, 1],
            vec![0, 0, 0],
            vec![1, 1, 0],
            vec![-1, 1, 0],
        ]));
        state.apply((0, 2), MoveAction::ToggleFlag).unwrap();
        state.apply((1, 1), MoveAction::Query).unwrap();

        let steps = run_deduction(&mut state, 5);

        for coords in [(0, 0), (0, 1), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)] {
            assert_eq!(state.tile_at(coords), Tile::MarkedSafe, "at {coords:?}");
            assert_eq!(steps[coords.to_nd_index()], 1);
        }
        // nothing near the second mine is revealed, so it stays open
        assert_eq!(state.tile_at((4, 0)), Tile::Unseen);
        assert_eq!(state.status(), GameStatus::InProgress);
    }

    #[test]
    fn later_passes_build_on_earlier_flags() {
        // (0,0)=1 forces the flag at (0,1) in pass 1; only then is (0,2)=1
        // satisfied, so (0,3) is marked safe in pass 2. An unbatched solver
        // would resolve it in pass 1.
        let mut state = GameState::new(board(&[vec![1, -1, 1, 0, 0, 1, -1, 1]]));
        state.apply((0, 0), MoveAction::Query).unwrap();
        state.apply((0, 2), MoveAction::Query).unwrap();

        let steps = run_deduction(&mut state, 5);

        assert_eq!(state.tile_at((0, 1)), Tile::Flagged);
        assert_eq!(state.tile_at((0, 3)), Tile::MarkedSafe);
        assert_eq!(steps[[0, 1]], 1);
        assert_eq!(steps[[0, 3]], 2);
    }

    #[test]
    fn never_flags_a_safe_cell_on_the_reference_board() {
        let mut state = GameState::new(board(&[
            vec![0, 1, 1, 1],
            vec![0, 1, -1, 1],
            vec![0, 2, 2, 2],
            vec![0, 1, -1, 1],
        ]));
        state.apply((0, 0), MoveAction::Query).unwrap();

        run_deduction(&mut state, 5);

        for ((x, y), &tile) in state.grid().indexed_iter() {
            if tile == Tile::Flagged {
                assert!(state.board().is_mine((x as Coord, y as Coord)));
            }
            if tile == Tile::MarkedSafe {
                assert!(!state.board().is_mine((x as Coord, y as Coord)));
            }
        }
    }

    #[test]
    fn solving_again_after_a_fixpoint_changes_nothing() {
        let mut state = GameState::new(board(&[vec![1, -1, 1, 0, 0, 1, -1, 1]]));
        state.apply((0, 0), MoveAction::Query).unwrap();
        state.apply((0, 2), MoveAction::Query).unwrap();

        run_deduction(&mut state, 5);
        let settled = state.clone();
        let steps = run_deduction(&mut state, 5);

        assert_eq!(state, settled);
        assert!(steps.iter().all(|&step| step <= 0));
    }
}
