#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use generator::*;
pub use solver::*;
pub use tile::*;
pub use types::*;

mod engine;
mod error;
mod generator;
mod solver;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Validates that both dimensions are positive and that at least one cell
    /// is left free of mines. Zero mines is a legal (trivial) configuration.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 || mines >= mult(size.0, size.1) {
            return Err(GameError::InvalidConfiguration);
        }
        Ok(Self::new_unchecked(size, mines))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

/// Immutable mine layout plus the precomputed adjacency-count grid.
///
/// Counts are clamped at the grid boundary: edge and corner cells have fewer
/// neighbors, never wrapped ones. Mine cells carry a count of 0; callers are
/// expected to check [`Board::is_mine`] first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    mines: Array2<bool>,
    counts: Array2<u8>,
    mine_count: CellCount,
}

impl Board {
    pub fn from_mine_mask(mines: Array2<bool>) -> Self {
        let mine_count = mines
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();
        let counts = compute_counts(&mines);
        Self {
            mines,
            counts,
            mine_count,
        }
    }

    /// Builds a board from the plain nested-array form (`-1` = mine, `0..=8`
    /// = adjacency count). Counts are recomputed from the mine positions so
    /// the stored grid always satisfies the adjacency invariant; a mismatch
    /// against the provided numbers is logged, not fatal.
    pub fn from_rows(rows: &[Vec<i8>]) -> Result<Self> {
        let length = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if length == 0
            || width == 0
            || length > Coord::MAX as usize
            || width > Coord::MAX as usize
            || rows.iter().any(|row| row.len() != width)
        {
            return Err(GameError::InvalidBoardShape);
        }

        let mut mines = Array2::default((length, width));
        for (x, row) in rows.iter().enumerate() {
            for (y, &value) in row.iter().enumerate() {
                match value {
                    -1 => mines[(x, y)] = true,
                    0..=8 => {}
                    other => return Err(GameError::InvalidCellValue(other)),
                }
            }
        }

        let board = Self::from_mine_mask(mines);
        for (x, row) in rows.iter().enumerate() {
            for (y, &value) in row.iter().enumerate() {
                let stored = board.counts[(x, y)];
                if value >= 0 && value != stored as i8 {
                    log::warn!(
                        "Adjacency count mismatch at ({x}, {y}): given {value}, actual {stored}"
                    );
                }
            }
        }
        Ok(board)
    }

    /// Inverse of [`Board::from_rows`].
    pub fn to_rows(&self) -> Vec<Vec<i8>> {
        self.mines
            .outer_iter()
            .zip(self.counts.outer_iter())
            .map(|(mine_row, count_row)| {
                mine_row
                    .iter()
                    .zip(count_row.iter())
                    .map(|(&is_mine, &count)| if is_mine { -1 } else { count as i8 })
                    .collect()
            })
            .collect()
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mines.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.mines.len().try_into().unwrap()
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn is_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn count_at(&self, coords: Coord2) -> u8 {
        self.counts[coords.to_nd_index()]
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> impl Iterator<Item = Coord2> {
        neighbors(coords, self.size())
    }

    pub(crate) fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.mines
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((x, y), _)| (x as Coord, y as Coord))
    }
}

impl Index<Coord2> for Board {
    type Output = bool;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.mines[(x as usize, y as usize)]
    }
}

fn compute_counts(mines: &Array2<bool>) -> Array2<u8> {
    let dim = mines.dim();
    let bounds: Coord2 = (
        dim.0.try_into().unwrap(),
        dim.1.try_into().unwrap(),
    );
    Array2::from_shape_fn(dim, |(x, y)| {
        if mines[(x, y)] {
            return 0;
        }
        neighbors((x as Coord, y as Coord), bounds)
            .filter(|&pos| mines[pos.to_nd_index()])
            .count()
            .try_into()
            .unwrap()
    })
}

/// Generates a board with `mines` mines placed uniformly at random under
/// `seed`. No solvability check is performed here; callers wanting a fair
/// puzzle regenerate and re-run the solvers until satisfied.
pub fn generate_board(length: Coord, width: Coord, mines: CellCount, seed: u64) -> Result<Board> {
    let config = GameConfig::new((length, width), mines)?;
    Ok(RandomBoardGenerator::new(seed).generate(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn config_rejects_full_board_and_zero_dimensions() {
        assert_eq!(GameConfig::new((0, 4), 1), Err(GameError::InvalidConfiguration));
        assert_eq!(GameConfig::new((4, 0), 1), Err(GameError::InvalidConfiguration));
        assert_eq!(GameConfig::new((2, 2), 4), Err(GameError::InvalidConfiguration));
        assert!(GameConfig::new((2, 2), 0).is_ok());
    }

    #[test]
    fn generated_board_has_exact_mine_count_and_true_counts() {
        let board = generate_board(9, 7, 12, 42).unwrap();

        assert_eq!(board.mine_count(), 12);
        assert_eq!(board.iter_mines().count(), 12);

        let (x_end, y_end) = board.size();
        for x in 0..x_end {
            for y in 0..y_end {
                if board.is_mine((x, y)) {
                    continue;
                }
                let expected = board
                    .iter_neighbors((x, y))
                    .filter(|&pos| board.is_mine(pos))
                    .count() as u8;
                assert_eq!(board.count_at((x, y)), expected);
            }
        }
    }

    #[test]
    fn generation_is_deterministic_under_a_seed() {
        let first = generate_board(8, 8, 10, 7).unwrap();
        let second = generate_board(8, 8, 10, 7).unwrap();
        let other = generate_board(8, 8, 10, 8).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn rows_round_trip() {
        let rows = vec![
            vec![0, 1, 1, 1],
            vec![0, 1, -1, 1],
            vec![0, 2, 2, 2],
            vec![0, 1, -1, 1],
        ];
        let board = Board::from_rows(&rows).unwrap();

        assert_eq!(board.mine_count(), 2);
        assert!(board.is_mine((1, 2)));
        assert!(board.is_mine((3, 2)));
        assert_eq!(board.to_rows(), rows);
    }

    #[test]
    fn from_rows_rejects_bad_shapes_and_values() {
        assert_eq!(
            Board::from_rows(&[vec![0, 0], vec![0]]),
            Err(GameError::InvalidBoardShape)
        );
        assert_eq!(Board::from_rows(&[]), Err(GameError::InvalidBoardShape));
        assert_eq!(
            Board::from_rows(&[vec![0, 9]]),
            Err(GameError::InvalidCellValue(9))
        );
    }
}
