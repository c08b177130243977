use alloc::vec;
use ndarray::Array2;

use super::*;

/// Uniform seeded placement: a flat vector of mine markers is shuffled and
/// reshaped into the grid, so every layout with the configured mine count is
/// equally likely.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: GameConfig) -> Board {
        use rand::prelude::*;

        let total_cells = config.total_cells() as usize;
        let mut markers = vec![false; total_cells];
        for marker in markers.iter_mut().take(config.mines as usize) {
            *marker = true;
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        markers.shuffle(&mut rng);

        let mines = Array2::from_shape_vec(config.size.to_nd_index(), markers)
            .expect("marker vector matches the configured shape");

        let board = Board::from_mine_mask(mines);
        if board.mine_count() != config.mines {
            log::warn!(
                "Generated board mine count mismatch, actual: {}, requested: {}",
                board.mine_count(),
                config.mines
            );
        }
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_the_requested_number_of_mines() {
        let config = GameConfig::new((6, 6), 35).unwrap();
        let board = RandomBoardGenerator::new(3).generate(config);

        assert_eq!(board.mine_count(), 35);
        assert_eq!(board.size(), (6, 6));
    }

    #[test]
    fn zero_mines_yields_an_all_zero_board() {
        let config = GameConfig::new((3, 3), 0).unwrap();
        let board = RandomBoardGenerator::new(0).generate(config);

        assert_eq!(board.mine_count(), 0);
        assert!((0..3).all(|x| (0..3).all(|y| board.count_at((x, y)) == 0)));
    }

    #[test]
    fn seeds_partition_the_layout_space() {
        let config = GameConfig::new((8, 8), 16).unwrap();
        let first = RandomBoardGenerator::new(11).generate(config);
        let second = RandomBoardGenerator::new(11).generate(config);

        assert_eq!(first, second);
    }
}
