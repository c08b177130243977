use alloc::collections::{BTreeSet, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::InProgress
    }
}

/// The three things a player (or solver) can do to a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveAction {
    Query,
    ToggleFlag,
    MarkSafe,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MoveEffect {
    NoChange,
    Revealed,
    MineHit,
    Flagged,
    Unflagged,
    Marked,
    Won,
}

/// One accepted move together with a deep copy of the visible grid after it
/// was applied, for replay and trial bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub coords: Coord2,
    pub action: MoveAction,
    pub grid: Array2<Tile>,
}

/// Where a game state comes from. Each case is validated independently.
#[derive(Clone, Debug, PartialEq)]
pub enum StateSource {
    /// A newly generated board, all cells unseen.
    Fresh(Board),
    /// A board plus the ordered moves to replay against it.
    Recorded {
        board: Board,
        moves: Vec<(Coord2, MoveAction)>,
    },
    /// A serialized game; the last snapshot is restored directly.
    Saved(SavedGame),
}

/// Plain nested-array interchange form, JSON-compatible, consumed by the web
/// layer for session storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub board: Vec<Vec<i8>>,
    pub moves: Vec<SavedMove>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedMove {
    pub x: Coord,
    pub y: Coord,
    pub action: MoveAction,
    pub grid: Vec<Vec<i8>>,
}

/// Mutable player-visible state machine on top of an immutable [`Board`].
///
/// All mutation goes through [`GameState::apply`]; once the status is
/// terminal every further move is rejected, so a finished state is
/// effectively immutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    board: Board,
    grid: Array2<Tile>,
    flagged_count: CellCount,
    status: GameStatus,
    triggered_mine: Option<Coord2>,
    history: Vec<MoveRecord>,
}

impl GameState {
    pub fn new(board: Board) -> Self {
        let size = board.size();
        Self {
            board,
            grid: Array2::default(size.to_nd_index()),
            flagged_count: 0,
            status: Default::default(),
            triggered_mine: None,
            history: Vec::new(),
        }
    }

    pub fn from_source(source: StateSource) -> Result<Self> {
        match source {
            StateSource::Fresh(board) => Ok(Self::new(board)),
            StateSource::Recorded { board, moves } => Self::replay(board, &moves),
            StateSource::Saved(saved) => Self::from_saved(&saved),
        }
    }

    /// Rebuilds a state by replaying recorded moves. The moves were accepted
    /// once, so a rejection here means the record does not belong to this
    /// board.
    pub fn replay(board: Board, moves: &[(Coord2, MoveAction)]) -> Result<Self> {
        let mut state = Self::new(board);
        for &(coords, action) in moves {
            state
                .apply(coords, action)
                .map_err(|_| GameError::ReplayRejected)?;
        }
        Ok(state)
    }

    /// Restores the last snapshot of a saved game, re-deriving the flag
    /// counter and terminal status from the grid.
    pub fn from_saved(saved: &SavedGame) -> Result<Self> {
        let board = Board::from_rows(&saved.board)?;
        let mut state = Self::new(board);

        let mut history = Vec::with_capacity(saved.moves.len());
        for saved_move in &saved.moves {
            history.push(MoveRecord {
                coords: (saved_move.x, saved_move.y),
                action: saved_move.action,
                grid: rows_to_grid(&saved_move.grid, state.board.size())?,
            });
        }

        if let Some(last) = history.last() {
            state.grid = last.grid.clone();
            state.validate_grid()?;
            state.flagged_count = state
                .grid
                .iter()
                .filter(|&&tile| tile == Tile::Flagged)
                .count()
                .try_into()
                .map_err(|_| GameError::InvalidSaveData)?;
            state.status = if state.grid.iter().any(|&tile| tile == Tile::Exploded) {
                GameStatus::Lost
            } else if state.board.mine_count() > 0 && state.flags_match_mines() {
                GameStatus::Won
            } else {
                GameStatus::InProgress
            };
            // a lost game accepts no further moves, so its final recorded
            // move is the query that hit the mine
            if state.status == GameStatus::Lost
                && last.action == MoveAction::Query
                && state.board.is_mine(last.coords)
            {
                state.triggered_mine = Some(last.coords);
            }
        }
        state.history = history;
        Ok(state)
    }

    pub fn to_saved(&self) -> SavedGame {
        SavedGame {
            board: self.board.to_rows(),
            moves: self
                .history
                .iter()
                .map(|record| SavedMove {
                    x: record.coords.0,
                    y: record.coords.1,
                    action: record.action,
                    grid: grid_to_rows(&record.grid),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_saved()).map_err(|_| GameError::InvalidSaveData)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let saved: SavedGame =
            serde_json::from_str(data).map_err(|_| GameError::InvalidSaveData)?;
        Self::from_saved(&saved)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn grid(&self) -> &Array2<Tile> {
        &self.grid
    }

    pub fn tile_at(&self, coords: Coord2) -> Tile {
        self.grid[coords.to_nd_index()]
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Single move entry point. `Err` means the move was rejected and nothing
    /// changed, including the history.
    pub fn apply(
        &mut self,
        coords: Coord2,
        action: MoveAction,
    ) -> core::result::Result<MoveEffect, RejectedMove> {
        let result = self.dispatch(coords, action);
        match result {
            Ok(_) => self.history.push(MoveRecord {
                coords,
                action,
                grid: self.grid.clone(),
            }),
            Err(reason) => log::debug!(
                "Rejected {:?} at ({}, {}): {}",
                action,
                coords.0,
                coords.1,
                reason
            ),
        }
        result
    }

    fn dispatch(
        &mut self,
        coords: Coord2,
        action: MoveAction,
    ) -> core::result::Result<MoveEffect, RejectedMove> {
        let size = self.board.size();
        if coords.0 >= size.0 || coords.1 >= size.1 {
            return Err(RejectedMove::OutOfBounds);
        }
        if self.status.is_over() {
            return Err(RejectedMove::GameAlreadyOver);
        }

        match action {
            MoveAction::Query => self.query(coords),
            MoveAction::ToggleFlag => self.toggle_flag(coords),
            MoveAction::MarkSafe => self.mark_safe(coords),
        }
    }

    fn query(&mut self, coords: Coord2) -> core::result::Result<MoveEffect, RejectedMove> {
        match self.tile_at(coords) {
            Tile::Flagged => Err(RejectedMove::MustUnflagFirst),
            _ if self.board.is_mine(coords) => {
                self.explode(coords);
                Ok(MoveEffect::MineHit)
            }
            Tile::Unseen => {
                self.flood_reveal(coords);
                Ok(MoveEffect::Revealed)
            }
            // Revealed numbers stay as they are; a safety mark is advisory
            // and is never converted into a number by a query.
            Tile::Revealed(_) | Tile::MarkedSafe | Tile::Exploded => Ok(MoveEffect::NoChange),
        }
    }

    /// A lost game shows every mine, not just the one that was hit. Flags
    /// sitting on mines are overwritten as well.
    fn explode(&mut self, triggered: Coord2) {
        for coords in self.board.iter_mines().collect::<Vec<_>>() {
            if self.grid[coords.to_nd_index()] == Tile::Flagged {
                self.flagged_count -= 1;
            }
            self.grid[coords.to_nd_index()] = Tile::Exploded;
        }
        self.triggered_mine = Some(triggered);
        self.status = GameStatus::Lost;
    }

    /// Work-list flood fill: reveal unseen cells, expanding through cells
    /// whose adjacency count is zero. A cell is only ever expanded when it
    /// transitions out of `Unseen`, so total work is bounded by the grid
    /// area; no call-stack recursion is involved.
    fn flood_reveal(&mut self, start: Coord2) {
        let mut visited = BTreeSet::new();
        let mut to_visit = VecDeque::from([start]);

        while let Some(coords) = to_visit.pop_front() {
            if !visited.insert(coords) {
                continue;
            }
            if self.grid[coords.to_nd_index()] != Tile::Unseen {
                continue;
            }

            let count = self.board.count_at(coords);
            self.grid[coords.to_nd_index()] = Tile::Revealed(count);

            if count == 0 {
                to_visit.extend(
                    self.board
                        .iter_neighbors(coords)
                        .filter(|&pos| self.grid[pos.to_nd_index()] == Tile::Unseen)
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }

    fn toggle_flag(&mut self, coords: Coord2) -> core::result::Result<MoveEffect, RejectedMove> {
        let toggled = match self.tile_at(coords) {
            Tile::Unseen => {
                self.grid[coords.to_nd_index()] = Tile::Flagged;
                self.flagged_count += 1;
                MoveEffect::Flagged
            }
            Tile::Flagged => {
                self.grid[coords.to_nd_index()] = Tile::Unseen;
                self.flagged_count -= 1;
                MoveEffect::Unflagged
            }
            _ => return Err(RejectedMove::CannotFlag),
        };

        if self.board.mine_count() > 0 && self.flags_match_mines() {
            self.status = GameStatus::Won;
            return Ok(MoveEffect::Won);
        }
        Ok(toggled)
    }

    fn mark_safe(&mut self, coords: Coord2) -> core::result::Result<MoveEffect, RejectedMove> {
        if self.tile_at(coords) != Tile::Unseen {
            return Err(RejectedMove::CannotMarkSafe);
        }
        self.grid[coords.to_nd_index()] = Tile::MarkedSafe;
        Ok(MoveEffect::Marked)
    }

    /// Win requires the flag set to equal the mine set exactly; matching
    /// counts alone is not enough.
    fn flags_match_mines(&self) -> bool {
        self.flagged_count == self.board.mine_count()
            && self
                .board
                .iter_mines()
                .all(|coords| self.grid[coords.to_nd_index()] == Tile::Flagged)
    }

    fn validate_grid(&self) -> Result<()> {
        for ((x, y), &tile) in self.grid.indexed_iter() {
            let coords = (x as Coord, y as Coord);
            match tile {
                Tile::Revealed(count) => {
                    if self.board.is_mine(coords) || self.board.count_at(coords) != count {
                        return Err(GameError::InvalidSaveData);
                    }
                }
                Tile::Exploded => {
                    if !self.board.is_mine(coords) {
                        return Err(GameError::InvalidSaveData);
                    }
                }
                Tile::Unseen | Tile::Flagged | Tile::MarkedSafe => {}
            }
        }
        Ok(())
    }
}

fn grid_to_rows(grid: &Array2<Tile>) -> Vec<Vec<i8>> {
    grid.outer_iter()
        .map(|row| row.iter().map(|tile| tile.code()).collect())
        .collect()
}

fn rows_to_grid(rows: &[Vec<i8>], size: Coord2) -> Result<Array2<Tile>> {
    if rows.len() != size.0 as usize || rows.iter().any(|row| row.len() != size.1 as usize) {
        return Err(GameError::InvalidBoardShape);
    }
    let mut grid = Array2::default(size.to_nd_index());
    for (x, row) in rows.iter().enumerate() {
        for (y, &code) in row.iter().enumerate() {
            grid[(x, y)] = Tile::from_code(code)?;
        }
    }
    Ok(grid)
}
