use thiserror::Error;

/// Failures of construction, generation, and rehydration. All of these are
/// recoverable by the caller; nothing in the engine aborts the process.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid board configuration")]
    InvalidConfiguration,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Invalid cell value {0}")]
    InvalidCellValue(i8),
    #[error("Saved game data is inconsistent")]
    InvalidSaveData,
    #[error("Recorded move was rejected during replay")]
    ReplayRejected,
}

/// Why a move was not accepted. Rejection never mutates the game state and
/// never panics; callers treat it as an ordinary answer.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectedMove {
    #[error("Out of bounds")]
    OutOfBounds,
    #[error("The game is already over")]
    GameAlreadyOver,
    #[error("Must unflag first")]
    MustUnflagFirst,
    #[error("Cannot place a flag here")]
    CannotFlag,
    #[error("Cannot mark this cell safe")]
    CannotMarkSafe,
}

pub type Result<T> = core::result::Result<T, GameError>;
