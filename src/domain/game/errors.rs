// ============================================================================
// Game Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Board size must be between 3 and 1000, got {0}")]
    InvalidDimension(usize),

    #[error("Cell ({row}, {column}) is outside the {size}x{size} board")]
    OutOfBounds { row: usize, column: usize, size: usize },

    #[error("Cell ({row}, {column}) is already occupied")]
    CellOccupied { row: usize, column: usize },

    #[error("Cannot place an empty mark at ({row}, {column})")]
    EmptyMark { row: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Invalid board: {0}")]
    InvalidBoard(BoardError),

    #[error("Invalid move: {0}")]
    InvalidMove(BoardError),

    #[error("Game is already finished")]
    GameAlreadyFinished,

    #[error("It is the other player's turn")]
    NotYourTurn,

    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error("Corrupt event history: {0}")]
    CorruptHistory(String),
}
