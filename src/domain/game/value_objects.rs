use serde::{Deserialize, Serialize};

// ============================================================================
// Game Value Objects
// ============================================================================

/// Content of a board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mark {
    #[default]
    Empty,
    X,
    O,
}

impl Mark {
    /// The other player's mark; `Empty` stays `Empty`
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
            Mark::Empty => Mark::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Finished,
    Draw,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

/// Board dimensions applied to newly created games
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub board_size: usize,
    /// 0 means "same as board size"
    pub win_length: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            board_size: 3,
            win_length: 3,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
