use serde::Serialize;
use uuid::Uuid;

use crate::event_sourcing::core::Aggregate;
use super::board::Board;
use super::errors::GameError;
use super::events::*;
use super::random::RandomSource;
use super::value_objects::{GameStatus, Mark};

// ============================================================================
// Game Aggregate - Domain Logic
// ============================================================================
//
// InProgress -> Finished   (winning move)
// InProgress -> Draw       (board full, no winner)
// Finished and Draw accept nothing further.
//
// ============================================================================

/// Every `CHEAT_MOVE_INTERVAL`-th move may turn into a cheat move
pub const CHEAT_MOVE_INTERVAL: u32 = 3;

/// Chance that an eligible move places the opponent's mark
pub const CHEAT_PROBABILITY: f64 = 0.10;

#[derive(Clone, Copy, Debug)]
enum Direction {
    Horizontal,
    Vertical,
    MainDiagonal,
    SecondaryDiagonal,
}

impl Direction {
    const ALL: [Direction; 4] = [
        Direction::Horizontal,
        Direction::Vertical,
        Direction::MainDiagonal,
        Direction::SecondaryDiagonal,
    ];

    fn delta(self) -> (isize, isize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
            Direction::MainDiagonal => (1, 1),
            Direction::SecondaryDiagonal => (-1, 1),
        }
    }
}

#[derive(Debug)]
pub struct Game {
    id: Uuid,
    version: i64,
    first_player_id: Uuid,
    second_player_id: Uuid,
    current_player_id: Uuid,
    status: GameStatus,
    current_move: u32,
    win_length: usize,
    board: Board,
    random: Box<dyn RandomSource>,
    uncommitted: Vec<GameEvent>,
}

/// Serializable read model of a game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameView {
    pub id: Uuid,
    pub first_player_id: Uuid,
    pub second_player_id: Uuid,
    pub current_player_id: Uuid,
    pub status: GameStatus,
    pub board: Vec<Vec<Mark>>,
    pub current_move: u32,
    pub win_length: usize,
    pub version: i64,
}

impl Game {
    /// Start a new game; the only pending event is `GameStarted`
    ///
    /// A `win_length` of 0 or larger than the board falls back to the board
    /// size.
    pub fn start(
        first_player_id: Uuid,
        second_player_id: Uuid,
        board_size: usize,
        win_length: usize,
        random: Box<dyn RandomSource>,
    ) -> Result<Self, GameError> {
        Board::new(board_size).map_err(GameError::InvalidBoard)?;

        let win_length = if win_length == 0 || win_length > board_size {
            board_size
        } else {
            win_length
        };

        let event = GameEvent::Started(GameStarted {
            game_id: Uuid::new_v4(),
            first_player_id,
            second_player_id,
            board_size,
            win_length,
        });

        let mut game = Self::apply_first_event(&event, random)?;
        game.uncommitted.push(event);
        Ok(game)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn first_player_id(&self) -> Uuid {
        self.first_player_id
    }

    pub fn second_player_id(&self) -> Uuid {
        self.second_player_id
    }

    pub fn current_player_id(&self) -> Uuid {
        self.current_player_id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn current_move(&self) -> u32 {
        self.current_move
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    pub fn board_size(&self) -> usize {
        self.board.size()
    }

    pub fn is_full(&self) -> bool {
        self.board.is_full()
    }

    pub fn is_participant(&self, player_id: Uuid) -> bool {
        player_id == self.first_player_id || player_id == self.second_player_id
    }

    pub fn current_player_mark(&self) -> Mark {
        if self.current_player_id == self.first_player_id {
            Mark::X
        } else {
            Mark::O
        }
    }

    pub fn board(&self) -> Vec<Vec<Mark>> {
        self.board.cells()
    }

    pub fn view(&self) -> GameView {
        GameView {
            id: self.id,
            first_player_id: self.first_player_id,
            second_player_id: self.second_player_id,
            current_player_id: self.current_player_id,
            status: self.status,
            board: self.board.cells(),
            current_move: self.current_move,
            win_length: self.win_length,
            version: self.version,
        }
    }

    /// Validate and play a move, recording one move event and possibly a
    /// finish event. On error nothing changes.
    pub fn make_move(&mut self, player_id: Uuid, row: usize, column: usize) -> Result<(), GameError> {
        if self.status.is_terminal() {
            return Err(GameError::GameAlreadyFinished);
        }

        if player_id != self.current_player_id {
            return Err(GameError::NotYourTurn);
        }

        self.board
            .check_placement(row, column)
            .map_err(GameError::InvalidMove)?;

        let mark = self.current_player_mark();
        let move_event = if self.rolls_cheat() {
            GameEvent::CheatMoveMade(CheatMoveMade {
                player_id,
                row,
                column,
                correct_mark: mark,
                cheat_mark: mark.opponent(),
            })
        } else {
            GameEvent::MoveMade(MoveMade {
                player_id,
                row,
                column,
                mark,
            })
        };
        self.record(move_event)?;

        if let Some(winner_mark) = self.winning_mark_at(row, column) {
            let winner_id = if winner_mark == Mark::X {
                self.first_player_id
            } else {
                self.second_player_id
            };
            self.record(GameEvent::Finished(GameFinished {
                winner_id,
                winner_mark,
            }))?;
        } else if self.board.is_full() {
            self.record(GameEvent::FinishedWithDraw(GameFinishedWithDraw {}))?;
        }

        Ok(())
    }

    /// Only draws a sample on eligible moves
    fn rolls_cheat(&mut self) -> bool {
        self.current_move % CHEAT_MOVE_INTERVAL == 0 && self.random.next_f64() < CHEAT_PROBABILITY
    }

    fn record(&mut self, event: GameEvent) -> Result<(), GameError> {
        self.apply_event(&event)?;
        self.uncommitted.push(event);
        Ok(())
    }

    /// Mark of a line through (row, column) at least `win_length` long
    fn winning_mark_at(&self, row: usize, column: usize) -> Option<Mark> {
        let mark = self.board.get_cell(row, column).ok()?;
        if mark == Mark::Empty {
            return None;
        }

        Direction::ALL
            .iter()
            .any(|direction| {
                let (delta_row, delta_column) = direction.delta();
                let forward = self.board.count_run(row, column, (delta_row, delta_column), mark, self.win_length);
                let backward = self.board.count_run(row, column, (-delta_row, -delta_column), mark, self.win_length);
                1 + forward + backward >= self.win_length
            })
            .then_some(mark)
    }

    fn place(&mut self, player_id: Uuid, row: usize, column: usize, mark: Mark) -> Result<(), GameError> {
        self.board
            .place_mark(row, column, mark)
            .map_err(GameError::InvalidMove)?;

        self.current_move += 1;
        self.current_player_id = if player_id == self.first_player_id {
            self.second_player_id
        } else {
            self.first_player_id
        };
        Ok(())
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Game {
    type Event = GameEvent;
    type Error = GameError;
    type Context = Box<dyn RandomSource>;

    fn apply_first_event(event: &Self::Event, random: Self::Context) -> Result<Self, Self::Error> {
        match event {
            GameEvent::Started(e) => {
                let board = Board::new(e.board_size).map_err(|error| {
                    GameError::CorruptHistory(format!("GameStarted for {}: {}", e.game_id, error))
                })?;
                if e.win_length == 0 || e.win_length > e.board_size {
                    return Err(GameError::CorruptHistory(format!(
                        "GameStarted for {} has win length {} on a {}x{} board",
                        e.game_id, e.win_length, e.board_size, e.board_size
                    )));
                }
                Ok(Self {
                    id: e.game_id,
                    version: 1,
                    first_player_id: e.first_player_id,
                    second_player_id: e.second_player_id,
                    current_player_id: e.first_player_id,
                    status: GameStatus::InProgress,
                    current_move: 1,
                    win_length: e.win_length,
                    board,
                    random,
                    uncommitted: Vec::new(),
                })
            }
            _ => Err(GameError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            GameEvent::Started(_) => {
                return Err(GameError::CorruptHistory(format!(
                    "game {} started twice",
                    self.id
                )));
            }
            GameEvent::MoveMade(e) => self.place(e.player_id, e.row, e.column, e.mark)?,
            GameEvent::CheatMoveMade(e) => self.place(e.player_id, e.row, e.column, e.cheat_mark)?,
            GameEvent::Finished(_) => self.status = GameStatus::Finished,
            GameEvent::FinishedWithDraw(_) => self.status = GameStatus::Draw,
        }

        self.version += 1;
        Ok(())
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted
    }

    fn mark_events_committed(&mut self) {
        self.uncommitted.clear();
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
