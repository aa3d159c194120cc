// ============================================================================
// Game Domain - Business Logic for the Game Aggregate
// ============================================================================
//
// This module contains ALL game-specific code:
// - Value objects (Mark, GameStatus, GameSettings)
// - Board (grid state and run counting)
// - Events (GameStarted, MoveMade, CheatMoveMade, ...)
// - Errors (BoardError, GameError)
// - Random source for the cheat rule
// - Aggregate (Game with move validation and win/draw detection)
// - Repository (GameRepository) and application service (GameService)
//
// ============================================================================

pub mod value_objects;
pub mod board;
pub mod events;
pub mod errors;
pub mod random;
pub mod aggregate;
pub mod repository;
pub mod service;

// Re-export for convenience
pub use value_objects::*;
pub use board::Board;
pub use events::*;
pub use errors::*;
pub use random::{FixedRandom, RandomSource, RandomSourceFactory, StdRandom};
pub use aggregate::*;
pub use repository::*;
pub use service::*;
