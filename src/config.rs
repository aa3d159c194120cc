use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::domain::game::board::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::domain::game::GameSettings;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read from the environment, after loading an optional .env file:
//
//   TICTACTOE_BOARD_SIZE            board edge length (default 3, min 3)
//   TICTACTOE_WIN_LENGTH            marks in a row to win (default 3,
//                                   0 or > board size = board size)
//   DATABASE_URL                    PostgreSQL URL; in-memory store if unset
//   TICTACTOE_DB_MAX_CONNECTIONS    pool size (default 5)
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub game: GameSettings,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let board_size: usize = parse_or(&lookup, "TICTACTOE_BOARD_SIZE", 3)?;
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&board_size) {
            bail!(
                "TICTACTOE_BOARD_SIZE must be between {MIN_BOARD_SIZE} and {MAX_BOARD_SIZE}, got {board_size}"
            );
        }

        let win_length: usize = parse_or(&lookup, "TICTACTOE_WIN_LENGTH", 3)?;
        let db_max_connections: u32 = parse_or(&lookup, "TICTACTOE_DB_MAX_CONNECTIONS", 5)?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            game: GameSettings {
                board_size,
                win_length,
            },
            database_url,
            db_max_connections,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}
