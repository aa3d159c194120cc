use std::sync::Arc;

use uuid::Uuid;

use crate::event_sourcing::core::Aggregate;
use crate::event_sourcing::store::{EventStore, EventStoreError};
use super::aggregate::Game;
use super::errors::GameError;
use super::events::GameEvent;
use super::random::RandomSource;

// ============================================================================
// Game Repository
// ============================================================================
//
// load = fetch events -> replay into a fresh Game
// save = uncommitted events -> append with the caller's expected version
//
// Pending events are cleared only after the store accepts them.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] EventStoreError),

    #[error("Failed to replay game history: {0}")]
    Replay(#[from] GameError),
}

#[derive(Clone)]
pub struct GameRepository {
    event_store: Arc<dyn EventStore<GameEvent>>,
}

impl GameRepository {
    pub fn new(event_store: Arc<dyn EventStore<GameEvent>>) -> Self {
        Self { event_store }
    }

    /// Persist a brand-new game's stream
    pub async fn create(&self, game: &mut Game) -> Result<(Uuid, i64), EventStoreError> {
        let version = self.save(game, 0).await?;
        Ok((game.aggregate_id(), version))
    }

    /// Replay the game's history; `None` when no events exist for `game_id`
    pub async fn load(
        &self,
        game_id: Uuid,
        random: Box<dyn RandomSource>,
    ) -> Result<Option<Game>, RepositoryError> {
        let events = self.event_store.load_events(game_id).await?;
        Ok(Game::load_from_events(events, random)?)
    }

    pub async fn save(&self, game: &mut Game, expected_version: i64) -> Result<i64, EventStoreError> {
        let version = self
            .event_store
            .append(game.uncommitted_events(), game.aggregate_id(), expected_version)
            .await?;
        game.mark_events_committed();
        Ok(version)
    }

    pub async fn current_version(&self, game_id: Uuid) -> Result<i64, EventStoreError> {
        self.event_store.current_version(game_id).await
    }
}
