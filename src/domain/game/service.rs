use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, DomainEvent};
use crate::event_sourcing::store::EventStoreError;
use crate::metrics::Metrics;
use crate::utils::IsTransient;
use super::aggregate::{Game, GameView};
use super::errors::GameError;
use super::events::GameEvent;
use super::random::RandomSourceFactory;
use super::repository::{GameRepository, RepositoryError};
use super::value_objects::GameSettings;

// ============================================================================
// Game Service - inbound operations for the transport layer
// ============================================================================
//
// Every read hands back the stream version; every write is conditioned on the
// version the caller last saw. One Game instance is built per call from a
// fresh replay, with its own random source.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Game not found: {0}")]
    NotFound(Uuid),

    #[error("Player {player_id} does not take part in game {game_id}")]
    NotParticipant { player_id: Uuid, game_id: Uuid },

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Store(#[from] EventStoreError),
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Store(e) => ServiceError::Store(e),
            RepositoryError::Replay(e) => ServiceError::Game(e),
        }
    }
}

impl ServiceError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Store(EventStoreError::VersionConflict { .. }))
    }

    /// Version the caller should re-synchronize to after a conflict
    pub fn actual_version(&self) -> Option<i64> {
        match self {
            ServiceError::Store(e) => e.actual_version(),
            _ => None,
        }
    }
}

impl IsTransient for ServiceError {
    fn is_transient(&self) -> bool {
        self.is_conflict()
    }

    fn observed_version(&self) -> Option<i64> {
        self.actual_version()
    }
}

pub struct GameService {
    repository: GameRepository,
    settings: GameSettings,
    random: RandomSourceFactory,
    metrics: Arc<Metrics>,
}

impl GameService {
    pub fn new(
        repository: GameRepository,
        settings: GameSettings,
        random: RandomSourceFactory,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            repository,
            settings,
            random,
            metrics,
        }
    }

    /// Start a game with the configured board; returns (game_id, version)
    pub async fn create_game(
        &self,
        first_player_id: Uuid,
        second_player_id: Uuid,
    ) -> Result<(Uuid, i64), ServiceError> {
        let mut game = Game::start(
            first_player_id,
            second_player_id,
            self.settings.board_size,
            self.settings.win_length,
            (self.random)(),
        )?;

        let started = Instant::now();
        let event_types = event_types(game.uncommitted_events());
        let (game_id, version) = self.repository.create(&mut game).await?;
        self.metrics
            .record_append("create", event_types, started.elapsed().as_secs_f64());
        self.metrics.games_created.inc();

        tracing::info!(
            game_id = %game_id,
            first_player_id = %first_player_id,
            second_player_id = %second_player_id,
            board_size = game.board_size(),
            win_length = game.win_length(),
            "Game created"
        );

        Ok((game_id, version))
    }

    /// Full game state for one of its participants
    pub async fn get_game(&self, player_id: Uuid, game_id: Uuid) -> Result<GameView, ServiceError> {
        let game = self.load(game_id).await?;

        if !game.is_participant(player_id) {
            return Err(ServiceError::NotParticipant { player_id, game_id });
        }

        Ok(game.view())
    }

    /// Play a move against the version the caller last observed
    ///
    /// Returns the new version. Outsiders get `NotParticipant` whatever
    /// version they send; a stale `expected_version` from a participant is
    /// rejected with `VersionConflict` before the game is touched.
    pub async fn make_move(
        &self,
        game_id: Uuid,
        player_id: Uuid,
        row: usize,
        column: usize,
        expected_version: i64,
    ) -> Result<i64, ServiceError> {
        if expected_version < 0 {
            return Err(EventStoreError::NegativeVersion(expected_version).into());
        }

        let mut game = self.load(game_id).await?;
        if !game.is_participant(player_id) {
            return Err(ServiceError::NotParticipant { player_id, game_id });
        }

        let actual_version = game.version();
        if actual_version != expected_version {
            self.metrics.record_conflict();
            tracing::warn!(
                game_id = %game_id,
                expected_version,
                actual_version,
                "Stale move rejected"
            );
            return Err(EventStoreError::VersionConflict {
                expected: expected_version,
                actual: actual_version,
            }
            .into());
        }

        game.make_move(player_id, row, column)?;

        let pending = game.uncommitted_events().to_vec();
        let started = Instant::now();
        let version = match self.repository.save(&mut game, expected_version).await {
            Ok(version) => version,
            Err(error) => {
                if matches!(error, EventStoreError::VersionConflict { .. }) {
                    self.metrics.record_conflict();
                }
                return Err(error.into());
            }
        };
        self.metrics.record_append(
            "move",
            event_types(&pending),
            started.elapsed().as_secs_f64(),
        );
        self.record_outcome(&pending);

        tracing::debug!(
            game_id = %game_id,
            player_id = %player_id,
            row,
            column,
            new_version = version,
            status = ?game.status(),
            "Move applied"
        );

        Ok(version)
    }

    async fn load(&self, game_id: Uuid) -> Result<Game, ServiceError> {
        self.repository
            .load(game_id, (self.random)())
            .await?
            .ok_or(ServiceError::NotFound(game_id))
    }

    fn record_outcome(&self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::MoveMade(_) => self.metrics.record_move(false),
                GameEvent::CheatMoveMade(e) => {
                    self.metrics.record_move(true);
                    tracing::info!(
                        player_id = %e.player_id,
                        row = e.row,
                        column = e.column,
                        cheat_mark = ?e.cheat_mark,
                        "Cheat move placed"
                    );
                }
                GameEvent::Finished(_) => self.metrics.record_finish("win"),
                GameEvent::FinishedWithDraw(_) => self.metrics.record_finish("draw"),
                GameEvent::Started(_) => {}
            }
        }
    }
}

fn event_types(events: &[GameEvent]) -> Vec<&'static str> {
    events.iter().map(DomainEvent::event_type).collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::game::random::FixedRandom;
    use crate::domain::game::value_objects::{GameStatus, Mark};
    use crate::event_sourcing::store::InMemoryEventStore;

    struct Fixture {
        service: Arc<GameService>,
        metrics: Arc<Metrics>,
        first: Uuid,
        second: Uuid,
    }

    fn fixture(sample: f64) -> Fixture {
        let metrics = Arc::new(Metrics::new().unwrap());
        let repository = GameRepository::new(Arc::new(InMemoryEventStore::new()));
        let service = GameService::new(
            repository,
            GameSettings::default(),
            FixedRandom::factory(sample),
            metrics.clone(),
        );

        Fixture {
            service: Arc::new(service),
            metrics,
            first: Uuid::new_v4(),
            second: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_game() {
        let f = fixture(0.5);

        let (game_id, version) = f.service.create_game(f.first, f.second).await.unwrap();
        let view = f.service.get_game(f.second, game_id).await.unwrap();

        assert_eq!(version, 1);
        assert_eq!(view.id, game_id);
        assert_eq!(view.version, 1);
        assert_eq!(view.status, GameStatus::InProgress);
        assert_eq!(view.current_player_id, f.first);
        assert_eq!(view.board, vec![vec![Mark::Empty; 3]; 3]);
        assert_eq!(f.metrics.games_created.get(), 1);
    }

    #[tokio::test]
    async fn test_get_game_requires_participant() {
        let f = fixture(0.5);
        let (game_id, _) = f.service.create_game(f.first, f.second).await.unwrap();

        let result = f.service.get_game(Uuid::new_v4(), game_id).await;

        assert!(matches!(result, Err(ServiceError::NotParticipant { .. })));
        assert!(!result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_get_unknown_game_is_not_found() {
        let f = fixture(0.5);
        let game_id = Uuid::new_v4();

        let result = f.service.get_game(f.first, game_id).await;

        assert!(matches!(result, Err(ServiceError::NotFound(id)) if id == game_id));
    }

    #[tokio::test]
    async fn test_moves_advance_version() {
        let f = fixture(0.5);
        let (game_id, version) = f.service.create_game(f.first, f.second).await.unwrap();

        let version = f.service.make_move(game_id, f.first, 0, 0, version).await.unwrap();
        let version = f.service.make_move(game_id, f.second, 1, 1, version).await.unwrap();

        assert_eq!(version, 3);
        let view = f.service.get_game(f.first, game_id).await.unwrap();
        assert_eq!(view.version, 3);
        assert_eq!(view.board[0][0], Mark::X);
        assert_eq!(view.board[1][1], Mark::O);
        assert_eq!(f.metrics.moves_total.with_label_values(&["move"]).get(), 2);
    }

    #[tokio::test]
    async fn test_winning_move_adds_two_versions() {
        let f = fixture(0.5);
        let (game_id, mut version) = f.service.create_game(f.first, f.second).await.unwrap();

        for (player, row, column) in [
            (f.first, 0, 0),
            (f.second, 1, 0),
            (f.first, 0, 1),
            (f.second, 1, 1),
        ] {
            version = f.service.make_move(game_id, player, row, column, version).await.unwrap();
        }
        assert_eq!(version, 5);

        let version = f.service.make_move(game_id, f.first, 0, 2, version).await.unwrap();
        assert_eq!(version, 7);

        let view = f.service.get_game(f.first, game_id).await.unwrap();
        assert_eq!(view.status, GameStatus::Finished);
        assert_eq!(f.metrics.games_finished.with_label_values(&["win"]).get(), 1);

        let result = f.service.make_move(game_id, f.second, 2, 2, version).await;
        assert!(matches!(result, Err(ServiceError::Game(GameError::GameAlreadyFinished))));
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected_without_applying() {
        let f = fixture(0.5);
        let (game_id, version) = f.service.create_game(f.first, f.second).await.unwrap();
        f.service.make_move(game_id, f.first, 0, 0, version).await.unwrap();

        let result = f.service.make_move(game_id, f.second, 1, 1, version).await;

        let error = result.unwrap_err();
        assert!(error.is_conflict());
        assert!(error.is_transient());
        assert_eq!(error.actual_version(), Some(2));

        let view = f.service.get_game(f.first, game_id).await.unwrap();
        assert_eq!(view.board[1][1], Mark::Empty);
        assert_eq!(f.metrics.version_conflicts.get(), 1);
    }

    #[tokio::test]
    async fn test_outsider_move_is_not_a_conflict() {
        let f = fixture(0.5);
        let (game_id, version) = f.service.create_game(f.first, f.second).await.unwrap();

        let result = f.service.make_move(game_id, Uuid::new_v4(), 0, 0, version).await;

        let error = result.unwrap_err();
        assert!(matches!(error, ServiceError::NotParticipant { .. }));
        assert!(!error.is_conflict());
        assert!(!error.is_transient());
    }

    #[tokio::test]
    async fn test_outsider_with_stale_version_is_not_told_the_version() {
        let f = fixture(0.5);
        let (game_id, version) = f.service.create_game(f.first, f.second).await.unwrap();
        let version = f.service.make_move(game_id, f.first, 0, 0, version).await.unwrap();

        let result = f.service.make_move(game_id, Uuid::new_v4(), 1, 1, version - 1).await;

        let error = result.unwrap_err();
        assert!(matches!(error, ServiceError::NotParticipant { .. }));
        assert!(!error.is_conflict());
        assert_eq!(error.actual_version(), None);
        assert_eq!(f.metrics.version_conflicts.get(), 0);
    }

    #[tokio::test]
    async fn test_negative_expected_version_is_a_validation_failure() {
        let f = fixture(0.5);
        let (game_id, _) = f.service.create_game(f.first, f.second).await.unwrap();

        let result = f.service.make_move(game_id, f.first, 0, 0, -1).await;

        let error = result.unwrap_err();
        assert!(matches!(error, ServiceError::Store(EventStoreError::NegativeVersion(-1))));
        assert!(!error.is_conflict());
        assert!(!error.is_transient());

        let view = f.service.get_game(f.first, game_id).await.unwrap();
        assert_eq!(view.version, 1);
        assert_eq!(view.board[0][0], Mark::Empty);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_stale_version() {
        use crate::utils::{retry_on_transient, RetryConfig};

        let f = fixture(0.5);
        let (game_id, stale) = f.service.create_game(f.first, f.second).await.unwrap();
        let current = f.service.make_move(game_id, f.first, 0, 0, stale).await.unwrap();

        let service = f.service.clone();
        let second = f.second;
        let version = retry_on_transient(RetryConfig::default(), |attempt| {
            let expected = attempt.observed_version.unwrap_or(stale);
            let service = service.clone();
            async move { service.make_move(game_id, second, 1, 1, expected).await }
        })
        .await
        .into_result()
        .unwrap();

        assert_eq!(version, current + 1);
        assert_eq!(f.metrics.version_conflicts.get(), 1);
    }

    #[tokio::test]
    async fn test_move_on_unknown_game_is_not_found() {
        let f = fixture(0.5);
        let result = f.service.make_move(Uuid::new_v4(), f.first, 0, 0, 1).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_concurrent_moves_have_one_winner() {
        let f = fixture(0.5);
        let (game_id, version) = f.service.create_game(f.first, f.second).await.unwrap();

        let submit = |service: Arc<GameService>, player: Uuid| {
            tokio::spawn(async move { service.make_move(game_id, player, 1, 1, version).await })
        };
        let left = submit(f.service.clone(), f.first);
        let right = submit(f.service.clone(), f.first);
        let (left, right) = tokio::join!(left, right);
        let results = [left.unwrap(), right.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let conflict = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(conflict.is_conflict());
        assert_eq!(conflict.actual_version(), Some(2));
    }

    #[tokio::test]
    async fn test_cheat_move_is_counted() {
        let f = fixture(0.01);
        let (game_id, mut version) = f.service.create_game(f.first, f.second).await.unwrap();

        for (player, row, column) in [(f.first, 0, 0), (f.second, 2, 2), (f.first, 0, 2)] {
            version = f.service.make_move(game_id, player, row, column, version).await.unwrap();
        }

        let view = f.service.get_game(f.first, game_id).await.unwrap();
        assert_eq!(view.board[0][2], Mark::O);
        assert_eq!(f.metrics.moves_total.with_label_values(&["cheat"]).get(), 1);
    }
}
