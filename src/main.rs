use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use tictactoe_es::config::AppConfig;
use tictactoe_es::domain::game::{GameEvent, GameRepository, GameService, Mark, StdRandom};
use tictactoe_es::event_sourcing::store::{EventStore, InMemoryEventStore, PostgresEventStore};
use tictactoe_es::metrics::Metrics;
use tictactoe_es::utils::{retry_on_transient, RetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tictactoe_es=debug")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        board_size = config.game.board_size,
        win_length = config.game.win_length,
        "Starting event-sourced tic-tac-toe"
    );

    // === 1. Event store ===
    let event_store: Arc<dyn EventStore<GameEvent>> = match &config.database_url {
        Some(url) => {
            let store = PostgresEventStore::connect(url, config.db_max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store.ensure_schema().await?;
            Arc::new(store)
        }
        None => {
            tracing::info!("DATABASE_URL not set, using the in-memory event store");
            Arc::new(InMemoryEventStore::new())
        }
    };

    // === 2. Service ===
    let metrics = Arc::new(Metrics::new()?);
    let service = GameService::new(
        GameRepository::new(event_store),
        config.game,
        StdRandom::factory(),
        metrics.clone(),
    );

    // === 3. Play a game ===
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let (game_id, mut version) = service.create_game(first, second).await?;

    // First player fills the top row, second player the one below
    let size = config.game.board_size;
    let mut turns = (0..size).flat_map(|column| [(first, 0, column), (second, 1, column)]);

    // A client still holding version 1 tries to play; the store refuses it
    if let Some((player, row, column)) = turns.next() {
        version = service.make_move(game_id, player, row, column, version).await?;
        match service.make_move(game_id, second, 2, 0, version - 1).await {
            Err(error) if error.is_conflict() => tracing::info!(
                error = %error,
                actual_version = ?error.actual_version(),
                "Stale write rejected as expected"
            ),
            other => tracing::warn!(result = ?other, "Stale write was not rejected"),
        }
    }

    for (player, row, column) in turns {
        // A conflict hands back the current version; retry against it
        let known = version;
        let result = retry_on_transient(RetryConfig::default(), |attempt| {
            let expected = attempt.observed_version.unwrap_or(known);
            service.make_move(game_id, player, row, column, expected)
        })
        .await
        .into_result();

        match result {
            Ok(new_version) => version = new_version,
            Err(error) => {
                tracing::info!(error = %error, "Move rejected, stopping");
                break;
            }
        }
    }

    // === 4. Report ===
    let view = service.get_game(first, game_id).await?;
    tracing::info!(
        game_id = %view.id,
        status = ?view.status,
        version,
        "Game over"
    );
    for row in &view.board {
        let line: String = row
            .iter()
            .map(|mark| match mark {
                Mark::X => 'X',
                Mark::O => 'O',
                Mark::Empty => '.',
            })
            .collect();
        tracing::info!("{}", line);
    }

    tracing::debug!("Metrics:\n{}", metrics.render()?);

    Ok(())
}
