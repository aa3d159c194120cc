use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event_sourcing::core::{deserialize_event, serialize_event, DomainEvent, EventDecodeError};
use super::value_objects::Mark;

// ============================================================================
// Game Events - Domain Events for the Game Aggregate
// ============================================================================

/// Game Event - Union type for all game events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GameEvent {
    Started(GameStarted),
    MoveMade(MoveMade),
    CheatMoveMade(CheatMoveMade),
    Finished(GameFinished),
    FinishedWithDraw(GameFinishedWithDraw),
}

impl DomainEvent for GameEvent {
    fn event_type(&self) -> &'static str {
        match self {
            GameEvent::Started(_) => GameStarted::EVENT_TYPE,
            GameEvent::MoveMade(_) => MoveMade::EVENT_TYPE,
            GameEvent::CheatMoveMade(_) => CheatMoveMade::EVENT_TYPE,
            GameEvent::Finished(_) => GameFinished::EVENT_TYPE,
            GameEvent::FinishedWithDraw(_) => GameFinishedWithDraw::EVENT_TYPE,
        }
    }

    fn encode_payload(&self) -> serde_json::Result<String> {
        match self {
            GameEvent::Started(e) => serialize_event(e),
            GameEvent::MoveMade(e) => serialize_event(e),
            GameEvent::CheatMoveMade(e) => serialize_event(e),
            GameEvent::Finished(e) => serialize_event(e),
            GameEvent::FinishedWithDraw(e) => serialize_event(e),
        }
    }

    fn decode_payload(event_type: &str, payload: &str) -> Result<Self, EventDecodeError> {
        let event = match event_type {
            GameStarted::EVENT_TYPE => GameEvent::Started(deserialize_event(event_type, payload)?),
            MoveMade::EVENT_TYPE => GameEvent::MoveMade(deserialize_event(event_type, payload)?),
            CheatMoveMade::EVENT_TYPE => {
                GameEvent::CheatMoveMade(deserialize_event(event_type, payload)?)
            }
            GameFinished::EVENT_TYPE => GameEvent::Finished(deserialize_event(event_type, payload)?),
            GameFinishedWithDraw::EVENT_TYPE => {
                GameEvent::FinishedWithDraw(deserialize_event(event_type, payload)?)
            }
            other => return Err(EventDecodeError::UnknownEventType(other.to_string())),
        };
        Ok(event)
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Game Started - Initial event in the game lifecycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GameStarted {
    pub game_id: Uuid,
    pub first_player_id: Uuid,
    pub second_player_id: Uuid,
    pub board_size: usize,
    pub win_length: usize,
}

impl GameStarted {
    pub const EVENT_TYPE: &'static str = "GameStarted";
}

/// Move Made - player placed their own mark
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoveMade {
    pub player_id: Uuid,
    pub row: usize,
    pub column: usize,
    pub mark: Mark,
}

impl MoveMade {
    pub const EVENT_TYPE: &'static str = "MoveMade";
}

/// Cheat Move Made - the opponent's mark landed instead of the mover's
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheatMoveMade {
    pub player_id: Uuid,
    pub row: usize,
    pub column: usize,
    pub correct_mark: Mark,
    pub cheat_mark: Mark,
}

impl CheatMoveMade {
    pub const EVENT_TYPE: &'static str = "CheatMoveMade";
}

/// Game Finished - a line of `win_length` was completed
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GameFinished {
    pub winner_id: Uuid,
    pub winner_mark: Mark,
}

impl GameFinished {
    pub const EVENT_TYPE: &'static str = "GameFinished";
}

/// Game Finished With Draw - board filled without a winner
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct GameFinishedWithDraw {}

impl GameFinishedWithDraw {
    pub const EVENT_TYPE: &'static str = "GameFinishedWithDraw";
}
