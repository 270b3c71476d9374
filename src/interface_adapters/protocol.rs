// Wire protocol DTOs and conversions for messages exchanged with game clients.

use crate::domain::{Cell, Color, Coordinate, Direction, GameSnapshot, PlayerState};
use crate::domain::tuning::{HEIGHT, WIDTH};
use crate::use_cases::{FinishReason, GameId, GameUpdate};
use serde::{Deserialize, Serialize};

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    // Which game and snake this connection controls.
    Assigned { game_id: GameId, color: ColorDto },
    // Both players are present; snapshots follow.
    GameReady { game_id: GameId },
    Snapshot(SnapshotDto),
    // Terminal message. The top-level `winner` field marks it.
    GameOver {
        game_id: GameId,
        winner: ColorDto,
        reason: FinishReasonDto,
    },
}

impl From<GameUpdate> for ServerMessage {
    fn from(update: GameUpdate) -> Self {
        match update {
            GameUpdate::Ready { game_id } => ServerMessage::GameReady { game_id },
            GameUpdate::Snapshot {
                game_id,
                tick,
                snapshot,
                ..
            } => ServerMessage::Snapshot(SnapshotDto::new(game_id, tick, &snapshot)),
            GameUpdate::Finished {
                game_id,
                winner,
                reason,
            } => ServerMessage::GameOver {
                game_id,
                winner: winner.into(),
                reason: reason.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorDto {
    Red,
    Blue,
}

impl From<Color> for ColorDto {
    fn from(color: Color) -> Self {
        match color {
            Color::Red => ColorDto::Red,
            Color::Blue => ColorDto::Blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReasonDto {
    Collision,
    Forfeit,
}

impl From<FinishReason> for FinishReasonDto {
    fn from(reason: FinishReason) -> Self {
        match reason {
            FinishReason::Collision => FinishReasonDto::Collision,
            FinishReason::Forfeit => FinishReasonDto::Forfeit,
        }
    }
}

/// One board cell on the wire; `None` serializes as `null` for empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellDto {
    Red,
    Blue,
    Food,
}

fn cell_dto(cell: Cell) -> Option<CellDto> {
    match cell {
        Cell::Empty => None,
        Cell::Snake(Color::Red) => Some(CellDto::Red),
        Cell::Snake(Color::Blue) => Some(CellDto::Blue),
        Cell::Food => Some(CellDto::Food),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionDto {
    Up,
    Down,
    Left,
    Right,
}

impl From<Direction> for DirectionDto {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => DirectionDto::Up,
            Direction::Down => DirectionDto::Down,
            Direction::Left => DirectionDto::Left,
            Direction::Right => DirectionDto::Right,
        }
    }
}

impl From<DirectionDto> for Direction {
    fn from(direction: DirectionDto) -> Self {
        match direction {
            DirectionDto::Up => Direction::Up,
            DirectionDto::Down => Direction::Down,
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoordinateDto {
    pub x: i32,
    pub y: i32,
}

impl From<Coordinate> for CoordinateDto {
    fn from(at: Coordinate) -> Self {
        Self { x: at.x, y: at.y }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    // Head first.
    pub body: Vec<CoordinateDto>,
    pub heading: DirectionDto,
    pub growth_remaining: u32,
}

impl From<&PlayerState> for PlayerDto {
    fn from(player: &PlayerState) -> Self {
        Self {
            body: player.body.iter().copied().map(CoordinateDto::from).collect(),
            heading: player.heading.into(),
            growth_remaining: player.growth_remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayersDto {
    pub red: PlayerDto,
    pub blue: PlayerDto,
}

/// Full game state for one tick; enough to render without further queries.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotDto {
    pub game_id: GameId,
    pub tick: u64,
    pub width: i32,
    pub height: i32,
    // Row-major: board[y][x].
    pub board: Vec<Vec<Option<CellDto>>>,
    pub players: PlayersDto,
}

impl SnapshotDto {
    pub fn new(game_id: GameId, tick: u64, snapshot: &GameSnapshot) -> Self {
        Self {
            game_id,
            tick,
            width: WIDTH,
            height: HEIGHT,
            board: snapshot
                .board
                .rows()
                .map(|row| row.iter().copied().map(cell_dto).collect())
                .collect(),
            players: PlayersDto {
                red: PlayerDto::from(&snapshot.red),
                blue: PlayerDto::from(&snapshot.blue),
            },
        }
    }
}

/// Encodes an update for the wire.
///
/// Snapshots are shared by every subscriber of a game, so their text is cached on the update
/// and only the first caller pays for serialization.
pub fn encode_update(update: GameUpdate) -> Result<String, serde_json::Error> {
    let wire = match &update {
        GameUpdate::Snapshot { wire, .. } => {
            if let Some(txt) = wire.get() {
                return Ok(txt.clone());
            }
            Some(wire.clone())
        }
        _ => None,
    };

    let txt = serde_json::to_string(&ServerMessage::from(update))?;
    if let Some(wire) = wire {
        let _ = wire.set(txt.clone());
    }
    Ok(txt)
}

/// Parses an inbound payload into a direction.
///
/// Clients send a bare token (`up`, `down`, `left`, `right`); a JSON string of the same token
/// is accepted too. Anything else yields `None` and is ignored by the caller.
pub fn parse_direction(payload: &str) -> Option<Direction> {
    let token = payload.trim();
    match token {
        "up" => Some(Direction::Up),
        "down" => Some(Direction::Down),
        "left" => Some(Direction::Left),
        "right" => Some(Direction::Right),
        _ => serde_json::from_str::<DirectionDto>(token)
            .ok()
            .map(Direction::from),
    }
}
