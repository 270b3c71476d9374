// Use-case level identifiers, per-tick inputs, and outbound updates.

use crate::domain::{Color, Direction, GameSnapshot};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

pub type GameId = Uuid;

/// Opaque per-connection token.
pub type ConnId = u64;

/// Where a connection sits for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBinding {
    pub game_id: GameId,
    pub color: Color,
}

/// At most one move per color per tick; a later move overwrites an earlier one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingMoves {
    red: Option<Direction>,
    blue: Option<Direction>,
}

impl PendingMoves {
    pub fn queue(&mut self, color: Color, direction: Direction) {
        *self.slot(color) = Some(direction);
    }

    pub fn get(&self, color: Color) -> Option<Direction> {
        match color {
            Color::Red => self.red,
            Color::Blue => self.blue,
        }
    }

    /// Empties the map, yielding red's move before blue's.
    pub fn drain(&mut self) -> impl Iterator<Item = (Color, Direction)> {
        let red = self.red.take().map(|d| (Color::Red, d));
        let blue = self.blue.take().map(|d| (Color::Blue, d));
        red.into_iter().chain(blue)
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_none() && self.blue.is_none()
    }

    fn slot(&mut self, color: Color) -> &mut Option<Direction> {
        match color {
            Color::Red => &mut self.red,
            Color::Blue => &mut self.blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Waiting,
    InProgress,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// A snake hit a wall or a body.
    Collision,
    /// The opponent disconnected mid-game.
    Forfeit,
}

/// Messages fanned out to every subscriber of one game.
#[derive(Debug, Clone)]
pub enum GameUpdate {
    Ready {
        game_id: GameId,
    },
    Snapshot {
        game_id: GameId,
        tick: u64,
        snapshot: Arc<GameSnapshot>,
        // Encoded once by whichever subscriber gets there first, then shared.
        wire: Arc<OnceLock<String>>,
    },
    Finished {
        game_id: GameId,
        winner: Color,
        reason: FinishReason,
    },
}
