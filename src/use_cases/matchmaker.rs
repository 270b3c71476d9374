use crate::domain::Color;
use crate::use_cases::types::{ConnId, GameId};
use uuid::Uuid;

// A connection holding a reserved game id until an opponent arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingSlot {
    pub game_id: GameId,
    pub conn_id: ConnId,
    pub color: Color,
}

// Outcome returned after assigning a connection to a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Waiting {
        game_id: GameId,
        color: Color,
    },
    Matched {
        game_id: GameId,
        color: Color,
        opponent: WaitingSlot,
    },
}

impl MatchOutcome {
    pub fn game_id(&self) -> GameId {
        match self {
            MatchOutcome::Waiting { game_id, .. } | MatchOutcome::Matched { game_id, .. } => {
                *game_id
            }
        }
    }

    pub fn color(&self) -> Color {
        match self {
            MatchOutcome::Waiting { color, .. } | MatchOutcome::Matched { color, .. } => *color,
        }
    }
}

// In-memory matchmaker pairing connections two at a time.
#[derive(Debug, Default)]
pub struct Matchmaker {
    // Most recent entry last; matching pops from the end.
    waiting: Vec<WaitingSlot>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self {
            waiting: Vec::new(),
        }
    }

    // Join the most recently waiting game, or open a new one as red.
    pub fn assign(&mut self, conn_id: ConnId) -> MatchOutcome {
        if let Some(opponent) = self.waiting.pop() {
            return MatchOutcome::Matched {
                game_id: opponent.game_id,
                color: opponent.color.opposite(),
                opponent,
            };
        }

        let game_id = Uuid::new_v4();
        self.waiting.push(WaitingSlot {
            game_id,
            conn_id,
            color: Color::Red,
        });

        MatchOutcome::Waiting {
            game_id,
            color: Color::Red,
        }
    }

    // Drop a connection that gave up before being matched.
    pub fn remove_waiting(&mut self, conn_id: ConnId) -> Option<WaitingSlot> {
        let index = self
            .waiting
            .iter()
            .position(|slot| slot.conn_id == conn_id)?;
        Some(self.waiting.remove(index))
    }

    pub fn is_waiting(&self, game_id: GameId) -> bool {
        self.waiting.iter().any(|slot| slot.game_id == game_id)
    }

    pub fn waiting(&self) -> &[WaitingSlot] {
        &self.waiting
    }
}
