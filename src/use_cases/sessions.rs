// Session bookkeeping: which connection plays which color in which game.
//
// The registry is the single owner of the waiting pool, the active games, and their update
// channels. Callers serialize access to it (one lock), so connects, moves, disconnects, and
// ticks never interleave inside a game.

use crate::domain::{Color, Direction, Game, Outcome};
use crate::use_cases::matchmaker::{MatchOutcome, Matchmaker};
use crate::use_cases::types::{
    ConnId, FinishReason, GameId, GamePhase, GameUpdate, PendingMoves, SessionBinding,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Errors returned by registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The connection id already has a binding.
    AlreadyBound { conn_id: ConnId },
}

/// What a freshly connected client needs to follow its game.
#[derive(Debug)]
pub struct Ticket {
    pub game_id: GameId,
    pub color: Color,
    /// Subscribed before the game can publish anything, so nothing is missed.
    pub updates: broadcast::Receiver<GameUpdate>,
    /// True when this connection completed a pair and the game is already running.
    pub started: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDisposition {
    Queued,
    /// Still waiting for an opponent; the move is dropped.
    NotStarted,
    Unbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    Forfeited {
        game_id: GameId,
        winner: Color,
        winner_conn: ConnId,
    },
    LeftPool {
        game_id: GameId,
    },
    Unbound,
}

/// One running game plus everything the tick loop needs to drive it.
#[derive(Debug)]
pub(crate) struct ActiveGame {
    pub(crate) game_id: GameId,
    pub(crate) game: Game,
    pub(crate) pending: PendingMoves,
    pub(crate) tick: u64,
    red_conn: ConnId,
    blue_conn: ConnId,
    updates_tx: broadcast::Sender<GameUpdate>,
}

impl ActiveGame {
    fn conn(&self, color: Color) -> ConnId {
        match color {
            Color::Red => self.red_conn,
            Color::Blue => self.blue_conn,
        }
    }

    /// Applies this tick's moves and steps the simulation once.
    pub(crate) fn advance(&mut self) -> Outcome {
        for (color, direction) in self.pending.drain() {
            self.game.set_direction(color, direction);
        }
        self.tick += 1;
        self.game.step()
    }

    pub(crate) fn publish_snapshot(&self) {
        // No receivers just means both clients are gone; the game is torn down separately.
        let _ = self.updates_tx.send(GameUpdate::Snapshot {
            game_id: self.game_id,
            tick: self.tick,
            snapshot: Arc::new(self.game.snapshot()),
            wire: Arc::default(),
        });
    }

    fn publish_finished(&self, winner: Color, reason: FinishReason) {
        let _ = self.updates_tx.send(GameUpdate::Finished {
            game_id: self.game_id,
            winner,
            reason,
        });
    }
}

/// Thread-safe only behind a lock; every method takes `&mut self` or `&self`.
#[derive(Debug)]
pub struct SessionRegistry {
    matchmaker: Matchmaker,
    bindings: HashMap<ConnId, SessionBinding>,
    games: HashMap<GameId, ActiveGame>,
    // Update channels for games still waiting on their second player.
    waiting_updates: HashMap<GameId, broadcast::Sender<GameUpdate>>,
    update_capacity: usize,
}

impl SessionRegistry {
    pub fn new(update_capacity: usize) -> Self {
        Self {
            matchmaker: Matchmaker::new(),
            bindings: HashMap::new(),
            games: HashMap::new(),
            waiting_updates: HashMap::new(),
            update_capacity: update_capacity.max(1),
        }
    }

    /// Assigns a new connection to a game and subscribes it to that game's updates.
    pub fn connect(&mut self, conn_id: ConnId) -> Result<Ticket, SessionError> {
        debug_assert!(
            !self.bindings.contains_key(&conn_id),
            "connection {conn_id} matched twice"
        );
        if self.bindings.contains_key(&conn_id) {
            return Err(SessionError::AlreadyBound { conn_id });
        }

        match self.matchmaker.assign(conn_id) {
            MatchOutcome::Waiting { game_id, color } => {
                let (updates_tx, updates) = broadcast::channel(self.update_capacity);
                self.waiting_updates.insert(game_id, updates_tx);
                self.bindings
                    .insert(conn_id, SessionBinding { game_id, color });
                debug!(conn_id, %game_id, color = color.as_str(), "waiting for opponent");

                Ok(Ticket {
                    game_id,
                    color,
                    updates,
                    started: false,
                })
            }
            MatchOutcome::Matched {
                game_id,
                color,
                opponent,
            } => {
                debug_assert!(
                    !self.games.contains_key(&game_id),
                    "game {game_id} activated twice"
                );
                let updates_tx = self
                    .waiting_updates
                    .remove(&game_id)
                    .unwrap_or_else(|| broadcast::channel(self.update_capacity).0);
                let updates = updates_tx.subscribe();

                let (red_conn, blue_conn) = match color {
                    Color::Blue => (opponent.conn_id, conn_id),
                    Color::Red => (conn_id, opponent.conn_id),
                };
                let active = ActiveGame {
                    game_id,
                    game: Game::new(),
                    pending: PendingMoves::default(),
                    tick: 0,
                    red_conn,
                    blue_conn,
                    updates_tx,
                };
                let _ = active.updates_tx.send(GameUpdate::Ready { game_id });
                self.games.insert(game_id, active);
                self.bindings
                    .insert(conn_id, SessionBinding { game_id, color });
                info!(%game_id, red_conn, blue_conn, "game started");

                Ok(Ticket {
                    game_id,
                    color,
                    updates,
                    started: true,
                })
            }
        }
    }

    /// Queues a move for the next tick. Overwrites any earlier move this tick.
    pub fn bind_move(&mut self, conn_id: ConnId, direction: Direction) -> MoveDisposition {
        let Some(binding) = self.bindings.get(&conn_id) else {
            return MoveDisposition::Unbound;
        };
        match self.games.get_mut(&binding.game_id) {
            Some(active) => {
                active.pending.queue(binding.color, direction);
                MoveDisposition::Queued
            }
            None => MoveDisposition::NotStarted,
        }
    }

    /// Tears down whatever the connection was part of, immediately.
    pub fn disconnect(&mut self, conn_id: ConnId) -> DisconnectOutcome {
        let Some(binding) = self.bindings.remove(&conn_id) else {
            return DisconnectOutcome::Unbound;
        };
        let game_id = binding.game_id;

        if self.games.contains_key(&game_id) {
            let winner = binding.color.opposite();
            let winner_conn = self.games[&game_id].conn(winner);
            self.finish(game_id, winner, FinishReason::Forfeit);
            return DisconnectOutcome::Forfeited {
                game_id,
                winner,
                winner_conn,
            };
        }

        self.matchmaker.remove_waiting(conn_id);
        self.waiting_updates.remove(&game_id);
        debug!(conn_id, %game_id, "left waiting pool");
        DisconnectOutcome::LeftPool { game_id }
    }

    /// Announces the winner, then drops the game and both bindings.
    pub(crate) fn finish(&mut self, game_id: GameId, winner: Color, reason: FinishReason) {
        let Some(active) = self.games.remove(&game_id) else {
            return;
        };
        active.publish_finished(winner, reason);
        for color in [Color::Red, Color::Blue] {
            self.bindings.remove(&active.conn(color));
        }
        info!(%game_id, winner = winner.as_str(), ?reason, ticks = active.tick, "game finished");
        // Dropping `active` closes the channel once subscribers drain the final message.
    }

    pub(crate) fn games_mut(&mut self) -> impl Iterator<Item = &mut ActiveGame> {
        self.games.values_mut()
    }

    pub fn phase(&self, game_id: GameId) -> GamePhase {
        if self.games.contains_key(&game_id) {
            GamePhase::InProgress
        } else if self.matchmaker.is_waiting(game_id) {
            GamePhase::Waiting
        } else {
            GamePhase::Terminated
        }
    }

    pub fn binding(&self, conn_id: ConnId) -> Option<SessionBinding> {
        self.bindings.get(&conn_id).copied()
    }

    pub fn pending_moves(&self, game_id: GameId) -> Option<PendingMoves> {
        self.games.get(&game_id).map(|active| active.pending)
    }

    pub fn game(&self, game_id: GameId) -> Option<&Game> {
        self.games.get(&game_id).map(|active| &active.game)
    }

    pub fn active_games(&self) -> usize {
        self.games.len()
    }

    pub fn waiting(&self) -> usize {
        self.matchmaker.waiting().len()
    }
}
