// Use cases layer: matchmaking, session bookkeeping, and the tick loop.

pub mod matchmaker;
pub mod scheduler;
pub mod sessions;
pub mod types;

pub use matchmaker::{MatchOutcome, Matchmaker, WaitingSlot};
pub use scheduler::{TickReport, run_tick, tick_task};
pub use sessions::{DisconnectOutcome, MoveDisposition, SessionError, SessionRegistry, Ticket};
pub use types::{
    ConnId, FinishReason, GameId, GamePhase, GameUpdate, PendingMoves, SessionBinding,
};
