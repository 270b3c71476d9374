// Domain layer: board, snakes, and the per-tick simulation rules.

pub mod board;
pub mod game;
pub mod player;
pub mod tuning;

pub use board::{Board, BoardError, Cell, Coordinate};
pub use game::{Game, GameSnapshot, GameStatus, Outcome};
pub use player::{Color, Direction, PlayerState};
