//! Gameplay tuning for the snake arena.
//!
//! Keep this separate from runtime/server configuration (tick rates, ports, buffer sizes).

/// Board width in cells.
pub const WIDTH: i32 = 70;

/// Board height in cells.
pub const HEIGHT: i32 = 30;

/// Length each snake grows to before its tail starts following.
pub const STARTING_LENGTH: u32 = 5;

/// Food cells present on the board at all times (while empty cells remain).
pub const NUM_FOOD: usize = 3;

/// Cells a snake gains from one food, counting the cell it eats.
pub const FOOD_LENGTH: u32 = 3;

/// Horizontal spawn offset from each side wall, as a fraction of the width.
pub const SPAWN_OFFSET_RATIO: f64 = 0.1;
