// Fixed-size grid of cells, stored row-major in a flat vector.

use super::player::{Color, Direction};
use super::tuning::{HEIGHT, WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn in_bounds(self) -> bool {
        (0..WIDTH).contains(&self.x) && (0..HEIGHT).contains(&self.y)
    }

    /// Neighbour one step away; may land outside the board.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    fn index(self) -> Option<usize> {
        self.in_bounds()
            .then(|| (self.y * WIDTH + self.x) as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Snake(Color),
    Food,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    OutOfBounds { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Cell>,
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::Empty; (WIDTH * HEIGHT) as usize],
        }
    }

    pub fn get(&self, at: Coordinate) -> Result<Cell, BoardError> {
        let index = at.index().ok_or(BoardError::OutOfBounds { x: at.x, y: at.y })?;
        Ok(self.cells[index])
    }

    pub fn set(&mut self, at: Coordinate, cell: Cell) -> Result<(), BoardError> {
        let index = at.index().ok_or(BoardError::OutOfBounds { x: at.x, y: at.y })?;
        self.cells[index] = cell;
        Ok(())
    }

    /// Rows from top to bottom, each `WIDTH` cells long.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(WIDTH as usize)
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    pub fn coordinates_of(&self, cell: Cell) -> impl Iterator<Item = Coordinate> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == cell)
            .map(|(i, _)| Coordinate::new(i as i32 % WIDTH, i as i32 / WIDTH))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
